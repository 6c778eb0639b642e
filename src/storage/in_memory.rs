//! In-memory implementation of Database for testing and development

use crate::config::DatabaseSnapshot;
use crate::core::error::{FetchError, SchemaBuildError};
use crate::core::{ContentSchema, Database, LookupEntry, LookupTable, Record};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory database implementation
///
/// Schema artifacts are immutable snapshots; documents live behind an async
/// RwLock and are kept in path order.
#[derive(Clone)]
pub struct InMemoryDatabase {
    schema: Arc<String>,
    content: Arc<ContentSchema>,
    lookup: Arc<LookupTable>,
    records: Arc<RwLock<BTreeMap<String, Record>>>,
}

impl InMemoryDatabase {
    /// Create an empty database serving the given schema artifacts
    pub fn new(schema: impl Into<String>, content: ContentSchema, lookup: LookupTable) -> Self {
        Self {
            schema: Arc::new(schema.into()),
            content: Arc::new(content),
            lookup: Arc::new(lookup),
            records: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Seed documents
    pub fn with_records(self, records: impl IntoIterator<Item = Record>) -> Self {
        let map = records
            .into_iter()
            .map(|record| (record.path.clone(), record))
            .collect();
        Self {
            records: Arc::new(RwLock::new(map)),
            ..self
        }
    }

    /// Build a database from a loaded snapshot
    pub fn from_snapshot(snapshot: DatabaseSnapshot) -> Result<Self, SchemaBuildError> {
        let content = ContentSchema::new(snapshot.collections)?;
        for record in &snapshot.documents {
            if content.collection(&record.collection).is_err() {
                return Err(SchemaBuildError::ContentSchema {
                    message: format!(
                        "document {} references unknown collection `{}`",
                        record.path, record.collection
                    ),
                });
            }
        }
        Ok(Self::new(snapshot.schema, content, snapshot.lookup).with_records(snapshot.documents))
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl Database for InMemoryDatabase {
    async fn graphql_schema(&self) -> Result<String, FetchError> {
        Ok(self.schema.as_ref().clone())
    }

    async fn content_schema(&self) -> Result<ContentSchema, FetchError> {
        Ok(self.content.as_ref().clone())
    }

    async fn lookup(&self, type_name: &str) -> Result<Option<Arc<LookupEntry>>, FetchError> {
        Ok(self.lookup.get(type_name))
    }

    async fn get(&self, path: &str) -> Result<Option<Record>, FetchError> {
        Ok(self.records.read().await.get(path).cloned())
    }

    async fn put(&self, record: Record) -> Result<(), FetchError> {
        self.records
            .write()
            .await
            .insert(record.path.clone(), record);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<Option<Record>, FetchError> {
        Ok(self.records.write().await.remove(path))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Record>, FetchError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|record| record.collection == collection)
            .cloned()
            .collect())
    }
}
