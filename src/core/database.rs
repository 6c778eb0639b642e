//! Storage collaborator
//!
//! The dispatcher never talks to a concrete backend: it reads the compiled
//! schema artifacts and documents through this trait.

use crate::core::error::FetchError;
use crate::core::lookup::LookupEntry;
use crate::core::schema::ContentSchema;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// A stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Full document path (e.g., "content/posts/hello.md")
    pub path: String,

    /// Collection the document belongs to
    pub collection: String,

    /// Template of the document, when the collection has several
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// Document fields
    #[serde(default = "empty_object")]
    pub data: Value,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

impl Record {
    pub fn new(path: impl Into<String>, collection: impl Into<String>, data: Value) -> Self {
        Self {
            path: path.into(),
            collection: collection.into(),
            template: None,
            data,
        }
    }
}

/// Trait for the storage backend of a content project
///
/// Implementations handle their own concurrency control; every method may be
/// called concurrently from sibling field resolutions.
#[async_trait]
pub trait Database: Send + Sync {
    /// SDL of the compiled GraphQL schema
    async fn graphql_schema(&self) -> Result<String, FetchError>;

    /// Collections of the content project
    async fn content_schema(&self) -> Result<ContentSchema, FetchError>;

    /// Lookup entry for a GraphQL named type, `None` when values of the
    /// type are already fully resolved
    async fn lookup(&self, type_name: &str) -> Result<Option<Arc<LookupEntry>>, FetchError>;

    /// Fetch a document by full path
    async fn get(&self, path: &str) -> Result<Option<Record>, FetchError>;

    /// Insert or replace a document
    async fn put(&self, record: Record) -> Result<(), FetchError>;

    /// Delete a document, returning it if it existed
    async fn delete(&self, path: &str) -> Result<Option<Record>, FetchError>;

    /// All documents of a collection, ordered by path
    async fn list(&self, collection: &str) -> Result<Vec<Record>, FetchError>;
}
