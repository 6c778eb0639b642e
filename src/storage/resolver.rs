//! Default document resolver backed by a [`Database`]

use crate::core::error::{FetchError, Result, ValidationError};
use crate::core::filters;
use crate::core::schema::pascal_case;
use crate::core::validation::{DocumentArgs, parse_args};
use crate::core::{
    CollectionDefinition, Connection, ConnectionArgs, ContentSchema, Database, DocumentResolver,
    Record, ResolveDocumentRequest,
};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Resolves documents and collections against a storage backend
///
/// Documents are returned in the shape the generated schema expects:
///
/// ```json
/// {
///   "__typename": "Post",
///   "id": "content/posts/hello.md",
///   "_sys": { "filename": "hello", "relativePath": "hello.md", ... },
///   "_values": { "title": "Hello" },
///   "title": "Hello"
/// }
/// ```
pub struct StoreResolver {
    database: Arc<dyn Database>,
    content: Arc<ContentSchema>,
}

impl StoreResolver {
    pub fn new(database: Arc<dyn Database>, content: Arc<ContentSchema>) -> Self {
        Self { database, content }
    }

    /// Build the response value of a stored record
    pub fn document_value(&self, collection: &CollectionDefinition, record: &Record) -> Value {
        let relative_path = collection
            .relative_path(&record.path)
            .unwrap_or(&record.path);
        let basename = relative_path.rsplit('/').next().unwrap_or(relative_path);
        let (filename, extension) = match basename.rfind('.') {
            Some(idx) if idx > 0 => (&basename[..idx], &basename[idx..]),
            _ => (basename, ""),
        };
        let stem = relative_path
            .strip_suffix(extension)
            .unwrap_or(relative_path);
        let breadcrumbs: Vec<&str> = stem.split('/').filter(|s| !s.is_empty()).collect();

        let type_name = match &record.template {
            Some(template) => format!("{}{}", collection.type_name(), pascal_case(template)),
            None => collection.type_name(),
        };

        let mut obj = match &record.data {
            Value::Object(data) => data.clone(),
            _ => Map::new(),
        };
        obj.insert("__typename".to_string(), Value::String(type_name));
        obj.insert("id".to_string(), Value::String(record.path.clone()));
        obj.insert(
            "_sys".to_string(),
            json!({
                "filename": filename,
                "basename": basename,
                "breadcrumbs": breadcrumbs,
                "path": record.path,
                "relativePath": relative_path,
                "extension": extension,
                "template": record.template.clone().unwrap_or_else(|| collection.name.clone()),
                "collection": collection.summary(),
            }),
        );
        obj.insert("_values".to_string(), record.data.clone());
        Value::Object(obj)
    }

    fn collection_of(&self, request: &ResolveDocumentRequest, args: &DocumentArgs) -> Result<&CollectionDefinition> {
        let name = request
            .collection
            .as_deref()
            .or(args.collection.as_deref())
            .ok_or_else(|| ValidationError::MissingField {
                field: "collection".to_string(),
            })?;
        Ok(self.content.collection(name)?)
    }

    /// Document data carried by `params`.
    ///
    /// Collection-specific mutations pass the fields directly, generic ones
    /// nest them under the collection name.
    fn params_data(
        request: &ResolveDocumentRequest,
        args: &DocumentArgs,
        collection: &CollectionDefinition,
    ) -> Map<String, Value> {
        let Some(Value::Object(params)) = &args.params else {
            return Map::new();
        };
        if request.is_collection_specific {
            return params.clone();
        }
        match params.get(&collection.name) {
            Some(Value::Object(data)) => data.clone(),
            _ => Map::new(),
        }
    }

    async fn load(&self, path: &str) -> Result<Record> {
        Ok(self
            .database
            .get(path)
            .await?
            .ok_or_else(|| FetchError::NotFound {
                path: path.to_string(),
            })?)
    }

    async fn ensure_absent(&self, path: &str) -> Result<()> {
        if self.database.get(path).await?.is_some() {
            return Err(FetchError::AlreadyExists {
                path: path.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentResolver for StoreResolver {
    async fn get_document(&self, path: &str) -> Result<Value> {
        let record = self.load(path).await?;
        let collection = self.content.collection(&record.collection)?;
        Ok(self.document_value(collection, &record))
    }

    async fn resolve_document(&self, request: ResolveDocumentRequest) -> Result<Value> {
        let args: DocumentArgs = parse_args(&request.args, &["relativePath"])?;
        let collection = self.collection_of(&request, &args)?;
        let path = collection.document_path(&args.relative_path);

        if request.is_add_pending_document {
            self.ensure_absent(&path).await?;
            let record = Record {
                path,
                collection: collection.name.clone(),
                template: args.template.clone(),
                data: Value::Object(Map::new()),
            };
            tracing::debug!(path = %record.path, "Adding pending document");
            self.database.put(record.clone()).await?;
            return Ok(self.document_value(collection, &record));
        }

        if !request.is_mutation {
            let record = self.load(&path).await?;
            return Ok(self.document_value(collection, &record));
        }

        if request.is_deletion {
            let record = self
                .database
                .delete(&path)
                .await?
                .ok_or_else(|| FetchError::NotFound { path: path.clone() })?;
            tracing::debug!(path = %path, "Deleted document");
            return Ok(self.document_value(collection, &record));
        }

        let data = Self::params_data(&request, &args, collection);

        if request.is_creation {
            self.ensure_absent(&path).await?;
            let record = Record::new(path, collection.name.clone(), Value::Object(data));
            tracing::debug!(path = %record.path, "Created document");
            self.database.put(record.clone()).await?;
            return Ok(self.document_value(collection, &record));
        }

        let mut record = self.load(&path).await?;
        if let Value::Object(existing) = &mut record.data {
            existing.extend(data);
        } else {
            record.data = Value::Object(data);
        }

        if request.is_update_name {
            let new_relative = args
                .params
                .as_ref()
                .and_then(|params| params.get("relativePath"))
                .and_then(Value::as_str)
                .ok_or_else(|| ValidationError::InvalidField {
                    field: "params.relativePath".to_string(),
                    expected: "string",
                })?;
            let new_path = collection.document_path(new_relative);
            if new_path != record.path {
                self.ensure_absent(&new_path).await?;
                self.database.delete(&record.path).await?;
                tracing::debug!(from = %record.path, to = %new_path, "Renamed document");
                record.path = new_path;
            }
        }

        self.database.put(record.clone()).await?;
        Ok(self.document_value(collection, &record))
    }

    async fn resolve_collection(
        &self,
        _args: &Map<String, Value>,
        collection: &str,
        include_documents: bool,
    ) -> Result<Value> {
        let collection = self.content.collection(collection)?;
        let mut summary = collection.summary();
        if let Value::Object(obj) = &mut summary {
            obj.insert(
                "documents".to_string(),
                json!({
                    "collection": collection.summary(),
                    "hasDocuments": include_documents,
                }),
            );
        }
        Ok(summary)
    }

    async fn resolve_collection_connection(
        &self,
        args: &Map<String, Value>,
        collection: &CollectionDefinition,
    ) -> Result<Value> {
        let connection_args = ConnectionArgs::from_args(args)?;
        let mut records = self.database.list(&collection.name).await?;

        if let Some(filter) = &connection_args.filter {
            records.retain(|record| filters::matches(&record.data, filter));
        }
        if let Some(sort) = &connection_args.sort {
            filters::apply_sort(&mut records, sort, |record| &record.data);
        }

        let items = records
            .iter()
            .map(|record| (record.path.clone(), self.document_value(collection, record)))
            .collect();
        Ok(Connection::paginate(items, &connection_args).into_value())
    }
}

#[cfg(all(test, feature = "in-memory"))]
mod tests {
    use super::*;
    use crate::core::{LookupTable, ResolveError};
    use crate::storage::InMemoryDatabase;

    fn resolver() -> (StoreResolver, InMemoryDatabase) {
        let content = ContentSchema::new(vec![CollectionDefinition::new("post", "content/posts")])
            .unwrap();
        let db = InMemoryDatabase::new("type Query { a: String }", content.clone(), LookupTable::new())
            .with_records(vec![
                Record::new("content/posts/a.md", "post", json!({ "title": "A", "rating": 1 })),
                Record::new("content/posts/nested/b.md", "post", json!({ "title": "B", "rating": 5 })),
            ]);
        (
            StoreResolver::new(Arc::new(db.clone()), Arc::new(content)),
            db,
        )
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_get_document_shape() {
        let (resolver, _) = resolver();
        let doc = resolver.get_document("content/posts/nested/b.md").await.unwrap();

        assert_eq!(doc["__typename"], "Post");
        assert_eq!(doc["id"], "content/posts/nested/b.md");
        assert_eq!(doc["title"], "B");
        assert_eq!(doc["_values"]["title"], "B");
        assert_eq!(doc["_sys"]["filename"], "b");
        assert_eq!(doc["_sys"]["extension"], ".md");
        assert_eq!(doc["_sys"]["relativePath"], "nested/b.md");
        assert_eq!(doc["_sys"]["breadcrumbs"], json!(["nested", "b"]));
        assert_eq!(doc["_sys"]["collection"]["name"], "post");
    }

    #[tokio::test]
    async fn test_get_missing_document() {
        let (resolver, _) = resolver();
        let err = resolver.get_document("content/posts/zzz.md").await.unwrap_err();
        assert!(matches!(err, ResolveError::Fetch(FetchError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_create_generic_document_uses_nested_params() {
        let (resolver, db) = resolver();
        let doc = resolver
            .resolve_document(ResolveDocumentRequest {
                args: args(json!({
                    "collection": "post",
                    "relativePath": "c.md",
                    "params": { "post": { "title": "C" } }
                })),
                is_mutation: true,
                is_creation: true,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(doc["title"], "C");
        assert!(db.get("content/posts/c.md").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_existing_document_fails() {
        let (resolver, _) = resolver();
        let err = resolver
            .resolve_document(ResolveDocumentRequest {
                args: args(json!({ "relativePath": "a.md", "params": {} })),
                collection: Some("post".to_string()),
                is_mutation: true,
                is_creation: true,
                is_collection_specific: true,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Fetch(FetchError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_update_collection_specific_merges_data() {
        let (resolver, _) = resolver();
        let doc = resolver
            .resolve_document(ResolveDocumentRequest {
                args: args(json!({ "relativePath": "a.md", "params": { "title": "A2" } })),
                collection: Some("post".to_string()),
                is_mutation: true,
                is_collection_specific: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(doc["title"], "A2");
        assert_eq!(doc["rating"], 1);
    }

    #[tokio::test]
    async fn test_update_with_rename_moves_document() {
        let (resolver, db) = resolver();
        let doc = resolver
            .resolve_document(ResolveDocumentRequest {
                args: args(json!({
                    "collection": "post",
                    "relativePath": "a.md",
                    "params": { "relativePath": "renamed.md" }
                })),
                is_mutation: true,
                is_update_name: true,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(doc["id"], "content/posts/renamed.md");
        assert!(db.get("content/posts/a.md").await.unwrap().is_none());
        assert!(db.get("content/posts/renamed.md").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_returns_removed_document() {
        let (resolver, db) = resolver();
        let doc = resolver
            .resolve_document(ResolveDocumentRequest {
                args: args(json!({ "collection": "post", "relativePath": "a.md" })),
                is_mutation: true,
                is_deletion: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(doc["title"], "A");
        assert!(db.get("content/posts/a.md").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_pending_document_with_template() {
        let (resolver, db) = resolver();
        let doc = resolver
            .resolve_document(ResolveDocumentRequest {
                args: args(json!({ "collection": "post", "relativePath": "new.md", "template": "article" })),
                collection: Some("post".to_string()),
                is_mutation: true,
                is_creation: true,
                is_add_pending_document: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(doc["__typename"], "PostArticle");
        let record = db.get("content/posts/new.md").await.unwrap().unwrap();
        assert_eq!(record.template.as_deref(), Some("article"));
    }

    #[tokio::test]
    async fn test_missing_relative_path_is_validation_error() {
        let (resolver, _) = resolver();
        let err = resolver
            .resolve_document(ResolveDocumentRequest {
                args: args(json!({ "collection": "post" })),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Validation(_)));
    }

    #[tokio::test]
    async fn test_resolve_collection_carries_documents_handle() {
        let (resolver, _) = resolver();
        let summary = resolver
            .resolve_collection(&Map::new(), "post", true)
            .await
            .unwrap();
        assert_eq!(summary["name"], "post");
        assert_eq!(summary["documents"]["hasDocuments"], true);
        assert_eq!(summary["documents"]["collection"]["name"], "post");
    }

    #[tokio::test]
    async fn test_connection_filters_and_sorts() {
        let (resolver, _) = resolver();
        let collection = CollectionDefinition::new("post", "content/posts");

        let conn = resolver
            .resolve_collection_connection(&args(json!({ "sort": "rating:desc" })), &collection)
            .await
            .unwrap();
        assert_eq!(conn["totalCount"], 2);
        assert_eq!(conn["edges"][0]["node"]["title"], "B");

        let conn = resolver
            .resolve_collection_connection(
                &args(json!({ "filter": { "rating": { "lt": 3 } } })),
                &collection,
            )
            .await
            .unwrap();
        assert_eq!(conn["totalCount"], 1);
        assert_eq!(conn["edges"][0]["cursor"], "content/posts/a.md");
    }
}
