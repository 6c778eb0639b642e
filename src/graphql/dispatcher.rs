//! Metadata-driven field dispatch
//!
//! [`ContentResolver`] is wired into the executor as both the field resolver
//! and the type resolver. Fields whose return type has no lookup entry pass
//! through unchanged; every other field is routed by the entry's
//! [`Resolution`] to the [`DocumentResolver`].

use crate::core::error::{FetchError, ResolutionError, ResolveError, Result, ValidationError};
use crate::core::lookup::Resolution;
use crate::core::query::Connection;
use crate::core::validation::{NodeArgs, parse_args};
use crate::core::{ContentSchema, Database, DocumentResolver, LookupEntry, ResolveDocumentRequest};
use crate::graphql::executor::{FieldResolver, ResolveInfo};
use crate::graphql::optimizer::optimize_query;
use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Return type handled before any lookup
const COLLECTION_TYPE: &str = "Collection";

/// Utility field returning a fragment-inlined copy of a query
const OPTIMIZED_QUERY_FIELD: &str = "getOptimizedQuery";

const ADD_PENDING_DOCUMENT_FIELD: &str = "addPendingDocument";
const DELETE_DOCUMENT_FIELD: &str = "deleteDocument";

/// Generic document fields of the multi-collection `Document` type
const GENERIC_DOCUMENT_FIELDS: &[&str] = &[
    "document",
    "createDocument",
    "updateDocument",
    DELETE_DOCUMENT_FIELD,
];

/// Field and type resolver for content schemas
pub struct ContentResolver {
    database: Arc<dyn Database>,
    content: Arc<ContentSchema>,
    documents: Arc<dyn DocumentResolver>,
    verbose: bool,
}

impl ContentResolver {
    pub fn new(
        database: Arc<dyn Database>,
        content: Arc<ContentSchema>,
        documents: Arc<dyn DocumentResolver>,
    ) -> Self {
        Self {
            database,
            content,
            documents,
            verbose: true,
        }
    }

    /// Log every delegation failure with its full context
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    async fn dispatch(
        &self,
        source: &Value,
        args: Map<String, Value>,
        info: &ResolveInfo<'_>,
    ) -> Result<Value> {
        let return_type = info.return_named_type();
        let field_name = info.field_name;
        let value = source.get(field_name).cloned().unwrap_or(Value::Null);

        if return_type == COLLECTION_TYPE {
            if is_truthy(&value) {
                return Ok(value);
            }
            return self.resolve_collections(&args, info).await;
        }

        if field_name == OPTIMIZED_QUERY_FIELD {
            let query = required_string(&args, "queryString")?;
            return Ok(Value::String(optimize_query(info.schema, query)?));
        }

        let Some(lookup) = self.database.lookup(return_type).await? else {
            return Ok(value);
        };

        let is_mutation = info.is_mutation();
        let is_creation = lookup.is_creation(field_name);

        match &lookup.resolution {
            Resolution::NodeDocument => {
                let node: NodeArgs = parse_args(&args, &["id"])?;
                tracing::debug!(id = %node.id, "resolving node");
                self.documents.get_document(&node.id).await
            }
            Resolution::MultiCollectionDocument => {
                if let Value::String(path) = &value {
                    return self.documents.get_document(path).await;
                }
                let collection = args
                    .get("collection")
                    .and_then(Value::as_str)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string);

                if field_name == ADD_PENDING_DOCUMENT_FIELD && collection.is_some() {
                    let mut args = args;
                    args.insert("params".to_string(), json!({}));
                    return self
                        .documents
                        .resolve_document(ResolveDocumentRequest {
                            args,
                            collection,
                            is_mutation,
                            is_creation: true,
                            is_add_pending_document: true,
                            ..Default::default()
                        })
                        .await;
                }

                if GENERIC_DOCUMENT_FIELDS.contains(&field_name) {
                    let is_update_name = args
                        .get("params")
                        .and_then(|params| params.get("relativePath"))
                        .is_some_and(is_truthy);
                    tracing::debug!(field = field_name, collection = ?collection, "resolving document");
                    return self
                        .documents
                        .resolve_document(ResolveDocumentRequest {
                            args,
                            collection,
                            is_mutation,
                            is_creation,
                            is_deletion: field_name == DELETE_DOCUMENT_FIELD,
                            is_update_name,
                            is_add_pending_document: false,
                            is_collection_specific: false,
                        })
                        .await;
                }
                Ok(value)
            }
            Resolution::MultiCollectionDocumentList => {
                self.resolve_document_list(value, args, info, &lookup).await
            }
            Resolution::CollectionDocument { collection } => {
                if is_truthy(&value) {
                    return Ok(value);
                }
                self.documents
                    .resolve_document(ResolveDocumentRequest {
                        args,
                        collection: Some(collection.clone()),
                        is_mutation,
                        is_creation,
                        is_collection_specific: true,
                        ..Default::default()
                    })
                    .await
            }
            Resolution::CollectionDocumentList { collection } => {
                let collection = self.content.collection(collection)?;
                self.documents
                    .resolve_collection_connection(&args, collection)
                    .await
            }
            Resolution::UnionData { collection, .. } => {
                let has_relative_path = args.get("relativePath").is_some_and(is_truthy);
                if !is_truthy(&value) && has_relative_path {
                    return self
                        .documents
                        .resolve_document(ResolveDocumentRequest {
                            args,
                            collection: collection.clone(),
                            is_mutation,
                            is_creation,
                            is_collection_specific: true,
                            ..Default::default()
                        })
                        .await;
                }
                // Type disambiguation happens in `resolve_type`
                Ok(value)
            }
        }
    }

    /// `collection(collection:)` and `collections`
    async fn resolve_collections(
        &self,
        args: &Map<String, Value>,
        info: &ResolveInfo<'_>,
    ) -> Result<Value> {
        let include_documents = info.has_sub_field("documents");

        if info.field_name == "collections" {
            let summaries = try_join_all(self.content.collections().iter().map(|collection| {
                self.documents
                    .resolve_collection(args, &collection.name, include_documents)
            }))
            .await?;
            return Ok(Value::Array(summaries));
        }

        let name = required_string(args, "collection")?;
        self.documents
            .resolve_collection(args, name, include_documents)
            .await
    }

    async fn resolve_document_list(
        &self,
        value: Value,
        mut args: Map<String, Value>,
        info: &ResolveInfo<'_>,
        lookup: &LookupEntry,
    ) -> Result<Value> {
        let value = match value {
            Value::Array(items) => return Ok(Connection::from_list(items)),
            value => value,
        };

        let has_documents = value.get("hasDocuments").is_some_and(is_truthy);
        let handle = value
            .get("collection")
            .filter(|c| is_truthy(c) && has_documents && info.field_name == "documents");
        let Some(handle) = handle else {
            let err = ResolutionError::ExpectedArray {
                field: info.field_name.to_string(),
                path: info.path_string(),
            };
            tracing::error!(entry = ?lookup, error = %err, "lookup does not match value shape");
            return Err(err.into());
        };

        let name = handle.get("name").and_then(Value::as_str);
        if let Some(name) = name {
            let keyed = args
                .get("filter")
                .and_then(Value::as_object)
                .and_then(|filter| filter.get(name))
                .cloned();
            if let Some(filter) = keyed {
                args.insert("filter".to_string(), filter);
            }
        }

        let name = name.ok_or_else(|| FetchError::UnknownCollection {
            name: handle.to_string(),
        })?;
        let collection = self.content.collection(name)?;
        tracing::debug!(collection = %collection.name, "resolving collection documents");
        self.documents
            .resolve_collection_connection(&args, collection)
            .await
    }

    /// Single funnel for every failure leaving the dispatcher
    fn report(&self, err: ResolveError, info: &ResolveInfo<'_>) -> ResolveError {
        match &err {
            ResolveError::Resolution(_) => {
                tracing::error!(field = info.field_name, path = %info.path_string(), error = %err, "resolution failed");
            }
            ResolveError::Fetch(fetch) if self.verbose => {
                tracing::warn!(field = info.field_name, path = %info.path_string(), error = ?fetch, "fetch failed");
            }
            _ => {}
        }
        err
    }
}

#[async_trait]
impl FieldResolver for ContentResolver {
    async fn resolve_field(
        &self,
        source: &Value,
        args: Map<String, Value>,
        info: &ResolveInfo<'_>,
    ) -> Result<Value> {
        self.dispatch(source, args, info)
            .await
            .map_err(|err| self.report(err, info))
    }

    async fn resolve_type(&self, value: &Value, info: &ResolveInfo<'_>) -> Result<String> {
        if let Some(type_name) = value.get("__typename").and_then(Value::as_str) {
            if !type_name.is_empty() {
                return Ok(type_name.to_string());
            }
        }

        let named = info.return_named_type();
        let lookup = self
            .database
            .lookup(named)
            .await?
            .ok_or_else(|| ResolutionError::MissingLookup {
                type_name: named.to_string(),
            })?;

        let Resolution::UnionData { type_map, .. } = &lookup.resolution else {
            return Err(ResolutionError::NotUnionData {
                type_name: named.to_string(),
                resolve_type: lookup.resolve_type().to_string(),
            }
            .into());
        };

        let template = value
            .get("_template")
            .and_then(Value::as_str)
            .ok_or_else(|| ResolutionError::MissingDiscriminant {
                type_name: named.to_string(),
            })?;

        match type_map.get(template) {
            Some(concrete) => Ok(concrete.clone()),
            None => {
                tracing::error!(entry = ?lookup, template, "unmapped union template");
                Err(ResolutionError::UnmappedDiscriminant {
                    type_name: named.to_string(),
                    template: template.to_string(),
                }
                .into())
            }
        }
    }
}

/// Truthiness of a plain value, as used by the lookup checks
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn required_string<'a>(args: &'a Map<String, Value>, field: &'static str) -> Result<&'a str> {
    match args.get(field) {
        Some(Value::String(s)) => Ok(s),
        None | Some(Value::Null) => Err(ValidationError::MissingField {
            field: field.to_string(),
        }
        .into()),
        Some(_) => Err(ValidationError::InvalidField {
            field: field.to_string(),
            expected: "string",
        }
        .into()),
    }
}
