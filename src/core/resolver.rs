//! Document resolution contract
//!
//! The dispatcher delegates every storage-backed field to a
//! [`DocumentResolver`]. [`crate::storage::StoreResolver`] is the default
//! implementation; callers may plug in their own.

use crate::core::error::Result;
use crate::core::schema::CollectionDefinition;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Everything the dispatcher knows about a document field invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolveDocumentRequest {
    /// Plain field arguments
    pub args: Map<String, Value>,

    /// Target collection, taken from lookup metadata or from `args.collection`
    pub collection: Option<String>,

    /// Parent type is the root `Mutation` type
    pub is_mutation: bool,

    /// Field is marked `create` in the lookup entry
    pub is_creation: bool,

    /// Field is `deleteDocument`
    pub is_deletion: bool,

    /// Update carries a `params.relativePath` rename target
    pub is_update_name: bool,

    /// Field is `addPendingDocument`
    pub is_add_pending_document: bool,

    /// Field belongs to a single collection (`post`, `createPost`, ...)
    pub is_collection_specific: bool,
}

/// Trait for resolving documents and collections
#[async_trait]
pub trait DocumentResolver: Send + Sync {
    /// Fetch a document by path or node id
    async fn get_document(&self, path: &str) -> Result<Value>;

    /// Fetch, create, update or delete a document
    async fn resolve_document(&self, request: ResolveDocumentRequest) -> Result<Value>;

    /// Summary of a collection, optionally carrying a documents handle
    async fn resolve_collection(
        &self,
        args: &Map<String, Value>,
        collection: &str,
        include_documents: bool,
    ) -> Result<Value>;

    /// Filtered, paginated documents of a collection
    async fn resolve_collection_connection(
        &self,
        args: &Map<String, Value>,
        collection: &CollectionDefinition,
    ) -> Result<Value>;
}
