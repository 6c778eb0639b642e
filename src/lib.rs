//! # contentgraph
//!
//! Metadata-driven GraphQL field resolution for headless content collections.
//!
//! A compiled content project ships three artifacts: the GraphQL schema (SDL),
//! the collections of the project and a lookup table describing how values of
//! each GraphQL type are resolved. A single generic resolver routes every
//! field of every query through that table to a [`DocumentResolver`]: as a
//! single document, a polymorphic union, a paginated connection, or a
//! passthrough value.
//!
//! ## Features
//!
//! - **Lookup-driven dispatch**: one closed [`Resolution`] variant per resolve type
//! - **Standard execution**: fragments, directives, variables, null propagation
//! - **Partial results**: field errors are collected with their response path
//! - **Fragment inlining**: `getOptimizedQuery` returns self-contained queries
//! - **Pluggable storage**: any [`Database`] implementation, in-memory included
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use contentgraph::prelude::*;
//! use std::sync::Arc;
//!
//! let snapshot = DatabaseSnapshot::from_yaml_file("content.yaml")?;
//! let database = Arc::new(InMemoryDatabase::from_snapshot(snapshot)?);
//!
//! let result = resolve(
//!     ResolveRequest::new(r#"{ post(relativePath: "hello.md") { title } }"#),
//!     database,
//!     &ResolveConfig::default(),
//! )
//! .await?;
//! println!("{}", result.to_json());
//! ```

pub mod config;
pub mod core;
pub mod graphql;
pub mod storage;

pub use crate::core::{Database, DocumentResolver, Resolution};
pub use graphql::{ResolveRequest, resolve, resolve_with};

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Types ===
    pub use crate::core::{
        CollectionDefinition, Connection, ConnectionArgs, ContentSchema, Database,
        DocumentResolver, FieldOperation, LookupEntry, LookupTable, Record, Resolution,
        ResolveDocumentRequest, ResolveType,
    };

    // === Errors ===
    pub use crate::core::error::{
        ExecutionError, FetchError, GraphQLError, OptimizerError, PathSegment, ResolutionError,
        ResolveError, Result, SchemaBuildError, ValidationError,
    };

    // === Configuration ===
    pub use crate::config::{DatabaseSnapshot, ResolveConfig};

    // === GraphQL ===
    pub use crate::graphql::{
        ContentResolver, ExecutionResult, Executor, FieldResolver, ResolveInfo, ResolveRequest,
        SchemaIndex, optimize_query, resolve, resolve_with,
    };

    // === Storage ===
    #[cfg(feature = "in-memory")]
    pub use crate::storage::InMemoryDatabase;
    pub use crate::storage::StoreResolver;

    // === External re-exports ===
    pub use async_trait::async_trait;
    pub use serde_json::{Value, json};
    pub use std::sync::Arc;
}
