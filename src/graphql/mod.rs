//! GraphQL layer
//!
//! - `schema_index`: executable schema built from the stored SDL
//! - `executor`: query execution over a [`FieldResolver`]
//! - `dispatcher`: the lookup-driven [`ContentResolver`]
//! - `optimizer`: fragment inlining
//! - `resolve`: the top-level entry point

pub mod dispatcher;
pub mod executor;
pub mod optimizer;
pub mod resolve;
pub mod schema_index;

pub use dispatcher::ContentResolver;
pub use executor::{ExecutionResult, Executor, FieldResolver, ResolveInfo};
pub use optimizer::optimize_query;
pub use resolve::{ResolveRequest, resolve, resolve_with};
pub use schema_index::{SchemaIndex, TypeKind, TypeRef};
