//! GraphQL executor module
//!
//! Executes parsed queries against a [`SchemaIndex`](super::SchemaIndex),
//! delegating every field and every abstract-type decision to a
//! [`FieldResolver`].
//!
//! - `core`: operation selection, field collection, value completion
//! - `field_resolver`: the resolver contract and [`ResolveInfo`]
//! - `validation`: checks run before any field is resolved
//! - `utils`: argument, variable and directive helpers

mod core;
mod field_resolver;
pub(crate) mod utils;
mod validation;

pub use self::core::{ExecutionResult, Executor, OperationKind, QueryField};
pub use self::field_resolver::{FieldResolver, ResolveInfo};
