//! Typed error handling for content resolution
//!
//! Every failure raised while resolving a query belongs to one of the
//! categories below. Field resolvers return them as `Result`s; the executor
//! turns each one into a [`GraphQLError`] through
//! [`ResolveError::to_graphql_error`], which is the only place an error kind is
//! mapped to its response representation.
//!
//! # Error Categories
//!
//! - [`ValidationError`]: malformed arguments for a known resolve type
//! - [`ResolutionError`]: compiled lookup metadata disagrees with the schema or value shape
//! - [`OptimizerError`]: an ad-hoc query string could not be optimized
//! - [`FetchError`]: the document store failed or could not find something
//! - [`SchemaBuildError`]: the stored schema artifact could not be turned into an executable schema
//! - [`ExecutionError`]: the query document itself cannot be executed
//!
//! # Example
//!
//! ```rust,ignore
//! match resolver.get_document("content/posts/hello.md").await {
//!     Ok(doc) => println!("{}", doc["_sys"]["filename"]),
//!     Err(ResolveError::Fetch(FetchError::NotFound { path })) => {
//!         println!("{} does not exist", path);
//!     }
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

use serde::Serialize;
use serde_json::{Map, Value, json};
use std::fmt;
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T, E = ResolveError> = std::result::Result<T, E>;

/// The main error type for content resolution
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Optimizer(#[from] OptimizerError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    SchemaBuild(#[from] SchemaBuildError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl ResolveError {
    /// Stable error code exposed in `extensions.code`
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::Validation(_) => "VALIDATION_ERROR",
            ResolveError::Resolution(_) => "RESOLUTION_ERROR",
            ResolveError::Optimizer(_) => "OPTIMIZER_ERROR",
            ResolveError::Fetch(e) => e.code(),
            ResolveError::SchemaBuild(_) => "SCHEMA_BUILD_ERROR",
            ResolveError::Execution(_) => "EXECUTION_ERROR",
        }
    }

    /// Whether this error already has the shape of a GraphQL response error.
    ///
    /// These are normalized into `{ errors: [..] }` by the entry point, every
    /// other error, schema build failures included, is returned to the caller.
    pub fn is_graphql_formatted(&self) -> bool {
        matches!(self, ResolveError::Execution(_))
    }

    /// Normalize into the field-level error representation
    pub fn to_graphql_error(&self, path: &[PathSegment]) -> GraphQLError {
        GraphQLError {
            message: self.to_string(),
            path: path.to_vec(),
            extensions: ErrorExtensions { code: self.code() },
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Malformed arguments for a known resolve type
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required argument is absent
    #[error("{field} is a required field")]
    MissingField { field: String },

    /// An argument is present but has the wrong shape
    #[error("{field} must be a `{expected}` type")]
    InvalidField {
        field: String,
        expected: &'static str,
    },

    /// Arguments could not be read into the expected shape
    #[error("Invalid arguments: {message}")]
    InvalidArguments { message: String },
}

// =============================================================================
// Resolution Errors
// =============================================================================

/// Compiled lookup metadata does not match the schema or the value being resolved.
///
/// These never come from user input: they point at a bug in build-time
/// schema compilation.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("Unable to find lookup key for {type_name}")]
    MissingLookup { type_name: String },

    #[error("Lookup for {type_name} is `{resolve_type}`, expected `unionData`")]
    NotUnionData {
        type_name: String,
        resolve_type: String,
    },

    #[error("Value for {type_name} has no `_template` discriminant")]
    MissingDiscriminant { type_name: String },

    #[error("No type mapping for template `{template}` on {type_name}")]
    UnmappedDiscriminant { type_name: String, template: String },

    #[error("Expected an array for result of {field} at {path}")]
    ExpectedArray { field: String, path: String },

    #[error("Unexpected resolve type `{resolve_type}` for {type_name}")]
    UnexpectedResolveType {
        type_name: String,
        resolve_type: String,
    },

    #[error("Lookup for {type_name} is missing `{attribute}`")]
    IncompleteLookup {
        type_name: String,
        attribute: &'static str,
    },

    #[error("Invalid lookup entry for {type_name}: {message}")]
    MalformedLookup { type_name: String, message: String },
}

// =============================================================================
// Optimizer Errors
// =============================================================================

/// An ad-hoc query string handed to the fragment inliner was rejected
#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("Invalid query provided, Error message: {message}")]
    InvalidQuery { message: String },

    #[error("Invalid query provided, Error message: Unknown fragment \"{name}\".")]
    UnknownFragment { name: String },

    #[error("Invalid query provided, Error message: Cannot spread fragment \"{name}\" within itself.")]
    FragmentCycle { name: String },
}

// =============================================================================
// Fetch Errors
// =============================================================================

/// Failures coming back from document or connection delegation
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Unable to find record {path}")]
    NotFound { path: String },

    #[error("Unable to add document, {path} already exists")]
    AlreadyExists { path: String },

    #[error("Unable to find collection {name}")]
    UnknownCollection { name: String },

    #[error("Unable to find a collection for {path}")]
    NoCollectionForPath { path: String },

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl FetchError {
    fn code(&self) -> &'static str {
        match self {
            FetchError::NotFound { .. } => "NOT_FOUND",
            FetchError::AlreadyExists { .. } => "ALREADY_EXISTS",
            FetchError::UnknownCollection { .. } | FetchError::NoCollectionForPath { .. } => {
                "UNKNOWN_COLLECTION"
            }
            FetchError::Storage(_) => "FETCH_ERROR",
        }
    }
}

// =============================================================================
// Schema Build Errors
// =============================================================================

/// The stored schema artifact could not be compiled into an executable schema
#[derive(Debug, Error)]
pub enum SchemaBuildError {
    #[error("Unable to parse GraphQL schema: {message}")]
    Parse { message: String },

    #[error("Schema has no query root type `{name}`")]
    MissingQueryRoot { name: String },

    #[error("Type {type_name} references unknown type {referenced}")]
    UnknownType {
        type_name: String,
        referenced: String,
    },

    #[error("Invalid content schema: {message}")]
    ContentSchema { message: String },
}

// =============================================================================
// Execution Errors
// =============================================================================

/// The query document cannot be executed against the schema
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Syntax Error: {message}")]
    Parse { message: String },

    #[error("Must provide an operation.")]
    NoOperation,

    #[error("Unknown operation named \"{name}\".")]
    UnknownOperation { name: String },

    #[error("Must provide operation name if query contains multiple operations.")]
    AmbiguousOperation,

    #[error("Subscriptions are not supported")]
    SubscriptionUnsupported,

    #[error("Schema is not configured for mutations.")]
    NoMutationRoot,

    #[error("Cannot query field \"{field}\" on type \"{type_name}\".")]
    UnknownField { type_name: String, field: String },

    #[error("Unknown fragment \"{name}\".")]
    UnknownFragment { name: String },

    #[error("Unknown type \"{name}\".")]
    UnknownType { name: String },

    #[error("Variable \"${name}\" of required type \"{type_name}\" was not provided.")]
    MissingVariable { name: String, type_name: String },

    #[error("Cannot return null for non-nullable field {type_name}.{field}.")]
    NonNullViolation { type_name: String, field: String },

    #[error("Expected Iterable, but did not find one for field \"{type_name}.{field}\".")]
    ExpectedIterable { type_name: String, field: String },

    #[error("Abstract type \"{abstract_type}\" must resolve to an object type, got \"{resolved}\".")]
    InvalidTypeResolution {
        abstract_type: String,
        resolved: String,
    },
}

// =============================================================================
// Response errors
// =============================================================================

/// One segment of a response path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(idx) => write!(f, "{}", idx),
        }
    }
}

/// Render a response path as `a.b.0.c`
pub fn format_path(path: &[PathSegment]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// Extra machine-readable error data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorExtensions {
    pub code: &'static str,
}

/// A plain error entry of a GraphQL response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphQLError {
    /// Human-readable error message
    pub message: String,

    /// Response path of the field that failed
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,

    pub extensions: ErrorExtensions,
}

impl GraphQLError {
    /// Response form, identical to the derived serialization
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("message".to_string(), Value::String(self.message.clone()));
        if !self.path.is_empty() {
            let path = self
                .path
                .iter()
                .map(|segment| match segment {
                    PathSegment::Key(key) => Value::String(key.clone()),
                    PathSegment::Index(idx) => json!(idx),
                })
                .collect();
            obj.insert("path".to_string(), Value::Array(path));
        }
        obj.insert(
            "extensions".to_string(),
            json!({ "code": self.extensions.code }),
        );
        Value::Object(obj)
    }
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} (at {})", self.message, format_path(&self.path))
        }
    }
}

impl From<ResolveError> for GraphQLError {
    fn from(err: ResolveError) -> Self {
        err.to_graphql_error(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validation_error_message_names_field() {
        let err = ResolveError::from(ValidationError::MissingField {
            field: "id".to_string(),
        });
        assert_eq!(err.to_string(), "id is a required field");
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_fetch_error_codes() {
        let not_found = ResolveError::from(FetchError::NotFound {
            path: "content/posts/a.md".to_string(),
        });
        assert_eq!(not_found.code(), "NOT_FOUND");

        let storage = ResolveError::from(FetchError::Storage(anyhow::anyhow!("disk full")));
        assert_eq!(storage.code(), "FETCH_ERROR");
        assert_eq!(storage.to_string(), "Storage error: disk full");
    }

    #[test]
    fn test_only_execution_errors_are_graphql_formatted() {
        assert!(ResolveError::from(ExecutionError::NoOperation).is_graphql_formatted());
        assert!(
            !ResolveError::from(SchemaBuildError::Parse {
                message: "x".to_string()
            })
            .is_graphql_formatted()
        );
        assert!(
            !ResolveError::from(FetchError::Storage(anyhow::anyhow!("down")))
                .is_graphql_formatted()
        );
    }

    #[test]
    fn test_graphql_error_serialization() {
        let err = ResolveError::from(ResolutionError::ExpectedArray {
            field: "documents".to_string(),
            path: "collection.documents".to_string(),
        });
        let gql = err.to_graphql_error(&[
            PathSegment::Key("collection".to_string()),
            PathSegment::Key("documents".to_string()),
        ]);

        let value = serde_json::to_value(&gql).unwrap();
        assert_eq!(
            value,
            json!({
                "message": "Expected an array for result of documents at collection.documents",
                "path": ["collection", "documents"],
                "extensions": { "code": "RESOLUTION_ERROR" }
            })
        );
    }

    #[test]
    fn test_to_json_matches_serialization() {
        let gql = ResolveError::from(FetchError::NotFound {
            path: "content/posts/a.md".to_string(),
        })
        .to_graphql_error(&[
            PathSegment::Key("posts".to_string()),
            PathSegment::Index(2),
        ]);
        assert_eq!(gql.to_json(), serde_json::to_value(&gql).unwrap());

        let bare = GraphQLError::from(ResolveError::from(ExecutionError::NoOperation));
        assert_eq!(bare.to_json(), serde_json::to_value(&bare).unwrap());
    }

    #[test]
    fn test_graphql_error_without_path_omits_it() {
        let gql = GraphQLError::from(ResolveError::from(ExecutionError::NoOperation));
        let value = serde_json::to_value(&gql).unwrap();
        assert!(value.get("path").is_none());
        assert_eq!(gql.to_string(), "Must provide an operation.");
    }

    #[test]
    fn test_format_path_mixes_keys_and_indexes() {
        let path = vec![
            PathSegment::Key("posts".to_string()),
            PathSegment::Index(2),
            PathSegment::Key("title".to_string()),
        ];
        assert_eq!(format_path(&path), "posts.2.title");
    }
}
