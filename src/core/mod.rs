//! Core module containing the data contracts of content resolution

pub mod database;
pub mod error;
pub mod filters;
pub mod lookup;
pub mod query;
pub mod resolver;
pub mod schema;
pub mod validation;

pub use database::{Database, Record};
pub use error::{
    ExecutionError, FetchError, GraphQLError, OptimizerError, PathSegment, ResolutionError,
    ResolveError, SchemaBuildError, ValidationError,
};
pub use lookup::{FieldOperation, LookupEntry, LookupTable, Resolution, ResolveType};
pub use query::{Connection, ConnectionArgs, Edge, PageInfo};
pub use resolver::{DocumentResolver, ResolveDocumentRequest};
pub use schema::{CollectionDefinition, ContentSchema};
