//! Top-level query resolution
//!
//! [`resolve`] builds the executable schema from the stored SDL, binds a
//! [`ContentResolver`] to the content schema and storage, then executes the
//! query. Field-level failures end up in the result's `errors`; only
//! failures that happen before execution can make `resolve` return `Err`.

use crate::config::ResolveConfig;
use crate::core::error::{GraphQLError, Result};
use crate::core::{ContentSchema, Database, DocumentResolver};
use crate::graphql::dispatcher::ContentResolver;
use crate::graphql::executor::{ExecutionResult, Executor};
use crate::graphql::schema_index::SchemaIndex;
use crate::storage::StoreResolver;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// A query and its variables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub query: String,

    #[serde(default)]
    pub variables: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl ResolveRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Use the entries of a JSON object as variables; other values are ignored
    pub fn with_variables(mut self, variables: Value) -> Self {
        if let Value::Object(map) = variables {
            self.variables = map;
        }
        self
    }

    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }
}

/// Resolve a query with the default [`StoreResolver`]
pub async fn resolve(
    request: ResolveRequest,
    database: Arc<dyn Database>,
    config: &ResolveConfig,
) -> Result<ExecutionResult> {
    let outcome = execute(request, database, config, |database, content| {
        Arc::new(StoreResolver::new(database, content)) as Arc<dyn DocumentResolver>
    })
    .await;
    finish(outcome, config)
}

/// Resolve a query with a custom document resolver
pub async fn resolve_with(
    request: ResolveRequest,
    database: Arc<dyn Database>,
    documents: Arc<dyn DocumentResolver>,
    config: &ResolveConfig,
) -> Result<ExecutionResult> {
    let outcome = execute(request, database, config, move |_, _| documents).await;
    finish(outcome, config)
}

async fn execute<F>(
    request: ResolveRequest,
    database: Arc<dyn Database>,
    config: &ResolveConfig,
    documents: F,
) -> Result<ExecutionResult>
where
    F: FnOnce(Arc<dyn Database>, Arc<ContentSchema>) -> Arc<dyn DocumentResolver>,
{
    let sdl = database.graphql_schema().await?;
    let schema = SchemaIndex::from_sdl(&sdl)?;
    let content = Arc::new(database.content_schema().await?);
    let documents = documents(database.clone(), content.clone());
    let resolver = ContentResolver::new(database, content, documents).with_verbose(config.verbose);

    tracing::debug!(operation = ?request.operation_name, "executing query");
    let result = Executor::new(&schema, &resolver)
        .execute(
            &request.query,
            request.variables,
            request.operation_name.as_deref(),
        )
        .await;
    Ok(result)
}

fn finish(outcome: Result<ExecutionResult>, config: &ResolveConfig) -> Result<ExecutionResult> {
    match outcome {
        Ok(result) => {
            log_errors(&result.errors, config);
            Ok(result)
        }
        Err(err) => {
            if !config.silence_errors {
                tracing::error!(error = %err, code = err.code(), "unable to resolve query");
            }
            if err.is_graphql_formatted() {
                Ok(ExecutionResult::from_error(err))
            } else {
                Err(err)
            }
        }
    }
}

fn log_errors(errors: &[GraphQLError], config: &ResolveConfig) {
    if config.silence_errors {
        return;
    }
    for error in errors {
        tracing::error!("{}", error);
        if config.verbose {
            tracing::error!("More error context below");
            tracing::error!(message = %error.message, error = ?error, "error context");
        }
    }
}
