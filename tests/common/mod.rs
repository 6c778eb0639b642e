//! Shared fixtures
//!
//! The blog project of `demos/content.yaml`: two collections (`post`,
//! `author`), a compiled schema and the lookup table that goes with it.

#![allow(dead_code)]

use contentgraph::prelude::*;

pub const SNAPSHOT: &str = include_str!("../../demos/content.yaml");

/// Database seeded with the blog fixture
pub fn database() -> InMemoryDatabase {
    let snapshot = DatabaseSnapshot::from_yaml_str(SNAPSHOT).expect("fixture snapshot parses");
    InMemoryDatabase::from_snapshot(snapshot).expect("fixture snapshot is consistent")
}

/// Run a query against `database` with the default resolver
pub async fn run(database: &InMemoryDatabase, query: &str) -> ExecutionResult {
    run_with_variables(database, query, json!({})).await
}

pub async fn run_with_variables(
    database: &InMemoryDatabase,
    query: &str,
    variables: Value,
) -> ExecutionResult {
    init_tracing();
    resolve(
        ResolveRequest::new(query).with_variables(variables),
        Arc::new(database.clone()),
        &ResolveConfig::silent(),
    )
    .await
    .expect("resolve should not fail at the top level")
}

/// Data of a result that must have no errors
pub fn data(result: ExecutionResult) -> Value {
    assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
    result.data.expect("result should carry data")
}

/// Route logs to the test writer, once per binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
