//! Resolve a few queries against a YAML content snapshot
//!
//! ```sh
//! RUST_LOG=contentgraph=debug cargo run --example resolve_snapshot [snapshot.yaml]
//! ```
//!
//! Without an argument the bundled `demos/content.yaml` blog is used.

use contentgraph::prelude::*;
use tracing_subscriber::EnvFilter;

const BUNDLED_SNAPSHOT: &str = include_str!("content.yaml");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("📚 contentgraph snapshot demo\n");

    let snapshot = match std::env::args().nth(1) {
        Some(path) => DatabaseSnapshot::from_yaml_file(&path)?,
        None => DatabaseSnapshot::from_yaml_str(BUNDLED_SNAPSHOT)?,
    };
    println!(
        "Loaded {} collections, {} documents",
        snapshot.collections.len(),
        snapshot.documents.len()
    );
    let database = Arc::new(InMemoryDatabase::from_snapshot(snapshot)?);
    let config = ResolveConfig::default();

    let queries = [
        (
            "Collections",
            "{ collections { name documents { totalCount } } }",
        ),
        (
            "Post with author and blocks",
            r#"{
                post(relativePath: "hello.md") {
                    title
                    author { ... on Author { name } }
                    blocks {
                        __typename
                        ... on PostBlocksHero { heading }
                        ... on PostBlocksText { body }
                    }
                }
            }"#,
        ),
        (
            "Optimized query",
            r#"{ getOptimizedQuery(queryString: "{ post(relativePath: \"hello.md\") { ...F } } fragment F on Post { title }") }"#,
        ),
        (
            "Create a post",
            r#"mutation { createPost(relativePath: "demo.md", params: { title: "Demo", rating: 3 }) { id title } }"#,
        ),
        (
            "Broken reference",
            r#"{ node(id: "content/posts/missing.md") { id } }"#,
        ),
    ];

    for (label, query) in queries {
        println!("== {} ==", label);
        let result = resolve(ResolveRequest::new(query), database.clone(), &config).await?;
        println!("{}\n", serde_json::to_string_pretty(&result.to_json())?);
    }

    Ok(())
}
