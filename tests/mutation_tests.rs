//! Document mutations through the default store resolver

#![cfg(feature = "in-memory")]

mod common;

use common::{data, database, run, run_with_variables};
use contentgraph::prelude::*;

#[tokio::test]
async fn test_delete_document_removes_record() {
    let db = database();
    let result = run(
        &db,
        r#"mutation { deleteDocument(collection: "post", relativePath: "second.md") { __typename ... on Post { title } } }"#,
    )
    .await;

    assert_eq!(
        data(result),
        json!({ "deleteDocument": { "__typename": "Post", "title": "Second Post" } })
    );
    assert!(db.get("content/posts/second.md").await.unwrap().is_none());

    let count = run(&db, r#"{ collection(collection: "post") { documents { totalCount } } }"#).await;
    assert_eq!(data(count)["collection"]["documents"]["totalCount"], 2);
}

#[tokio::test]
async fn test_create_document_with_generic_params() {
    let db = database();
    let result = run_with_variables(
        &db,
        r#"mutation Create($params: JSON!) {
            createDocument(collection: "author", relativePath: "joe.md", params: $params) {
                ... on Author { name id }
            }
        }"#,
        json!({ "params": { "author": { "name": "Joe Bloggs" } } }),
    )
    .await;

    assert_eq!(
        data(result),
        json!({ "createDocument": { "name": "Joe Bloggs", "id": "content/authors/joe.md" } })
    );
    let record = db.get("content/authors/joe.md").await.unwrap().unwrap();
    assert_eq!(record.collection, "author");
    assert_eq!(record.data, json!({ "name": "Joe Bloggs" }));
}

#[tokio::test]
async fn test_create_existing_document_fails() {
    let db = database();
    let result = run(
        &db,
        r#"mutation { createPost(relativePath: "hello.md", params: { title: "Again" }) { title } }"#,
    )
    .await;

    assert_eq!(result.data, Some(Value::Null));
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].extensions.code, "ALREADY_EXISTS");

    let record = db.get("content/posts/hello.md").await.unwrap().unwrap();
    assert_eq!(record.data["title"], "Hello World");
}

#[tokio::test]
async fn test_collection_specific_create_and_update() {
    let db = database();
    let created = run(
        &db,
        r#"mutation { createPost(relativePath: "fourth.md", params: { title: "Fourth", rating: 1 }) { title rating } }"#,
    )
    .await;
    assert_eq!(
        data(created),
        json!({ "createPost": { "title": "Fourth", "rating": 1 } })
    );

    let updated = run(
        &db,
        r#"mutation { updatePost(relativePath: "fourth.md", params: { rating: 3 }) { title rating } }"#,
    )
    .await;
    assert_eq!(
        data(updated),
        json!({ "updatePost": { "title": "Fourth", "rating": 3 } })
    );
}

#[tokio::test]
async fn test_update_document_renames() {
    let db = database();
    let result = run(
        &db,
        r#"mutation {
            updateDocument(collection: "post", relativePath: "third.md", params: { relativePath: "renamed.md", post: { rating: 1 } }) {
                ... on Post { id title rating }
            }
        }"#,
    )
    .await;

    assert_eq!(
        data(result),
        json!({
            "updateDocument": { "id": "content/posts/renamed.md", "title": "Third Post", "rating": 1 }
        })
    );
    assert!(db.get("content/posts/third.md").await.unwrap().is_none());
    assert!(db.get("content/posts/renamed.md").await.unwrap().is_some());
}

#[tokio::test]
async fn test_add_pending_document() {
    let db = database();
    let result = run(
        &db,
        r#"mutation { addPendingDocument(collection: "post", relativePath: "draft.md") { __typename ... on Post { _sys { filename } } } }"#,
    )
    .await;

    assert_eq!(
        data(result),
        json!({ "addPendingDocument": { "__typename": "Post", "_sys": { "filename": "draft" } } })
    );
    let record = db.get("content/posts/draft.md").await.unwrap().unwrap();
    assert_eq!(record.data, json!({}));
}

#[tokio::test]
async fn test_mutation_root_fields_run_in_order() {
    let db = database();
    let result = run(
        &db,
        r#"mutation {
            first: createPost(relativePath: "seq.md", params: { title: "Seq" }) { title }
            second: updatePost(relativePath: "seq.md", params: { title: "Seq 2" }) { title }
        }"#,
    )
    .await;

    assert_eq!(
        data(result),
        json!({ "first": { "title": "Seq" }, "second": { "title": "Seq 2" } })
    );
}
