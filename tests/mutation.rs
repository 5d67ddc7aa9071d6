mod common;

use common::journal::{QUERY_ONLY, SCHEMA};
use common::Journal;
use futures_await_test::async_test;
use graphql_engine::QueryBuilder;
use serde_json::json;
use std::sync::Arc;

#[async_test]
async fn mutation_runs_fields_in_order() {
    let journal = Arc::new(Journal::default());
    let query = QueryBuilder::new("mutation { first second }").data(journal.clone());

    assert_eq!(
        query.execute(&SCHEMA).await.unwrap().to_json().unwrap(),
        json!({ "data": { "first": 2, "second": 4 } })
    );
    assert_eq!(
        journal.entries(),
        vec!["start first", "end first", "start second", "end second"]
    );
}

#[async_test]
async fn query_interleaves_fields() {
    let journal = Arc::new(Journal::default());
    let query = QueryBuilder::new("query { first second }").data(journal.clone());

    assert_eq!(
        query.execute(&SCHEMA).await.unwrap().to_json().unwrap(),
        json!({ "data": { "first": 3, "second": 4 } })
    );
    assert_eq!(
        journal.entries(),
        vec!["start first", "start second", "end first", "end second"]
    );
}

#[async_test]
async fn mutation_continues_after_error() {
    let journal = Arc::new(Journal::default());
    let query = QueryBuilder::new("mutation { failing second }").data(journal.clone());

    assert_eq!(
        query.execute(&SCHEMA).await.unwrap().to_json().unwrap(),
        json!({
            "data": { "failing": null, "second": 2 },
            "errors": [{
                "message": "Nope.",
                "locations": [{ "line": 1, "column": 12 }],
                "path": ["failing"],
            }]
        })
    );
}

#[async_test]
async fn mutation_without_mutation_type() {
    let query = QueryBuilder::new("mutation { first }").data(Arc::new(Journal::default()));

    assert_eq!(
        query.execute(&QUERY_ONLY).await.unwrap().to_json().unwrap(),
        json!({ "errors": [{ "message": "Schema is not configured for mutations." }] })
    );
}
