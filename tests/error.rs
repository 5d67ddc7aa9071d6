mod common;

use common::pets::SCHEMA;
use futures_await_test::async_test;
use graphql_engine::{QueryBuilder, Schema, ValidationError, Validator};
use graphql_parser::query::Document;
use serde_json::json;

#[async_test]
async fn error_syntax() {
    let result = QueryBuilder::new("{ pets ").execute(&SCHEMA).await.unwrap();

    assert_eq!(result.data, None);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].message.starts_with("Syntax error"));
}

#[async_test]
async fn error_validation() {
    let query = QueryBuilder::new("{ nope pets { name } }");

    assert_eq!(
        query.execute(&SCHEMA).await.unwrap().to_json().unwrap(),
        json!({
            "errors": [{
                "message": "Cannot query field \"nope\" on type \"Query\".",
                "locations": [{ "line": 1, "column": 3 }],
            }]
        })
    );
}

struct AcceptAll;

impl Validator for AcceptAll {
    fn validate<'a>(&self, _: &Schema, _: &'a Document<'a, String>) -> Vec<ValidationError> {
        vec![]
    }
}

#[async_test]
async fn error_custom_validator() {
    let query = QueryBuilder::new("{ nope greet }").validator(AcceptAll);

    assert_eq!(
        query.execute(&SCHEMA).await.unwrap().to_json().unwrap(),
        json!({ "data": { "greet": "Hello, world" } })
    );
}

#[async_test]
async fn error_operations() {
    let messages = vec![
        (QueryBuilder::new("query A { greet } query B { greet }"), "Must provide operation name if query contains multiple operations."),
        (QueryBuilder::new("query A { greet }").operation_name("C"), "Unknown operation named \"C\"."),
        (QueryBuilder::new("fragment F on Query { greet }"), "Must provide an operation."),
        (QueryBuilder::new("subscription { greet }"), "Not supported."),
        (QueryBuilder::new("mutation { greet }"), "Schema is not configured for mutations."),
    ];

    for (query, message) in messages {
        assert_eq!(
            query.execute(&SCHEMA).await.unwrap().to_json().unwrap(),
            json!({ "errors": [{ "message": message }] })
        );
    }
}

#[async_test]
async fn error_variables() {
    let query = QueryBuilder::new(
        "query ($withName: Boolean!, $times: Int) { greet(times: $times) pets { name @include(if: $withName) } }",
    )
    .variables(json!({ "times": "x" }));

    assert_eq!(
        query.execute(&SCHEMA).await.unwrap().to_json().unwrap(),
        json!({
            "errors": [
                { "message": "Variable \"$withName\" of required type \"Boolean!\" was not provided." },
                { "message": "Variable \"$times\" got invalid value; Int cannot represent value: \"x\"" },
            ]
        })
    );

    let query = QueryBuilder::new("{ greet }").variables(json!([1]));

    assert_eq!(
        query.execute(&SCHEMA).await.unwrap().to_json().unwrap(),
        json!({ "errors": [{ "message": "Variables cannot represent value: [1]" }] })
    );
}

#[async_test]
async fn error_arguments() {
    let query = QueryBuilder::new("{ greet(times: \"x\") other: greet }");

    assert_eq!(
        query.execute(&SCHEMA).await.unwrap().to_json().unwrap(),
        json!({
            "data": { "greet": null, "other": "Hello, world" },
            "errors": [{
                "message": "Argument error on field \"greet\": Expected type \"Int\", found \"x\".",
                "locations": [{ "line": 1, "column": 3 }],
                "path": ["greet"],
            }]
        })
    );
}

#[async_test]
async fn error_panic_is_isolated() {
    let query = QueryBuilder::new("{ panics greet }");

    assert_eq!(
        query.execute(&SCHEMA).await.unwrap().to_json().unwrap(),
        json!({
            "data": { "panics": null, "greet": "Hello, world" },
            "errors": [{
                "message": "kaboom",
                "locations": [{ "line": 1, "column": 3 }],
                "path": ["panics"],
            }]
        })
    );
}

#[async_test]
async fn error_partial_data() {
    let query = QueryBuilder::new("{ partial viewer }");

    assert_eq!(
        query.execute(&SCHEMA).await.unwrap().to_json().unwrap(),
        json!({
            "data": { "partial": [1, null, 3], "viewer": null },
            "errors": [
                {
                    "message": "Second item is gone.",
                    "locations": [{ "line": 1, "column": 3 }],
                    "path": ["partial", 1],
                },
                {
                    "message": "Not signed in.",
                    "locations": [{ "line": 1, "column": 11 }],
                    "path": ["viewer"],
                },
            ]
        })
    );
}
