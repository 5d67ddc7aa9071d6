use serde_json::Value;

use super::error::{Error, GraphQLError};
use super::query::QueryBuilder;

/// Request body as sent by GraphQL clients.
#[derive(Serialize, Deserialize, Debug)]
pub struct Payload {
    pub query: String,
    #[serde(rename = "operationName")]
    pub operation_name: Option<String>,
    pub variables: Option<Value>,
}

impl Payload {
    pub fn into_query_builder(self) -> QueryBuilder {
        let mut builder = QueryBuilder::new(self.query);

        if let Some(operation_name) = self.operation_name {
            builder = builder.operation_name(operation_name);
        }

        if let Some(variables) = self.variables {
            builder = builder.variables(variables);
        }

        builder
    }
}

/// Response of one operation.
///
/// `data` is absent when execution never started (syntax, validation or
/// variable errors) and `null` when a non-null violation reached the root.
#[derive(Serialize, Debug, PartialEq)]
pub struct ExecutionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,
}

impl ExecutionResult {
    pub fn new(data: Value, errors: Vec<GraphQLError>) -> Self {
        ExecutionResult {
            data: Some(data),
            errors,
        }
    }

    pub fn from_error(err: &Error) -> Self {
        ExecutionResult {
            data: None,
            errors: err.to_graphql_errors(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}
