use futures::future::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::debug;

use super::context::ExecutionContext;
use super::error::{GraphQLError, ResolverError};
use super::resolver::{PropertyResolver, Resolved, Resolver, ResolverContext};
use super::schema::Field;
use super::step_info::{display_path, ExecutionStepInfo};
use super::values::coerce_arguments;

/// Raw value of a field before completion, with the errors its resolver raised.
#[derive(Debug, PartialEq)]
pub struct FetchedValue {
    pub value: Value,
    pub errors: Vec<GraphQLError>,
}

impl FetchedValue {
    fn null(errors: Vec<GraphQLError>) -> Self {
        FetchedValue {
            value: Value::Null,
            errors,
        }
    }
}

/// Calls the resolver of `field_def` for one position of the result.
///
/// Argument coercion failures, resolver errors and panics all become field
/// errors located at the field; the value is then `null`.
pub async fn fetch_value<'a>(
    ctx: &'a ExecutionContext<'a>,
    source: &Value,
    field_def: &Field,
    step_info: &ExecutionStepInfo<'a>,
) -> FetchedValue {
    let field = match step_info.field() {
        Some(field) => field,
        _ => return FetchedValue::null(vec![]),
    };
    let path = step_info.path();
    let pos = field.position();

    let field_error = |message: String| {
        GraphQLError::new(message)
            .at(pos)
            .with_path(path.clone())
    };

    let arguments = match coerce_arguments(
        ctx.schema,
        &field_def.args,
        field.arguments(),
        &ctx.variables,
    ) {
        Ok(arguments) => arguments,
        Err(err) => {
            debug!(path = %display_path(&path), error = %err, "Invalid field arguments.");
            return FetchedValue::null(vec![field_error(format!(
                "Argument error on field \"{}\": {}",
                field.name(),
                err
            ))]);
        }
    };

    let resolver_ctx = ResolverContext::new(
        source.clone(),
        arguments,
        step_info.view(),
        ctx.data.clone(),
    );

    let resolver: Arc<dyn Resolver> = match &field_def.resolver {
        Some(resolver) => resolver.clone(),
        _ => Arc::new(PropertyResolver),
    };

    let future = match panic::catch_unwind(AssertUnwindSafe(|| resolver.resolve(resolver_ctx))) {
        Ok(future) => future,
        Err(payload) => return FetchedValue::null(vec![field_error(panic_message(payload))]),
    };

    let mut outcome = match AssertUnwindSafe(future).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => return FetchedValue::null(vec![field_error(panic_message(payload))]),
    };

    loop {
        outcome = match outcome {
            Ok(Resolved::Deferred(future)) => match AssertUnwindSafe(future).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(payload) => {
                    return FetchedValue::null(vec![field_error(panic_message(payload))])
                }
            },
            Ok(Resolved::Value(value)) => {
                return FetchedValue {
                    value,
                    errors: vec![],
                }
            }
            Ok(Resolved::Absent) => return FetchedValue::null(vec![]),
            Ok(Resolved::Partial { data, errors }) => {
                debug!(
                    path = %display_path(&path),
                    errors = errors.len(),
                    "Resolver returned partial data."
                );
                return FetchedValue {
                    value: data,
                    errors: errors
                        .into_iter()
                        .map(|err| GraphQLError::from_resolver_error(err, &path, pos))
                        .collect(),
                };
            }
            Err(err) => {
                debug!(path = %display_path(&path), error = %err, "Resolver failed.");
                return FetchedValue::null(vec![GraphQLError::from_resolver_error(
                    err, &path, pos,
                )]);
            }
        };
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    let err = match payload.downcast_ref::<&str>() {
        Some(message) => ResolverError::new(*message),
        _ => match payload.downcast_ref::<String>() {
            Some(message) => ResolverError::new(message.as_str()),
            _ => ResolverError::new("Resolver panicked."),
        },
    };

    debug!(error = %err, "Resolver panicked.");
    err.message
}
