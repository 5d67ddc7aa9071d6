use futures::future::{join_all, try_join_all, BoxFuture, FutureExt};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};

use super::collector::{MergedField, MergedSelectionSet};
use super::context::ExecutionContext;
use super::error::{Error, GraphQLError, Result};
use super::fetcher::fetch_value;
use super::result::{FieldSubSelection, NodeValue, ResultNode};
use super::schema::{MetaType, TypeRef};
use super::step_info::{display_path, ExecutionStepInfo};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Every field of a level starts without waiting for its siblings.
    Parallel,
    /// Each field, subtree included, completes before the next one starts.
    Serial,
}

/// Resolves every field of a sub-selection into an object node.
///
/// `mode` applies to this level only; nested levels always run in parallel.
pub fn execute<'a>(
    ctx: &'a ExecutionContext<'a>,
    sub_selection: FieldSubSelection<'a>,
    mode: ExecutionMode,
) -> BoxFuture<'a, Result<ResultNode<'a>>> {
    async move {
        let FieldSubSelection {
            source,
            step_info,
            merged_selection_set,
        } = sub_selection;
        let source = Arc::new(source);
        let mut children = IndexMap::with_capacity(merged_selection_set.len());

        match mode {
            ExecutionMode::Parallel => {
                let keys = merged_selection_set.keys().collect::<Vec<&'a str>>();
                let futures = merged_selection_set
                    .into_iter()
                    .map(|(key, field)| {
                        resolve_field(ctx, source.clone(), step_info.clone(), key, field)
                    })
                    .collect::<Vec<BoxFuture<'a, Result<Option<ResultNode<'a>>>>>>();

                for (key, node) in keys.into_iter().zip(join_all(futures).await) {
                    if let Some(node) = node? {
                        children.insert(key.to_owned(), node);
                    }
                }
            }
            ExecutionMode::Serial => {
                for (key, field) in merged_selection_set {
                    let node = resolve_field(ctx, source.clone(), step_info.clone(), key, field);
                    if let Some(node) = node.await? {
                        children.insert(key.to_owned(), node);
                    }
                }
            }
        }

        Ok(ResultNode::new(step_info, NodeValue::Object(children)))
    }
    .boxed()
}

fn resolve_field<'a>(
    ctx: &'a ExecutionContext<'a>,
    source: Arc<Value>,
    parent: Arc<ExecutionStepInfo<'a>>,
    result_key: &'a str,
    field: MergedField<'a>,
) -> BoxFuture<'a, Result<Option<ResultNode<'a>>>> {
    async move {
        let object_type = match parent.runtime_type() {
            Some(object_type) => object_type,
            _ => {
                return Err(Error::Internal(format!(
                    "Missing runtime type at {}",
                    display_path(&parent.path())
                )))
            }
        };

        if field.name() == "__typename" {
            let step_info = ExecutionStepInfo::for_field(
                &parent,
                result_key,
                field,
                object_type,
                TypeRef::named_non_null("String"),
            );
            let value = Value::String(object_type.to_owned());

            return Ok(Some(ResultNode::new(step_info, NodeValue::Leaf(value))));
        }

        let field_def = match ctx.schema.field(object_type, field.name()) {
            Some(field_def) => field_def,
            _ => {
                debug!(
                    object = object_type,
                    field = field.name(),
                    "Skipping field missing from the schema."
                );
                return Ok(None);
            }
        };

        let step_info = ExecutionStepInfo::for_field(
            &parent,
            result_key,
            field,
            object_type,
            field_def.field_type.clone(),
        );
        let path = display_path(&step_info.path());
        let resolver = match field_def.resolver {
            Some(_) => "custom",
            _ => "property",
        };

        debug!(path = %path, resolver, "Fetching field.");

        let fetched = fetch_value(ctx, &source, field_def, &step_info).await;
        let reported = !fetched.errors.is_empty();

        debug!(path = %path, errors = fetched.errors.len(), "Fetched field.");
        ctx.add_errors(fetched.errors);

        let node = analyze(ctx, step_info, fetched.value, reported)?;
        resolve_node(ctx, node).await.map(Some)
    }
    .boxed()
}

/// Turns a fetched value into a node according to the position's type.
///
/// Leaves are serialized, lists fan out per element and composite values are
/// left unresolved with their sub-selection collected for the concrete type.
fn analyze<'a>(
    ctx: &'a ExecutionContext<'a>,
    step_info: Arc<ExecutionStepInfo<'a>>,
    value: Value,
    reported: bool,
) -> Result<ResultNode<'a>> {
    if value.is_null() {
        return Ok(ResultNode::null(step_info, reported));
    }

    let field_type = step_info.field_type().nullable().clone();

    match field_type {
        TypeRef::List(item_type) => {
            let items = match value {
                Value::Array(items) => items,
                value => {
                    field_error(
                        ctx,
                        &step_info,
                        format!(
                            "Expected a list for field \"{}\", found {}.",
                            step_info.field_coordinates(),
                            value
                        ),
                    );
                    return Ok(ResultNode::null(step_info, true));
                }
            };

            let nodes = items
                .into_iter()
                .enumerate()
                .map(|(index, item)| {
                    let item_info =
                        ExecutionStepInfo::for_list_item(&step_info, index, (*item_type).clone());
                    analyze(ctx, item_info, item, false)
                })
                .collect::<Result<Vec<ResultNode<'a>>>>()?;

            Ok(ResultNode::new(step_info, NodeValue::List(nodes)))
        }
        TypeRef::Named(name) => {
            let serialized = match ctx.schema.get_type(&name) {
                Some(MetaType::Scalar(scalar)) => scalar.coercing.serialize(&value),
                Some(MetaType::Enum(enum_type)) => enum_type.serialize(&value),
                Some(MetaType::Object(object)) => {
                    return Ok(unresolved(ctx, &step_info, &object.name, value))
                }
                Some(meta_type) if meta_type.is_abstract() => {
                    return match ctx.schema.resolve_abstract_type(&name, &value) {
                        Some(object) => {
                            trace!(
                                path = %display_path(&step_info.path()),
                                abstract_type = name.as_str(),
                                object = object.name.as_str(),
                                "Resolved abstract type."
                            );
                            Ok(unresolved(ctx, &step_info, &object.name, value))
                        }
                        _ => {
                            field_error(
                                ctx,
                                &step_info,
                                format!(
                                    "Could not determine the concrete type of abstract type \"{}\".",
                                    name
                                ),
                            );
                            Ok(ResultNode::null(step_info, true))
                        }
                    };
                }
                _ => {
                    return Err(Error::Internal(format!(
                        "Type \"{}\" of field \"{}\" is not an output type",
                        name,
                        step_info.field_coordinates()
                    )))
                }
            };

            match serialized {
                Ok(value) => Ok(ResultNode::new(step_info, NodeValue::Leaf(value))),
                Err(err) => {
                    field_error(ctx, &step_info, err.to_string());
                    Ok(ResultNode::null(step_info, true))
                }
            }
        }
        TypeRef::NonNull(_) => Err(Error::Internal(format!(
            "Nested non-null type on field \"{}\"",
            step_info.field_coordinates()
        ))),
    }
}

fn unresolved<'a>(
    ctx: &'a ExecutionContext<'a>,
    step_info: &ExecutionStepInfo<'a>,
    object_type: &str,
    value: Value,
) -> ResultNode<'a> {
    let step_info = step_info.with_runtime_type(object_type);
    let merged_selection_set = match step_info.field() {
        Some(field) => ctx.collector().collect_sub_fields(field, object_type),
        _ => MergedSelectionSet::default(),
    };

    ResultNode::new(
        step_info.clone(),
        NodeValue::Unresolved(FieldSubSelection {
            source: value,
            step_info,
            merged_selection_set,
        }),
    )
}

fn resolve_node<'a>(
    ctx: &'a ExecutionContext<'a>,
    node: ResultNode<'a>,
) -> BoxFuture<'a, Result<ResultNode<'a>>> {
    async move {
        let ResultNode { step_info, value } = node;

        match value {
            NodeValue::Unresolved(sub_selection) => {
                execute(ctx, sub_selection, ExecutionMode::Parallel).await
            }
            NodeValue::List(items) => {
                let items = try_join_all(items.into_iter().map(|item| resolve_node(ctx, item)))
                    .await?;

                Ok(ResultNode::new(step_info, NodeValue::List(items)))
            }
            value => Ok(ResultNode::new(step_info, value)),
        }
    }
    .boxed()
}

fn field_error(ctx: &ExecutionContext<'_>, step_info: &ExecutionStepInfo<'_>, message: String) {
    let mut error = GraphQLError::new(message).with_path(step_info.path());

    if let Some(field) = step_info.field() {
        error = error.at(field.position());
    }

    debug!(path = %display_path(&step_info.path()), error = %error.message, "Field error.");
    ctx.add_error(error);
}
