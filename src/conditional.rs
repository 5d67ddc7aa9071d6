use graphql_parser::query::Directive;
use serde_json::Value;
use tracing::trace;

use super::schema::{Schema, TypeRef};
use super::values::{value_from_ast, Variables};

/// Evaluates `@skip` and `@include` on a selection.
///
/// A selection is included unless `@skip(if: true)` is present or
/// `@include(if: false)` is present. Both directives are honored together.
pub fn should_include(
    schema: &Schema,
    variables: &Variables,
    directives: &[Directive<'_, String>],
) -> bool {
    let skip = directive_condition(schema, variables, directives, "skip").unwrap_or(false);
    let include = directive_condition(schema, variables, directives, "include").unwrap_or(true);

    !skip && include
}

fn directive_condition(
    schema: &Schema,
    variables: &Variables,
    directives: &[Directive<'_, String>],
    name: &str,
) -> Option<bool> {
    let directive = directives.iter().find(|directive| directive.name == name)?;
    let (_, condition) = directive
        .arguments
        .iter()
        .find(|(argument, _)| argument == "if")?;

    match value_from_ast(
        schema,
        condition,
        &TypeRef::named_non_null("Boolean"),
        variables,
    ) {
        Ok(Some(Value::Bool(condition))) => Some(condition),
        other => {
            trace!(directive = name, result = ?other, "Ignoring unusable directive condition.");
            None
        }
    }
}
