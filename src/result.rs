use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::trace;

use super::collector::MergedSelectionSet;
use super::error::{Error, GraphQLError, Result};
use super::step_info::{display_path, ExecutionStepInfo};

/// A composite value waiting for its sub-selection to execute.
pub struct FieldSubSelection<'a> {
    pub source: Value,
    pub step_info: Arc<ExecutionStepInfo<'a>>,
    pub merged_selection_set: MergedSelectionSet<'a>,
}

pub struct ResultNode<'a> {
    pub step_info: Arc<ExecutionStepInfo<'a>>,
    pub value: NodeValue<'a>,
}

pub enum NodeValue<'a> {
    Leaf(Value),
    Object(IndexMap<String, ResultNode<'a>>),
    List(Vec<ResultNode<'a>>),
    /// `reported` is set when the fetch of this position already raised an error.
    Null { reported: bool },
    Unresolved(FieldSubSelection<'a>),
}

impl<'a> ResultNode<'a> {
    pub fn new(step_info: Arc<ExecutionStepInfo<'a>>, value: NodeValue<'a>) -> Self {
        ResultNode { step_info, value }
    }

    pub fn null(step_info: Arc<ExecutionStepInfo<'a>>, reported: bool) -> Self {
        ResultNode::new(step_info, NodeValue::Null { reported })
    }
}

enum Completed {
    Value(Value),
    /// A null reached a non-null position; the nearest nullable ancestor becomes null.
    Collapsed,
}

/// Folds a resolved result tree into response data.
#[derive(Default)]
pub struct ResultAssembler {
    errors: Vec<GraphQLError>,
}

impl ResultAssembler {
    /// Returns the response data and the non-null violations found on the way.
    ///
    /// A collapse reaching the root yields `null` data.
    pub fn assemble(root: ResultNode<'_>) -> Result<(Value, Vec<GraphQLError>)> {
        let mut assembler = ResultAssembler::default();

        let data = match assembler.complete(root)? {
            Completed::Value(value) => value,
            Completed::Collapsed => Value::Null,
        };

        Ok((data, assembler.errors))
    }

    fn complete(&mut self, node: ResultNode<'_>) -> Result<Completed> {
        let ResultNode { step_info, value } = node;

        match value {
            NodeValue::Leaf(Value::Null) => Ok(self.null(&step_info, false)),
            NodeValue::Leaf(value) => Ok(Completed::Value(value)),
            NodeValue::Null { reported } => Ok(self.null(&step_info, reported)),
            NodeValue::Object(children) => {
                let mut object = Map::new();
                let mut collapsed = false;

                for (key, child) in children {
                    match self.complete(child)? {
                        Completed::Value(value) => {
                            object.insert(key, value);
                        }
                        Completed::Collapsed => collapsed = true,
                    }
                }

                if collapsed {
                    return Ok(self.propagate(&step_info));
                }

                Ok(Completed::Value(Value::Object(object)))
            }
            NodeValue::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                let mut collapsed = false;

                for item in items {
                    match self.complete(item)? {
                        Completed::Value(value) => values.push(value),
                        Completed::Collapsed => collapsed = true,
                    }
                }

                if collapsed {
                    return Ok(self.propagate(&step_info));
                }

                Ok(Completed::Value(Value::Array(values)))
            }
            NodeValue::Unresolved(_) => Err(Error::Internal(format!(
                "Unresolved result node at {}",
                display_path(&step_info.path())
            ))),
        }
    }

    fn null(&mut self, step_info: &ExecutionStepInfo<'_>, reported: bool) -> Completed {
        if !step_info.is_non_null() {
            return Completed::Value(Value::Null);
        }

        if !reported {
            let mut error = GraphQLError::new(format!(
                "Cannot return null for non-nullable field \"{}\".",
                step_info.field_coordinates()
            ))
            .with_path(step_info.path());

            if let Some(field) = step_info.field() {
                error = error.at(field.position());
            }

            self.errors.push(error);
        }

        trace!(path = %display_path(&step_info.path()), "Null in non-null position.");
        Completed::Collapsed
    }

    fn propagate(&self, step_info: &ExecutionStepInfo<'_>) -> Completed {
        if step_info.is_non_null() {
            Completed::Collapsed
        } else {
            Completed::Value(Value::Null)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MergedField;
    use crate::schema::TypeRef;
    use crate::step_info::PathSegment;
    use graphql_parser::query::{
        parse_query, Definition, Document, Field, OperationDefinition, Selection,
    };
    use serde_json::json;

    fn fields<'a>(document: &'a Document<'a, String>) -> (&'a Field<'a, String>, &'a Field<'a, String>) {
        let a = match &document.definitions[0] {
            Definition::Operation(OperationDefinition::SelectionSet(set)) => match &set.items[0] {
                Selection::Field(field) => field,
                _ => panic!("expected a field"),
            },
            _ => panic!("expected a selection set"),
        };
        let b = match &a.selection_set.items[0] {
            Selection::Field(field) => field,
            _ => panic!("expected a field"),
        };

        (a, b)
    }

    fn tree<'a>(
        document: &'a Document<'a, String>,
        a_type: TypeRef,
        b: NodeValue<'a>,
    ) -> ResultNode<'a> {
        let (a_field, b_field) = fields(document);
        let root = ExecutionStepInfo::root("Query");
        let a = ExecutionStepInfo::for_field(&root, "a", MergedField::new(a_field), "Query", a_type)
            .with_runtime_type("A");
        let b_info = ExecutionStepInfo::for_field(
            &a,
            "b",
            MergedField::new(b_field),
            "A",
            TypeRef::named_non_null("String"),
        );

        let mut a_children = IndexMap::new();
        a_children.insert("b".to_owned(), ResultNode::new(b_info, b));

        let mut root_children = IndexMap::new();
        root_children.insert(
            "a".to_owned(),
            ResultNode::new(a, NodeValue::Object(a_children)),
        );

        ResultNode::new(root, NodeValue::Object(root_children))
    }

    #[test]
    fn null_bubbles_to_root() {
        let document = parse_query::<String>("{ a { b } }").unwrap();
        let root = tree(
            &document,
            TypeRef::named_non_null("A"),
            NodeValue::Null { reported: false },
        );

        let (data, errors) = ResultAssembler::assemble(root).unwrap();

        assert_eq!(data, Value::Null);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message,
            "Cannot return null for non-nullable field \"A.b\"."
        );
        assert_eq!(
            errors[0].path,
            Some(vec![PathSegment::from("a"), PathSegment::from("b")])
        );
    }

    #[test]
    fn null_stops_at_nullable_ancestor() {
        let document = parse_query::<String>("{ a { b } }").unwrap();
        let root = tree(
            &document,
            TypeRef::named("A"),
            NodeValue::Null { reported: false },
        );

        let (data, errors) = ResultAssembler::assemble(root).unwrap();

        assert_eq!(data, json!({ "a": null }));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn reported_null_adds_no_error() {
        let document = parse_query::<String>("{ a { b } }").unwrap();
        let root = tree(
            &document,
            TypeRef::named("A"),
            NodeValue::Null { reported: true },
        );

        let (data, errors) = ResultAssembler::assemble(root).unwrap();

        assert_eq!(data, json!({ "a": null }));
        assert!(errors.is_empty());
    }

    #[test]
    fn leaves_complete() {
        let document = parse_query::<String>("{ a { b } }").unwrap();
        let root = tree(
            &document,
            TypeRef::named_non_null("A"),
            NodeValue::Leaf(json!("value")),
        );

        let (data, errors) = ResultAssembler::assemble(root).unwrap();

        assert_eq!(data, json!({ "a": { "b": "value" } }));
        assert!(errors.is_empty());
    }

    #[test]
    fn list_item_collapses_list() {
        let document = parse_query::<String>("{ a { b } }").unwrap();
        let (a_field, _) = fields(&document);
        let root = ExecutionStepInfo::root("Query");
        let list = ExecutionStepInfo::for_field(
            &root,
            "a",
            MergedField::new(a_field),
            "Query",
            TypeRef::list(TypeRef::named_non_null("String")),
        );

        let items = vec![
            ResultNode::new(
                ExecutionStepInfo::for_list_item(&list, 0, TypeRef::named_non_null("String")),
                NodeValue::Leaf(json!("x")),
            ),
            ResultNode::null(
                ExecutionStepInfo::for_list_item(&list, 1, TypeRef::named_non_null("String")),
                false,
            ),
        ];

        let mut children = IndexMap::new();
        children.insert("a".to_owned(), ResultNode::new(list, NodeValue::List(items)));

        let (data, errors) =
            ResultAssembler::assemble(ResultNode::new(root, NodeValue::Object(children))).unwrap();

        assert_eq!(data, json!({ "a": null }));
        assert_eq!(
            errors[0].path,
            Some(vec![PathSegment::from("a"), PathSegment::from(1)])
        );
        assert_eq!(
            errors[0].message,
            "Cannot return null for non-nullable field \"Query.a\"."
        );
    }

    #[test]
    fn unresolved_nodes_are_internal_errors() {
        let root = ExecutionStepInfo::root("Query");
        let node = ResultNode::new(
            root.clone(),
            NodeValue::Unresolved(FieldSubSelection {
                source: Value::Null,
                step_info: root,
                merged_selection_set: MergedSelectionSet::default(),
            }),
        );

        match ResultAssembler::assemble(node) {
            Err(Error::Internal(_)) => {}
            _ => panic!("expected an internal error"),
        }
    }
}
