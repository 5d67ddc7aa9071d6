use fnv::{FnvHashMap, FnvHashSet};
use graphql_parser::query::{
    Definition, Document, Field, FragmentDefinition, OperationDefinition, Selection, SelectionSet,
    TypeCondition, Value as AstValue,
};
use graphql_parser::Pos;

use super::error::{QueryError, ValidationError};
use super::schema::{MetaType, Schema};

/// Checks a document against a schema before execution.
pub trait Validator: Send + Sync {
    fn validate<'a>(&self, schema: &Schema, document: &'a Document<'a, String>)
        -> Vec<ValidationError>;
}

/// Default rules: fields exist on their parent type, fragments are known,
/// conditioned on known composite types and free of cycles, required
/// arguments are given and leaf fields have no sub-selection.
#[derive(Clone, Copy, Debug, Default)]
pub struct DocumentValidator;

impl Validator for DocumentValidator {
    fn validate<'a>(
        &self,
        schema: &Schema,
        document: &'a Document<'a, String>,
    ) -> Vec<ValidationError> {
        let mut ctx = ValidationContext {
            schema,
            fragments: FnvHashMap::default(),
            errors: vec![],
        };

        for definition in &document.definitions {
            if let Definition::Fragment(fragment) = definition {
                ctx.fragments.insert(fragment.name.as_str(), fragment);
            }
        }

        for definition in &document.definitions {
            match definition {
                Definition::Operation(operation) => {
                    let (root_type, selection_set) = match operation {
                        OperationDefinition::SelectionSet(set) => (Some(schema.query_type()), set),
                        OperationDefinition::Query(query) => {
                            (Some(schema.query_type()), &query.selection_set)
                        }
                        OperationDefinition::Mutation(mutation) => {
                            (schema.mutation_type(), &mutation.selection_set)
                        }
                        OperationDefinition::Subscription(subscription) => {
                            (schema.subscription_type(), &subscription.selection_set)
                        }
                    };

                    ctx.visit_selection_set(selection_set, root_type);
                }
                Definition::Fragment(fragment) => {
                    let TypeCondition::On(type_name) = &fragment.type_condition;
                    let parent_type = ctx.check_type_condition(type_name, fragment.position);

                    ctx.visit_selection_set(&fragment.selection_set, parent_type);
                    ctx.check_fragment_cycle(fragment);
                }
            }
        }

        ctx.errors
    }
}

struct ValidationContext<'s, 'd> {
    schema: &'s Schema,
    fragments: FnvHashMap<&'d str, &'d FragmentDefinition<'d, String>>,
    errors: Vec<ValidationError>,
}

impl<'s, 'd> ValidationContext<'s, 'd> {
    fn error(&mut self, pos: Pos, err: QueryError) {
        self.errors.push(ValidationError::new(pos, err));
    }

    /// Returns the condition's name when it is a known composite type.
    fn check_type_condition<'t>(&mut self, type_name: &'t str, pos: Pos) -> Option<&'t str> {
        match self.schema.get_type(type_name) {
            Some(meta_type) if meta_type.is_composite() => Some(type_name),
            Some(_) => {
                self.error(
                    pos,
                    QueryError::FragmentOnNonCompositeType {
                        name: type_name.to_owned(),
                    },
                );
                None
            }
            None => {
                self.error(
                    pos,
                    QueryError::UnknownType {
                        name: type_name.to_owned(),
                    },
                );
                None
            }
        }
    }

    /// `parent_type` is `None` when an enclosing error already made the type unknown.
    fn visit_selection_set(
        &mut self,
        selection_set: &'d SelectionSet<'d, String>,
        parent_type: Option<&str>,
    ) {
        for selection in &selection_set.items {
            match selection {
                Selection::Field(field) => self.visit_field(field, parent_type),
                Selection::InlineFragment(fragment) => {
                    let parent_type = match &fragment.type_condition {
                        Some(TypeCondition::On(type_name)) => {
                            self.check_type_condition(type_name, fragment.position)
                        }
                        None => parent_type,
                    };

                    self.visit_selection_set(&fragment.selection_set, parent_type);
                }
                Selection::FragmentSpread(spread) => {
                    if !self.fragments.contains_key(spread.fragment_name.as_str()) {
                        self.error(
                            spread.position,
                            QueryError::UnknownFragment {
                                name: spread.fragment_name.clone(),
                            },
                        );
                    }
                }
            }
        }
    }

    fn visit_field(&mut self, field: &'d Field<'d, String>, parent_type: Option<&str>) {
        let parent_type = match parent_type {
            Some(parent_type) => parent_type,
            None => return,
        };

        if field.name == "__typename" {
            return;
        }

        let schema = self.schema;
        let field_def = match schema.field(parent_type, &field.name) {
            Some(field_def) => field_def,
            None => {
                self.error(
                    field.position,
                    QueryError::FieldNotFound {
                        name: field.name.clone(),
                        object: parent_type.to_owned(),
                    },
                );
                return;
            }
        };

        for (name, argument) in &field_def.args {
            let provided = field
                .arguments
                .iter()
                .any(|(argument_name, value)| argument_name == name && *value != AstValue::Null);

            if argument.input_type.is_non_null() && argument.default_value.is_none() && !provided {
                self.error(
                    field.position,
                    QueryError::MissingArgument {
                        field: field.name.clone(),
                        argument: name.clone(),
                        argument_type: argument.input_type.to_string(),
                    },
                );
            }
        }

        let field_type = &field_def.field_type;
        let has_selection = !field.selection_set.items.is_empty();

        match schema.get_type(field_type.name()) {
            Some(MetaType::Scalar(_)) | Some(MetaType::Enum(_)) if has_selection => {
                self.error(
                    field.position,
                    QueryError::NoSubselectionAllowed {
                        field: field.name.clone(),
                        field_type: field_type.to_string(),
                    },
                );
            }
            Some(meta_type) if meta_type.is_composite() => {
                if !has_selection {
                    self.error(
                        field.position,
                        QueryError::RequiredSubselection {
                            field: field.name.clone(),
                            field_type: field_type.to_string(),
                        },
                    );
                }

                self.visit_selection_set(&field.selection_set, Some(meta_type.name()));
            }
            _ => {}
        }
    }

    fn check_fragment_cycle(&mut self, fragment: &'d FragmentDefinition<'d, String>) {
        let mut visited = FnvHashSet::default();
        let mut pending = spreads(&fragment.selection_set);

        while let Some(name) = pending.pop() {
            if name == fragment.name {
                self.error(
                    fragment.position,
                    QueryError::FragmentCycle {
                        name: fragment.name.clone(),
                    },
                );
                return;
            }

            if !visited.insert(name) {
                continue;
            }

            if let Some(next) = self.fragments.get(name).copied() {
                pending.extend(spreads(&next.selection_set));
            }
        }
    }
}

/// Names of every fragment spread in a selection set, nested ones included.
fn spreads<'d>(selection_set: &'d SelectionSet<'d, String>) -> Vec<&'d str> {
    let mut names = vec![];

    for selection in &selection_set.items {
        match selection {
            Selection::Field(field) => names.extend(spreads(&field.selection_set)),
            Selection::InlineFragment(fragment) => names.extend(spreads(&fragment.selection_set)),
            Selection::FragmentSpread(spread) => names.push(spread.fragment_name.as_str()),
        }
    }

    names
}
