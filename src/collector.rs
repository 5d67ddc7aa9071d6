use fnv::FnvHashSet;
use graphql_parser::query::{
    Definition, Document, Field, FragmentDefinition, Selection, SelectionSet, TypeCondition,
    Value as AstValue,
};
use graphql_parser::Pos;
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::trace;

use super::conditional::should_include;
use super::schema::Schema;
use super::values::Variables;

pub type Fragments<'a> = HashMap<&'a str, &'a FragmentDefinition<'a, String>>;

/// All AST fields sharing one response key, in document order.
#[derive(Clone, Debug)]
pub struct MergedField<'a> {
    fields: Vec<&'a Field<'a, String>>,
}

impl<'a> MergedField<'a> {
    pub fn new(field: &'a Field<'a, String>) -> Self {
        MergedField {
            fields: vec![field],
        }
    }

    /// The first occurrence.
    pub fn single_field(&self) -> &'a Field<'a, String> {
        self.fields[0]
    }

    pub fn name(&self) -> &'a str {
        &self.single_field().name
    }

    pub fn result_key(&self) -> &'a str {
        let field = self.single_field();
        field.alias.as_deref().unwrap_or(&field.name)
    }

    pub fn arguments(&self) -> &'a [(String, AstValue<'a, String>)] {
        &self.single_field().arguments
    }

    pub fn fields(&self) -> &[&'a Field<'a, String>] {
        &self.fields
    }

    pub fn position(&self) -> Pos {
        self.single_field().position
    }

    fn push(&mut self, field: &'a Field<'a, String>) {
        if !self.fields.iter().any(|f| std::ptr::eq(*f, field)) {
            self.fields.push(field);
        }
    }
}

/// Response keys of one object, in first-appearance order.
#[derive(Clone, Debug, Default)]
pub struct MergedSelectionSet<'a> {
    fields: IndexMap<&'a str, MergedField<'a>>,
}

impl<'a> MergedSelectionSet<'a> {
    pub fn keys(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.fields.keys().copied()
    }

    pub fn get(&self, key: &str) -> Option<&MergedField<'a>> {
        self.fields.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &MergedField<'a>)> + '_ {
        self.fields.iter().map(|(key, field)| (*key, field))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for MergedSelectionSet<'a> {
    type Item = (&'a str, MergedField<'a>);
    type IntoIter = indexmap::map::IntoIter<&'a str, MergedField<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Flattens selection sets into merged fields for a concrete object type.
///
/// Fragments whose type condition does not apply to the object type are
/// dropped, as are selections excluded by `@skip` or `@include`.
pub struct FieldCollector<'a> {
    schema: &'a Schema,
    fragments: &'a Fragments<'a>,
    variables: &'a Variables,
}

impl<'a> FieldCollector<'a> {
    pub fn new(schema: &'a Schema, fragments: &'a Fragments<'a>, variables: &'a Variables) -> Self {
        FieldCollector {
            schema,
            fragments,
            variables,
        }
    }

    pub fn collect(
        &self,
        object_type: &str,
        selection_set: &'a SelectionSet<'a, String>,
    ) -> MergedSelectionSet<'a> {
        let mut result = MergedSelectionSet::default();
        self.collect_into(selection_set, object_type, &FnvHashSet::default(), &mut result);
        result
    }

    /// Sub-selections of every occurrence of `merged`, collected as one set.
    pub fn collect_sub_fields(
        &self,
        merged: &MergedField<'a>,
        object_type: &str,
    ) -> MergedSelectionSet<'a> {
        let mut result = MergedSelectionSet::default();

        for field in merged.fields() {
            self.collect_into(
                &field.selection_set,
                object_type,
                &FnvHashSet::default(),
                &mut result,
            );
        }

        result
    }

    fn collect_into(
        &self,
        selection_set: &'a SelectionSet<'a, String>,
        object_type: &str,
        visited: &FnvHashSet<&'a str>,
        result: &mut MergedSelectionSet<'a>,
    ) {
        for selection in &selection_set.items {
            match selection {
                Selection::Field(field) => {
                    if !should_include(self.schema, self.variables, &field.directives) {
                        continue;
                    }

                    let key = field.alias.as_deref().unwrap_or(&field.name);
                    match result.fields.get_mut(key) {
                        Some(merged) => merged.push(field),
                        None => {
                            result.fields.insert(key, MergedField::new(field));
                        }
                    }
                }
                Selection::InlineFragment(fragment) => {
                    if !should_include(self.schema, self.variables, &fragment.directives) {
                        continue;
                    }

                    if let Some(TypeCondition::On(condition)) = &fragment.type_condition {
                        if !self.schema.is_possible_type(condition, object_type) {
                            continue;
                        }
                    }

                    self.collect_into(&fragment.selection_set, object_type, visited, result);
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.fragment_name.as_str();

                    if visited.contains(name)
                        || !should_include(self.schema, self.variables, &spread.directives)
                    {
                        continue;
                    }

                    let fragment = match self.fragments.get(name) {
                        Some(fragment) => *fragment,
                        _ => {
                            trace!(fragment = name, "Skipping unknown fragment.");
                            continue;
                        }
                    };

                    if !should_include(self.schema, self.variables, &fragment.directives) {
                        continue;
                    }

                    let TypeCondition::On(condition) = &fragment.type_condition;
                    if !self.schema.is_possible_type(condition, object_type) {
                        continue;
                    }

                    let mut visited = visited.clone();
                    visited.insert(name);
                    self.collect_into(&fragment.selection_set, object_type, &visited, result);
                }
            }
        }
    }
}

/// Fragment definitions of a document, by name.
pub fn fragments<'a>(document: &'a Document<'a, String>) -> Fragments<'a> {
    document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            Definition::Fragment(fragment) => {
                Some((fragment.name.as_str(), fragment))
            }
            _ => None,
        })
        .collect()
}
