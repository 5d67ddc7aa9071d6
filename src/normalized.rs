use fnv::FnvHashSet;
use graphql_parser::query::{
    Document, Field, Selection, SelectionSet, TypeCondition, Value as AstValue,
};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::trace;

use super::collector::{fragments, Fragments};
use super::conditional::should_include;
use super::error::{Error, Result};
use super::query::get_operation;
use super::schema::{Schema, TypeRef};
use super::values::{coerce_arguments, Variables};

/// One node of the normalized tree.
///
/// Fields sharing a result key become one node only when they select the same
/// field with the same declared type and literally equal arguments.
#[derive(Clone, Debug)]
pub struct NormalizedField<'a> {
    pub alias: Option<&'a str>,
    pub field_name: &'a str,
    /// Object types this field can be resolved on, in discovery order.
    pub object_types: Vec<String>,
    pub arguments: Map<String, Value>,
    pub ast_arguments: &'a [(String, AstValue<'a, String>)],
    pub field_type: TypeRef,
    /// Top-level fields are on level 1.
    pub level: usize,
    pub children: Vec<NormalizedField<'a>>,
    fields: Vec<&'a Field<'a, String>>,
}

impl<'a> NormalizedField<'a> {
    pub fn result_key(&self) -> &'a str {
        self.alias.unwrap_or(self.field_name)
    }

    /// AST fields merged into this node.
    pub fn fields(&self) -> &[&'a Field<'a, String>] {
        &self.fields
    }

    /// Whether the field only applies to some of the possible types of its parent.
    pub fn is_conditional(&self, schema: &Schema, parent_type: &str) -> bool {
        schema.possible_types(parent_type).len() != self.object_types.len()
    }

    fn add_object_types(&mut self, object_types: &[String]) {
        for object_type in object_types {
            if !self.object_types.contains(object_type) {
                self.object_types.push(object_type.clone());
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct NormalizedQueryTree<'a> {
    top_level_fields: Vec<NormalizedField<'a>>,
}

impl<'a> NormalizedQueryTree<'a> {
    /// Normalizes the selected operation of `document`.
    ///
    /// `variables` are the already coerced variable values.
    pub fn new(
        schema: &'a Schema,
        document: &'a Document<'a, String>,
        operation_name: Option<&str>,
        variables: &'a Variables,
    ) -> Result<Self> {
        let operation = get_operation(document, operation_name)?;
        let root_type = operation.root_type(schema)?;
        let fragments = fragments(document);

        let builder = TreeBuilder {
            schema,
            fragments: &fragments,
            variables,
        };

        let top_level_fields =
            builder.build(&[operation.selection_set], vec![root_type.to_owned()], 1)?;

        Ok(NormalizedQueryTree { top_level_fields })
    }

    pub fn top_level_fields(&self) -> &[NormalizedField<'a>] {
        &self.top_level_fields
    }

    /// Every node resolving `field_name` on `object_type`, in depth-first order.
    pub fn fields_for_coordinates(
        &self,
        object_type: &str,
        field_name: &str,
    ) -> Vec<&NormalizedField<'a>> {
        let mut result = vec![];
        let mut pending = self.top_level_fields.iter().rev().collect::<Vec<_>>();

        while let Some(field) = pending.pop() {
            if field.field_name == field_name && field.object_types.iter().any(|t| t == object_type)
            {
                result.push(field);
            }
            pending.extend(field.children.iter().rev());
        }

        result
    }

    /// Nodes an AST field was merged into.
    pub fn fields_for_ast_field(&self, ast_field: &Field<'a, String>) -> Vec<&NormalizedField<'a>> {
        let mut result = vec![];
        let mut pending = self.top_level_fields.iter().rev().collect::<Vec<_>>();

        while let Some(field) = pending.pop() {
            if field.fields.iter().any(|f| std::ptr::eq(*f, ast_field)) {
                result.push(field);
            }
            pending.extend(field.children.iter().rev());
        }

        result
    }
}

struct TreeBuilder<'a, 'b> {
    schema: &'a Schema,
    fragments: &'b Fragments<'a>,
    variables: &'a Variables,
}

impl<'a, 'b> TreeBuilder<'a, 'b> {
    /// Collects the selection sets into nodes, then builds each node's children.
    fn build(
        &self,
        selection_sets: &[&'a SelectionSet<'a, String>],
        possible_objects: Vec<String>,
        level: usize,
    ) -> Result<Vec<NormalizedField<'a>>> {
        let mut result: IndexMap<&'a str, Vec<NormalizedField<'a>>> = IndexMap::new();

        for selection_set in selection_sets {
            self.collect(
                selection_set,
                &possible_objects,
                level,
                &FnvHashSet::default(),
                &mut result,
            )?;
        }

        let mut fields = vec![];

        for mut field in result.into_iter().flat_map(|(_, fields)| fields) {
            if let Some(meta_type) = self.schema.get_type(field.field_type.name()) {
                if meta_type.is_composite() {
                    let possible_objects = self
                        .schema
                        .possible_types(meta_type.name())
                        .into_iter()
                        .map(|object| object.name.clone())
                        .collect();
                    let selection_sets = field
                        .fields
                        .iter()
                        .copied()
                        .map(|f| &f.selection_set)
                        .collect::<Vec<_>>();

                    field.children = self.build(&selection_sets, possible_objects, level + 1)?;
                }
            }

            fields.push(field);
        }

        Ok(fields)
    }

    fn collect(
        &self,
        selection_set: &'a SelectionSet<'a, String>,
        possible_objects: &[String],
        level: usize,
        visited: &FnvHashSet<&'a str>,
        result: &mut IndexMap<&'a str, Vec<NormalizedField<'a>>>,
    ) -> Result<()> {
        for selection in &selection_set.items {
            match selection {
                Selection::Field(field) => {
                    if should_include(self.schema, self.variables, &field.directives) {
                        self.collect_field(field, possible_objects, level, result)?;
                    }
                }
                Selection::InlineFragment(fragment) => {
                    if !should_include(self.schema, self.variables, &fragment.directives) {
                        continue;
                    }

                    match &fragment.type_condition {
                        Some(TypeCondition::On(condition)) => {
                            let narrowed = self.narrow(possible_objects, condition);
                            self.collect(&fragment.selection_set, &narrowed, level, visited, result)?;
                        }
                        None => self.collect(
                            &fragment.selection_set,
                            possible_objects,
                            level,
                            visited,
                            result,
                        )?,
                    }
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
                        _ => continue,
                    };

                    if !should_include(self.schema, self.variables, &fragment.directives) {
                        continue;
                    }

                    let TypeCondition::On(condition) = &fragment.type_condition;
                    let narrowed = self.narrow(possible_objects, condition);

                    let mut visited = visited.clone();
                    visited.insert(name);
                    self.collect(&fragment.selection_set, &narrowed, level, &visited, result)?;
                }
            }
        }

        Ok(())
    }

    fn collect_field(
        &self,
        field: &'a Field<'a, String>,
        object_types: &[String],
        level: usize,
        result: &mut IndexMap<&'a str, Vec<NormalizedField<'a>>>,
    ) -> Result<()> {
        let first_object = match object_types.first() {
            Some(first_object) => first_object,
            None => return Ok(()),
        };

        let (field_type, argument_definitions) = match field.name.as_str() {
            "__typename" => (TypeRef::named_non_null("String"), None),
            name => match self.schema.field(first_object, name) {
                Some(field_def) => (field_def.field_type.clone(), Some(&field_def.args)),
                None => {
                    trace!(object = first_object.as_str(), field = name, "Skipping unknown field.");
                    return Ok(());
                }
            },
        };

        let result_key = field.alias.as_deref().unwrap_or(&field.name);
        let existing = result.entry(result_key).or_insert_with(Vec::new);

        if let Some(matching) = existing.iter_mut().find(|nf| {
            nf.field_name == field.name
                && nf.field_type == field_type
                && same_arguments(nf.ast_arguments, &field.arguments)
        }) {
            matching.add_object_types(object_types);
            matching.fields.push(field);
            return Ok(());
        }

        let arguments = match argument_definitions {
            Some(definitions) => {
                coerce_arguments(self.schema, definitions, &field.arguments, self.variables)
                    .map_err(|err| Error::Variables(vec![err]))?
            }
            None => Map::new(),
        };

        existing.push(NormalizedField {
            alias: field.alias.as_deref(),
            field_name: &field.name,
            object_types: object_types.to_vec(),
            arguments,
            ast_arguments: &field.arguments,
            field_type,
            level,
            children: vec![],
            fields: vec![field],
        });

        Ok(())
    }

    /// Intersects the current object types with the condition's possible types.
    fn narrow(&self, current: &[String], condition: &str) -> Vec<String> {
        let resolved = self.schema.possible_types(condition);

        current
            .iter()
            .filter(|object_type| resolved.iter().any(|object| object.name == **object_type))
            .cloned()
            .collect()
    }
}

/// Same argument names with literally equal values; order does not matter.
///
/// Literals are compared as written, so `1` and `1.0` differ even where they
/// coerce to the same value.
fn same_arguments<'a>(
    left: &[(String, AstValue<'a, String>)],
    right: &[(String, AstValue<'a, String>)],
) -> bool {
    left.len() == right.len()
        && left.iter().all(|(name, value)| {
            right
                .iter()
                .any(|(other_name, other_value)| other_name == name && other_value == value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field as FieldDef, InputValue, InterfaceType, ObjectType};
    use graphql_parser::parse_query;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new("Query")
            .register(
                ObjectType::new("Query")
                    .field(
                        FieldDef::new("score", TypeRef::named("Float"))
                            .argument(InputValue::new("factor", TypeRef::named("Float"))),
                    )
                    .field(FieldDef::new("pets", TypeRef::list(TypeRef::named("Pet")))),
            )
            .register(
                InterfaceType::new("Pet").field(FieldDef::new("name", TypeRef::named("String"))),
            )
            .register(
                ObjectType::new("Dog")
                    .implements("Pet")
                    .field(FieldDef::new("name", TypeRef::named("String")))
                    .field(FieldDef::new("bark", TypeRef::named("String"))),
            )
            .register(
                ObjectType::new("Cat")
                    .implements("Pet")
                    .field(FieldDef::new("name", TypeRef::named("String")))
                    .field(FieldDef::new("meow", TypeRef::named("String"))),
            )
    }

    fn summary(fields: &[NormalizedField<'_>]) -> Vec<String> {
        fields
            .iter()
            .map(|f| format!("{}:{}", f.result_key(), f.object_types.join(",")))
            .collect()
    }

    #[test]
    fn literal_arguments_decide_identity() {
        let schema = schema();
        let variables = Variables::new();

        let document = parse_query::<String>("{ score(factor: 1) score(factor: 1) }").unwrap();
        let tree = NormalizedQueryTree::new(&schema, &document, None, &variables).unwrap();
        assert_eq!(tree.top_level_fields().len(), 1);
        assert_eq!(tree.top_level_fields()[0].fields().len(), 2);
        assert_eq!(
            Value::Object(tree.top_level_fields()[0].arguments.clone()),
            json!({ "factor": 1.0 })
        );

        let document = parse_query::<String>("{ score(factor: 1) score(factor: 1.0) }").unwrap();
        let tree = NormalizedQueryTree::new(&schema, &document, None, &variables).unwrap();
        assert_eq!(tree.top_level_fields().len(), 2);
    }

    #[test]
    fn merges_across_type_conditions() {
        let schema = schema();
        let variables = Variables::new();
        let document = parse_query::<String>(
            r#"
            {
                pets {
                    ... on Dog { name bark }
                    ... on Cat { name meow }
                    ...Names
                }
            }
            fragment Names on Pet { other: name }
            "#,
        )
        .unwrap();

        let tree = NormalizedQueryTree::new(&schema, &document, None, &variables).unwrap();
        let pets = &tree.top_level_fields()[0];

        assert_eq!(pets.level, 1);
        assert_eq!(
            summary(&pets.children),
            vec!["name:Dog,Cat", "bark:Dog", "meow:Cat", "other:Dog,Cat"]
        );
        assert!(pets.children.iter().all(|child| child.level == 2));
        assert!(pets.children[1].is_conditional(&schema, "Pet"));
        assert!(!pets.children[0].is_conditional(&schema, "Pet"));

        let names = tree.fields_for_coordinates("Cat", "name");
        assert_eq!(names.len(), 2);
        assert_eq!(names[0].result_key(), "name");
        assert_eq!(names[1].result_key(), "other");
        assert!(tree.fields_for_coordinates("Query", "name").is_empty());

        let dog_name = pets.children[0].fields()[0];
        assert_eq!(tree.fields_for_ast_field(dog_name).len(), 1);
    }

    #[test]
    fn skips_fragment_definitions() {
        let schema = schema();
        let document = parse_query::<String>(
            r#"
            query ($skip: Boolean!) { pets { name ...Hidden } }
            fragment Hidden on Pet @skip(if: $skip) { hidden: name }
            "#,
        )
        .unwrap();

        let variables = json!({ "skip": true }).as_object().cloned().unwrap();
        let tree = NormalizedQueryTree::new(&schema, &document, None, &variables).unwrap();
        assert_eq!(summary(&tree.top_level_fields()[0].children), vec!["name:Dog,Cat"]);

        let variables = json!({ "skip": false }).as_object().cloned().unwrap();
        let tree = NormalizedQueryTree::new(&schema, &document, None, &variables).unwrap();
        assert_eq!(
            summary(&tree.top_level_fields()[0].children),
            vec!["name:Dog,Cat", "hidden:Dog,Cat"]
        );
    }

    #[test]
    fn honors_directives() {
        let schema = schema();
        let variables = json!({ "skip": true }).as_object().cloned().unwrap();
        let document = parse_query::<String>(
            "query ($skip: Boolean!) { pets { name @skip(if: $skip) ... on Dog @include(if: true) { bark } } }",
        )
        .unwrap();

        let tree = NormalizedQueryTree::new(&schema, &document, None, &variables).unwrap();

        assert_eq!(summary(&tree.top_level_fields()[0].children), vec!["bark:Dog"]);
    }
}
