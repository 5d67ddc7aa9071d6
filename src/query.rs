use graphql_parser::parse_query;
use graphql_parser::query::{
    Definition, Document, OperationDefinition, SelectionSet, VariableDefinition,
};
use serde_json::{Map, Value};
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::context::{Data, ExecutionContext};
use super::error::{CoercionError, Error, QueryError, Result};
use super::graphql::ExecutionResult;
use super::result::{FieldSubSelection, ResultAssembler};
use super::schema::Schema;
use super::step_info::ExecutionStepInfo;
use super::strategy::{self, ExecutionMode};
use super::validation::{DocumentValidator, Validator};
use super::values::coerce_variable_values;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

/// The operation picked out of a document.
pub struct Operation<'a> {
    pub operation_type: OperationType,
    pub name: Option<&'a str>,
    pub selection_set: &'a SelectionSet<'a, String>,
    pub variable_definitions: &'a [VariableDefinition<'a, String>],
}

impl<'a> Operation<'a> {
    fn from_definition(definition: &'a OperationDefinition<'a, String>) -> Self {
        match definition {
            OperationDefinition::SelectionSet(selection_set) => Operation {
                operation_type: OperationType::Query,
                name: None,
                selection_set,
                variable_definitions: &[],
            },
            OperationDefinition::Query(query) => Operation {
                operation_type: OperationType::Query,
                name: query.name.as_deref(),
                selection_set: &query.selection_set,
                variable_definitions: &query.variable_definitions,
            },
            OperationDefinition::Mutation(mutation) => Operation {
                operation_type: OperationType::Mutation,
                name: mutation.name.as_deref(),
                selection_set: &mutation.selection_set,
                variable_definitions: &mutation.variable_definitions,
            },
            OperationDefinition::Subscription(subscription) => Operation {
                operation_type: OperationType::Subscription,
                name: subscription.name.as_deref(),
                selection_set: &subscription.selection_set,
                variable_definitions: &subscription.variable_definitions,
            },
        }
    }

    /// Name of the object type the operation's fields are selected on.
    pub fn root_type<'s>(&self, schema: &'s Schema) -> std::result::Result<&'s str, QueryError> {
        match self.operation_type {
            OperationType::Query => Ok(schema.query_type()),
            OperationType::Mutation => schema
                .mutation_type()
                .ok_or(QueryError::NotConfiguredMutations),
            OperationType::Subscription => Err(QueryError::NotSupported),
        }
    }
}

/// Selects the operation to run: the named one, or the only one.
pub fn get_operation<'a>(
    document: &'a Document<'a, String>,
    operation_name: Option<&str>,
) -> std::result::Result<Operation<'a>, QueryError> {
    let mut operations = document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            Definition::Operation(operation) => Some(Operation::from_definition(operation)),
            _ => None,
        })
        .collect::<Vec<Operation<'a>>>();

    match operation_name {
        Some(name) => match operations.iter().position(|op| op.name == Some(name)) {
            Some(index) => Ok(operations.swap_remove(index)),
            _ => Err(QueryError::UnknownOperation {
                name: name.to_owned(),
            }),
        },
        None => match operations.len() {
            0 => Err(QueryError::NoOperation),
            1 => Ok(operations.remove(0)),
            _ => Err(QueryError::OperationNameRequired),
        },
    }
}

pub struct QueryBuilder {
    pub(crate) query_source: String,
    pub(crate) operation_name: Option<String>,
    pub(crate) variables: Option<Value>,
    pub(crate) root_value: Value,
    pub(crate) data: Data,
    pub(crate) validator: Option<Arc<dyn Validator>>,
}

impl QueryBuilder {
    pub fn new<Q: Into<String>>(query_source: Q) -> Self {
        QueryBuilder {
            query_source: query_source.into(),
            operation_name: None,
            variables: None,
            root_value: Value::Object(Map::new()),
            data: Data::default(),
            validator: None,
        }
    }

    pub fn operation_name<N: Into<String>>(mut self, name: N) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Raw variables as sent by the client, coerced before execution.
    pub fn variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }

    /// Source value handed to the resolvers of the top-level fields.
    pub fn root_value(mut self, root_value: Value) -> Self {
        self.root_value = root_value;
        self
    }

    pub fn data<D: Any + Send + Sync>(mut self, data: D) -> Self {
        self.data.insert(data);
        self
    }

    pub fn validator<V: Validator + 'static>(mut self, validator: V) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Runs the operation against `schema`.
    ///
    /// Request and field errors end up in the returned result; `Err` is only
    /// returned for engine defects.
    #[instrument(skip(self, schema), fields(operation_name = ?self.operation_name))]
    pub async fn execute(self, schema: &Schema) -> Result<ExecutionResult> {
        let QueryBuilder {
            query_source,
            operation_name,
            variables,
            root_value,
            data,
            validator,
        } = self;

        let document = match parse_query::<String>(&query_source) {
            Ok(document) => document,
            Err(err) => return Ok(ExecutionResult::from_error(&err.into())),
        };

        let validator = validator.unwrap_or_else(|| Arc::new(DocumentValidator));
        let errors = validator.validate(schema, &document);
        if !errors.is_empty() {
            debug!(errors = errors.len(), "Document failed validation.");
            return Ok(ExecutionResult::from_error(&Error::Query(errors)));
        }

        let operation = match get_operation(&document, operation_name.as_deref()) {
            Ok(operation) => operation,
            Err(err) => return Ok(ExecutionResult::from_error(&err.into())),
        };

        let root_type = match operation.root_type(schema) {
            Ok(root_type) => root_type,
            Err(err) => return Ok(ExecutionResult::from_error(&err.into())),
        };

        if schema.object(root_type).is_none() {
            return Err(Error::Internal(format!(
                "Root type \"{}\" is not an object type of the schema",
                root_type
            )));
        }

        let raw_variables = match variables {
            Some(Value::Object(variables)) => variables,
            Some(Value::Null) | None => Map::new(),
            Some(value) => {
                let err = CoercionError::InvalidValue {
                    type_name: "Variables".to_owned(),
                    value: value.to_string(),
                };
                return Ok(ExecutionResult::from_error(&Error::Variables(vec![err])));
            }
        };

        let variables =
            match coerce_variable_values(schema, operation.variable_definitions, &raw_variables) {
                Ok(variables) => variables,
                Err(errors) => {
                    debug!(errors = errors.len(), "Variables failed coercion.");
                    return Ok(ExecutionResult::from_error(&Error::Variables(errors)));
                }
            };

        let ctx = ExecutionContext::new(schema, &document, variables, Arc::new(data));
        let step_info = ExecutionStepInfo::root(root_type);
        let merged_selection_set = ctx.collector().collect(root_type, operation.selection_set);

        let mode = match operation.operation_type {
            OperationType::Mutation => ExecutionMode::Serial,
            _ => ExecutionMode::Parallel,
        };

        debug!(root_type, fields = merged_selection_set.len(), ?mode, "Executing operation.");

        let root = strategy::execute(
            &ctx,
            FieldSubSelection {
                source: root_value,
                step_info,
                merged_selection_set,
            },
            mode,
        )
        .await?;

        let (data, null_errors) = ResultAssembler::assemble(root)?;
        let mut errors = ctx.take_errors();
        errors.extend(null_errors);

        Ok(ExecutionResult::new(data, errors))
    }
}
