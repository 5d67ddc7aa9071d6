use graphql_parser::query::{Value as AstValue, VariableDefinition};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::error::CoercionError;
use super::schema::{InputValue, MetaType, Schema, TypeRef};

/// Coerced variable values of one operation.
pub type Variables = Map<String, Value>;

/// Coerces the raw request variables against the operation's variable definitions.
///
/// Every failing variable is reported; any failure aborts the request.
pub fn coerce_variable_values(
    schema: &Schema,
    definitions: &[VariableDefinition<'_, String>],
    raw_variables: &Map<String, Value>,
) -> Result<Variables, Vec<CoercionError>> {
    let mut variables = Variables::new();
    let mut errors = Vec::new();

    for definition in definitions {
        let variable_type = TypeRef::from_ast(&definition.var_type);
        let name = definition.name.as_str();

        match raw_variables.get(name) {
            Some(value) => match coerce_input_value(schema, value, &variable_type) {
                Ok(value) => {
                    variables.insert(name.to_owned(), value);
                }
                Err(reason) => errors.push(CoercionError::InvalidVariable {
                    name: name.to_owned(),
                    reason: Box::new(reason),
                }),
            },
            None => match &definition.default_value {
                Some(default_value) => {
                    match value_from_ast(schema, default_value, &variable_type, &Variables::new()) {
                        Ok(Some(value)) => {
                            variables.insert(name.to_owned(), value);
                        }
                        Ok(None) => {}
                        Err(reason) => errors.push(CoercionError::InvalidVariable {
                            name: name.to_owned(),
                            reason: Box::new(reason),
                        }),
                    }
                }
                None if variable_type.is_non_null() => {
                    errors.push(CoercionError::MissingVariable {
                        name: name.to_owned(),
                        variable_type: variable_type.to_string(),
                    })
                }
                None => {}
            },
        }
    }

    match errors.len() {
        0 => Ok(variables),
        _ => Err(errors),
    }
}

/// Runtime argument map of a field.
///
/// Literals are coerced with the variables substituted; absent arguments take
/// their declared default or are left out.
pub fn coerce_arguments(
    schema: &Schema,
    definitions: &IndexMap<String, InputValue>,
    arguments: &[(String, AstValue<'_, String>)],
    variables: &Variables,
) -> Result<Map<String, Value>, CoercionError> {
    let mut values = Map::new();

    for (name, definition) in definitions {
        let literal = arguments
            .iter()
            .find(|(argument_name, _)| argument_name == name)
            .map(|(_, value)| value);

        let value = match literal {
            Some(literal) => value_from_ast(schema, literal, &definition.input_type, variables)?,
            None => None,
        };

        match value.or_else(|| definition.default_value.clone()) {
            Some(value) => {
                values.insert(name.clone(), value);
            }
            None if definition.input_type.is_non_null() => {
                return Err(CoercionError::MissingInputField {
                    field: name.clone(),
                    field_type: definition.input_type.to_string(),
                })
            }
            None => {}
        }
    }

    Ok(values)
}

/// Coerces a query literal to `input_type`.
///
/// `Ok(None)` means the literal was a variable with no bound value.
pub fn value_from_ast(
    schema: &Schema,
    value: &AstValue<'_, String>,
    input_type: &TypeRef,
    variables: &Variables,
) -> Result<Option<Value>, CoercionError> {
    if let AstValue::Variable(name) = value {
        return match variables.get(name.as_str()) {
            Some(Value::Null) if input_type.is_non_null() => {
                Err(CoercionError::UnexpectedNull(input_type.to_string()))
            }
            Some(value) => Ok(Some(value.clone())),
            None => Ok(None),
        };
    }

    match input_type {
        TypeRef::NonNull(of_type) => match value_from_ast(schema, value, of_type, variables)? {
            Some(Value::Null) => Err(CoercionError::UnexpectedNull(input_type.to_string())),
            coerced => Ok(coerced),
        },
        _ if matches!(value, AstValue::Null) => Ok(Some(Value::Null)),
        TypeRef::List(item_type) => match value {
            AstValue::List(items) => {
                let mut values = Vec::with_capacity(items.len());

                for item in items {
                    match value_from_ast(schema, item, item_type, variables)? {
                        Some(value) => values.push(value),
                        None if item_type.is_non_null() => {
                            return Err(CoercionError::UnexpectedNull(item_type.to_string()))
                        }
                        None => values.push(Value::Null),
                    }
                }

                Ok(Some(Value::Array(values)))
            }
            _ => Ok(value_from_ast(schema, value, item_type, variables)?
                .map(|value| Value::Array(vec![value]))),
        },
        TypeRef::Named(name) => match schema.get_type(name) {
            Some(MetaType::Scalar(scalar)) => scalar.coercing.parse_literal(value).map(Some),
            Some(MetaType::Enum(enum_type)) => match value {
                AstValue::Enum(enum_value) if enum_type.contains(enum_value) => {
                    Ok(Some(Value::String(enum_value.clone())))
                }
                AstValue::Enum(enum_value) => Err(CoercionError::InvalidEnumValue {
                    type_name: name.clone(),
                    value: enum_value.clone(),
                }),
                _ => Err(CoercionError::InvalidLiteral {
                    expected: name.clone(),
                    found: value.to_string(),
                }),
            },
            Some(MetaType::InputObject(input_object)) => match value {
                AstValue::Object(fields) => {
                    if let Some(unknown) = fields
                        .keys()
                        .find(|key| !input_object.fields.contains_key(key.as_str()))
                    {
                        return Err(CoercionError::UnknownInputField {
                            field: unknown.clone(),
                            type_name: name.clone(),
                        });
                    }

                    let mut object = Map::new();

                    for (field_name, definition) in &input_object.fields {
                        let field_value = match fields.get(field_name) {
                            Some(literal) => {
                                value_from_ast(schema, literal, &definition.input_type, variables)?
                            }
                            None => None,
                        };

                        match field_value.or_else(|| definition.default_value.clone()) {
                            Some(field_value) => {
                                object.insert(field_name.clone(), field_value);
                            }
                            None if definition.input_type.is_non_null() => {
                                return Err(CoercionError::MissingInputField {
                                    field: field_name.clone(),
                                    field_type: definition.input_type.to_string(),
                                })
                            }
                            None => {}
                        }
                    }

                    Ok(Some(Value::Object(object)))
                }
                _ => Err(CoercionError::InvalidLiteral {
                    expected: name.clone(),
                    found: value.to_string(),
                }),
            },
            _ => Err(CoercionError::NotInputType(name.clone())),
        },
    }
}

/// Coerces a JSON variable value to `input_type`.
pub fn coerce_input_value(
    schema: &Schema,
    value: &Value,
    input_type: &TypeRef,
) -> Result<Value, CoercionError> {
    match input_type {
        TypeRef::NonNull(of_type) => match value {
            Value::Null => Err(CoercionError::UnexpectedNull(input_type.to_string())),
            _ => coerce_input_value(schema, value, of_type),
        },
        _ if value.is_null() => Ok(Value::Null),
        TypeRef::List(item_type) => match value {
            Value::Array(items) => items
                .iter()
                .map(|item| coerce_input_value(schema, item, item_type))
                .collect::<Result<Vec<Value>, CoercionError>>()
                .map(Value::Array),
            _ => Ok(Value::Array(vec![coerce_input_value(
                schema, value, item_type,
            )?])),
        },
        TypeRef::Named(name) => match schema.get_type(name) {
            Some(MetaType::Scalar(scalar)) => scalar.coercing.parse_value(value),
            Some(MetaType::Enum(enum_type)) => match value {
                Value::String(enum_value) if enum_type.contains(enum_value) => Ok(value.clone()),
                _ => Err(CoercionError::InvalidEnumValue {
                    type_name: name.clone(),
                    value: value.to_string(),
                }),
            },
            Some(MetaType::InputObject(input_object)) => match value {
                Value::Object(fields) => {
                    if let Some(unknown) = fields
                        .keys()
                        .find(|key| !input_object.fields.contains_key(key.as_str()))
                    {
                        return Err(CoercionError::UnknownInputField {
                            field: unknown.clone(),
                            type_name: name.clone(),
                        });
                    }

                    let mut object = Map::new();

                    for (field_name, definition) in &input_object.fields {
                        match fields.get(field_name) {
                            Some(field_value) => {
                                object.insert(
                                    field_name.clone(),
                                    coerce_input_value(schema, field_value, &definition.input_type)?,
                                );
                            }
                            None => match &definition.default_value {
                                Some(default_value) => {
                                    object.insert(field_name.clone(), default_value.clone());
                                }
                                None if definition.input_type.is_non_null() => {
                                    return Err(CoercionError::MissingInputField {
                                        field: field_name.clone(),
                                        field_type: definition.input_type.to_string(),
                                    })
                                }
                                None => {}
                            },
                        }
                    }

                    Ok(Value::Object(object))
                }
                _ => Err(CoercionError::InvalidValue {
                    type_name: name.clone(),
                    value: value.to_string(),
                }),
            },
            _ => Err(CoercionError::NotInputType(name.clone())),
        },
    }
}
