use graphql_parser::query::Value as AstValue;
use serde_json::{Number, Value};

use super::error::CoercionError;
use super::schema::ScalarType;

/// Conversion rules of a scalar type.
///
/// `serialize` turns a resolved value into its response form, `parse_value`
/// coerces a variable value and `parse_literal` coerces a query literal.
pub trait Coercing: Send + Sync {
    fn serialize(&self, value: &Value) -> Result<Value, CoercionError>;

    fn parse_value(&self, value: &Value) -> Result<Value, CoercionError>;

    fn parse_literal(&self, value: &AstValue<'_, String>) -> Result<Value, CoercionError>;
}

pub fn builtins() -> Vec<ScalarType> {
    vec![
        ScalarType::new("Int", IntCoercing),
        ScalarType::new("Float", FloatCoercing),
        ScalarType::new("String", StringCoercing),
        ScalarType::new("Boolean", BooleanCoercing),
        ScalarType::new("ID", IdCoercing),
    ]
}

fn invalid_value(type_name: &str, value: &Value) -> CoercionError {
    CoercionError::InvalidValue {
        type_name: type_name.to_owned(),
        value: value.to_string(),
    }
}

fn invalid_literal(expected: &str, value: &AstValue<'_, String>) -> CoercionError {
    CoercionError::InvalidLiteral {
        expected: expected.to_owned(),
        found: value.to_string(),
    }
}

fn float_value(type_name: &str, float: f64, value: &Value) -> Result<Value, CoercionError> {
    Number::from_f64(float)
        .map(Value::Number)
        .ok_or_else(|| invalid_value(type_name, value))
}

fn int_in_range(int: i64) -> Result<Value, CoercionError> {
    if int < i64::from(i32::MIN) || int > i64::from(i32::MAX) {
        return Err(CoercionError::IntOutOfRange(int.to_string()));
    }

    Ok(Value::from(int))
}

pub struct IntCoercing;

impl Coercing for IntCoercing {
    fn serialize(&self, value: &Value) -> Result<Value, CoercionError> {
        match value {
            Value::Number(number) => match (number.as_i64(), number.as_f64()) {
                (Some(int), _) => int_in_range(int),
                (None, Some(float)) if float.fract() == 0.0 && float.is_finite() => {
                    if float < f64::from(i32::MIN) || float > f64::from(i32::MAX) {
                        return Err(CoercionError::IntOutOfRange(number.to_string()));
                    }
                    Ok(Value::from(float as i64))
                }
                _ => Err(CoercionError::IntOutOfRange(number.to_string())),
            },
            Value::String(s) => match s.parse::<i64>() {
                Ok(int) => int_in_range(int),
                _ => Err(invalid_value("Int", value)),
            },
            Value::Bool(b) => Ok(Value::from(*b as i64)),
            _ => Err(invalid_value("Int", value)),
        }
    }

    fn parse_value(&self, value: &Value) -> Result<Value, CoercionError> {
        match value.as_i64() {
            Some(int) => int_in_range(int),
            _ => Err(invalid_value("Int", value)),
        }
    }

    fn parse_literal(&self, value: &AstValue<'_, String>) -> Result<Value, CoercionError> {
        match value {
            AstValue::Int(number) => match number.as_i64() {
                Some(int) => int_in_range(int),
                _ => Err(invalid_literal("Int", value)),
            },
            _ => Err(invalid_literal("Int", value)),
        }
    }
}

pub struct FloatCoercing;

impl Coercing for FloatCoercing {
    fn serialize(&self, value: &Value) -> Result<Value, CoercionError> {
        match value {
            Value::Number(number) => match number.as_f64() {
                Some(float) => float_value("Float", float, value),
                _ => Err(invalid_value("Float", value)),
            },
            Value::String(s) => match s.parse::<f64>() {
                Ok(float) => float_value("Float", float, value),
                _ => Err(invalid_value("Float", value)),
            },
            Value::Bool(b) => Ok(Value::from(if *b { 1.0 } else { 0.0 })),
            _ => Err(invalid_value("Float", value)),
        }
    }

    fn parse_value(&self, value: &Value) -> Result<Value, CoercionError> {
        match value.as_f64() {
            Some(float) => float_value("Float", float, value),
            _ => Err(invalid_value("Float", value)),
        }
    }

    fn parse_literal(&self, value: &AstValue<'_, String>) -> Result<Value, CoercionError> {
        match value {
            AstValue::Int(number) => match number.as_i64() {
                Some(int) => Ok(Value::from(int as f64)),
                _ => Err(invalid_literal("Float", value)),
            },
            AstValue::Float(float) => Number::from_f64(*float)
                .map(Value::Number)
                .ok_or_else(|| invalid_literal("Float", value)),
            _ => Err(invalid_literal("Float", value)),
        }
    }
}

pub struct StringCoercing;

impl Coercing for StringCoercing {
    fn serialize(&self, value: &Value) -> Result<Value, CoercionError> {
        match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(number) => Ok(Value::String(number.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err(invalid_value("String", value)),
        }
    }

    fn parse_value(&self, value: &Value) -> Result<Value, CoercionError> {
        match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err(invalid_value("String", value)),
        }
    }

    fn parse_literal(&self, value: &AstValue<'_, String>) -> Result<Value, CoercionError> {
        match value {
            AstValue::String(s) => Ok(Value::String(s.clone())),
            _ => Err(invalid_literal("String", value)),
        }
    }
}

pub struct BooleanCoercing;

impl Coercing for BooleanCoercing {
    fn serialize(&self, value: &Value) -> Result<Value, CoercionError> {
        match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::Number(number) => match number.as_f64() {
                Some(float) => Ok(Value::Bool(float != 0.0)),
                _ => Err(invalid_value("Boolean", value)),
            },
            _ => Err(invalid_value("Boolean", value)),
        }
    }

    fn parse_value(&self, value: &Value) -> Result<Value, CoercionError> {
        match value {
            Value::Bool(_) => Ok(value.clone()),
            _ => Err(invalid_value("Boolean", value)),
        }
    }

    fn parse_literal(&self, value: &AstValue<'_, String>) -> Result<Value, CoercionError> {
        match value {
            AstValue::Boolean(b) => Ok(Value::Bool(*b)),
            _ => Err(invalid_literal("Boolean", value)),
        }
    }
}

pub struct IdCoercing;

impl Coercing for IdCoercing {
    fn serialize(&self, value: &Value) -> Result<Value, CoercionError> {
        match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(number) if number.is_i64() || number.is_u64() => {
                Ok(Value::String(number.to_string()))
            }
            _ => Err(invalid_value("ID", value)),
        }
    }

    fn parse_value(&self, value: &Value) -> Result<Value, CoercionError> {
        self.serialize(value)
    }

    fn parse_literal(&self, value: &AstValue<'_, String>) -> Result<Value, CoercionError> {
        match value {
            AstValue::String(s) => Ok(Value::String(s.clone())),
            AstValue::Int(number) => match number.as_i64() {
                Some(int) => Ok(Value::String(int.to_string())),
                _ => Err(invalid_literal("ID", value)),
            },
            _ => Err(invalid_literal("ID", value)),
        }
    }
}
