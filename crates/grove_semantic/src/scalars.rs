//! Built-in scalar types: `Int`, `Float`, `String`, `Boolean` and `ID`.

use crate::schema::ScalarType;
use grove_syntax::ast;
use serde_json::{Number, Value};

pub const INT: &str = "Int";
pub const FLOAT: &str = "Float";
pub const STRING: &str = "String";
pub const BOOLEAN: &str = "Boolean";
pub const ID: &str = "ID";

/// Returns fresh descriptors for every built-in scalar.
#[must_use]
pub fn builtin_scalars() -> Vec<ScalarType> {
    vec![int(), float(), string(), boolean(), id()]
}

fn int() -> ScalarType {
    ScalarType::new(INT)
        .description(
            "The `Int` scalar type represents non-fractional signed whole numeric values \
             between -(2^31) and 2^31 - 1.",
        )
        .serialize(serialize_int)
        .parse_value(parse_int_value)
        .parse_literal(|literal| match literal {
            ast::Value::Int(value, _) => i32::try_from(*value)
                .map(Value::from)
                .map_err(|_| non_32_bit(literal)),
            other => Err(format!("Int cannot represent non-integer value: {other}")),
        })
}

fn non_32_bit(value: impl std::fmt::Display) -> String {
    format!("Int cannot represent non 32-bit signed integer value: {value}")
}

fn non_integer(value: impl std::fmt::Display) -> String {
    format!("Int cannot represent non-integer value: {value}")
}

#[allow(clippy::cast_possible_truncation)]
fn int_from_f64(float: f64, original: &Value) -> Result<Value, String> {
    if !float.is_finite() || float.fract() != 0.0 {
        return Err(non_integer(original));
    }
    if float < f64::from(i32::MIN) || float > f64::from(i32::MAX) {
        return Err(non_32_bit(original));
    }
    Ok(Value::from(float as i32))
}

fn int_from_number(number: &Number, original: &Value) -> Result<Value, String> {
    if let Some(int) = number.as_i64() {
        return i32::try_from(int)
            .map(Value::from)
            .map_err(|_| non_32_bit(original));
    }
    if number.is_u64() {
        return Err(non_32_bit(original));
    }
    int_from_f64(number.as_f64().unwrap_or(f64::NAN), original)
}

fn serialize_int(value: &Value) -> Result<Value, String> {
    match value {
        Value::Number(number) => int_from_number(number, value),
        Value::Bool(flag) => Ok(Value::from(i32::from(*flag))),
        Value::String(text) => match text.trim().parse::<f64>() {
            Ok(float) => int_from_f64(float, value),
            Err(_) => Err(non_integer(value)),
        },
        _ => Err(non_integer(value)),
    }
}

fn parse_int_value(value: &Value) -> Result<Value, String> {
    match value {
        Value::Number(number) => int_from_number(number, value),
        // Integral strings are accepted for variables.
        Value::String(text) => match text.trim().parse::<i64>() {
            Ok(int) => i32::try_from(int)
                .map(Value::from)
                .map_err(|_| non_32_bit(value)),
            Err(_) => Err(non_integer(value)),
        },
        _ => Err(non_integer(value)),
    }
}

fn float_value(float: f64, original: &Value) -> Result<Value, String> {
    Number::from_f64(float)
        .map(Value::Number)
        .ok_or_else(|| format!("Float cannot represent non numeric value: {original}"))
}

fn float() -> ScalarType {
    ScalarType::new(FLOAT)
        .description(
            "The `Float` scalar type represents signed double-precision fractional values.",
        )
        .serialize(|value| match value {
            Value::Number(number) => float_value(number.as_f64().unwrap_or(f64::NAN), value),
            Value::Bool(flag) => float_value(if *flag { 1.0 } else { 0.0 }, value),
            Value::String(text) => match text.trim().parse::<f64>() {
                Ok(float) => float_value(float, value),
                Err(_) => Err(format!("Float cannot represent non numeric value: {value}")),
            },
            _ => Err(format!("Float cannot represent non numeric value: {value}")),
        })
        .parse_value(|value| match value {
            Value::Number(number) => float_value(number.as_f64().unwrap_or(f64::NAN), value),
            _ => Err(format!("Float cannot represent non numeric value: {value}")),
        })
        .parse_literal(|literal| match literal {
            #[allow(clippy::cast_precision_loss)]
            ast::Value::Int(int, _) => float_value(*int as f64, &Value::Null),
            ast::Value::Float(float, _) => float_value(*float, &Value::Null),
            other => Err(format!("Float cannot represent non numeric value: {other}")),
        })
}

fn string() -> ScalarType {
    ScalarType::new(STRING)
        .description("The `String` scalar type represents textual data.")
        .serialize(|value| match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(number) => Ok(Value::String(number.to_string())),
            Value::Bool(flag) => Ok(Value::String(flag.to_string())),
            _ => Err(format!("String cannot represent value: {value}")),
        })
        .parse_value(|value| match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err(format!("String cannot represent a non string value: {value}")),
        })
        .parse_literal(|literal| match literal {
            ast::Value::String(text, _) => Ok(Value::String(text.clone())),
            other => Err(format!("String cannot represent a non string value: {other}")),
        })
}

fn boolean() -> ScalarType {
    ScalarType::new(BOOLEAN)
        .description("The `Boolean` scalar type represents `true` or `false`.")
        .serialize(|value| match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::Number(number) => Ok(Value::Bool(number.as_f64().is_some_and(|f| f != 0.0))),
            _ => Err(format!("Boolean cannot represent a non boolean value: {value}")),
        })
        .parse_value(|value| match value {
            Value::Bool(_) => Ok(value.clone()),
            _ => Err(format!("Boolean cannot represent a non boolean value: {value}")),
        })
        .parse_literal(|literal| match literal {
            ast::Value::Boolean(flag, _) => Ok(Value::Bool(*flag)),
            other => Err(format!("Boolean cannot represent a non boolean value: {other}")),
        })
}

fn id_from_json(value: &Value) -> Result<Value, String> {
    match value {
        Value::String(_) => Ok(value.clone()),
        Value::Number(number) if number.is_i64() || number.is_u64() => {
            Ok(Value::String(number.to_string()))
        }
        _ => Err(format!("ID cannot represent value: {value}")),
    }
}

fn id() -> ScalarType {
    ScalarType::new(ID)
        .description(
            "The `ID` scalar type represents a unique identifier, serialized as a String.",
        )
        .serialize(id_from_json)
        .parse_value(id_from_json)
        .parse_literal(|literal| match literal {
            ast::Value::String(text, _) => Ok(Value::String(text.clone())),
            ast::Value::Int(int, _) => Ok(Value::String(int.to_string())),
            other => Err(format!("ID cannot represent value: {other}")),
        })
}
