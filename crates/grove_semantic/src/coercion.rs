//! Input coercion for variable values and field arguments.

use crate::schema::{InputValueDef, Schema, TypeDef, TypeRef};
use grove_core::Span;
use grove_syntax::ast;
use indexmap::IndexMap;
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// A variable or argument value that could not be coerced to its type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct CoercionError {
    pub message: String,
    pub span: Option<Span>,
}

impl CoercionError {
    pub fn new(message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Coerces raw variable inputs against the operation's variable definitions.
///
/// Defaults are applied for omitted variables; every problem is reported.
pub fn coerce_variable_values(
    schema: &Schema,
    operation: &ast::OperationDefinition,
    inputs: &Map<String, Value>,
) -> Result<Map<String, Value>, Vec<CoercionError>> {
    let mut coerced = Map::new();
    let mut errors = Vec::new();
    let no_variables = Map::new();

    for definition in &operation.variables {
        let name = definition.name.as_str();
        let ty = TypeRef::from_ast(&definition.ty);
        let span = Some(definition.span);

        if !schema
            .get_type(ty.named_type())
            .is_some_and(TypeDef::is_input_type)
        {
            errors.push(CoercionError::new(
                format!(
                    "Variable \"${name}\" expected value of type \"{ty}\" which cannot be used as an input type."
                ),
                span,
            ));
            continue;
        }

        let Some(value) = inputs.get(name) else {
            if let Some(default) = &definition.default_value {
                match value_from_ast(default, &ty, schema, &no_variables) {
                    Some(value) => {
                        coerced.insert(name.to_string(), value);
                    }
                    None => errors.push(CoercionError::new(
                        format!("Variable \"${name}\" has invalid default value {default}."),
                        span,
                    )),
                }
            } else if ty.is_non_null() {
                errors.push(CoercionError::new(
                    format!("Variable \"${name}\" of required type \"{ty}\" was not provided."),
                    span,
                ));
            }
            continue;
        };

        if value.is_null() && ty.is_non_null() {
            errors.push(CoercionError::new(
                format!("Variable \"${name}\" of non-null type \"{ty}\" must not be null."),
                span,
            ));
            continue;
        }

        match coerce_input_value(value, &ty, schema) {
            Ok(value) => {
                coerced.insert(name.to_string(), value);
            }
            Err(reason) => errors.push(CoercionError::new(
                format!("Variable \"${name}\" got invalid value {value}; {reason}"),
                span,
            )),
        }
    }

    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}

/// Coerces an external (JSON) value to an input type.
pub fn coerce_input_value(value: &Value, ty: &TypeRef, schema: &Schema) -> Result<Value, String> {
    match ty {
        TypeRef::NonNull(inner) => {
            if value.is_null() {
                return Err(format!("Expected non-nullable type \"{ty}\" not to be null."));
            }
            coerce_input_value(value, inner, schema)
        }
        _ if value.is_null() => Ok(Value::Null),
        TypeRef::List(inner) => match value {
            Value::Array(items) => items
                .iter()
                .map(|item| coerce_input_value(item, inner, schema))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            single => Ok(Value::Array(vec![coerce_input_value(single, inner, schema)?])),
        },
        TypeRef::Named(name) => match schema.get_type(name) {
            Some(TypeDef::Scalar(scalar)) => scalar.coerce_input(value),
            Some(TypeDef::Enum(enum_type)) => enum_type.coerce_input(value),
            Some(TypeDef::InputObject(input)) => {
                let Value::Object(fields) = value else {
                    return Err(format!("Expected type \"{name}\" to be an object."));
                };
                if let Some(unknown) = fields.keys().find(|key| !input.fields.contains_key(*key)) {
                    return Err(format!("Field \"{unknown}\" is not defined by type \"{name}\"."));
                }
                let mut coerced = Map::new();
                for field in input.fields.values() {
                    match fields.get(&field.name) {
                        Some(value) => {
                            let value = coerce_input_value(value, &field.ty, schema)?;
                            coerced.insert(field.name.clone(), value);
                        }
                        None => {
                            if let Some(default) = &field.default_value {
                                coerced.insert(field.name.clone(), default.clone());
                            } else if field.ty.is_non_null() {
                                return Err(format!(
                                    "Field \"{}\" of required type \"{}\" was not provided.",
                                    field.name, field.ty
                                ));
                            }
                        }
                    }
                }
                Ok(Value::Object(coerced))
            }
            _ => Err(format!("Type \"{name}\" is not an input type.")),
        },
    }
}

/// Coerces the arguments supplied on a field or directive.
///
/// A variable that was not provided counts as an omitted argument.
pub fn coerce_argument_values(
    schema: &Schema,
    definitions: &IndexMap<String, InputValueDef>,
    arguments: &[ast::Argument],
    variables: &Map<String, Value>,
) -> Result<IndexMap<String, Value>, CoercionError> {
    let mut coerced = IndexMap::with_capacity(definitions.len());

    for definition in definitions.values() {
        let name = definition.name.as_str();
        let ty = &definition.ty;
        let argument = arguments.iter().find(|arg| arg.name.value == name);

        let provided = match argument.map(|arg| &arg.value) {
            Some(ast::Value::Variable(var)) => variables.contains_key(var.as_str()),
            Some(_) => true,
            None => false,
        };
        let Some(argument) = argument.filter(|_| provided) else {
            if let Some(default) = &definition.default_value {
                coerced.insert(name.to_string(), default.clone());
            } else if ty.is_non_null() {
                return Err(CoercionError::new(
                    format!("Argument \"{name}\" of required type \"{ty}\" was not provided."),
                    argument.map(|arg| arg.span),
                ));
            }
            continue;
        };

        let value = match &argument.value {
            ast::Value::Variable(var) => variables
                .get(var.as_str())
                .cloned()
                .unwrap_or(Value::Null),
            literal if literal.is_null() => Value::Null,
            literal => value_from_ast(literal, ty, schema, variables).ok_or_else(|| {
                CoercionError::new(
                    format!("Argument \"{name}\" has invalid value {literal}."),
                    Some(literal.span()),
                )
            })?,
        };

        if value.is_null() && ty.is_non_null() {
            return Err(CoercionError::new(
                format!("Argument \"{name}\" of non-null type \"{ty}\" must not be null."),
                Some(argument.span),
            ));
        }
        coerced.insert(name.to_string(), value);
    }

    Ok(coerced)
}

/// Converts a literal to a value of the given input type.
///
/// Returns `None` when the literal is invalid for the type.
#[must_use]
pub fn value_from_ast(
    value: &ast::Value,
    ty: &TypeRef,
    schema: &Schema,
    variables: &Map<String, Value>,
) -> Option<Value> {
    if let ast::Value::Variable(name) = value {
        let value = variables.get(name.as_str())?.clone();
        return (!(value.is_null() && ty.is_non_null())).then_some(value);
    }

    match ty {
        TypeRef::NonNull(inner) => {
            if value.is_null() {
                return None;
            }
            value_from_ast(value, inner, schema, variables)
        }
        _ if value.is_null() => Some(Value::Null),
        TypeRef::List(inner) => match value {
            ast::Value::List(items, _) => items
                .iter()
                .map(|item| match item {
                    ast::Value::Variable(name) if !variables.contains_key(name.as_str()) => {
                        (!inner.is_non_null()).then_some(Value::Null)
                    }
                    item => value_from_ast(item, inner, schema, variables),
                })
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            single => {
                value_from_ast(single, inner, schema, variables).map(|v| Value::Array(vec![v]))
            }
        },
        TypeRef::Named(name) => match schema.get_type(name)? {
            TypeDef::Scalar(scalar) => scalar.coerce_literal(value).ok(),
            TypeDef::Enum(enum_type) => enum_type.coerce_literal(value).ok(),
            TypeDef::InputObject(input) => {
                let ast::Value::Object(fields, _) = value else {
                    return None;
                };
                if fields
                    .iter()
                    .any(|(field, _)| !input.fields.contains_key(field.as_str()))
                {
                    return None;
                }
                let mut coerced = Map::new();
                for field in input.fields.values() {
                    let supplied = fields
                        .iter()
                        .find(|(name, _)| name.value == field.name)
                        .map(|(_, value)| value)
                        .filter(|value| match value {
                            ast::Value::Variable(var) => variables.contains_key(var.as_str()),
                            _ => true,
                        });
                    match supplied {
                        Some(value) => {
                            let value = value_from_ast(value, &field.ty, schema, variables)?;
                            coerced.insert(field.name.clone(), value);
                        }
                        None => {
                            if let Some(default) = &field.default_value {
                                coerced.insert(field.name.clone(), default.clone());
                            } else if field.ty.is_non_null() {
                                return None;
                            }
                        }
                    }
                }
                Some(Value::Object(coerced))
            }
            _ => None,
        },
    }
}

/// Converts a literal to JSON without type information.
///
/// Enum values become strings; variables are looked up in `variables` and
/// become null when absent.
#[must_use]
pub fn value_from_ast_untyped(value: &ast::Value, variables: Option<&Map<String, Value>>) -> Value {
    match value {
        ast::Value::Variable(name) => variables
            .and_then(|vars| vars.get(name.as_str()))
            .cloned()
            .unwrap_or(Value::Null),
        ast::Value::Int(int, _) => Value::from(*int),
        ast::Value::Float(float, _) => Number::from_f64(*float).map_or(Value::Null, Value::Number),
        ast::Value::String(text, _) => Value::String(text.clone()),
        ast::Value::Boolean(flag, _) => Value::Bool(*flag),
        ast::Value::Null(_) => Value::Null,
        ast::Value::Enum(name) => Value::String(name.value.clone()),
        ast::Value::List(items, _) => Value::Array(
            items
                .iter()
                .map(|item| value_from_ast_untyped(item, variables))
                .collect(),
        ),
        ast::Value::Object(fields, _) => Value::Object(
            fields
                .iter()
                .map(|(name, value)| (name.value.clone(), value_from_ast_untyped(value, variables)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EnumType, FieldDefinition, InputObjectType, ObjectType, SchemaBuilder};
    use grove_syntax::parse;
    use serde_json::json;

    fn schema() -> Schema {
        SchemaBuilder::new()
            .query(
                ObjectType::new("Query").field(
                    FieldDefinition::new("search", TypeRef::named("String"))
                        .argument(InputValueDef::new("filter", TypeRef::named("Filter"))),
                ),
            )
            .register(EnumType::new("Episode").value("NEWHOPE").value("EMPIRE").value("JEDI"))
            .register(
                InputObjectType::new("Filter")
                    .field(InputValueDef::new("text", TypeRef::non_null(TypeRef::named("String"))))
                    .field(
                        InputValueDef::new("limit", TypeRef::named("Int")).default_value(json!(10)),
                    )
                    .field(InputValueDef::new(
                        "episodes",
                        TypeRef::list(TypeRef::non_null(TypeRef::named("Episode"))),
                    )),
            )
            .build()
            .unwrap()
    }

    fn operation(source: &str) -> ast::OperationDefinition {
        parse(source).unwrap().operations().next().unwrap().clone()
    }

    fn field_arguments(op: &ast::OperationDefinition) -> Vec<ast::Argument> {
        match &op.selection_set.selections[0] {
            ast::Selection::Field(field) => field.arguments.clone(),
            _ => unreachable!(),
        }
    }

    fn errors(result: Result<Map<String, Value>, Vec<CoercionError>>) -> Vec<String> {
        result.unwrap_err().into_iter().map(|e| e.message).collect()
    }

    #[test]
    fn test_variables_defaults_and_required() {
        let schema = schema();
        let op = operation("query ($id: ID!, $n: Int = 3, $opt: String) { search }");

        let coerced = coerce_variable_values(&schema, &op, json!({"id": 7}).as_object().unwrap()).unwrap();
        assert_eq!(Value::Object(coerced), json!({"id": "7", "n": 3}));

        assert_eq!(
            errors(coerce_variable_values(&schema, &op, &Map::new())),
            ["Variable \"$id\" of required type \"ID!\" was not provided."]
        );
        assert_eq!(
            errors(coerce_variable_values(&schema, &op, json!({"id": null}).as_object().unwrap())),
            ["Variable \"$id\" of non-null type \"ID!\" must not be null."]
        );
    }

    #[test]
    fn test_variable_invalid_value() {
        let schema = schema();
        let op = operation("query ($n: Int) { search }");
        assert_eq!(
            errors(coerce_variable_values(&schema, &op, json!({"n": 1.5}).as_object().unwrap())),
            ["Variable \"$n\" got invalid value 1.5; Int cannot represent non-integer value: 1.5"]
        );
    }

    #[test]
    fn test_input_object_variable() {
        let schema = schema();
        let ty = TypeRef::named("Filter");

        let value = coerce_input_value(&json!({"text": "r2", "episodes": "JEDI"}), &ty, &schema).unwrap();
        assert_eq!(value, json!({"text": "r2", "limit": 10, "episodes": ["JEDI"]}));

        assert_eq!(
            coerce_input_value(&json!({"limit": 1}), &ty, &schema),
            Err("Field \"text\" of required type \"String!\" was not provided.".to_string())
        );
        assert_eq!(
            coerce_input_value(&json!({"text": "a", "extra": 1}), &ty, &schema),
            Err("Field \"extra\" is not defined by type \"Filter\".".to_string())
        );
    }

    #[test]
    fn test_argument_literals() {
        let schema = schema();
        let defs = IndexMap::from([(
            "filter".to_string(),
            InputValueDef::new("filter", TypeRef::named("Filter")),
        )]);

        let op = operation(r#"{ search(filter: {text: "x", episodes: [NEWHOPE, EMPIRE]}) }"#);
        let args = coerce_argument_values(&schema, &defs, &field_arguments(&op), &Map::new()).unwrap();
        assert_eq!(
            args["filter"],
            json!({"text": "x", "limit": 10, "episodes": ["NEWHOPE", "EMPIRE"]})
        );

        let op = operation(r#"{ search(filter: {text: 4}) }"#);
        let err = coerce_argument_values(&schema, &defs, &field_arguments(&op), &Map::new()).unwrap_err();
        assert_eq!(err.message, "Argument \"filter\" has invalid value {text: 4}.");
    }

    #[test]
    fn test_argument_required_and_unprovided_variable() {
        let schema = schema();
        let defs = IndexMap::from([
            (
                "id".to_string(),
                InputValueDef::new("id", TypeRef::non_null(TypeRef::named("ID"))),
            ),
            (
                "limit".to_string(),
                InputValueDef::new("limit", TypeRef::named("Int")).default_value(json!(5)),
            ),
        ]);

        let op = operation("{ search(limit: $missing) }");
        let err = coerce_argument_values(&schema, &defs, &field_arguments(&op), &Map::new()).unwrap_err();
        assert_eq!(err.message, "Argument \"id\" of required type \"ID!\" was not provided.");

        let op = operation("{ search(id: 1000, limit: $missing) }");
        let args = coerce_argument_values(&schema, &defs, &field_arguments(&op), &Map::new()).unwrap();
        assert_eq!(args["id"], json!("1000"));
        assert_eq!(args["limit"], json!(5));

        let op = operation("{ search(id: null) }");
        let err = coerce_argument_values(&schema, &defs, &field_arguments(&op), &Map::new()).unwrap_err();
        assert_eq!(err.message, "Argument \"id\" of non-null type \"ID!\" must not be null.");
    }

    #[test]
    fn test_untyped_conversion() {
        let op = operation(r#"{ search(x: {a: [1, 2.5, "s", true, null, RED, $v]}) }"#);
        let args = field_arguments(&op);
        let vars = json!({"v": "var"});
        assert_eq!(
            value_from_ast_untyped(&args[0].value, vars.as_object()),
            json!({"a": [1, 2.5, "s", true, null, "RED", "var"]})
        );
    }
}
