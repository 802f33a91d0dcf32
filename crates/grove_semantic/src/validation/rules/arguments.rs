//! Argument and literal value rules.

use crate::schema::{InputValueDef, TypeDef, TypeRef};
use crate::validation::context::{Node, ValidationContext};
use grove_core::diagnostics::codes;
use grove_core::DiagnosticBag;
use grove_syntax::ast::{Argument, Value};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

pub(crate) fn known_argument_names(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    cx.walk(|node| match node {
        Node::Field {
            parent: Some(parent),
            def: Some(def),
            field,
        } => {
            for argument in &field.arguments {
                if !def.arguments.contains_key(argument.name.as_str()) {
                    bag.error(
                        codes::KNOWN_ARGUMENT_NAMES,
                        format!(
                            "Unknown argument \"{}\" on field \"{}.{}\".",
                            argument.name,
                            parent.name(),
                            field.name
                        ),
                        [argument.span],
                    );
                }
            }
        }
        Node::Directive { directive, .. } => {
            let Some(def) = cx.schema.directive(directive.name.as_str()) else {
                return;
            };
            for argument in &directive.arguments {
                if !def.arguments.contains_key(argument.name.as_str()) {
                    bag.error(
                        codes::KNOWN_ARGUMENT_NAMES,
                        format!(
                            "Unknown argument \"{}\" on directive \"@{}\".",
                            argument.name, directive.name
                        ),
                        [argument.span],
                    );
                }
            }
        }
        _ => {}
    });
}

pub(crate) fn unique_argument_names(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    let mut check = |arguments: &[Argument]| {
        let mut seen = FxHashMap::default();
        for argument in arguments {
            let name = argument.name.as_str();
            match seen.get(name) {
                Some(&first) => bag.error(
                    codes::UNIQUE_ARGUMENT_NAMES,
                    format!("There can be only one argument named \"{name}\"."),
                    [first, argument.name.span],
                ),
                None => {
                    seen.insert(name, argument.name.span);
                }
            }
        }
    };
    cx.walk(|node| match node {
        Node::Field { field, .. } => check(&field.arguments),
        Node::Directive { directive, .. } => check(&directive.arguments),
        _ => {}
    });
}

pub(crate) fn provided_required_arguments(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    fn missing<'d>(
        definitions: &'d IndexMap<String, InputValueDef>,
        supplied: &[Argument],
    ) -> impl Iterator<Item = &'d InputValueDef> + 'd {
        let supplied: Vec<String> = supplied.iter().map(|arg| arg.name.value.clone()).collect();
        definitions
            .values()
            .filter(move |def| def.is_required() && !supplied.contains(&def.name))
    }

    cx.walk(|node| match node {
        Node::Field {
            def: Some(def),
            field,
            ..
        } => {
            for argument in missing(&def.arguments, &field.arguments) {
                bag.error(
                    codes::PROVIDED_REQUIRED_ARGUMENTS,
                    format!(
                        "Field \"{}\" argument \"{}\" of type \"{}\" is required, but it was not provided.",
                        field.name, argument.name, argument.ty
                    ),
                    [field.span],
                );
            }
        }
        Node::Directive { directive, .. } => {
            let Some(def) = cx.schema.directive(directive.name.as_str()) else {
                return;
            };
            for argument in missing(&def.arguments, &directive.arguments) {
                bag.error(
                    codes::PROVIDED_REQUIRED_ARGUMENTS,
                    format!(
                        "Directive \"@{}\" argument \"{}\" of type \"{}\" is required, but it was not provided.",
                        directive.name, argument.name, argument.ty
                    ),
                    [directive.span],
                );
            }
        }
        _ => {}
    });
}

pub(crate) fn values_of_correct_type(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    let check_arguments =
        |definitions: &IndexMap<String, InputValueDef>, arguments: &[Argument], bag: &mut DiagnosticBag| {
            for argument in arguments {
                if let Some(def) = definitions.get(argument.name.as_str()) {
                    check_value(cx, &argument.value, &def.ty, bag);
                }
            }
        };
    cx.walk(|node| match node {
        Node::Field {
            def: Some(def),
            field,
            ..
        } => check_arguments(&def.arguments, &field.arguments, bag),
        Node::Directive { directive, .. } => {
            if let Some(def) = cx.schema.directive(directive.name.as_str()) {
                check_arguments(&def.arguments, &directive.arguments, bag);
            }
        }
        Node::VariableDefinition(_, variable) => {
            let Some(default) = &variable.default_value else {
                return;
            };
            let ty = TypeRef::from_ast(&variable.ty);
            if cx
                .schema
                .get_type(ty.named_type())
                .is_some_and(TypeDef::is_input_type)
            {
                check_value(cx, default, &ty, bag);
            }
        }
        _ => {}
    });
}

fn check_value(cx: &ValidationContext<'_>, value: &Value, location: &TypeRef, bag: &mut DiagnosticBag) {
    if matches!(value, Value::Variable(_)) {
        return;
    }
    if value.is_null() {
        if location.is_non_null() {
            bag.error(
                codes::VALUES_OF_CORRECT_TYPE,
                format!("Expected value of type \"{location}\", found null."),
                [value.span()],
            );
        }
        return;
    }

    let expected = |bag: &mut DiagnosticBag, reason: Option<String>| {
        let message = match reason {
            Some(reason) => format!("Expected value of type \"{location}\", found {value}; {reason}"),
            None => format!("Expected value of type \"{location}\", found {value}."),
        };
        bag.error(codes::VALUES_OF_CORRECT_TYPE, message, [value.span()]);
    };

    match location.nullable() {
        TypeRef::NonNull(_) => {}
        TypeRef::List(inner) => match value {
            Value::List(items, _) => {
                for item in items {
                    check_value(cx, item, inner, bag);
                }
            }
            single => check_value(cx, single, inner, bag),
        },
        TypeRef::Named(name) => match cx.schema.get_type(name) {
            Some(TypeDef::InputObject(input)) => {
                let Value::Object(fields, _) = value else {
                    expected(bag, None);
                    return;
                };
                for (field_name, field_value) in fields {
                    match input.fields.get(field_name.as_str()) {
                        Some(def) => check_value(cx, field_value, &def.ty, bag),
                        None => bag.error(
                            codes::VALUES_OF_CORRECT_TYPE,
                            format!("Field \"{field_name}\" is not defined by type \"{name}\"."),
                            [field_name.span],
                        ),
                    }
                }
                for def in input.fields.values() {
                    if def.is_required() && !fields.iter().any(|(n, _)| n.value == def.name) {
                        bag.error(
                            codes::VALUES_OF_CORRECT_TYPE,
                            format!(
                                "Field \"{name}.{}\" of required type \"{}\" was not provided.",
                                def.name, def.ty
                            ),
                            [value.span()],
                        );
                    }
                }
            }
            Some(TypeDef::Scalar(scalar)) => {
                let mut has_variables = false;
                value.for_each_variable(&mut |_| has_variables = true);
                if has_variables {
                    return;
                }
                if let Err(reason) = scalar.coerce_literal(value) {
                    expected(bag, Some(reason));
                }
            }
            Some(TypeDef::Enum(enum_type)) => {
                if let Err(reason) = enum_type.coerce_literal(value) {
                    expected(bag, Some(reason));
                }
            }
            _ => {}
        },
    }
}
