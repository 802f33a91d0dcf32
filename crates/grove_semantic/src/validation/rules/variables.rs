//! Variable definition and usage rules.

use crate::schema::{TypeDef, TypeRef};
use crate::validation::context::{Node, ValidationContext};
use grove_core::diagnostics::codes;
use grove_core::DiagnosticBag;
use grove_syntax::ast::OperationDefinition;
use rustc_hash::{FxHashMap, FxHashSet};

pub(crate) fn variables_are_input_types(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    cx.walk(|node| {
        let Node::VariableDefinition(_, variable) = node else {
            return;
        };
        if cx
            .schema
            .get_type(variable.ty.name().as_str())
            .is_some_and(|ty| !ty.is_input_type())
        {
            bag.error(
                codes::VARIABLES_ARE_INPUT_TYPES,
                format!(
                    "Variable \"${}\" cannot be non-input type \"{}\".",
                    variable.name, variable.ty
                ),
                [variable.ty.span()],
            );
        }
    });
}

pub(crate) fn unique_variable_names(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    for op in cx.document.operations() {
        let mut seen = FxHashMap::default();
        for variable in &op.variables {
            let name = &variable.name;
            match seen.get(name.as_str()) {
                Some(&first) => bag.error(
                    codes::UNIQUE_VARIABLE_NAMES,
                    format!("There can be only one variable named \"${name}\"."),
                    [first, name.span],
                ),
                None => {
                    seen.insert(name.as_str(), name.span);
                }
            }
        }
    }
}

fn operation_suffix(op: &OperationDefinition) -> String {
    op.name
        .as_ref()
        .map(|name| format!(" by operation \"{name}\""))
        .unwrap_or_default()
}

pub(crate) fn no_undefined_variables(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    for op in cx.document.operations() {
        let defined: FxHashSet<&str> = op.variables.iter().map(|v| v.name.as_str()).collect();
        for usage in cx.variable_usages(op) {
            if !defined.contains(usage.name.as_str()) {
                bag.error(
                    codes::NO_UNDEFINED_VARIABLES,
                    format!(
                        "Variable \"${}\" is not defined{}.",
                        usage.name,
                        operation_suffix(op)
                    ),
                    [usage.name.span, op.span],
                );
            }
        }
    }
}

pub(crate) fn no_unused_variables(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    for op in cx.document.operations() {
        let used: FxHashSet<&str> = cx
            .variable_usages(op)
            .into_iter()
            .map(|usage| usage.name.as_str())
            .collect();
        for variable in &op.variables {
            if !used.contains(variable.name.as_str()) {
                let message = match &op.name {
                    Some(name) => format!(
                        "Variable \"${}\" is never used in operation \"{name}\".",
                        variable.name
                    ),
                    None => format!("Variable \"${}\" is never used.", variable.name),
                };
                bag.error(codes::NO_UNUSED_VARIABLES, message, [variable.span]);
            }
        }
    }
}

pub(crate) fn variables_in_allowed_position(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    for op in cx.document.operations() {
        let definitions: FxHashMap<&str, _> = op
            .variables
            .iter()
            .map(|v| (v.name.as_str(), v))
            .collect();
        for usage in cx.variable_usages(op) {
            let (Some(location_type), Some(definition)) =
                (&usage.ty, definitions.get(usage.name.as_str()))
            else {
                continue;
            };
            let variable_type = TypeRef::from_ast(&definition.ty);
            if cx
                .schema
                .get_type(variable_type.named_type())
                .map_or(true, |ty| !TypeDef::is_input_type(ty))
            {
                continue;
            }

            let allowed = if location_type.is_non_null() && !variable_type.is_non_null() {
                let has_non_null_default = definition
                    .default_value
                    .as_ref()
                    .is_some_and(|value| !value.is_null());
                (has_non_null_default || usage.has_location_default)
                    && cx.schema.is_sub_type(&variable_type, location_type.nullable())
            } else {
                cx.schema.is_sub_type(&variable_type, location_type)
            };

            if !allowed {
                bag.error(
                    codes::VARIABLES_IN_ALLOWED_POSITION,
                    format!(
                        "Variable \"${}\" of type \"{variable_type}\" used in position expecting type \"{location_type}\".",
                        definition.name
                    ),
                    [definition.span, usage.name.span],
                );
            }
        }
    }
}
