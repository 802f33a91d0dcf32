//! Operation-level rules.

use crate::validation::context::ValidationContext;
use grove_core::diagnostics::codes;
use grove_core::DiagnosticBag;
use grove_syntax::ast::{OperationType, Selection, SelectionSet};
use rustc_hash::{FxHashMap, FxHashSet};

pub(crate) fn unique_operation_names(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    let mut seen = FxHashMap::default();
    for op in cx.document.operations() {
        let Some(name) = &op.name else { continue };
        match seen.get(name.as_str()) {
            Some(&first) => bag.error(
                codes::UNIQUE_OPERATION_NAMES,
                format!("There can be only one operation named \"{name}\"."),
                [first, name.span],
            ),
            None => {
                seen.insert(name.as_str(), name.span);
            }
        }
    }
}

pub(crate) fn lone_anonymous_operation(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    let count = cx.document.operations().count();
    for op in cx.document.operations() {
        if op.name.is_none() && count > 1 {
            bag.error(
                codes::LONE_ANONYMOUS_OPERATION,
                "This anonymous operation must be the only defined operation.",
                [op.span],
            );
        }
    }
}

pub(crate) fn known_operation_types(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    for op in cx.document.operations() {
        if cx.schema.root_type(op.operation).is_none() {
            bag.error(
                codes::KNOWN_OPERATION_TYPES,
                format!(
                    "Schema is not configured to execute {} operation.",
                    op.operation
                ),
                [op.span],
            );
        }
    }
}

pub(crate) fn single_field_subscriptions(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    for op in cx.document.operations() {
        if op.operation != OperationType::Subscription {
            continue;
        }
        let mut keys = FxHashSet::default();
        let mut visited = FxHashSet::default();
        root_response_keys(cx, &op.selection_set, &mut keys, &mut visited);
        if keys.len() > 1 {
            let message = match &op.name {
                Some(name) => format!("Subscription \"{name}\" must select only one top level field."),
                None => "Anonymous Subscription must select only one top level field.".to_string(),
            };
            bag.error(codes::SINGLE_FIELD_SUBSCRIPTIONS, message, [op.selection_set.span]);
        }
    }
}

fn root_response_keys<'a>(
    cx: &ValidationContext<'a>,
    selection_set: &'a SelectionSet,
    keys: &mut FxHashSet<&'a str>,
    visited: &mut FxHashSet<&'a str>,
) {
    for selection in selection_set {
        match selection {
            Selection::Field(field) => {
                keys.insert(field.response_key());
            }
            Selection::InlineFragment(inline) => {
                root_response_keys(cx, &inline.selection_set, keys, visited);
            }
            Selection::FragmentSpread(spread) => {
                if visited.insert(spread.name.as_str()) {
                    if let Some(fragment) = cx.fragment(spread.name.as_str()) {
                        root_response_keys(cx, &fragment.selection_set, keys, visited);
                    }
                }
            }
        }
    }
}

/// No-op unless a maximum depth is configured.
pub(crate) fn max_depth(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    let Some(max) = cx.options.max_depth else {
        return;
    };
    for op in cx.document.operations() {
        let depth = cx.depth(&op.selection_set, &mut Vec::new());
        if depth > max {
            bag.error(
                codes::MAX_DEPTH,
                format!("Query depth {depth} exceeds maximum allowed depth of {max}."),
                [op.span],
            );
        }
    }
}
