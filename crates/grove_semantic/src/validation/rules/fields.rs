//! Field selection rules.

use crate::schema::{TypeDef, TypeRef};
use crate::validation::context::{Node, ValidationContext};
use grove_core::diagnostics::codes;
use grove_core::{DiagnosticBag, Span};
use grove_syntax::ast::{Field, Selection, SelectionSet};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;

pub(crate) fn fields_on_correct_type(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    cx.walk(|node| {
        if let Node::Field {
            parent: Some(parent),
            def: None,
            field,
        } = node
        {
            bag.error(
                codes::FIELDS_ON_CORRECT_TYPE,
                format!(
                    "Cannot query field \"{}\" on type \"{}\".",
                    field.name,
                    parent.name()
                ),
                [field.span],
            );
        }
    });
}

pub(crate) fn scalar_leafs(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    cx.walk(|node| {
        let Node::Field {
            def: Some(def),
            field,
            ..
        } = node
        else {
            return;
        };
        let Some(ty) = cx.schema.get_type(def.ty.named_type()) else {
            return;
        };
        match (&field.selection_set, ty.is_leaf()) {
            (Some(selection_set), true) => bag.error(
                codes::SCALAR_LEAFS,
                format!(
                    "Field \"{}\" must not have a selection since type \"{}\" has no subfields.",
                    field.name, def.ty
                ),
                [selection_set.span],
            ),
            (None, false) => bag.error(
                codes::SCALAR_LEAFS,
                format!(
                    "Field \"{name}\" of type \"{}\" must have a selection of subfields. Did you mean \"{name} {{ ... }}\"?",
                    def.ty,
                    name = field.name
                ),
                [field.span],
            ),
            _ => {}
        }
    });
}

type Occurrence<'a> = (Option<&'a TypeDef>, &'a Field);
type Collected<'a> = IndexMap<&'a str, Vec<Occurrence<'a>>>;

/// Fields sharing a response key must be mergeable: same field name and the
/// same arguments unless their parents are distinct object types, compatible
/// return types, and mergeable sub-selections.
pub(crate) fn overlapping_fields_can_be_merged(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    let mut reported: FxHashSet<(Span, Span)> = FxHashSet::default();
    cx.walk(|node| {
        let Node::SelectionSet {
            parent,
            selection_set,
        } = node
        else {
            return;
        };
        let mut collected = Collected::default();
        collect(cx, parent, selection_set, &mut collected, &mut FxHashSet::default());

        for (key, fields) in &collected {
            let conflict = fields.iter().enumerate().find_map(|(i, a)| {
                fields[i + 1..].iter().find_map(|b| {
                    find_conflict(cx, a, b, false, &FxHashSet::default()).map(|reason| (a.1, b.1, reason))
                })
            });
            let Some((a, b, reason)) = conflict else {
                continue;
            };
            if reported.insert((a.span, b.span)) {
                bag.error(
                    codes::OVERLAPPING_FIELDS,
                    format!(
                        "Fields \"{key}\" conflict because {reason}. Use different aliases on the fields to fetch both if this was intentional."
                    ),
                    [a.span, b.span],
                );
            }
        }
    });
}

/// Compares two occurrences of one response key, descending into their
/// merged sub-selections. `expanded` holds the fragments already spread on
/// the way down and stops fragment cycles.
fn find_conflict<'a>(
    cx: &ValidationContext<'a>,
    &(parent_a, a): &Occurrence<'a>,
    &(parent_b, b): &Occurrence<'a>,
    parents_exclusive: bool,
    expanded: &FxHashSet<&'a str>,
) -> Option<String> {
    let exclusive = parents_exclusive
        || matches!(
            (parent_a, parent_b),
            (Some(TypeDef::Object(pa)), Some(TypeDef::Object(pb))) if pa.name != pb.name
        );
    if !exclusive {
        if a.name.value != b.name.value {
            return Some(format!(
                "\"{}\" and \"{}\" are different fields",
                a.name, b.name
            ));
        }
        if !same_arguments(a, b) {
            return Some("they have differing arguments".to_string());
        }
    }

    let def_a = parent_a.and_then(|p| cx.schema.field_def(p, a.name.as_str()));
    let def_b = parent_b.and_then(|p| cx.schema.field_def(p, b.name.as_str()));
    if let (Some(def_a), Some(def_b)) = (def_a, def_b) {
        if types_conflict(cx, &def_a.ty, &def_b.ty) {
            return Some(format!(
                "they return conflicting types \"{}\" and \"{}\"",
                def_a.ty, def_b.ty
            ));
        }
    }

    let (Some(set_a), Some(set_b)) = (&a.selection_set, &b.selection_set) else {
        return None;
    };
    let mut visited_a = expanded.clone();
    let mut sub_a = Collected::default();
    let child_a = def_a.and_then(|def| cx.composite(def.ty.named_type()));
    collect(cx, child_a, set_a, &mut sub_a, &mut visited_a);

    let mut visited_b = expanded.clone();
    let mut sub_b = Collected::default();
    let child_b = def_b.and_then(|def| cx.composite(def.ty.named_type()));
    collect(cx, child_b, set_b, &mut sub_b, &mut visited_b);

    visited_a.extend(visited_b);
    for (key, fields_a) in &sub_a {
        let Some(fields_b) = sub_b.get(key) else {
            continue;
        };
        for field_a in fields_a {
            for field_b in fields_b {
                if let Some(reason) = find_conflict(cx, field_a, field_b, exclusive, &visited_a) {
                    return Some(format!("subfields \"{key}\" conflict because {reason}"));
                }
            }
        }
    }
    None
}

/// Lists and non-null wrappers must line up; leaf types must be identical.
fn types_conflict(cx: &ValidationContext<'_>, a: &TypeRef, b: &TypeRef) -> bool {
    match (a, b) {
        (TypeRef::List(a), TypeRef::List(b)) | (TypeRef::NonNull(a), TypeRef::NonNull(b)) => {
            types_conflict(cx, a, b)
        }
        (TypeRef::List(_) | TypeRef::NonNull(_), _) | (_, TypeRef::List(_) | TypeRef::NonNull(_)) => true,
        (TypeRef::Named(a), TypeRef::Named(b)) => {
            let leaf = |name: &str| cx.schema.get_type(name).is_some_and(TypeDef::is_leaf);
            a != b && (leaf(a.as_str()) || leaf(b.as_str()))
        }
    }
}

fn same_arguments(a: &Field, b: &Field) -> bool {
    a.arguments.len() == b.arguments.len()
        && a.arguments.iter().all(|arg| {
            b.argument(arg.name.as_str())
                .is_some_and(|other| other.value.to_string() == arg.value.to_string())
        })
}

fn collect<'a>(
    cx: &ValidationContext<'a>,
    parent: Option<&'a TypeDef>,
    selection_set: &'a SelectionSet,
    out: &mut Collected<'a>,
    visited: &mut FxHashSet<&'a str>,
) {
    for selection in selection_set {
        match selection {
            Selection::Field(field) => {
                out.entry(field.response_key())
                    .or_default()
                    .push((parent, field));
            }
            Selection::InlineFragment(inline) => {
                let child = match &inline.type_condition {
                    Some(condition) => cx.composite(condition.as_str()),
                    None => parent,
                };
                collect(cx, child, &inline.selection_set, out, visited);
            }
            Selection::FragmentSpread(spread) => {
                if !visited.insert(spread.name.as_str()) {
                    continue;
                }
                if let Some(fragment) = cx.fragment(spread.name.as_str()) {
                    let child = cx.composite(fragment.type_condition.as_str());
                    collect(cx, child, &fragment.selection_set, out, visited);
                }
            }
        }
    }
}
