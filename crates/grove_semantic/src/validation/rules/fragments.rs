//! Fragment rules and type-condition checks.

use crate::validation::context::{Node, ValidationContext};
use grove_core::diagnostics::codes;
use grove_core::DiagnosticBag;
use grove_syntax::ast::{FragmentDefinition, FragmentSpread, Selection, SelectionSet};
use rustc_hash::{FxHashMap, FxHashSet};

pub(crate) fn known_type_names(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    let mut check = |name: &grove_syntax::ast::Name| {
        if cx.schema.get_type(name.as_str()).is_none() {
            bag.error(
                codes::KNOWN_TYPE_NAMES,
                format!("Unknown type \"{name}\"."),
                [name.span],
            );
        }
    };
    cx.walk(|node| match node {
        Node::VariableDefinition(_, variable) => check(variable.ty.name()),
        Node::Fragment(fragment) => check(&fragment.type_condition),
        Node::InlineFragment { inline, .. } => {
            if let Some(condition) = &inline.type_condition {
                check(condition);
            }
        }
        _ => {}
    });
}

pub(crate) fn fragments_on_composite_types(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    cx.walk(|node| match node {
        Node::Fragment(fragment) => {
            let condition = &fragment.type_condition;
            if cx
                .schema
                .get_type(condition.as_str())
                .is_some_and(|ty| !ty.is_composite())
            {
                bag.error(
                    codes::FRAGMENTS_ON_COMPOSITE_TYPES,
                    format!(
                        "Fragment \"{}\" cannot condition on non composite type \"{condition}\".",
                        fragment.name
                    ),
                    [condition.span],
                );
            }
        }
        Node::InlineFragment { inline, .. } => {
            let Some(condition) = &inline.type_condition else {
                return;
            };
            if cx
                .schema
                .get_type(condition.as_str())
                .is_some_and(|ty| !ty.is_composite())
            {
                bag.error(
                    codes::FRAGMENTS_ON_COMPOSITE_TYPES,
                    format!("Fragment cannot condition on non composite type \"{condition}\"."),
                    [condition.span],
                );
            }
        }
        _ => {}
    });
}

pub(crate) fn unique_fragment_names(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    let mut seen = FxHashMap::default();
    for fragment in cx.document.fragments() {
        let name = &fragment.name;
        match seen.get(name.as_str()) {
            Some(&first) => bag.error(
                codes::UNIQUE_FRAGMENT_NAMES,
                format!("There can be only one fragment named \"{name}\"."),
                [first, name.span],
            ),
            None => {
                seen.insert(name.as_str(), name.span);
            }
        }
    }
}

pub(crate) fn known_fragment_names(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    cx.walk(|node| {
        if let Node::FragmentSpread { spread, .. } = node {
            if cx.fragment(spread.name.as_str()).is_none() {
                bag.error(
                    codes::KNOWN_FRAGMENT_NAMES,
                    format!("Unknown fragment \"{}\".", spread.name),
                    [spread.name.span],
                );
            }
        }
    });
}

pub(crate) fn no_unused_fragments(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    let used: FxHashSet<&str> = cx
        .document
        .operations()
        .flat_map(|op| cx.recursive_fragments(&op.selection_set))
        .map(|fragment| fragment.name.as_str())
        .collect();
    for fragment in cx.document.fragments() {
        if !used.contains(fragment.name.as_str()) {
            bag.error(
                codes::NO_UNUSED_FRAGMENTS,
                format!("Fragment \"{}\" is never used.", fragment.name),
                [fragment.span],
            );
        }
    }
}

pub(crate) fn possible_fragment_spreads(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    cx.walk(|node| match node {
        Node::InlineFragment {
            parent: Some(parent),
            inline,
        } => {
            let Some(fragment_type) = inline
                .type_condition
                .as_ref()
                .and_then(|condition| cx.composite(condition.as_str()))
            else {
                return;
            };
            if !cx.schema.types_overlap(parent, fragment_type) {
                bag.error(
                    codes::POSSIBLE_FRAGMENT_SPREADS,
                    format!(
                        "Fragment cannot be spread here as objects of type \"{}\" can never be of type \"{}\".",
                        parent.name(),
                        fragment_type.name()
                    ),
                    [inline.span],
                );
            }
        }
        Node::FragmentSpread {
            parent: Some(parent),
            spread,
        } => {
            let Some(fragment_type) = cx
                .fragment(spread.name.as_str())
                .and_then(|fragment| cx.composite(fragment.type_condition.as_str()))
            else {
                return;
            };
            if !cx.schema.types_overlap(parent, fragment_type) {
                bag.error(
                    codes::POSSIBLE_FRAGMENT_SPREADS,
                    format!(
                        "Fragment \"{}\" cannot be spread here as objects of type \"{}\" can never be of type \"{}\".",
                        spread.name,
                        parent.name(),
                        fragment_type.name()
                    ),
                    [spread.span],
                );
            }
        }
        _ => {}
    });
}

pub(crate) fn no_fragment_cycles(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    let mut detector = CycleDetector {
        cx,
        bag,
        visited: FxHashSet::default(),
        spread_path: Vec::new(),
        path_index: FxHashMap::default(),
    };
    for fragment in cx.document.fragments() {
        detector.detect(fragment);
    }
}

struct CycleDetector<'a, 'b> {
    cx: &'b ValidationContext<'a>,
    bag: &'b mut DiagnosticBag,
    visited: FxHashSet<&'a str>,
    spread_path: Vec<&'a FragmentSpread>,
    path_index: FxHashMap<&'a str, usize>,
}

impl<'a> CycleDetector<'a, '_> {
    fn detect(&mut self, fragment: &'a FragmentDefinition) {
        let name = fragment.name.as_str();
        if !self.visited.insert(name) {
            return;
        }
        let mut spreads = Vec::new();
        direct_spreads(&fragment.selection_set, &mut spreads);
        if spreads.is_empty() {
            return;
        }

        self.path_index.insert(name, self.spread_path.len());
        for spread in spreads {
            let spread_name = spread.name.as_str();
            let cycle_index = self.path_index.get(spread_name).copied();
            self.spread_path.push(spread);
            match cycle_index {
                None => {
                    if let Some(target) = self.cx.fragment(spread_name) {
                        self.detect(target);
                    }
                }
                Some(index) => {
                    let cycle = &self.spread_path[index..];
                    let via = cycle[..cycle.len() - 1]
                        .iter()
                        .map(|s| format!("\"{}\"", s.name))
                        .collect::<Vec<_>>()
                        .join(", ");
                    let message = if via.is_empty() {
                        format!("Cannot spread fragment \"{spread_name}\" within itself.")
                    } else {
                        format!("Cannot spread fragment \"{spread_name}\" within itself via {via}.")
                    };
                    self.bag.error(
                        codes::NO_FRAGMENT_CYCLES,
                        message,
                        cycle.iter().map(|s| s.span),
                    );
                }
            }
            self.spread_path.pop();
        }
        self.path_index.remove(name);
    }
}

fn direct_spreads<'a>(selection_set: &'a SelectionSet, out: &mut Vec<&'a FragmentSpread>) {
    for selection in selection_set {
        match selection {
            Selection::FragmentSpread(spread) => out.push(spread),
            Selection::InlineFragment(inline) => direct_spreads(&inline.selection_set, out),
            Selection::Field(field) => {
                if let Some(set) = &field.selection_set {
                    direct_spreads(set, out);
                }
            }
        }
    }
}
