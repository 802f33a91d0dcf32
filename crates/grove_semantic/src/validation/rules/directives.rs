//! Directive rules.

use crate::validation::context::{Node, ValidationContext};
use grove_core::diagnostics::codes;
use grove_core::DiagnosticBag;
use grove_syntax::ast::Directive;
use rustc_hash::FxHashMap;

pub(crate) fn known_directives(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    cx.walk(|node| {
        let Node::Directive {
            directive,
            location,
        } = node
        else {
            return;
        };
        match cx.schema.directive(directive.name.as_str()) {
            None => bag.error(
                codes::KNOWN_DIRECTIVES,
                format!("Unknown directive \"@{}\".", directive.name),
                [directive.span],
            ),
            Some(def) if !def.allows(location) => bag.error(
                codes::KNOWN_DIRECTIVES,
                format!(
                    "Directive \"@{}\" may not be used on {location}.",
                    directive.name
                ),
                [directive.span],
            ),
            Some(_) => {}
        }
    });
}

pub(crate) fn unique_directives_per_location(cx: &ValidationContext<'_>, bag: &mut DiagnosticBag) {
    let mut check = |directives: &[Directive]| {
        let mut seen = FxHashMap::default();
        for directive in directives {
            let name = directive.name.as_str();
            if cx.schema.directive(name).is_some_and(|def| def.repeatable) {
                continue;
            }
            match seen.get(name) {
                Some(&first) => bag.error(
                    codes::UNIQUE_DIRECTIVES_PER_LOCATION,
                    format!("The directive \"@{name}\" can only be used once at this location."),
                    [first, directive.span],
                ),
                None => {
                    seen.insert(name, directive.span);
                }
            }
        }
    };
    cx.walk(|node| match node {
        Node::Operation(op) => check(&op.directives),
        Node::VariableDefinition(_, variable) => check(&variable.directives),
        Node::Fragment(fragment) => check(&fragment.directives),
        Node::Field { field, .. } => check(&field.directives),
        Node::FragmentSpread { spread, .. } => check(&spread.directives),
        Node::InlineFragment { inline, .. } => check(&inline.directives),
        Node::SelectionSet { .. } | Node::Directive { .. } => {}
    });
}
