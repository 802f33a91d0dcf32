//! Request document validation.
//!
//! Every rule is an independent pass over the document that appends to its
//! own [`DiagnosticBag`]. Rules run on the rayon pool by default and their
//! findings are concatenated in the fixed order of [`RULES`], so the output
//! does not depend on scheduling.

mod context;
mod rules;

pub use context::ValidationContext;

use crate::schema::Schema;
use grove_core::DiagnosticBag;
use grove_syntax::ast::Document;
use rayon::prelude::*;
use rules::{arguments, directives, fields, fragments, operations, variables};

/// Validation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Rejects selection sets nested deeper than this.
    pub max_depth: Option<usize>,
    /// Runs rules on the rayon pool.
    pub parallel: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            parallel: true,
        }
    }
}

impl ValidationOptions {
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

type Rule = fn(&ValidationContext<'_>, &mut DiagnosticBag);

const RULES: &[Rule] = &[
    operations::unique_operation_names,
    operations::lone_anonymous_operation,
    operations::known_operation_types,
    operations::single_field_subscriptions,
    fragments::known_type_names,
    fragments::fragments_on_composite_types,
    variables::variables_are_input_types,
    fields::scalar_leafs,
    fields::fields_on_correct_type,
    fragments::unique_fragment_names,
    fragments::known_fragment_names,
    fragments::no_unused_fragments,
    fragments::possible_fragment_spreads,
    fragments::no_fragment_cycles,
    variables::unique_variable_names,
    variables::no_undefined_variables,
    variables::no_unused_variables,
    directives::known_directives,
    directives::unique_directives_per_location,
    arguments::known_argument_names,
    arguments::unique_argument_names,
    arguments::values_of_correct_type,
    arguments::provided_required_arguments,
    variables::variables_in_allowed_position,
    fields::overlapping_fields_can_be_merged,
    operations::max_depth,
];

/// Validates `document` against `schema`, returning every finding.
///
/// The document is executable only when the result has no errors.
#[must_use]
pub fn validate(schema: &Schema, document: &Document, options: &ValidationOptions) -> DiagnosticBag {
    let cx = ValidationContext::new(schema, document, options);
    let run = |rule: &Rule| {
        let mut bag = DiagnosticBag::new();
        rule(&cx, &mut bag);
        bag
    };

    let bags: Vec<DiagnosticBag> = if options.parallel {
        RULES.par_iter().map(run).collect()
    } else {
        RULES.iter().map(run).collect()
    };

    let mut diagnostics = DiagnosticBag::new();
    for bag in bags {
        diagnostics.extend(bag);
    }
    if diagnostics.has_errors() {
        tracing::debug!(
            errors = diagnostics.error_count(),
            "document rejected by validation"
        );
    }
    diagnostics
}
