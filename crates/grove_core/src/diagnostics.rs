//! Diagnostic reporting for Grove.

use crate::span::Span;

/// A rejected-document finding.
///
/// `title` is the complete, user-facing sentence; `spans` point at every
/// source position involved, in the order they should be reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Rule code.
    pub code: &'static str,
    /// User-facing message.
    pub title: String,
    spans: Vec<Span>,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    pub fn error(code: &'static str, title: impl Into<String>) -> Self {
        Self {
            code,
            title: title.into(),
            spans: Vec::new(),
        }
    }

    /// Adds source positions.
    #[must_use]
    pub fn with_spans(mut self, spans: impl IntoIterator<Item = Span>) -> Self {
        self.spans.extend(spans);
        self
    }

    /// Returns every span, primary first.
    pub fn spans(&self) -> impl Iterator<Item = Span> + '_ {
        self.spans.iter().copied()
    }
}

/// Diagnostics in the order they were reported.
#[derive(Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an error diagnostic pointing at the given spans.
    pub fn error(
        &mut self,
        code: &'static str,
        title: impl Into<String>,
        spans: impl IntoIterator<Item = Span>,
    ) {
        self.diagnostics
            .push(Diagnostic::error(code, title).with_spans(spans));
    }

    /// Moves every diagnostic of `other` into this bag.
    pub fn extend(&mut self, other: DiagnosticBag) {
        self.diagnostics.extend(other.diagnostics);
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }
}

/// Common diagnostic codes.
pub mod codes {
    pub const UNEXPECTED_TOKEN: &str = "E0001";
    pub const UNEXPECTED_EOF: &str = "E0002";
    pub const INVALID_SYNTAX: &str = "E0003";
    pub const NESTING_TOO_DEEP: &str = "E0004";

    pub const UNIQUE_OPERATION_NAMES: &str = "V0001";
    pub const LONE_ANONYMOUS_OPERATION: &str = "V0002";
    pub const KNOWN_OPERATION_TYPES: &str = "V0003";
    pub const SINGLE_FIELD_SUBSCRIPTIONS: &str = "V0004";
    pub const KNOWN_TYPE_NAMES: &str = "V0010";
    pub const FRAGMENTS_ON_COMPOSITE_TYPES: &str = "V0011";
    pub const VARIABLES_ARE_INPUT_TYPES: &str = "V0012";
    pub const SCALAR_LEAFS: &str = "V0013";
    pub const FIELDS_ON_CORRECT_TYPE: &str = "V0014";
    pub const OVERLAPPING_FIELDS: &str = "V0015";
    pub const UNIQUE_FRAGMENT_NAMES: &str = "V0020";
    pub const KNOWN_FRAGMENT_NAMES: &str = "V0021";
    pub const NO_UNUSED_FRAGMENTS: &str = "V0022";
    pub const POSSIBLE_FRAGMENT_SPREADS: &str = "V0023";
    pub const NO_FRAGMENT_CYCLES: &str = "V0024";
    pub const UNIQUE_VARIABLE_NAMES: &str = "V0030";
    pub const NO_UNDEFINED_VARIABLES: &str = "V0031";
    pub const NO_UNUSED_VARIABLES: &str = "V0032";
    pub const VARIABLES_IN_ALLOWED_POSITION: &str = "V0033";
    pub const KNOWN_DIRECTIVES: &str = "V0040";
    pub const UNIQUE_DIRECTIVES_PER_LOCATION: &str = "V0041";
    pub const KNOWN_ARGUMENT_NAMES: &str = "V0050";
    pub const UNIQUE_ARGUMENT_NAMES: &str = "V0051";
    pub const VALUES_OF_CORRECT_TYPE: &str = "V0052";
    pub const PROVIDED_REQUIRED_ARGUMENTS: &str = "V0053";
    pub const MAX_DEPTH: &str = "V0060";
}
