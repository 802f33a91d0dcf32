//! Syntax errors.

use grove_core::{diagnostics::codes, LineIndex, Location, Span};
use thiserror::Error;

/// The single error produced when a request document cannot be parsed.
///
/// There is no recovery: the first malformed token aborts parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Syntax Error: {message}")]
pub struct SyntaxError {
    /// What was wrong, without the `Syntax Error:` prefix.
    pub message: String,
    /// Offending source range.
    pub span: Span,
    /// 1-based line/column of `span.start`.
    pub location: Location,
    code: &'static str,
}

impl SyntaxError {
    /// Creates an error for `span` in `source`.
    pub fn new(source: &str, span: Span, message: impl Into<String>) -> Self {
        Self::with_code(codes::INVALID_SYNTAX, source, span, message)
    }

    pub(crate) fn with_code(
        code: &'static str,
        source: &str,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            span,
            location: LineIndex::new(source).span_start(span),
            code,
        }
    }

    /// Returns the diagnostic code (`E000x`).
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        self.code
    }
}

impl miette::Diagnostic for SyntaxError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(self.code))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(miette::LabeledSpan::new_with_span(
            Some(self.message.clone()),
            self.span,
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic;

    #[test]
    fn test_location_and_display() {
        let err = SyntaxError::new("{\n  a(\n}", Span::new(7, 8), "Expected Name, found \"}\".");
        assert_eq!(err.location, Location::new(3, 1));
        assert_eq!(err.to_string(), "Syntax Error: Expected Name, found \"}\".");
        assert_eq!(err.error_code(), "E0003");
        assert_eq!(
            Diagnostic::code(&err).map(|c| c.to_string()),
            Some("E0003".to_string())
        );
        assert_eq!(err.labels().map(Iterator::count), Some(1));
    }
}
