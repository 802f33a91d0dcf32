//! Response errors.

use grove_core::{Diagnostic, LineIndex, Location, Span};
use grove_semantic::{CoercionError, PathSegment};
use grove_syntax::SyntaxError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Which stage produced an error. Not serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorKind {
    /// The request text could not be parsed.
    Syntax,
    /// The document failed validation.
    Validation,
    /// A variable or argument value could not be coerced.
    Coercion,
    /// A resolver failed or a value could not be serialized.
    #[default]
    Field,
    /// A non-null position resolved to null.
    NullabilityViolation,
    /// The request was cancelled before the field completed.
    Cancelled,
    /// No executable operation could be selected.
    Operation,
}

/// An error entry of a response.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct GraphQLError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<IndexMap<String, Value>>,
    #[serde(skip)]
    pub kind: ErrorKind,
}

impl GraphQLError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: None,
            extensions: None,
            kind,
        }
    }

    /// Wraps a parse failure.
    #[must_use]
    pub fn from_syntax(error: &SyntaxError) -> Self {
        Self::new(ErrorKind::Syntax, error.to_string())
            .with_location(error.location)
            .with_code(error.error_code())
    }

    /// Wraps a validation finding, resolving its spans to locations.
    #[must_use]
    pub fn from_diagnostic(diagnostic: &Diagnostic, lines: &LineIndex) -> Self {
        Self::new(ErrorKind::Validation, diagnostic.title.clone())
            .with_spans(diagnostic.spans(), lines)
            .with_code(diagnostic.code)
    }

    /// Wraps a coercion failure.
    #[must_use]
    pub fn from_coercion(error: &CoercionError, lines: &LineIndex) -> Self {
        Self::new(ErrorKind::Coercion, error.message.clone()).with_spans(error.span, lines)
    }

    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    #[must_use]
    pub fn with_spans(mut self, spans: impl IntoIterator<Item = Span>, lines: &LineIndex) -> Self {
        self.locations
            .extend(spans.into_iter().map(|span| lines.span_start(span)));
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = Some(path);
        self
    }

    #[must_use]
    pub fn with_extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extensions
            .get_or_insert_with(IndexMap::new)
            .insert(key.into(), value);
        self
    }

    /// Sets the `code` extension.
    #[must_use]
    pub fn with_code(self, code: impl Into<String>) -> Self {
        self.with_extension("code", Value::String(code.into()))
    }
}
