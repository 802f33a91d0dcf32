//! Source span representation and line/column mapping.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A span in source code, represented as byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: u32,
    /// End byte offset (exclusive).
    pub end: u32,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        miette::SourceSpan::new(
            miette::SourceOffset::from(span.start as usize),
            (span.end - span.start) as usize,
        )
    }
}

/// A 1-based line and column in a request document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Maps byte offsets of a source text to [`Location`]s.
///
/// Columns count characters, not bytes, so multi-byte text before an
/// offset does not skew the reported position. `\r\n`, `\r` and `\n` are
/// all treated as line terminators.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the first character of each line.
    line_starts: Vec<u32>,
    source: String,
}

impl LineIndex {
    /// Builds the index for a source text.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let bytes = source.as_bytes();
        let mut line_starts = vec![0];
        for pos in memchr::memchr2_iter(b'\n', b'\r', bytes) {
            // `\r\n` counts once, at the `\n`.
            if bytes[pos] == b'\r' && bytes.get(pos + 1) == Some(&b'\n') {
                continue;
            }
            line_starts.push(pos as u32 + 1);
        }
        Self {
            line_starts,
            source: source.to_string(),
        }
    }

    /// Returns the location of a byte offset.
    #[must_use]
    pub fn location(&self, offset: u32) -> Location {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line] as usize;
        let end = (offset as usize).min(self.source.len());
        let column = self
            .source
            .get(start..end)
            .map_or(end - start, |text| text.chars().count());
        Location::new(line as u32 + 1, column as u32 + 1)
    }

    /// Returns the location of the start of a span.
    #[must_use]
    pub fn span_start(&self, span: Span) -> Location {
        self.location(span.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_into_source_span() {
        let span = miette::SourceSpan::from(Span::new(10, 20));
        assert_eq!(span.offset(), 10);
        assert_eq!(span.len(), 10);
    }

    #[test]
    fn test_line_index_first_line() {
        let index = LineIndex::new("{ hero }");
        assert_eq!(index.location(0), Location::new(1, 1));
        assert_eq!(index.location(2), Location::new(1, 3));
    }

    #[test]
    fn test_line_index_multiple_lines() {
        let index = LineIndex::new("query {\n  hero {\r\n    name\r  }\n}");
        assert_eq!(index.location(31), Location::new(5, 1));
        assert_eq!(index.location(10), Location::new(2, 3));
        assert_eq!(index.location(22), Location::new(3, 5));
        assert_eq!(index.location(27), Location::new(4, 1));
    }

    #[test]
    fn test_line_index_counts_chars() {
        let index = LineIndex::new("# ñ\n{ a }");
        // 'ñ' is two bytes but one column.
        assert_eq!(index.location(4), Location::new(1, 4));
        assert_eq!(index.location(5), Location::new(2, 1));
    }
}
