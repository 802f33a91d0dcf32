//! Lexer for request documents.

use crate::error::SyntaxError;
use crate::token::{Token, TokenKind};
use grove_core::{diagnostics::codes, Span};

/// A lexer over a request string.
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: u32,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    /// Returns the current position.
    #[inline]
    pub fn pos(&self) -> u32 {
        self.pos
    }

    /// Returns the source text.
    #[inline]
    pub fn source(&self) -> &'a str {
        self.source
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos as usize).copied()
    }

    #[inline]
    fn peek_at(&self, offset: u32) -> Option<u8> {
        self.bytes.get((self.pos + offset) as usize).copied()
    }

    #[inline]
    fn advance(&mut self) {
        self.pos += 1;
    }

    #[inline]
    fn advance_by(&mut self, n: u32) {
        self.pos += n;
    }

    fn error(&self, span: Span, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.source, span, message)
    }

    fn error_here(&self, message: impl Into<String>) -> SyntaxError {
        self.error(Span::new(self.pos, self.pos + 1), message)
    }

    /// Describes the character at the current position for error messages.
    fn describe_current(&self) -> String {
        match self.source[self.pos as usize..].chars().next() {
            None => "<EOF>".to_string(),
            Some(c) if c.is_control() => format!("\"\\u{:04X}\"", c as u32),
            Some(c) => format!("\"{c}\""),
        }
    }

    /// Scans the next token.
    pub fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_trivia();

        let start = self.pos;

        let Some(c) = self.peek() else {
            return Ok(Token::new(TokenKind::Eof, Span::new(start, start)));
        };

        let kind = match c {
            b'!' => self.punct(TokenKind::Bang),
            b'$' => self.punct(TokenKind::Dollar),
            b'&' => self.punct(TokenKind::Amp),
            b'(' => self.punct(TokenKind::LParen),
            b')' => self.punct(TokenKind::RParen),
            b':' => self.punct(TokenKind::Colon),
            b'=' => self.punct(TokenKind::Eq),
            b'@' => self.punct(TokenKind::At),
            b'[' => self.punct(TokenKind::LBracket),
            b']' => self.punct(TokenKind::RBracket),
            b'{' => self.punct(TokenKind::LBrace),
            b'|' => self.punct(TokenKind::Pipe),
            b'}' => self.punct(TokenKind::RBrace),
            b'.' => {
                if self.peek_at(1) == Some(b'.') && self.peek_at(2) == Some(b'.') {
                    self.advance_by(3);
                    TokenKind::Spread
                } else {
                    return Err(self.error_here("Unexpected character: \".\"."));
                }
            }
            b'"' => self.scan_string()?,
            b'-' | b'0'..=b'9' => self.scan_number()?,
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_name(),
            _ => {
                let described = self.describe_current();
                return Err(self.error_here(format!("Unexpected character: {described}.")));
            }
        };

        Ok(Token::new(kind, Span::new(start, self.pos)))
    }

    #[inline]
    fn punct(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Skips whitespace, line terminators, commas, comments and the BOM.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n' | b',') => {
                    self.advance();
                }
                Some(b'#') => {
                    let rest = &self.bytes[self.pos as usize..];
                    match memchr::memchr2(b'\n', b'\r', rest) {
                        Some(offset) => self.advance_by(offset as u32),
                        None => self.pos = self.bytes.len() as u32,
                    }
                }
                Some(0xEF) if self.peek_at(1) == Some(0xBB) && self.peek_at(2) == Some(0xBF) => {
                    self.advance_by(3);
                }
                _ => break,
            }
        }
    }

    /// Scans a name or keyword.
    fn scan_name(&mut self) -> TokenKind {
        let start = self.pos;

        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.advance();
            } else {
                break;
            }
        }

        let text = self.slice_from(start);
        TokenKind::from_keyword(text).unwrap_or(TokenKind::Name)
    }

    fn skip_digits(&mut self) -> Result<(), SyntaxError> {
        if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
            let described = self.describe_current();
            return Err(self.error_here(format!(
                "Invalid number, expected digit but got: {described}."
            )));
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        Ok(())
    }

    /// Scans an Int or Float literal.
    fn scan_number(&mut self) -> Result<TokenKind, SyntaxError> {
        let mut is_float = false;

        if self.peek() == Some(b'-') {
            self.advance();
        }

        if self.peek() == Some(b'0') {
            self.advance();
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                let described = self.describe_current();
                return Err(self.error_here(format!(
                    "Invalid number, unexpected digit after 0: {described}."
                )));
            }
        } else {
            self.skip_digits()?;
        }

        if self.peek() == Some(b'.') {
            is_float = true;
            self.advance();
            self.skip_digits()?;
        }

        if let Some(b'e' | b'E') = self.peek() {
            is_float = true;
            self.advance();
            if let Some(b'+' | b'-') = self.peek() {
                self.advance();
            }
            self.skip_digits()?;
        }

        // A number must not run straight into a name or another dot.
        if let Some(c) = self.peek() {
            if c == b'.' || c == b'_' || c.is_ascii_alphabetic() {
                let described = self.describe_current();
                return Err(self.error_here(format!(
                    "Invalid number, expected digit but got: {described}."
                )));
            }
        }

        Ok(if is_float {
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntLiteral
        })
    }

    /// Scans a string literal, validating escapes.
    fn scan_string(&mut self) -> Result<TokenKind, SyntaxError> {
        let start = self.pos;
        self.advance();

        if self.peek() == Some(b'"') && self.peek_at(1) == Some(b'"') {
            self.advance_by(2);
            return self.scan_block_string(start);
        }

        loop {
            match self.peek() {
                None | Some(b'\n' | b'\r') => {
                    return Err(SyntaxError::with_code(
                        codes::UNEXPECTED_EOF,
                        self.source,
                        Span::new(start, self.pos),
                        "Unterminated string.",
                    ));
                }
                Some(b'"') => {
                    self.advance();
                    return Ok(TokenKind::StringLiteral);
                }
                Some(b'\\') => {
                    self.advance();
                    self.scan_escape()?;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn scan_escape(&mut self) -> Result<(), SyntaxError> {
        let escape_start = self.pos - 1;
        match self.peek() {
            Some(b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't') => {
                self.advance();
                Ok(())
            }
            Some(b'u') => {
                let digits = self
                    .source
                    .get(self.pos as usize + 1..self.pos as usize + 5)
                    .filter(|d| d.bytes().all(|b| b.is_ascii_hexdigit()));
                let valid = digits
                    .and_then(|d| u32::from_str_radix(d, 16).ok())
                    .and_then(char::from_u32)
                    .is_some();
                if !valid {
                    let mut end = (self.pos as usize + 5).min(self.bytes.len());
                    while !self.source.is_char_boundary(end) {
                        end -= 1;
                    }
                    let end = end as u32;
                    return Err(self.error(
                        Span::new(escape_start, end),
                        format!(
                            "Invalid Unicode escape sequence: \"{}\".",
                            &self.source[escape_start as usize..end as usize]
                        ),
                    ));
                }
                self.advance_by(5);
                Ok(())
            }
            _ => {
                let described = self.describe_current();
                Err(self.error(
                    Span::new(escape_start, self.pos + 1),
                    format!("Invalid character escape sequence: \"\\{}\".", described.trim_matches('"')),
                ))
            }
        }
    }

    /// Scans a block string literal.
    fn scan_block_string(&mut self, start: u32) -> Result<TokenKind, SyntaxError> {
        loop {
            match self.peek() {
                None => {
                    return Err(SyntaxError::with_code(
                        codes::UNEXPECTED_EOF,
                        self.source,
                        Span::new(start, self.pos),
                        "Unterminated string.",
                    ));
                }
                Some(b'"') if self.peek_at(1) == Some(b'"') && self.peek_at(2) == Some(b'"') => {
                    self.advance_by(3);
                    return Ok(TokenKind::BlockStringLiteral);
                }
                Some(b'\\')
                    if self.peek_at(1) == Some(b'"')
                        && self.peek_at(2) == Some(b'"')
                        && self.peek_at(3) == Some(b'"') =>
                {
                    self.advance_by(4);
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    #[inline]
    fn slice_from(&self, start: u32) -> &'a str {
        &self.source[start as usize..self.pos as usize]
    }

    /// Gets the text at the given span.
    pub fn span_text(&self, span: Span) -> &'a str {
        &self.source[span.start as usize..span.end as usize]
    }
}

/// Decodes the raw text of a `"..."` token (quotes included).
///
/// Escapes were validated while lexing.
pub fn string_value(raw: &str) -> String {
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Computes the value of a `"""..."""` token (quotes included): common
/// indentation and leading/trailing blank lines are removed.
pub fn block_string_value(raw: &str) -> String {
    let inner = raw[3..raw.len() - 3].replace("\\\"\"\"", "\"\"\"");
    let normalized = inner.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized.split('\n').collect();

    let is_blank = |line: &str| line.chars().all(|c| c == ' ' || c == '\t');
    let indent_of = |line: &str| line.len() - line.trim_start_matches([' ', '\t']).len();

    let common_indent = lines
        .iter()
        .skip(1)
        .filter(|line| !is_blank(line))
        .map(|line| indent_of(line))
        .min();

    let mut dedented: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| match common_indent {
            Some(indent) if i > 0 => line.get(indent..).unwrap_or(""),
            _ => line,
        })
        .collect();

    while dedented.first().is_some_and(|line| is_blank(line)) {
        dedented.remove(0);
    }
    while dedented.last().is_some_and(|line| is_blank(line)) {
        dedented.pop();
    }

    dedented.join("\n")
}

/// Tokenizes the entire source.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token()?;
        let is_eof = token.is_eof();
        tokens.push(token);
        if is_eof {
            break;
        }
    }

    Ok(tokens)
}
