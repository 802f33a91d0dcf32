//! Recursive descent parser for request documents.
//!
//! Parsing stops at the first error; there is no recovery.

use crate::ast::*;
use crate::error::SyntaxError;
use crate::lexer::{block_string_value, string_value, Lexer};
use crate::token::{Token, TokenKind};
use grove_core::{diagnostics::codes, Span};
use std::sync::Arc;

type PResult<T> = Result<T, SyntaxError>;

/// Deepest nesting of selection sets, list/object values and list types.
pub const MAX_NESTING: usize = 128;

/// Parser for request documents.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    prev_end: u32,
    depth: usize,
}

/// Parses a request string into a document.
pub fn parse(source: &str) -> Result<Document, SyntaxError> {
    Parser::new(source)?.parse_document()
}

impl<'a> Parser<'a> {
    /// Creates a new parser, reading the first token.
    pub fn new(source: &'a str) -> PResult<Self> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            prev_end: 0,
            depth: 0,
        })
    }

    /// Returns the current token kind.
    #[inline]
    fn at(&self) -> TokenKind {
        self.current.kind
    }

    /// Returns true if at the given kind.
    #[inline]
    fn at_kind(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Advances to the next token.
    fn advance(&mut self) -> PResult<()> {
        self.prev_end = self.current.span.end;
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    /// Advances past `kind` if it is the current token.
    fn eat(&mut self, kind: TokenKind) -> PResult<bool> {
        if self.at_kind(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Expects a specific token kind.
    fn expect(&mut self, kind: TokenKind) -> PResult<()> {
        if self.at_kind(kind) {
            self.advance()
        } else {
            Err(self.error_expected(&kind.to_string()))
        }
    }

    /// Gets the text of the current token.
    fn current_text(&self) -> &'a str {
        self.lexer.span_text(self.current.span)
    }

    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.prev_end)
    }

    /// Describes the current token the way error messages quote it.
    fn describe_current(&self) -> String {
        let kind = self.at();
        if kind == TokenKind::Eof || kind.is_punctuator() {
            kind.to_string()
        } else if kind.is_name_like() {
            format!("Name \"{}\"", self.current_text())
        } else {
            format!("{} {}", kind.as_str(), self.current_text())
        }
    }

    fn code_for_current(&self) -> &'static str {
        if self.at_kind(TokenKind::Eof) {
            codes::UNEXPECTED_EOF
        } else {
            codes::UNEXPECTED_TOKEN
        }
    }

    fn error_expected(&self, expected: &str) -> SyntaxError {
        SyntaxError::with_code(
            self.code_for_current(),
            self.lexer.source(),
            self.current.span,
            format!("Expected {expected}, found {}.", self.describe_current()),
        )
    }

    /// Runs a recursive production, failing once nesting gets too deep.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(SyntaxError::with_code(
                codes::NESTING_TOO_DEEP,
                self.lexer.source(),
                self.current.span,
                format!("Document exceeds the maximum nesting depth of {MAX_NESTING}."),
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn error_unexpected(&self) -> SyntaxError {
        SyntaxError::with_code(
            self.code_for_current(),
            self.lexer.source(),
            self.current.span,
            format!("Unexpected {}.", self.describe_current()),
        )
    }

    /// Parses a document.
    pub fn parse_document(&mut self) -> PResult<Document> {
        let start = self.current.span.start;
        let mut definitions = Vec::new();

        // A document holds at least one definition.
        loop {
            definitions.push(self.parse_definition()?);
            if self.at_kind(TokenKind::Eof) {
                break;
            }
        }

        Ok(Document {
            definitions,
            span: self.span_from(start),
        })
    }

    /// Parses a definition.
    fn parse_definition(&mut self) -> PResult<Definition> {
        match self.at() {
            TokenKind::LBrace
            | TokenKind::Query
            | TokenKind::Mutation
            | TokenKind::Subscription => Ok(Definition::Operation(self.parse_operation()?)),
            TokenKind::Fragment => Ok(Definition::Fragment(self.parse_fragment_definition()?)),
            _ => Err(self.error_unexpected()),
        }
    }

    /// Parses a name (keywords included).
    fn parse_name(&mut self) -> PResult<Name> {
        if !self.at().is_name_like() {
            return Err(self.error_expected("Name"));
        }
        let name = Name::new(self.current_text(), self.current.span);
        self.advance()?;
        Ok(name)
    }

    /// Parses an operation definition.
    fn parse_operation(&mut self) -> PResult<OperationDefinition> {
        let start = self.current.span.start;

        if self.at_kind(TokenKind::LBrace) {
            let selection_set = self.parse_selection_set()?;
            return Ok(OperationDefinition {
                operation: OperationType::Query,
                name: None,
                variables: Vec::new(),
                directives: Vec::new(),
                selection_set,
                span: self.span_from(start),
            });
        }

        let operation = match self.at() {
            TokenKind::Mutation => OperationType::Mutation,
            TokenKind::Subscription => OperationType::Subscription,
            _ => OperationType::Query,
        };
        self.advance()?;

        let name = if self.at().is_name_like() {
            Some(self.parse_name()?)
        } else {
            None
        };

        let variables = self.parse_variable_definitions()?;
        let directives = self.parse_directives(false)?;
        let selection_set = self.parse_selection_set()?;

        Ok(OperationDefinition {
            operation,
            name,
            variables,
            directives,
            selection_set,
            span: self.span_from(start),
        })
    }

    /// Parses `( $var: Type = default @dir ... )`, if present.
    fn parse_variable_definitions(&mut self) -> PResult<Vec<VariableDefinition>> {
        let mut vars = Vec::new();
        if !self.eat(TokenKind::LParen)? {
            return Ok(vars);
        }
        loop {
            vars.push(self.parse_variable_definition()?);
            if self.eat(TokenKind::RParen)? {
                return Ok(vars);
            }
        }
    }

    /// Parses a variable definition.
    fn parse_variable_definition(&mut self) -> PResult<VariableDefinition> {
        let start = self.current.span.start;
        self.expect(TokenKind::Dollar)?;
        let name = self.parse_name()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;

        let default_value = if self.eat(TokenKind::Eq)? {
            Some(self.parse_value(true)?)
        } else {
            None
        };

        let directives = self.parse_directives(true)?;

        Ok(VariableDefinition {
            name,
            ty,
            default_value,
            directives,
            span: self.span_from(start),
        })
    }

    /// Parses a type reference.
    fn parse_type(&mut self) -> PResult<Type> {
        self.nested(Self::parse_type_inner)
    }

    fn parse_type_inner(&mut self) -> PResult<Type> {
        let start = self.current.span.start;

        let ty = if self.eat(TokenKind::LBracket)? {
            let inner = self.parse_type()?;
            self.expect(TokenKind::RBracket)?;
            Type::List(Box::new(inner), self.span_from(start))
        } else {
            Type::Named(self.parse_name()?)
        };

        if self.eat(TokenKind::Bang)? {
            Ok(Type::NonNull(Box::new(ty), self.span_from(start)))
        } else {
            Ok(ty)
        }
    }

    /// Parses a fragment definition.
    fn parse_fragment_definition(&mut self) -> PResult<FragmentDefinition> {
        let start = self.current.span.start;
        self.expect(TokenKind::Fragment)?;

        if self.at_kind(TokenKind::On) {
            return Err(self.error_unexpected());
        }
        let name = self.parse_name()?;
        if !self.at_kind(TokenKind::On) {
            return Err(self.error_expected("\"on\""));
        }
        self.advance()?;
        let type_condition = self.parse_name()?;
        let directives = self.parse_directives(false)?;
        let selection_set = self.parse_selection_set()?;

        Ok(FragmentDefinition {
            name,
            type_condition,
            directives,
            selection_set,
            span: self.span_from(start),
        })
    }

    /// Parses a non-empty selection set.
    fn parse_selection_set(&mut self) -> PResult<SelectionSet> {
        self.nested(Self::parse_selection_set_inner)
    }

    fn parse_selection_set_inner(&mut self) -> PResult<SelectionSet> {
        let start = self.current.span.start;
        self.expect(TokenKind::LBrace)?;

        let mut selections = Vec::new();
        loop {
            selections.push(self.parse_selection()?);
            if self.eat(TokenKind::RBrace)? {
                break;
            }
        }

        Ok(SelectionSet {
            selections: Arc::from(selections),
            span: self.span_from(start),
        })
    }

    /// Parses a selection.
    fn parse_selection(&mut self) -> PResult<Selection> {
        if !self.at_kind(TokenKind::Spread) {
            return Ok(Selection::Field(self.parse_field()?));
        }

        let start = self.current.span.start;
        self.advance()?;

        if self.at_kind(TokenKind::On) {
            self.advance()?;
            let type_condition = Some(self.parse_name()?);
            let directives = self.parse_directives(false)?;
            let selection_set = self.parse_selection_set()?;
            Ok(Selection::InlineFragment(InlineFragment {
                type_condition,
                directives,
                selection_set,
                span: self.span_from(start),
            }))
        } else if self.at().is_name_like() {
            let name = self.parse_name()?;
            let directives = self.parse_directives(false)?;
            Ok(Selection::FragmentSpread(FragmentSpread {
                name,
                directives,
                span: self.span_from(start),
            }))
        } else {
            // Inline fragment without type condition
            let directives = self.parse_directives(false)?;
            let selection_set = self.parse_selection_set()?;
            Ok(Selection::InlineFragment(InlineFragment {
                type_condition: None,
                directives,
                selection_set,
                span: self.span_from(start),
            }))
        }
    }

    /// Parses a field selection.
    fn parse_field(&mut self) -> PResult<Field> {
        let start = self.current.span.start;

        let first_name = self.parse_name()?;
        let (alias, name) = if self.eat(TokenKind::Colon)? {
            (Some(first_name), self.parse_name()?)
        } else {
            (None, first_name)
        };

        let arguments = self.parse_arguments(false)?;
        let directives = self.parse_directives(false)?;

        let selection_set = if self.at_kind(TokenKind::LBrace) {
            Some(self.parse_selection_set()?)
        } else {
            None
        };

        Ok(Field {
            alias,
            name,
            arguments,
            directives,
            selection_set,
            span: self.span_from(start),
        })
    }

    /// Parses `( name: value ... )`, if present.
    fn parse_arguments(&mut self, is_const: bool) -> PResult<Vec<Argument>> {
        let mut args = Vec::new();
        if !self.eat(TokenKind::LParen)? {
            return Ok(args);
        }
        loop {
            let start = self.current.span.start;
            let name = self.parse_name()?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_value(is_const)?;
            args.push(Argument {
                name,
                value,
                span: self.span_from(start),
            });
            if self.eat(TokenKind::RParen)? {
                return Ok(args);
            }
        }
    }

    /// Parses zero or more directives.
    fn parse_directives(&mut self, is_const: bool) -> PResult<Vec<Directive>> {
        let mut directives = Vec::new();
        while self.at_kind(TokenKind::At) {
            let start = self.current.span.start;
            self.advance()?;
            let name = self.parse_name()?;
            let arguments = self.parse_arguments(is_const)?;
            directives.push(Directive {
                name,
                arguments,
                span: self.span_from(start),
            });
        }
        Ok(directives)
    }

    /// Parses a value. Variables are rejected in const positions.
    fn parse_value(&mut self, is_const: bool) -> PResult<Value> {
        self.nested(|parser| parser.parse_value_inner(is_const))
    }

    fn parse_value_inner(&mut self, is_const: bool) -> PResult<Value> {
        let start = self.current.span.start;

        match self.at() {
            TokenKind::Dollar if !is_const => {
                self.advance()?;
                let name = self.parse_name()?;
                Ok(Value::Variable(Name::new(name.value, self.span_from(start))))
            }
            TokenKind::IntLiteral => {
                let text = self.current_text();
                // Out-of-range integers keep their magnitude as a float.
                let value = match text.parse::<i64>() {
                    Ok(int) => Value::Int(int, self.current.span),
                    Err(_) => Value::Float(text.parse().unwrap_or(f64::INFINITY), self.current.span),
                };
                self.advance()?;
                Ok(value)
            }
            TokenKind::FloatLiteral => {
                let value = self.current_text().parse().unwrap_or(f64::NAN);
                self.advance()?;
                Ok(Value::Float(value, self.span_from(start)))
            }
            TokenKind::StringLiteral => {
                let value = string_value(self.current_text());
                self.advance()?;
                Ok(Value::String(value, self.span_from(start)))
            }
            TokenKind::BlockStringLiteral => {
                let value = block_string_value(self.current_text());
                self.advance()?;
                Ok(Value::String(value, self.span_from(start)))
            }
            TokenKind::True => {
                self.advance()?;
                Ok(Value::Boolean(true, self.span_from(start)))
            }
            TokenKind::False => {
                self.advance()?;
                Ok(Value::Boolean(false, self.span_from(start)))
            }
            TokenKind::Null => {
                self.advance()?;
                Ok(Value::Null(self.span_from(start)))
            }
            TokenKind::LBracket => {
                self.advance()?;
                let mut values = Vec::new();
                while !self.eat(TokenKind::RBracket)? {
                    values.push(self.parse_value(is_const)?);
                }
                Ok(Value::List(values, self.span_from(start)))
            }
            TokenKind::LBrace => {
                self.advance()?;
                let mut fields = Vec::new();
                while !self.eat(TokenKind::RBrace)? {
                    let name = self.parse_name()?;
                    self.expect(TokenKind::Colon)?;
                    let value = self.parse_value(is_const)?;
                    fields.push((name, value));
                }
                Ok(Value::Object(fields, self.span_from(start)))
            }
            kind if kind.is_name_like() => Ok(Value::Enum(self.parse_name()?)),
            _ => Err(self.error_unexpected()),
        }
    }
}
