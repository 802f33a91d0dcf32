//! Syntax layer for Grove.
//!
//! This crate provides:
//! - `token`: Token kinds and token structures
//! - `lexer`: Tokenization and string literal decoding
//! - `ast`: Owned abstract syntax tree for request documents
//! - `parser`: Recursive descent parser
//! - `error`: The syntax error type

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::*;
pub use error::SyntaxError;
pub use lexer::Lexer;
pub use parser::{parse, Parser};
pub use token::{Token, TokenKind};
