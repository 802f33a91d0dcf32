//! Core utilities for Grove.
//!
//! This crate provides foundational types used throughout grove:
//! - `span`: Source spans and line/column mapping
//! - `diagnostics`: Error reporting

pub mod diagnostics;
pub mod span;

pub use diagnostics::{Diagnostic, DiagnosticBag};
pub use span::{LineIndex, Location, Span};
