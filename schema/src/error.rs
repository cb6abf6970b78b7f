//! Error type for schema text parsing.

use thiserror::Error;

/// A lexical or grammatical error in ASN.1 schema text, located by
/// line and column (both 1-based).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("parse error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(line: u32, column: u32, message: impl Into<String>) -> Self {
        ParseError {
            line,
            column,
            message: message.into(),
        }
    }
}
