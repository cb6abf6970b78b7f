//! Error types for compilation and the unified library error.

use thiserror::Error;

pub use ber::error::{DecodeError, EncodeError};
pub use schema::error::ParseError;

/// Errors raised while turning parsed schema trees into codecs, or on
/// a failed type-name lookup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("duplicate definition of {name} in module {module}")]
    DuplicateDefinition { module: String, name: String },
    #[error("unresolved reference to {name} in module {module}")]
    UnresolvedReference { module: String, name: String },
    #[error("circular reference through {name} in module {module}")]
    CircularReference { module: String, name: String },
    #[error("ENUMERATED {name} has no values")]
    EmptyEnumeration { name: String },
    #[error("duplicate tag {tag} in CHOICE {name}")]
    DuplicateAlternativeTag { name: String, tag: String },
    #[error("unknown type {name}")]
    UnknownType { name: String },
}

/// Any failure the library surfaces. The four kinds stay
/// distinguishable for callers that need to react differently.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("parse: {0}")]
    Parse(#[from] ParseError),
    #[error("compile: {0}")]
    Compile(#[from] CompileError),
    #[error("encode: {0}")]
    Encode(#[from] EncodeError),
    #[error("decode: {0}")]
    Decode(#[from] DecodeError),
}
