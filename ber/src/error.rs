//! Error types for BER encoding and decoding.

use thiserror::Error;

use crate::tag::Tag;

/// Errors raised when a value does not conform to the type being encoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("length too large for BER encoding")]
    LengthTooLarge,
    #[error("{codec}: expected {expected}, got {found}")]
    UnexpectedValue {
        codec: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("missing required member {member} in SEQUENCE {sequence}")]
    MissingMember { sequence: String, member: String },
    #[error("{codec}: unknown ENUMERATED value {value}")]
    UnknownEnumValue { codec: String, value: String },
    #[error("{codec}: unknown CHOICE alternative {alternative}")]
    UnknownAlternative { codec: String, alternative: String },
    #[error("{codec}: CHOICE takes exactly one alternative, got {count}")]
    NotSingleAlternative { codec: String, count: usize },
    #[error("hex string has odd length")]
    OddHexLength,
    #[error("{codec}: byte value {value} out of range 0..=255")]
    ByteOutOfRange { codec: String, value: String },
}

/// Errors raised when input bytes do not conform to the type being
/// decoded. Every variant carries the byte offset of the failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of data at offset {offset}")]
    UnexpectedEnd { offset: usize },
    #[error("indefinite length not supported at offset {offset}")]
    IndefiniteLength { offset: usize },
    #[error("length field too large at offset {offset}")]
    LengthTooLarge { offset: usize },
    #[error("tag number too large at offset {offset}")]
    TagTooLarge { offset: usize },
    #[error("{codec}: expected tag {expected}, found {found} at offset {offset}")]
    TagMismatch {
        codec: String,
        expected: Tag,
        found: Tag,
        offset: usize,
    },
    #[error("{codec}: empty INTEGER content at offset {offset}")]
    EmptyInteger { codec: String, offset: usize },
    #[error("{codec}: BOOLEAN content must be one octet, got {length} at offset {offset}")]
    InvalidBooleanLength {
        codec: String,
        length: usize,
        offset: usize,
    },
    #[error("{codec}: NULL content must be empty, got {length} octets at offset {offset}")]
    NonEmptyNull {
        codec: String,
        length: usize,
        offset: usize,
    },
    #[error("{codec}: unknown ENUMERATED value {value} at offset {offset}")]
    UnknownEnumValue {
        codec: String,
        value: String,
        offset: usize,
    },
    #[error("{codec}: no choice found for tag {found} at offset {offset}")]
    UnknownChoiceTag {
        codec: String,
        found: Tag,
        offset: usize,
    },
    #[error("missing required member {member} in SEQUENCE {sequence} at offset {offset}")]
    MissingMember {
        sequence: String,
        member: String,
        offset: usize,
    },
}
