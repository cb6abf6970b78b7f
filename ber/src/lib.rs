//! # tsugite-ber
//!
//! BER (Basic Encoding Rules, ITU-T X.690) codec engine for the
//! tsugite toolkit.
//!
//! Every encoded value is a TLV (tag, length, value) frame using the
//! definite length form only:
//!
//! ```text
//! [Tag] [Length] [Value]
//! ```
//!
//! The crate splits into the framing primitives (`tag`, `length`,
//! `integer`), the [`Value`] model carried across the API, and the
//! compiled per-type [`Codec`] sum, which the `tsugite` compiler
//! builds out of parsed schema types. Codecs are immutable after
//! construction and safe to share across threads.
//!
//! Decode errors carry the absolute byte offset of the failure;
//! encode errors name the codec and the offending value shape.

pub mod codec;
pub mod error;
pub mod hex;
pub mod integer;
pub mod length;
pub mod tag;
pub mod value;

pub use codec::{Alternative, Codec, Constraint, Member};
pub use error::{DecodeError, EncodeError};
pub use hex::{bytes_to_hex, hex_to_bytes};
pub use tag::{Class, Tag};
pub use value::Value;
