//! # tsugite
//!
//! ASN.1 schema compiler and BER codec library.
//!
//! Schema text compiles into a [`Specification`] holding one codec per
//! named type; the codecs then encode and decode values byte-exactly
//! under the Basic Encoding Rules (definite length form only).
//!
//! ## Pipeline
//!
//! ```text
//! Source → Schema → Specification → encode/decode
//!          ^^^^^^   ^^^^^^^^^^^^^
//!          schema   compiler
//! ```
//!
//! Parsing and compilation run once at load time; the codec registry
//! is immutable afterwards and every encode/decode call holds only
//! per-call state.
//!
//! ## Example
//!
//! ```ignore
//! use tsugite::{Specification, Value};
//!
//! let spec = Specification::compile(
//!     "Messages DEFINITIONS ::= BEGIN
//!         PingRequest ::= SEQUENCE { messageId INTEGER }
//!      END",
//! )?;
//!
//! let value = Value::map([("messageId", Value::from(123))]);
//! let bytes = spec.encode("PingRequest", &value)?;
//! assert_eq!(value, spec.decode("PingRequest", &bytes)?);
//! ```

#![forbid(unsafe_code)]

mod compiler;
pub mod decoder;
pub mod error;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub use ber::{bytes_to_hex, hex_to_bytes, Class, Codec, Tag, Value};
pub use decoder::{DecodableFrom, Decoder};
pub use error::{CompileError, DecodeError, EncodeError, Error, ParseError};
pub use schema::Schema;

impl DecodableFrom<&str> for Schema {}

impl Decoder<&str, Schema> for str {
    type Error = ParseError;

    fn decode(&self) -> Result<Schema, ParseError> {
        Schema::parse(self)
    }
}

impl DecodableFrom<Schema> for Specification {}

impl Decoder<Schema, Specification> for Schema {
    type Error = CompileError;

    fn decode(&self) -> Result<Specification, CompileError> {
        compiler::compile(self)
    }
}

/// A compiled schema: per-module codec registries plus a flat table of
/// every unambiguous type name.
#[derive(Debug, Clone)]
pub struct Specification {
    modules: BTreeMap<String, Module>,
    global: HashMap<String, Arc<Codec>>,
}

/// One compiled module and its codecs.
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    types: BTreeMap<String, Arc<Codec>>,
}

impl Specification {
    /// Parse and compile schema text in one step.
    pub fn compile(source: &str) -> Result<Specification, Error> {
        let schema: Schema = source.decode()?;
        Ok(schema.decode()?)
    }

    /// Encode a value as the named type.
    pub fn encode(&self, type_name: &str, value: &Value) -> Result<Vec<u8>, Error> {
        Ok(self.codec(type_name)?.encode(value)?)
    }

    /// Decode bytes as the named type. Bytes past the decoded frame
    /// are ignored.
    pub fn decode(&self, type_name: &str, data: &[u8]) -> Result<Value, Error> {
        let (value, _) = self.codec(type_name)?.decode(data, 0)?;
        Ok(value)
    }

    /// Look up a codec in the global table. A name defined in more
    /// than one module is absent here and only reachable through its
    /// [`Module`].
    pub fn codec(&self, type_name: &str) -> Result<&Arc<Codec>, CompileError> {
        self.global
            .get(type_name)
            .ok_or_else(|| CompileError::UnknownType {
                name: type_name.to_string(),
            })
    }

    /// Every type name reachable through the global table, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.global.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn module_names(&self) -> Vec<&str> {
        self.modules.keys().map(String::as_str).collect()
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }
}

impl Module {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_names(&self) -> Vec<&str> {
        self.types.keys().map(String::as_str).collect()
    }

    pub fn codec(&self, type_name: &str) -> Result<&Arc<Codec>, CompileError> {
        self.types
            .get(type_name)
            .ok_or_else(|| CompileError::UnknownType {
                name: type_name.to_string(),
            })
    }

    /// Encode a value as one of this module's types.
    pub fn encode(&self, type_name: &str, value: &Value) -> Result<Vec<u8>, Error> {
        Ok(self.codec(type_name)?.encode(value)?)
    }

    /// Decode bytes as one of this module's types.
    pub fn decode(&self, type_name: &str, data: &[u8]) -> Result<Value, Error> {
        let (value, _) = self.codec(type_name)?.decode(data, 0)?;
        Ok(value)
    }
}
