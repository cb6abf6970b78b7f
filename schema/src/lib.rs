//! # tsugite-schema
//!
//! ASN.1 schema text parser for the tsugite toolkit.
//!
//! Turns schema source into parsed module trees:
//!
//! ```text
//! Source → Lexer → Tokens → Parser → Schema (Vec<Module>)
//! ```
//!
//! The accepted grammar covers module blocks
//! (`Name DEFINITIONS ::= BEGIN … END`) containing type assignments
//! over INTEGER, BOOLEAN, OCTET STRING, NULL, ENUMERATED, SEQUENCE,
//! SEQUENCE OF, CHOICE and named references, with `--` comments,
//! context tags, OPTIONAL/DEFAULT member markers and recorded (never
//! enforced) constraints. Errors carry the line and column of the
//! offending token.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::Module;
pub use error::ParseError;

use parser::Parser;

/// Parsed schema text: every module found in one source input.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    modules: Vec<Module>,
}

impl Schema {
    /// Parse schema source text.
    pub fn parse(source: &str) -> Result<Schema, ParseError> {
        Ok(Schema {
            modules: Parser::new(source)?.parse()?,
        })
    }

    /// Build a schema from already-constructed module trees.
    pub fn new(modules: Vec<Module>) -> Schema {
        Schema { modules }
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }
}
