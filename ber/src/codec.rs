//! Compiled per-type codecs.
//!
//! A `Codec` is the executable form of one schema type: a closed sum
//! with one variant per ASN.1 type, each parameterized at construction
//! by its name and members or alternatives. Codecs are immutable,
//! hold no per-call state, and children are shared `Arc` handles, so a
//! compiled registry can be used freely across threads.

use std::sync::Arc;

use num_bigint::BigInt;

use crate::error::{DecodeError, EncodeError};
use crate::hex::hex_to_bytes;
use crate::integer::{decode_integer, encode_integer};
use crate::length::{decode_length, encode_length};
use crate::tag::Tag;
use crate::value::Value;

/// A constraint carried over from the schema. Advisory only: recorded
/// for introspection, never enforced by encode or decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    Size(u64),
    Range(i64, i64),
    Value(i64),
}

/// A compiled SEQUENCE member.
///
/// A context tag, when present, is recorded but not applied by the
/// SEQUENCE codec.
#[derive(Debug, Clone)]
pub struct Member {
    pub name: String,
    pub codec: Arc<Codec>,
    pub tag: Option<u32>,
    pub optional: bool,
    pub default: Option<Value>,
}

/// A compiled CHOICE alternative.
#[derive(Debug, Clone)]
pub struct Alternative {
    pub name: String,
    pub codec: Arc<Codec>,
    pub tag: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct IntegerCodec {
    pub name: String,
    pub constraint: Option<Constraint>,
}

#[derive(Debug, Clone)]
pub struct BooleanCodec {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct OctetStringCodec {
    pub name: String,
    pub constraint: Option<Constraint>,
}

#[derive(Debug, Clone)]
pub struct NullCodec {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct EnumeratedCodec {
    pub name: String,
    pub values: Vec<(String, i64)>,
}

#[derive(Debug, Clone)]
pub struct SequenceCodec {
    pub name: String,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone)]
pub struct SequenceOfCodec {
    pub name: String,
    pub element: Arc<Codec>,
    pub constraint: Option<Constraint>,
}

#[derive(Debug, Clone)]
pub struct ChoiceCodec {
    pub name: String,
    pub alternatives: Vec<Alternative>,
}

/// The compiled form of one schema type.
#[derive(Debug, Clone)]
pub enum Codec {
    Integer(IntegerCodec),
    Boolean(BooleanCodec),
    OctetString(OctetStringCodec),
    Null(NullCodec),
    Enumerated(EnumeratedCodec),
    Sequence(SequenceCodec),
    SequenceOf(SequenceOfCodec),
    Choice(ChoiceCodec),
}

impl Codec {
    pub fn name(&self) -> &str {
        match self {
            Codec::Integer(c) => &c.name,
            Codec::Boolean(c) => &c.name,
            Codec::OctetString(c) => &c.name,
            Codec::Null(c) => &c.name,
            Codec::Enumerated(c) => &c.name,
            Codec::Sequence(c) => &c.name,
            Codec::SequenceOf(c) => &c.name,
            Codec::Choice(c) => &c.name,
        }
    }

    /// The tag this codec frames its content with. CHOICE has no tag of
    /// its own; it borrows the chosen alternative's.
    pub fn tag(&self) -> Option<Tag> {
        match self {
            Codec::Integer(_) => Some(Tag::INTEGER),
            Codec::Boolean(_) => Some(Tag::BOOLEAN),
            Codec::OctetString(_) => Some(Tag::OCTET_STRING),
            Codec::Null(_) => Some(Tag::NULL),
            Codec::Enumerated(_) => Some(Tag::ENUMERATED),
            Codec::Sequence(_) | Codec::SequenceOf(_) => Some(Tag::SEQUENCE),
            Codec::Choice(_) => None,
        }
    }

    /// Encode a value to a complete tag/length/value frame.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        match self {
            Codec::Integer(c) => frame(Tag::INTEGER, c.content(value)?),
            Codec::Boolean(c) => frame(Tag::BOOLEAN, c.content(value)?),
            Codec::OctetString(c) => frame(Tag::OCTET_STRING, c.content(value)?),
            Codec::Null(c) => frame(Tag::NULL, c.content(value)?),
            Codec::Enumerated(c) => frame(Tag::ENUMERATED, c.content(value)?),
            Codec::Sequence(c) => frame(Tag::SEQUENCE, c.content(value)?),
            Codec::SequenceOf(c) => frame(Tag::SEQUENCE, c.content(value)?),
            Codec::Choice(c) => c.encode(value),
        }
    }

    /// Decode one frame at `offset`. Returns the value and the number
    /// of bytes consumed. Bytes past the frame are left untouched.
    pub fn decode(&self, data: &[u8], offset: usize) -> Result<(Value, usize), DecodeError> {
        match self {
            Codec::Integer(c) => {
                let f = read_frame(data, offset, Tag::INTEGER, &c.name)?;
                let n = decode_integer(&data[f.start..f.end], &c.name, f.start)?;
                Ok((Value::Integer(n), f.consumed))
            }
            Codec::Boolean(c) => {
                let f = read_frame(data, offset, Tag::BOOLEAN, &c.name)?;
                Ok((c.value(&data[f.start..f.end], f.start)?, f.consumed))
            }
            Codec::OctetString(c) => {
                let f = read_frame(data, offset, Tag::OCTET_STRING, &c.name)?;
                Ok((Value::Bytes(data[f.start..f.end].to_vec()), f.consumed))
            }
            Codec::Null(c) => {
                let f = read_frame(data, offset, Tag::NULL, &c.name)?;
                Ok((c.value(&data[f.start..f.end], f.start)?, f.consumed))
            }
            Codec::Enumerated(c) => {
                let f = read_frame(data, offset, Tag::ENUMERATED, &c.name)?;
                Ok((c.value(&data[f.start..f.end], f.start)?, f.consumed))
            }
            Codec::Sequence(c) => {
                let f = read_frame(data, offset, Tag::SEQUENCE, &c.name)?;
                Ok((c.value(&data[..f.end], f.start)?, f.consumed))
            }
            Codec::SequenceOf(c) => {
                let f = read_frame(data, offset, Tag::SEQUENCE, &c.name)?;
                Ok((c.value(&data[..f.end], f.start)?, f.consumed))
            }
            Codec::Choice(c) => c.decode(data, offset),
        }
    }
}

/// Wrap content octets with a tag and a definite length.
fn frame(tag: Tag, content: Vec<u8>) -> Result<Vec<u8>, EncodeError> {
    let mut out = tag.encode();
    out.extend(encode_length(content.len())?);
    out.extend(content);
    Ok(out)
}

/// A located content window inside the input.
struct Frame {
    /// Absolute offset of the first content byte.
    start: usize,
    /// Absolute offset one past the last content byte.
    end: usize,
    /// Total frame size including tag and length octets.
    consumed: usize,
}

/// Read and verify the tag, read the length, and locate the content.
fn read_frame(
    data: &[u8],
    offset: usize,
    expected: Tag,
    codec: &str,
) -> Result<Frame, DecodeError> {
    let (tag, tag_len) = Tag::decode(data, offset)?;
    if tag != expected {
        return Err(DecodeError::TagMismatch {
            codec: codec.to_string(),
            expected,
            found: tag,
            offset,
        });
    }
    let (length, len_len) = decode_length(data, offset + tag_len)?;
    let start = offset + tag_len + len_len;
    let end = start
        .checked_add(length)
        .filter(|&end| end <= data.len())
        .ok_or(DecodeError::UnexpectedEnd { offset: data.len() })?;
    Ok(Frame {
        start,
        end,
        consumed: tag_len + len_len + length,
    })
}

impl IntegerCodec {
    fn content(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        match value {
            Value::Integer(n) => Ok(encode_integer(n)),
            other => Err(self.unexpected(other)),
        }
    }

    fn unexpected(&self, value: &Value) -> EncodeError {
        EncodeError::UnexpectedValue {
            codec: self.name.clone(),
            expected: "an integer",
            found: value.kind(),
        }
    }
}

impl BooleanCodec {
    fn content(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        match value {
            Value::Boolean(true) => Ok(vec![0xff]),
            Value::Boolean(false) => Ok(vec![0x00]),
            other => Err(EncodeError::UnexpectedValue {
                codec: self.name.clone(),
                expected: "a boolean",
                found: other.kind(),
            }),
        }
    }

    fn value(&self, content: &[u8], offset: usize) -> Result<Value, DecodeError> {
        if content.len() != 1 {
            return Err(DecodeError::InvalidBooleanLength {
                codec: self.name.clone(),
                length: content.len(),
                offset,
            });
        }
        // Any non-zero octet reads as true.
        Ok(Value::Boolean(content[0] != 0))
    }
}

impl OctetStringCodec {
    fn content(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        match value {
            Value::Bytes(bytes) => Ok(bytes.clone()),
            Value::Text(text) => hex_to_bytes(text),
            Value::List(items) => items.iter().map(|item| self.byte(item)).collect(),
            other => Err(EncodeError::UnexpectedValue {
                codec: self.name.clone(),
                expected: "bytes, hex text or a list of byte values",
                found: other.kind(),
            }),
        }
    }

    fn byte(&self, item: &Value) -> Result<u8, EncodeError> {
        match item {
            Value::Integer(n) => u8::try_from(n).map_err(|_| EncodeError::ByteOutOfRange {
                codec: self.name.clone(),
                value: n.to_string(),
            }),
            other => Err(EncodeError::UnexpectedValue {
                codec: self.name.clone(),
                expected: "a byte value",
                found: other.kind(),
            }),
        }
    }
}

impl NullCodec {
    fn content(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        match value {
            Value::Null => Ok(Vec::new()),
            // "absent" is an accepted spelling of the null sentinel.
            Value::Text(text) if text == "absent" => Ok(Vec::new()),
            other => Err(EncodeError::UnexpectedValue {
                codec: self.name.clone(),
                expected: "null or \"absent\"",
                found: other.kind(),
            }),
        }
    }

    fn value(&self, content: &[u8], offset: usize) -> Result<Value, DecodeError> {
        if !content.is_empty() {
            return Err(DecodeError::NonEmptyNull {
                codec: self.name.clone(),
                length: content.len(),
                offset,
            });
        }
        Ok(Value::Null)
    }
}

impl EnumeratedCodec {
    fn content(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        let number = match value {
            Value::Text(name) => self
                .values
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, number)| *number)
                .ok_or_else(|| EncodeError::UnknownEnumValue {
                    codec: self.name.clone(),
                    value: name.clone(),
                })?,
            Value::Integer(n) => {
                let number = i64::try_from(n).map_err(|_| EncodeError::UnknownEnumValue {
                    codec: self.name.clone(),
                    value: n.to_string(),
                })?;
                if !self.values.iter().any(|(_, v)| *v == number) {
                    return Err(EncodeError::UnknownEnumValue {
                        codec: self.name.clone(),
                        value: number.to_string(),
                    });
                }
                number
            }
            other => {
                return Err(EncodeError::UnexpectedValue {
                    codec: self.name.clone(),
                    expected: "an enumeration name or number",
                    found: other.kind(),
                })
            }
        };
        Ok(encode_integer(&BigInt::from(number)))
    }

    fn value(&self, content: &[u8], offset: usize) -> Result<Value, DecodeError> {
        let n = decode_integer(content, &self.name, offset)?;
        let unknown = || DecodeError::UnknownEnumValue {
            codec: self.name.clone(),
            value: n.to_string(),
            offset,
        };
        let number = i64::try_from(&n).map_err(|_| unknown())?;
        self.values
            .iter()
            .find(|(_, v)| *v == number)
            .map(|(name, _)| Value::Text(name.clone()))
            .ok_or_else(unknown)
    }
}

impl SequenceCodec {
    fn content(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        let Value::Map(entries) = value else {
            return Err(EncodeError::UnexpectedValue {
                codec: self.name.clone(),
                expected: "a map of member values",
                found: value.kind(),
            });
        };
        let mut out = Vec::new();
        for member in &self.members {
            if let Some(v) = entries.get(&member.name) {
                out.extend(member.codec.encode(v)?);
            } else if member.optional {
                continue;
            } else if let Some(default) = &member.default {
                out.extend(member.codec.encode(default)?);
            } else {
                return Err(EncodeError::MissingMember {
                    sequence: self.name.clone(),
                    member: member.name.clone(),
                });
            }
        }
        Ok(out)
    }

    /// Decode members in declared order from the window starting at
    /// `pos`. `data` is already truncated to the window end.
    fn value(&self, data: &[u8], mut pos: usize) -> Result<Value, DecodeError> {
        let mut entries = std::collections::BTreeMap::new();
        for member in &self.members {
            if pos >= data.len() {
                // Content exhausted: the rest must be optional or
                // defaulted.
                if member.optional {
                    continue;
                }
                if let Some(default) = &member.default {
                    entries.insert(member.name.clone(), default.clone());
                    continue;
                }
                return Err(DecodeError::MissingMember {
                    sequence: self.name.clone(),
                    member: member.name.clone(),
                    offset: pos,
                });
            }
            match member.codec.decode(data, pos) {
                Ok((v, used)) => {
                    entries.insert(member.name.clone(), v);
                    pos += used;
                }
                // A failed attempt consumes nothing; an optional or
                // defaulted member steps aside and the next member
                // retries at the same offset.
                Err(_) if member.optional => continue,
                Err(_) if member.default.is_some() => {
                    if let Some(default) = &member.default {
                        entries.insert(member.name.clone(), default.clone());
                    }
                    continue;
                }
                Err(err) => return Err(err),
            }
        }
        // Anything left in the window belongs to the enclosing frame.
        Ok(Value::Map(entries))
    }
}

impl SequenceOfCodec {
    fn content(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        let Value::List(items) = value else {
            return Err(EncodeError::UnexpectedValue {
                codec: self.name.clone(),
                expected: "a list of element values",
                found: value.kind(),
            });
        };
        let mut out = Vec::new();
        for item in items {
            out.extend(self.element.encode(item)?);
        }
        Ok(out)
    }

    fn value(&self, data: &[u8], mut pos: usize) -> Result<Value, DecodeError> {
        let mut items = Vec::new();
        while pos < data.len() {
            let (item, used) = self.element.decode(data, pos)?;
            items.push(item);
            pos += used;
        }
        Ok(Value::List(items))
    }
}

impl ChoiceCodec {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        let Value::Map(entries) = value else {
            return Err(EncodeError::UnexpectedValue {
                codec: self.name.clone(),
                expected: "a single-entry map",
                found: value.kind(),
            });
        };
        let mut iter = entries.iter();
        let (chosen, inner) = match (iter.next(), iter.next()) {
            (Some(entry), None) => entry,
            _ => {
                return Err(EncodeError::NotSingleAlternative {
                    codec: self.name.clone(),
                    count: entries.len(),
                })
            }
        };
        let alternative = self
            .alternatives
            .iter()
            .find(|a| &a.name == chosen)
            .ok_or_else(|| EncodeError::UnknownAlternative {
                codec: self.name.clone(),
                alternative: chosen.clone(),
            })?;
        let encoded = alternative.codec.encode(inner)?;
        match alternative.tag {
            // A tagged alternative gets an outer constructed context
            // wrapper around its complete encoding.
            Some(number) => frame(Tag::context(true, number), encoded),
            None => Ok(encoded),
        }
    }

    fn decode(&self, data: &[u8], offset: usize) -> Result<(Value, usize), DecodeError> {
        let (found, _) = Tag::decode(data, offset)?;
        for alternative in &self.alternatives {
            match alternative.tag {
                Some(number) => {
                    let wrapper = Tag::context(true, number);
                    if found == wrapper {
                        let f = read_frame(data, offset, wrapper, &self.name)?;
                        let (inner, _) = alternative.codec.decode(&data[..f.end], f.start)?;
                        return Ok((Value::choice(&alternative.name, inner), f.consumed));
                    }
                }
                None => {
                    if alternative.codec.tag() == Some(found) {
                        let (inner, used) = alternative.codec.decode(data, offset)?;
                        return Ok((Value::choice(&alternative.name, inner), used));
                    }
                }
            }
        }
        Err(DecodeError::UnknownChoiceTag {
            codec: self.name.clone(),
            found,
            offset,
        })
    }
}
