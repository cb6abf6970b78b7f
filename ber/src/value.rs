//! The value model crossing the encode/decode API.
//!
//! Values are language-neutral shapes: integers are arbitrary
//! precision (`BigInt` covers the native range losslessly), octet
//! strings travel as raw bytes on decode but may be supplied as bytes,
//! hex text or a list of byte-range integers on encode, SEQUENCE
//! values are name-keyed maps, and a CHOICE value is a single-entry
//! map naming the chosen alternative.

use std::collections::BTreeMap;

use num_bigint::BigInt;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::hex::bytes_to_hex;

/// Native narrowing stops at ±(2^53 − 1); larger magnitudes stay
/// arbitrary precision.
const SAFE_INTEGER_MAX: i64 = 9_007_199_254_740_991;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(BigInt),
    Boolean(bool),
    Bytes(Vec<u8>),
    Null,
    Text(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Build a map value from name/value pairs.
    pub fn map<K, I>(entries: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a single-entry map selecting a CHOICE alternative.
    pub fn choice(alternative: &str, value: Value) -> Value {
        Value::map([(alternative, value)])
    }

    /// Narrow an integer value to `i64` when it fits the safe range
    /// ±(2^53 − 1).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => i64::try_from(n)
                .ok()
                .filter(|v| (-SAFE_INTEGER_MAX..=SAFE_INTEGER_MAX).contains(v)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Shape name used in error messages.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Value::Integer(_) => "an integer",
            Value::Boolean(_) => "a boolean",
            Value::Bytes(_) => "bytes",
            Value::Null => "null",
            Value::Text(_) => "text",
            Value::List(_) => "a list",
            Value::Map(_) => "a map",
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(BigInt::from(value))
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::Integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            // Integers render as numbers inside the safe range and as
            // decimal strings beyond it.
            Value::Integer(n) => match i64::try_from(n) {
                Ok(v) if (-SAFE_INTEGER_MAX..=SAFE_INTEGER_MAX).contains(&v) => {
                    serializer.serialize_i64(v)
                }
                _ => serializer.serialize_str(&n.to_string()),
            },
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Bytes(b) => serializer.serialize_str(&bytes_to_hex(b)),
            Value::Null => serializer.serialize_unit(),
            Value::Text(t) => serializer.serialize_str(t),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (name, value) in entries {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::BigInt;

    use super::Value;

    #[test]
    fn test_as_i64_narrowing() {
        assert_eq!(Some(123), Value::from(123).as_i64());
        assert_eq!(
            Some(9_007_199_254_740_991),
            Value::from(9_007_199_254_740_991).as_i64()
        );
        assert_eq!(
            Some(-9_007_199_254_740_991),
            Value::from(-9_007_199_254_740_991).as_i64()
        );

        // Inside i64 but past the safe range stays arbitrary precision.
        assert_eq!(None, Value::from(9_007_199_254_740_992).as_i64());
        assert_eq!(None, Value::from(-9_007_199_254_740_992).as_i64());
        assert_eq!(None, Value::from(i64::MIN).as_i64());

        let beyond = BigInt::from(i64::MAX) + 1;
        assert_eq!(None, Value::Integer(beyond).as_i64());
        assert_eq!(None, Value::Null.as_i64());
    }

    #[test]
    fn test_map_builder() {
        let value = Value::map([("b", Value::from(2)), ("a", Value::from(1))]);
        let entries = value.as_map().unwrap();
        assert_eq!(2, entries.len());
        assert_eq!(Some(1), entries["a"].as_i64());
    }

    #[test]
    fn test_serialize_json() {
        let value = Value::map([
            ("id", Value::from(42)),
            ("ok", Value::from(true)),
            ("payload", Value::from(vec![0xde, 0xad])),
            ("big", Value::Integer(BigInt::from(i64::MAX) + 1)),
            ("items", Value::List(vec![Value::from(1), Value::Null])),
            // Fits i64 but not the safe range, so it renders as text.
            ("wide", Value::from(9_007_199_254_740_992)),
        ]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(
            r#"{"big":"9223372036854775808","id":42,"items":[1,null],"ok":true,"payload":"dead","wide":"9007199254740992"}"#,
            json
        );
    }
}
