//! INTEGER content octets.
//!
//! BER integers are minimal two's complement, big-endian: a positive
//! value gets a leading `0x00` only when its top bit would otherwise
//! read as a sign, a negative value a leading `0xFF` only when needed,
//! and zero is the single octet `0x00`. `BigInt`'s signed byte
//! conversions produce exactly this form.

use num_bigint::BigInt;

use crate::error::DecodeError;

/// Minimal two's-complement content octets for an integer value.
pub fn encode_integer(value: &BigInt) -> Vec<u8> {
    value.to_signed_bytes_be()
}

/// Decode two's-complement content octets. `offset` locates the content
/// in the surrounding input and is only used for error reporting.
pub fn decode_integer(content: &[u8], codec: &str, offset: usize) -> Result<BigInt, DecodeError> {
    if content.is_empty() {
        return Err(DecodeError::EmptyInteger {
            codec: codec.to_string(),
            offset,
        });
    }
    Ok(BigInt::from_signed_bytes_be(content))
}
