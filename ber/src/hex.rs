//! Hexadecimal text conversions.

use crate::error::EncodeError;

/// Decode hexadecimal text into bytes. Characters that are not hex
/// digits (spaces, colons, newlines) are stripped first; an odd number
/// of remaining digits is an error.
pub fn hex_to_bytes(text: &str) -> Result<Vec<u8>, EncodeError> {
    let digits: Vec<u32> = text.chars().filter_map(|c| c.to_digit(16)).collect();
    if digits.len() % 2 != 0 {
        return Err(EncodeError::OddHexLength);
    }
    Ok(digits
        .chunks(2)
        .map(|pair| (pair[0] << 4 | pair[1]) as u8)
        .collect())
}

/// Render bytes as lowercase hexadecimal text, two digits per byte.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{bytes_to_hex, hex_to_bytes};
    use crate::error::EncodeError;

    #[rstest(input, expected,
        case("01020304", vec![0x01, 0x02, 0x03, 0x04]),
        case("DEADbeef", vec![0xde, 0xad, 0xbe, 0xef]),
        case("01 02:03-04", vec![0x01, 0x02, 0x03, 0x04]),
        case("", vec![]),
        case("  \n", vec![]),
    )]
    fn test_hex_to_bytes(input: &str, expected: Vec<u8>) {
        assert_eq!(expected, hex_to_bytes(input).unwrap());
    }

    #[rstest(input, case("012"), case("a"), case("ff 0"))]
    fn test_hex_to_bytes_odd_length(input: &str) {
        assert_eq!(Err(EncodeError::OddHexLength), hex_to_bytes(input));
    }

    #[rstest(input, expected,
        case(vec![], ""),
        case(vec![0x00, 0x7f, 0x80, 0xff], "007f80ff"),
        case(vec![0xde, 0xad], "dead"),
    )]
    fn test_bytes_to_hex(input: Vec<u8>, expected: &str) {
        assert_eq!(expected, bytes_to_hex(&input));
    }

    #[test]
    fn test_hex_round_trip() {
        let bytes = vec![0x2c, 0x8a, 0x00, 0xff, 0xa1, 0x87];
        assert_eq!(bytes, hex_to_bytes(&bytes_to_hex(&bytes)).unwrap());
    }
}
