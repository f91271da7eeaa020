//! Fixed-width hex and byte padding helpers.

/// Left-pads `bytes` with zeroes up to `length` bytes.
///
/// Inputs already longer than `length` are returned unchanged.
pub fn pad_bytes(bytes: &[u8], length: usize) -> Vec<u8> {
    if bytes.len() >= length {
        return bytes.to_vec();
    }
    let mut padded = vec![0u8; length];
    padded[length - bytes.len()..].copy_from_slice(bytes);
    padded
}

/// Left-pads a hex string (with or without `0x` prefix) with zeroes to `length` bytes and
/// returns it `0x`-prefixed.
///
/// Inputs already longer than `length` bytes are only re-prefixed.
pub fn pad_hex(hex: &str, length: usize) -> String {
    let digits = strip_prefix(hex);
    format!("0x{digits:0>width$}", width = 2 * length)
}

/// Strips leading zero bytes, keeping a single byte for an all-zero input.
pub fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|b| *b != 0) {
        Some(first) => &bytes[first..],
        None => &bytes[bytes.len().saturating_sub(1)..],
    }
}

fn strip_prefix(hex: &str) -> &str {
    hex.strip_prefix("0x").or_else(|| hex.strip_prefix("0X")).unwrap_or(hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::shorter(&[0xab, 0xcd], 4, &[0, 0, 0xab, 0xcd])]
    #[case::exact(&[1, 2, 3], 3, &[1, 2, 3])]
    #[case::longer(&[1, 2, 3, 4], 2, &[1, 2, 3, 4])]
    #[case::empty(&[], 2, &[0, 0])]
    fn test_pad_bytes(#[case] input: &[u8], #[case] length: usize, #[case] expected: &[u8]) {
        assert_eq!(pad_bytes(input, length), expected);
    }

    #[rstest]
    #[case("0x1", 2, "0x0001")]
    #[case("abc", 2, "0x0abc")]
    #[case("0x", 1, "0x00")]
    #[case("0x123456", 2, "0x123456")]
    fn test_pad_hex(#[case] input: &str, #[case] length: usize, #[case] expected: &str) {
        assert_eq!(pad_hex(input, length), expected);
    }

    #[test]
    fn test_trim_leading_zeros() {
        assert_eq!(trim_leading_zeros(&[0, 0, 7, 0]), &[7, 0]);
        assert_eq!(trim_leading_zeros(&[0, 0, 0]), &[0]);
        assert_eq!(trim_leading_zeros(&[]), &[] as &[u8]);
    }
}
