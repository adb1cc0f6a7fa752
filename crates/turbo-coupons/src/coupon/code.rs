//! Random coupon codes.

use rand::Rng;

const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Default length of a generated code.
pub const DEFAULT_CODE_LENGTH: usize = 8;

/// Generate a random uppercase alphanumeric code.
///
/// Not cryptographically secure and not guaranteed unique; uniqueness is
/// enforced where codes are stored (see [`CouponBook::insert`](crate::CouponBook::insert)).
pub fn generate_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
        .collect()
}

/// [`generate_code`] with [`DEFAULT_CODE_LENGTH`].
pub fn generate_default_code() -> String {
    generate_code(DEFAULT_CODE_LENGTH)
}

/// Canonical form used for lookups: trimmed and upper-cased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_code_length_and_charset() {
        for len in [0, 1, 8, 32] {
            let code = generate_code(len);
            assert_eq!(code.len(), len);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_default_length() {
        assert_eq!(generate_default_code().len(), 8);
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  save10 "), "SAVE10");
    }
}
