//! Key normalization.
//!
//! Caller keys are arbitrary strings. They are mapped to storage object
//! names by a 64-bit FNV-1a hash rendered in decimal. Distinct keys may
//! collide; that is accepted.

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a over `bytes`.
pub const fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// Map a caller key to its storage object name.
pub fn normalize_key(key: &str) -> String {
    fnv1a_64(key.as_bytes()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_known_vectors() {
        assert_eq!(fnv1a_64(b""), 0xcbf29ce484222325);
        assert_eq!(fnv1a_64(b"a"), 0xaf63dc4c8601ec8c);
        assert_eq!(fnv1a_64(b"foobar"), 0x85944171f73967e8);
    }

    #[test]
    fn test_normalize_is_decimal() {
        assert_eq!(normalize_key(""), "14695981039346656037");
        assert_eq!(normalize_key("a"), "12638187200555641996");
        assert!(normalize_key("some/key with spaces")
            .chars()
            .all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_normalize_is_deterministic() {
        assert_eq!(normalize_key("report.csv"), normalize_key("report.csv"));
    }

    #[test]
    fn test_distinct_keys_usually_differ() {
        assert_ne!(normalize_key("report.csv"), normalize_key("report.csv.bak"));
        assert_ne!(normalize_key("a"), normalize_key("b"));
    }

    #[test]
    fn test_unicode_keys_hash_utf8_bytes() {
        assert_eq!(normalize_key("é"), fnv1a_64("é".as_bytes()).to_string());
    }
}
