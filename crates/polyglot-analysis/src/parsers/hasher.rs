//! Source hashing via xxh3.

use xxhash_rust::xxh3::xxh3_64;

/// Compute the xxh3 64-bit hash of source text.
#[inline]
pub fn hash_content(content: &[u8]) -> u64 {
    xxh3_64(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_hash() {
        assert_eq!(hash_content(b"let x = 1;"), hash_content(b"let x = 1;"));
    }

    #[test]
    fn one_character_changes_the_hash() {
        assert_ne!(hash_content(b"let x = 1;"), hash_content(b"let x = 2;"));
    }
}
