//! One-time backup codes for second-factor recovery.
//!
//! Codes are short random values shown to the user exactly once at
//! enablement; only SHA-256 hashes are ever stored. A code is consumed
//! (its hash removed) on first successful use.

use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

/// Number of codes issued per enrollment.
pub const BACKUP_CODE_COUNT: usize = 10;
/// Length of each code in characters (8 uppercase hex = 32 bits).
pub const BACKUP_CODE_LENGTH: usize = 8;

/// Generates a fresh set of backup codes.
///
/// Each code carries 32 bits of OS entropy, formatted as fixed-length
/// uppercase hex.
#[must_use]
pub fn generate_backup_codes() -> Vec<String> {
    (0..BACKUP_CODE_COUNT)
        .map(|_| format!("{:08X}", OsRng.next_u32()))
        .collect()
}

/// Hashes a single backup code for storage.
#[must_use]
pub fn hash_backup_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Hashes a full set of backup codes for storage.
#[must_use]
pub fn hash_backup_codes(codes: &[String]) -> Vec<String> {
    codes.iter().map(|c| hash_backup_code(c)).collect()
}

/// Attempts to consume a backup code against a stored hash set.
///
/// On a match, returns the remaining hashes with exactly the matched
/// entry removed. Returns `None` (no mutation implied) when the code
/// matches nothing or no codes are on file.
#[must_use]
pub fn consume_backup_code(hashes: &[String], code: &str) -> Option<Vec<String>> {
    let needle = hash_backup_code(code);
    let position = hashes.iter().position(|h| *h == needle)?;

    let mut remaining = hashes.to_vec();
    remaining.remove(position);
    Some(remaining)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generates_ten_fixed_length_uppercase_hex_codes() {
        let codes = generate_backup_codes();

        assert_eq!(codes.len(), BACKUP_CODE_COUNT);
        for code in &codes {
            assert_eq!(code.len(), BACKUP_CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_hexdigit()));
            assert_eq!(*code, code.to_ascii_uppercase());
        }
    }

    #[test]
    fn test_codes_are_distinct_across_calls() {
        let mut seen = HashSet::new();
        for _ in 0..3 {
            for code in generate_backup_codes() {
                seen.insert(code);
            }
        }
        assert_eq!(seen.len(), 3 * BACKUP_CODE_COUNT);
    }

    #[test]
    fn test_hashes_are_not_the_codes() {
        let codes = generate_backup_codes();
        let hashes = hash_backup_codes(&codes);

        assert_eq!(hashes.len(), codes.len());
        for (code, hash) in codes.iter().zip(&hashes) {
            assert_ne!(code, hash);
            assert_eq!(hash.len(), 64);
        }
    }

    #[test]
    fn test_consume_removes_exactly_the_matched_code() {
        let codes = generate_backup_codes();
        let hashes = hash_backup_codes(&codes);

        let remaining = consume_backup_code(&hashes, &codes[3]).expect("code should match");

        assert_eq!(remaining.len(), BACKUP_CODE_COUNT - 1);
        assert!(!remaining.contains(&hashes[3]));
        for (i, hash) in hashes.iter().enumerate() {
            if i != 3 {
                assert!(remaining.contains(hash));
            }
        }
    }

    #[test]
    fn test_consume_rejects_unknown_code() {
        let codes = generate_backup_codes();
        let hashes = hash_backup_codes(&codes);

        assert!(consume_backup_code(&hashes, "ZZZZZZZZ").is_none());
    }

    #[test]
    fn test_consume_rejects_when_no_codes_on_file() {
        assert!(consume_backup_code(&[], "00000000").is_none());
    }

    #[test]
    fn test_consumed_code_cannot_be_reused() {
        let codes = generate_backup_codes();
        let hashes = hash_backup_codes(&codes);

        let remaining = consume_backup_code(&hashes, &codes[0]).expect("first use");
        assert!(consume_backup_code(&remaining, &codes[0]).is_none());
    }
}
