//! Property-based tests for backup-code consumption.

use proptest::prelude::*;

use super::backup::{consume_backup_code, hash_backup_code, hash_backup_codes};

/// Strategy to generate well-formed backup codes (8 uppercase hex chars).
fn backup_code() -> impl Strategy<Value = String> {
    "[0-9A-F]{8}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Consuming a stored code removes exactly one entry, even when the
    /// set contains duplicates.
    #[test]
    fn prop_consume_removes_exactly_one(
        codes in prop::collection::vec(backup_code(), 1..20),
        pick in any::<prop::sample::Index>(),
    ) {
        let chosen = pick.get(&codes);
        let hashes = hash_backup_codes(&codes);

        let remaining = consume_backup_code(&hashes, chosen)
            .expect("a stored code must consume");

        prop_assert_eq!(remaining.len(), hashes.len() - 1);

        // Every hash except one occurrence of the chosen one survives.
        let needle = hash_backup_code(chosen);
        let before = hashes.iter().filter(|h| **h == needle).count();
        let after = remaining.iter().filter(|h| **h == needle).count();
        prop_assert_eq!(after, before - 1);
    }

    /// A code that was never stored consumes nothing.
    #[test]
    fn prop_unknown_code_never_consumes(
        codes in prop::collection::vec(backup_code(), 0..20),
        other in "[a-z]{8}",
    ) {
        // Lowercase input cannot collide with an uppercase-hex code.
        let hashes = hash_backup_codes(&codes);
        prop_assert!(consume_backup_code(&hashes, &other).is_none());
    }

    /// Hashing never echoes the code itself.
    #[test]
    fn prop_hash_is_not_the_code(code in backup_code()) {
        let hash = hash_backup_code(&code);
        prop_assert_eq!(hash.len(), 64);
        prop_assert_ne!(hash, code);
    }
}
