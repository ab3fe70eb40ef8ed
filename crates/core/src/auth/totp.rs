//! TOTP (time-based one-time password) primitives.
//!
//! Stateless building blocks: secret generation, provisioning URIs and QR
//! payloads for authenticator enrollment, and code verification with a
//! clock-drift window of two time steps either side.

use std::time::{SystemTime, UNIX_EPOCH};

use data_encoding::BASE32;
use rand::{RngCore, rngs::OsRng};
use thiserror::Error;
use totp_rs::{Algorithm, TOTP};

/// Number of digits in a code.
pub const CODE_DIGITS: usize = 6;
/// Time-step size in seconds.
pub const STEP_SECS: u64 = 30;
/// Accepted clock drift, in steps either side of now.
pub const SKEW_STEPS: u8 = 2;

/// Secret length in bytes (160 bits).
const SECRET_BYTES: usize = 20;

/// Errors that can occur during TOTP operations.
#[derive(Debug, Error)]
pub enum TotpError {
    /// The stored secret is not valid base32.
    #[error("secret is not valid base32")]
    InvalidSecret,

    /// Failed to construct the TOTP generator.
    #[error("failed to construct TOTP: {0}")]
    Construction(String),

    /// The system clock is before the Unix epoch.
    #[error("system clock error: {0}")]
    Clock(String),
}

/// Generates a new random base32 secret (160 bits of OS entropy).
#[must_use]
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    BASE32.encode(&bytes)
}

fn build(secret: &str, issuer: Option<String>, account: String) -> Result<TOTP, TotpError> {
    let secret_bytes = BASE32
        .decode(secret.as_bytes())
        .map_err(|_| TotpError::InvalidSecret)?;

    TOTP::new(
        Algorithm::SHA1,
        CODE_DIGITS,
        SKEW_STEPS,
        STEP_SECS,
        secret_bytes,
        issuer,
        account,
    )
    .map_err(|e| TotpError::Construction(e.to_string()))
}

/// Builds the otpauth provisioning URI embedding issuer and account.
///
/// # Errors
///
/// Returns an error if the secret is malformed.
pub fn provisioning_url(issuer: &str, account: &str, secret: &str) -> Result<String, TotpError> {
    let totp = build(secret, Some(issuer.to_string()), account.to_string())?;
    Ok(totp.get_url())
}

/// Renders the provisioning URI as a scannable QR image (base64 PNG).
///
/// # Errors
///
/// Returns an error if the secret is malformed or QR rendering fails.
pub fn qr_png_base64(issuer: &str, account: &str, secret: &str) -> Result<String, TotpError> {
    let totp = build(secret, Some(issuer.to_string()), account.to_string())?;
    totp.get_qr_base64()
        .map_err(|e| TotpError::Construction(e.to_string()))
}

/// Verifies a code against a secret at the current time.
///
/// Codes within [`SKEW_STEPS`] steps either side of now are accepted.
/// Anything that is not exactly six ASCII digits is rejected without
/// touching the generator.
///
/// # Errors
///
/// Returns an error if the secret is malformed or the clock is broken.
pub fn verify_code(secret: &str, code: &str) -> Result<bool, TotpError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| TotpError::Clock(e.to_string()))?
        .as_secs();

    verify_code_at(secret, code, now)
}

/// Verifies a code against a secret at an explicit Unix timestamp.
///
/// # Errors
///
/// Returns an error if the secret is malformed.
pub fn verify_code_at(secret: &str, code: &str, unix_time: u64) -> Result<bool, TotpError> {
    if code.len() != CODE_DIGITS || !code.chars().all(|c| c.is_ascii_digit()) {
        return Ok(false);
    }

    let totp = build(secret, None, String::new())?;
    Ok(totp.check(code, unix_time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const NOW: u64 = 1_000_000_000;

    fn code_at(secret: &str, unix_time: u64) -> String {
        build(secret, None, String::new())
            .expect("build totp")
            .generate(unix_time)
    }

    #[test]
    fn test_generate_secret_is_base32_160_bits() {
        let secret = generate_secret();
        // 20 bytes encode to exactly 32 base32 characters, no padding
        assert_eq!(secret.len(), 32);
        assert!(
            secret
                .chars()
                .all(|c| "ABCDEFGHIJKLMNOPQRSTUVWXYZ234567".contains(c))
        );
    }

    #[test]
    fn test_secrets_are_unique() {
        assert_ne!(generate_secret(), generate_secret());
    }

    #[rstest]
    #[case(-2)]
    #[case(-1)]
    #[case(0)]
    #[case(1)]
    #[case(2)]
    fn test_code_within_window_is_accepted(#[case] offset_steps: i64) {
        let secret = generate_secret();
        let t = NOW.checked_add_signed(offset_steps * STEP_SECS as i64).unwrap();
        let code = code_at(&secret, t);

        assert!(verify_code_at(&secret, &code, NOW).unwrap());
    }

    #[rstest]
    #[case(-4)]
    #[case(-3)]
    #[case(3)]
    #[case(4)]
    fn test_code_outside_window_is_rejected(#[case] offset_steps: i64) {
        let secret = generate_secret();
        let t = NOW.checked_add_signed(offset_steps * STEP_SECS as i64).unwrap();
        let code = code_at(&secret, t);

        assert!(!verify_code_at(&secret, &code, NOW).unwrap());
    }

    #[test]
    fn test_malformed_codes_are_rejected() {
        let secret = generate_secret();
        assert!(!verify_code_at(&secret, "12345", NOW).unwrap());
        assert!(!verify_code_at(&secret, "1234567", NOW).unwrap());
        assert!(!verify_code_at(&secret, "12345a", NOW).unwrap());
        assert!(!verify_code_at(&secret, "", NOW).unwrap());
    }

    #[test]
    fn test_invalid_secret_is_an_error() {
        assert!(matches!(
            verify_code_at("not-base32!", "123456", NOW),
            Err(TotpError::InvalidSecret)
        ));
    }

    #[test]
    fn test_provisioning_url_embeds_issuer_and_account() {
        let secret = generate_secret();
        let url = provisioning_url("Florin", "user@example.com", &secret).unwrap();

        assert!(url.starts_with("otpauth://totp/"));
        assert!(url.contains("Florin"));
        assert!(url.contains(&secret));
    }

    #[test]
    fn test_qr_payload_is_nonempty() {
        let secret = generate_secret();
        let qr = qr_png_base64("Florin", "user@example.com", &secret).unwrap();
        assert!(!qr.is_empty());
    }
}
