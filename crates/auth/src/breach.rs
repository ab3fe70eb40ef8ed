//! Breach-password screening via a k-anonymity range API.
//!
//! Only the first five characters of the uppercase SHA-1 digest leave
//! the process; the remainder is matched locally against the returned
//! suffix list. The check FAILS OPEN: an unreachable or misbehaving
//! breach service never blocks registration or password reset.

use std::time::Duration;

use sha1::{Digest, Sha1};

use florin_shared::config::SecurityConfig;

/// Connect timeout for the range API.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
/// Overall request timeout for the range API.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);
/// Digest prefix length sent to the service.
const PREFIX_LEN: usize = 5;

/// Client for the k-anonymity breach range API.
#[derive(Debug, Clone)]
pub struct BreachCheck {
    client: reqwest::Client,
    base_url: String,
    enabled: bool,
}

impl BreachCheck {
    /// Creates a new breach-check client from the security config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(security: &SecurityConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: security.breach_api_url.trim_end_matches('/').to_string(),
            enabled: security.breach_check_enabled,
        })
    }

    /// Screens a password against the breach corpus.
    ///
    /// Returns `true` only on a confirmed match. Transport errors,
    /// timeouts, and non-success statuses all return `false` with a
    /// warning log. The password itself never appears in the request
    /// or in any log line.
    pub async fn is_password_breached(&self, password: &str) -> bool {
        if !self.enabled {
            return false;
        }

        let digest = sha1_hex_upper(password);
        let (prefix, suffix) = digest.split_at(PREFIX_LEN);

        match self.range(prefix).await {
            Ok(body) => suffix_in_range(&body, suffix),
            Err(e) => {
                tracing::warn!(error = %e, "breach range query failed, failing open");
                false
            }
        }
    }

    async fn range(&self, prefix: &str) -> Result<String, reqwest::Error> {
        let url = format!("{}/{prefix}", self.base_url);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        response.text().await
    }
}

/// Uppercase hex SHA-1 of a password.
fn sha1_hex_upper(password: &str) -> String {
    format!("{:X}", Sha1::digest(password.as_bytes()))
}

/// Matches a digest suffix against a `SUFFIX:COUNT` range response.
fn suffix_in_range(body: &str, suffix: &str) -> bool {
    body.lines().any(|line| {
        line.split(':')
            .next()
            .is_some_and(|candidate| candidate.trim().eq_ignore_ascii_case(suffix))
    })
}
