//! Redis-backed token cache client.
//!
//! Holds every ephemeral credential artifact: refresh sessions, per-user
//! session sets for bulk revocation, single-use password-reset tokens,
//! failed-login counters, and lockout flags. Raw tokens never enter the
//! cache; records are keyed by the SHA-256 of the token and the raw value
//! is returned to the caller exactly once, at creation.
//!
//! Failure semantics per operation:
//!
//! | Operation                       | Cache down            | Corrupt data          | Not found |
//! |---------------------------------|-----------------------|-----------------------|-----------|
//! | `create_refresh_token`          | error (fail closed)   | n/a                   | n/a       |
//! | `create_password_reset_token`   | error (fail closed)   | n/a                   | n/a       |
//! | `validate_refresh_token`        | `NotFound` (logged)   | deleted + `NotFound`  | `NotFound`|
//! | `validate_password_reset_token` | `None` (logged)       | consumed + `None`     | `None`    |
//! | `revoke_refresh_token`          | logged, swallowed     | set cleanup skipped   | no-op     |
//! | `revoke_all_user_sessions`      | logged, swallowed     | n/a                   | no-op     |
//! | `record_failed_login`           | logged, not recorded  | n/a                   | n/a       |
//! | `is_locked_out`                 | `false` (logged)      | n/a                   | `false`   |
//!
//! Creation fails closed because returning a token that was never
//! persisted would hand the caller a credential that can never validate.
//! Validation fails open to a negative result so an unavailable cache
//! degrades to re-authentication instead of an outage.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use data_encoding::HEXLOWER;
use rand::{RngCore, rngs::OsRng};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

/// Retry attempts per cache operation.
const RETRY_ATTEMPTS: u32 = 3;
/// Base delay of the exponential backoff between attempts.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(50);
/// Raw token entropy in bytes (256 bits).
const TOKEN_BYTES: usize = 32;

/// Errors surfaced by fail-closed cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache did not answer within the retry budget.
    #[error("token cache unavailable: {0}")]
    Unavailable(String),

    /// A record could not be encoded for storage.
    #[error("token cache encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Session data stored against a hashed refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSession {
    /// Owner of the session.
    pub user_id: Uuid,
    /// Email bound to the session at issue time.
    pub email: String,
    /// Issue time.
    pub created_at: DateTime<Utc>,
    /// Expiry recorded in the payload (the key also carries a TTL).
    pub expires_at: DateTime<Utc>,
}

/// Payload of a password-reset token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResetRecord {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

/// Outcome of a refresh-token validation.
///
/// Expired is distinct from not-found internally (it is logged and the
/// stale record cleaned up); callers are expected to collapse both into
/// one uniform unauthorized response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshValidation {
    /// Token is live; the bound session is returned.
    Valid(RefreshSession),
    /// Token existed but its recorded expiry has passed.
    Expired,
    /// Token is unknown, revoked, corrupt, or the cache is unreachable.
    NotFound,
}

/// Result of recording a failed login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailedLoginOutcome {
    /// Attempt count inside the current window (0 if the cache is down).
    pub attempts: u64,
    /// Whether this attempt tripped the lockout.
    pub locked: bool,
}

/// Tunable TTLs and thresholds.
#[derive(Debug, Clone)]
pub struct TokenCacheSettings {
    /// Refresh session lifetime in seconds.
    pub refresh_ttl_secs: u64,
    /// Password-reset token lifetime in seconds.
    pub reset_ttl_secs: u64,
    /// Failed-login counter window in seconds.
    pub attempt_window_secs: u64,
    /// Lockout flag lifetime in seconds.
    pub lockout_secs: u64,
    /// Failed attempts that trip the lockout.
    pub max_attempts: u64,
}

impl Default for TokenCacheSettings {
    fn default() -> Self {
        Self {
            refresh_ttl_secs: 30 * 24 * 60 * 60,
            reset_ttl_secs: 60 * 60,
            attempt_window_secs: 15 * 60,
            lockout_secs: 15 * 60,
            max_attempts: 5,
        }
    }
}

/// Redis-backed token cache client.
///
/// Explicitly constructed and injected; the connection handle and the
/// connectivity hint are owned here, not global state. The hint is
/// read-mostly and only ever used to decide whether a cheap `PING`
/// probe should precede a retry, never as a hard gate.
#[derive(Clone)]
pub struct TokenCache {
    conn: ConnectionManager,
    connected: Arc<AtomicBool>,
    settings: TokenCacheSettings,
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache")
            .field("connected", &self.is_connected())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl TokenCache {
    /// Creates a new token cache client over an established connection.
    #[must_use]
    pub fn new(conn: ConnectionManager, settings: TokenCacheSettings) -> Self {
        Self {
            conn,
            connected: Arc::new(AtomicBool::new(true)),
            settings,
        }
    }

    /// Returns the last observed connectivity state.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Issues a new refresh token for a user.
    ///
    /// Stores the session record and the user's session-set membership
    /// in one atomic pipeline, so a crash cannot leave the set and the
    /// per-token records disagreeing. Returns the raw token; only its
    /// hash is persisted.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Unavailable` if the cache cannot be written
    /// (fail closed).
    pub async fn create_refresh_token(
        &self,
        user_id: Uuid,
        email: &str,
    ) -> Result<String, CacheError> {
        let raw = generate_token();
        let hash = hash_token(&raw);
        let now = Utc::now();

        let ttl_secs = self.settings.refresh_ttl_secs;
        let ttl_i64 = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        let session = RefreshSession {
            user_id,
            email: email.to_string(),
            created_at: now,
            expires_at: now + chrono::Duration::seconds(ttl_i64),
        };
        let payload = serde_json::to_string(&session)?;

        let token_key = refresh_token_key(&hash);
        let set_key = user_sessions_key(user_id);

        self.run("create_refresh_token", |mut conn| {
            let token_key = token_key.clone();
            let set_key = set_key.clone();
            let payload = payload.clone();
            let hash = hash.clone();
            async move {
                redis::pipe()
                    .atomic()
                    .set_ex(&token_key, payload, ttl_secs)
                    .ignore()
                    .sadd(&set_key, hash)
                    .ignore()
                    .expire(&set_key, ttl_i64)
                    .ignore()
                    .query_async::<()>(&mut conn)
                    .await
            }
        })
        .await
        .map_err(|e| {
            tracing::error!(user_id = %user_id, error = %e, "failed to persist refresh session");
            CacheError::Unavailable(e.to_string())
        })?;

        Ok(raw)
    }

    /// Validates a raw refresh token.
    ///
    /// Degrades to `NotFound` when the cache is unreachable: callers
    /// must not be able to distinguish "invalid" from "cache down".
    pub async fn validate_refresh_token(&self, raw_token: &str) -> RefreshValidation {
        let hash = hash_token(raw_token);
        let token_key = refresh_token_key(&hash);

        let stored: Option<String> = match self
            .run("validate_refresh_token", |mut conn| {
                let token_key = token_key.clone();
                async move { conn.get::<_, Option<String>>(&token_key).await }
            })
            .await
        {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "token cache unreachable during refresh validation, treating token as not found"
                );
                return RefreshValidation::NotFound;
            }
        };

        let Some(payload) = stored else {
            return RefreshValidation::NotFound;
        };

        let session: RefreshSession = match serde_json::from_str(&payload) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(
                    token_hash = %hash,
                    error = %e,
                    "corrupt refresh session payload, deleting record"
                );
                self.cleanup_session_entry(&hash, None).await;
                return RefreshValidation::NotFound;
            }
        };

        if session.expires_at <= Utc::now() {
            tracing::debug!(user_id = %session.user_id, "refresh token expired, deleting record");
            self.cleanup_session_entry(&hash, Some(session.user_id))
                .await;
            return RefreshValidation::Expired;
        }

        RefreshValidation::Valid(session)
    }

    /// Revokes a single refresh token. Best-effort: failures are logged
    /// and swallowed, because logout must not fail user-visibly.
    pub async fn revoke_refresh_token(&self, raw_token: &str) {
        let hash = hash_token(raw_token);
        let token_key = refresh_token_key(&hash);

        // Look the session up first to discover the owner for set cleanup.
        let owner = match self
            .run("revoke_refresh_token.lookup", |mut conn| {
                let token_key = token_key.clone();
                async move { conn.get::<_, Option<String>>(&token_key).await }
            })
            .await
        {
            Ok(Some(payload)) => serde_json::from_str::<RefreshSession>(&payload)
                .ok()
                .map(|s| s.user_id),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "token cache unreachable during revocation, skipping");
                return;
            }
        };

        self.cleanup_session_entry(&hash, owner).await;
    }

    /// Revokes every refresh session belonging to a user.
    ///
    /// Reads the session set, then deletes all member records and the
    /// set itself in one batched operation. Best-effort.
    pub async fn revoke_all_user_sessions(&self, user_id: Uuid) {
        let set_key = user_sessions_key(user_id);

        let members: Vec<String> = match self
            .run("revoke_all_user_sessions.members", |mut conn| {
                let set_key = set_key.clone();
                async move { conn.smembers::<_, Vec<String>>(&set_key).await }
            })
            .await
        {
            Ok(members) => members,
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "token cache unreachable during bulk revocation, skipping"
                );
                return;
            }
        };

        let mut keys: Vec<String> = members.iter().map(|hash| refresh_token_key(hash)).collect();
        keys.push(set_key);

        match self
            .run("revoke_all_user_sessions.delete", |mut conn| {
                let keys = keys.clone();
                async move { conn.del::<_, ()>(keys).await }
            })
            .await
        {
            Ok(()) => {
                tracing::info!(user_id = %user_id, sessions = members.len(), "revoked all user sessions");
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "bulk session revocation failed");
            }
        }
    }

    /// Issues a single-use password-reset token (1 hour TTL by default).
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Unavailable` if the cache cannot be written
    /// (fail closed).
    pub async fn create_password_reset_token(&self, user_id: Uuid) -> Result<String, CacheError> {
        let raw = generate_token();
        let hash = hash_token(&raw);
        let now = Utc::now();

        let ttl_secs = self.settings.reset_ttl_secs;
        let record = ResetRecord {
            user_id,
            expires_at: now + chrono::Duration::seconds(i64::try_from(ttl_secs).unwrap_or(i64::MAX)),
        };
        let payload = serde_json::to_string(&record)?;
        let key = password_reset_key(&hash);

        self.run("create_password_reset_token", |mut conn| {
            let key = key.clone();
            let payload = payload.clone();
            async move { conn.set_ex::<_, _, ()>(&key, payload, ttl_secs).await }
        })
        .await
        .map_err(|e| {
            tracing::error!(user_id = %user_id, error = %e, "failed to persist reset token");
            CacheError::Unavailable(e.to_string())
        })?;

        Ok(raw)
    }

    /// Validates and consumes a password-reset token.
    ///
    /// Implemented with `GETDEL`, so validation and invalidation are one
    /// indivisible step: two concurrent validations cannot both succeed,
    /// and an expired or corrupt record is consumed on the way out.
    /// Degrades to `None` when the cache is unreachable.
    pub async fn validate_password_reset_token(&self, raw_token: &str) -> Option<Uuid> {
        let hash = hash_token(raw_token);
        let key = password_reset_key(&hash);

        let payload: Option<String> = match self
            .run("validate_password_reset_token", |mut conn| {
                let key = key.clone();
                async move { conn.get_del::<_, Option<String>>(&key).await }
            })
            .await
        {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "token cache unreachable during reset validation, denying"
                );
                return None;
            }
        };

        let record: ResetRecord = match serde_json::from_str(&payload?) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(token_hash = %hash, error = %e, "corrupt reset token payload");
                return None;
            }
        };

        if record.expires_at <= Utc::now() {
            tracing::debug!(user_id = %record.user_id, "expired reset token consumed");
            return None;
        }

        Some(record.user_id)
    }

    /// Records a failed login attempt for an email.
    ///
    /// Increments the windowed counter; crossing the threshold sets the
    /// lockout flag and clears the counter. Best-effort: a cache outage
    /// means the attempt simply is not counted.
    pub async fn record_failed_login(&self, email: &str) -> FailedLoginOutcome {
        let counter_key = login_attempts_key(email);
        let window_secs = i64::try_from(self.settings.attempt_window_secs).unwrap_or(i64::MAX);

        let attempts: u64 = match self
            .run("record_failed_login", |mut conn| {
                let counter_key = counter_key.clone();
                async move {
                    redis::pipe()
                        .atomic()
                        .incr(&counter_key, 1u64)
                        .expire(&counter_key, window_secs)
                        .ignore()
                        .query_async::<(u64,)>(&mut conn)
                        .await
                        .map(|(attempts,)| attempts)
                }
            })
            .await
        {
            Ok(attempts) => attempts,
            Err(e) => {
                tracing::warn!(error = %e, "token cache unreachable, failed attempt not counted");
                return FailedLoginOutcome {
                    attempts: 0,
                    locked: false,
                };
            }
        };

        if attempts < self.settings.max_attempts {
            return FailedLoginOutcome {
                attempts,
                locked: false,
            };
        }

        let lockout = lockout_key(email);
        let lockout_secs = self.settings.lockout_secs;
        match self
            .run("record_failed_login.lockout", |mut conn| {
                let lockout = lockout.clone();
                let counter_key = counter_key.clone();
                async move {
                    redis::pipe()
                        .atomic()
                        .set_ex(&lockout, "1", lockout_secs)
                        .ignore()
                        .del(&counter_key)
                        .ignore()
                        .query_async::<()>(&mut conn)
                        .await
                }
            })
            .await
        {
            Ok(()) => {}
            Err(e) => {
                tracing::warn!(error = %e, "failed to persist lockout flag");
            }
        }

        FailedLoginOutcome {
            attempts,
            locked: true,
        }
    }

    /// Checks the lockout flag for an email.
    ///
    /// Fails open: an unreachable cache never locks anyone out.
    pub async fn is_locked_out(&self, email: &str) -> bool {
        let key = lockout_key(email);

        match self
            .run("is_locked_out", |mut conn| {
                let key = key.clone();
                async move { conn.exists::<_, bool>(&key).await }
            })
            .await
        {
            Ok(locked) => locked,
            Err(e) => {
                tracing::warn!(error = %e, "token cache unreachable during lockout check");
                false
            }
        }
    }

    /// Clears the failed-login counter after a successful login.
    /// Best-effort.
    pub async fn clear_failed_logins(&self, email: &str) {
        let key = login_attempts_key(email);

        if let Err(e) = self
            .run("clear_failed_logins", |mut conn| {
                let key = key.clone();
                async move { conn.del::<_, ()>(&key).await }
            })
            .await
        {
            tracing::warn!(error = %e, "failed to clear login attempt counter");
        }
    }

    /// Deletes a session record and, when the owner is known, its
    /// session-set membership. Best-effort.
    async fn cleanup_session_entry(&self, hash: &str, owner: Option<Uuid>) {
        let token_key = refresh_token_key(hash);
        let set_key = owner.map(user_sessions_key);
        let hash = hash.to_string();

        let result = self
            .run("cleanup_session_entry", |mut conn| {
                let token_key = token_key.clone();
                let set_key = set_key.clone();
                let hash = hash.clone();
                async move {
                    let mut pipe = redis::pipe();
                    pipe.atomic();
                    if let Some(set_key) = &set_key {
                        pipe.srem(set_key, &hash).ignore();
                    }
                    pipe.del(&token_key).ignore();
                    pipe.query_async::<()>(&mut conn).await
                }
            })
            .await;

        if let Err(e) = result {
            tracing::warn!(token_hash = %hash, error = %e, "refresh session cleanup failed");
        }
    }

    /// Runs one cache operation under the retry policy.
    ///
    /// When the connectivity hint is down, a lightweight `PING` probe
    /// runs before each attempt; the hint is refreshed from every
    /// outcome. The final error is returned to the caller, which decides
    /// fail-open versus fail-closed.
    async fn run<T, F, Fut>(&self, op: &'static str, f: F) -> Result<T, redis::RedisError>
    where
        F: Fn(ConnectionManager) -> Fut,
        Fut: Future<Output = redis::RedisResult<T>>,
    {
        let mut delay = RETRY_BASE_DELAY;
        let mut attempt = 1;

        loop {
            if !self.is_connected() {
                self.probe().await;
            }

            match f(self.conn.clone()).await {
                Ok(value) => {
                    self.connected.store(true, Ordering::Relaxed);
                    return Ok(value);
                }
                Err(e) => {
                    self.connected.store(false, Ordering::Relaxed);
                    if attempt >= RETRY_ATTEMPTS {
                        return Err(e);
                    }
                    tracing::warn!(op, attempt, error = %e, "token cache operation failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
            }
        }
    }

    /// Cheap liveness check used to refresh the connectivity hint.
    async fn probe(&self) {
        let mut conn = self.conn.clone();
        match redis::cmd("PING").query_async::<String>(&mut conn).await {
            Ok(_) => self.connected.store(true, Ordering::Relaxed),
            Err(e) => tracing::debug!(error = %e, "token cache liveness probe failed"),
        }
    }
}

/// Hashes a raw token for use as a cache key component.
#[must_use]
pub fn hash_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Generates a raw token: 256 bits of OS entropy, hex encoded.
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    HEXLOWER.encode(&bytes)
}

fn refresh_token_key(hash: &str) -> String {
    format!("refresh_token:{hash}")
}

fn user_sessions_key(user_id: Uuid) -> String {
    format!("user_sessions:{user_id}")
}

fn password_reset_key(hash: &str) -> String {
    format!("password_reset:{hash}")
}

fn login_attempts_key(email: &str) -> String {
    format!("login_attempts:{email}")
}

fn lockout_key(email: &str) -> String {
    format!("lockout:{email}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_256_bit_hex() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(token, token.to_ascii_lowercase());
    }

    #[test]
    fn test_generated_tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_hash_token_is_deterministic_and_one_way() {
        let raw = generate_token();
        let hash = hash_token(&raw);

        assert_eq!(hash, hash_token(&raw));
        assert_eq!(hash.len(), 64);
        assert_ne!(hash, raw);
    }

    #[test]
    fn test_key_namespaces() {
        let user_id = Uuid::new_v4();
        assert!(refresh_token_key("abc").starts_with("refresh_token:"));
        assert!(user_sessions_key(user_id).starts_with("user_sessions:"));
        assert!(password_reset_key("abc").starts_with("password_reset:"));
        assert!(login_attempts_key("a@x.com").starts_with("login_attempts:"));
        assert!(lockout_key("a@x.com").starts_with("lockout:"));
        assert!(user_sessions_key(user_id).contains(&user_id.to_string()));
    }

    #[test]
    fn test_refresh_session_wire_format_is_camel_case() {
        let session = RefreshSession {
            user_id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            created_at: Utc::now(),
            expires_at: Utc::now(),
        };
        let json = serde_json::to_string(&session).unwrap();

        assert!(json.contains("\"userId\""));
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"expiresAt\""));

        let roundtrip: RefreshSession = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, session);
    }

    #[test]
    fn test_reset_record_wire_format_is_camel_case() {
        let record = ResetRecord {
            user_id: Uuid::new_v4(),
            expires_at: Utc::now(),
        };
        let json = serde_json::to_string(&record).unwrap();

        assert!(json.contains("\"userId\""));
        assert!(json.contains("\"expiresAt\""));
    }

    #[test]
    fn test_corrupt_payload_fails_to_parse() {
        assert!(serde_json::from_str::<RefreshSession>("{\"nope\":1}").is_err());
        assert!(serde_json::from_str::<ResetRecord>("not-json").is_err());
    }

    #[test]
    fn test_default_settings_match_policy() {
        let settings = TokenCacheSettings::default();
        assert_eq!(settings.refresh_ttl_secs, 2_592_000);
        assert_eq!(settings.reset_ttl_secs, 3600);
        assert_eq!(settings.attempt_window_secs, 900);
        assert_eq!(settings.lockout_secs, 900);
        assert_eq!(settings.max_attempts, 5);
    }
}
