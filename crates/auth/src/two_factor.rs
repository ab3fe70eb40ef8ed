//! Second-factor service: TOTP enrollment state machine and backup-code
//! recovery.
//!
//! Per-user state lives entirely in the credential store:
//! `Disabled -> PendingSetup -> Enabled -> Disabled`, driven by the
//! `totp_temp_secret` / `totp_secret` / `totp_enabled` columns.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::AuthError;
use florin_core::auth::{backup, totp};
use florin_db::UserRepository;
use florin_db::entities::users;
use florin_shared::AuditSink;

/// Enrollment material returned from a setup request.
#[derive(Debug, Clone)]
pub struct TotpSetup {
    /// Base32 secret for manual entry. Pending until enablement.
    pub secret: String,
    /// Provisioning URI embedding issuer and account.
    pub otpauth_url: String,
    /// QR rendering of the provisioning URI (base64 PNG).
    pub qr_png_base64: String,
}

/// Second-factor service over the credential store.
#[derive(Clone)]
pub struct TwoFactorService {
    users: UserRepository,
    audit: Arc<dyn AuditSink>,
    issuer: String,
}

impl TwoFactorService {
    /// Creates a new second-factor service.
    #[must_use]
    pub fn new(users: UserRepository, audit: Arc<dyn AuditSink>, issuer: String) -> Self {
        Self {
            users,
            audit,
            issuer,
        }
    }

    async fn require_user(&self, user_id: Uuid) -> Result<users::Model, AuthError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Starts TOTP enrollment: generates a fresh secret, persists it as
    /// pending, and returns the provisioning material.
    ///
    /// Transition: `Disabled|Enabled -> PendingSetup`. The active secret,
    /// if any, keeps working until enablement promotes the new one.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is missing or persistence fails.
    /// The secret itself is never logged.
    pub async fn setup_totp(&self, user_id: Uuid) -> Result<TotpSetup, AuthError> {
        let user = self.require_user(user_id).await?;

        let secret = totp::generate_secret();
        let otpauth_url = totp::provisioning_url(&self.issuer, &user.email, &secret)?;
        let qr_png_base64 = totp::qr_png_base64(&self.issuer, &user.email, &secret)?;

        self.users
            .set_totp_temp_secret(user.id, Some(&secret))
            .await?;

        self.audit
            .record(
                "totp_setup_started",
                serde_json::json!({ "user_id": user.id }),
            )
            .await;

        Ok(TotpSetup {
            secret,
            otpauth_url,
            qr_png_base64,
        })
    }

    /// Completes enrollment: verifies a code against the pending secret,
    /// promotes it to active, and issues a fresh set of backup codes.
    ///
    /// Transition: `PendingSetup -> Enabled`.
    ///
    /// # Errors
    ///
    /// Returns `TotpSetupMissing` when no setup is in progress and
    /// `InvalidTotp` when the code does not verify.
    pub async fn enable_totp(&self, user_id: Uuid, code: &str) -> Result<Vec<String>, AuthError> {
        let user = self.require_user(user_id).await?;

        let Some(pending) = user.totp_temp_secret.as_deref() else {
            return Err(AuthError::TotpSetupMissing);
        };

        if !totp::verify_code(pending, code)? {
            return Err(AuthError::InvalidTotp);
        }

        let codes = backup::generate_backup_codes();
        let hashes = backup::hash_backup_codes(&codes);
        self.users.enable_totp(user.id, pending, &hashes).await?;

        self.audit
            .record("totp_enabled", serde_json::json!({ "user_id": user.id }))
            .await;

        Ok(codes)
    }

    /// Disables the second factor after verifying a code against the
    /// active secret. Clears all TOTP material including backup codes.
    ///
    /// Transition: `Enabled -> Disabled`.
    ///
    /// # Errors
    ///
    /// Returns `TotpNotEnabled` when there is no active secret and
    /// `InvalidTotp` when the code does not verify.
    pub async fn disable_totp(&self, user_id: Uuid, code: &str) -> Result<(), AuthError> {
        let user = self.require_user(user_id).await?;

        let secret = user
            .totp_secret
            .as_deref()
            .filter(|_| user.totp_enabled)
            .ok_or(AuthError::TotpNotEnabled)?;

        if !totp::verify_code(secret, code)? {
            return Err(AuthError::InvalidTotp);
        }

        self.users.disable_totp(user.id).await?;

        self.audit
            .record("totp_disabled", serde_json::json!({ "user_id": user.id }))
            .await;

        Ok(())
    }

    /// Login-time second-factor verification.
    ///
    /// Accepts a current TOTP code, or a one-time backup code in its
    /// place; a matched backup code is consumed before this returns.
    ///
    /// # Errors
    ///
    /// Returns an error only on infrastructure failure; a wrong code is
    /// `Ok(false)`.
    pub async fn verify_second_factor(
        &self,
        user: &users::Model,
        code: &str,
    ) -> Result<bool, AuthError> {
        let Some(secret) = user.totp_secret.as_deref() else {
            return Ok(false);
        };

        if totp::verify_code(secret, code)? {
            return Ok(true);
        }

        let hashes = stored_backup_hashes(&user.totp_backup_codes);
        if let Some(remaining) = backup::consume_backup_code(&hashes, code) {
            self.users.set_backup_codes(user.id, &remaining).await?;
            self.audit
                .record(
                    "backup_code_used",
                    serde_json::json!({ "user_id": user.id, "remaining": remaining.len() }),
                )
                .await;
            return Ok(true);
        }

        Ok(false)
    }
}

/// Extracts the stored backup-code hashes from the user's JSON column.
fn stored_backup_hashes(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}
