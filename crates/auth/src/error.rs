//! Authentication error types.
//!
//! Expected negative outcomes (wrong password, missing TOTP code, spent
//! reset token) are explicit variants, not panics or catch-all errors,
//! so callers can map them to uniform, deliberately uninformative HTTP
//! responses.

use thiserror::Error;

use crate::token_cache::CacheError;
use florin_core::auth::password::PasswordError;
use florin_core::auth::totp::TotpError;
use florin_shared::AppError;
use florin_shared::jwt::JwtError;

/// Errors produced by the authentication subsystem.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The email already has an account.
    #[error("email is already registered")]
    EmailTaken,

    /// Unknown user or wrong password. Never split into the two cases.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account exists but has been deactivated.
    #[error("account is disabled")]
    AccountDisabled,

    /// Too many failed attempts; the account is locked for a window.
    #[error("account is temporarily locked")]
    LockedOut,

    /// TOTP is enabled for the account and no code was supplied.
    #[error("two-factor code required")]
    TotpRequired,

    /// A second-factor code was supplied but did not verify.
    #[error("invalid two-factor code")]
    InvalidTotp,

    /// `enable_totp` was called without a pending setup.
    #[error("no two-factor setup in progress")]
    TotpSetupMissing,

    /// A TOTP operation requires the second factor to be enabled.
    #[error("two-factor authentication is not enabled")]
    TotpNotEnabled,

    /// The refresh token is unknown, revoked, or expired.
    #[error("invalid or expired refresh token")]
    InvalidRefreshToken,

    /// The reset token is unknown, spent, or expired.
    #[error("invalid or expired reset token")]
    InvalidResetToken,

    /// The password appears in the known-breach corpus.
    #[error("password appears in a known data breach")]
    BreachedPassword,

    /// An authenticated user id no longer resolves to a user.
    #[error("user not found")]
    UserNotFound,

    /// The token cache is unavailable on a fail-closed path.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Credential store failure.
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Password hashing failure.
    #[error("password hashing error: {0}")]
    Password(#[from] PasswordError),

    /// TOTP primitive failure (malformed secret, clock).
    #[error("second-factor error: {0}")]
    Totp(#[from] TotpError),

    /// Access-token signing failure.
    #[error("token signing error: {0}")]
    Jwt(#[from] JwtError),
}

impl AuthError {
    /// Stable machine-readable code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::EmailTaken => "email_exists",
            Self::InvalidCredentials => "invalid_credentials",
            Self::AccountDisabled => "account_disabled",
            Self::LockedOut => "account_locked",
            Self::TotpRequired => "totp_required",
            Self::InvalidTotp => "invalid_totp",
            Self::TotpSetupMissing => "totp_setup_missing",
            Self::TotpNotEnabled => "totp_not_enabled",
            Self::InvalidRefreshToken => "invalid_refresh_token",
            Self::InvalidResetToken => "invalid_reset_token",
            Self::BreachedPassword => "breached_password",
            Self::UserNotFound => "user_not_found",
            Self::Cache(_) => "infrastructure_unavailable",
            Self::Database(_) | Self::Password(_) | Self::Totp(_) | Self::Jwt(_) => {
                "internal_error"
            }
        }
    }

    /// Maps onto the application error taxonomy (and thus HTTP status).
    #[must_use]
    pub fn to_app_error(&self) -> AppError {
        match self {
            Self::EmailTaken => AppError::Conflict(self.to_string()),
            Self::InvalidCredentials
            | Self::AccountDisabled
            | Self::LockedOut
            | Self::TotpRequired
            | Self::InvalidTotp
            | Self::InvalidRefreshToken
            | Self::UserNotFound => AppError::Unauthorized(self.to_string()),
            Self::TotpSetupMissing
            | Self::TotpNotEnabled
            | Self::InvalidResetToken
            | Self::BreachedPassword => AppError::BadRequest(self.to_string()),
            Self::Cache(e) => AppError::Infrastructure(e.to_string()),
            Self::Database(e) => AppError::Database(e.to_string()),
            Self::Password(_) | Self::Totp(_) | Self::Jwt(_) => {
                AppError::Internal(self.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthError::EmailTaken.to_app_error().status_code(), 409);
        assert_eq!(
            AuthError::InvalidCredentials.to_app_error().status_code(),
            401
        );
        assert_eq!(AuthError::LockedOut.to_app_error().status_code(), 401);
        assert_eq!(AuthError::TotpRequired.to_app_error().status_code(), 401);
        assert_eq!(AuthError::InvalidTotp.to_app_error().status_code(), 401);
        assert_eq!(
            AuthError::InvalidRefreshToken.to_app_error().status_code(),
            401
        );
        assert_eq!(
            AuthError::InvalidResetToken.to_app_error().status_code(),
            400
        );
        assert_eq!(
            AuthError::BreachedPassword.to_app_error().status_code(),
            400
        );
        assert_eq!(
            AuthError::Cache(CacheError::Unavailable("down".into()))
                .to_app_error()
                .status_code(),
            503
        );
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(AuthError::TotpRequired.error_code(), "totp_required");
        assert_eq!(
            AuthError::InvalidCredentials.error_code(),
            "invalid_credentials"
        );
        assert_eq!(AuthError::LockedOut.error_code(), "account_locked");
    }

    #[test]
    fn test_credential_errors_do_not_leak_detail() {
        // Unknown-user and wrong-password must render identically.
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "invalid credentials"
        );
    }
}
