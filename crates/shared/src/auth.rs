//! Authentication types for JWT claims and token payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// User email.
    pub email: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
    /// Token issuer.
    pub iss: String,
    /// Token audience.
    pub aud: String,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        email: &str,
        issuer: &str,
        audience: &str,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }
}

/// Token pair returned after successful authentication.
///
/// `expires_in` is the number of seconds until the access token expires;
/// the refresh token is an opaque value valid until revoked or expired
/// out of the token cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token (short-lived).
    pub access_token: String,
    /// Refresh token (long-lived, opaque).
    pub refresh_token: String,
    /// Access token expiration in seconds.
    pub expires_in: i64,
}

impl TokenPair {
    /// Creates a new token pair.
    #[must_use]
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_in,
        }
    }
}

/// Login request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
    /// Second-factor code, required when TOTP is enabled.
    #[serde(default)]
    pub totp_code: Option<String>,
}

/// Registration request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
    /// User full name.
    pub full_name: String,
    /// Preferred locale (optional).
    #[serde(default)]
    pub locale: Option<String>,
    /// Preferred timezone (optional, IANA format).
    #[serde(default)]
    pub timezone: Option<String>,
}

/// Refresh token request.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    /// The refresh token to rotate.
    pub refresh_token: String,
}

/// Logout request.
#[derive(Debug, Clone, Deserialize)]
pub struct LogoutRequest {
    /// The refresh token to invalidate.
    pub refresh_token: String,
}

/// Forgot-password request.
#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    /// Email of the account to reset.
    pub email: String,
}

/// Reset-password request.
#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    /// The single-use reset token from the email link.
    pub token: String,
    /// The new password.
    pub new_password: String,
}

/// Request payload carrying a TOTP code (enable/disable confirmation).
#[derive(Debug, Clone, Deserialize)]
pub struct TotpCodeRequest {
    /// Six-digit time-based code.
    pub code: String,
}

/// User info returned in auth responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    /// User ID.
    pub id: Uuid,
    /// User email.
    pub email: String,
    /// User full name.
    pub full_name: String,
    /// Whether a second factor is enabled for this account.
    pub totp_enabled: bool,
}

/// Login/registration response payload.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    /// Authenticated user info.
    pub user: UserInfo,
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Access token expiration in seconds.
    pub expires_in: i64,
}

/// Response to a TOTP setup request.
#[derive(Debug, Clone, Serialize)]
pub struct TotpSetupResponse {
    /// Base32 secret for manual entry.
    pub secret: String,
    /// Provisioning URI for authenticator apps.
    pub otpauth_url: String,
    /// QR rendering of the provisioning URI (base64 PNG).
    pub qr_png_base64: String,
}

/// Response to a successful TOTP enablement.
#[derive(Debug, Clone, Serialize)]
pub struct TotpEnableResponse {
    /// Freshly issued one-time backup codes. Shown exactly once.
    pub backup_codes: Vec<String>,
}

/// Generic message response.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    /// Human-readable outcome message.
    pub message: String,
}
