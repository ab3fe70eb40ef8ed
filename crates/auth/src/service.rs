//! Authentication orchestrator.
//!
//! Composes the credential store, token cache, second-factor service,
//! breach screen, and the email/audit sinks into the register / login /
//! refresh / logout / forgot-password / reset-password flows. Holds no
//! state of its own beyond the injected collaborators.

use std::sync::Arc;

use uuid::Uuid;

use crate::breach::BreachCheck;
use crate::error::AuthError;
use crate::token_cache::{RefreshValidation, TokenCache};
use crate::two_factor::TwoFactorService;
use florin_core::auth::password::{dummy_verify, hash_password, verify_password};
use florin_db::UserRepository;
use florin_db::entities::users;
use florin_shared::auth::{LoginRequest, RegisterRequest, TokenPair};
use florin_shared::{AuditSink, EmailService, JwtService};

/// Authentication orchestrator behind the HTTP handlers.
#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    tokens: TokenCache,
    two_factor: TwoFactorService,
    breach: BreachCheck,
    jwt: Arc<JwtService>,
    email: Arc<EmailService>,
    audit: Arc<dyn AuditSink>,
}

impl AuthService {
    /// Creates a new orchestrator from its collaborators.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: UserRepository,
        tokens: TokenCache,
        two_factor: TwoFactorService,
        breach: BreachCheck,
        jwt: Arc<JwtService>,
        email: Arc<EmailService>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            users,
            tokens,
            two_factor,
            breach,
            jwt,
            email,
            audit,
        }
    }

    /// Registers a new user and their default personal household,
    /// returning the created user and a fresh token pair.
    ///
    /// The password is screened against the breach corpus (fail-open)
    /// and hashed with the memory-hard tuning before anything is
    /// persisted. A welcome email is fired and forgotten.
    ///
    /// # Errors
    ///
    /// Returns `EmailTaken` for duplicate registration, `BreachedPassword`
    /// on a confirmed breach match, or an infrastructure error if token
    /// issuance fails.
    pub async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<(users::Model, TokenPair), AuthError> {
        if self.users.email_exists(&request.email).await? {
            return Err(AuthError::EmailTaken);
        }

        if self.breach.is_password_breached(&request.password).await {
            return Err(AuthError::BreachedPassword);
        }

        let password_hash = hash_password(&request.password)?;

        let user = self
            .users
            .create_with_default_household(
                &request.email,
                &password_hash,
                &request.full_name,
                request.locale.as_deref(),
                request.timezone.as_deref(),
            )
            .await?;

        tracing::info!(user_id = %user.id, email = %user.email, "new user registered");
        self.audit
            .record("user_registered", serde_json::json!({ "user_id": user.id }))
            .await;

        let pair = self.issue_token_pair(user.id, &user.email).await?;

        let email = Arc::clone(&self.email);
        let to = user.email.clone();
        let name = user.full_name.clone();
        tokio::spawn(async move {
            if let Err(e) = email.send_welcome(&to, &name).await {
                tracing::warn!(error = %e, "failed to send welcome email");
            }
        });

        Ok((user, pair))
    }

    /// Authenticates a user and issues a token pair.
    ///
    /// The lockout flag is consulted before any credential work; a
    /// locked account fails immediately. Unknown-user and wrong-password
    /// produce the same error, with a dummy hash verification on the
    /// unknown-user path to equalize timing. When TOTP is enabled a code
    /// is mandatory; a one-time backup code is accepted in its place.
    ///
    /// # Errors
    ///
    /// Returns `LockedOut`, `InvalidCredentials`, `AccountDisabled`,
    /// `TotpRequired`, or `InvalidTotp` on the expected negative paths.
    pub async fn login(
        &self,
        request: &LoginRequest,
    ) -> Result<(users::Model, TokenPair), AuthError> {
        if self.tokens.is_locked_out(&request.email).await {
            tracing::warn!(email = %request.email, "login rejected, account locked");
            return Err(AuthError::LockedOut);
        }

        let Some(user) = self.users.find_by_email(&request.email).await? else {
            dummy_verify(&request.password);
            self.note_failed_attempt(&request.email).await;
            return Err(AuthError::InvalidCredentials);
        };

        if !user.is_active {
            tracing::warn!(user_id = %user.id, "login rejected, account disabled");
            return Err(AuthError::AccountDisabled);
        }

        if !verify_password(&request.password, &user.password_hash)? {
            tracing::info!(user_id = %user.id, "failed login attempt, invalid password");
            self.note_failed_attempt(&request.email).await;
            return Err(AuthError::InvalidCredentials);
        }

        if user.totp_enabled {
            let Some(code) = request.totp_code.as_deref() else {
                return Err(AuthError::TotpRequired);
            };
            if !self.two_factor.verify_second_factor(&user, code).await? {
                tracing::info!(user_id = %user.id, "failed login attempt, invalid second factor");
                return Err(AuthError::InvalidTotp);
            }
        }

        self.tokens.clear_failed_logins(&request.email).await;
        self.users.record_login(user.id).await?;

        let pair = self.issue_token_pair(user.id, &user.email).await?;
        tracing::info!(user_id = %user.id, "user logged in");

        Ok((user, pair))
    }

    /// Rotates a refresh token: the presented token is revoked and a new
    /// pair bound to the same identity is issued.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRefreshToken` for unknown, revoked, or expired
    /// tokens; both cases render identically to the caller.
    pub async fn refresh_tokens(&self, raw_refresh_token: &str) -> Result<TokenPair, AuthError> {
        match self.tokens.validate_refresh_token(raw_refresh_token).await {
            RefreshValidation::Valid(session) => {
                self.tokens.revoke_refresh_token(raw_refresh_token).await;
                self.issue_token_pair(session.user_id, &session.email).await
            }
            RefreshValidation::Expired | RefreshValidation::NotFound => {
                Err(AuthError::InvalidRefreshToken)
            }
        }
    }

    /// Revokes a refresh token. Always succeeds from the caller's
    /// perspective; revocation failures are logged inside the cache
    /// client.
    pub async fn logout(&self, raw_refresh_token: &str) {
        self.tokens.revoke_refresh_token(raw_refresh_token).await;
    }

    /// Begins a password reset.
    ///
    /// Unknown emails succeed silently so the endpoint is not a
    /// user-existence oracle. The raw token travels only into the email
    /// sink and is never logged.
    ///
    /// # Errors
    ///
    /// Returns an infrastructure error if the reset token cannot be
    /// persisted (fail closed: a link that could never validate must not
    /// be sent).
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            tracing::info!("password reset requested for unknown email");
            return Ok(());
        };

        let raw_token = self.tokens.create_password_reset_token(user.id).await?;

        self.audit
            .record(
                "password_reset_requested",
                serde_json::json!({ "user_id": user.id }),
            )
            .await;

        let email_service = Arc::clone(&self.email);
        let to = user.email.clone();
        let name = user.full_name.clone();
        tokio::spawn(async move {
            if let Err(e) = email_service
                .send_password_reset(&to, &name, &raw_token)
                .await
            {
                tracing::warn!(error = %e, "failed to send password reset email");
            }
        });

        Ok(())
    }

    /// Completes a password reset with a single-use token.
    ///
    /// On success the new password is screened (fail-open), re-hashed,
    /// stored, and every refresh session of the user is revoked, forcing
    /// re-authentication everywhere.
    ///
    /// # Errors
    ///
    /// Returns `InvalidResetToken` for unknown, spent, or expired tokens
    /// and `BreachedPassword` on a confirmed breach match.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let Some(user_id) = self.tokens.validate_password_reset_token(token).await else {
            return Err(AuthError::InvalidResetToken);
        };

        if self.breach.is_password_breached(new_password).await {
            return Err(AuthError::BreachedPassword);
        }

        let password_hash = hash_password(new_password)?;
        self.users.update_password(user_id, &password_hash).await?;
        self.tokens.revoke_all_user_sessions(user_id).await;

        tracing::info!(user_id = %user_id, "password reset completed");
        self.audit
            .record(
                "password_reset_completed",
                serde_json::json!({ "user_id": user_id }),
            )
            .await;

        Ok(())
    }

    /// Issues an access/refresh token pair for an identity.
    async fn issue_token_pair(&self, user_id: Uuid, email: &str) -> Result<TokenPair, AuthError> {
        let access_token = self.jwt.generate_access_token(user_id, email)?;
        let refresh_token = self.tokens.create_refresh_token(user_id, email).await?;

        Ok(TokenPair::new(
            access_token,
            refresh_token,
            self.jwt.access_token_expires_in(),
        ))
    }

    /// Counts a failed attempt and emits the lockout audit event when
    /// the threshold is crossed.
    async fn note_failed_attempt(&self, email: &str) {
        let outcome = self.tokens.record_failed_login(email).await;
        if outcome.locked {
            tracing::warn!(attempts = outcome.attempts, "account locked after repeated failures");
            self.audit
                .record(
                    "account_locked",
                    serde_json::json!({ "email": email, "attempts": outcome.attempts }),
                )
                .await;
        }
    }
}
