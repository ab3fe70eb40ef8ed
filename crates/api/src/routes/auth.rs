//! Authentication routes: register, login, token refresh, logout, and
//! the password-reset pair.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;

use crate::AppState;
use florin_auth::AuthError;
use florin_db::entities::users;
use florin_shared::auth::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, LogoutRequest, MessageResponse,
    RefreshRequest, RegisterRequest, ResetPasswordRequest, UserInfo,
};

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

/// Maps an `AuthError` onto the JSON error envelope.
///
/// Server-side failures are logged in full and rendered with a generic
/// message; expected negative outcomes render their own (deliberately
/// terse) description.
pub(crate) fn error_response(context: &str, error: &AuthError) -> Response {
    let status = StatusCode::from_u16(error.to_app_error().status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let message = if status.is_server_error() {
        tracing::error!(error = %error, context, "request failed");
        format!("An error occurred during {context}")
    } else {
        error.to_string()
    };

    (
        status,
        Json(json!({ "error": error.error_code(), "message": message })),
    )
        .into_response()
}

fn user_info(user: &users::Model) -> UserInfo {
    UserInfo {
        id: user.id,
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        totp_enabled: user.totp_enabled,
    }
}

/// POST /auth/register - Create an account and return a token pair.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Response {
    match state.auth.register(&payload).await {
        Ok((user, pair)) => (
            StatusCode::CREATED,
            Json(AuthResponse {
                user: user_info(&user),
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
                expires_in: pair.expires_in,
            }),
        )
            .into_response(),
        Err(e) => error_response("registration", &e),
    }
}

/// POST /auth/login - Authenticate user and return tokens.
async fn login(State(state): State<AppState>, Json(payload): Json<LoginRequest>) -> Response {
    match state.auth.login(&payload).await {
        Ok((user, pair)) => (
            StatusCode::OK,
            Json(AuthResponse {
                user: user_info(&user),
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
                expires_in: pair.expires_in,
            }),
        )
            .into_response(),
        Err(e) => error_response("login", &e),
    }
}

/// POST /auth/refresh - Rotate a refresh token into a new pair.
async fn refresh(State(state): State<AppState>, Json(payload): Json<RefreshRequest>) -> Response {
    match state.auth.refresh_tokens(&payload.refresh_token).await {
        Ok(pair) => (StatusCode::OK, Json(pair)).into_response(),
        Err(e) => error_response("token refresh", &e),
    }
}

/// POST /auth/logout - Revoke a refresh token. Never fails user-visibly.
async fn logout(State(state): State<AppState>, Json(payload): Json<LogoutRequest>) -> Response {
    state.auth.logout(&payload.refresh_token).await;

    (
        StatusCode::OK,
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    )
        .into_response()
}

/// POST /auth/forgot-password - Begin a password reset.
///
/// Responds identically whether or not the email exists.
async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Response {
    match state.auth.forgot_password(&payload.email).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "If that email is registered, a reset link has been sent".to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response("password reset request", &e),
    }
}

/// POST /auth/reset-password - Complete a password reset.
async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Response {
    match state
        .auth
        .reset_password(&payload.token, &payload.new_password)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "Password has been reset".to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response("password reset", &e),
    }
}
