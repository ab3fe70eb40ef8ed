//! Second-factor routes: TOTP setup, enablement, and disablement.
//!
//! All routes here sit behind the bearer middleware.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};

use crate::AppState;
use crate::middleware::auth::AuthUser;
use crate::routes::auth::error_response;
use florin_shared::auth::{
    MessageResponse, TotpCodeRequest, TotpEnableResponse, TotpSetupResponse,
};

/// Creates the second-factor router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/2fa/setup", post(setup))
        .route("/auth/2fa/enable", post(enable))
        .route("/auth/2fa/disable", post(disable))
}

/// POST /auth/2fa/setup - Start TOTP enrollment.
async fn setup(State(state): State<AppState>, user: AuthUser) -> Response {
    match state.two_factor.setup_totp(user.user_id()).await {
        Ok(setup) => (
            StatusCode::OK,
            Json(TotpSetupResponse {
                secret: setup.secret,
                otpauth_url: setup.otpauth_url,
                qr_png_base64: setup.qr_png_base64,
            }),
        )
            .into_response(),
        Err(e) => error_response("two-factor setup", &e),
    }
}

/// POST /auth/2fa/enable - Confirm enrollment with a code; returns the
/// one-time backup codes (shown exactly once).
async fn enable(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<TotpCodeRequest>,
) -> Response {
    match state
        .two_factor
        .enable_totp(user.user_id(), &payload.code)
        .await
    {
        Ok(backup_codes) => {
            (StatusCode::OK, Json(TotpEnableResponse { backup_codes })).into_response()
        }
        Err(e) => error_response("two-factor enablement", &e),
    }
}

/// POST /auth/2fa/disable - Turn the second factor off.
async fn disable(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<TotpCodeRequest>,
) -> Response {
    match state
        .two_factor
        .disable_totp(user.user_id(), &payload.code)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "Two-factor authentication disabled".to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response("two-factor disablement", &e),
    }
}
