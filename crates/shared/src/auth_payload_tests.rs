//! Auth payload (de)serialization tests.

use crate::auth::{
    ForgotPasswordRequest, LoginRequest, LogoutRequest, RefreshRequest, RegisterRequest,
    ResetPasswordRequest, TokenPair, TotpCodeRequest,
};
use serde_json::json;

#[test]
fn token_pair_builder_sets_fields() {
    let pair = TokenPair::new("access".into(), "refresh".into(), 900);
    assert_eq!(pair.access_token, "access");
    assert_eq!(pair.refresh_token, "refresh");
    assert_eq!(pair.expires_in, 900);
}

#[test]
fn login_request_totp_code_defaults_to_none() {
    let json = json!({
        "email": "user@example.com",
        "password": "hunter2!"
    });
    let req: LoginRequest = serde_json::from_value(json).expect("deserialize request");
    assert!(req.totp_code.is_none());
}

#[test]
fn login_request_accepts_totp_code() {
    let json = json!({
        "email": "user@example.com",
        "password": "hunter2!",
        "totp_code": "123456"
    });
    let req: LoginRequest = serde_json::from_value(json).expect("deserialize request");
    assert_eq!(req.totp_code.as_deref(), Some("123456"));
}

#[test]
fn register_request_optional_fields_default_to_none() {
    let json = json!({
        "email": "user@example.com",
        "password": "Secure123!",
        "full_name": "User Example"
    });
    let req: RegisterRequest = serde_json::from_value(json).expect("deserialize request");
    assert!(req.locale.is_none());
    assert!(req.timezone.is_none());
}

#[test]
fn register_request_preserves_all_fields() {
    let req = RegisterRequest {
        email: "user@example.com".to_string(),
        password: "Secure123!".to_string(),
        full_name: "User Example".to_string(),
        locale: Some("en-GB".to_string()),
        timezone: Some("Europe/London".to_string()),
    };
    assert_eq!(req.email, "user@example.com");
    assert_eq!(req.locale.as_deref(), Some("en-GB"));
    assert_eq!(req.timezone.as_deref(), Some("Europe/London"));
}

#[test]
fn refresh_request_holds_token() {
    let req = RefreshRequest {
        refresh_token: "refresh-123".to_string(),
    };
    assert_eq!(req.refresh_token, "refresh-123");
}

#[test]
fn logout_request_carries_refresh_token() {
    let req = LogoutRequest {
        refresh_token: "logout-token".to_string(),
    };
    assert_eq!(req.refresh_token, "logout-token");
}

#[test]
fn forgot_password_request_keeps_email() {
    let req = ForgotPasswordRequest {
        email: "missing@example.com".to_string(),
    };
    assert_eq!(req.email, "missing@example.com");
}

#[test]
fn reset_password_request_keeps_token_and_password() {
    let req = ResetPasswordRequest {
        token: "reset-token".to_string(),
        new_password: "NewSecure123!".to_string(),
    };
    assert_eq!(req.token, "reset-token");
    assert_eq!(req.new_password, "NewSecure123!");
}

#[test]
fn totp_code_request_keeps_code() {
    let req = TotpCodeRequest {
        code: "654321".to_string(),
    };
    assert_eq!(req.code, "654321");
}
