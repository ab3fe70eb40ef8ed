//! Access-token focused tests.

use crate::auth::Claims;
use crate::jwt::{JwtConfig, JwtError, JwtService};
use chrono::{Duration, Utc};
use uuid::Uuid;

fn test_service() -> JwtService {
    JwtService::new(JwtConfig {
        secret: "phase1-secret".to_string(),
        access_token_expires_secs: 900,
        issuer: "florin".to_string(),
        audience: "florin-app".to_string(),
    })
}

#[test]
fn claims_sets_expiration_and_iat() {
    let user = Uuid::new_v4();
    let expires_at = Utc::now() + Duration::minutes(30);
    let before = Utc::now().timestamp();
    let claims = Claims::new(user, "user@example.com", "florin", "florin-app", expires_at);
    let after = Utc::now().timestamp();

    assert_eq!(claims.sub, user);
    assert_eq!(claims.email, "user@example.com");
    assert!(claims.iat >= before);
    assert!(claims.iat <= after);
    assert_eq!(claims.exp, expires_at.timestamp());
}

#[test]
fn claims_for_different_users_are_distinct() {
    let expires_at = Utc::now() + Duration::hours(1);
    let first = Claims::new(
        Uuid::new_v4(),
        "a@example.com",
        "florin",
        "florin-app",
        expires_at,
    );
    let second = Claims::new(
        Uuid::new_v4(),
        "a@example.com",
        "florin",
        "florin-app",
        expires_at,
    );

    assert_ne!(first.sub, second.sub);
    assert_eq!(first.email, second.email);
}

#[test]
fn jwt_access_token_expiration_in_seconds() {
    let service = test_service();
    assert_eq!(service.access_token_expires_in(), 900);
}

#[test]
fn jwt_roundtrip_preserves_identity() {
    let service = test_service();
    let user = Uuid::new_v4();

    let token = service
        .generate_access_token(user, "round@example.com")
        .expect("access token");
    let claims = service.validate_token(&token).expect("claims");

    assert_eq!(claims.user_id(), user);
    assert_eq!(claims.email, "round@example.com");
}

#[test]
fn jwt_validation_fails_with_wrong_secret() {
    let service = test_service();
    let other_service = JwtService::new(JwtConfig {
        secret: "different-secret".to_string(),
        access_token_expires_secs: 900,
        issuer: "florin".to_string(),
        audience: "florin-app".to_string(),
    });

    let token = service
        .generate_access_token(Uuid::new_v4(), "user@example.com")
        .expect("token");

    assert!(matches!(
        other_service.validate_token(&token),
        Err(JwtError::DecodingError(_))
    ));
}

#[test]
fn jwt_validation_fails_with_wrong_issuer() {
    let service = test_service();
    let other_service = JwtService::new(JwtConfig {
        secret: "phase1-secret".to_string(),
        access_token_expires_secs: 900,
        issuer: "someone-else".to_string(),
        audience: "florin-app".to_string(),
    });

    let token = other_service
        .generate_access_token(Uuid::new_v4(), "user@example.com")
        .expect("token");

    assert!(service.validate_token(&token).is_err());
}
