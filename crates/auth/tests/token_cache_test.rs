//! Integration tests for the token cache client.
//!
//! These run against a real Redis instance (`REDIS_URL`, defaulting to
//! localhost) and are ignored by default so the suite stays hermetic.

use redis::aio::ConnectionManager;
use uuid::Uuid;

use florin_auth::{RefreshValidation, TokenCache, TokenCacheSettings};

/// Get Redis URL from environment or use default.
fn get_redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}

async fn create_cache() -> TokenCache {
    let client = redis::Client::open(get_redis_url()).expect("Failed to parse Redis URL");
    let conn = ConnectionManager::new(client)
        .await
        .expect("Failed to connect to Redis");

    TokenCache::new(conn, TokenCacheSettings::default())
}

async fn create_throttled_cache(max_attempts: u64) -> TokenCache {
    let client = redis::Client::open(get_redis_url()).expect("Failed to parse Redis URL");
    let conn = ConnectionManager::new(client)
        .await
        .expect("Failed to connect to Redis");

    TokenCache::new(
        conn,
        TokenCacheSettings {
            max_attempts,
            ..TokenCacheSettings::default()
        },
    )
}

#[tokio::test]
#[ignore = "requires a running Redis (set REDIS_URL)"]
async fn test_refresh_token_roundtrip() {
    let cache = create_cache().await;
    let user_id = Uuid::new_v4();

    let raw = cache
        .create_refresh_token(user_id, "roundtrip@example.com")
        .await
        .expect("Failed to create refresh token");

    // 256 bits, hex encoded
    assert_eq!(raw.len(), 64);

    match cache.validate_refresh_token(&raw).await {
        RefreshValidation::Valid(session) => {
            assert_eq!(session.user_id, user_id);
            assert_eq!(session.email, "roundtrip@example.com");
            assert!(session.expires_at > session.created_at);
        }
        other => panic!("expected valid session, got {other:?}"),
    }
}

#[tokio::test]
#[ignore = "requires a running Redis (set REDIS_URL)"]
async fn test_unknown_refresh_token_is_not_found() {
    let cache = create_cache().await;

    let result = cache.validate_refresh_token("not-a-real-token").await;
    assert_eq!(result, RefreshValidation::NotFound);
}

#[tokio::test]
#[ignore = "requires a running Redis (set REDIS_URL)"]
async fn test_revoked_refresh_token_fails_validation() {
    let cache = create_cache().await;
    let user_id = Uuid::new_v4();

    let raw = cache
        .create_refresh_token(user_id, "revoke@example.com")
        .await
        .expect("Failed to create refresh token");

    cache.revoke_refresh_token(&raw).await;

    assert_eq!(
        cache.validate_refresh_token(&raw).await,
        RefreshValidation::NotFound
    );
}

#[tokio::test]
#[ignore = "requires a running Redis (set REDIS_URL)"]
async fn test_revoke_all_user_sessions() {
    let cache = create_cache().await;
    let user_id = Uuid::new_v4();

    let mut tokens = Vec::new();
    for _ in 0..3 {
        tokens.push(
            cache
                .create_refresh_token(user_id, "bulk@example.com")
                .await
                .expect("Failed to create refresh token"),
        );
    }

    cache.revoke_all_user_sessions(user_id).await;

    for raw in &tokens {
        assert_eq!(
            cache.validate_refresh_token(raw).await,
            RefreshValidation::NotFound
        );
    }
}

#[tokio::test]
#[ignore = "requires a running Redis (set REDIS_URL)"]
async fn test_reset_token_is_single_use() {
    let cache = create_cache().await;
    let user_id = Uuid::new_v4();

    let raw = cache
        .create_password_reset_token(user_id)
        .await
        .expect("Failed to create reset token");

    // First validation succeeds and consumes the record.
    assert_eq!(
        cache.validate_password_reset_token(&raw).await,
        Some(user_id)
    );

    // Second validation with the same raw token fails, well before TTL.
    assert_eq!(cache.validate_password_reset_token(&raw).await, None);
}

#[tokio::test]
#[ignore = "requires a running Redis (set REDIS_URL)"]
async fn test_lockout_after_threshold() {
    let cache = create_throttled_cache(3).await;
    let email = format!("lockout-{}@example.com", Uuid::new_v4());

    assert!(!cache.is_locked_out(&email).await);

    let first = cache.record_failed_login(&email).await;
    assert_eq!(first.attempts, 1);
    assert!(!first.locked);

    let second = cache.record_failed_login(&email).await;
    assert!(!second.locked);

    let third = cache.record_failed_login(&email).await;
    assert!(third.locked);

    assert!(cache.is_locked_out(&email).await);
}

#[tokio::test]
#[ignore = "requires a running Redis (set REDIS_URL)"]
async fn test_clearing_attempts_resets_the_counter() {
    let cache = create_throttled_cache(3).await;
    let email = format!("clear-{}@example.com", Uuid::new_v4());

    cache.record_failed_login(&email).await;
    cache.record_failed_login(&email).await;
    cache.clear_failed_logins(&email).await;

    // Counter starts over; one more failure is attempt 1, not 3.
    let outcome = cache.record_failed_login(&email).await;
    assert_eq!(outcome.attempts, 1);
    assert!(!outcome.locked);
    assert!(!cache.is_locked_out(&email).await);
}
