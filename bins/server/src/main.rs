//! Florin API Server
//!
//! Main entry point for the Florin backend service.

use std::sync::Arc;

use redis::aio::ConnectionManager;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use florin_api::{AppState, create_router};
use florin_auth::{AuthService, BreachCheck, TokenCache, TokenCacheSettings, TwoFactorService};
use florin_db::{UserRepository, connect};
use florin_shared::jwt::JwtConfig;
use florin_shared::{AppConfig, AuditSink, EmailService, JwtService, TracingAuditSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "florin=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Connect to the token cache
    let redis_client = redis::Client::open(config.cache.url.as_str())?;
    let redis_conn = ConnectionManager::new(redis_client).await?;
    info!("Connected to token cache");

    let token_cache = TokenCache::new(
        redis_conn,
        TokenCacheSettings {
            refresh_ttl_secs: config.jwt.refresh_token_expiry_secs,
            reset_ttl_secs: config.security.password_reset_ttl_secs,
            attempt_window_secs: config.security.login_attempt_window_secs,
            lockout_secs: config.security.lockout_secs,
            max_attempts: config.security.max_login_attempts,
        },
    );

    // Create JWT service
    let jwt_config = JwtConfig {
        secret: config.jwt.secret.clone(),
        #[allow(clippy::cast_possible_wrap)]
        access_token_expires_secs: config.jwt.access_token_expiry_secs as i64,
        issuer: config.jwt.issuer.clone(),
        audience: config.jwt.audience.clone(),
    };
    let jwt_service = Arc::new(JwtService::new(jwt_config));

    // Create email service
    let email_service = Arc::new(EmailService::new(config.email.clone()));
    info!(
        smtp_host = %config.email.smtp_host,
        smtp_port = %config.email.smtp_port,
        "Email service configured"
    );

    // Wire the authentication subsystem
    let audit: Arc<dyn AuditSink> = Arc::new(TracingAuditSink);
    let users = UserRepository::new(db);
    let two_factor = TwoFactorService::new(
        users.clone(),
        Arc::clone(&audit),
        config.security.totp_issuer.clone(),
    );
    let breach = BreachCheck::new(&config.security)?;

    let auth = AuthService::new(
        users,
        token_cache,
        two_factor.clone(),
        breach,
        Arc::clone(&jwt_service),
        email_service,
        audit,
    );

    // Create application state
    let state = AppState {
        auth: Arc::new(auth),
        two_factor: Arc::new(two_factor),
        jwt: jwt_service,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
