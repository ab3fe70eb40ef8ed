//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Token cache (Redis) configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Email configuration.
    #[serde(default)]
    pub email: EmailConfig,
    /// Security policy configuration.
    #[serde(default)]
    pub security: SecurityConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Token cache (Redis) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Redis connection URL.
    #[serde(default = "default_cache_url")]
    pub url: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: default_cache_url(),
        }
    }
}

fn default_cache_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Secret key for signing access tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
    /// Refresh token expiration in seconds.
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry_secs: u64,
    /// Issuer claim embedded in access tokens.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Audience claim embedded in access tokens.
    #[serde(default = "default_audience")]
    pub audience: String,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

fn default_refresh_token_expiry() -> u64 {
    2_592_000 // 30 days
}

fn default_issuer() -> String {
    "florin".to_string()
}

fn default_audience() -> String {
    "florin-app".to_string()
}

/// Email (SMTP) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SMTP server host.
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    /// SMTP server port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: String,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: String,
    /// From address for outgoing mail.
    #[serde(default = "default_from_email")]
    pub from_email: String,
    /// From display name for outgoing mail.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Base URL of the frontend, used to build links in emails.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
            frontend_url: default_frontend_url(),
        }
    }
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    1025
}

fn default_from_email() -> String {
    "no-reply@florin.app".to_string()
}

fn default_from_name() -> String {
    "Florin".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

/// Security policy configuration for login throttling, reset tokens,
/// breach screening, and TOTP.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Failed login attempts allowed before the account locks.
    #[serde(default = "default_max_login_attempts")]
    pub max_login_attempts: u64,
    /// Sliding window for counting failed attempts, in seconds.
    #[serde(default = "default_attempt_window")]
    pub login_attempt_window_secs: u64,
    /// Duration of the lockout once the threshold is crossed, in seconds.
    #[serde(default = "default_lockout")]
    pub lockout_secs: u64,
    /// Password reset token lifetime in seconds.
    #[serde(default = "default_reset_ttl")]
    pub password_reset_ttl_secs: u64,
    /// Whether to screen passwords against the breach corpus.
    #[serde(default = "default_breach_enabled")]
    pub breach_check_enabled: bool,
    /// Base URL of the k-anonymity breach range API.
    #[serde(default = "default_breach_api_url")]
    pub breach_api_url: String,
    /// Issuer name shown in authenticator apps.
    #[serde(default = "default_totp_issuer")]
    pub totp_issuer: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_login_attempts: default_max_login_attempts(),
            login_attempt_window_secs: default_attempt_window(),
            lockout_secs: default_lockout(),
            password_reset_ttl_secs: default_reset_ttl(),
            breach_check_enabled: default_breach_enabled(),
            breach_api_url: default_breach_api_url(),
            totp_issuer: default_totp_issuer(),
        }
    }
}

fn default_max_login_attempts() -> u64 {
    5
}

fn default_attempt_window() -> u64 {
    900 // 15 minutes
}

fn default_lockout() -> u64 {
    900 // 15 minutes
}

fn default_reset_ttl() -> u64 {
    3600 // 1 hour
}

fn default_breach_enabled() -> bool {
    true
}

fn default_breach_api_url() -> String {
    "https://api.pwnedpasswords.com/range".to_string()
}

fn default_totp_issuer() -> String {
    "Florin".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("FLORIN").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
