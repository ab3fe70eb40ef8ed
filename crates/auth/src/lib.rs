//! Authentication core for Florin.
//!
//! This crate composes the credential store (`florin-db`), the pure
//! auth primitives (`florin-core`), and a Redis-backed token cache into
//! the authentication surface of the application:
//!
//! - [`token_cache`] - refresh sessions, single-use reset tokens, login
//!   counters and lockout flags, all TTL-bounded in Redis
//! - [`two_factor`] - TOTP enrollment state machine and backup-code
//!   recovery
//! - [`breach`] - k-anonymity breach-password screening (fail-open)
//! - [`service`] - the orchestrator behind the HTTP handlers

pub mod breach;
pub mod error;
pub mod service;
pub mod token_cache;
pub mod two_factor;

pub use breach::BreachCheck;
pub use error::AuthError;
pub use service::AuthService;
pub use token_cache::{
    CacheError, FailedLoginOutcome, RefreshSession, RefreshValidation, TokenCache,
    TokenCacheSettings,
};
pub use two_factor::{TotpSetup, TwoFactorService};
