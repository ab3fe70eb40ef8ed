//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate is the credential store: it owns the durable user record
//! (password hash, TOTP material, activity flags) and the household
//! created alongside each registration. All ephemeral token state lives
//! in the token cache, not here.

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::UserRepository;

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
