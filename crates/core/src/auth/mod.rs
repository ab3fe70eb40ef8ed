//! Authentication primitives.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - TOTP secret generation, provisioning, and verification
//! - One-time backup codes

pub mod backup;
pub mod password;
pub mod totp;

#[cfg(test)]
mod backup_props;

pub use backup::{
    BACKUP_CODE_COUNT, BACKUP_CODE_LENGTH, consume_backup_code, generate_backup_codes,
    hash_backup_code, hash_backup_codes,
};
pub use password::{PasswordError, dummy_verify, hash_password, verify_password};
pub use totp::{TotpError, generate_secret, provisioning_url, qr_png_base64, verify_code};
