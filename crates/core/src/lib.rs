//! Core authentication primitives for Florin.
//!
//! This crate contains pure logic with ZERO web or database dependencies.
//! Everything here is deterministic given its inputs (plus an OS RNG for
//! secret generation) and is exercised by the orchestration layer in
//! `florin-auth`.
//!
//! # Modules
//!
//! - `auth::password` - Argon2id hashing with memory-hard tuning
//! - `auth::totp` - time-based one-time-password primitives
//! - `auth::backup` - single-use backup code generation and hashing

pub mod auth;
