//! Repository abstractions for data access.

pub mod user;

pub use user::UserRepository;
