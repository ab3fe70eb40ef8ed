//! `SeaORM` entity definitions.

pub mod household_users;
pub mod households;
pub mod users;
