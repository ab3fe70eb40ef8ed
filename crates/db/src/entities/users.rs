//! `SeaORM` Entity for users table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub is_active: bool,
    /// Active TOTP secret (base32). `None` while the second factor is
    /// disabled.
    pub totp_secret: Option<String>,
    /// Pending secret written during setup, promoted on enablement.
    pub totp_temp_secret: Option<String>,
    pub totp_enabled: bool,
    /// SHA-256 hashes of unused backup codes (JSON array of strings).
    #[sea_orm(column_type = "JsonBinary")]
    pub totp_backup_codes: Json,
    pub last_login_at: Option<DateTimeWithTimeZone>,
    pub locale: Option<String>,
    pub timezone: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::household_users::Entity")]
    HouseholdUsers,
}

impl Related<super::household_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HouseholdUsers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
