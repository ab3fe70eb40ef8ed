//! `SeaORM` Entity for households table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "households")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
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
