//! User repository for database operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{household_users, households, users};

/// User repository for credential-store operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbErr> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Creates a new user together with their default personal household
    /// in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; nothing is persisted in
    /// that case.
    pub async fn create_with_default_household(
        &self,
        email: &str,
        password_hash: &str,
        full_name: &str,
        locale: Option<&str>,
        timezone: Option<&str>,
    ) -> Result<users::Model, DbErr> {
        let now = chrono::Utc::now().into();
        let txn = self.db.begin().await?;

        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            full_name: Set(full_name.to_string()),
            is_active: Set(true),
            totp_secret: Set(None),
            totp_temp_secret: Set(None),
            totp_enabled: Set(false),
            totp_backup_codes: Set(serde_json::json!([])),
            last_login_at: Set(None),
            locale: Set(locale.map(String::from)),
            timezone: Set(timezone.map(String::from)),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let user = user.insert(&txn).await?;

        let household = households::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(format!("{full_name}'s household")),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let household = household.insert(&txn).await?;

        let membership = household_users::ActiveModel {
            household_id: Set(household.id),
            user_id: Set(user.id),
            role: Set("owner".to_string()),
            created_at: Set(now),
        };
        membership.insert(&txn).await?;

        txn.commit().await?;

        Ok(user)
    }

    /// Replaces a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<(), DbErr> {
        let now = chrono::Utc::now().into();

        users::ActiveModel {
            id: Set(user_id),
            password_hash: Set(password_hash.to_string()),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        Ok(())
    }

    /// Stamps the last successful login time.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn record_login(&self, user_id: Uuid) -> Result<(), DbErr> {
        let now: chrono::DateTime<chrono::FixedOffset> = chrono::Utc::now().into();

        users::ActiveModel {
            id: Set(user_id),
            last_login_at: Set(Some(now)),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        Ok(())
    }

    /// Writes or clears the pending TOTP secret created during setup.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn set_totp_temp_secret(
        &self,
        user_id: Uuid,
        secret: Option<&str>,
    ) -> Result<(), DbErr> {
        let now = chrono::Utc::now().into();

        users::ActiveModel {
            id: Set(user_id),
            totp_temp_secret: Set(secret.map(String::from)),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        Ok(())
    }

    /// Promotes a pending secret to the active one: sets the secret,
    /// clears the temp field, marks TOTP enabled, and stores the hashed
    /// backup codes.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn enable_totp(
        &self,
        user_id: Uuid,
        secret: &str,
        backup_code_hashes: &[String],
    ) -> Result<(), DbErr> {
        let now = chrono::Utc::now().into();

        users::ActiveModel {
            id: Set(user_id),
            totp_secret: Set(Some(secret.to_string())),
            totp_temp_secret: Set(None),
            totp_enabled: Set(true),
            totp_backup_codes: Set(serde_json::json!(backup_code_hashes)),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        Ok(())
    }

    /// Clears all TOTP material and disables the second factor.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn disable_totp(&self, user_id: Uuid) -> Result<(), DbErr> {
        let now = chrono::Utc::now().into();

        users::ActiveModel {
            id: Set(user_id),
            totp_secret: Set(None),
            totp_temp_secret: Set(None),
            totp_enabled: Set(false),
            totp_backup_codes: Set(serde_json::json!([])),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        Ok(())
    }

    /// Replaces the stored backup-code hashes (after one is consumed).
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn set_backup_codes(
        &self,
        user_id: Uuid,
        backup_code_hashes: &[String],
    ) -> Result<(), DbErr> {
        let now = chrono::Utc::now().into();

        users::ActiveModel {
            id: Set(user_id),
            totp_backup_codes: Set(serde_json::json!(backup_code_hashes)),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        Ok(())
    }
}
