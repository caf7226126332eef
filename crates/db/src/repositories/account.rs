//! Account repository.

use std::sync::Arc;

use crate::entities::{Account, account};
use quad_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
    SqlErr, sea_query::Expr,
};

/// Account repository for database operations.
#[derive(Clone)]
pub struct AccountRepository {
    db: Arc<DatabaseConnection>,
}

impl AccountRepository {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an account by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<account::Model>> {
        Account::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an account by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<account::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(id.to_string()))
    }

    /// Find an account by email, case-insensitively.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<account::Model>> {
        Account::find()
            .filter(account::Column::EmailLower.eq(email.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an account by username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<account::Model>> {
        Account::find()
            .filter(account::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an account by bearer token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<account::Model>> {
        Account::find()
            .filter(account::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the account owning a pseudonym.
    pub async fn find_by_pseudonym(&self, pseudonym: &str) -> AppResult<Option<account::Model>> {
        Account::find()
            .filter(account::Column::Pseudonym.eq(pseudonym))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new account.
    pub async fn create(&self, model: account::ActiveModel) -> AppResult<account::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Email or username already registered".to_string())
            }
            _ => AppError::Database(e.to_string()),
        })
    }

    /// Update an account.
    pub async fn update(&self, model: account::ActiveModel) -> AppResult<account::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a derived pseudonym, but only if none is cached yet.
    ///
    /// Returns the number of rows written: 0 means another writer already
    /// set it and the caller must re-read. A unique-index violation means
    /// the pseudonym belongs to a different account.
    pub async fn set_pseudonym_if_absent(
        &self,
        account_id: &str,
        pseudonym: &str,
    ) -> AppResult<u64> {
        let result = Account::update_many()
            .col_expr(account::Column::Pseudonym, Expr::value(pseudonym))
            .filter(account::Column::Id.eq(account_id))
            .filter(account::Column::Pseudonym.is_null())
            .exec(self.db.as_ref())
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    AppError::Conflict("Pseudonym already taken by another account".to_string())
                }
                _ => AppError::Database(e.to_string()),
            })?;

        Ok(result.rows_affected)
    }

    /// Increment the flagged-content counter atomically (single UPDATE query, no fetch).
    pub async fn increment_reported_count(&self, account_id: &str) -> AppResult<()> {
        Account::update_many()
            .col_expr(
                account::Column::ReportedCount,
                Expr::col(account::Column::ReportedCount).add(1),
            )
            .filter(account::Column::Id.eq(account_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Set the ban flags on an account (single UPDATE query, no fetch).
    pub async fn set_ban_state(
        &self,
        account_id: &str,
        banned: bool,
        ban_expires_at: Option<chrono::DateTime<chrono::FixedOffset>>,
    ) -> AppResult<()> {
        Account::update_many()
            .col_expr(account::Column::IsBanned, Expr::value(banned))
            .col_expr(account::Column::BanExpiresAt, Expr::value(ban_expires_at))
            .filter(account::Column::Id.eq(account_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Find currently banned accounts.
    pub async fn find_banned(&self, limit: u64) -> AppResult<Vec<account::Model>> {
        Account::find()
            .filter(account::Column::IsBanned.eq(true))
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find temporarily banned accounts whose ban has expired.
    pub async fn find_expired_temp_bans(
        &self,
        now: chrono::DateTime<chrono::FixedOffset>,
        limit: u64,
    ) -> AppResult<Vec<account::Model>> {
        Account::find()
            .filter(account::Column::IsBanned.eq(true))
            .filter(account::Column::BanExpiresAt.is_not_null())
            .filter(account::Column::BanExpiresAt.lte(now))
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
