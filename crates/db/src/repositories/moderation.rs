//! Moderation repository for account ban records.

use std::sync::Arc;

use crate::entities::{AccountBan, account_ban};
use quad_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

/// Moderation repository for database operations.
#[derive(Clone)]
pub struct ModerationRepository {
    db: Arc<DatabaseConnection>,
}

impl ModerationRepository {
    /// Create a new moderation repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a ban record.
    pub async fn create_ban(&self, model: account_ban::ActiveModel) -> AppResult<account_ban::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the ban currently in force against an account, if any.
    pub async fn find_active_ban(&self, account_id: &str) -> AppResult<Option<account_ban::Model>> {
        let now = chrono::Utc::now();

        AccountBan::find()
            .filter(account_ban::Column::AccountId.eq(account_id))
            .filter(account_ban::Column::LiftedAt.is_null())
            .filter(
                account_ban::Column::ExpiresAt
                    .is_null()
                    .or(account_ban::Column::ExpiresAt.gt(now)),
            )
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a ban record (lifting writes `lifted_at`/`lifted_by`).
    pub async fn update_ban(&self, model: account_ban::ActiveModel) -> AppResult<account_ban::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Ban history for an account (newest first).
    pub async fn find_bans_for_account(
        &self,
        account_id: &str,
    ) -> AppResult<Vec<account_ban::Model>> {
        AccountBan::find()
            .filter(account_ban::Column::AccountId.eq(account_id))
            .order_by_desc(account_ban::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List bans currently in force (paginated, newest first).
    pub async fn find_active_bans(
        &self,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<account_ban::Model>> {
        let now = chrono::Utc::now();

        AccountBan::find()
            .filter(account_ban::Column::LiftedAt.is_null())
            .filter(
                account_ban::Column::ExpiresAt
                    .is_null()
                    .or(account_ban::Column::ExpiresAt.gt(now)),
            )
            .order_by_desc(account_ban::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
