//! Post vote repository.

use std::sync::Arc;

use crate::entities::{PostVote, post_vote};
use quad_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, SqlErr,
    sea_query::Expr,
};

/// Post vote repository for database operations.
#[derive(Clone)]
pub struct PostVoteRepository {
    db: Arc<DatabaseConnection>,
}

impl PostVoteRepository {
    /// Create a new post vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the vote a pseudonym holds on a post.
    pub async fn find_by_post_and_voter(
        &self,
        post_id: &str,
        voter_pseudonym: &str,
    ) -> AppResult<Option<post_vote::Model>> {
        PostVote::find()
            .filter(post_vote::Column::PostId.eq(post_id))
            .filter(post_vote::Column::VoterPseudonym.eq(voter_pseudonym))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Record a new vote. A concurrent vote by the same pseudonym trips the
    /// unique index and surfaces as `Conflict`.
    pub async fn create(&self, model: post_vote::ActiveModel) -> AppResult<post_vote::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Vote already recorded for this pseudonym".to_string())
            }
            _ => AppError::Database(e.to_string()),
        })
    }

    /// Delete a vote only while it still holds the given value.
    ///
    /// Returns the number of rows deleted; 0 means a concurrent call
    /// changed or removed the vote first.
    pub async fn delete_if_value(
        &self,
        post_id: &str,
        voter_pseudonym: &str,
        value: post_vote::VoteValue,
    ) -> AppResult<u64> {
        let result = PostVote::delete_many()
            .filter(post_vote::Column::PostId.eq(post_id))
            .filter(post_vote::Column::VoterPseudonym.eq(voter_pseudonym))
            .filter(post_vote::Column::Value.eq(value))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Swap a vote's value only while it still holds the expected old value.
    ///
    /// Returns the number of rows updated; 0 means a concurrent call got
    /// there first.
    pub async fn swap_value(
        &self,
        post_id: &str,
        voter_pseudonym: &str,
        from: post_vote::VoteValue,
        to: post_vote::VoteValue,
    ) -> AppResult<u64> {
        let result = PostVote::update_many()
            .col_expr(post_vote::Column::Value, Expr::value(to))
            .filter(post_vote::Column::PostId.eq(post_id))
            .filter(post_vote::Column::VoterPseudonym.eq(voter_pseudonym))
            .filter(post_vote::Column::Value.eq(from))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
