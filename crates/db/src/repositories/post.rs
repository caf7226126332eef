//! Post repository.

use std::sync::Arc;

use crate::entities::{Post, post};
use quad_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::Expr,
};

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get top-level posts for the board (paginated, newest first).
    pub async fn find_board(
        &self,
        limit: u64,
        until_id: Option<&str>,
        include_hidden: bool,
    ) -> AppResult<Vec<post::Model>> {
        let mut query = Post::find()
            .filter(post::Column::ReplyId.is_null())
            .order_by_desc(post::Column::Id)
            .limit(limit);

        if !include_hidden {
            query = query.filter(post::Column::Hidden.eq(false));
        }
        if let Some(until) = until_id {
            query = query.filter(post::Column::Id.lt(until));
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get comments under a post (oldest first).
    pub async fn find_replies(
        &self,
        post_id: &str,
        include_hidden: bool,
    ) -> AppResult<Vec<post::Model>> {
        let mut query = Post::find()
            .filter(post::Column::ReplyId.eq(post_id))
            .order_by_asc(post::Column::Id);

        if !include_hidden {
            query = query.filter(post::Column::Hidden.eq(false));
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get flagged posts for the moderation queue (paginated, newest first).
    pub async fn find_flagged(&self, limit: u64, offset: u64) -> AppResult<Vec<post::Model>> {
        Post::find()
            .filter(post::Column::Flagged.eq(true))
            .order_by_desc(post::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Increment the up-vote tally atomically (single UPDATE query, no fetch).
    pub async fn increment_up_votes(&self, post_id: &str) -> AppResult<()> {
        Post::update_many()
            .col_expr(
                post::Column::UpVotes,
                Expr::col(post::Column::UpVotes).add(1),
            )
            .filter(post::Column::Id.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement the up-vote tally atomically, flooring at zero.
    pub async fn decrement_up_votes(&self, post_id: &str) -> AppResult<()> {
        Post::update_many()
            .col_expr(
                post::Column::UpVotes,
                Expr::cust("GREATEST(up_votes - 1, 0)"),
            )
            .filter(post::Column::Id.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Increment the down-vote tally atomically (single UPDATE query, no fetch).
    pub async fn increment_down_votes(&self, post_id: &str) -> AppResult<()> {
        Post::update_many()
            .col_expr(
                post::Column::DownVotes,
                Expr::col(post::Column::DownVotes).add(1),
            )
            .filter(post::Column::Id.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement the down-vote tally atomically, flooring at zero.
    pub async fn decrement_down_votes(&self, post_id: &str) -> AppResult<()> {
        Post::update_many()
            .col_expr(
                post::Column::DownVotes,
                Expr::cust("GREATEST(down_votes - 1, 0)"),
            )
            .filter(post::Column::Id.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Increment the replies count atomically (single UPDATE query, no fetch).
    pub async fn increment_replies_count(&self, post_id: &str) -> AppResult<()> {
        Post::update_many()
            .col_expr(
                post::Column::RepliesCount,
                Expr::col(post::Column::RepliesCount).add(1),
            )
            .filter(post::Column::Id.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Increment the report tally atomically (single UPDATE query, no fetch).
    pub async fn increment_report_count(&self, post_id: &str) -> AppResult<()> {
        Post::update_many()
            .col_expr(
                post::Column::ReportCount,
                Expr::col(post::Column::ReportCount).add(1),
            )
            .filter(post::Column::Id.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Flip `flagged` to true once the report tally reaches the threshold.
    ///
    /// Returns whether this call performed the flip. The `flagged = false`
    /// filter makes the transition one-shot under concurrent reports.
    pub async fn mark_flagged_if_threshold(
        &self,
        post_id: &str,
        threshold: i32,
    ) -> AppResult<bool> {
        let result = Post::update_many()
            .col_expr(post::Column::Flagged, Expr::value(true))
            .filter(post::Column::Id.eq(post_id))
            .filter(post::Column::Flagged.eq(false))
            .filter(post::Column::ReportCount.gte(threshold))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Clear the flagged marker. Report rows and tallies are untouched.
    pub async fn unflag(&self, post_id: &str) -> AppResult<()> {
        Post::update_many()
            .col_expr(post::Column::Flagged, Expr::value(false))
            .filter(post::Column::Id.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Hide a post by explicit moderator action.
    pub async fn hide_by_moderator(&self, post_id: &str) -> AppResult<()> {
        Post::update_many()
            .col_expr(post::Column::Hidden, Expr::value(true))
            .col_expr(post::Column::HiddenByModerator, Expr::value(true))
            .filter(post::Column::Id.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Reverse a moderator hide. The post stays hidden when its author is
    /// still banned.
    pub async fn unhide_by_moderator(&self, post_id: &str, author_banned: bool) -> AppResult<()> {
        Post::update_many()
            .col_expr(post::Column::Hidden, Expr::value(author_banned))
            .col_expr(post::Column::HiddenByModerator, Expr::value(false))
            .filter(post::Column::Id.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Hide every post authored under a pseudonym (ban propagation).
    ///
    /// Idempotent; returns the number of newly hidden posts.
    pub async fn hide_all_by_pseudonym(&self, pseudonym: &str) -> AppResult<u64> {
        let result = Post::update_many()
            .col_expr(post::Column::Hidden, Expr::value(true))
            .filter(post::Column::AuthorPseudonym.eq(pseudonym))
            .filter(post::Column::Hidden.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Un-hide every post authored under a pseudonym, except posts hidden
    /// by an explicit moderator action (exact pre-ban visibility restore).
    pub async fn unhide_all_by_pseudonym(&self, pseudonym: &str) -> AppResult<u64> {
        let result = Post::update_many()
            .col_expr(post::Column::Hidden, Expr::value(false))
            .filter(post::Column::AuthorPseudonym.eq(pseudonym))
            .filter(post::Column::Hidden.eq(true))
            .filter(post::Column::HiddenByModerator.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
