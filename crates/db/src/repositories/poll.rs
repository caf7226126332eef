//! Poll repository.

use std::sync::Arc;

use crate::entities::{Poll, PollVote, poll, poll_vote};
use quad_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, SqlErr,
};

/// Poll repository for database operations.
#[derive(Clone)]
pub struct PollRepository {
    db: Arc<DatabaseConnection>,
}

impl PollRepository {
    /// Create a new poll repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a poll by post ID.
    pub async fn find_by_post_id(&self, post_id: &str) -> AppResult<Option<poll::Model>> {
        Poll::find_by_id(post_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a poll by post ID, returning error if not found.
    pub async fn get_by_post_id(&self, post_id: &str) -> AppResult<poll::Model> {
        self.find_by_post_id(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Poll not found for post: {post_id}")))
    }

    /// Create a new poll.
    pub async fn create(&self, model: poll::ActiveModel) -> AppResult<poll::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Post already has a poll".to_string())
            }
            _ => AppError::Database(e.to_string()),
        })
    }

    /// Update a poll.
    pub async fn update(&self, model: poll::ActiveModel) -> AppResult<poll::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// Poll ballot repository for database operations.
#[derive(Clone)]
pub struct PollVoteRepository {
    db: Arc<DatabaseConnection>,
}

impl PollVoteRepository {
    /// Create a new poll ballot repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the ballot a pseudonym cast on a poll.
    pub async fn find_by_post_and_voter(
        &self,
        post_id: &str,
        voter_pseudonym: &str,
    ) -> AppResult<Option<poll_vote::Model>> {
        PollVote::find()
            .filter(poll_vote::Column::PostId.eq(post_id))
            .filter(poll_vote::Column::VoterPseudonym.eq(voter_pseudonym))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Record a ballot. A concurrent ballot by the same pseudonym trips the
    /// unique index and surfaces as `Conflict`.
    pub async fn create(&self, model: poll_vote::ActiveModel) -> AppResult<poll_vote::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Ballot already cast by this pseudonym".to_string())
            }
            _ => AppError::Database(e.to_string()),
        })
    }

    /// List every ballot cast on a poll.
    pub async fn find_by_post(&self, post_id: &str) -> AppResult<Vec<poll_vote::Model>> {
        PollVote::find()
            .filter(poll_vote::Column::PostId.eq(post_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_poll(post_id: &str) -> poll::Model {
        poll::Model {
            post_id: post_id.to_string(),
            choices: serde_json::json!(["Tea", "Coffee"]),
            votes: serde_json::json!([0, 0]),
            voters_count: 0,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_post_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<poll::Model>::new()])
                .into_connection(),
        );

        let repo = PollRepository::new(db);
        let result = repo.get_by_post_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_by_post_id_found() {
        let poll = create_test_poll("p1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[poll.clone()]])
                .into_connection(),
        );

        let repo = PollRepository::new(db);
        let result = repo.find_by_post_id("p1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().voters_count, 0);
    }

    #[tokio::test]
    async fn test_create_ballot() {
        let ballot = poll_vote::Model {
            id: "b1".to_string(),
            post_id: "p1".to_string(),
            voter_pseudonym: "aaaa".to_string(),
            choice: 1,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[ballot.clone()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = PollVoteRepository::new(db);
        let model = poll_vote::ActiveModel {
            id: Set(ballot.id.clone()),
            post_id: Set(ballot.post_id.clone()),
            voter_pseudonym: Set(ballot.voter_pseudonym.clone()),
            choice: Set(ballot.choice),
            created_at: Set(ballot.created_at),
        };

        let created = repo.create(model).await.unwrap();
        assert_eq!(created.choice, 1);
    }

    #[tokio::test]
    async fn test_find_by_post_lists_ballots() {
        let ballots = vec![
            poll_vote::Model {
                id: "b1".to_string(),
                post_id: "p1".to_string(),
                voter_pseudonym: "aaaa".to_string(),
                choice: 0,
                created_at: Utc::now().into(),
            },
            poll_vote::Model {
                id: "b2".to_string(),
                post_id: "p1".to_string(),
                voter_pseudonym: "bbbb".to_string(),
                choice: 1,
                created_at: Utc::now().into(),
            },
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([ballots.clone()])
                .into_connection(),
        );

        let repo = PollVoteRepository::new(db);
        let found = repo.find_by_post("p1").await.unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[1].voter_pseudonym, "bbbb");
    }
}
