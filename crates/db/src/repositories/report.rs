//! Post report repository.

use std::sync::Arc;

use crate::entities::{PostReport, post_report};
use quad_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, SqlErr,
};

/// Post report repository for database operations.
#[derive(Clone)]
pub struct PostReportRepository {
    db: Arc<DatabaseConnection>,
}

impl PostReportRepository {
    /// Create a new post report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the report a pseudonym filed against a post.
    pub async fn find_by_post_and_reporter(
        &self,
        post_id: &str,
        reporter_pseudonym: &str,
    ) -> AppResult<Option<post_report::Model>> {
        PostReport::find()
            .filter(post_report::Column::PostId.eq(post_id))
            .filter(post_report::Column::ReporterPseudonym.eq(reporter_pseudonym))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether a pseudonym has already reported a post.
    pub async fn has_reported(&self, post_id: &str, reporter_pseudonym: &str) -> AppResult<bool> {
        Ok(self
            .find_by_post_and_reporter(post_id, reporter_pseudonym)
            .await?
            .is_some())
    }

    /// Record a new report. A concurrent report by the same pseudonym trips
    /// the unique index and surfaces as `Conflict`.
    pub async fn create(&self, model: post_report::ActiveModel) -> AppResult<post_report::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Report already filed by this pseudonym".to_string())
            }
            _ => AppError::Database(e.to_string()),
        })
    }

    /// Count distinct reports against a post.
    pub async fn count_by_post(&self, post_id: &str) -> AppResult<u64> {
        PostReport::find()
            .filter(post_report::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List reports against a post (oldest first).
    pub async fn find_by_post(&self, post_id: &str, limit: u64) -> AppResult<Vec<post_report::Model>> {
        PostReport::find()
            .filter(post_report::Column::PostId.eq(post_id))
            .order_by_asc(post_report::Column::Id)
            .limit(limit)
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

    fn create_test_report(id: &str, post_id: &str, reporter: &str) -> post_report::Model {
        post_report::Model {
            id: id.to_string(),
            post_id: post_id.to_string(),
            reporter_pseudonym: reporter.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_has_reported_true() {
        let report = create_test_report("r1", "p1", "aaaa");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[report.clone()]])
                .into_connection(),
        );

        let repo = PostReportRepository::new(db);
        assert!(repo.has_reported("p1", "aaaa").await.unwrap());
    }

    #[tokio::test]
    async fn test_has_reported_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post_report::Model>::new()])
                .into_connection(),
        );

        let repo = PostReportRepository::new(db);
        assert!(!repo.has_reported("p1", "bbbb").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_report() {
        let report = create_test_report("r1", "p1", "aaaa");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[report.clone()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = PostReportRepository::new(db);
        let model = post_report::ActiveModel {
            id: Set(report.id.clone()),
            post_id: Set(report.post_id.clone()),
            reporter_pseudonym: Set(report.reporter_pseudonym.clone()),
            created_at: Set(report.created_at),
        };

        let created = repo.create(model).await.unwrap();
        assert_eq!(created.post_id, "p1");
    }

    #[tokio::test]
    async fn test_count_by_post() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3))
                }]])
                .into_connection(),
        );

        let repo = PostReportRepository::new(db);
        let count = repo.count_by_post("p1").await.unwrap();

        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_find_by_post() {
        let r1 = create_test_report("r1", "p1", "aaaa");
        let r2 = create_test_report("r2", "p1", "bbbb");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[r1, r2]])
                .into_connection(),
        );

        let repo = PostReportRepository::new(db);
        let reports = repo.find_by_post("p1", 50).await.unwrap();

        assert_eq!(reports.len(), 2);
    }
}
