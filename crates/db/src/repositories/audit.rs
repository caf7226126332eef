//! Identity audit repository. Append-only.

use std::sync::Arc;

use crate::entities::{IdentityAudit, identity_audit};
use quad_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

/// Identity audit repository for database operations.
#[derive(Clone)]
pub struct IdentityAuditRepository {
    db: Arc<DatabaseConnection>,
}

impl IdentityAuditRepository {
    /// Create a new identity audit repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append an audit record.
    pub async fn create(
        &self,
        model: identity_audit::ActiveModel,
    ) -> AppResult<identity_audit::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List audit records (paginated, newest first).
    pub async fn find_recent(
        &self,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<identity_audit::Model>> {
        IdentityAudit::find()
            .order_by_desc(identity_audit::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List audit records for one staff actor (newest first).
    pub async fn find_by_actor(
        &self,
        actor_id: &str,
        limit: u64,
    ) -> AppResult<Vec<identity_audit::Model>> {
        IdentityAudit::find()
            .filter(identity_audit::Column::ActorId.eq(actor_id))
            .order_by_desc(identity_audit::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
