//! Identity audit entity. Append-only record of every de-anonymization.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Identity audit model. Rows are never updated or deleted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "identity_audit")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Staff account that performed the resolution.
    #[sea_orm(indexed)]
    pub actor_id: String,

    /// Post whose author was resolved.
    pub post_id: String,

    /// Pseudonym that was resolved.
    pub pseudonym: String,

    /// Account the pseudonym resolved to.
    pub resolved_account_id: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
