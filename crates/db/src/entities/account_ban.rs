//! Account ban record entity. History rows are kept after the ban is lifted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account ban model.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "account_ban")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The banned account.
    #[sea_orm(indexed)]
    pub account_id: String,

    /// Staff account that imposed the ban.
    pub moderator_id: String,

    pub reason: String,

    pub created_at: DateTimeWithTimeZone,

    /// Expiry for temporary bans, None for permanent.
    #[sea_orm(nullable)]
    pub expires_at: Option<DateTimeWithTimeZone>,

    /// When the ban was lifted, if it has been.
    #[sea_orm(nullable)]
    pub lifted_at: Option<DateTimeWithTimeZone>,

    /// Staff account that lifted the ban ("system" for expiry sweeps).
    #[sea_orm(nullable)]
    pub lifted_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id",
        on_delete = "Cascade"
    )]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this ban is still in force at `now`.
    #[must_use]
    pub fn is_active(&self, now: DateTimeWithTimeZone) -> bool {
        if self.lifted_at.is_some() {
            return false;
        }
        match self.expires_at {
            Some(expires) => expires > now,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn ban(expires_at: Option<DateTimeWithTimeZone>, lifted: bool) -> Model {
        Model {
            id: "ban1".to_string(),
            account_id: "acct1".to_string(),
            moderator_id: "mod1".to_string(),
            reason: "Harassment".to_string(),
            created_at: Utc::now().into(),
            expires_at,
            lifted_at: lifted.then(|| Utc::now().into()),
            lifted_by: lifted.then(|| "mod1".to_string()),
        }
    }

    #[test]
    fn test_permanent_ban_is_active() {
        assert!(ban(None, false).is_active(Utc::now().into()));
    }

    #[test]
    fn test_lifted_ban_is_not_active() {
        assert!(!ban(None, true).is_active(Utc::now().into()));
    }

    #[test]
    fn test_expired_ban_is_not_active() {
        let expired = ban(Some((Utc::now() - Duration::hours(1)).into()), false);
        assert!(!expired.is_active(Utc::now().into()));
    }

    #[test]
    fn test_future_expiry_is_active() {
        let active = ban(Some((Utc::now() + Duration::hours(1)).into()), false);
        assert!(active.is_active(Utc::now().into()));
    }
}
