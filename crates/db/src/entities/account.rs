//! Account entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role for permission checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum AccountRole {
    #[sea_orm(string_value = "member")]
    #[default]
    Member,
    #[sea_orm(string_value = "moderator")]
    Moderator,
    #[sea_orm(string_value = "administrator")]
    Administrator,
}

impl AccountRole {
    /// Whether this role can moderate content and accounts.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        matches!(self, Self::Moderator | Self::Administrator)
    }
}

/// Account model.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "account")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Verified college email address, stored as entered.
    #[sea_orm(unique)]
    pub email: String,

    /// Lowercased email for case-insensitive lookup.
    #[sea_orm(unique)]
    pub email_lower: String,

    /// Public handle shown on non-anonymous surfaces.
    #[sea_orm(unique)]
    pub username: String,

    /// Display name; changing it never affects the pseudonym.
    #[sea_orm(nullable)]
    pub display_name: Option<String>,

    /// Argon2 password hash.
    pub password_hash: String,

    /// Bearer token for API authentication.
    #[sea_orm(unique)]
    pub token: String,

    /// Cached derived pseudonym; `None` until the account first writes.
    #[sea_orm(unique, nullable)]
    pub pseudonym: Option<String>,

    pub role: AccountRole,

    /// How many of this account's posts crossed the auto-flag threshold.
    #[sea_orm(default_value = 0)]
    pub reported_count: i32,

    #[sea_orm(default_value = false)]
    pub is_banned: bool,

    /// Expiry for temporary bans; `None` while banned means permanent.
    #[sea_orm(nullable)]
    pub ban_expires_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::account_ban::Entity")]
    AccountBan,
}

impl Related<super::account_ban::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountBan.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_staff_check() {
        assert!(!AccountRole::Member.is_staff());
        assert!(AccountRole::Moderator.is_staff());
        assert!(AccountRole::Administrator.is_staff());
    }

    #[test]
    fn test_role_default_is_member() {
        assert_eq!(AccountRole::default(), AccountRole::Member);
    }
}
