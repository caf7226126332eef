//! Post entity. A comment is a post with `reply_id` set.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Post model.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Pseudonym of the author. Posts never carry an account id.
    #[sea_orm(indexed)]
    pub author_pseudonym: String,

    /// Name shown to readers, frozen at creation time.
    pub display_alias: String,

    /// Whether the author chose the anonymous alias over their display name.
    pub is_anonymous: bool,

    /// Title for top-level posts; comments have none.
    #[sea_orm(nullable)]
    pub title: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub text: String,

    /// Parent post id when this post is a comment.
    #[sea_orm(nullable, indexed)]
    pub reply_id: Option<String>,

    #[sea_orm(default_value = 0)]
    pub up_votes: i32,

    #[sea_orm(default_value = 0)]
    pub down_votes: i32,

    /// Count of distinct reports against this post.
    #[sea_orm(default_value = 0)]
    pub report_count: i32,

    /// Set once the report count crosses the auto-flag threshold.
    #[sea_orm(default_value = false)]
    pub flagged: bool,

    /// Hidden from ordinary readers (moderator action or author ban).
    #[sea_orm(default_value = false)]
    pub hidden: bool,

    /// Hidden by an explicit moderator action, as opposed to a ban.
    #[sea_orm(default_value = false)]
    pub hidden_by_moderator: bool,

    #[sea_orm(default_value = 0)]
    pub replies_count: i32,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post_vote::Entity")]
    PostVote,
    #[sea_orm(has_many = "super::post_report::Entity")]
    PostReport,
    #[sea_orm(has_one = "super::poll::Entity")]
    Poll,
}

impl Related<super::post_vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostVote.def()
    }
}

impl Related<super::post_report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostReport.def()
    }
}

impl Related<super::poll::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Poll.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
