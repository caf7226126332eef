//! Poll entity attached to a top-level post.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "poll")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub post_id: String,

    /// Poll choices (JSON array of strings); a choice's identity is its index.
    #[sea_orm(column_type = "Json")]
    pub choices: JsonValue,

    /// Vote counts per choice (JSON array of integers)
    #[sea_orm(column_type = "Json")]
    pub votes: JsonValue,

    /// Total number of unique voters
    pub voters_count: i32,

    /// When the poll expires (null for no expiration)
    #[sea_orm(nullable)]
    pub expires_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_delete = "Cascade"
    )]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
