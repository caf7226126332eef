//! Create post table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Post::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Post::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Post::AuthorPseudonym).string_len(64).not_null())
                    .col(ColumnDef::new(Post::DisplayAlias).string_len(256).not_null())
                    .col(ColumnDef::new(Post::IsAnonymous).boolean().not_null().default(true))
                    .col(ColumnDef::new(Post::Title).string_len(256))
                    .col(ColumnDef::new(Post::Text).text().not_null())
                    .col(ColumnDef::new(Post::ReplyId).string_len(32))
                    .col(ColumnDef::new(Post::UpVotes).integer().not_null().default(0))
                    .col(ColumnDef::new(Post::DownVotes).integer().not_null().default(0))
                    .col(ColumnDef::new(Post::ReportCount).integer().not_null().default(0))
                    .col(ColumnDef::new(Post::Flagged).boolean().not_null().default(false))
                    .col(ColumnDef::new(Post::Hidden).boolean().not_null().default(false))
                    .col(ColumnDef::new(Post::HiddenByModerator).boolean().not_null().default(false))
                    .col(ColumnDef::new(Post::RepliesCount).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Post::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Post::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_reply")
                            .from(Post::Table, Post::ReplyId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: author_pseudonym (ban propagation and identity resolution)
        manager
            .create_index(
                Index::create()
                    .name("idx_post_author_pseudonym")
                    .table(Post::Table)
                    .col(Post::AuthorPseudonym)
                    .to_owned(),
            )
            .await?;

        // Index: reply_id (listing comments under a post)
        manager
            .create_index(
                Index::create()
                    .name("idx_post_reply_id")
                    .table(Post::Table)
                    .col(Post::ReplyId)
                    .to_owned(),
            )
            .await?;

        // Index: flagged (moderation queue)
        manager
            .create_index(
                Index::create()
                    .name("idx_post_flagged")
                    .table(Post::Table)
                    .col(Post::Flagged)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (timeline pagination)
        manager
            .create_index(
                Index::create()
                    .name("idx_post_created_at")
                    .table(Post::Table)
                    .col(Post::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Post::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Post {
    Table,
    Id,
    AuthorPseudonym,
    DisplayAlias,
    IsAnonymous,
    Title,
    Text,
    ReplyId,
    UpVotes,
    DownVotes,
    ReportCount,
    Flagged,
    Hidden,
    HiddenByModerator,
    RepliesCount,
    CreatedAt,
    UpdatedAt,
}
