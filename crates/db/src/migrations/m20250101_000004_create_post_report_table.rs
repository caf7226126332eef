//! Create post_report table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PostReport::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PostReport::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PostReport::PostId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(PostReport::ReporterPseudonym)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PostReport::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_report_post")
                            .from(PostReport::Table, PostReport::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (post_id, reporter_pseudonym) - reports are idempotent
        manager
            .create_index(
                Index::create()
                    .name("idx_post_report_post_reporter")
                    .table(PostReport::Table)
                    .col(PostReport::PostId)
                    .col(PostReport::ReporterPseudonym)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: post_id (listing reports on a post)
        manager
            .create_index(
                Index::create()
                    .name("idx_post_report_post_id")
                    .table(PostReport::Table)
                    .col(PostReport::PostId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PostReport::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PostReport {
    Table,
    Id,
    PostId,
    ReporterPseudonym,
    CreatedAt,
}

#[derive(Iden)]
enum Post {
    Table,
    Id,
}
