//! Create post_vote table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PostVote::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PostVote::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PostVote::PostId).string_len(32).not_null())
                    .col(ColumnDef::new(PostVote::VoterPseudonym).string_len(64).not_null())
                    .col(ColumnDef::new(PostVote::Value).string_len(8).not_null())
                    .col(
                        ColumnDef::new(PostVote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_vote_post")
                            .from(PostVote::Table, PostVote::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (post_id, voter_pseudonym) - one vote per pseudonym per post
        manager
            .create_index(
                Index::create()
                    .name("idx_post_vote_post_voter")
                    .table(PostVote::Table)
                    .col(PostVote::PostId)
                    .col(PostVote::VoterPseudonym)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: post_id (listing votes on a post)
        manager
            .create_index(
                Index::create()
                    .name("idx_post_vote_post_id")
                    .table(PostVote::Table)
                    .col(PostVote::PostId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PostVote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PostVote {
    Table,
    Id,
    PostId,
    VoterPseudonym,
    Value,
    CreatedAt,
}

#[derive(Iden)]
enum Post {
    Table,
    Id,
}
