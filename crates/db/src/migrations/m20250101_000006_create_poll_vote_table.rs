//! Create poll_vote table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PollVote::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PollVote::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PollVote::PostId).string_len(32).not_null())
                    .col(ColumnDef::new(PollVote::VoterPseudonym).string_len(64).not_null())
                    .col(ColumnDef::new(PollVote::Choice).integer().not_null())
                    .col(
                        ColumnDef::new(PollVote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poll_vote_poll")
                            .from(PollVote::Table, PollVote::PostId)
                            .to(Poll::Table, Poll::PostId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (post_id, voter_pseudonym) - one ballot per pseudonym
        manager
            .create_index(
                Index::create()
                    .name("idx_poll_vote_post_voter")
                    .table(PollVote::Table)
                    .col(PollVote::PostId)
                    .col(PollVote::VoterPseudonym)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: post_id (recounting voters)
        manager
            .create_index(
                Index::create()
                    .name("idx_poll_vote_post_id")
                    .table(PollVote::Table)
                    .col(PollVote::PostId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PollVote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PollVote {
    Table,
    Id,
    PostId,
    VoterPseudonym,
    Choice,
    CreatedAt,
}

#[derive(Iden)]
enum Poll {
    Table,
    PostId,
}
