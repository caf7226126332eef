//! Create identity_audit table migration.
//!
//! No foreign keys: audit rows must survive deletion of the post or the
//! account they refer to.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IdentityAudit::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IdentityAudit::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(IdentityAudit::ActorId).string_len(32).not_null())
                    .col(ColumnDef::new(IdentityAudit::PostId).string_len(32).not_null())
                    .col(ColumnDef::new(IdentityAudit::Pseudonym).string_len(64).not_null())
                    .col(
                        ColumnDef::new(IdentityAudit::ResolvedAccountId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IdentityAudit::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: actor_id (per-moderator audit review)
        manager
            .create_index(
                Index::create()
                    .name("idx_identity_audit_actor_id")
                    .table(IdentityAudit::Table)
                    .col(IdentityAudit::ActorId)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (audit trail pagination)
        manager
            .create_index(
                Index::create()
                    .name("idx_identity_audit_created_at")
                    .table(IdentityAudit::Table)
                    .col(IdentityAudit::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(IdentityAudit::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum IdentityAudit {
    Table,
    Id,
    ActorId,
    PostId,
    Pseudonym,
    ResolvedAccountId,
    CreatedAt,
}
