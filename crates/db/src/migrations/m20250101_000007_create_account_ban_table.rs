//! Create account_ban table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AccountBan::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountBan::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccountBan::AccountId).string_len(32).not_null())
                    .col(ColumnDef::new(AccountBan::ModeratorId).string_len(32).not_null())
                    .col(ColumnDef::new(AccountBan::Reason).text().not_null())
                    .col(
                        ColumnDef::new(AccountBan::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(AccountBan::ExpiresAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(AccountBan::LiftedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(AccountBan::LiftedBy).string_len(32))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_ban_account")
                            .from(AccountBan::Table, AccountBan::AccountId)
                            .to(Account::Table, Account::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: account_id (ban history and active-ban lookup)
        manager
            .create_index(
                Index::create()
                    .name("idx_account_ban_account_id")
                    .table(AccountBan::Table)
                    .col(AccountBan::AccountId)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (history pagination)
        manager
            .create_index(
                Index::create()
                    .name("idx_account_ban_created_at")
                    .table(AccountBan::Table)
                    .col(AccountBan::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AccountBan::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AccountBan {
    Table,
    Id,
    AccountId,
    ModeratorId,
    Reason,
    CreatedAt,
    ExpiresAt,
    LiftedAt,
    LiftedBy,
}

#[derive(Iden)]
enum Account {
    Table,
    Id,
}
