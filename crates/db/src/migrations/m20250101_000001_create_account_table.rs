//! Create account table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Account::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Account::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Account::Email).string_len(320).not_null())
                    .col(ColumnDef::new(Account::EmailLower).string_len(320).not_null())
                    .col(ColumnDef::new(Account::Username).string_len(64).not_null())
                    .col(ColumnDef::new(Account::DisplayName).string_len(256))
                    .col(ColumnDef::new(Account::PasswordHash).string_len(256).not_null())
                    .col(ColumnDef::new(Account::Token).string_len(64).not_null())
                    .col(ColumnDef::new(Account::Pseudonym).string_len(64))
                    .col(ColumnDef::new(Account::Role).string_len(16).not_null().default("member"))
                    .col(ColumnDef::new(Account::ReportedCount).integer().not_null().default(0))
                    .col(ColumnDef::new(Account::IsBanned).boolean().not_null().default(false))
                    .col(ColumnDef::new(Account::BanExpiresAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Account::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Account::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Unique index: email_lower (case-insensitive email lookup)
        manager
            .create_index(
                Index::create()
                    .name("idx_account_email_lower")
                    .table(Account::Table)
                    .col(Account::EmailLower)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unique index: username
        manager
            .create_index(
                Index::create()
                    .name("idx_account_username")
                    .table(Account::Table)
                    .col(Account::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unique index: token (bearer-token authentication)
        manager
            .create_index(
                Index::create()
                    .name("idx_account_token")
                    .table(Account::Table)
                    .col(Account::Token)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unique index: pseudonym. NULLs are exempt, so accounts that have
        // never written content do not collide with each other.
        manager
            .create_index(
                Index::create()
                    .name("idx_account_pseudonym")
                    .table(Account::Table)
                    .col(Account::Pseudonym)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: ban_expires_at (expiry sweep for temporary bans)
        manager
            .create_index(
                Index::create()
                    .name("idx_account_ban_expires_at")
                    .table(Account::Table)
                    .col(Account::BanExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Account::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Account {
    Table,
    Id,
    Email,
    EmailLower,
    Username,
    DisplayName,
    PasswordHash,
    Token,
    Pseudonym,
    Role,
    ReportedCount,
    IsBanned,
    BanExpiresAt,
    CreatedAt,
    UpdatedAt,
}
