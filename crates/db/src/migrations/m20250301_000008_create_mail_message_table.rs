//! Create sent-notification log table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MailMessage::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MailMessage::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MailMessage::ElectionId).string_len(32).not_null())
                    .col(ColumnDef::new(MailMessage::ReferenceId).string_len(64).not_null())
                    .col(ColumnDef::new(MailMessage::EmailType).string_len(32).not_null())
                    .col(
                        ColumnDef::new(MailMessage::CreateDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (election_id, email_type) for sent-log checks
        manager
            .create_index(
                Index::create()
                    .name("idx_mail_message_election_type")
                    .table(MailMessage::Table)
                    .col(MailMessage::ElectionId)
                    .col(MailMessage::EmailType)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MailMessage::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum MailMessage {
    Table,
    Id,
    ElectionId,
    ReferenceId,
    EmailType,
    CreateDate,
}
