//! Create data access request table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DataAccessRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DataAccessRequest::Id)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DataAccessRequest::DarCode)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(DataAccessRequest::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(DataAccessRequest::DatasetIds)
                            .json_binary()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DataAccessRequest::Restriction).json_binary())
                    .col(ColumnDef::new(DataAccessRequest::TranslatedRestriction).text())
                    .col(
                        ColumnDef::new(DataAccessRequest::SortDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_data_access_request_user_id")
                    .table(DataAccessRequest::Table)
                    .col(DataAccessRequest::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DataAccessRequest::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum DataAccessRequest {
    Table,
    Id,
    DarCode,
    UserId,
    DatasetIds,
    Restriction,
    TranslatedRestriction,
    SortDate,
}
