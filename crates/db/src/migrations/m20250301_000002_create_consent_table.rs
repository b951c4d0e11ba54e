//! Create consent table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Consent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Consent::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Consent::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Consent::UseRestriction).json_binary().not_null())
                    .col(ColumnDef::new(Consent::TranslatedUseRestriction).text())
                    .col(
                        ColumnDef::new(Consent::RequiresManualReview)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Consent::SortDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Consent::LastUpdate).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Index: sort_date (manage-view ordering)
        manager
            .create_index(
                Index::create()
                    .name("idx_consent_sort_date")
                    .table(Consent::Table)
                    .col(Consent::SortDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Consent::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Consent {
    Table,
    Id,
    Name,
    UseRestriction,
    TranslatedUseRestriction,
    RequiresManualReview,
    SortDate,
    LastUpdate,
}
