//! Create election table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Election::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Election::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Election::ElectionType).string_len(16).not_null())
                    .col(ColumnDef::new(Election::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Election::ReferenceId).string_len(64).not_null())
                    .col(ColumnDef::new(Election::DatasetId).string_len(32))
                    .col(
                        ColumnDef::new(Election::CreateDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Election::LastUpdate).timestamp_with_time_zone())
                    .col(ColumnDef::new(Election::FinalVote).boolean())
                    .col(ColumnDef::new(Election::FinalVoteDate).timestamp_with_time_zone())
                    .col(ColumnDef::new(Election::FinalRationale).text())
                    .col(ColumnDef::new(Election::FinalAccessVote).boolean())
                    .col(ColumnDef::new(Election::UseRestriction).json_binary())
                    .col(ColumnDef::new(Election::TranslatedUseRestriction).text())
                    .to_owned(),
            )
            .await?;

        // Index: (reference_id, election_type) for open/last election lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_election_reference_type")
                    .table(Election::Table)
                    .col(Election::ReferenceId)
                    .col(Election::ElectionType)
                    .to_owned(),
            )
            .await?;

        // Index: status
        manager
            .create_index(
                Index::create()
                    .name("idx_election_status")
                    .table(Election::Table)
                    .col(Election::Status)
                    .to_owned(),
            )
            .await?;

        // At most one open election per reference and type (per dataset for DataSet)
        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_election_single_open
                ON election (reference_id, election_type, COALESCE(dataset_id, ''))
                WHERE status = 'Open';
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Election::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Election {
    Table,
    Id,
    ElectionType,
    Status,
    ReferenceId,
    DatasetId,
    CreateDate,
    LastUpdate,
    FinalVote,
    FinalVoteDate,
    FinalRationale,
    FinalAccessVote,
    UseRestriction,
    TranslatedUseRestriction,
}
