//! Create vote table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vote::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Vote::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Vote::ElectionId).string_len(32).not_null())
                    .col(ColumnDef::new(Vote::DacUserId).string_len(32).not_null())
                    .col(ColumnDef::new(Vote::VoteType).string_len(16).not_null())
                    .col(ColumnDef::new(Vote::Vote).boolean())
                    .col(ColumnDef::new(Vote::Rationale).text())
                    .col(ColumnDef::new(Vote::HasConcerns).boolean())
                    .col(ColumnDef::new(Vote::CreateDate).timestamp_with_time_zone())
                    .col(ColumnDef::new(Vote::UpdateDate).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Vote::ReminderSent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_election")
                            .from(Vote::Table, Vote::ElectionId)
                            .to(Election::Table, Election::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: one vote per (election, voter, type)
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_election_user_type")
                    .table(Vote::Table)
                    .col(Vote::ElectionId)
                    .col(Vote::DacUserId)
                    .col(Vote::VoteType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: dac_user_id (pending case lookups)
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_dac_user_id")
                    .table(Vote::Table)
                    .col(Vote::DacUserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Vote {
    Table,
    Id,
    ElectionId,
    DacUserId,
    VoteType,
    Vote,
    Rationale,
    HasConcerns,
    CreateDate,
    UpdateDate,
    ReminderSent,
}

#[derive(Iden)]
enum Election {
    Table,
    Id,
}
