//! Create dataset and dataset owner tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Dataset::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Dataset::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Dataset::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Dataset::ConsentId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Dataset::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Dataset::NeedsApproval)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dataset_consent")
                            .from(Dataset::Table, Dataset::ConsentId)
                            .to(Consent::Table, Consent::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_dataset_consent_id")
                    .table(Dataset::Table)
                    .col(Dataset::ConsentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DatasetOwner::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DatasetOwner::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DatasetOwner::DatasetId).string_len(32).not_null())
                    .col(ColumnDef::new(DatasetOwner::UserId).string_len(32).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dataset_owner_dataset")
                            .from(DatasetOwner::Table, DatasetOwner::DatasetId)
                            .to(Dataset::Table, Dataset::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dataset_owner_user")
                            .from(DatasetOwner::Table, DatasetOwner::UserId)
                            .to(DacUser::Table, DacUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (dataset_id, user_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_dataset_owner_dataset_user")
                    .table(DatasetOwner::Table)
                    .col(DatasetOwner::DatasetId)
                    .col(DatasetOwner::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DatasetOwner::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Dataset::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Dataset {
    Table,
    Id,
    Name,
    ConsentId,
    Active,
    NeedsApproval,
}

#[derive(Iden)]
enum DatasetOwner {
    Table,
    Id,
    DatasetId,
    UserId,
}

#[derive(Iden)]
enum Consent {
    Table,
    Id,
}

#[derive(Iden)]
enum DacUser {
    Table,
    Id,
}
