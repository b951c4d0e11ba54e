//! Create access/research purpose link table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AccessRp::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccessRp::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AccessRp::ElectionAccessId)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(AccessRp::ElectionRpId)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_access_rp_access")
                            .from(AccessRp::Table, AccessRp::ElectionAccessId)
                            .to(Election::Table, Election::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_access_rp_rp")
                            .from(AccessRp::Table, AccessRp::ElectionRpId)
                            .to(Election::Table, Election::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AccessRp::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AccessRp {
    Table,
    Id,
    ElectionAccessId,
    ElectionRpId,
}

#[derive(Iden)]
enum Election {
    Table,
    Id,
}
