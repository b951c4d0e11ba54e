//! Create committee user and role tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DacUser::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DacUser::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DacUser::DisplayName).string_len(256).not_null())
                    .col(
                        ColumnDef::new(DacUser::Email)
                            .string_len(512)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(DacUser::EmailPreference)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserRole::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserRole::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserRole::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(UserRole::Role).string_len(16).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_role_user")
                            .from(UserRole::Table, UserRole::UserId)
                            .to(DacUser::Table, DacUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, role)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_role_user_role")
                    .table(UserRole::Table)
                    .col(UserRole::UserId)
                    .col(UserRole::Role)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserRole::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DacUser::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum DacUser {
    Table,
    Id,
    DisplayName,
    Email,
    EmailPreference,
}

#[derive(Iden)]
enum UserRole {
    Table,
    Id,
    UserId,
    Role,
}
