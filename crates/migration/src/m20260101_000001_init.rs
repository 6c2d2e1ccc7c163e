//! Initial schema for the household ledger.
//!
//! - `profiles`: display data of signed-in people
//! - `families`: shared ledgers reachable by invite code
//! - `family_members`: profile-to-family links with a role
//! - `transactions`: ledger entries owned by a family

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Profiles {
    Table,
    Id,
    DisplayName,
    Email,
}

#[derive(Iden)]
enum Families {
    Table,
    Id,
    Name,
    InviteCode,
    CreatedBy,
}

#[derive(Iden)]
enum FamilyMembers {
    Table,
    FamilyId,
    ProfileId,
    Role,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    Description,
    AmountMinor,
    Date,
    Status,
    Category,
    PaidBy,
    RecurrenceId,
    FamilyId,
    ProfileId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Profiles::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Profiles::DisplayName).string())
                    .col(ColumnDef::new(Profiles::Email).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Families::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Families::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Families::Name).string().not_null())
                    .col(ColumnDef::new(Families::InviteCode).string().not_null())
                    .col(ColumnDef::new(Families::CreatedBy).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-families-invite_code-unique")
                    .table(Families::Table)
                    .col(Families::InviteCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Membership rows may point at profiles that were never created, so
        // profile_id carries no foreign key.
        manager
            .create_table(
                Table::create()
                    .table(FamilyMembers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(FamilyMembers::FamilyId).string().not_null())
                    .col(ColumnDef::new(FamilyMembers::ProfileId).string().not_null())
                    .col(ColumnDef::new(FamilyMembers::Role).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(FamilyMembers::FamilyId)
                            .col(FamilyMembers::ProfileId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-family_members-family_id")
                            .from(FamilyMembers::Table, FamilyMembers::FamilyId)
                            .to(Families::Table, Families::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One family per profile.
        manager
            .create_index(
                Index::create()
                    .name("idx-family_members-profile_id-unique")
                    .table(FamilyMembers::Table)
                    .col(FamilyMembers::ProfileId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::Description).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Date).date().not_null())
                    .col(
                        ColumnDef::new(Transactions::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Transactions::Category).string())
                    .col(ColumnDef::new(Transactions::PaidBy).string())
                    .col(ColumnDef::new(Transactions::RecurrenceId).string())
                    .col(ColumnDef::new(Transactions::FamilyId).string().not_null())
                    .col(ColumnDef::new(Transactions::ProfileId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-family_id")
                            .from(Transactions::Table, Transactions::FamilyId)
                            .to(Families::Table, Families::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-family_id-date")
                    .table(Transactions::Table)
                    .col(Transactions::FamilyId)
                    .col(Transactions::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-recurrence_id")
                    .table(Transactions::Table)
                    .col(Transactions::RecurrenceId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FamilyMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Families::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await?;
        Ok(())
    }
}
