//! Migration to create the points table.
//!
//! `position` and `quantity` are nullable: a malformed number in the source
//! document is stored as NULL instead of aborting ingestion. A NULL quantity
//! reads back as NaN.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Points::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Points::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Points::AvailablePeriodId).uuid().not_null())
                    .col(ColumnDef::new(Points::Position).integer().null())
                    .col(ColumnDef::new(Points::Quantity).double().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_points_available_period_id")
                            .from(Points::Table, Points::AvailablePeriodId)
                            .to(AvailablePeriods::Table, AvailablePeriods::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_points_available_period_id")
                    .table(Points::Table)
                    .col(Points::AvailablePeriodId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_points_available_period_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Points::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Points {
    Table,
    Id,
    AvailablePeriodId,
    Position,
    Quantity,
}

#[derive(DeriveIden)]
enum AvailablePeriods {
    Table,
    Id,
}
