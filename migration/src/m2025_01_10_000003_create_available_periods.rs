//! Migration to create the available_periods table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AvailablePeriods::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AvailablePeriods::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AvailablePeriods::TimeSeriesId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AvailablePeriods::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AvailablePeriods::EndTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AvailablePeriods::Resolution).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_available_periods_time_series_id")
                            .from(AvailablePeriods::Table, AvailablePeriods::TimeSeriesId)
                            .to(TimeSeries::Table, TimeSeries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_available_periods_time_series_id")
                    .table(AvailablePeriods::Table)
                    .col(AvailablePeriods::TimeSeriesId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_available_periods_time_series_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(AvailablePeriods::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AvailablePeriods {
    Table,
    Id,
    TimeSeriesId,
    StartTime,
    EndTime,
    Resolution,
}

#[derive(DeriveIden)]
enum TimeSeries {
    Table,
    Id,
}
