//! Migration to create the time_series table.
//!
//! Each row is one production/generation unit outage record owned by a market
//! document. `m_rid` is intentionally not unique.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TimeSeries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TimeSeries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TimeSeries::MarketDocumentId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TimeSeries::MRid).text().not_null())
                    .col(
                        ColumnDef::new(TimeSeries::BusinessType)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(TimeSeries::BiddingZone)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(TimeSeries::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TimeSeries::EndTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TimeSeries::QuantityUnit)
                            .text()
                            .not_null()
                            .default("MAW"),
                    )
                    .col(ColumnDef::new(TimeSeries::CurveType).text().null())
                    .col(
                        ColumnDef::new(TimeSeries::ResourceMRid)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(TimeSeries::ResourceName)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(TimeSeries::ResourceLocation).text().null())
                    .col(ColumnDef::new(TimeSeries::ResourceType).text().null())
                    .col(ColumnDef::new(TimeSeries::PowerSystemMRid).text().null())
                    .col(ColumnDef::new(TimeSeries::PowerSystemName).text().null())
                    .col(ColumnDef::new(TimeSeries::NominalPower).double().null())
                    // Set when nominalP was present but not a number
                    .col(
                        ColumnDef::new(TimeSeries::NominalPowerMalformed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(TimeSeries::NominalPowerUnit)
                            .text()
                            .not_null()
                            .default("MAW"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_time_series_market_document_id")
                            .from(TimeSeries::Table, TimeSeries::MarketDocumentId)
                            .to(MarketDocuments::Table, MarketDocuments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_time_series_market_document_id")
                    .table(TimeSeries::Table)
                    .col(TimeSeries::MarketDocumentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_time_series_start_time")
                    .table(TimeSeries::Table)
                    .col(TimeSeries::StartTime)
                    .to_owned(),
            )
            .await?;

        // Matches the grouping key used by the deduplicated view
        manager
            .create_index(
                Index::create()
                    .name("idx_time_series_location_interval")
                    .table(TimeSeries::Table)
                    .col(TimeSeries::ResourceLocation)
                    .col(TimeSeries::StartTime)
                    .col(TimeSeries::EndTime)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_time_series_location_interval",
            "idx_time_series_start_time",
            "idx_time_series_market_document_id",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }

        manager
            .drop_table(Table::drop().table(TimeSeries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TimeSeries {
    Table,
    Id,
    MarketDocumentId,
    MRid,
    BusinessType,
    BiddingZone,
    StartTime,
    EndTime,
    QuantityUnit,
    CurveType,
    ResourceMRid,
    ResourceName,
    ResourceLocation,
    ResourceType,
    PowerSystemMRid,
    PowerSystemName,
    NominalPower,
    NominalPowerMalformed,
    NominalPowerUnit,
}

#[derive(DeriveIden)]
enum MarketDocuments {
    Table,
    Id,
}
