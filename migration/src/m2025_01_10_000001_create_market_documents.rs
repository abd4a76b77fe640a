//! Migration to create the market_documents table.
//!
//! One row per ingested ENTSO-E unavailability market document, keyed by its
//! business identifier (`m_rid`) so that re-ingestion updates in place.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MarketDocuments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MarketDocuments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MarketDocuments::MRid).text().not_null())
                    .col(
                        ColumnDef::new(MarketDocuments::RevisionNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MarketDocuments::DocType)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(MarketDocuments::ProcessType).text().null())
                    .col(
                        ColumnDef::new(MarketDocuments::CreatedDateTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MarketDocuments::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MarketDocuments::EndTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MarketDocuments::ReasonCode).text().null())
                    .col(
                        ColumnDef::new(MarketDocuments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_market_documents_m_rid")
                    .table(MarketDocuments::Table)
                    .col(MarketDocuments::MRid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_market_documents_m_rid").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(MarketDocuments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MarketDocuments {
    Table,
    Id,
    MRid,
    RevisionNumber,
    DocType,
    ProcessType,
    CreatedDateTime,
    StartTime,
    EndTime,
    ReasonCode,
    UpdatedAt,
}
