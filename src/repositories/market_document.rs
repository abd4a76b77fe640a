//! MarketDocument repository for database operations
//!
//! Documents are keyed by their business identifier `m_rid`; writing the same
//! document twice updates the existing row.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::market_document::{self, Entity as MarketDocument};
use crate::models::{AvailablePeriod, Point, TimeSeries};

/// Field values of a market document as written by ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMarketDocument {
    pub m_rid: String,
    pub revision_number: i32,
    pub doc_type: String,
    pub process_type: Option<String>,
    pub created_date_time: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub reason_code: Option<String>,
}

/// Repository for market document database operations
#[derive(Debug, Clone)]
pub struct MarketDocumentRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl MarketDocumentRepository {
    /// Creates a new MarketDocumentRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Finds a document by its business identifier
    ///
    /// # Arguments
    ///
    /// * `m_rid` - The unique business identifier of the document
    ///
    /// # Returns
    ///
    /// Returns the document model if found
    pub async fn find_by_mrid(&self, m_rid: &str) -> Result<Option<market_document::Model>, DbErr> {
        MarketDocument::find()
            .filter(market_document::Column::MRid.eq(m_rid))
            .one(&*self.db)
            .await
    }

    /// Inserts the document, or overwrites every field of the existing row with the same `m_rid`
    ///
    /// # Arguments
    ///
    /// * `document` - Field values from the latest parse
    ///
    /// # Returns
    ///
    /// Returns the stored document model; its `id` is stable across upserts
    pub async fn upsert_by_mrid(
        &self,
        document: &NewMarketDocument,
    ) -> Result<market_document::Model, DbErr> {
        let now = Utc::now().fixed_offset();

        if let Some(existing) = self.find_by_mrid(&document.m_rid).await? {
            let mut active: market_document::ActiveModel = existing.into();
            active.revision_number = Set(document.revision_number);
            active.doc_type = Set(document.doc_type.clone());
            active.process_type = Set(document.process_type.clone());
            active.created_date_time = Set(document.created_date_time.fixed_offset());
            active.start_time = Set(document.start_time.fixed_offset());
            active.end_time = Set(document.end_time.fixed_offset());
            active.reason_code = Set(document.reason_code.clone());
            active.updated_at = Set(now);

            log::debug!("Updating market document {}", document.m_rid);
            return active.update(&*self.db).await;
        }

        let active = market_document::ActiveModel {
            id: Set(Uuid::new_v4()),
            m_rid: Set(document.m_rid.clone()),
            revision_number: Set(document.revision_number),
            doc_type: Set(document.doc_type.clone()),
            process_type: Set(document.process_type.clone()),
            created_date_time: Set(document.created_date_time.fixed_offset()),
            start_time: Set(document.start_time.fixed_offset()),
            end_time: Set(document.end_time.fixed_offset()),
            reason_code: Set(document.reason_code.clone()),
            updated_at: Set(now),
        };

        log::debug!("Inserting market document {}", document.m_rid);
        active.insert(&*self.db).await
    }

    /// Counts stored documents
    pub async fn count(&self) -> Result<u64, DbErr> {
        MarketDocument::find().count(&*self.db).await
    }

    /// Deletes all outage data, children first, in one transaction
    ///
    /// # Returns
    ///
    /// Returns the number of market documents deleted
    pub async fn delete_all(&self) -> Result<u64, DbErr> {
        let txn = self.db.begin().await?;

        Point::delete_many().exec(&txn).await?;
        AvailablePeriod::delete_many().exec(&txn).await?;
        TimeSeries::delete_many().exec(&txn).await?;
        let documents = MarketDocument::delete_many().exec(&txn).await?;

        txn.commit().await?;
        Ok(documents.rows_affected)
    }
}
