//! MarketDocument entity model
//!
//! One row per ingested `Unavailability_MarketDocument`. The business
//! identifier `m_rid` is unique; re-ingesting the same document updates the
//! row in place.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// MarketDocument entity representing one ingested source file
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "market_documents")]
pub struct Model {
    /// Unique identifier for the document (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Business identifier of the document (unique)
    #[sea_orm(unique)]
    pub m_rid: String,

    /// Revision number of the document
    pub revision_number: i32,

    /// Document type code (e.g. A77)
    pub doc_type: String,

    /// Process type code (e.g. A26)
    pub process_type: Option<String>,

    /// Creation timestamp declared by the document
    pub created_date_time: DateTimeWithTimeZone,

    /// Start of the document validity interval
    pub start_time: DateTimeWithTimeZone,

    /// End of the document validity interval
    pub end_time: DateTimeWithTimeZone,

    /// Document-level reason code (e.g. B18)
    pub reason_code: Option<String>,

    /// Timestamp of the last ingestion touching this row
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::time_series::Entity")]
    TimeSeries,
}

impl Related<super::time_series::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TimeSeries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
