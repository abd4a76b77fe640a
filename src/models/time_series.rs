//! TimeSeries entity model
//!
//! One outage record for one production/generation resource inside a market
//! document. Identifiers are not unique across ingestion runs.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "time_series")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning market document
    pub market_document_id: Uuid,

    /// Business identifier of the time series
    pub m_rid: String,

    /// Business type code (A53 planned, A54 forced, ...)
    pub business_type: String,

    /// Bidding zone, `<codingScheme>:<code>` when a scheme was declared
    pub bidding_zone: String,

    pub start_time: DateTimeWithTimeZone,

    pub end_time: DateTimeWithTimeZone,

    /// Unit of the point quantities
    pub quantity_unit: String,

    pub curve_type: Option<String>,

    /// Registered resource identifier, `<codingScheme>:<code>` when coded
    pub resource_m_rid: String,

    pub resource_name: String,

    pub resource_location: Option<String>,

    /// PSR type code of the resource (B14 nuclear, B16 solar, ...)
    pub resource_type: Option<String>,

    pub power_system_m_rid: Option<String>,

    pub power_system_name: Option<String>,

    /// Rated capacity; absent means capacity cannot be computed
    pub nominal_power: Option<f64>,

    /// The source carried a nominal power that was not a number
    pub nominal_power_malformed: bool,

    pub nominal_power_unit: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::market_document::Entity",
        from = "Column::MarketDocumentId",
        to = "super::market_document::Column::Id",
        on_delete = "Cascade"
    )]
    MarketDocument,
    #[sea_orm(has_many = "super::available_period::Entity")]
    AvailablePeriod,
}

impl Related<super::market_document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MarketDocument.def()
    }
}

impl Related<super::available_period::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AvailablePeriod.def()
    }
}

impl Model {
    /// Nominal power as used by capacity calculation.
    ///
    /// A malformed value comes back as `NaN`, distinct from an absent one.
    pub fn nominal_power_value(&self) -> Option<f64> {
        if self.nominal_power_malformed {
            Some(f64::NAN)
        } else {
            self.nominal_power
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
