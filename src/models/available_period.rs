//! AvailablePeriod entity model

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Sub-interval of a time series carrying capacity points
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "available_periods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub time_series_id: Uuid,

    pub start_time: DateTimeWithTimeZone,

    pub end_time: DateTimeWithTimeZone,

    /// ISO-8601 duration of one position (e.g. PT1M)
    pub resolution: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::time_series::Entity",
        from = "Column::TimeSeriesId",
        to = "super::time_series::Column::Id",
        on_delete = "Cascade"
    )]
    TimeSeries,
    #[sea_orm(has_many = "super::point::Entity")]
    Point,
}

impl Related<super::time_series::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TimeSeries.def()
    }
}

impl Related<super::point::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Point.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
