//! Point entity model

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use uuid::Uuid;

/// A single available-capacity measurement inside an available period
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "points")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub available_period_id: Uuid,

    /// Ordering index within the period; NULL when the source was malformed
    pub position: Option<i32>,

    /// Available capacity in the series quantity unit (0 = fully unavailable);
    /// NULL when the source was malformed
    pub quantity: Option<f64>,
}

impl Model {
    /// The quantity as used by capacity calculation; a malformed one is `NaN`.
    pub fn quantity_value(&self) -> f64 {
        self.quantity.unwrap_or(f64::NAN)
    }
}

/// Storage form of a quantity. SQLite cannot hold `NaN`, so it becomes NULL.
pub fn stored_quantity(value: f64) -> Option<f64> {
    (!value.is_nan()).then_some(value)
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::available_period::Entity",
        from = "Column::AvailablePeriodId",
        to = "super::available_period::Column::Id",
        on_delete = "Cascade"
    )]
    AvailablePeriod,
}

impl Related<super::available_period::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AvailablePeriod.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
