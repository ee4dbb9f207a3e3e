use sea_orm::entity::prelude::*;
use serde::Deserialize;
use serde::Serialize;

/// End-of-day stock position of a product.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_data")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub product_id:          i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub recorded_on:         Date,
    pub quantity_on_hand:    i64,
    /// `replenished - sold`
    pub movement:            i64,
    pub sold:                i64,
    pub replenished:         i64,
    pub quantity_forecasted: i64,
    pub reorder_threshold:   i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
