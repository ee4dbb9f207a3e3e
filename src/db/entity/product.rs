use sea_orm::entity::prelude::*;
use serde::Deserialize;
use serde::Serialize;

use crate::types::RotationProfile;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id:             i64,
    pub name:           String,
    pub reference:      String,
    pub category:       String,
    pub list_price:     f64,
    pub standard_price: f64,
    pub rotation:       RotationProfile,
    /// Stock level considered normal for the product.
    pub nominal_stock:  i64,
    pub is_active:      bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sales_record::Entity")]
    SalesRecord,
    #[sea_orm(has_many = "super::stock_record::Entity")]
    StockRecord,
}

impl Related<super::sales_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesRecord.def()
    }
}

impl Related<super::stock_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockRecord.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Purchase cost, falling back to 60% of the list price when the ERP has none.
    pub fn effective_cost(&self) -> f64 {
        if self.standard_price > 0.0 {
            self.standard_price
        }
        else {
            self.list_price * 0.6
        }
    }
}
