use sea_orm::entity::prelude::*;
use serde::Deserialize;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales_data")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id:            i64,
    pub sold_on:       Date,
    pub product_id:    i64,
    pub order_ref:     String,
    pub customer_name: String,
    pub quantity:      i64,
    pub unit_price:    f64,
    pub total_amount:  f64,
    pub margin:        f64,
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
