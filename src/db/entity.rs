pub mod customer;
pub mod product;
pub mod sales_record;
pub mod stock_record;
pub mod sync_log;

use std::fmt::Debug;

use sea_orm::ActiveModelBehavior;
use sea_orm::ActiveModelTrait;
use sea_orm::EntityTrait;
use sea_orm::FromQueryResult;
use sea_orm::IntoActiveModel;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use customer::Entity as Customers;
pub use customer::Model as Customer;
pub use product::Entity as Products;
pub use product::Model as Product;
pub use sales_record::Entity as SalesRecords;
pub use sales_record::Model as SalesRecord;
pub use stock_record::Entity as StockRecords;
pub use stock_record::Model as StockRecord;
pub use sync_log::Entity as SyncLogs;
pub use sync_log::Model as SyncLog;

/// A row of one of the target tables, loadable through any sink.
pub trait TableRecord:
    Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + FromQueryResult
    + IntoActiveModel<<Self as TableRecord>::Active>
    + Send
    + Sync
    + 'static
{
    type Entity: EntityTrait<Model = Self>;
    type Active: ActiveModelTrait<Entity = Self::Entity> + ActiveModelBehavior + From<Self> + Send + 'static;

    const TABLE: &'static str;
    /// Comma separated key columns, as PostgREST's `on_conflict` expects them.
    const CONFLICT: &'static str;

    /// Short human readable identification for logs.
    fn label(&self) -> String;

    fn key_column() -> &'static str {
        Self::CONFLICT.split(',').next().unwrap_or("id")
    }
}

impl TableRecord for Product {
    type Active = product::ActiveModel;
    type Entity = Products;

    const CONFLICT: &'static str = "id";
    const TABLE: &'static str = "products";

    fn label(&self) -> String {
        format!("product #{} [{}]", self.id, self.reference)
    }
}

impl TableRecord for Customer {
    type Active = customer::ActiveModel;
    type Entity = Customers;

    const CONFLICT: &'static str = "id";
    const TABLE: &'static str = "customers";

    fn label(&self) -> String {
        format!("customer #{} ({})", self.id, self.name)
    }
}

impl TableRecord for SalesRecord {
    type Active = sales_record::ActiveModel;
    type Entity = SalesRecords;

    const CONFLICT: &'static str = "id";
    const TABLE: &'static str = "sales_data";

    fn label(&self) -> String {
        format!("sale #{} {} of product #{}", self.id, self.order_ref, self.product_id)
    }
}

impl TableRecord for StockRecord {
    type Active = stock_record::ActiveModel;
    type Entity = StockRecords;

    const CONFLICT: &'static str = "product_id,recorded_on";
    const TABLE: &'static str = "stock_data";

    fn label(&self) -> String {
        format!("stock of product #{} on {}", self.product_id, self.recorded_on)
    }
}
