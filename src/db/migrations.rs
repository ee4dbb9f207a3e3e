pub mod customer;
pub mod product;
pub mod sales_record;
pub mod stock_record;
pub mod sync_log;

use sea_orm_migration::prelude::*;

pub struct Migrator;

impl MigratorTrait for Migrator {
    // Products go first: sales and stock rows reference them.
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(product::Migration),
            Box::new(customer::Migration),
            Box::new(sales_record::Migration),
            Box::new(stock_record::Migration),
            Box::new(sync_log::Migration),
        ]
    }
}
