use sea_orm_migration::prelude::*;

use super::product::Products;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m0004_stock_data"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StockData::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(StockData::ProductId).big_integer().not_null())
                    .col(ColumnDef::new(StockData::RecordedOn).date().not_null())
                    .col(ColumnDef::new(StockData::QuantityOnHand).big_integer().not_null())
                    .col(ColumnDef::new(StockData::Movement).big_integer().not_null())
                    .col(ColumnDef::new(StockData::Sold).big_integer().not_null())
                    .col(ColumnDef::new(StockData::Replenished).big_integer().not_null())
                    .col(ColumnDef::new(StockData::QuantityForecasted).big_integer().not_null())
                    .col(ColumnDef::new(StockData::ReorderThreshold).big_integer().not_null())
                    .primary_key(
                        Index::create()
                            .name("pk-stock_data")
                            .col(StockData::ProductId)
                            .col(StockData::RecordedOn),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-stock_data-product_id")
                            .from(StockData::Table, StockData::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(StockData::Table).to_owned()).await
    }
}

#[derive(Iden)]
enum StockData {
    Table,
    ProductId,
    RecordedOn,
    QuantityOnHand,
    Movement,
    Sold,
    Replenished,
    QuantityForecasted,
    ReorderThreshold,
}
