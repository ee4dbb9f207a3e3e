use sea_orm_migration::prelude::*;

use super::product::Products;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m0003_sales_data"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SalesData::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SalesData::Id).big_integer().not_null().primary_key())
                    .col(ColumnDef::new(SalesData::SoldOn).date().not_null())
                    .col(ColumnDef::new(SalesData::ProductId).big_integer().not_null())
                    .col(ColumnDef::new(SalesData::OrderRef).string().not_null())
                    .col(ColumnDef::new(SalesData::CustomerName).string().not_null())
                    .col(ColumnDef::new(SalesData::Quantity).big_integer().not_null())
                    .col(ColumnDef::new(SalesData::UnitPrice).double().not_null())
                    .col(ColumnDef::new(SalesData::TotalAmount).double().not_null())
                    .col(ColumnDef::new(SalesData::Margin).double().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sales_data-product_id")
                            .from(SalesData::Table, SalesData::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-sales_data-sold_on")
                    .table(SalesData::Table)
                    .col(SalesData::SoldOn)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(SalesData::Table).to_owned()).await
    }
}

#[derive(Iden)]
enum SalesData {
    Table,
    Id,
    SoldOn,
    ProductId,
    OrderRef,
    CustomerName,
    Quantity,
    UnitPrice,
    TotalAmount,
    Margin,
}
