use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m0001_products"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Products::Id).big_integer().not_null().primary_key())
                    .col(ColumnDef::new(Products::Name).string().not_null())
                    .col(ColumnDef::new(Products::Reference).string().not_null())
                    .col(ColumnDef::new(Products::Category).string().not_null())
                    .col(ColumnDef::new(Products::ListPrice).double().not_null())
                    .col(ColumnDef::new(Products::StandardPrice).double().not_null())
                    .col(ColumnDef::new(Products::Rotation).string_len(8).not_null())
                    .col(ColumnDef::new(Products::NominalStock).big_integer().not_null())
                    .col(ColumnDef::new(Products::IsActive).boolean().not_null().default(true))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Products::Table).to_owned()).await
    }
}

#[derive(Iden)]
pub enum Products {
    Table,
    Id,
    Name,
    Reference,
    Category,
    ListPrice,
    StandardPrice,
    Rotation,
    NominalStock,
    IsActive,
}
