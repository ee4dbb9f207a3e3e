use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m0005_etl_sync_log"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EtlSyncLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EtlSyncLog::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EtlSyncLog::SyncType).string().not_null())
                    .col(ColumnDef::new(EtlSyncLog::Status).string_len(16).not_null())
                    .col(ColumnDef::new(EtlSyncLog::RecordsProcessed).integer().not_null())
                    .col(ColumnDef::new(EtlSyncLog::RecordsFailed).integer().not_null())
                    .col(ColumnDef::new(EtlSyncLog::ErrorMessage).text().null())
                    .col(ColumnDef::new(EtlSyncLog::StartedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(EtlSyncLog::CompletedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(EtlSyncLog::DurationSeconds).double().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(EtlSyncLog::Table).to_owned()).await
    }
}

#[derive(Iden)]
enum EtlSyncLog {
    Table,
    Id,
    SyncType,
    Status,
    RecordsProcessed,
    RecordsFailed,
    ErrorMessage,
    StartedAt,
    CompletedAt,
    DurationSeconds,
}
