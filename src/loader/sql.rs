use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::ActiveModelTrait;
use sea_orm::DatabaseConnection;
use sea_orm::EntityTrait;
use sea_orm::IdenStatic;
use sea_orm::Iterable;
use sea_orm::PaginatorTrait;
use sea_orm::PrimaryKeyToColumn;

use super::Sink;
use crate::db::driver::DatabaseDriver;
use crate::db::entity::SyncLog;
use crate::db::entity::TableRecord;
use crate::types::Result;

/// Loads over a direct SQL connection.
#[derive(Debug, Clone)]
pub struct SqlSink {
    driver: Arc<dyn DatabaseDriver>,
}

impl SqlSink {
    pub fn new(driver: Arc<dyn DatabaseDriver>) -> Self {
        Self { driver }
    }

    pub fn connection(&self) -> DatabaseConnection {
        self.driver.connection()
    }

    /// Updates every non-key column on key conflict.
    fn on_conflict<R: TableRecord>() -> OnConflict {
        let keys = <<R::Entity as EntityTrait>::PrimaryKey as Iterable>::iter()
            .map(|pk| pk.into_column())
            .collect::<Vec<_>>();
        let key_names = keys.iter().map(|c| c.as_str()).collect::<Vec<_>>();
        let updates = <<R::Entity as EntityTrait>::Column as Iterable>::iter()
            .filter(|c| !key_names.contains(&c.as_str()))
            .collect::<Vec<_>>();

        let mut on_conflict = OnConflict::columns(keys);
        if updates.is_empty() {
            on_conflict.do_nothing();
        }
        else {
            on_conflict.update_columns(updates);
        }
        on_conflict
    }
}

#[async_trait]
impl Sink for SqlSink {
    fn name(&self) -> &'static str {
        self.driver.name()
    }

    async fn upsert<R: TableRecord>(&self, records: &[R]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let db = self.connection();
        R::Entity::insert_many(records.iter().cloned().map(R::Active::from))
            .on_conflict(Self::on_conflict::<R>())
            .exec_without_returning(&db)
            .await?;
        Ok(())
    }

    async fn fetch_all<R: TableRecord>(&self) -> Result<Vec<R>> {
        Ok(R::Entity::find().all(&self.connection()).await?)
    }

    async fn count<R: TableRecord>(&self) -> Result<u64> {
        Ok(R::Entity::find().count(&self.connection()).await?)
    }

    async fn clear<R: TableRecord>(&self) -> Result<()> {
        R::Entity::delete_many().exec(&self.connection()).await?;
        Ok(())
    }

    async fn record_sync(&self, entry: SyncLog) -> Result<()> {
        entry.into_new_active().insert(&self.connection()).await?;
        Ok(())
    }
}
