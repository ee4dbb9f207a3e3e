use sea_orm::entity::prelude::*;
use serde::Deserialize;
use serde::Serialize;

use crate::types::SyncStatus;

/// Outcome of one ETL stage.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "etl_sync_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_serializing)]
    pub id:                i32,
    pub sync_type:         String,
    pub status:            SyncStatus,
    pub records_processed: i32,
    pub records_failed:    i32,
    pub error_message:     Option<String>,
    pub started_at:        DateTimeUtc,
    pub completed_at:      DateTimeUtc,
    pub duration_seconds:  f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Active model for a fresh row; the database assigns the id.
    pub fn into_new_active(self) -> ActiveModel {
        ActiveModel {
            id:                sea_orm::ActiveValue::NotSet,
            sync_type:         sea_orm::ActiveValue::Set(self.sync_type),
            status:            sea_orm::ActiveValue::Set(self.status),
            records_processed: sea_orm::ActiveValue::Set(self.records_processed),
            records_failed:    sea_orm::ActiveValue::Set(self.records_failed),
            error_message:     sea_orm::ActiveValue::Set(self.error_message),
            started_at:        sea_orm::ActiveValue::Set(self.started_at),
            completed_at:      sea_orm::ActiveValue::Set(self.completed_at),
            duration_seconds:  sea_orm::ActiveValue::Set(self.duration_seconds),
        }
    }
}
