use async_trait::async_trait;

use super::Sink;
use crate::db::entity::SyncLog;
use crate::db::entity::TableRecord;
use crate::supabase::SupabaseClient;
use crate::types::Result;

/// Loads through Supabase's REST API.
#[derive(Debug, Clone)]
pub struct RestSink {
    client: SupabaseClient,
}

impl RestSink {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &SupabaseClient {
        &self.client
    }
}

#[async_trait]
impl Sink for RestSink {
    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn upsert<R: TableRecord>(&self, records: &[R]) -> Result<()> {
        self.client.upsert(R::TABLE, R::CONFLICT, records).await
    }

    async fn fetch_all<R: TableRecord>(&self) -> Result<Vec<R>> {
        self.client.select(R::TABLE, &[]).await
    }

    async fn count<R: TableRecord>(&self) -> Result<u64> {
        self.client.count(R::TABLE).await
    }

    async fn clear<R: TableRecord>(&self) -> Result<()> {
        self.client.delete_all(R::TABLE, R::key_column()).await
    }

    async fn record_sync(&self, entry: SyncLog) -> Result<()> {
        // The id is assigned by the table.
        self.client.insert("etl_sync_log", std::slice::from_ref(&entry)).await
    }
}
