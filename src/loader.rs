//! Loading records into the target store.
//!
//! A [`Sink`] upserts whole batches. [`load_records`] splits the input into batches and, when a batch is rejected,
//! retries its records one at a time so a single bad row costs only itself.

pub mod rest;
pub mod sql;

use async_trait::async_trait;
use indicatif::ProgressBar;
use tracing::debug;
use tracing::error;
use tracing::instrument;
use tracing::warn;

pub use rest::RestSink;
pub use sql::SqlSink;

use crate::db::entity::SyncLog;
use crate::db::entity::TableRecord;
use crate::progress::MaybeProgress;
use crate::types::Result;

#[async_trait]
pub trait Sink: Send + Sync {
    fn name(&self) -> &'static str;

    /// Insert-or-update by primary key. All or nothing for the batch.
    async fn upsert<R: TableRecord>(&self, records: &[R]) -> Result<()>;

    async fn fetch_all<R: TableRecord>(&self) -> Result<Vec<R>>;

    async fn count<R: TableRecord>(&self) -> Result<u64>;

    async fn clear<R: TableRecord>(&self) -> Result<()>;

    /// Appends a run log row.
    async fn record_sync(&self, entry: SyncLog) -> Result<()>;
}

/// Either sink, picked at runtime from the command line.
#[derive(Debug)]
pub enum AnySink {
    Rest(RestSink),
    Sql(SqlSink),
}

#[async_trait]
impl Sink for AnySink {
    fn name(&self) -> &'static str {
        match self {
            Self::Rest(sink) => sink.name(),
            Self::Sql(sink) => sink.name(),
        }
    }

    async fn upsert<R: TableRecord>(&self, records: &[R]) -> Result<()> {
        match self {
            Self::Rest(sink) => sink.upsert(records).await,
            Self::Sql(sink) => sink.upsert(records).await,
        }
    }

    async fn fetch_all<R: TableRecord>(&self) -> Result<Vec<R>> {
        match self {
            Self::Rest(sink) => sink.fetch_all().await,
            Self::Sql(sink) => sink.fetch_all().await,
        }
    }

    async fn count<R: TableRecord>(&self) -> Result<u64> {
        match self {
            Self::Rest(sink) => sink.count::<R>().await,
            Self::Sql(sink) => sink.count::<R>().await,
        }
    }

    async fn clear<R: TableRecord>(&self) -> Result<()> {
        match self {
            Self::Rest(sink) => sink.clear::<R>().await,
            Self::Sql(sink) => sink.clear::<R>().await,
        }
    }

    async fn record_sync(&self, entry: SyncLog) -> Result<()> {
        match self {
            Self::Rest(sink) => sink.record_sync(entry).await,
            Self::Sql(sink) => sink.record_sync(entry).await,
        }
    }
}

/// What happened to a set of records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub table:       &'static str,
    pub loaded:      usize,
    pub failed:      usize,
    /// Batches that had to be retried record by record.
    pub split:       usize,
    pub first_error: Option<String>,
}

impl LoadReport {
    pub fn processed(&self) -> usize {
        self.loaded + self.failed
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Upserts `records` in batches of `batch_size`. Failures never abort the run: a rejected batch is retried record by
/// record and records that still fail are logged and counted in the report.
#[instrument(level = "debug", skip_all, fields(table = R::TABLE, sink = sink.name(), records = records.len()))]
pub async fn load_records<S, R>(
    sink: &S,
    records: &[R],
    batch_size: usize,
    progress: &Option<ProgressBar>,
) -> LoadReport
where
    S: Sink,
    R: TableRecord,
{
    let mut report = LoadReport {
        table: R::TABLE,
        ..Default::default()
    };

    progress.maybe_set_length(records.len() as u64);

    for batch in records.chunks(batch_size.max(1)) {
        match sink.upsert(batch).await {
            Ok(()) => {
                debug!(size = batch.len(), "Batch loaded");
                report.loaded += batch.len();
            }
            Err(err) => {
                warn!(size = batch.len(), "Batch rejected, loading one by one: {err}");
                report.split += 1;

                for record in batch {
                    match sink.upsert(std::slice::from_ref(record)).await {
                        Ok(()) => report.loaded += 1,
                        Err(err) => {
                            error!("Skipping {}: {err}", record.label());
                            report.failed += 1;
                            report.first_error.get_or_insert_with(|| err.to_string());
                        }
                    }
                }
            }
        }
        progress.maybe_inc(batch.len() as u64);
    }

    report
}
