//! The Odoo → store pipeline.
//!
//! Stages run in a fixed order: products, customers, stock, sales. Each stage extracts, transforms and loads on its
//! own; a failing stage is recorded in `etl_sync_log` as `failed` and the next one still runs.

pub mod extract;
pub mod transform;

use std::time::Instant;

use chrono::Days;
use chrono::NaiveDate;
use chrono::Utc;
use comfy_table::CellAlignment;
use fieldx::fxstruct;
use num_format::Locale;
use num_format::ToFormattedString;
use strum::Display;
use strum::EnumIter;
use strum::IntoEnumIterator;
use tracing::info;
use tracing::instrument;
use tracing::warn;

use self::extract::Extractor;
use self::extract::OdooProduct;
use crate::db::entity::Customer;
use crate::db::entity::Product;
use crate::db::entity::SalesRecord;
use crate::db::entity::StockRecord;
use crate::db::entity::SyncLog;
use crate::loader::load_records;
use crate::loader::LoadReport;
use crate::loader::Sink;
use crate::odoo::OdooClient;
use crate::progress::MaybeProgress;
use crate::progress::PStyle;
use crate::progress::ProgressUI;
use crate::types::Result;
use crate::types::SyncStatus;

#[derive(Display, EnumIter, Clone, Copy, Debug, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Products,
    Customers,
    Stock,
    Sales,
}

#[derive(Debug, Clone)]
#[fxstruct(no_new, builder, get(copy))]
pub struct EtlOptions {
    /// Odoo product `type` selecting stockable products.
    #[fieldx(get(clone), default("product".to_string()))]
    product_type: String,
    /// How far back sale orders are copied.
    #[fieldx(default(30))]
    days_back:    u32,
    #[fieldx(default(1000))]
    batch_size:   usize,
    /// Empty the sales and stock tables first.
    #[fieldx(default(false))]
    clean:        bool,
    /// Date stamped on stock snapshots.
    #[fieldx(default(Utc::now().date_naive()))]
    today:        NaiveDate,
}

#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub stage:    Stage,
    pub status:   SyncStatus,
    pub report:   LoadReport,
    pub skipped:  usize,
    pub error:    Option<String>,
    pub duration: f64,
}

/// Result of a whole run.
#[derive(Debug, Clone, Default)]
pub struct EtlSummary {
    pub stages: Vec<StageOutcome>,
    /// Row count per table after the run; `None` when counting failed.
    pub counts: Vec<(&'static str, Option<u64>)>,
}

impl EtlSummary {
    pub fn failed_stages(&self) -> usize {
        self.stages.iter().filter(|s| s.status == SyncStatus::Failed).count()
    }

    pub fn table(&self) -> comfy_table::Table {
        let mut table = comfy_table::Table::new();
        table
            .load_preset(comfy_table::presets::ASCII_FULL_CONDENSED)
            .set_header(["Stage", "Status", "Loaded", "Failed", "Skipped", "Seconds"]);

        for s in &self.stages {
            table.add_row([
                s.stage.to_string(),
                s.status.to_string(),
                s.report.loaded.to_formatted_string(&Locale::en),
                s.report.failed.to_formatted_string(&Locale::en),
                s.skipped.to_formatted_string(&Locale::en),
                format!("{:.2}", s.duration),
            ]);
        }

        for col in 2..=5 {
            if let Some(column) = table.column_mut(col) {
                column.set_cell_alignment(CellAlignment::Right);
            }
        }
        table
    }

    pub fn counts_table(&self) -> comfy_table::Table {
        let mut table = comfy_table::Table::new();
        table
            .load_preset(comfy_table::presets::ASCII_FULL_CONDENSED)
            .set_header(["Table", "Rows"]);
        for (name, count) in &self.counts {
            table.add_row([
                name.to_string(),
                count.map_or_else(|| "n/a".to_string(), |c| c.to_formatted_string(&Locale::en)),
            ]);
        }
        if let Some(column) = table.column_mut(1) {
            column.set_cell_alignment(CellAlignment::Right);
        }
        table
    }
}

pub struct Pipeline<'a, S: Sink> {
    odoo:     &'a OdooClient,
    sink:     &'a S,
    ui:       &'a ProgressUI,
    options:  EtlOptions,
    // Extracted once, shared by the product and stock stages.
    products: Option<Vec<OdooProduct>>,
}

impl<'a, S: Sink> Pipeline<'a, S> {
    pub fn new(odoo: &'a OdooClient, sink: &'a S, ui: &'a ProgressUI, options: EtlOptions) -> Self {
        Self {
            odoo,
            sink,
            ui,
            options,
            products: None,
        }
    }

    async fn odoo_products(&mut self) -> Result<&[OdooProduct]> {
        if self.products.is_none() {
            let products = Extractor::new(self.odoo)
                .products(&self.options.product_type())
                .await?;
            self.products = Some(products);
        }
        Ok(self.products.as_deref().unwrap_or_default())
    }

    async fn load<R: crate::db::entity::TableRecord>(&self, stage: Stage, records: &[R]) -> LoadReport {
        let pb = self
            .ui
            .acquire_progress(PStyle::Main, stage.to_string(), records.len() as u64);
        let report = load_records(self.sink, records, self.options.batch_size(), &pb).await;
        pb.maybe_finish_and_clear();
        self.ui.remove(pb);
        report
    }

    #[instrument(level = "info", skip(self))]
    pub async fn sync_products(&mut self) -> Result<(LoadReport, usize)> {
        let products: Vec<Product> = self.odoo_products().await?.iter().map(transform::product).collect();
        Ok((self.load(Stage::Products, &products).await, 0))
    }

    #[instrument(level = "info", skip(self))]
    pub async fn sync_customers(&mut self) -> Result<(LoadReport, usize)> {
        let partners = Extractor::new(self.odoo).company_partners().await?;
        let customers: Vec<Customer> = partners.iter().map(transform::customer).collect();
        Ok((self.load(Stage::Customers, &customers).await, 0))
    }

    #[instrument(level = "info", skip(self))]
    pub async fn sync_stock(&mut self) -> Result<(LoadReport, usize)> {
        let today = self.options.today();
        let stock: Vec<StockRecord> = self
            .odoo_products()
            .await?
            .iter()
            .map(|p| transform::stock(p, today))
            .collect();
        Ok((self.load(Stage::Stock, &stock).await, 0))
    }

    #[instrument(level = "info", skip(self))]
    pub async fn sync_sales(&mut self) -> Result<(LoadReport, usize)> {
        let since = self
            .options
            .today()
            .checked_sub_days(Days::new(self.options.days_back() as u64))
            .unwrap_or(NaiveDate::MIN);
        let products: Vec<Product> = self.odoo_products().await?.iter().map(transform::product).collect();

        let extractor = Extractor::new(self.odoo);
        let orders = extractor.confirmed_orders(since).await?;
        let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let lines = extractor.order_lines(&order_ids).await?;
        info!(orders = orders.len(), lines = lines.len(), %since, "Sale orders extracted");

        let (sales, skipped): (Vec<SalesRecord>, usize) = transform::sales(&lines, &orders, &products);
        if skipped > 0 {
            warn!(skipped, "Sale lines skipped: no product, unknown product or unknown order");
        }
        Ok((self.load(Stage::Sales, &sales).await, skipped))
    }

    async fn run_stage(&mut self, stage: Stage) -> StageOutcome {
        let started_at = Utc::now();
        let timer = Instant::now();

        let result = match stage {
            Stage::Products => self.sync_products().await,
            Stage::Customers => self.sync_customers().await,
            Stage::Stock => self.sync_stock().await,
            Stage::Sales => self.sync_sales().await,
        };

        let duration = timer.elapsed().as_secs_f64();
        let outcome = match result {
            Ok((report, skipped)) => StageOutcome {
                stage,
                status: if report.is_clean() {
                    SyncStatus::Success
                }
                else {
                    SyncStatus::Partial
                },
                error: report.first_error.clone(),
                report,
                skipped,
                duration,
            },
            Err(err) => {
                self.ui.report_error(format!("Stage {stage} failed: {err}"));
                StageOutcome {
                    stage,
                    status: SyncStatus::Failed,
                    report: LoadReport::default(),
                    skipped: 0,
                    error: Some(err.to_string()),
                    duration,
                }
            }
        };

        let entry = SyncLog {
            id: 0,
            sync_type: stage.to_string(),
            status: outcome.status,
            records_processed: outcome.report.processed() as i32,
            records_failed: outcome.report.failed as i32,
            error_message: outcome.error.clone(),
            started_at,
            completed_at: Utc::now(),
            duration_seconds: duration,
        };
        if let Err(err) = self.sink.record_sync(entry).await {
            warn!("Cannot write sync log for {stage}: {err}");
        }

        outcome
    }

    async fn count<R: crate::db::entity::TableRecord>(&self) -> (&'static str, Option<u64>) {
        match self.sink.count::<R>().await {
            Ok(n) => (R::TABLE, Some(n)),
            Err(err) => {
                warn!("Cannot count {}: {err}", R::TABLE);
                (R::TABLE, None)
            }
        }
    }

    /// Runs every stage and collects the outcome.
    #[instrument(level = "info", skip(self), fields(sink = self.sink.name()))]
    pub async fn run(&mut self) -> Result<EtlSummary> {
        if self.options.clean() {
            self.ui.report_info("Cleaning sales and stock tables");
            self.sink.clear::<SalesRecord>().await?;
            self.sink.clear::<StockRecord>().await?;
        }

        let mut summary = EtlSummary::default();
        for stage in Stage::iter() {
            self.ui.report_info(format!("Synchronizing {stage}"));
            let outcome = self.run_stage(stage).await;
            if outcome.status != SyncStatus::Failed {
                self.ui.report_info(format!(
                    "{stage}: {} loaded, {} failed",
                    outcome.report.loaded, outcome.report.failed
                ));
            }
            summary.stages.push(outcome);
        }

        summary.counts = vec![
            self.count::<Product>().await,
            self.count::<Customer>().await,
            self.count::<StockRecord>().await,
            self.count::<SalesRecord>().await,
        ];

        Ok(summary)
    }
}
