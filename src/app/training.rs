//! `optiflow-generate-training-data`: a seasonal sales and stock history for the products in the store.

use std::path::PathBuf;

use clap::Parser;
use comfy_table::CellAlignment;
use fieldx::fxstruct;
use garde::Validate;
use num_format::Locale;
use num_format::ToFormattedString;
use tracing::info;

use crate::config::LoadArgs;
use crate::config::OutputArgs;
use crate::config::SupabaseArgs;
use crate::db::entity::Customer;
use crate::db::entity::Product;
use crate::db::entity::SalesRecord;
use crate::db::entity::StockRecord;
use crate::db::entity::TableRecord;
use crate::generator::demo_catalog;
use crate::generator::Dataset;
use crate::generator::Generator;
use crate::loader::load_records;
use crate::loader::LoadReport;
use crate::loader::Sink;
use crate::progress::MaybeProgress;
use crate::progress::PStyle;
use crate::progress::ProgressUI;
use crate::types::opterr;
use crate::types::OptiError;
use crate::types::Result;

#[derive(Debug, Clone, Parser, Validate)]
#[fxstruct(no_new, get(copy))]
#[clap(about, version, name = "optiflow-generate-training-data")]
pub struct Cli {
    #[clap(flatten)]
    #[fieldx(get(clone))]
    #[garde(dive)]
    supabase: SupabaseArgs,

    #[clap(flatten)]
    #[fieldx(get(clone))]
    #[garde(dive)]
    load: LoadArgs,

    #[clap(flatten)]
    #[fieldx(get(clone))]
    #[garde(dive)]
    output: OutputArgs,

    /// Simulated year.
    #[clap(long, env = "OPTIFLOW_YEAR", default_value_t = 2024)]
    #[garde(range(min = 2000, max = 2100))]
    year: i32,

    /// First simulated month.
    #[clap(long, default_value_t = 1)]
    #[garde(range(min = 1, max = 12), custom(super::not_after("--to-month", &self.to_month)))]
    from_month: u32,

    /// Last simulated month, inclusive.
    #[clap(long, default_value_t = 11)]
    #[garde(range(min = 1, max = 12))]
    to_month: u32,

    /// Seed for a reproducible run.
    #[clap(long, env = "OPTIFLOW_SEED")]
    #[garde(skip)]
    seed: Option<u64>,

    /// Relative noise of the daily demand rate.
    #[clap(long, default_value_t = 0.2)]
    #[garde(range(min = 0.0, max = 1.0))]
    noise: f64,

    /// Customers to invent when the store has none.
    #[clap(long, default_value_t = 25)]
    #[garde(range(min = 1))]
    customers: usize,

    /// Use the built-in office catalog instead of the products in the store.
    #[clap(long)]
    #[garde(skip)]
    demo_catalog: bool,

    /// Write the generated dataset into FILE and stop.
    #[clap(long, value_name = "FILE", conflicts_with = "load_from")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    save: Option<PathBuf>,

    /// Load a dataset written by `--save` instead of generating one.
    #[clap(long = "load", value_name = "FILE")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    load_from: Option<PathBuf>,
}

impl Cli {
    pub fn generator(&self) -> Result<Generator> {
        let (start, end) = Generator::months(self.year, self.from_month, self.to_month)?;
        Generator::builder()
            .start(start)
            .end(end)
            .noise(self.noise)
            .customer_count(self.customers)
            .seed(self.seed)
            .build()
            .map_err(|err| opterr!("Cannot set up generator: {err}"))
    }
}

/// What a training run loaded.
#[derive(Debug, Default)]
pub struct TrainingReport {
    pub loads: Vec<LoadReport>,
}

impl TrainingReport {
    pub fn failed(&self) -> usize {
        self.loads.iter().map(|r| r.failed).sum()
    }

    pub fn table(&self) -> comfy_table::Table {
        let mut table = comfy_table::Table::new();
        table.set_header(vec!["Table", "Loaded", "Failed"]);
        for report in &self.loads {
            table.add_row(vec![
                report.table.to_string(),
                report.loaded.to_formatted_string(&Locale::en),
                report.failed.to_formatted_string(&Locale::en),
            ]);
        }
        for column in table.column_iter_mut().skip(1) {
            column.set_cell_alignment(CellAlignment::Right);
        }
        table
    }
}

pub fn dataset_table(dataset: &Dataset) -> comfy_table::Table {
    let mut table = comfy_table::Table::new();
    table.set_header(vec!["Period", "Products", "Customers", "Sales", "Units", "Revenue", "Restocks"]);
    let period = dataset
        .date_range()
        .map_or_else(|| "-".to_string(), |(first, last)| format!("{first} .. {last}"));
    table.add_row(vec![
        period,
        dataset.products.len().to_formatted_string(&Locale::en),
        dataset.customers.len().to_formatted_string(&Locale::en),
        dataset.sales.len().to_formatted_string(&Locale::en),
        dataset.units_sold().to_formatted_string(&Locale::en),
        format!("{:.2}", dataset.revenue()),
        dataset.replenishments().to_formatted_string(&Locale::en),
    ]);
    table
}

/// Products to simulate: the demo catalog or the active products already in the store.
pub async fn catalog<S: Sink>(sink: &S, demo: bool) -> Result<Vec<Product>> {
    if demo {
        return Ok(demo_catalog());
    }

    let products: Vec<Product> = sink
        .fetch_all::<Product>()
        .await?
        .into_iter()
        .filter(|p| p.is_active)
        .collect();
    if products.is_empty() {
        return Err(OptiError::config(
            "No active products in the store; run optiflow-etl first or pass --demo-catalog",
        ));
    }
    Ok(products)
}

/// Generates a dataset for `products`, selling to the customers already in the store when there are any.
pub async fn generate<S: Sink>(sink: &S, generator: &Generator, products: &[Product], ui: &ProgressUI) -> Result<Dataset> {
    let customers = sink.fetch_all::<Customer>().await?;
    info!(products = products.len(), customers = customers.len(), "Generating");

    let pb = ui.acquire_progress(PStyle::Main, "simulating", generator.days() as u64);
    let dataset = generator.generate_for(products, customers, &pb);
    pb.maybe_finish_and_clear();
    ui.remove(pb);
    dataset
}

async fn load_table<S: Sink, R: TableRecord>(sink: &S, records: &[R], batch_size: usize, ui: &ProgressUI) -> LoadReport {
    let pb = ui.acquire_progress(PStyle::Main, R::TABLE, records.len() as u64);
    let report = load_records(sink, records, batch_size, &pb).await;
    pb.maybe_finish_and_clear();
    ui.remove(pb);
    if !report.is_clean() {
        ui.report_warn(format!("{}: {} record(s) failed", R::TABLE, report.failed));
    }
    report
}

/// Writes `dataset` into the store. Products and customers are upserted too so that every sale and stock row
/// references an existing record.
pub async fn load<S: Sink>(sink: &S, dataset: &Dataset, load: &LoadArgs, ui: &ProgressUI) -> Result<TrainingReport> {
    if load.clean() {
        ui.report_info("Cleaning sales and stock tables");
        sink.clear::<SalesRecord>().await?;
        sink.clear::<StockRecord>().await?;
    }

    let batch_size = load.batch_size();
    Ok(TrainingReport {
        loads: vec![
            load_table(sink, &dataset.products, batch_size, ui).await,
            load_table(sink, &dataset.customers, batch_size, ui).await,
            load_table(sink, &dataset.sales, batch_size, ui).await,
            load_table(sink, &dataset.stock, batch_size, ui).await,
        ],
    })
}

/// Opens the sink, produces the dataset (or reads it back) and loads it.
pub async fn execute(cli: &Cli, ui: &ProgressUI) -> Result<TrainingReport> {
    if let Some(file) = cli.load_from() {
        let dataset = Dataset::load(&file)?;
        ui.report_info(format!("Dataset read from {}", file.display()));
        ui.report_block(dataset_table(&dataset));
        let sink = super::open_sink(&cli.load, &cli.supabase).await?;
        return load(&sink, &dataset, &cli.load, ui).await;
    }

    let sink = super::open_sink(&cli.load, &cli.supabase).await?;
    let generator = cli.generator()?;
    let products = catalog(&sink, cli.demo_catalog).await?;
    let dataset = generate(&sink, &generator, &products, ui).await?;
    ui.report_block(dataset_table(&dataset));

    if let Some(file) = cli.save() {
        dataset.save(&file, !ui.quiet())?;
        ui.report_info(format!("Dataset saved to {}", file.display()));
        return Ok(TrainingReport::default());
    }

    load(&sink, &dataset, &cli.load, ui).await
}

pub async fn run() -> Result<()> {
    let cli: Cli = super::parse_cli();
    let output = cli.output();
    super::setup_tracing(&output)?;
    let ui = super::progress_ui(&output)?;

    let report = execute(&cli, &ui).await?;
    if !report.loads.is_empty() {
        ui.report_block(report.table());
    }
    ui.finish();

    match report.failed() {
        0 => Ok(()),
        n => Err(opterr!("{n} record(s) could not be loaded")),
    }
}
