//! `optiflow-generate-test-data`: fills an Odoo database with a simulated sales history.

use clap::Parser;
use fieldx::fxstruct;
use garde::Validate;

use super::training::dataset_table;
use crate::config::OdooArgs;
use crate::config::OutputArgs;
use crate::etl::extract::Extractor;
use crate::etl::transform;
use crate::generator::Generator;
use crate::odoo::OdooClient;
use crate::progress::MaybeProgress;
use crate::progress::PStyle;
use crate::progress::ProgressUI;
use crate::seeder::OdooSeeder;
use crate::seeder::SeedReport;
use crate::types::opterr;
use crate::types::OptiError;
use crate::types::Result;

#[derive(Debug, Clone, Parser, Validate)]
#[fxstruct(no_new, get(copy))]
#[clap(about, version, name = "optiflow-generate-test-data")]
pub struct Cli {
    #[clap(flatten)]
    #[fieldx(get(clone))]
    #[garde(dive)]
    odoo: OdooArgs,

    #[clap(flatten)]
    #[fieldx(get(clone))]
    #[garde(dive)]
    output: OutputArgs,

    /// Simulated year.
    #[clap(long, env = "OPTIFLOW_YEAR", default_value_t = 2024)]
    #[garde(range(min = 2000, max = 2100))]
    year: i32,

    #[clap(long, default_value_t = 1)]
    #[garde(range(min = 1, max = 12), custom(super::not_after("--to-month", &self.to_month)))]
    from_month: u32,

    #[clap(long, default_value_t = 11)]
    #[garde(range(min = 1, max = 12))]
    to_month: u32,

    #[clap(long, env = "OPTIFLOW_SEED")]
    #[garde(skip)]
    seed: Option<u64>,

    #[clap(long, default_value_t = 0.2)]
    #[garde(range(min = 0.0, max = 1.0))]
    noise: f64,

    /// Odoo product type treated as stockable.
    #[clap(long, env = "OPTIFLOW_PRODUCT_TYPE", default_value = "product")]
    #[fieldx(get(clone))]
    #[garde(length(min = 1))]
    product_type: String,

    /// Write without asking.
    #[clap(long, short)]
    #[garde(skip)]
    yes: bool,

    /// Generate and summarize, but write nothing.
    #[clap(long)]
    #[garde(skip)]
    dry_run: bool,
}

impl Cli {
    pub fn generator(&self) -> Result<Generator> {
        let (start, end) = Generator::months(self.year, self.from_month, self.to_month)?;
        Generator::builder()
            .start(start)
            .end(end)
            .noise(self.noise)
            .seed(self.seed)
            .build()
            .map_err(|err| opterr!("Cannot set up generator: {err}"))
    }
}

pub fn report_table(report: &SeedReport) -> comfy_table::Table {
    let mut table = comfy_table::Table::new();
    table.set_header(vec!["Customers created", "Orders", "Failed orders", "Deliveries", "Adjustments"]);
    table.add_row(vec![
        report.customers_created.to_string(),
        report.orders_created.to_string(),
        report.orders_failed.to_string(),
        report.pickings_validated.to_string(),
        report.adjustments.to_string(),
    ]);
    table
}

pub async fn execute(cli: &Cli, ui: &ProgressUI) -> Result<Option<SeedReport>> {
    let generator = cli.generator()?;
    let odoo = OdooClient::connect(&cli.odoo).await?;
    ui.report_info(format!("Connected to Odoo {} as {}", odoo.version().server_version, odoo.username()));

    let products: Vec<_> = Extractor::new(&odoo)
        .products(&cli.product_type)
        .await?
        .iter()
        .map(transform::product)
        .filter(|p| p.is_active)
        .collect();
    if products.is_empty() {
        return Err(OptiError::config(format!(
            "Odoo has no active products of type '{}'",
            cli.product_type
        )));
    }

    let mut seeder = OdooSeeder::new(&odoo, ui);
    let customers = if cli.dry_run {
        Vec::new()
    }
    else {
        confirm_write(cli, &odoo)?;
        seeder.ensure_customers().await?
    };

    let pb = ui.acquire_progress(PStyle::Main, "simulating", generator.days() as u64);
    let dataset = generator.generate_for(&products, customers, &pb)?;
    pb.maybe_finish_and_clear();
    ui.remove(pb);
    ui.report_block(dataset_table(&dataset));

    if cli.dry_run {
        return Ok(None);
    }
    Ok(Some(seeder.seed(&dataset).await?))
}

fn confirm_write(cli: &Cli, odoo: &OdooClient) -> Result<()> {
    if cli.yes {
        return Ok(());
    }
    let question = format!(
        "This creates sale orders and stock adjustments in database '{}'. Continue?",
        odoo.database()
    );
    if super::confirm(&question)? {
        Ok(())
    }
    else {
        Err(OptiError::config("Aborted: pass --yes to write without asking"))
    }
}

pub async fn run() -> Result<()> {
    let cli: Cli = super::parse_cli();
    let output = cli.output();
    super::setup_tracing(&output)?;
    let ui = super::progress_ui(&output)?;

    if let Some(report) = execute(&cli, &ui).await? {
        ui.report_block(report_table(&report));
        if report.orders_failed > 0 {
            ui.report_warn(format!("{} order(s) could not be created", report.orders_failed));
        }
    }
    ui.finish();
    Ok(())
}
