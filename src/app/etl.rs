use clap::Parser;
use fieldx::fxstruct;
use garde::Validate;

use crate::config::LoadArgs;
use crate::config::OdooArgs;
use crate::config::OutputArgs;
use crate::config::SupabaseArgs;
use crate::etl::EtlOptions;
use crate::etl::EtlSummary;
use crate::etl::Pipeline;
use crate::odoo::OdooClient;
use crate::progress::ProgressUI;
use crate::types::opterr;
use crate::types::Result;

/// Copies products, customers, stock levels and recent sales from Odoo into the store.
#[derive(Debug, Clone, Parser, Validate)]
#[fxstruct(no_new, get(copy))]
#[clap(about, version, name = "optiflow-etl")]
pub struct Cli {
    #[clap(flatten)]
    #[fieldx(get(clone))]
    #[garde(dive)]
    odoo: OdooArgs,

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

    /// Days of confirmed sale orders to copy.
    #[clap(long, env = "OPTIFLOW_DAYS_BACK", default_value_t = 30)]
    #[garde(range(min = 1, max = 3650))]
    days_back: u32,

    /// Odoo product type treated as stockable.
    #[clap(long, env = "OPTIFLOW_PRODUCT_TYPE", default_value = "product")]
    #[fieldx(get(clone))]
    #[garde(length(min = 1))]
    product_type: String,
}

impl Cli {
    pub fn options(&self) -> Result<EtlOptions> {
        EtlOptions::builder()
            .product_type(self.product_type.clone())
            .days_back(self.days_back)
            .batch_size(self.load.batch_size())
            .clean(self.load.clean())
            .build()
            .map_err(|err| opterr!("Cannot set up ETL options: {err}"))
    }
}

/// Connects to both ends and runs the pipeline once.
pub async fn execute(
    odoo_args: &OdooArgs,
    supabase: &SupabaseArgs,
    load: &LoadArgs,
    options: EtlOptions,
    ui: &ProgressUI,
) -> Result<EtlSummary> {
    let odoo = OdooClient::connect(odoo_args).await?;
    ui.report_info(format!(
        "Connected to Odoo {} as {} (uid {})",
        odoo.version().server_version,
        odoo.username(),
        odoo.uid()
    ));

    let sink = super::open_sink(load, supabase).await?;
    ui.report_info(format!("Loading into {}", crate::loader::Sink::name(&sink)));

    let summary = Pipeline::new(&odoo, &sink, ui, options).run().await?;
    ui.report_block(summary.table());
    ui.report_block(summary.counts_table());
    Ok(summary)
}

pub async fn run() -> Result<()> {
    let cli: Cli = super::parse_cli();
    let output = cli.output();
    super::setup_tracing(&output)?;
    let ui = super::progress_ui(&output)?;

    let summary = execute(&cli.odoo, &cli.supabase, &cli.load, cli.options()?, &ui).await?;
    ui.finish();

    match summary.failed_stages() {
        0 => Ok(()),
        n => Err(opterr!("{n} ETL stage(s) failed")),
    }
}
