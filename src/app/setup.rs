//! `optiflow-setup`: first-run checks, schema migration and optionally a full initial load.

use std::path::Path;

use clap::Parser;
use fieldx::fxstruct;
use garde::Validate;

use crate::config::LoadArgs;
use crate::config::OdooArgs;
use crate::config::OutputArgs;
use crate::config::SupabaseArgs;
use crate::db::driver;
use crate::etl::EtlOptions;
use crate::generator::Generator;
use crate::odoo::OdooClient;
use crate::progress::ProgressUI;
use crate::supabase::SupabaseClient;
use crate::types::opterr;
use crate::types::OptiError;
use crate::types::Result;

#[derive(Debug, Clone, Parser, Validate)]
#[fxstruct(no_new, get(copy))]
#[clap(about, version, name = "optiflow-setup")]
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

    /// Create or upgrade the schema at DATABASE_URL.
    #[clap(long)]
    #[garde(custom(Self::needs_database_url(&self.load)))]
    migrate: bool,

    /// Run the ETL and the training-data generator once everything checks out.
    #[clap(long)]
    #[garde(skip)]
    run_all: bool,
}

impl Cli {
    fn needs_database_url<'a>(load: &'a LoadArgs) -> impl FnOnce(&'a bool, &()) -> garde::Result {
        move |migrate, _| {
            if *migrate && load.database_url().is_none() {
                Err(garde::Error::new("--migrate requires DATABASE_URL"))
            }
            else {
                Ok(())
            }
        }
    }
}

/// Reports whether `dir` has a `.env`, pointing at `.env.example` when it doesn't.
pub fn check_env_file(dir: &Path, ui: &ProgressUI) -> bool {
    if dir.join(".env").is_file() {
        ui.report_info(".env found");
        true
    }
    else if dir.join(".env.example").is_file() {
        ui.report_warn("No .env file: copy .env.example to .env and fill in the credentials");
        false
    }
    else {
        ui.report_warn("No .env file: settings must come from the environment or flags");
        false
    }
}

pub async fn migrate(url: &str, ui: &ProgressUI) -> Result<()> {
    let driver = driver::connect(url).await?;
    driver.migrate().await?;
    ui.report_info(format!("Schema is up to date ({})", driver.name()));
    Ok(())
}

pub async fn execute(cli: &Cli, ui: &ProgressUI) -> Result<()> {
    let cwd = std::env::current_dir()?;
    check_env_file(&cwd, ui);

    let odoo = OdooClient::connect(&cli.odoo)
        .await
        .map_err(|err| err.with_context("Odoo connection"))?;
    ui.report_info(format!(
        "Odoo {} reachable, logged in as {}",
        odoo.version().server_version,
        odoo.username()
    ));

    SupabaseClient::connect(&cli.supabase)
        .await
        .map_err(|err| err.with_context("Supabase connection"))?;
    ui.report_info("Supabase reachable");

    if cli.migrate {
        let url = cli
            .load
            .database_url()
            .ok_or_else(|| OptiError::config("--migrate requires DATABASE_URL"))?;
        migrate(&url, ui).await?;
    }

    if cli.run_all {
        let options = EtlOptions::builder()
            .batch_size(cli.load.batch_size())
            .clean(cli.load.clean())
            .build()
            .map_err(|err| opterr!("Cannot set up ETL options: {err}"))?;
        let summary = super::etl::execute(&cli.odoo, &cli.supabase, &cli.load, options, ui).await?;
        if summary.failed_stages() > 0 {
            return Err(opterr!("{} ETL stage(s) failed", summary.failed_stages()));
        }

        let sink = super::open_sink(&cli.load, &cli.supabase).await?;
        let generator = Generator::builder()
            .build()
            .map_err(|err| opterr!("Cannot set up generator: {err}"))?;
        let products = super::training::catalog(&sink, false).await?;
        let dataset = super::training::generate(&sink, &generator, &products, ui).await?;
        ui.report_block(super::training::dataset_table(&dataset));
        let report = super::training::load(&sink, &dataset, &cli.load, ui).await?;
        ui.report_block(report.table());
    }

    ui.report_info("Setup complete");
    Ok(())
}

pub async fn run() -> Result<()> {
    let cli: Cli = super::parse_cli();
    let output = cli.output();
    super::setup_tracing(&output)?;
    let ui = super::progress_ui(&output)?;

    let outcome = execute(&cli, &ui).await;
    ui.finish();
    outcome
}
