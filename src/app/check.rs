//! `optiflow-test-connection`: verifies both sessions and reports what the pipeline will find in Odoo.

use clap::Parser;
use comfy_table::CellAlignment;
use fieldx::fxstruct;
use garde::Validate;
use num_format::Locale;
use num_format::ToFormattedString;
use serde_json::json;
use serde_json::Value;
use tracing::warn;

use crate::config::OdooArgs;
use crate::config::OutputArgs;
use crate::config::SupabaseArgs;
use crate::odoo::Domain;
use crate::odoo::OdooClient;
use crate::odoo::SearchOptions;
use crate::progress::ProgressUI;
use crate::supabase::SupabaseClient;
use crate::types::OptiError;
use crate::types::Result;

/// Models the pipeline and the test-data writer rely on.
pub const MODELS: &[&str] = &[
    "product.product",
    "product.template",
    "stock.quant",
    "stock.move",
    "stock.location",
    "sale.order",
    "sale.order.line",
    "res.partner",
];

const WRITE_CHECK_NAME: &str = "OptiFlow write check";

#[derive(Debug, Clone, Parser, Validate)]
#[fxstruct(no_new, get(copy))]
#[clap(about, version, name = "optiflow-test-connection")]
pub struct Cli {
    #[clap(flatten)]
    #[fieldx(get(clone))]
    #[garde(dive)]
    odoo: OdooArgs,

    /// Project URL. Not needed with `--skip-supabase`.
    #[clap(long, env = "SUPABASE_URL", required_unless_present = "skip_supabase")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    supabase_url: Option<String>,

    #[clap(
        long,
        env = "SUPABASE_KEY",
        hide_env_values = true,
        required_unless_present = "skip_supabase"
    )]
    #[fieldx(get(clone))]
    #[garde(skip)]
    supabase_key: Option<String>,

    #[clap(flatten)]
    #[fieldx(get(clone))]
    #[garde(dive)]
    output: OutputArgs,

    /// Create and delete a product to prove write access.
    #[clap(long)]
    #[garde(skip)]
    write_check: bool,

    /// Leave Supabase alone.
    #[clap(long)]
    #[garde(skip)]
    skip_supabase: bool,

    /// Rows shown per sample.
    #[clap(long, default_value_t = 5)]
    #[garde(range(min = 1, max = 100))]
    samples: u32,
}

impl Cli {
    /// Supabase settings, validated only when the Supabase check is going to run.
    pub fn supabase(&self) -> Result<SupabaseArgs> {
        let (Some(url), Some(key)) = (&self.supabase_url, &self.supabase_key)
        else {
            return Err(OptiError::config("SUPABASE_URL and SUPABASE_KEY are required"));
        };
        let args = SupabaseArgs::new(url.as_str(), key.as_str());
        args.validate()
            .map_err(|err| OptiError::config(format!("Supabase settings: {err}")))?;
        Ok(args)
    }
}

/// Record counts per model. A model that cannot be counted, usually because its module is not installed, is
/// reported as `None`.
pub async fn model_counts(odoo: &OdooClient) -> Vec<(&'static str, Option<u64>)> {
    let mut counts = Vec::with_capacity(MODELS.len());
    for model in MODELS {
        match odoo.search_count(model, &Domain::new()).await {
            Ok(n) => counts.push((*model, Some(n))),
            Err(err) => {
                warn!(model, "Cannot count: {err}");
                counts.push((*model, None));
            }
        }
    }
    counts
}

pub fn counts_table(counts: &[(&'static str, Option<u64>)]) -> comfy_table::Table {
    let mut table = comfy_table::Table::new();
    table.set_header(vec!["Model", "Records"]);
    for (model, count) in counts {
        table.add_row(vec![
            model.to_string(),
            count.map_or_else(|| "n/a".to_string(), |n| n.to_formatted_string(&Locale::en)),
        ]);
    }
    if let Some(column) = table.column_mut(1) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    table
}

fn sample_table(rows: &[Value], columns: &[&str]) -> comfy_table::Table {
    let mut table = comfy_table::Table::new();
    table.set_header(columns.to_vec());
    for row in rows {
        table.add_row(columns.iter().map(|c| cell(&row[*c])).collect::<Vec<_>>());
    }
    table
}

// Many2one pairs show their display name, Odoo's `false` shows as empty.
fn cell(value: &Value) -> String {
    match value {
        Value::Bool(false) | Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(pair) if pair.len() == 2 => pair[1].as_str().unwrap_or_default().to_string(),
        other => other.to_string(),
    }
}

async fn sample(
    odoo: &OdooClient,
    ui: &ProgressUI,
    title: &str,
    model: &str,
    domain: Domain,
    columns: &[&str],
    options: SearchOptions,
) {
    match odoo.search_read::<Value>(model, &domain, columns, &options).await {
        Ok(rows) if rows.is_empty() => ui.report_warn(format!("{title}: none found")),
        Ok(rows) => {
            ui.report_info(format!("{title}:"));
            ui.report_block(sample_table(&rows, columns));
        }
        Err(err) => ui.report_warn(format!("{title}: {err}")),
    }
}

/// Creates a throwaway product and deletes it again.
pub async fn write_check(odoo: &OdooClient) -> Result<i64> {
    let id = odoo
        .create("product.product", json!({ "name": WRITE_CHECK_NAME, "type": "consu" }))
        .await?;
    odoo.unlink("product.product", &[id]).await?;
    Ok(id)
}

pub async fn execute(cli: &Cli, ui: &ProgressUI) -> Result<()> {
    let odoo = OdooClient::connect(&cli.odoo).await?;
    ui.report_info(format!(
        "Odoo {} (protocol {}) at {}: logged in as {} (uid {}) to '{}'",
        odoo.version().server_version,
        odoo.version()
            .protocol_version
            .map_or_else(|| "?".to_string(), |v| v.to_string()),
        cli.odoo.base_url()?,
        odoo.username(),
        odoo.uid(),
        odoo.database()
    ));

    ui.report_block(counts_table(&model_counts(&odoo).await));

    let limit = SearchOptions::limit(cli.samples);
    sample(
        &odoo,
        ui,
        "Stockable products",
        "product.product",
        Domain::new().eq("type", "product"),
        &["id", "name", "default_code", "list_price", "qty_available"],
        limit.clone().ordered("id"),
    )
    .await;
    sample(
        &odoo,
        ui,
        "Internal locations",
        "stock.location",
        Domain::new().eq("usage", "internal"),
        &["id", "complete_name"],
        limit.clone().ordered("id"),
    )
    .await;
    sample(
        &odoo,
        ui,
        "Recent sale orders",
        "sale.order",
        Domain::new(),
        &["name", "partner_id", "date_order", "state", "amount_total"],
        limit.ordered("date_order desc"),
    )
    .await;

    if cli.write_check {
        let id = write_check(&odoo).await?;
        ui.report_info(format!("Write access confirmed (product {id} created and removed)"));
    }

    if !cli.skip_supabase {
        let supabase = SupabaseClient::connect(&cli.supabase()?).await?;
        let products = supabase.count("products").await?;
        ui.report_info(format!(
            "Supabase reachable: {} product(s) stored",
            products.to_formatted_string(&Locale::en)
        ));
    }

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_render_odoo_values() {
        assert_eq!(cell(&json!(false)), "");
        assert_eq!(cell(&json!([3, "Azure Interior"])), "Azure Interior");
        assert_eq!(cell(&json!(12.5)), "12.5");
        assert_eq!(cell(&json!("SO001")), "SO001");
    }

    const ODOO: &[&str] = &[
        "optiflow-test-connection",
        "--odoo-db",
        "d",
        "--odoo-username",
        "u",
        "--odoo-password",
        "p",
    ];

    fn parse(extra: &[&str]) -> std::result::Result<Cli, clap::Error> {
        std::env::remove_var("SUPABASE_URL");
        std::env::remove_var("SUPABASE_KEY");
        Cli::try_parse_from(ODOO.iter().chain(extra))
    }

    #[test]
    fn skip_supabase_needs_no_credentials() {
        let cli = parse(&["--skip-supabase"]).unwrap();
        assert!(cli.skip_supabase());
        assert!(cli.validate().is_ok());
        assert!(cli.supabase().is_err());
    }

    #[test]
    fn supabase_credentials_required_otherwise() {
        let err = parse(&[]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let cli = parse(&["--supabase-url", "https://abc.supabase.co", "--supabase-key", "k"]).unwrap();
        assert_eq!(cli.supabase().unwrap().url(), "https://abc.supabase.co");

        let cli = parse(&["--supabase-url", "ftp://abc", "--supabase-key", "k"]).unwrap();
        assert!(cli.supabase().is_err());
    }

    #[test]
    fn uncountable_models_show_na() {
        let table = counts_table(&[("sale.order", Some(1234)), ("stock.move", None)]).to_string();
        assert!(table.contains("1,234"), "{table}");
        assert!(table.contains("n/a"), "{table}");
    }
}
