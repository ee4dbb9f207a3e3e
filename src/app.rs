//! Plumbing shared by the command line tools: logging, validation, progress UI and sink selection.

pub mod check;
pub mod etl;
pub mod setup;
pub mod test_data;
pub mod training;

use std::fmt::Display;
use std::fs::File;
use std::sync::Arc;
use std::sync::Mutex;

use clap::error::ErrorKind;
use clap::Parser;
use garde::Validate;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::load_dotenv;
use crate::config::LoadArgs;
use crate::config::OutputArgs;
use crate::config::SinkKind;
use crate::config::SupabaseArgs;
use crate::db::driver;
use crate::loader::AnySink;
use crate::loader::RestSink;
use crate::loader::SqlSink;
use crate::progress::ProgressUI;
use crate::supabase::SupabaseClient;
use crate::types::opterr;
use crate::types::OptiError;
use crate::types::Result;

/// Installs the global subscriber. `RUST_LOG` wins; otherwise warnings go to stderr, or everything from `info` up
/// goes to the log file when one is given.
pub fn setup_tracing(output: &OutputArgs) -> Result<()> {
    let default_level = if output.log_file().is_some() { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = if let Some(path) = output.log_file() {
        let file = File::create(&path).map_err(|err| opterr!("Cannot create log file {}: {err}", path.display()))?;
        builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
    }
    else {
        builder.with_writer(std::io::stderr).try_init()
    };

    if installed.is_err() {
        debug!("Tracing subscriber already installed");
    }
    Ok(())
}

/// Parses the command line after `.env` has been read, then runs garde validation. Invalid values end the process
/// the way clap reports its own errors.
pub fn parse_cli<C: Parser + Validate<Context = ()>>() -> C {
    load_dotenv();
    let cli = C::parse();
    if let Err(err) = cli.validate() {
        let mut cmd = C::command();
        cmd.error(ErrorKind::InvalidValue, err).exit();
    }
    cli
}

/// Garde check for a field that must not exceed another one, e.g. a month range.
pub(crate) fn not_after<'a, T: PartialOrd + Display>(
    max_name: &'static str,
    max: &'a T,
) -> impl FnOnce(&'a T, &()) -> garde::Result {
    move |value, _| {
        if value > max {
            Err(garde::Error::new(format!("{} is after {max_name} ({})", *value, *max)))
        }
        else {
            Ok(())
        }
    }
}

pub fn progress_ui(output: &OutputArgs) -> Result<ProgressUI> {
    ProgressUI::builder()
        .quiet(output.quiet())
        .build()
        .map_err(|err| opterr!("Cannot set up progress UI: {err}"))
}

/// Opens the sink `load` asks for. A SQL sink gets its schema migrated first.
pub async fn open_sink(load: &LoadArgs, supabase: &SupabaseArgs) -> Result<AnySink> {
    match load.sink() {
        SinkKind::Rest => Ok(AnySink::Rest(RestSink::new(SupabaseClient::connect(supabase).await?))),
        SinkKind::Db => {
            let url = load
                .database_url()
                .ok_or_else(|| OptiError::config("--sink db requires DATABASE_URL"))?;
            let driver: Arc<dyn driver::DatabaseDriver> = Arc::from(driver::connect(&url).await?);
            driver.migrate().await?;
            Ok(AnySink::Sql(SqlSink::new(driver)))
        }
    }
}

/// Asks a yes/no question on the terminal. Anything but `y`/`yes` is a no, and so is a non-interactive session.
pub fn confirm(question: &str) -> Result<bool> {
    let term = console::Term::stderr();
    if !term.is_term() {
        return Ok(false);
    }
    term.write_str(&format!("{question} [y/N] "))?;
    let answer = term.read_line()?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Shared tail of every binary's `main`: prints a failure and maps it to exit code 1.
pub fn finish(name: &str, outcome: Result<()>) -> std::process::ExitCode {
    match outcome {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            err.report(name);
            std::process::ExitCode::FAILURE
        }
    }
}
