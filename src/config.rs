//! Connection and loading settings shared by all the command line tools.
//!
//! Every setting can be given as a flag or through the environment. A `.env` file in the working directory is read
//! before the command line is parsed, see [`load_dotenv`].

use std::path::PathBuf;

use clap::ValueEnum;
use fieldx::fxstruct;
use garde::Validate;
use reqwest::Url;
use tracing::debug;

use crate::types::OptiError;
use crate::types::Result;

/// Loads `.env` from the current directory when there is one. Returns the path of the loaded file.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            debug!("Environment loaded from {}", path.display());
            Some(path)
        }
        Err(err) if err.not_found() => None,
        Err(err) => {
            eprintln!("Ignoring malformed .env file: {err}");
            None
        }
    }
}

fn http_url(value: &String, _: &()) -> garde::Result {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(url) => Err(garde::Error::new(format!("unsupported URL scheme '{}'", url.scheme()))),
        Err(err) => Err(garde::Error::new(format!("'{value}' is not a valid URL: {err}"))),
    }
}

#[derive(Debug, Clone, clap::Args, Validate)]
#[fxstruct(no_new, get(copy))]
pub struct OdooArgs {
    /// Odoo host name. A full `http(s)://` URL is accepted too.
    #[clap(long = "odoo-host", env = "ODOO_HOST", default_value = "localhost")]
    #[fieldx(get(clone))]
    #[garde(length(min = 1))]
    host: String,

    #[clap(long = "odoo-port", env = "ODOO_PORT", default_value_t = 8069)]
    #[garde(range(min = 1))]
    port: u16,

    /// Odoo database name.
    #[clap(long = "odoo-db", env = "ODOO_DB")]
    #[fieldx(get(clone))]
    #[garde(length(min = 1))]
    database: String,

    #[clap(long = "odoo-username", env = "ODOO_USERNAME")]
    #[fieldx(get(clone))]
    #[garde(length(min = 1))]
    username: String,

    #[clap(long = "odoo-password", env = "ODOO_PASSWORD", hide_env_values = true)]
    #[fieldx(get(clone))]
    #[garde(length(min = 1))]
    password: String,

    /// Seconds to wait for a single RPC call.
    #[clap(long = "odoo-timeout", env = "OPTIFLOW_ODOO_TIMEOUT", default_value_t = 60)]
    #[garde(range(min = 1))]
    timeout: u64,
}

impl OdooArgs {
    pub fn new<S: Into<String>>(host: S, port: u16, database: S, username: S, password: S) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
            username: username.into(),
            password: password.into(),
            timeout: 60,
        }
    }

    /// Base URL of the instance. A bare host gets `http://` and the configured port; a URL without an explicit port
    /// gets the configured one.
    pub fn base_url(&self) -> Result<Url> {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            let mut url =
                Url::parse(host).map_err(|err| OptiError::config(format!("Bad Odoo URL '{host}': {err}")))?;
            if url.port().is_none() && url.scheme() == "http" {
                url.set_port(Some(self.port))
                    .map_err(|_| OptiError::config(format!("Cannot set port on '{host}'")))?;
            }
            Ok(url)
        }
        else {
            Url::parse(&format!("http://{host}:{}", self.port))
                .map_err(|err| OptiError::config(format!("Bad Odoo host '{host}': {err}")))
        }
    }
}

#[derive(Debug, Clone, clap::Args, Validate)]
#[fxstruct(no_new, get(clone))]
pub struct SupabaseArgs {
    /// Project URL, e.g. `https://xyzcompany.supabase.co`.
    #[clap(long = "supabase-url", env = "SUPABASE_URL")]
    #[garde(custom(http_url))]
    url: String,

    /// Service role or anon key.
    #[clap(long = "supabase-key", env = "SUPABASE_KEY", hide_env_values = true)]
    #[garde(length(min = 1))]
    key: String,
}

impl SupabaseArgs {
    pub fn new<S: Into<String>>(url: S, key: S) -> Self {
        Self {
            url: url.into(),
            key: key.into(),
        }
    }
}

/// Where loaded records go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SinkKind {
    /// Supabase REST API.
    Rest,
    /// Direct SQL connection given by `DATABASE_URL`.
    Db,
}

#[derive(Debug, Clone, clap::Args, Validate)]
#[fxstruct(no_new, get(copy))]
pub struct LoadArgs {
    /// Destination of the loaded records.
    #[clap(long, env = "OPTIFLOW_SINK", value_enum, default_value_t = SinkKind::Rest)]
    #[garde(custom(Self::needs_database_url(&self.database_url)))]
    sink: SinkKind,

    /// SQL connection URL (`postgres://...` or `sqlite://...`) for `--sink db` and migrations.
    #[clap(long, env = "DATABASE_URL", hide_env_values = true)]
    #[fieldx(get(clone))]
    #[garde(skip)]
    database_url: Option<String>,

    /// Records per upsert request.
    #[clap(long, env = "OPTIFLOW_BATCH_SIZE", default_value_t = 1000)]
    #[garde(range(min = 1, max = 10_000))]
    batch_size: usize,

    /// Empty the fact tables before loading.
    #[clap(long, env = "OPTIFLOW_CLEAN", default_value_t = false)]
    #[garde(skip)]
    clean: bool,
}

impl LoadArgs {
    fn needs_database_url<'a>(url: &'a Option<String>) -> impl FnOnce(&'a SinkKind, &()) -> garde::Result {
        move |sink, _| {
            if *sink == SinkKind::Db && url.is_none() {
                Err(garde::Error::new("--sink db requires DATABASE_URL"))
            }
            else {
                Ok(())
            }
        }
    }
}

/// Output related flags.
#[derive(Debug, Clone, clap::Args, Validate)]
#[fxstruct(no_new, get(copy))]
pub struct OutputArgs {
    /// Silence the output.
    #[clap(long, short, env = "OPTIFLOW_QUIET", default_value_t = false)]
    #[garde(skip)]
    quiet: bool,

    /// File to send the log into.
    #[clap(long, env = "OPTIFLOW_LOG_FILE")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    log_file: Option<PathBuf>,
}
