use std::fmt::Debug;
use std::fmt::Display;

use sea_orm::sea_query::StringLen;
use sea_orm::DeriveActiveEnum;
use sea_orm::EnumIter;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

pub type Result<T, E = OptiError> = std::result::Result<T, E>;

/// Everything that can go wrong in the bridge.
#[derive(Debug, Error)]
pub enum OptiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{service} authentication failed: {reason}")]
    Auth { service: &'static str, reason: String },

    #[error("Odoo RPC fault {code}: {message}{}", fault_detail(.data))]
    Rpc {
        code:    i64,
        message: String,
        data:    Option<String>,
    },

    #[error("{service} responded with HTTP {status}: {body}")]
    Api {
        service: &'static str,
        status:  u16,
        body:    String,
    },

    #[error("Generator: {0}")]
    Generator(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Postcard(#[from] postcard::Error),

    #[error(transparent)]
    Cli(#[from] clap::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OptiError {
    pub fn config<S: ToString>(msg: S) -> Self {
        Self::Config(msg.to_string())
    }

    pub fn auth<S: ToString>(service: &'static str, reason: S) -> Self {
        Self::Auth {
            service,
            reason: reason.to_string(),
        }
    }

    /// Errors that mean a session could not be established at all.
    pub fn is_connection_failure(&self) -> bool {
        match self {
            Self::Auth { .. } => true,
            Self::Http(err) => err.is_connect() || err.is_timeout(),
            _ => false,
        }
    }

    pub fn with_context<S: Display>(self, ctx: S) -> Self {
        match self {
            Self::Other(err) => Self::Other(err.context(ctx.to_string())),
            err => Self::Other(anyhow::Error::new(err).context(ctx.to_string())),
        }
    }

    /// Prints the error and its source chain to stderr.
    pub fn report(&self, headline: &str) {
        let style = console::Style::new().red().for_stderr();
        eprintln!("{} {self}", style.apply_to(format!("[{headline}]")));
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            eprintln!("    caused by: {err}");
            source = err.source();
        }
    }
}

fn fault_detail(data: &Option<String>) -> String {
    data.as_ref().map(|d| format!(" ({d})")).unwrap_or_default()
}

macro_rules! opterr {
    ($($arg:tt)*) => {
        $crate::types::OptiError::Other(::anyhow::anyhow!($($arg)*))
    };
}

pub(crate) use opterr;

/// Stock rotation class of a product. Drives demand, reorder and pricing parameters of the generator.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RotationProfile {
    #[default]
    #[sea_orm(string_value = "fast")]
    Fast,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "slow")]
    Slow,
}

/// Per-rotation knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationParams {
    pub turnover_days:  f64,
    pub reorder_ratio:  f64,
    pub price_variance: f64,
    pub demand_floor:   f64,
}

impl RotationProfile {
    /// Price based classification: expensive items move slowly.
    pub fn from_list_price(price: f64) -> Self {
        if price > 500.0 {
            Self::Slow
        }
        else if price > 100.0 {
            Self::Medium
        }
        else {
            Self::Fast
        }
    }

    pub fn params(&self) -> RotationParams {
        match self {
            Self::Fast => RotationParams {
                turnover_days:  20.0,
                reorder_ratio:  0.25,
                price_variance: 0.05,
                demand_floor:   1.0,
            },
            Self::Medium => RotationParams {
                turnover_days:  45.0,
                reorder_ratio:  0.3,
                price_variance: 0.10,
                demand_floor:   0.3,
            },
            Self::Slow => RotationParams {
                turnover_days:  75.0,
                reorder_ratio:  0.35,
                price_variance: 0.15,
                demand_floor:   0.05,
            },
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SyncStatus {
    #[sea_orm(string_value = "success")]
    Success,
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "failed")]
    Failed,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn rotation_from_price() {
        assert_eq!(RotationProfile::from_list_price(890.0), RotationProfile::Slow);
        assert_eq!(RotationProfile::from_list_price(500.0), RotationProfile::Medium);
        assert_eq!(RotationProfile::from_list_price(100.5), RotationProfile::Medium);
        assert_eq!(RotationProfile::from_list_price(100.0), RotationProfile::Fast);
        assert_eq!(RotationProfile::from_list_price(0.0), RotationProfile::Fast);
    }

    #[test]
    fn rotation_names() {
        assert_eq!(RotationProfile::Medium.to_string(), "medium");
        assert_eq!(RotationProfile::from_str("slow").unwrap(), RotationProfile::Slow);
        assert_eq!(
            serde_json::to_string(&RotationProfile::Fast).unwrap(),
            "\"fast\"".to_string()
        );
    }

    #[test]
    fn default_rotation_is_fast() {
        assert_eq!(RotationProfile::default(), RotationProfile::Fast);
    }

    #[test]
    fn slower_rotation_keeps_more_stock() {
        let fast = RotationProfile::Fast.params();
        let slow = RotationProfile::Slow.params();
        assert!(fast.turnover_days < slow.turnover_days);
        assert!(fast.reorder_ratio < slow.reorder_ratio);
        assert!(fast.demand_floor > slow.demand_floor);
    }

    #[test]
    fn context_wraps_error() {
        let err = OptiError::config("missing ODOO_DB").with_context("Odoo session");
        let text = format!("{err:#}");
        assert!(text.contains("Odoo session"), "{text}");
    }
}
