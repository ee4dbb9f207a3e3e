#[cfg(feature = "pg")]
pub mod pg;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::fmt::Debug;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use super::migrations::Migrator;
use crate::types::OptiError;
use crate::types::Result;

#[async_trait]
pub trait DatabaseDriver: Debug + Sync + Send + 'static {
    fn name(&self) -> &'static str;
    fn connection(&self) -> DatabaseConnection;
    /// Backend specific session tuning, run once after connecting. Server defaults are kept unless a backend needs
    /// otherwise.
    async fn configure(&self) -> Result<()> {
        Ok(())
    }

    /// Applies pending schema migrations.
    async fn migrate(&self) -> Result<()> {
        let db = self.connection();
        Migrator::up(&db, None).await?;
        info!(driver = self.name(), "Schema is up to date");
        Ok(())
    }
}

/// Picks a driver by the URL scheme and connects.
pub async fn connect(url: &str) -> Result<Box<dyn DatabaseDriver>> {
    let driver: Box<dyn DatabaseDriver> = match url.split_once(':').map(|(scheme, _)| scheme) {
        #[cfg(feature = "sqlite")]
        Some("sqlite") => Box::new(sqlite::Sqlite::connect_url(url).await?),
        #[cfg(feature = "pg")]
        Some("postgres" | "postgresql") => Box::new(pg::Pg::connect_url(url).await?),
        Some(scheme) => {
            return Err(OptiError::config(format!(
                "Unsupported DATABASE_URL scheme '{scheme}' (enabled: {})",
                enabled_backends()
            )))
        }
        None => return Err(OptiError::config("DATABASE_URL has no scheme")),
    };

    driver.configure().await?;
    Ok(driver)
}

fn enabled_backends() -> &'static str {
    match (cfg!(feature = "pg"), cfg!(feature = "sqlite")) {
        (true, true) => "postgres, sqlite",
        (true, false) => "postgres",
        (false, true) => "sqlite",
        (false, false) => "none",
    }
}
