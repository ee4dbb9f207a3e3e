use async_trait::async_trait;
use fieldx::fxstruct;
use sea_orm::ConnectionTrait;
use sea_orm::DatabaseConnection;

use super::DatabaseDriver;
use crate::types::Result;

#[derive(Debug)]
#[fxstruct(sync, no_new)]
pub struct Sqlite {
    connection: DatabaseConnection,
    in_memory:  bool,
}

impl Sqlite {
    pub async fn connect_url(url: &str) -> Result<Self> {
        let db = sea_orm::Database::connect(url)
            .await
            .inspect_err(|e| tracing::error!("Error connecting to SQLite: {e}"))?;

        Ok(Self {
            connection: db,
            in_memory:  url.contains(":memory:"),
        })
    }

    pub async fn in_memory() -> Result<Self> {
        Self::connect_url("sqlite::memory:").await
    }
}

#[async_trait]
impl DatabaseDriver for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn connection(&self) -> DatabaseConnection {
        self.connection.clone()
    }

    async fn configure(&self) -> Result<()> {
        let db = &self.connection;

        if !self.in_memory {
            db.execute_unprepared("PRAGMA journal_mode=WAL;").await?;
            db.execute_unprepared("PRAGMA synchronous=NORMAL;").await?;
        }
        db.execute_unprepared("PRAGMA foreign_keys=ON;").await?;

        Ok(())
    }
}
