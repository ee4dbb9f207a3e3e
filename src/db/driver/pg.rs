use std::time::Duration;

use async_trait::async_trait;
use fieldx::fxstruct;
use sea_orm::ConnectOptions;
use sea_orm::DatabaseConnection;

use super::DatabaseDriver;
use crate::types::Result;

#[derive(Debug)]
#[fxstruct(sync, no_new)]
pub struct Pg {
    connection: DatabaseConnection,
}

impl Pg {
    pub async fn connect_url(url: &str) -> Result<Self> {
        let mut opts = ConnectOptions::new(url);
        // One tool run talks to the database sequentially.
        opts.max_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(20))
            .test_before_acquire(true)
            .sqlx_logging(false);

        let connection = sea_orm::Database::connect(opts)
            .await
            .inspect_err(|e| tracing::error!("Error connecting to PostgreSQL: {e}"))?;

        Ok(Self { connection })
    }
}

#[async_trait]
impl DatabaseDriver for Pg {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn connection(&self) -> DatabaseConnection {
        self.connection.clone()
    }
}
