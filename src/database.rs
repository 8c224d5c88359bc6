// PostgreSQL access
// Each call opens its own connection and closes it again: no pool, no reuse
// across requests

use crate::config::DatabaseConfig;
use crate::error::{PipelineError, Result};
use postgres::{Client, NoTls};

/// Handle to the configured database
///
/// Holds only connection parameters; the schema reader and query executor
/// are implemented on top of it in their own modules.
#[derive(Debug, Clone)]
pub struct PostgresDatabase {
    config: DatabaseConfig,
}

impl PostgresDatabase {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Open a fresh connection
    pub fn connect(&self) -> Result<Client> {
        tracing::debug!(
            host = %self.config.host,
            port = self.config.port,
            db = %self.config.name,
            "connecting to database"
        );
        self.config
            .to_pg_config()
            .connect(NoTls)
            .map_err(|e| PipelineError::Connection(e.to_string()))
    }
}

/// Close a connection, logging instead of failing if the goodbye is lost
pub(crate) fn close(client: Client) {
    if let Err(e) = client.close() {
        tracing::warn!("error closing database connection: {}", e);
    }
}
