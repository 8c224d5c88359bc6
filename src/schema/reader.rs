// Schema Reader
// Lists table/column/type triples from information_schema for one namespace

use super::{Column, SchemaDescription};
use crate::database::{close, PostgresDatabase};
use crate::error::{PipelineError, Result};
use postgres::Client;

// The casts turn the sql_identifier/character_data domains into plain text
const CATALOG_QUERY: &str = "\
    SELECT table_name::text, column_name::text, data_type::text \
    FROM information_schema.columns \
    WHERE table_schema = $1 \
    ORDER BY table_name, ordinal_position";

impl PostgresDatabase {
    /// Describe every column of every table in the configured namespace
    ///
    /// Opens one connection and closes it before returning. An empty
    /// namespace is a valid (empty) description, not an error.
    #[tracing::instrument(skip(self), fields(namespace = %self.config().schema))]
    pub fn fetch_schema(&self) -> Result<SchemaDescription> {
        let mut client = self.connect()?;
        let result = read_schema(&mut client, &self.config().schema);
        close(client);

        let schema = result?;
        tracing::info!(
            columns = schema.len(),
            tables = schema.tables().len(),
            "schema fetched"
        );
        Ok(schema)
    }
}

/// Run the catalog query on an open connection
pub fn read_schema(client: &mut Client, namespace: &str) -> Result<SchemaDescription> {
    let rows = client
        .query(CATALOG_QUERY, &[&namespace])
        .map_err(|e| PipelineError::Schema(e.to_string()))?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        let table: String = row
            .try_get(0)
            .map_err(|e| PipelineError::Schema(e.to_string()))?;
        let name: String = row
            .try_get(1)
            .map_err(|e| PipelineError::Schema(e.to_string()))?;
        let data_type: String = row
            .try_get(2)
            .map_err(|e| PipelineError::Schema(e.to_string()))?;
        columns.push(Column::new(table, name, data_type));
    }

    Ok(SchemaDescription::new(columns))
}
