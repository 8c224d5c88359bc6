// Query Executor
// Runs synthesized SQL inside one transaction and materializes the result

use super::result::{ResultSet, Row, Value};
use crate::database::{close, PostgresDatabase};
use crate::error::{ExecutionError, PipelineError};
use postgres::{Client, SimpleQueryMessage};

impl PostgresDatabase {
    /// Execute `sql` on a fresh connection
    ///
    /// Connection failures are reported as `PipelineError::Connection`, a
    /// statement the database rejects as `PipelineError::Execution`.
    #[tracing::instrument(skip(self, sql), fields(sql_len = sql.len()))]
    pub fn execute(&self, sql: &str) -> Result<ResultSet, PipelineError> {
        let mut client = self.connect()?;
        let result = execute_on(&mut client, sql);
        close(client);

        match &result {
            Ok(set) => tracing::info!(
                columns = set.columns.len(),
                rows = set.rows.len(),
                "query executed"
            ),
            Err(e) => tracing::warn!("query execution failed: {}", e),
        }

        Ok(result?)
    }
}

/// Execute `sql` on an open connection
///
/// The text goes through the simple-query protocol, so any statement the
/// server accepts runs as-is (several statements separated by `;` included).
/// On failure the transaction is rolled back and the session stays usable.
/// When several statements return rows, the last of them wins.
pub fn execute_on(client: &mut Client, sql: &str) -> Result<ResultSet, ExecutionError> {
    let mut transaction = client
        .transaction()
        .map_err(|e| execution_error(sql, &e))?;

    match transaction.simple_query(sql) {
        Ok(messages) => {
            let result = collect(messages);
            transaction
                .commit()
                .map_err(|e| execution_error(sql, &e))?;
            Ok(result)
        }
        Err(e) => {
            if let Err(rollback) = transaction.rollback() {
                tracing::warn!("rollback failed: {}", rollback);
            }
            Err(execution_error(sql, &e))
        }
    }
}

fn collect(messages: Vec<SimpleQueryMessage>) -> ResultSet {
    let mut collector = Collector::default();

    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(columns) => {
                collector.describe(columns.iter().map(|c| c.name().to_string()).collect());
            }
            SimpleQueryMessage::Row(row) => {
                if !collector.in_rows() {
                    collector.describe(row.columns().iter().map(|c| c.name().to_string()).collect());
                }
                let values = (0..row.len()).map(|i| Value::from(row.get(i))).collect();
                collector.push_row(values);
            }
            SimpleQueryMessage::CommandComplete(count) => collector.complete(count),
            _ => {}
        }
    }

    collector.finish()
}

/// Folds the per-statement messages of one simple query into a result set
///
/// The last statement that described rows owns the columns, rows and count.
/// Statements after it (DDL, `SET`, ...) do not touch the kept result.
#[derive(Debug, Default)]
struct Collector {
    result: ResultSet,
    described: bool,
    open: bool,
}

impl Collector {
    fn in_rows(&self) -> bool {
        self.open
    }

    fn describe(&mut self, columns: Vec<String>) {
        self.result = ResultSet {
            columns,
            ..ResultSet::default()
        };
        self.described = true;
        self.open = true;
    }

    fn push_row(&mut self, values: Vec<Value>) {
        self.result.rows.push(Row::new(values));
    }

    fn complete(&mut self, count: u64) {
        // no statement has described rows yet: the last command's count stands
        if self.open || !self.described {
            self.result.rows_affected = count;
        }
        self.open = false;
    }

    fn finish(self) -> ResultSet {
        self.result
    }
}

/// Prefer the server's own error text over the driver's wrapper
fn execution_error(sql: &str, err: &postgres::Error) -> ExecutionError {
    let message = match err.as_db_error() {
        Some(db) => db.to_string(),
        None => err.to_string(),
    };
    ExecutionError {
        sql: sql.to_string(),
        message,
    }
}
