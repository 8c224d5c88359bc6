// Statement classification
// Used by the presentation layer's optional read-only policy and for logging.
// The core never parses synthesized SQL before executing it.

use sqlparser::ast::Statement;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use std::fmt;

/// Coarse kind of a parsed statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// SELECT / WITH / VALUES
    Query,
    Explain,
    Insert,
    Update,
    Delete,
    /// DDL and everything else
    Other,
}

impl StatementKind {
    fn of(statement: &Statement) -> Self {
        match statement {
            Statement::Query(_) => StatementKind::Query,
            Statement::Explain { .. } => StatementKind::Explain,
            Statement::Insert(_) => StatementKind::Insert,
            Statement::Update { .. } => StatementKind::Update,
            Statement::Delete(_) => StatementKind::Delete,
            _ => StatementKind::Other,
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, StatementKind::Query | StatementKind::Explain)
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatementKind::Query => "query",
            StatementKind::Explain => "explain",
            StatementKind::Insert => "insert",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
            StatementKind::Other => "other",
        };
        write!(f, "{}", name)
    }
}

/// Parse SQL text into the kinds of its statements, in order
pub fn classify(sql: &str) -> Result<Vec<StatementKind>, String> {
    let dialect = PostgreSqlDialect {};
    let ast = Parser::parse_sql(&dialect, sql).map_err(|e| format!("SQL parsing error: {}", e))?;
    Ok(ast.iter().map(StatementKind::of).collect())
}

/// What the presentation layer lets through to the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementPolicy {
    /// Execute whatever the model returned
    #[default]
    AllowAll,
    /// Only queries and EXPLAIN; unparseable text is refused too
    ReadOnly,
}

impl StatementPolicy {
    /// Check synthesized SQL against the policy
    ///
    /// Statements that modify data are logged even when allowed.
    pub fn check(&self, sql: &str) -> Result<(), String> {
        let kinds = classify(sql);

        if let Ok(kinds) = &kinds {
            if let Some(kind) = kinds.iter().find(|k| !k.is_read_only()) {
                tracing::warn!(kind = %kind, "synthesized SQL modifies the database");
            }
        }

        match self {
            StatementPolicy::AllowAll => Ok(()),
            StatementPolicy::ReadOnly => {
                let kinds = kinds.map_err(|e| format!("refusing unverifiable SQL in read-only mode: {}", e))?;
                if kinds.is_empty() {
                    return Err("no statement to execute".to_string());
                }
                match kinds.iter().find(|k| !k.is_read_only()) {
                    Some(kind) => Err(format!(
                        "refusing {} statement in read-only mode",
                        kind
                    )),
                    None => Ok(()),
                }
            }
        }
    }
}
