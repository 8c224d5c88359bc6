// Error types
// Every failure in the question -> SQL -> rows chain is reported, never raised

use thiserror::Error;

/// Why a request stopped before producing a result set
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The database is unreachable or rejected the credentials
    #[error("database connection failed: {0}")]
    Connection(String),

    /// Connected, but the catalog query itself failed
    #[error("error fetching schema: {0}")]
    Schema(String),

    /// The language model produced no usable SQL text
    #[error("error generating SQL: {0}")]
    Synthesis(#[from] SynthesisError),

    /// The database rejected the synthesized statement
    #[error("query execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("question is empty")]
    EmptyQuestion,
}

/// Failures of the language-model call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    /// Network-level failure (DNS, refused connection, TLS, timeout)
    #[error("request failed: {0}")]
    Transport(String),

    /// The API answered with a non-success status (auth, quota, bad model)
    #[error("api error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("no valid SQL generated")]
    EmptyResponse,
}

/// The database's own error text plus the statement that caused it
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ExecutionError {
    pub sql: String,
    pub message: String,
}

/// Missing or malformed configuration values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("cannot read env file: {0}")]
    EnvFile(String),
}

impl From<reqwest::Error> for SynthesisError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_decode() {
            SynthesisError::Decode(err.to_string())
        } else {
            SynthesisError::Transport(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesis_error_converts_into_pipeline_error() {
        let err: PipelineError = SynthesisError::EmptyResponse.into();
        assert_eq!(err.to_string(), "error generating SQL: no valid SQL generated");
    }

    #[test]
    fn test_execution_error_displays_database_text_verbatim() {
        let err = ExecutionError {
            sql: "SELEC 1".to_string(),
            message: "syntax error at or near \"SELEC\"".to_string(),
        };
        assert_eq!(err.to_string(), "syntax error at or near \"SELEC\"");
    }
}
