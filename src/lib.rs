// text2sql - ask a PostgreSQL database questions in plain language
// This is the library root that exposes the public API

pub mod config;
pub mod database;
pub mod error;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod query;
pub mod schema;
pub mod synth;

// Re-export commonly used types for convenience
pub use config::{Config, DatabaseConfig, ModelConfig};
pub use database::PostgresDatabase;
pub use error::{ConfigError, ExecutionError, PipelineError, SynthesisError};
pub use llm::{GeminiClient, LanguageModel};
pub use pipeline::{Outcome, Pipeline, QueryRunner, QuerySynthesizer, SchemaSource, Stage};
pub use query::{ResultSet, Row, StatementPolicy, Value};
pub use schema::{Column, SchemaDescription};
pub use synth::{build_prompt, SqlSynthesizer};
