// Pipeline
// question -> schema -> SQL -> rows, one request at a time
//
// Each stage sits behind a narrow trait so the presentation layer and tests
// can swap in stand-ins for the database and the model.

use crate::database::PostgresDatabase;
use crate::error::{ExecutionError, PipelineError, Result, SynthesisError};
use crate::llm::LanguageModel;
use crate::query::ResultSet;
use crate::schema::SchemaDescription;
use crate::synth::SqlSynthesizer;

/// Reads the schema description
pub trait SchemaSource {
    fn fetch_schema(&self) -> Result<SchemaDescription>;
}

/// synthesize(question, schema) -> text or error
pub trait QuerySynthesizer {
    fn synthesize(
        &self,
        question: &str,
        schema: &SchemaDescription,
    ) -> std::result::Result<String, SynthesisError>;
}

/// execute(sql) -> rows or error
pub trait QueryRunner {
    fn execute(&self, sql: &str) -> Result<ResultSet>;
}

impl<T: SchemaSource + ?Sized> SchemaSource for &T {
    fn fetch_schema(&self) -> Result<SchemaDescription> {
        (**self).fetch_schema()
    }
}

impl<T: QuerySynthesizer + ?Sized> QuerySynthesizer for &T {
    fn synthesize(
        &self,
        question: &str,
        schema: &SchemaDescription,
    ) -> std::result::Result<String, SynthesisError> {
        (**self).synthesize(question, schema)
    }
}

impl<T: QueryRunner + ?Sized> QueryRunner for &T {
    fn execute(&self, sql: &str) -> Result<ResultSet> {
        (**self).execute(sql)
    }
}

impl SchemaSource for PostgresDatabase {
    fn fetch_schema(&self) -> Result<SchemaDescription> {
        PostgresDatabase::fetch_schema(self)
    }
}

impl QueryRunner for PostgresDatabase {
    fn execute(&self, sql: &str) -> Result<ResultSet> {
        PostgresDatabase::execute(self, sql)
    }
}

impl<M: LanguageModel> QuerySynthesizer for SqlSynthesizer<M> {
    fn synthesize(
        &self,
        question: &str,
        schema: &SchemaDescription,
    ) -> std::result::Result<String, SynthesisError> {
        SqlSynthesizer::synthesize(self, question, schema)
    }
}

/// Where a request ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    SchemaFetched,
    QuerySynthesized,
    Executed,
}

/// Everything the presentation layer shows for one question
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Last stage reached
    pub stage: Stage,
    /// The synthesized SQL, once there is one
    pub sql: Option<String>,
    pub result: Result<ResultSet>,
}

impl Outcome {
    fn failed(stage: Stage, sql: Option<String>, err: PipelineError) -> Self {
        Self {
            stage,
            sql,
            result: Err(err),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// The three stages wired together
pub struct Pipeline<S, Q, R> {
    schema: S,
    synthesizer: Q,
    runner: R,
}

impl<S, Q, R> Pipeline<S, Q, R>
where
    S: SchemaSource,
    Q: QuerySynthesizer,
    R: QueryRunner,
{
    pub fn new(schema: S, synthesizer: Q, runner: R) -> Self {
        Self {
            schema,
            synthesizer,
            runner,
        }
    }

    pub fn schema_source(&self) -> &S {
        &self.schema
    }

    /// Answer one question
    ///
    /// Any failure ends the request at the stage it happened; nothing is
    /// retried. `before_execute` sees the synthesized SQL and may veto it
    /// (the read-only policy lives there), which also counts as terminal.
    pub fn run_with<F>(&self, question: &str, before_execute: F) -> Outcome
    where
        F: FnOnce(&str) -> std::result::Result<(), String>,
    {
        let question = question.trim();
        if question.is_empty() {
            return Outcome::failed(Stage::Idle, None, PipelineError::EmptyQuestion);
        }

        tracing::info!("fetching schema");
        let schema = match self.schema.fetch_schema() {
            Ok(schema) => schema,
            Err(e) => {
                tracing::warn!("schema fetch failed: {}", e);
                return Outcome::failed(Stage::Idle, None, e);
            }
        };

        tracing::info!(columns = schema.len(), "synthesizing query");
        let sql = match self.synthesizer.synthesize(question, &schema) {
            Ok(sql) => sql,
            Err(e) => {
                tracing::warn!("synthesis failed: {}", e);
                return Outcome::failed(Stage::SchemaFetched, None, e.into());
            }
        };

        if let Err(reason) = before_execute(&sql) {
            tracing::warn!("execution refused: {}", reason);
            let err = PipelineError::Execution(ExecutionError {
                sql: sql.clone(),
                message: reason,
            });
            return Outcome::failed(Stage::QuerySynthesized, Some(sql), err);
        }

        tracing::info!("executing query");
        let result = self.runner.execute(&sql);
        Outcome {
            stage: Stage::Executed,
            sql: Some(sql),
            result,
        }
    }

    pub fn run(&self, question: &str) -> Outcome {
        self.run_with(question, |_| Ok(()))
    }
}
