// Query Synthesizer
// Builds the text-to-SQL instruction and asks the language model for SQL

use crate::error::SynthesisError;
use crate::llm::LanguageModel;
use crate::schema::SchemaDescription;

const GUIDELINES: &[&str] = &[
    "Use only tables and columns that exist in the schema provided.",
    "Make sure to use the exact table and column names as defined in the schema.",
    "For complex queries, use appropriate JOINs based on the foreign key relationships.",
    "Be mindful of data types when comparing values.",
    "Provide only the SQL query without explanations unless the user's query is ambiguous.",
    "For ambiguous queries, ask for clarification and suggest possible interpretations.",
    "Use appropriate aggregation functions (COUNT, SUM, AVG, etc.) when needed.",
    "Limit results when appropriate (e.g., LIMIT 10 for a top-10 question).",
    "Use PostgreSQL compatible syntax.",
];

/// Worked examples anchoring the output format: plain SQL, no fences
const EXAMPLES: &[(&str, &str)] = &[
    (
        "How many rows are in the orders table?",
        "SELECT COUNT(*) AS order_count FROM orders;",
    ),
    (
        "Show the 5 most recent orders with their customer's name.",
        "SELECT o.order_id, c.first_name, c.last_name, o.created_at\n\
         FROM orders o\n\
         JOIN customer c ON c.customer_id = o.customer_id\n\
         ORDER BY o.created_at DESC\n\
         LIMIT 5;",
    ),
];

/// Build the full instruction sent to the model
///
/// Pure and deterministic: the same inputs always give the same string.
pub fn build_prompt(database: &str, question: &str, schema: &SchemaDescription) -> String {
    let mut prompt = format!(
        "You are a Text-to-SQL assistant for the {} database.\n\
         Given a natural language query, your task is to generate a valid SQL query that answers the question.\n\n\
         DATABASE SCHEMA:\n{}\n",
        database,
        schema.render()
    );

    prompt.push_str("IMPORTANT GUIDELINES:\n");
    for (i, guideline) in GUIDELINES.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, guideline));
    }

    prompt.push_str("\nEXAMPLES (the tables in these examples may not exist in this database):\n");
    for (example_question, example_sql) in EXAMPLES {
        prompt.push_str(&format!("Q: {}\nSQL: {}\n\n", example_question, example_sql));
    }

    prompt.push_str(&format!(
        "USER QUERY: {}\n\n\
         Respond with only the SQL query. If the query is ambiguous or can't be answered with the given schema, \
         explain why and suggest how to clarify.\n\
         SQL:\n",
        question.trim()
    ));

    prompt
}

/// Turns a question plus schema into SQL text via a language model
pub struct SqlSynthesizer<M> {
    model: M,
    database: String,
}

impl<M: LanguageModel> SqlSynthesizer<M> {
    /// `database` names the database in the role framing of the prompt
    pub fn new(model: M, database: impl Into<String>) -> Self {
        Self {
            model,
            database: database.into(),
        }
    }

    /// One completion request, no history, no retry
    ///
    /// The response is trimmed and returned verbatim. Text that is not SQL
    /// (a clarification request, say) is still a success here.
    #[tracing::instrument(skip(self, schema), fields(model = self.model.name()))]
    pub fn synthesize(
        &self,
        question: &str,
        schema: &SchemaDescription,
    ) -> Result<String, SynthesisError> {
        let prompt = build_prompt(&self.database, question, schema);
        tracing::debug!(prompt_len = prompt.len(), "sending prompt");

        let text = self.model.complete(&prompt)?;
        let sql = text.trim();
        if sql.is_empty() {
            return Err(SynthesisError::EmptyResponse);
        }

        tracing::info!(sql_len = sql.len(), "query synthesized");
        Ok(sql.to_string())
    }
}
