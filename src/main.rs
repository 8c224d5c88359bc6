// Main entry point for the text2sql CLI
// This provides an interactive shell that turns questions into SQL and runs them

use anyhow::Result;
use clap::Parser as ClapParser;
use std::io::{self, Write};
use std::process::ExitCode;
use text2sql::config::{load_env_file, DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_SCHEMA};
use text2sql::logging::init_logging;
use text2sql::{
    Config, DatabaseConfig, GeminiClient, ModelConfig, Outcome, Pipeline, PipelineError,
    PostgresDatabase, QueryRunner, QuerySynthesizer, SchemaSource, SqlSynthesizer,
    StatementPolicy,
};

/// text2sql - ask a PostgreSQL database questions in plain language
#[derive(ClapParser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Answer a single question and exit
    #[arg(short, long)]
    question: Option<String>,

    /// Refuse synthesized statements other than queries
    #[arg(long)]
    read_only: bool,

    /// Log pipeline progress to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Database host
    #[arg(long, env = "DB_HOST")]
    db_host: String,

    /// Database port
    #[arg(long, env = "DB_PORT")]
    db_port: u16,

    /// Database name
    #[arg(long, env = "DB_NAME")]
    db_name: String,

    /// Database user
    #[arg(long, env = "DB_USER")]
    db_user: String,

    /// Database password
    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    db_password: String,

    /// Schema namespace to describe to the model
    #[arg(long, env = "DB_SCHEMA", default_value = DEFAULT_SCHEMA)]
    db_schema: String,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Gemini model identifier. The default is an older id that the v1beta
    /// API no longer serves; set GEMINI_MODEL to a current model
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Gemini API base URL
    #[arg(long, env = "GEMINI_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
}

impl Args {
    fn config(&self) -> Result<Config> {
        let database = DatabaseConfig {
            host: self.db_host.clone(),
            port: self.db_port,
            name: self.db_name.clone(),
            user: self.db_user.clone(),
            password: self.db_password.clone(),
            schema: self.db_schema.clone(),
        };
        let model = ModelConfig {
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            endpoint: self.endpoint.clone(),
        };
        Ok(Config::new(database, model)?)
    }
}

fn main() -> Result<ExitCode> {
    // Load .env first so clap sees its values; the real environment wins
    let env_file = load_env_file(None);
    let args = Args::parse();
    init_logging(if args.verbose { "info" } else { "error" });

    match env_file {
        Ok(Some(path)) => tracing::info!("loaded settings from {}", path.display()),
        Ok(None) => {}
        Err(e) => tracing::warn!("{}", e),
    }

    let config = args.config()?;
    tracing::info!(?config, "configuration loaded");

    let policy = if args.read_only {
        StatementPolicy::ReadOnly
    } else {
        StatementPolicy::AllowAll
    };

    let database = PostgresDatabase::new(config.database.clone());
    let synthesizer = SqlSynthesizer::new(GeminiClient::new(config.model), config.database.name);
    let pipeline = Pipeline::new(&database, synthesizer, &database);

    // If a question was provided, answer it and exit
    if let Some(question) = args.question {
        let outcome = answer(&pipeline, policy, &question);
        return Ok(if outcome.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    println!("╔════════════════════════════════════════════╗");
    println!("║        text2sql Interactive Shell          ║");
    println!("║   Ask your PostgreSQL database anything    ║");
    println!("╚════════════════════════════════════════════╝");
    println!();
    let db = database.config();
    println!("Database: {}@{}:{}/{}", db.user, db.host, db.port, db.name);
    println!("Type a question or '.help' for help");
    println!("Type '.exit' to quit");
    println!();

    repl(|input| {
        match input {
            ".schema" => show_schema(pipeline.schema_source()),
            question => {
                answer(&pipeline, policy, question);
            }
        }
        Ok(())
    })?;

    Ok(ExitCode::SUCCESS)
}

/// REPL (Read-Eval-Print Loop) implementation
///
/// Handles the shell commands itself and hands everything else, including
/// `.schema`, to `handle`.
fn repl<F>(mut handle: F) -> Result<()>
where
    F: FnMut(&str) -> Result<()>,
{
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("text2sql> ");
        stdout.flush()?;

        let mut input = String::new();
        if stdin.read_line(&mut input)? == 0 {
            // EOF (Ctrl-D)
            println!();
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            ".exit" | ".quit" => {
                println!("Goodbye!");
                break;
            }
            ".help" => {
                print_help();
                continue;
            }
            ".schema" => {}
            _ if input.starts_with('.') => {
                println!("Unknown command: {}", input);
                println!("Type '.help' for help");
                continue;
            }
            _ => {}
        }

        if let Err(e) = handle(input) {
            eprintln!("Error: {}", e);
        }
    }

    Ok(())
}

/// Run one question through the pipeline and print what happened
fn answer<S, Q, R>(pipeline: &Pipeline<S, Q, R>, policy: StatementPolicy, question: &str) -> Outcome
where
    S: SchemaSource,
    Q: QuerySynthesizer,
    R: QueryRunner,
{
    let outcome = pipeline.run_with(question, |sql| policy.check(sql));
    render(&outcome);
    outcome
}

fn render(outcome: &Outcome) {
    if let Some(sql) = &outcome.sql {
        println!("{}", sql);
        println!();
    }

    match &outcome.result {
        Ok(result) => println!("{}", result.format()),
        Err(PipelineError::Execution(e)) => eprintln!("Query Execution Error: {}", e.message),
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn show_schema<S: SchemaSource>(source: &S) {
    match source.fetch_schema() {
        Ok(schema) if schema.is_empty() => println!("No tables found"),
        Ok(schema) => {
            print!("{}", schema.render());
            println!();
            println!("{} column(s) in {} table(s)", schema.len(), schema.tables().len());
        }
        Err(e) => eprintln!("Error: {}", e),
    }
}

/// Print help information
fn print_help() {
    println!("╔════════════════════════════════════════════╗");
    println!("║              text2sql Help                 ║");
    println!("╚════════════════════════════════════════════╝");
    println!();
    println!("Special Commands:");
    println!("  .help              Show this help message");
    println!("  .schema            Show the schema sent to the model");
    println!("  .exit, .quit       Exit the shell");
    println!();
    println!("Anything else is a question, for example:");
    println!("  How many films are there in each category?");
    println!("  List customers who haven't rented anything");
    println!();
    println!("Notes:");
    println!("  - The generated SQL is printed before it runs");
    println!("  - Statements run exactly as generated; start with --read-only");
    println!("    to refuse anything that is not a query");
    println!("  - Database errors are shown verbatim and the transaction is rolled back");
    println!();
}
