// Integration tests against a live PostgreSQL server
//
// The ignored tests need DB_HOST, DB_PORT, DB_NAME, DB_USER and DB_PASSWORD
// pointing at a database where the user may create schemas:
//
//     cargo test -- --ignored
//
// Each test works inside its own throwaway schema and drops it afterwards.

use std::env;
use text2sql::query::execute_on;
use text2sql::{
    DatabaseConfig, LanguageModel, Pipeline, PipelineError, PostgresDatabase, ResultSet, Stage,
    SqlSynthesizer, SynthesisError,
};

fn live_config(namespace: &str) -> DatabaseConfig {
    let var = |name: &str| env::var(name).unwrap_or_else(|_| panic!("{} must be set", name));
    DatabaseConfig {
        host: var("DB_HOST"),
        port: var("DB_PORT").parse().expect("DB_PORT must be a number"),
        name: var("DB_NAME"),
        user: var("DB_USER"),
        password: var("DB_PASSWORD"),
        schema: namespace.to_string(),
    }
}

/// A schema with a few rental-shop tables, dropped on drop
struct Fixture {
    db: PostgresDatabase,
    ns: String,
}

impl Fixture {
    fn new(test: &str) -> Self {
        let ns = format!("text2sql_{}_{}", test, std::process::id());
        let db = PostgresDatabase::new(live_config(&ns));

        let mut client = db.connect().unwrap();
        client
            .batch_execute(&format!(
                "DROP SCHEMA IF EXISTS {ns} CASCADE;
                 CREATE SCHEMA {ns};
                 CREATE TABLE {ns}.category (category_id integer PRIMARY KEY, name text NOT NULL);
                 CREATE TABLE {ns}.film_category (film_id integer NOT NULL, category_id integer NOT NULL);
                 CREATE TABLE {ns}.customer (customer_id integer PRIMARY KEY, first_name text, last_name text);
                 CREATE TABLE {ns}.rental (rental_id integer PRIMARY KEY, customer_id integer NOT NULL);

                 INSERT INTO {ns}.category VALUES (1, 'Action'), (2, 'Comedy'), (3, 'Horror');
                 INSERT INTO {ns}.film_category VALUES (10, 1), (11, 1), (12, 2);
                 INSERT INTO {ns}.customer VALUES
                     (1, 'Mary', 'Smith'), (2, 'Linda', 'Williams'), (3, 'Barbara', 'Jones');
                 INSERT INTO {ns}.rental VALUES (100, 1), (101, 1), (102, 3);",
            ))
            .unwrap();
        client.close().unwrap();

        Self { db, ns }
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        if let Ok(mut client) = self.db.connect() {
            let _ = client.batch_execute(&format!("DROP SCHEMA IF EXISTS {} CASCADE", self.ns));
        }
    }
}

/// Stands in for the remote model with a fixed answer
struct Scripted(String);

impl LanguageModel for Scripted {
    fn complete(&self, _prompt: &str) -> Result<String, SynthesisError> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn column<'a>(result: &'a ResultSet, name: &str) -> Vec<Option<&'a str>> {
    let index = result.column_index(name).expect("column missing");
    result.rows.iter().map(|r| r.values[index].as_str()).collect()
}

#[test]
fn unreachable_database_is_a_connection_error() {
    let db = PostgresDatabase::new(DatabaseConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        name: "nothing".to_string(),
        user: "nobody".to_string(),
        password: "wrong".to_string(),
        schema: "public".to_string(),
    });

    assert!(matches!(db.fetch_schema(), Err(PipelineError::Connection(_))));
    assert!(matches!(db.execute("SELECT 1"), Err(PipelineError::Connection(_))));
}

#[test]
#[ignore = "requires a running PostgreSQL server"]
fn schema_reader_lists_every_column_in_order() {
    let fixture = Fixture::new("schema");

    let first = fixture.db.fetch_schema().unwrap();
    let second = fixture.db.fetch_schema().unwrap();
    assert_eq!(first, second);

    // 2 + 2 + 3 + 2 columns
    assert_eq!(first.len(), 9);
    assert_eq!(first.tables(), vec!["category", "customer", "film_category", "rental"]);

    let rendered = first.render();
    assert!(rendered.starts_with("category.category_id (integer)\ncategory.name (text)\n"));
    assert!(rendered.contains("rental.customer_id (integer)"));
}

#[test]
#[ignore = "requires a running PostgreSQL server"]
fn empty_namespace_is_an_empty_schema() {
    let db = PostgresDatabase::new(live_config("text2sql_no_such_namespace"));
    let schema = db.fetch_schema().unwrap();
    assert!(schema.is_empty());
}

#[test]
#[ignore = "requires a running PostgreSQL server"]
fn invalid_sql_rolls_back_and_session_survives() {
    let fixture = Fixture::new("rollback");
    let mut client = fixture.db.connect().unwrap();

    let err = execute_on(&mut client, "SELEC * FORM x").unwrap_err();
    assert!(!err.message.is_empty());
    assert_eq!(err.sql, "SELEC * FORM x");

    // the insert before the failing statement must not survive
    let sql = format!(
        "INSERT INTO {ns}.category VALUES (4, 'Drama'); SELECT * FROM {ns}.missing_table",
        ns = fixture.ns
    );
    assert!(execute_on(&mut client, &sql).is_err());

    let result = execute_on(
        &mut client,
        &format!("SELECT count(*) AS n FROM {}.category", fixture.ns),
    )
    .unwrap();
    assert_eq!(result.columns, vec!["n"]);
    assert_eq!(result.rows[0].values[0].as_i64(), Some(3));
}

#[test]
#[ignore = "requires a running PostgreSQL server"]
fn empty_result_keeps_column_names() {
    let fixture = Fixture::new("empty");
    let result = fixture
        .db
        .execute(&format!(
            "SELECT customer_id, first_name FROM {}.customer WHERE false",
            fixture.ns
        ))
        .unwrap();

    assert!(result.rows.is_empty());
    assert_eq!(result.columns, vec!["customer_id", "first_name"]);
}

#[test]
#[ignore = "requires a running PostgreSQL server"]
fn trailing_statement_keeps_select_result() {
    let fixture = Fixture::new("trailing");
    let result = fixture
        .db
        .execute(&format!(
            "SELECT 1 AS a, 2 AS b; CREATE TABLE {}.scratch (x int)",
            fixture.ns
        ))
        .unwrap();

    assert_eq!(result.columns, vec!["a", "b"]);
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows_affected, 1);
}

#[test]
#[ignore = "requires a running PostgreSQL server"]
fn films_per_category() {
    let fixture = Fixture::new("films");
    let sql = format!(
        "SELECT c.name, COUNT(fc.film_id) AS film_count \
         FROM {ns}.category c \
         LEFT JOIN {ns}.film_category fc ON fc.category_id = c.category_id \
         GROUP BY c.name ORDER BY c.name",
        ns = fixture.ns
    );
    let pipeline = Pipeline::new(
        &fixture.db,
        SqlSynthesizer::new(Scripted(sql.clone()), "rental"),
        &fixture.db,
    );

    let outcome = pipeline.run("How many films are there in each category?");
    assert_eq!(outcome.stage, Stage::Executed);
    assert_eq!(outcome.sql.as_deref(), Some(sql.as_str()));

    let result = outcome.result.unwrap();
    assert_eq!(
        column(&result, "name"),
        vec![Some("Action"), Some("Comedy"), Some("Horror")]
    );
    let counts: Vec<i64> = result
        .rows
        .iter()
        .map(|r| r.values[1].as_i64().unwrap())
        .collect();
    assert_eq!(counts, vec![2, 1, 0]);
    assert!(counts.iter().all(|c| *c >= 0));

    // one row per category, including categories without films
    let categories = fixture
        .db
        .execute(&format!("SELECT count(*) FROM {}.category", fixture.ns))
        .unwrap();
    assert_eq!(
        categories.rows[0].values[0].as_i64(),
        Some(result.rows.len() as i64)
    );
}

#[test]
#[ignore = "requires a running PostgreSQL server"]
fn customers_without_rentals() {
    let fixture = Fixture::new("customers");
    let sql = format!(
        "SELECT c.customer_id, c.first_name, c.last_name \
         FROM {ns}.customer c \
         LEFT JOIN {ns}.rental r ON r.customer_id = c.customer_id \
         WHERE r.rental_id IS NULL",
        ns = fixture.ns
    );
    let pipeline = Pipeline::new(
        &fixture.db,
        SqlSynthesizer::new(Scripted(sql), "rental"),
        &fixture.db,
    );

    let result = pipeline
        .run("List customers who haven't rented anything")
        .result
        .unwrap();

    let renters = fixture
        .db
        .execute(&format!("SELECT DISTINCT customer_id FROM {}.rental", fixture.ns))
        .unwrap();
    let renter_ids = column(&renters, "customer_id");

    let ids = column(&result, "customer_id");
    assert_eq!(ids, vec![Some("2")]);
    assert!(ids.iter().all(|id| !renter_ids.contains(id)));
}

#[test]
#[ignore = "requires a running PostgreSQL server"]
fn execution_error_reaches_the_caller() {
    let fixture = Fixture::new("execerr");
    let pipeline = Pipeline::new(
        &fixture.db,
        SqlSynthesizer::new(
            Scripted("Could you clarify which store you mean?".to_string()),
            "rental",
        ),
        &fixture.db,
    );

    let outcome = pipeline.run("sales per store");
    assert_eq!(outcome.stage, Stage::Executed);
    match outcome.result {
        Err(PipelineError::Execution(e)) => {
            assert_eq!(e.sql, "Could you clarify which store you mean?");
            assert!(e.message.contains("syntax error"));
        }
        other => panic!("expected execution error, got {:?}", other),
    }
}

#[test]
#[ignore = "requires a running PostgreSQL server"]
fn same_question_same_rows() {
    let fixture = Fixture::new("idem");
    let sql = format!("SELECT name FROM {}.category ORDER BY category_id", fixture.ns);
    let pipeline = Pipeline::new(
        &fixture.db,
        SqlSynthesizer::new(Scripted(sql), "rental"),
        &fixture.db,
    );

    let first = pipeline.run("list categories");
    let second = pipeline.run("list categories");
    assert!(first.is_success());
    assert_eq!(first, second);
}
