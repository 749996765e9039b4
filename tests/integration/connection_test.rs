//! Connection integration tests.
//!
//! SQLite tests always run. PostgreSQL tests are skipped unless
//! DATABASE_URL points at a server.

use castings::config::{ConnectionConfig, SQLITE_MEMORY};
use castings::db::{self, DatabaseBackend, DatabaseClient, PostgresClient, Value};
use castings::fixtures;
use castings::query::execute;

/// Helper to get test database URL from environment.
fn get_test_database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok()
}

/// Helper to create a PostgreSQL test client.
async fn get_postgres_client() -> Option<PostgresClient> {
    let url = get_test_database_url()?;
    let config = ConnectionConfig::from_connection_string(&url).ok()?;
    if config.backend != DatabaseBackend::Postgres {
        return None;
    }
    PostgresClient::connect(&config).await.ok()
}

#[tokio::test]
async fn test_connect_sqlite_memory() {
    let config = ConnectionConfig::from_connection_string("sqlite::memory:").unwrap();

    let client = db::connect(&config).await.unwrap();

    assert_eq!(client.backend(), DatabaseBackend::Sqlite);
    let result = execute(client.as_ref(), "SELECT 1 AS x").await.unwrap();
    assert_eq!(result.rows, vec![vec![Value::Int(1)]]);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_sqlite_memory_databases_are_private() {
    let first = db::connect(&ConnectionConfig::sqlite(SQLITE_MEMORY)).await.unwrap();
    let second = db::connect(&ConnectionConfig::sqlite(SQLITE_MEMORY)).await.unwrap();

    fixtures::load_sample(first.as_ref()).await.unwrap();

    let error = execute(second.as_ref(), "SELECT * FROM movies")
        .await
        .unwrap_err();
    assert!(error.to_string().contains("no such table"));
}

#[tokio::test]
async fn test_sqlite_file_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("movies.db");
    let config = ConnectionConfig::sqlite(path.to_string_lossy());

    let client = db::connect(&config).await.unwrap();
    fixtures::load_sample(client.as_ref()).await.unwrap();
    client.close().await.unwrap();

    let client = db::connect(&config).await.unwrap();
    let counts = fixtures::table_counts(client.as_ref()).await.unwrap();
    assert_eq!(counts, vec![("movies", 36), ("actors", 30), ("castings", 59)]);
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_sqlite_read_only_mode_is_honoured() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("movies.db");

    let client = db::connect(&ConnectionConfig::sqlite(path.to_string_lossy()))
        .await
        .unwrap();
    fixtures::load_sample(client.as_ref()).await.unwrap();
    client.close().await.unwrap();

    let url = format!("sqlite:{}?mode=ro", path.display());
    let config = ConnectionConfig::from_connection_string(&url).unwrap();
    let client = db::connect(&config).await.unwrap();

    let error = fixtures::load_script(client.as_ref(), "DELETE FROM castings")
        .await
        .unwrap_err();
    assert!(error.to_string().contains("readonly"), "{error}");

    let counts = fixtures::table_counts(client.as_ref()).await.unwrap();
    assert_eq!(counts, vec![("movies", 36), ("actors", 30), ("castings", 59)]);
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_sqlite_read_only_mode_does_not_create_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.db");

    let url = format!("sqlite:{}?mode=ro", path.display());
    let config = ConnectionConfig::from_connection_string(&url).unwrap();
    let error = db::connect(&config).await.err().expect("connect should fail");

    assert!(error.is_connection(), "{error:?}");
    assert!(!path.exists());
}

#[tokio::test]
async fn test_sqlite_unknown_option_is_config_error() {
    let config =
        ConnectionConfig::from_connection_string("sqlite::memory:?flavour=strawberry").unwrap();

    let error = db::connect(&config).await.err().expect("connect should fail");

    assert!(matches!(error, castings::error::Error::Config(_)), "{error:?}");
}

#[tokio::test]
async fn test_postgres_unreachable_is_connection_error() {
    let config =
        ConnectionConfig::from_connection_string("postgres://castings@127.0.0.1:1/sqlzoo").unwrap();

    let error = db::connect(&config).await.err().expect("connect should fail");

    assert!(error.is_connection(), "{error:?}");
}

#[tokio::test]
async fn test_postgres_select() {
    let Some(client) = get_postgres_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = execute(&client, "SELECT 1 AS num, 'Dr. No' AS title")
        .await
        .unwrap();

    assert_eq!(result.column_names(), vec!["num", "title"]);
    assert_eq!(
        result.rows,
        vec![vec![Value::Int(1), Value::from("Dr. No")]]
    );

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_postgres_empty_result_keeps_columns() {
    let Some(client) = get_postgres_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = execute(&client, "SELECT 1 AS yr WHERE false").await.unwrap();

    assert!(result.is_empty());
    assert_eq!(result.column_names(), vec!["yr"]);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_postgres_unknown_table() {
    let Some(client) = get_postgres_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let error = execute(&client, "SELECT * FROM castingz").await.unwrap_err();

    assert!(error.is_query());
    assert!(
        error
            .to_string()
            .contains("relation \"castingz\" does not exist"),
        "{error}"
    );

    client.close().await.unwrap();
}
