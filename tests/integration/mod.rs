//! Integration tests for castings.

pub mod connection_test;
pub mod exercises_test;

use castings::db::{Record, SqliteClient, Value};
use castings::fixtures;

/// An in-memory database with the tables created and the sample data loaded.
pub async fn sample_client() -> SqliteClient {
    let client = SqliteClient::in_memory().await.unwrap();
    fixtures::load_sample(&client).await.unwrap();
    client
}

/// An in-memory database with the tables created and `seed` loaded.
pub async fn seeded_client(seed: &str) -> SqliteClient {
    let client = SqliteClient::in_memory().await.unwrap();
    fixtures::create_schema(&client).await.unwrap();
    fixtures::load_script(&client, seed).await.unwrap();
    client
}

/// The text values of `column`, sorted, for results without an ORDER BY.
pub fn sorted_strings(records: &[Record], column: &str) -> Vec<String> {
    let mut values: Vec<String> = records
        .iter()
        .map(|r| {
            r.get(column)
                .and_then(Value::as_str)
                .unwrap_or_else(|| panic!("missing text column {column} in {r}"))
                .to_string()
        })
        .collect();
    values.sort();
    values
}
