//! Exercise integration tests.
//!
//! Runs every exercise against the built-in sample dataset.

use super::{sample_client, sorted_strings};
use castings::db::{FailingDatabaseClient, Value};
use castings::exercises;
use castings::fixtures;
use castings::output::{render, OutputFormat};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_example_join() {
    let client = sample_client().await;

    let result = exercises::example_join(&client).await.unwrap();
    let records = result.records();

    assert_eq!(sorted_strings(&records, "title"), vec!["Dr. No", "Goldfinger"]);
    for record in &records {
        assert_eq!(record.get("name"), Some(&Value::from("Sean Connery")));
        assert_eq!(record.get("ord"), Some(&Value::Int(1)));
    }
}

#[tokio::test]
async fn test_example_join_json_keeps_every_id() {
    let client = sample_client().await;

    let result = exercises::example_join(&client).await.unwrap();
    let json = render(&result, OutputFormat::Json).unwrap();
    let rows: serde_json::Value = serde_json::from_str(&json).unwrap();

    // movies.id comes first, actors.id is renamed
    let goldfinger = rows
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["title"] == "Goldfinger")
        .unwrap();
    assert_eq!(goldfinger["id"], 2);
    assert_eq!(goldfinger["movie_id"], 2);
    assert_eq!(goldfinger["id_2"], 1);
    assert_eq!(goldfinger["name"], "Sean Connery");
}

#[tokio::test]
async fn test_ford_films() {
    let client = sample_client().await;

    let records = exercises::ford_films(&client).await.unwrap().records();

    assert_eq!(
        sorted_strings(&records, "title"),
        vec![
            "Blade Runner",
            "Raiders of the Lost Ark",
            "Star Wars",
            "The Empire Strikes Back",
        ]
    );
}

#[tokio::test]
async fn test_ford_supporting_films() {
    let client = sample_client().await;

    let records = exercises::ford_supporting_films(&client)
        .await
        .unwrap()
        .records();

    assert_eq!(
        sorted_strings(&records, "title"),
        vec!["Star Wars", "The Empire Strikes Back"]
    );
}

#[tokio::test]
async fn test_films_and_stars_from_sixty_two() {
    let client = sample_client().await;

    let records = exercises::films_and_stars_from_sixty_two(&client)
        .await
        .unwrap()
        .records();

    let mut pairs: Vec<String> = records.iter().map(|r| r.to_string()).collect();
    pairs.sort();
    assert_eq!(
        pairs,
        vec![
            "{title: Dr. No, name: Sean Connery}",
            "{title: Lawrence of Arabia, name: Peter O'Toole}",
            "{title: To Kill a Mockingbird, name: Gregory Peck}",
        ]
    );
}

#[tokio::test]
async fn test_travoltas_busiest_years() {
    let client = sample_client().await;

    let result = exercises::travoltas_busiest_years(&client).await.unwrap();

    assert_eq!(result.column_names(), vec!["yr", "count"]);
    assert_eq!(result.rows, vec![vec![Value::Int(1996), Value::Int(2)]]);
}

#[tokio::test]
async fn test_andrews_films_and_leads() {
    let client = sample_client().await;

    let records = exercises::andrews_films_and_leads(&client)
        .await
        .unwrap()
        .records();

    let mut pairs: Vec<String> = records.iter().map(|r| r.to_string()).collect();
    pairs.sort();
    assert_eq!(
        pairs,
        vec![
            "{title: Mary Poppins, name: Julie Andrews}",
            "{title: Shrek 2, name: Mike Myers}",
            "{title: The Sound of Music, name: Julie Andrews}",
            "{title: Victor/Victoria, name: Julie Andrews}",
        ]
    );
}

#[tokio::test]
async fn test_prolific_actors() {
    let client = sample_client().await;

    let result = exercises::prolific_actors(&client).await.unwrap();

    assert_eq!(result.rows, vec![vec![Value::from("Clint Eastwood")]]);
}

#[tokio::test]
async fn test_films_by_cast_size_is_ordered() {
    let client = sample_client().await;

    let result = exercises::films_by_cast_size(&client).await.unwrap();

    assert_eq!(result.column_names(), vec!["title", "count"]);
    assert_eq!(
        result.rows,
        vec![
            vec![Value::from("Grease"), Value::Int(3)],
            vec![Value::from("Every Which Way but Loose"), Value::Int(2)],
            vec![Value::from("Superman"), Value::Int(2)],
        ]
    );
}

#[tokio::test]
async fn test_colleagues_of_garfunkel() {
    let client = sample_client().await;

    let records = exercises::colleagues_of_garfunkel(&client)
        .await
        .unwrap()
        .records();

    assert_eq!(
        sorted_strings(&records, "name"),
        vec!["Alan Arkin", "Candice Bergen", "Jack Nicholson", "Martin Balsam"]
    );
}

#[tokio::test]
async fn test_exercises_on_empty_tables() {
    let client = castings::db::SqliteClient::in_memory().await.unwrap();
    fixtures::create_schema(&client).await.unwrap();

    for exercise in exercises::all() {
        let result = exercise.run(&client).await.unwrap();
        assert!(result.is_empty(), "{} returned rows", exercise.name);
    }
}

#[tokio::test]
async fn test_exercises_without_schema_fail_with_engine_message() {
    let client = castings::db::SqliteClient::in_memory().await.unwrap();

    let error = exercises::ford_films(&client).await.unwrap_err();

    assert!(error.is_query());
    assert!(error.to_string().contains("no such table"), "{error}");
}

#[tokio::test]
async fn test_exercise_connection_failure() {
    let client = FailingDatabaseClient::default();

    let error = exercises::prolific_actors(&client).await.unwrap_err();

    assert!(error.is_connection());
}
