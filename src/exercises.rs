//! Join exercises over the movies/actors/castings dataset.
//!
//! Every exercise is one read-only statement with its literals inline. They
//! are exposed both as plain async functions and through a registry keyed by
//! name, which the CLI uses.

use crate::db::{DatabaseClient, QueryResult};
use crate::error::{Error, Result};
use crate::query::QueryExecutor;

/// A named, documented query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exercise {
    /// Registry key, also the name of the matching function.
    pub name: &'static str,
    /// The question the query answers.
    pub question: &'static str,
    /// The statement.
    pub sql: &'static str,
}

impl Exercise {
    /// Runs the exercise against `db`.
    pub async fn run(&self, db: &dyn DatabaseClient) -> Result<QueryResult> {
        QueryExecutor::new(db).execute(self.sql).await
    }
}

pub const EXAMPLE_JOIN: Exercise = Exercise {
    name: "example_join",
    question: "Show every column of the films 'Sean Connery' appeared in, joined with their castings and actors.",
    sql: "\
SELECT *
FROM movies
JOIN castings ON movies.id = castings.movie_id
JOIN actors ON castings.actor_id = actors.id
WHERE actors.name = 'Sean Connery'",
};

pub const FORD_FILMS: Exercise = Exercise {
    name: "ford_films",
    question: "List the films in which 'Harrison Ford' has appeared.",
    sql: "\
SELECT movies.title
FROM movies
JOIN castings ON movies.id = castings.movie_id
JOIN actors ON castings.actor_id = actors.id
WHERE actors.name = 'Harrison Ford'",
};

pub const FORD_SUPPORTING_FILMS: Exercise = Exercise {
    name: "ford_supporting_films",
    question: "List the films where 'Harrison Ford' has appeared, but not in the starring role.",
    sql: "\
SELECT movies.title
FROM movies
JOIN castings ON movies.id = castings.movie_id
JOIN actors ON castings.actor_id = actors.id
WHERE actors.name = 'Harrison Ford'
  AND castings.ord != 1",
};

pub const FILMS_AND_STARS_FROM_SIXTY_TWO: Exercise = Exercise {
    name: "films_and_stars_from_sixty_two",
    question: "List the title and leading star of every 1962 film.",
    sql: "\
SELECT movies.title, actors.name
FROM movies
JOIN castings ON movies.id = castings.movie_id
JOIN actors ON castings.actor_id = actors.id
WHERE castings.ord = 1
  AND movies.yr = 1962",
};

pub const TRAVOLTAS_BUSIEST_YEARS: Exercise = Exercise {
    name: "travoltas_busiest_years",
    question: "Show the year and number of films for every year in which 'John Travolta' made at least 2 films.",
    sql: "\
SELECT movies.yr, COUNT(movies.title) AS count
FROM movies
JOIN castings ON movies.id = castings.movie_id
JOIN actors ON castings.actor_id = actors.id
WHERE actors.name = 'John Travolta'
GROUP BY movies.yr
HAVING COUNT(movies.title) >= 2",
};

pub const ANDREWS_FILMS_AND_LEADS: Exercise = Exercise {
    name: "andrews_films_and_leads",
    question: "List the film title and the leading actor for all of the films 'Julie Andrews' played in.",
    sql: "\
SELECT movies.title, lead_actors.name
FROM actors AS julie_actors
JOIN castings AS julie_castings ON julie_castings.actor_id = julie_actors.id
JOIN movies ON movies.id = julie_castings.movie_id
JOIN castings AS lead_castings ON movies.id = lead_castings.movie_id
JOIN actors AS lead_actors ON lead_castings.actor_id = lead_actors.id
WHERE lead_castings.ord = 1
  AND julie_actors.name = 'Julie Andrews'",
};

pub const PROLIFIC_ACTORS: Exercise = Exercise {
    name: "prolific_actors",
    question: "List, in alphabetical order, the actors who have had at least 15 starring roles.",
    sql: "\
SELECT actors.name
FROM actors
JOIN castings ON actors.id = castings.actor_id
WHERE castings.ord = 1
GROUP BY actors.name
HAVING COUNT(castings.ord) >= 15
ORDER BY actors.name",
};

pub const FILMS_BY_CAST_SIZE: Exercise = Exercise {
    name: "films_by_cast_size",
    question: "List the films released in 1978 ordered by the number of actors in the cast (descending), then by title.",
    sql: "\
SELECT movies.title, actor_count.count
FROM movies
JOIN (
    SELECT movies.id AS movie_id, COUNT(castings.actor_id) AS count
    FROM movies
    JOIN castings ON movies.id = castings.movie_id
    GROUP BY movies.id
) AS actor_count ON movies.id = actor_count.movie_id
WHERE movies.yr = 1978
ORDER BY actor_count.count DESC, movies.title",
};

pub const COLLEAGUES_OF_GARFUNKEL: Exercise = Exercise {
    name: "colleagues_of_garfunkel",
    question: "List all the people who have played alongside 'Art Garfunkel'.",
    sql: "\
SELECT actors.name
FROM actors
JOIN castings ON actors.id = castings.actor_id
JOIN castings AS garfunkel_castings ON castings.movie_id = garfunkel_castings.movie_id
JOIN actors AS garfunkel_actors ON garfunkel_castings.actor_id = garfunkel_actors.id
WHERE garfunkel_actors.name = 'Art Garfunkel'
  AND actors.name != garfunkel_actors.name",
};

/// Every exercise, in the order they are meant to be worked.
pub static EXERCISES: [Exercise; 9] = [
    EXAMPLE_JOIN,
    FORD_FILMS,
    FORD_SUPPORTING_FILMS,
    FILMS_AND_STARS_FROM_SIXTY_TWO,
    TRAVOLTAS_BUSIEST_YEARS,
    ANDREWS_FILMS_AND_LEADS,
    PROLIFIC_ACTORS,
    FILMS_BY_CAST_SIZE,
    COLLEAGUES_OF_GARFUNKEL,
];

/// Returns all exercises.
pub fn all() -> &'static [Exercise] {
    &EXERCISES
}

/// Looks an exercise up by name.
pub fn find(name: &str) -> Option<&'static Exercise> {
    EXERCISES.iter().find(|e| e.name == name)
}

/// Looks an exercise up by name, failing with the list of valid names.
pub fn get(name: &str) -> Result<&'static Exercise> {
    find(name).ok_or_else(|| {
        let names: Vec<&str> = EXERCISES.iter().map(|e| e.name).collect();
        Error::config(format!(
            "Unknown exercise '{name}'. Expected one of: {}",
            names.join(", ")
        ))
    })
}

pub async fn example_join(db: &dyn DatabaseClient) -> Result<QueryResult> {
    EXAMPLE_JOIN.run(db).await
}

pub async fn ford_films(db: &dyn DatabaseClient) -> Result<QueryResult> {
    FORD_FILMS.run(db).await
}

pub async fn ford_supporting_films(db: &dyn DatabaseClient) -> Result<QueryResult> {
    FORD_SUPPORTING_FILMS.run(db).await
}

pub async fn films_and_stars_from_sixty_two(db: &dyn DatabaseClient) -> Result<QueryResult> {
    FILMS_AND_STARS_FROM_SIXTY_TWO.run(db).await
}

pub async fn travoltas_busiest_years(db: &dyn DatabaseClient) -> Result<QueryResult> {
    TRAVOLTAS_BUSIEST_YEARS.run(db).await
}

pub async fn andrews_films_and_leads(db: &dyn DatabaseClient) -> Result<QueryResult> {
    ANDREWS_FILMS_AND_LEADS.run(db).await
}

pub async fn prolific_actors(db: &dyn DatabaseClient) -> Result<QueryResult> {
    PROLIFIC_ACTORS.run(db).await
}

pub async fn films_by_cast_size(db: &dyn DatabaseClient) -> Result<QueryResult> {
    FILMS_BY_CAST_SIZE.run(db).await
}

pub async fn colleagues_of_garfunkel(db: &dyn DatabaseClient) -> Result<QueryResult> {
    COLLEAGUES_OF_GARFUNKEL.run(db).await
}
