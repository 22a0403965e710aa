//! Movie repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide every movie read query as one parameterized SQL statement.
//! - Compute duration aggregates and catalog statistics store-side.
//! - Own the relationship update rules (director, actor set) and deletion.
//!
//! # Invariants
//! - Write paths call `NewMovie::validate()` before SQL mutations; an
//!   update of an unknown id is `None` whatever its input.
//! - Each write runs in one `IMMEDIATE` transaction; an early return drops
//!   the transaction and rolls it back.
//! - Actor assignment is all-or-nothing: a repeated or unresolved person id
//!   leaves the current actor set untouched.
//! - Scalar updates never touch `director_id` or `movie_actor`.

use crate::model::movie::{Movie, MovieId, MovieWithRelations, NewMovie};
use crate::model::person::{Person, PersonId};
use crate::repo::person_repo::{
    load_person, map_person_row, PersonRepository, SqlitePersonRepository,
};
use crate::repo::{contains_pattern, ensure_catalog_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Params, Row, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub(crate) const MOVIE_SELECT_SQL: &str = "SELECT
    m.id,
    m.title,
    m.year,
    m.duration,
    m.director_id
FROM movie m";

/// Column a caller may sort movie listings by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieSortField {
    Id,
    Title,
    Year,
    Duration,
}

impl MovieSortField {
    fn column(self) -> &'static str {
        match self {
            Self::Id => "m.id",
            Self::Title => "m.title",
            Self::Year => "m.year",
            Self::Duration => "m.duration",
        }
    }
}

/// Sort direction for one [`MovieSort`] key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Caller-supplied ordering for movie listings.
///
/// Keys apply in insertion order; `m.id ASC` is appended as final tiebreak
/// unless the caller already sorts by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieSort {
    orders: Vec<(MovieSortField, SortDirection)>,
}

impl MovieSort {
    pub fn by(field: MovieSortField, direction: SortDirection) -> Self {
        Self::default().then(field, direction)
    }

    pub fn then(mut self, field: MovieSortField, direction: SortDirection) -> Self {
        self.orders.push((field, direction));
        self
    }

    fn order_by_clause(&self) -> String {
        let mut keys: Vec<String> = self
            .orders
            .iter()
            .map(|(field, direction)| format!("{} {}", field.column(), direction.keyword()))
            .collect();
        if !self
            .orders
            .iter()
            .any(|(field, _)| *field == MovieSortField::Id)
        {
            keys.push("m.id ASC".to_string());
        }
        keys.join(", ")
    }
}

/// Single-row statistics over the whole catalog.
///
/// Every optional field is `None` on an empty catalog; `total_duration`
/// counts unknown durations as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieStatistics {
    pub count: i64,
    pub min_year: Option<i16>,
    pub max_year: Option<i16>,
    pub total_duration: i64,
    pub average_duration: Option<f64>,
    pub min_duration: Option<i32>,
    pub max_duration: Option<i32>,
    pub min_title_length: Option<i64>,
    pub max_title_length: Option<i64>,
}

/// Number of movies released in one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieYearCount {
    pub year: i16,
    pub count_movie: i64,
}

/// Repository interface for the movie data-access contract.
pub trait MovieRepository {
    fn insert_movie(&mut self, movie: &NewMovie) -> RepoResult<Movie>;
    /// Overwrites scalar fields; `None` when `id` does not exist.
    fn update_movie(&mut self, id: MovieId, movie: &NewMovie) -> RepoResult<Option<Movie>>;
    /// `None` when either the movie or the person does not exist.
    fn set_director(
        &mut self,
        movie_id: MovieId,
        director_id: PersonId,
    ) -> RepoResult<Option<MovieWithRelations>>;
    fn clear_director(&mut self, movie_id: MovieId) -> RepoResult<Option<MovieWithRelations>>;
    /// Replaces the whole actor set, or fails without touching it:
    /// [`RepoError::DuplicateActors`] when an id is repeated,
    /// [`RepoError::UnresolvedActors`] when an id names no person.
    fn set_actors(
        &mut self,
        movie_id: MovieId,
        actor_ids: &[PersonId],
    ) -> RepoResult<Option<MovieWithRelations>>;
    /// Returns the movie as it was before deletion.
    fn delete_movie(&mut self, id: MovieId) -> RepoResult<Option<Movie>>;

    fn find_by_id(&self, id: MovieId) -> RepoResult<Option<Movie>>;
    fn find_with_relations(&self, id: MovieId) -> RepoResult<Option<MovieWithRelations>>;
    fn find_all(&self) -> RepoResult<Vec<Movie>>;
    fn find_by_title(&self, title: &str) -> RepoResult<Vec<Movie>>;
    fn search_by_title(&self, fragment: &str) -> RepoResult<Vec<Movie>>;
    fn find_by_year(&self, year: i16) -> RepoResult<Vec<Movie>>;
    fn find_by_year_min(&self, year_min: i16) -> RepoResult<Vec<Movie>>;
    fn find_by_year_max(&self, year_max: i16) -> RepoResult<Vec<Movie>>;
    fn find_by_year_range(&self, year_min: i16, year_max: i16) -> RepoResult<Vec<Movie>>;
    fn find_by_year_range_sorted(
        &self,
        year_min: i16,
        year_max: i16,
        sort: &MovieSort,
    ) -> RepoResult<Vec<Movie>>;
    fn find_by_title_and_year(&self, title: &str, year: i16) -> RepoResult<Vec<Movie>>;
    fn find_without_duration(&self) -> RepoResult<Vec<Movie>>;
    fn find_by_director_name(&self, name: &str) -> RepoResult<Vec<Movie>>;
    fn find_by_actor_name(&self, name: &str) -> RepoResult<Vec<Movie>>;

    fn total_duration(&self, year_min: i16, year_max: i16) -> RepoResult<i64>;
    fn average_duration(&self, year_min: i16, year_max: i16) -> RepoResult<Option<f64>>;
    fn statistics(&self) -> RepoResult<MovieStatistics>;
    fn count_by_year(&self, year_min: i16, count_min: i64) -> RepoResult<Vec<MovieYearCount>>;
}

/// SQLite-backed movie repository.
pub struct SqliteMovieRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteMovieRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_catalog_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl MovieRepository for SqliteMovieRepository<'_> {
    fn insert_movie(&mut self, movie: &NewMovie) -> RepoResult<Movie> {
        movie.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO movie (title, year, duration) VALUES (?1, ?2, ?3);",
            params![movie.title.as_str(), movie.year, movie.duration],
        )?;
        let id = tx.last_insert_rowid();
        let stored = load_movie(&tx, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("inserted movie {id} missing in read-back"))
        })?;
        tx.commit()?;

        Ok(stored)
    }

    fn update_movie(&mut self, id: MovieId, movie: &NewMovie) -> RepoResult<Option<Movie>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if load_movie(&tx, id)?.is_none() {
            return Ok(None);
        }
        movie.validate()?;

        tx.execute(
            "UPDATE movie
             SET
                title = ?2,
                year = ?3,
                duration = ?4
             WHERE id = ?1;",
            params![id, movie.title.as_str(), movie.year, movie.duration],
        )?;

        let updated = load_movie(&tx, id)?;
        tx.commit()?;
        Ok(updated)
    }

    fn set_director(
        &mut self,
        movie_id: MovieId,
        director_id: PersonId,
    ) -> RepoResult<Option<MovieWithRelations>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(mut movie) = load_movie(&tx, movie_id)? else {
            return Ok(None);
        };
        let Some(director) = load_person(&tx, director_id)? else {
            return Ok(None);
        };

        tx.execute(
            "UPDATE movie SET director_id = ?2 WHERE id = ?1;",
            params![movie_id, director.id],
        )?;
        movie.director_id = Some(director.id);
        let actors = load_actors(&tx, movie_id)?;
        tx.commit()?;

        Ok(Some(MovieWithRelations {
            movie,
            director: Some(director),
            actors,
        }))
    }

    fn clear_director(&mut self, movie_id: MovieId) -> RepoResult<Option<MovieWithRelations>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(mut movie) = load_movie(&tx, movie_id)? else {
            return Ok(None);
        };

        tx.execute(
            "UPDATE movie SET director_id = NULL WHERE id = ?1;",
            [movie_id],
        )?;
        movie.director_id = None;
        let actors = load_actors(&tx, movie_id)?;
        tx.commit()?;

        Ok(Some(MovieWithRelations {
            movie,
            director: None,
            actors,
        }))
    }

    fn set_actors(
        &mut self,
        movie_id: MovieId,
        actor_ids: &[PersonId],
    ) -> RepoResult<Option<MovieWithRelations>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(movie) = load_movie(&tx, movie_id)? else {
            return Ok(None);
        };

        let duplicates = duplicate_ids(actor_ids);
        if !duplicates.is_empty() {
            return Err(RepoError::DuplicateActors {
                movie_id,
                duplicates,
            });
        }

        let actors = SqlitePersonRepository::from_ready(&tx).find_all_by_id(actor_ids)?;
        if actors.len() != actor_ids.len() {
            let resolved: BTreeSet<PersonId> = actors.iter().map(|person| person.id).collect();
            return Err(RepoError::UnresolvedActors {
                movie_id,
                missing: actor_ids
                    .iter()
                    .copied()
                    .filter(|id| !resolved.contains(id))
                    .collect(),
            });
        }

        tx.execute("DELETE FROM movie_actor WHERE movie_id = ?1;", [movie_id])?;
        for actor in &actors {
            tx.execute(
                "INSERT INTO movie_actor (movie_id, person_id) VALUES (?1, ?2);",
                params![movie_id, actor.id],
            )?;
        }

        let director = match movie.director_id {
            Some(director_id) => load_person(&tx, director_id)?,
            None => None,
        };
        let actors = load_actors(&tx, movie_id)?;
        tx.commit()?;

        Ok(Some(MovieWithRelations {
            movie,
            director,
            actors,
        }))
    }

    fn delete_movie(&mut self, id: MovieId) -> RepoResult<Option<Movie>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(movie) = load_movie(&tx, id)? else {
            return Ok(None);
        };

        tx.execute("UPDATE movie SET director_id = NULL WHERE id = ?1;", [id])?;
        tx.execute("DELETE FROM movie_actor WHERE movie_id = ?1;", [id])?;
        tx.execute("DELETE FROM movie WHERE id = ?1;", [id])?;
        tx.commit()?;

        Ok(Some(movie))
    }

    fn find_by_id(&self, id: MovieId) -> RepoResult<Option<Movie>> {
        load_movie(self.conn, id)
    }

    fn find_with_relations(&self, id: MovieId) -> RepoResult<Option<MovieWithRelations>> {
        let Some(movie) = load_movie(self.conn, id)? else {
            return Ok(None);
        };
        let director = match movie.director_id {
            Some(director_id) => load_person(self.conn, director_id)?,
            None => None,
        };
        let actors = load_actors(self.conn, id)?;

        Ok(Some(MovieWithRelations {
            movie,
            director,
            actors,
        }))
    }

    fn find_all(&self) -> RepoResult<Vec<Movie>> {
        query_movies(self.conn, &format!("{MOVIE_SELECT_SQL} ORDER BY m.id ASC;"), [])
    }

    fn find_by_title(&self, title: &str) -> RepoResult<Vec<Movie>> {
        query_movies(
            self.conn,
            &format!("{MOVIE_SELECT_SQL} WHERE m.title = ?1 ORDER BY m.id ASC;"),
            [title],
        )
    }

    fn search_by_title(&self, fragment: &str) -> RepoResult<Vec<Movie>> {
        query_movies(
            self.conn,
            &format!(
                "{MOVIE_SELECT_SQL}
                 WHERE UPPER(m.title) LIKE UPPER(?1) ESCAPE '\\'
                 ORDER BY m.id ASC;"
            ),
            [contains_pattern(fragment)],
        )
    }

    fn find_by_year(&self, year: i16) -> RepoResult<Vec<Movie>> {
        query_movies(
            self.conn,
            &format!("{MOVIE_SELECT_SQL} WHERE m.year = ?1 ORDER BY m.title ASC, m.id ASC;"),
            [year],
        )
    }

    fn find_by_year_min(&self, year_min: i16) -> RepoResult<Vec<Movie>> {
        query_movies(
            self.conn,
            &format!("{MOVIE_SELECT_SQL} WHERE m.year >= ?1 ORDER BY m.id ASC;"),
            [year_min],
        )
    }

    fn find_by_year_max(&self, year_max: i16) -> RepoResult<Vec<Movie>> {
        query_movies(
            self.conn,
            &format!("{MOVIE_SELECT_SQL} WHERE m.year <= ?1 ORDER BY m.id ASC;"),
            [year_max],
        )
    }

    fn find_by_year_range(&self, year_min: i16, year_max: i16) -> RepoResult<Vec<Movie>> {
        self.find_by_year_range_sorted(
            year_min,
            year_max,
            &MovieSort::by(MovieSortField::Year, SortDirection::Asc),
        )
    }

    fn find_by_year_range_sorted(
        &self,
        year_min: i16,
        year_max: i16,
        sort: &MovieSort,
    ) -> RepoResult<Vec<Movie>> {
        query_movies(
            self.conn,
            &format!(
                "{MOVIE_SELECT_SQL}
                 WHERE m.year BETWEEN ?1 AND ?2
                 ORDER BY {};",
                sort.order_by_clause()
            ),
            [year_min, year_max],
        )
    }

    fn find_by_title_and_year(&self, title: &str, year: i16) -> RepoResult<Vec<Movie>> {
        query_movies(
            self.conn,
            &format!(
                "{MOVIE_SELECT_SQL}
                 WHERE m.title = ?1 AND m.year = ?2
                 ORDER BY m.year ASC, m.id ASC;"
            ),
            params![title, year],
        )
    }

    fn find_without_duration(&self) -> RepoResult<Vec<Movie>> {
        query_movies(
            self.conn,
            &format!("{MOVIE_SELECT_SQL} WHERE m.duration IS NULL ORDER BY m.id ASC;"),
            [],
        )
    }

    fn find_by_director_name(&self, name: &str) -> RepoResult<Vec<Movie>> {
        query_movies(
            self.conn,
            &format!(
                "{MOVIE_SELECT_SQL}
                 INNER JOIN person d ON d.id = m.director_id
                 WHERE d.name = ?1
                 ORDER BY m.year DESC, m.id ASC;"
            ),
            [name],
        )
    }

    fn find_by_actor_name(&self, name: &str) -> RepoResult<Vec<Movie>> {
        query_movies(
            self.conn,
            &format!(
                "{MOVIE_SELECT_SQL}
                 WHERE EXISTS (
                    SELECT 1
                    FROM movie_actor ma
                    INNER JOIN person a ON a.id = ma.person_id
                    WHERE ma.movie_id = m.id
                      AND a.name = ?1
                 )
                 ORDER BY m.year DESC, m.id ASC;"
            ),
            [name],
        )
    }

    fn total_duration(&self, year_min: i16, year_max: i16) -> RepoResult<i64> {
        let total = self.conn.query_row(
            "SELECT COALESCE(SUM(duration), 0)
             FROM movie
             WHERE year BETWEEN ?1 AND ?2;",
            [year_min, year_max],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    fn average_duration(&self, year_min: i16, year_max: i16) -> RepoResult<Option<f64>> {
        let average = self.conn.query_row(
            "SELECT AVG(duration)
             FROM movie
             WHERE year BETWEEN ?1 AND ?2;",
            [year_min, year_max],
            |row| row.get(0),
        )?;
        Ok(average)
    }

    fn statistics(&self) -> RepoResult<MovieStatistics> {
        let statistics = self.conn.query_row(
            "SELECT
                COUNT(*),
                MIN(year),
                MAX(year),
                COALESCE(SUM(duration), 0),
                AVG(duration),
                MIN(duration),
                MAX(duration),
                MIN(LENGTH(title)),
                MAX(LENGTH(title))
             FROM movie;",
            [],
            |row| {
                Ok(MovieStatistics {
                    count: row.get(0)?,
                    min_year: row.get(1)?,
                    max_year: row.get(2)?,
                    total_duration: row.get(3)?,
                    average_duration: row.get(4)?,
                    min_duration: row.get(5)?,
                    max_duration: row.get(6)?,
                    min_title_length: row.get(7)?,
                    max_title_length: row.get(8)?,
                })
            },
        )?;
        Ok(statistics)
    }

    fn count_by_year(&self, year_min: i16, count_min: i64) -> RepoResult<Vec<MovieYearCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT year, COUNT(*) AS count_movie
             FROM movie
             WHERE year >= ?1
             GROUP BY year
             HAVING COUNT(*) >= ?2
             ORDER BY year ASC;",
        )?;
        let rows = stmt.query_map(params![year_min, count_min], |row| {
            Ok(MovieYearCount {
                year: row.get("year")?,
                count_movie: row.get("count_movie")?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

/// Runs one movie listing statement; used by person filmography queries too.
pub(crate) fn query_movies<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> RepoResult<Vec<Movie>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, map_movie_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Ids that occur more than once in `ids`, ascending.
fn duplicate_ids(ids: &[PersonId]) -> Vec<PersonId> {
    let mut seen = BTreeSet::new();
    let mut repeated = BTreeSet::new();
    for id in ids {
        if !seen.insert(*id) {
            repeated.insert(*id);
        }
    }
    repeated.into_iter().collect()
}

fn load_movie(conn: &Connection, id: MovieId) -> RepoResult<Option<Movie>> {
    let movie = conn
        .query_row(
            &format!("{MOVIE_SELECT_SQL} WHERE m.id = ?1;"),
            [id],
            map_movie_row,
        )
        .optional()?;
    Ok(movie)
}

fn load_actors(conn: &Connection, movie_id: MovieId) -> RepoResult<Vec<Person>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.name
         FROM movie_actor ma
         INNER JOIN person p ON p.id = ma.person_id
         WHERE ma.movie_id = ?1
         ORDER BY p.name ASC, p.id ASC;",
    )?;
    let rows = stmt.query_map([movie_id], map_person_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

fn map_movie_row(row: &Row<'_>) -> rusqlite::Result<Movie> {
    Ok(Movie {
        id: row.get(0)?,
        title: row.get(1)?,
        year: row.get(2)?,
        duration: row.get(3)?,
        director_id: row.get(4)?,
    })
}
