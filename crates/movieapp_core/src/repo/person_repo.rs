//! Person repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Create, rename and look up directors/actors.
//! - Resolve id lists for actor assignment.
//! - Answer filmography queries (movies directed / acted in).
//!
//! # Invariants
//! - Every write is one SQL statement, so it is atomic on its own.
//! - Person rows are never deleted through this repository.

use crate::model::movie::Movie;
use crate::model::person::{validate_person_name, Person, PersonId};
use crate::repo::movie_repo::{query_movies, MOVIE_SELECT_SQL};
use crate::repo::{contains_pattern, ensure_catalog_connection_ready, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;

const ID_CHUNK_SIZE: usize = 500;

/// Repository interface for person operations.
pub trait PersonRepository {
    fn insert_person(&self, name: &str) -> RepoResult<Person>;
    /// Renames a person; `None` when `id` does not exist.
    fn update_person(&self, id: PersonId, name: &str) -> RepoResult<Option<Person>>;
    fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Person>>;
    /// Returns the persons that exist among `ids`, each at most once.
    fn find_all_by_id(&self, ids: &[PersonId]) -> RepoResult<Vec<Person>>;
    fn find_all(&self) -> RepoResult<Vec<Person>>;
    fn search_by_name(&self, fragment: &str) -> RepoResult<Vec<Person>>;
    /// Movies directed by `id`, newest first.
    fn directed_movies(&self, id: PersonId) -> RepoResult<Vec<Movie>>;
    /// Movies `id` acted in, newest first.
    fn acted_movies(&self, id: PersonId) -> RepoResult<Vec<Movie>>;
}

/// SQLite-backed person repository.
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_catalog_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Wraps a connection (or open transaction) another repository has
    /// already checked.
    pub(crate) fn from_ready(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn insert_person(&self, name: &str) -> RepoResult<Person> {
        validate_person_name(name)?;

        self.conn
            .execute("INSERT INTO person (name) VALUES (?1);", [name])?;
        Ok(Person {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    fn update_person(&self, id: PersonId, name: &str) -> RepoResult<Option<Person>> {
        validate_person_name(name)?;

        let changed = self.conn.execute(
            "UPDATE person SET name = ?2 WHERE id = ?1;",
            params![id, name],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        Ok(Some(Person {
            id,
            name: name.to_string(),
        }))
    }

    fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Person>> {
        load_person(self.conn, id)
    }

    fn find_all_by_id(&self, ids: &[PersonId]) -> RepoResult<Vec<Person>> {
        let unique: BTreeSet<PersonId> = ids.iter().copied().collect();
        load_persons_by_ids(self.conn, &unique)
    }

    fn find_all(&self) -> RepoResult<Vec<Person>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM person ORDER BY name ASC, id ASC;")?;
        let rows = stmt.query_map([], map_person_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn search_by_name(&self, fragment: &str) -> RepoResult<Vec<Person>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name
             FROM person
             WHERE UPPER(name) LIKE UPPER(?1) ESCAPE '\\'
             ORDER BY name ASC, id ASC;",
        )?;
        let rows = stmt.query_map([contains_pattern(fragment)], map_person_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn directed_movies(&self, id: PersonId) -> RepoResult<Vec<Movie>> {
        query_movies(
            self.conn,
            &format!("{MOVIE_SELECT_SQL} WHERE m.director_id = ?1 ORDER BY m.year DESC, m.id ASC;"),
            [id],
        )
    }

    fn acted_movies(&self, id: PersonId) -> RepoResult<Vec<Movie>> {
        query_movies(
            self.conn,
            &format!(
                "{MOVIE_SELECT_SQL}
                 INNER JOIN movie_actor ma ON ma.movie_id = m.id
                 WHERE ma.person_id = ?1
                 ORDER BY m.year DESC, m.id ASC;"
            ),
            [id],
        )
    }
}

pub(crate) fn load_person(conn: &Connection, id: PersonId) -> RepoResult<Option<Person>> {
    let person = conn
        .query_row(
            "SELECT id, name FROM person WHERE id = ?1;",
            [id],
            map_person_row,
        )
        .optional()?;
    Ok(person)
}

/// Fetches all persons whose id is in `ids`, ordered by name then id.
///
/// Ids are bound in chunks of `ID_CHUNK_SIZE` to stay below SQLite's
/// host-parameter limit.
fn load_persons_by_ids(conn: &Connection, ids: &BTreeSet<PersonId>) -> RepoResult<Vec<Person>> {
    let ids: Vec<PersonId> = ids.iter().copied().collect();
    let mut persons = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(ID_CHUNK_SIZE) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let sql = format!("SELECT id, name FROM person WHERE id IN ({placeholders});");
        let bind_values: Vec<Value> = chunk.iter().map(|id| Value::Integer(*id)).collect();

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bind_values), map_person_row)?;
        for row in rows {
            persons.push(row?);
        }
    }

    persons.sort_by(|left, right| {
        left.name
            .cmp(&right.name)
            .then_with(|| left.id.cmp(&right.id))
    });
    Ok(persons)
}

pub(crate) fn map_person_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}
