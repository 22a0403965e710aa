//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the catalog data-access contract (reads, aggregates, writes).
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Write paths validate input before SQL mutations.
//! - Lookups by id report absence as `Ok(None)`, never as an error.
//! - Every write runs in exactly one transaction.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::movie::{MovieId, MovieValidationError};
use crate::model::person::{PersonId, PersonValidationError};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod movie_repo;
pub mod person_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for catalog persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Movie input failed field validation; nothing was written.
    Validation(MovieValidationError),
    /// Person input failed field validation; nothing was written.
    PersonValidation(PersonValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// SQLite rejected the write on a schema constraint.
    ConstraintViolation(String),
    /// Actor assignment referenced persons that do not exist.
    UnresolvedActors {
        movie_id: MovieId,
        missing: Vec<PersonId>,
    },
    /// Actor assignment listed the same person id more than once.
    DuplicateActors {
        movie_id: MovieId,
        duplicates: Vec<PersonId>,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid entity.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::PersonValidation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::ConstraintViolation(message) => write!(f, "constraint violation: {message}"),
            Self::UnresolvedActors { movie_id, missing } => write!(
                f,
                "cannot assign actors to movie {movie_id}: unknown person ids {missing:?}"
            ),
            Self::DuplicateActors {
                movie_id,
                duplicates,
            } => write!(
                f,
                "cannot assign actors to movie {movie_id}: repeated person ids {duplicates:?}"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "catalog repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "catalog repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "catalog repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::PersonValidation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MovieValidationError> for RepoError {
    fn from(value: MovieValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PersonValidationError> for RepoError {
    fn from(value: PersonValidationError) -> Self {
        Self::PersonValidation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        if value.is_constraint_violation() {
            Self::ConstraintViolation(value.to_string())
        } else {
            Self::Db(value)
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::FromSqlConversionFailure(_, _, err) => {
                Self::InvalidData(err.to_string())
            }
            rusqlite::Error::IntegralValueOutOfRange(column, value) => Self::InvalidData(format!(
                "integer {value} out of range in column {column}"
            )),
            other => DbError::Sqlite(other).into(),
        }
    }
}

/// Tables and columns a catalog connection must expose.
const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    ("person", &["id", "name"]),
    ("movie", &["id", "title", "year", "duration", "director_id"]),
    ("movie_actor", &["movie_id", "person_id"]),
];

/// Rejects connections that were not bootstrapped through `db::open_db*`.
pub(crate) fn ensure_catalog_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for (table, columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(*table));
        }
        for column in *columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn {
                    table: *table,
                    column: *column,
                });
            }
        }
    }

    Ok(())
}

/// Builds a `LIKE` pattern matching `fragment` anywhere, with `%`, `_` and
/// `\` in the fragment taken literally. Use together with `ESCAPE '\'`.
pub(crate) fn contains_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for ch in fragment.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::contains_pattern;

    #[test]
    fn contains_pattern_escapes_like_wildcards() {
        assert_eq!(contains_pattern("lion"), "%lion%");
        assert_eq!(contains_pattern("100%_\\"), "%100\\%\\_\\\\%");
    }
}
