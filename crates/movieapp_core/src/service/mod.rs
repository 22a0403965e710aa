//! Catalog use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Map persistence entities to transport shapes (`crate::dto`).
//! - Keep transport layers decoupled from storage details.
//!
//! # Invariants
//! - "Not found" is `Ok(None)`; constraint failures are `Err`, so callers
//!   can always tell them apart.

use crate::model::movie::{MovieId, MovieValidationError};
use crate::model::person::{PersonId, PersonValidationError};
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod movie_service;
pub mod person_service;

/// Service error for catalog use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Movie input failed validation; nothing was written.
    InvalidMovie(MovieValidationError),
    /// Person input failed validation; nothing was written.
    InvalidPerson(PersonValidationError),
    /// Actor assignment named unknown persons; the actor set is unchanged.
    UnresolvedActors {
        movie_id: MovieId,
        missing: Vec<PersonId>,
    },
    /// Actor assignment repeated a person id; the actor set is unchanged.
    DuplicateActors {
        movie_id: MovieId,
        duplicates: Vec<PersonId>,
    },
    /// The store rejected the write on a schema constraint.
    ConstraintViolation(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMovie(err) => write!(f, "invalid movie: {err}"),
            Self::InvalidPerson(err) => write!(f, "invalid person: {err}"),
            Self::UnresolvedActors { movie_id, missing } => write!(
                f,
                "actors not assigned to movie {movie_id}: unknown person ids {missing:?}"
            ),
            Self::DuplicateActors {
                movie_id,
                duplicates,
            } => write!(
                f,
                "actors not assigned to movie {movie_id}: repeated person ids {duplicates:?}"
            ),
            Self::ConstraintViolation(message) => write!(f, "constraint violation: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidMovie(err) => Some(err),
            Self::InvalidPerson(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::InvalidMovie(err),
            RepoError::PersonValidation(err) => Self::InvalidPerson(err),
            RepoError::UnresolvedActors { movie_id, missing } => {
                Self::UnresolvedActors { movie_id, missing }
            }
            RepoError::DuplicateActors {
                movie_id,
                duplicates,
            } => Self::DuplicateActors {
                movie_id,
                duplicates,
            },
            RepoError::ConstraintViolation(message) => Self::ConstraintViolation(message),
            other => Self::Repo(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

fn error_code(err: &ServiceError) -> &'static str {
    match err {
        ServiceError::InvalidMovie(_) | ServiceError::InvalidPerson(_) => "validation_failed",
        ServiceError::UnresolvedActors { .. } => "unresolved_actors",
        ServiceError::DuplicateActors { .. } => "duplicate_actors",
        ServiceError::ConstraintViolation(_) => "constraint_violation",
        ServiceError::Repo(_) => "repo_failed",
    }
}

/// Logs the outcome of a write that targets one existing row.
pub(crate) fn log_write_outcome(event: &str, id_field: &str, id: i64, found: bool) {
    let status = if found { "ok" } else { "not_found" };
    info!("event={event} module=service status={status} {id_field}={id}");
}

/// Converts a failed write into a [`ServiceError`] and logs its error code.
pub(crate) fn log_write_error(
    event: &str,
    id_field: &str,
    id: Option<i64>,
    err: RepoError,
) -> ServiceError {
    let err = ServiceError::from(err);
    match id {
        Some(id) => warn!(
            "event={event} module=service status=error {id_field}={id} error_code={}",
            error_code(&err)
        ),
        None => warn!(
            "event={event} module=service status=error error_code={}",
            error_code(&err)
        ),
    }
    err
}
