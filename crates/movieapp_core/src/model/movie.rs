//! Movie entity and write-side input.
//!
//! # Invariants
//! - `title` is required and must not be blank.
//! - `duration` is optional ("unknown") and never negative when present.
//! - `director_id` is only changed by director assignment, never by
//!   scalar updates.

use crate::model::person::{Person, PersonId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-generated movie identifier.
pub type MovieId = i64;

/// One persisted `movie` row.
///
/// Actors live in the `movie_actor` association and are loaded on demand
/// through [`MovieWithRelations`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub year: i16,
    /// Running time in minutes; `None` when unknown.
    pub duration: Option<i32>,
    pub director_id: Option<PersonId>,
}

/// Updatable scalar fields of a movie, used for create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovie {
    pub title: String,
    pub year: i16,
    pub duration: Option<i32>,
}

impl NewMovie {
    pub fn new(title: impl Into<String>, year: i16, duration: Option<i32>) -> Self {
        Self {
            title: title.into(),
            year,
            duration,
        }
    }

    /// Checks field-level invariants before any SQL mutation.
    pub fn validate(&self) -> Result<(), MovieValidationError> {
        if self.title.trim().is_empty() {
            return Err(MovieValidationError::BlankTitle);
        }
        if let Some(duration) = self.duration {
            if duration < 0 {
                return Err(MovieValidationError::NegativeDuration(duration));
            }
        }
        Ok(())
    }
}

/// A movie together with its loaded director and actor set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieWithRelations {
    pub movie: Movie,
    pub director: Option<Person>,
    /// Sorted by name, then id.
    pub actors: Vec<Person>,
}

/// Field-level validation failure for movie writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieValidationError {
    /// `title` is empty after trimming.
    BlankTitle,
    /// `duration` is present and below zero.
    NegativeDuration(i32),
}

impl Display for MovieValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "movie title must not be blank"),
            Self::NegativeDuration(value) => {
                write!(f, "movie duration must not be negative, got {value}")
            }
        }
    }
}

impl Error for MovieValidationError {}
