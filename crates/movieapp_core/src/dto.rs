//! Transport-facing shapes and entity → shape conversions.
//!
//! # Responsibility
//! - Define the listing, detail and detail-with-relations movie shapes.
//! - Keep each shape's field set explicit; conversions are plain `From`
//!   impls, no reflection or field copying by name.
//!
//! # Invariants
//! - Scalar fields are copied losslessly.
//! - `MovieSimple` and `MovieDetail` are built from a `Movie` row alone and
//!   never require relation loads.

use crate::model::movie::{Movie, MovieId, MovieWithRelations, NewMovie};
use crate::model::person::{Person, PersonId};
use serde::{Deserialize, Serialize};

/// Listing shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieSimple {
    pub id: MovieId,
    pub title: String,
    pub year: i16,
    pub duration: Option<i32>,
}

/// Scalar-only shape used as create/update input and echo.
///
/// `id` is ignored on input and always set on output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieDetail {
    #[serde(default)]
    pub id: Option<MovieId>,
    pub title: String,
    pub year: i16,
    #[serde(default)]
    pub duration: Option<i32>,
}

impl MovieDetail {
    /// Builds an input shape for create/update calls.
    pub fn input(title: impl Into<String>, year: i16, duration: Option<i32>) -> Self {
        Self {
            id: None,
            title: title.into(),
            year,
            duration,
        }
    }
}

/// Summarized director/actor reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonSimple {
    pub id: PersonId,
    pub name: String,
}

/// Single-item shape with summarized director and actor set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieDetailDirectorActors {
    pub id: MovieId,
    pub title: String,
    pub year: i16,
    pub duration: Option<i32>,
    pub director: Option<PersonSimple>,
    pub actors: Vec<PersonSimple>,
}

/// Movies associated with one person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filmography {
    pub person: PersonSimple,
    /// Newest first.
    pub directed: Vec<MovieSimple>,
    /// Newest first.
    pub acted: Vec<MovieSimple>,
}

impl From<&Movie> for MovieSimple {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            year: movie.year,
            duration: movie.duration,
        }
    }
}

impl From<Movie> for MovieSimple {
    fn from(movie: Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title,
            year: movie.year,
            duration: movie.duration,
        }
    }
}

impl From<Movie> for MovieDetail {
    fn from(movie: Movie) -> Self {
        Self {
            id: Some(movie.id),
            title: movie.title,
            year: movie.year,
            duration: movie.duration,
        }
    }
}

impl From<&MovieDetail> for NewMovie {
    fn from(detail: &MovieDetail) -> Self {
        NewMovie::new(detail.title.clone(), detail.year, detail.duration)
    }
}

impl From<Person> for PersonSimple {
    fn from(person: Person) -> Self {
        Self {
            id: person.id,
            name: person.name,
        }
    }
}

impl From<MovieWithRelations> for MovieDetailDirectorActors {
    fn from(value: MovieWithRelations) -> Self {
        let MovieWithRelations {
            movie,
            director,
            actors,
        } = value;
        Self {
            id: movie.id,
            title: movie.title,
            year: movie.year,
            duration: movie.duration,
            director: director.map(PersonSimple::from),
            actors: actors.into_iter().map(PersonSimple::from).collect(),
        }
    }
}
