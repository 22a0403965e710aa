//! Core catalog logic for the movie application.
//! This crate is the single source of truth for catalog invariants:
//! storage schema, data-access queries, relationship update rules and the
//! transport shapes returned to callers.

pub mod db;
pub mod dto;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use dto::{Filmography, MovieDetail, MovieDetailDirectorActors, MovieSimple, PersonSimple};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::movie::{Movie, MovieId, MovieValidationError, MovieWithRelations, NewMovie};
pub use model::person::{Person, PersonId, PersonValidationError};
pub use repo::movie_repo::{
    MovieRepository, MovieSort, MovieSortField, MovieStatistics, MovieYearCount,
    SortDirection, SqliteMovieRepository,
};
pub use repo::person_repo::{PersonRepository, SqlitePersonRepository};
pub use repo::{RepoError, RepoResult};
pub use service::movie_service::MovieService;
pub use service::person_service::PersonService;
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
