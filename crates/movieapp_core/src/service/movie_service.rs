//! Movie use-case service.
//!
//! # Responsibility
//! - Provide create/update/relationship/delete entry points for movies.
//! - Expose the read queries in listing (`MovieSimple`) or detail shapes.
//!
//! # Invariants
//! - Listings are mapped from movie rows only; no per-row relation loads.
//! - Relationship mutations return `MovieDetailDirectorActors`.
//! - Service layer remains storage-agnostic.

use crate::dto::{MovieDetail, MovieDetailDirectorActors, MovieSimple};
use crate::model::movie::{Movie, MovieId, NewMovie};
use crate::model::person::PersonId;
use crate::repo::movie_repo::{MovieRepository, MovieSort, MovieStatistics, MovieYearCount};
use crate::service::{log_write_error, log_write_outcome, ServiceResult};
use log::info;

/// Movie service facade over repository implementations.
pub struct MovieService<R: MovieRepository> {
    repo: R,
}

impl<R: MovieRepository> MovieService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Persists a new movie and echoes it with its generated id.
    pub fn add(&mut self, movie: &MovieDetail) -> ServiceResult<MovieDetail> {
        let created = self
            .repo
            .insert_movie(&NewMovie::from(movie))
            .map_err(|err| log_write_error("movie_add", "movie_id", None, err))?;
        info!(
            "event=movie_add module=service status=ok movie_id={}",
            created.id
        );
        Ok(created.into())
    }

    /// Overwrites title/year/duration of movie `id`.
    ///
    /// Director and actors are left untouched. `None` when `id` is unknown.
    pub fn update(
        &mut self,
        id: MovieId,
        movie: &MovieDetail,
    ) -> ServiceResult<Option<MovieDetail>> {
        let updated = self
            .repo
            .update_movie(id, &NewMovie::from(movie))
            .map_err(|err| log_write_error("movie_update", "movie_id", Some(id), err))?;
        log_write_outcome("movie_update", "movie_id", id, updated.is_some());
        Ok(updated.map(MovieDetail::from))
    }

    /// Sets the director of `movie_id`; `None` when movie or person is unknown.
    pub fn set_director(
        &mut self,
        movie_id: MovieId,
        director_id: PersonId,
    ) -> ServiceResult<Option<MovieDetailDirectorActors>> {
        let result = self
            .repo
            .set_director(movie_id, director_id)
            .map_err(|err| log_write_error("movie_set_director", "movie_id", Some(movie_id), err))?;
        log_write_outcome("movie_set_director", "movie_id", movie_id, result.is_some());
        Ok(result.map(MovieDetailDirectorActors::from))
    }

    /// Removes the director of `movie_id`; `None` when the movie is unknown.
    pub fn clear_director(
        &mut self,
        movie_id: MovieId,
    ) -> ServiceResult<Option<MovieDetailDirectorActors>> {
        let result = self
            .repo
            .clear_director(movie_id)
            .map_err(|err| {
                log_write_error("movie_clear_director", "movie_id", Some(movie_id), err)
            })?;
        log_write_outcome("movie_clear_director", "movie_id", movie_id, result.is_some());
        Ok(result.map(MovieDetailDirectorActors::from))
    }

    /// Replaces the whole actor set of `movie_id`.
    ///
    /// # Errors
    /// - [`crate::service::ServiceError::UnresolvedActors`] when any id names
    ///   no person; the current actor set is kept as is.
    /// - [`crate::service::ServiceError::DuplicateActors`] when an id is
    ///   listed twice; nothing is written either.
    pub fn set_actors(
        &mut self,
        movie_id: MovieId,
        actor_ids: &[PersonId],
    ) -> ServiceResult<Option<MovieDetailDirectorActors>> {
        let result = self
            .repo
            .set_actors(movie_id, actor_ids)
            .map_err(|err| log_write_error("movie_set_actors", "movie_id", Some(movie_id), err))?;
        log_write_outcome("movie_set_actors", "movie_id", movie_id, result.is_some());
        Ok(result.map(MovieDetailDirectorActors::from))
    }

    /// Deletes movie `id` and returns its last stored state.
    ///
    /// Director and actor persons are kept.
    pub fn delete_movie_by_id(&mut self, id: MovieId) -> ServiceResult<Option<MovieDetail>> {
        let deleted = self
            .repo
            .delete_movie(id)
            .map_err(|err| log_write_error("movie_delete", "movie_id", Some(id), err))?;
        log_write_outcome("movie_delete", "movie_id", id, deleted.is_some());
        Ok(deleted.map(MovieDetail::from))
    }

    pub fn get_all(&self) -> ServiceResult<Vec<MovieSimple>> {
        Ok(to_simple(self.repo.find_all()?))
    }

    pub fn get_by_id(&self, id: MovieId) -> ServiceResult<Option<MovieDetailDirectorActors>> {
        Ok(self
            .repo
            .find_with_relations(id)?
            .map(MovieDetailDirectorActors::from))
    }

    /// Case-insensitive title substring search.
    pub fn get_by_title(&self, fragment: &str) -> ServiceResult<Vec<MovieSimple>> {
        Ok(to_simple(self.repo.search_by_title(fragment)?))
    }

    pub fn get_by_exact_title(&self, title: &str) -> ServiceResult<Vec<MovieSimple>> {
        Ok(to_simple(self.repo.find_by_title(title)?))
    }

    pub fn get_by_title_year(&self, title: &str, year: i16) -> ServiceResult<Vec<MovieSimple>> {
        Ok(to_simple(self.repo.find_by_title_and_year(title, year)?))
    }

    /// Movies of one year, sorted by title.
    pub fn get_by_year(&self, year: i16) -> ServiceResult<Vec<MovieSimple>> {
        Ok(to_simple(self.repo.find_by_year(year)?))
    }

    /// Movies within `[min_year, max_year]`, sorted by year.
    pub fn get_by_year_range(
        &self,
        min_year: i16,
        max_year: i16,
    ) -> ServiceResult<Vec<MovieSimple>> {
        Ok(to_simple(self.repo.find_by_year_range(min_year, max_year)?))
    }

    pub fn get_by_year_range_sorted(
        &self,
        min_year: i16,
        max_year: i16,
        sort: &MovieSort,
    ) -> ServiceResult<Vec<MovieSimple>> {
        Ok(to_simple(
            self.repo
                .find_by_year_range_sorted(min_year, max_year, sort)?,
        ))
    }

    pub fn get_by_year_less(&self, max_year: i16) -> ServiceResult<Vec<MovieSimple>> {
        Ok(to_simple(self.repo.find_by_year_max(max_year)?))
    }

    pub fn get_by_year_greater(&self, min_year: i16) -> ServiceResult<Vec<MovieSimple>> {
        Ok(to_simple(self.repo.find_by_year_min(min_year)?))
    }

    pub fn get_without_duration(&self) -> ServiceResult<Vec<MovieSimple>> {
        Ok(to_simple(self.repo.find_without_duration()?))
    }

    /// Director filmography by exact name, newest first.
    pub fn get_by_director_name(&self, name: &str) -> ServiceResult<Vec<MovieSimple>> {
        Ok(to_simple(self.repo.find_by_director_name(name)?))
    }

    /// Actor filmography by exact name, newest first.
    pub fn get_by_actor_name(&self, name: &str) -> ServiceResult<Vec<MovieSimple>> {
        Ok(to_simple(self.repo.find_by_actor_name(name)?))
    }

    /// Sum of known durations within the year range; `0` when nothing matches.
    pub fn get_total_duration(&self, min_year: i16, max_year: i16) -> ServiceResult<i64> {
        Ok(self.repo.total_duration(min_year, max_year)?)
    }

    /// Average of known durations within the year range.
    ///
    /// `None` when no movie in range has a known duration.
    pub fn get_average_duration(
        &self,
        min_year: i16,
        max_year: i16,
    ) -> ServiceResult<Option<f64>> {
        Ok(self.repo.average_duration(min_year, max_year)?)
    }

    pub fn get_statistics(&self) -> ServiceResult<MovieStatistics> {
        Ok(self.repo.statistics()?)
    }

    /// `(year, count)` rows for years `>= year_min` with at least
    /// `count_min` movies, ascending by year.
    pub fn get_count_movie_by_year(
        &self,
        year_min: i16,
        count_min: i64,
    ) -> ServiceResult<Vec<MovieYearCount>> {
        Ok(self.repo.count_by_year(year_min, count_min)?)
    }
}

fn to_simple(movies: Vec<Movie>) -> Vec<MovieSimple> {
    movies.into_iter().map(MovieSimple::from).collect()
}
