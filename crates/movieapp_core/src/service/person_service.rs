//! Person use-case service.
//!
//! # Responsibility
//! - Create and rename directors/actors.
//! - Serve person lookups and filmographies in transport shapes.

use crate::dto::{Filmography, MovieSimple, PersonSimple};
use crate::model::person::PersonId;
use crate::repo::person_repo::PersonRepository;
use crate::service::{log_write_error, log_write_outcome, ServiceResult};
use log::info;

/// Person service facade over repository implementations.
pub struct PersonService<R: PersonRepository> {
    repo: R,
}

impl<R: PersonRepository> PersonService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Persists a new person and returns it with its generated id.
    pub fn add(&self, name: &str) -> ServiceResult<PersonSimple> {
        let person = self
            .repo
            .insert_person(name)
            .map_err(|err| log_write_error("person_add", "person_id", None, err))?;
        info!(
            "event=person_add module=service status=ok person_id={}",
            person.id
        );
        Ok(person.into())
    }

    /// Renames person `id`; `None` when `id` is unknown.
    pub fn rename(&self, id: PersonId, name: &str) -> ServiceResult<Option<PersonSimple>> {
        let person = self
            .repo
            .update_person(id, name)
            .map_err(|err| log_write_error("person_rename", "person_id", Some(id), err))?;
        log_write_outcome("person_rename", "person_id", id, person.is_some());
        Ok(person.map(PersonSimple::from))
    }

    pub fn get_by_id(&self, id: PersonId) -> ServiceResult<Option<PersonSimple>> {
        Ok(self.repo.find_by_id(id)?.map(PersonSimple::from))
    }

    /// All persons sorted by name.
    pub fn get_all(&self) -> ServiceResult<Vec<PersonSimple>> {
        Ok(self
            .repo
            .find_all()?
            .into_iter()
            .map(PersonSimple::from)
            .collect())
    }

    /// Case-insensitive name substring search.
    pub fn search_by_name(&self, fragment: &str) -> ServiceResult<Vec<PersonSimple>> {
        Ok(self
            .repo
            .search_by_name(fragment)?
            .into_iter()
            .map(PersonSimple::from)
            .collect())
    }

    /// Movies directed and acted in by person `id`; `None` when unknown.
    pub fn get_filmography(&self, id: PersonId) -> ServiceResult<Option<Filmography>> {
        let Some(person) = self.repo.find_by_id(id)? else {
            return Ok(None);
        };
        let directed = self.repo.directed_movies(id)?;
        let acted = self.repo.acted_movies(id)?;

        Ok(Some(Filmography {
            person: person.into(),
            directed: directed.into_iter().map(MovieSimple::from).collect(),
            acted: acted.into_iter().map(MovieSimple::from).collect(),
        }))
    }
}
