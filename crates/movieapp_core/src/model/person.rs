//! Person entity (directors and actors).

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-generated person identifier.
pub type PersonId = i64;

/// A person who can direct or act in movies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
}

/// Field-level validation failure for person writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonValidationError {
    /// `name` is empty after trimming.
    BlankName,
}

impl Display for PersonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "person name must not be blank"),
        }
    }
}

impl Error for PersonValidationError {}

/// Validates a person name before it is persisted.
pub fn validate_person_name(name: &str) -> Result<(), PersonValidationError> {
    if name.trim().is_empty() {
        return Err(PersonValidationError::BlankName);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_person_name, PersonValidationError};

    #[test]
    fn blank_names_are_rejected() {
        assert_eq!(
            validate_person_name(" \t"),
            Err(PersonValidationError::BlankName)
        );
        assert!(validate_person_name("Clint Eastwood").is_ok());
    }
}
