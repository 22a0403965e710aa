//! Catalog domain model.
//!
//! # Responsibility
//! - Define the persisted entities (`Movie`, `Person`) and their identifiers.
//! - Own field-level validation shared by every write path.
//!
//! # Invariants
//! - Identifiers are store-generated and never reused.
//! - Relationship links are stored outside the scalar fields and only change
//!   through explicit assignment operations.

pub mod movie;
pub mod person;
