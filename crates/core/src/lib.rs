//! `petclinic-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no storage concerns):
//! identifiers, the entity trait, the domain error model and field validation.

pub mod entity;
pub mod error;
pub mod id;
pub mod validation;

pub use entity::{Entity, find_by_id};
pub use error::{DomainError, DomainResult};
pub use id::{OwnerId, PetId, PetTypeId, SpecialtyId, VetId, VisitId};
pub use validation::{Constraint, FieldRule, Locale, Validate, Validator, Violation, Violations};
