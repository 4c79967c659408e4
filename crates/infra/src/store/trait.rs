use async_trait::async_trait;
use thiserror::Error;

use petclinic_core::{DomainError, OwnerId, PetId};
use petclinic_model::{Owner, Pet, PetType, Vet, Visit};

/// Repository operation error.
///
/// These are **storage errors**. Domain failures raised while persisting
/// (e.g. a pet without a type) are carried in `Domain` so callers can tell
/// them apart from faults of the backend.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error in {operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("schema migration failed: {0}")]
    Migration(String),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("corrupt row: {0}")]
    CorruptRow(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl RepositoryError {
    pub fn database(operation: &'static str, source: sqlx::Error) -> Self {
        Self::Database { operation, source }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Owners and, by cascade, their pets and visits.
///
/// ## Save semantics
///
/// `save()` inserts when `owner.id` is `None` and updates otherwise. Pets in
/// `owner.pets` are inserted or updated in the same unit of work, as are their
/// visits. Generated ids are written back into `owner` only after the whole
/// unit succeeds; on error neither the store nor `owner` changes.
#[async_trait]
pub trait OwnerRepository: Send + Sync {
    /// Owners whose last name starts with `last_name`, ignoring ASCII case.
    ///
    /// An empty string matches every owner. Results are ordered by id.
    async fn find_by_last_name(&self, last_name: &str) -> RepositoryResult<Vec<Owner>>;

    /// Owner with pets, pet types and visits loaded.
    async fn find_by_id(&self, id: OwnerId) -> RepositoryResult<Option<Owner>>;

    async fn save(&self, owner: &mut Owner) -> RepositoryResult<()>;
}

/// Pets and the pet-type lookup table.
#[async_trait]
pub trait PetRepository: Send + Sync {
    async fn find_pet_types(&self) -> RepositoryResult<Vec<PetType>>;

    /// Pet with owner reference, type and visits loaded.
    async fn find_by_id(&self, id: PetId) -> RepositoryResult<Option<Pet>>;

    /// Insert or update a pet and cascade to its visits.
    ///
    /// The pet must reference a saved owner and a pet type.
    async fn save(&self, pet: &mut Pet) -> RepositoryResult<()>;
}

#[async_trait]
pub trait VisitRepository: Send + Sync {
    /// Insert or update a visit. The visit must reference a saved pet.
    async fn save(&self, visit: &mut Visit) -> RepositoryResult<()>;

    /// Visits of a pet, newest first.
    async fn find_by_pet_id(&self, pet_id: PetId) -> RepositoryResult<Vec<Visit>>;
}

#[async_trait]
pub trait VetRepository: Send + Sync {
    /// All vets, ordered by id, each with specialties ordered by name.
    async fn find_all(&self) -> RepositoryResult<Vec<Vet>>;
}

/// A backend implementing every repository.
pub trait ClinicStore: OwnerRepository + PetRepository + VisitRepository + VetRepository {}

impl<S> ClinicStore for S where S: OwnerRepository + PetRepository + VisitRepository + VetRepository {}

/// Check the references a pet needs before it can be stored.
pub(crate) fn check_pet_references(pet: &Pet) -> Result<(), DomainError> {
    if pet.owner.is_none() {
        return Err(DomainError::invariant(format!(
            "pet '{}' must belong to a saved owner before it is saved",
            pet.name
        )));
    }
    match &pet.pet_type {
        Some(t) if t.id.is_some() => Ok(()),
        _ => Err(DomainError::invariant(format!(
            "pet '{}' must have a known pet type",
            pet.name
        ))),
    }
}

/// Escape `%`, `_` and `\` so `text` matches literally inside a LIKE pattern.
pub(crate) fn like_prefix(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 1);
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Case-insensitive (ASCII) prefix match used by every backend.
pub(crate) fn last_name_matches(last_name: &str, prefix: &str) -> bool {
    last_name.len() >= prefix.len()
        && last_name.is_char_boundary(prefix.len())
        && last_name[..prefix.len()].eq_ignore_ascii_case(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_prefix_escapes_wildcards() {
        assert_eq!(like_prefix("Davis"), "Davis%");
        assert_eq!(like_prefix("a_b%c\\"), "a\\_b\\%c\\\\%");
        assert_eq!(like_prefix(""), "%");
    }

    #[test]
    fn prefix_match_ignores_case() {
        assert!(last_name_matches("Davis", "dav"));
        assert!(last_name_matches("Davis", ""));
        assert!(!last_name_matches("Davis", "Daviss"));
        assert!(!last_name_matches("Davis", "avis"));
    }
}
