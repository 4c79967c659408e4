//! Clinic service facade.
//!
//! `ClinicService` is the single entry point for clinic operations. It owns
//! one handle per repository and turns absent lookups into `NotFound`:
//!
//! ```text
//! caller
//!   ↓
//! ClinicService   (NotFound on id misses, error lifting)
//!   ↓
//! Repositories    (in-memory or SQLite, atomic saves)
//! ```

use std::sync::Arc;

use tracing::{debug, info, instrument};

use petclinic_core::{DomainError, Entity, OwnerId, PetId};
use petclinic_infra::{ClinicConfig, InMemoryClinicStore, Repositories, reference_dataset};
use petclinic_model::{Owner, Pet, PetType, Vet, Visit};

use crate::error::ClinicResult;

#[derive(Debug, Clone)]
pub struct ClinicService {
    repos: Repositories,
}

impl ClinicService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// A service over a fresh in-memory store holding the reference dataset.
    pub fn in_memory() -> Self {
        let store = InMemoryClinicStore::with_seed(&reference_dataset());
        Self::new(Repositories::from_store(Arc::new(store)))
    }

    /// A service over the store selected by `config`.
    pub async fn open(config: &ClinicConfig) -> ClinicResult<Self> {
        Ok(Self::new(petclinic_infra::open(config).await?))
    }

    /// Owners whose last name starts with `last_name`, ignoring case.
    ///
    /// An empty string returns every owner; no match returns an empty list.
    #[instrument(skip(self), err)]
    pub async fn find_owner_by_last_name(&self, last_name: &str) -> ClinicResult<Vec<Owner>> {
        let owners = self.repos.owners.find_by_last_name(last_name).await?;
        debug!(count = owners.len(), "owners by last name");
        Ok(owners)
    }

    #[instrument(skip(self), fields(owner_id = %id), err)]
    pub async fn find_owner_by_id(&self, id: OwnerId) -> ClinicResult<Owner> {
        self.repos
            .owners
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(Owner::NAME, id).into())
    }

    /// Insert or update `owner` together with its pets and their visits.
    #[instrument(skip(self, owner), fields(owner_id = ?owner.id), err)]
    pub async fn save_owner(&self, owner: &mut Owner) -> ClinicResult<()> {
        let inserting = owner.is_new();
        self.repos.owners.save(owner).await?;
        info!(owner_id = ?owner.id, inserted = inserting, "owner saved");
        Ok(())
    }

    #[instrument(skip(self), fields(pet_id = %id), err)]
    pub async fn find_pet_by_id(&self, id: PetId) -> ClinicResult<Pet> {
        self.repos
            .pets
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(Pet::NAME, id).into())
    }

    #[instrument(skip(self), err)]
    pub async fn find_pet_types(&self) -> ClinicResult<Vec<PetType>> {
        Ok(self.repos.pets.find_pet_types().await?)
    }

    /// Insert or update `pet` and its visits.
    ///
    /// The pet must belong to a saved owner and carry a known pet type.
    #[instrument(skip(self, pet), fields(pet_id = ?pet.id), err)]
    pub async fn save_pet(&self, pet: &mut Pet) -> ClinicResult<()> {
        let inserting = pet.is_new();
        self.repos.pets.save(pet).await?;
        info!(pet_id = ?pet.id, inserted = inserting, "pet saved");
        Ok(())
    }

    /// All vets, each with specialties in name order.
    #[instrument(skip(self), err)]
    pub async fn find_vets(&self) -> ClinicResult<Vec<Vet>> {
        Ok(self.repos.vets.find_all().await?)
    }

    #[instrument(skip(self, visit), fields(pet_id = ?visit.pet_id), err)]
    pub async fn save_visit(&self, visit: &mut Visit) -> ClinicResult<()> {
        let inserting = visit.is_new();
        self.repos.visits.save(visit).await?;
        info!(visit_id = ?visit.id, inserted = inserting, "visit saved");
        Ok(())
    }

    /// Visits of a pet, newest first. An unknown pet has no visits.
    #[instrument(skip(self), fields(pet_id = %pet_id), err)]
    pub async fn find_visits_by_pet_id(&self, pet_id: PetId) -> ClinicResult<Vec<Visit>> {
        Ok(self.repos.visits.find_by_pet_id(pet_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClinicError;

    #[tokio::test]
    async fn missing_owner_is_not_found() {
        let clinic = ClinicService::in_memory();

        let err = clinic.find_owner_by_id(OwnerId::new(999)).await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "owner with id 999 not found");
    }

    #[tokio::test]
    async fn orphan_pet_is_an_invariant_violation() {
        let clinic = ClinicService::in_memory();
        let mut pet = Pet::new("stray");

        let err = clinic.save_pet(&mut pet).await.unwrap_err();

        assert!(matches!(err, ClinicError::Domain(DomainError::InvariantViolation(_))));
        assert!(pet.id.is_none());
    }

    #[tokio::test]
    async fn visit_without_pet_is_rejected() {
        let clinic = ClinicService::in_memory();
        let mut visit = Visit::new();
        visit.description = "checkup".into();

        let err = clinic.save_visit(&mut visit).await.unwrap_err();

        assert!(matches!(err, ClinicError::Domain(DomainError::InvariantViolation(_))));
    }
}
