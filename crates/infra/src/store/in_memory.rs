use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, instrument};

use petclinic_core::{DomainError, OwnerId, PetId, PetTypeId, SpecialtyId, VetId, VisitId};
use petclinic_model::{Owner, OwnerRef, Person, Pet, PetType, Specialty, Vet, Visit};

use super::r#trait::{
    OwnerRepository, PetRepository, RepositoryError, RepositoryResult, VetRepository,
    VisitRepository, check_pet_references, last_name_matches,
};
use crate::seed::SeedData;

#[derive(Debug, Clone)]
struct OwnerRow {
    person: Person,
    address: String,
    city: String,
    telephone: String,
}

#[derive(Debug, Clone)]
struct PetRow {
    name: String,
    birth_date: Option<NaiveDate>,
    type_id: i64,
    owner_id: i64,
}

#[derive(Debug, Clone)]
struct VisitRow {
    pet_id: i64,
    date: NaiveDate,
    description: String,
}

#[derive(Debug, Clone)]
struct VetRow {
    person: Person,
    specialty_ids: Vec<i64>,
}

/// Row tables, keyed by id. Ids are allocated as `max + 1`.
#[derive(Debug, Clone, Default)]
struct Tables {
    pet_types: BTreeMap<i64, String>,
    specialties: BTreeMap<i64, String>,
    vets: BTreeMap<i64, VetRow>,
    owners: BTreeMap<i64, OwnerRow>,
    pets: BTreeMap<i64, PetRow>,
    visits: BTreeMap<i64, VisitRow>,
}

fn next_id<V>(table: &BTreeMap<i64, V>) -> i64 {
    table.keys().next_back().map_or(1, |last| last + 1)
}

impl Tables {
    fn owner_ref(&self, owner_id: i64) -> Option<OwnerRef> {
        self.owners.get(&owner_id).map(|row| OwnerRef {
            id: OwnerId::new(owner_id),
            person: row.person.clone(),
        })
    }

    fn visits_of(&self, pet_id: i64) -> Vec<Visit> {
        self.visits
            .iter()
            .filter(|(_, v)| v.pet_id == pet_id)
            .map(|(&id, v)| Visit {
                id: Some(VisitId::new(id)),
                date: v.date,
                description: v.description.clone(),
                pet_id: Some(PetId::new(pet_id)),
            })
            .collect()
    }

    fn pet(&self, pet_id: i64) -> Option<Pet> {
        let row = self.pets.get(&pet_id)?;
        let mut pet = Pet {
            id: Some(PetId::new(pet_id)),
            name: row.name.clone(),
            birth_date: row.birth_date,
            pet_type: self
                .pet_types
                .get(&row.type_id)
                .map(|name| PetType::new(PetTypeId::new(row.type_id), name.clone())),
            owner: self.owner_ref(row.owner_id),
            visits: self.visits_of(pet_id),
        };
        pet.sort_visits();
        Some(pet)
    }

    fn owner(&self, owner_id: i64) -> Option<Owner> {
        let row = self.owners.get(&owner_id)?;
        let mut owner = Owner::new(
            row.person.clone(),
            row.address.clone(),
            row.city.clone(),
            row.telephone.clone(),
        );
        owner.id = Some(OwnerId::new(owner_id));
        owner.pets = self
            .pets
            .iter()
            .filter(|(_, p)| p.owner_id == owner_id)
            .filter_map(|(&id, _)| self.pet(id))
            .collect();
        owner.sort_pets();
        Some(owner)
    }

    fn vet(&self, vet_id: i64, row: &VetRow) -> Vet {
        let mut vet = Vet::new(row.person.clone());
        vet.id = Some(VetId::new(vet_id));
        for sid in &row.specialty_ids {
            if let Some(name) = self.specialties.get(sid) {
                vet.add_specialty(Specialty::new(SpecialtyId::new(*sid), name.clone()));
            }
        }
        vet
    }

    fn upsert_owner(&mut self, owner: &mut Owner) -> RepositoryResult<()> {
        let row = OwnerRow {
            person: owner.person.clone(),
            address: owner.address.clone(),
            city: owner.city.clone(),
            telephone: owner.telephone.clone(),
        };
        let id = match owner.id {
            Some(id) => {
                let slot = self
                    .owners
                    .get_mut(&id.get())
                    .ok_or_else(|| DomainError::not_found("owner", id))?;
                *slot = row;
                id
            }
            None => {
                let id = OwnerId::new(next_id(&self.owners));
                self.owners.insert(id.get(), row);
                owner.id = Some(id);
                id
            }
        };

        owner.relink_pets();
        for pet in &mut owner.pets {
            self.upsert_pet(pet)?;
        }
        debug!(owner_id = %id, pets = owner.pets.len(), "owner staged");
        Ok(())
    }

    fn upsert_pet(&mut self, pet: &mut Pet) -> RepositoryResult<()> {
        check_pet_references(pet)?;
        let (Some(owner), Some(type_id)) = (
            pet.owner.as_ref(),
            pet.pet_type.as_ref().and_then(|t| t.id),
        ) else {
            return Err(DomainError::invariant("pet references are incomplete").into());
        };
        if !self.owners.contains_key(&owner.id.get()) {
            return Err(DomainError::not_found("owner", owner.id).into());
        }
        if !self.pet_types.contains_key(&type_id.get()) {
            return Err(DomainError::not_found("pet type", type_id).into());
        }

        let row = PetRow {
            name: pet.name.clone(),
            birth_date: pet.birth_date,
            type_id: type_id.get(),
            owner_id: owner.id.get(),
        };
        let id = match pet.id {
            Some(id) => {
                let slot = self
                    .pets
                    .get_mut(&id.get())
                    .ok_or_else(|| DomainError::not_found("pet", id))?;
                *slot = row;
                id
            }
            None => {
                let id = PetId::new(next_id(&self.pets));
                self.pets.insert(id.get(), row);
                pet.id = Some(id);
                id
            }
        };

        for visit in &mut pet.visits {
            visit.pet_id = Some(id);
            self.upsert_visit(visit)?;
        }
        Ok(())
    }

    fn upsert_visit(&mut self, visit: &mut Visit) -> RepositoryResult<()> {
        let pet_id = visit
            .pet_id
            .ok_or_else(|| DomainError::invariant("visit must belong to a saved pet"))?;
        if !self.pets.contains_key(&pet_id.get()) {
            return Err(DomainError::not_found("pet", pet_id).into());
        }

        let row = VisitRow {
            pet_id: pet_id.get(),
            date: visit.date,
            description: visit.description.clone(),
        };
        match visit.id {
            Some(id) => {
                let slot = self
                    .visits
                    .get_mut(&id.get())
                    .ok_or_else(|| DomainError::not_found("visit", id))?;
                *slot = row;
            }
            None => {
                let id = next_id(&self.visits);
                self.visits.insert(id, row);
                visit.id = Some(VisitId::new(id));
            }
        }
        Ok(())
    }
}

/// In-memory clinic store.
///
/// Intended for tests/dev. Every save works on a copy of the tables and swaps
/// it in only when the whole unit succeeds.
#[derive(Debug, Default)]
pub struct InMemoryClinicStore {
    tables: RwLock<Tables>,
}

impl InMemoryClinicStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with `data`.
    pub fn with_seed(data: &SeedData) -> Self {
        let store = Self::new();
        if let Ok(mut tables) = store.tables.write() {
            tables.load(data);
        }
        store
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> RepositoryResult<T> {
        let tables = self.tables.read().map_err(|_| RepositoryError::Poisoned)?;
        Ok(f(&tables))
    }

    /// Apply `f` to a staged copy of the tables and of `target`.
    ///
    /// Both are committed together, or not at all.
    fn write<E: Clone>(
        &self,
        target: &mut E,
        f: impl FnOnce(&mut Tables, &mut E) -> RepositoryResult<()>,
    ) -> RepositoryResult<()> {
        let mut tables = self.tables.write().map_err(|_| RepositoryError::Poisoned)?;
        let mut staged_tables = tables.clone();
        let mut staged = target.clone();
        f(&mut staged_tables, &mut staged)?;
        *tables = staged_tables;
        *target = staged;
        Ok(())
    }
}

impl Tables {
    fn load(&mut self, data: &SeedData) {
        for t in &data.pet_types {
            if let Some(id) = t.id {
                self.pet_types.insert(id.get(), t.name.clone());
            }
        }
        for s in &data.specialties {
            if let Some(id) = s.id {
                self.specialties.insert(id.get(), s.name.clone());
            }
        }
        for vet in &data.vets {
            if let Some(id) = vet.id {
                let specialty_ids = vet
                    .specialties()
                    .iter()
                    .filter_map(|s| s.id.map(SpecialtyId::get))
                    .collect();
                self.vets.insert(
                    id.get(),
                    VetRow {
                        person: vet.person.clone(),
                        specialty_ids,
                    },
                );
            }
        }
        for owner in &data.owners {
            let Some(owner_id) = owner.id else { continue };
            self.owners.insert(
                owner_id.get(),
                OwnerRow {
                    person: owner.person.clone(),
                    address: owner.address.clone(),
                    city: owner.city.clone(),
                    telephone: owner.telephone.clone(),
                },
            );
            for pet in &owner.pets {
                let (Some(pet_id), Some(type_id)) = (pet.id, pet.pet_type.as_ref().and_then(|t| t.id))
                else {
                    continue;
                };
                self.pets.insert(
                    pet_id.get(),
                    PetRow {
                        name: pet.name.clone(),
                        birth_date: pet.birth_date,
                        type_id: type_id.get(),
                        owner_id: owner_id.get(),
                    },
                );
                for visit in &pet.visits {
                    if let Some(visit_id) = visit.id {
                        self.visits.insert(
                            visit_id.get(),
                            VisitRow {
                                pet_id: pet_id.get(),
                                date: visit.date,
                                description: visit.description.clone(),
                            },
                        );
                    }
                }
            }
        }
    }
}

#[async_trait]
impl OwnerRepository for InMemoryClinicStore {
    #[instrument(skip(self), err)]
    async fn find_by_last_name(&self, last_name: &str) -> RepositoryResult<Vec<Owner>> {
        self.read(|t| {
            t.owners
                .iter()
                .filter(|(_, row)| last_name_matches(&row.person.last_name, last_name))
                .filter_map(|(&id, _)| t.owner(id))
                .collect()
        })
    }

    #[instrument(skip(self), err)]
    async fn find_by_id(&self, id: OwnerId) -> RepositoryResult<Option<Owner>> {
        self.read(|t| t.owner(id.get()))
    }

    #[instrument(skip(self, owner), fields(owner_id = ?owner.id), err)]
    async fn save(&self, owner: &mut Owner) -> RepositoryResult<()> {
        self.write(owner, |t, o| t.upsert_owner(o))
    }
}

#[async_trait]
impl PetRepository for InMemoryClinicStore {
    async fn find_pet_types(&self) -> RepositoryResult<Vec<PetType>> {
        self.read(|t| {
            t.pet_types
                .iter()
                .map(|(&id, name)| PetType::new(PetTypeId::new(id), name.clone()))
                .collect()
        })
    }

    #[instrument(skip(self), err)]
    async fn find_by_id(&self, id: PetId) -> RepositoryResult<Option<Pet>> {
        self.read(|t| t.pet(id.get()))
    }

    #[instrument(skip(self, pet), fields(pet_id = ?pet.id), err)]
    async fn save(&self, pet: &mut Pet) -> RepositoryResult<()> {
        self.write(pet, |t, p| t.upsert_pet(p))
    }
}

#[async_trait]
impl VisitRepository for InMemoryClinicStore {
    #[instrument(skip(self, visit), fields(pet_id = ?visit.pet_id), err)]
    async fn save(&self, visit: &mut Visit) -> RepositoryResult<()> {
        self.write(visit, |t, v| t.upsert_visit(v))
    }

    async fn find_by_pet_id(&self, pet_id: PetId) -> RepositoryResult<Vec<Visit>> {
        self.read(|t| {
            let mut pet = Pet {
                visits: t.visits_of(pet_id.get()),
                ..Pet::default()
            };
            pet.sort_visits();
            pet.visits
        })
    }
}

#[async_trait]
impl VetRepository for InMemoryClinicStore {
    async fn find_all(&self) -> RepositoryResult<Vec<Vet>> {
        self.read(|t| t.vets.iter().map(|(&id, row)| t.vet(id, row)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::reference_dataset;

    fn seeded() -> InMemoryClinicStore {
        InMemoryClinicStore::with_seed(&reference_dataset())
    }

    #[tokio::test]
    async fn finds_owners_by_prefix_in_id_order() {
        let store = seeded();

        let owners = store.find_by_last_name("davis").await.unwrap();

        let ids: Vec<_> = owners.iter().map(|o| o.id.unwrap().get()).collect();
        assert_eq!(ids, [2, 4]);
    }

    #[tokio::test]
    async fn new_owner_gets_next_id() {
        let store = seeded();
        let mut owner = Owner::new(Person::new("Sam", "Schultz"), "4, Evans Street", "Wollongong", "4444444444");

        OwnerRepository::save(&store, &mut owner).await.unwrap();

        assert_eq!(owner.id, Some(OwnerId::new(11)));
    }

    #[tokio::test]
    async fn failed_cascade_leaves_store_and_owner_untouched() {
        let store = seeded();
        let mut owner = Owner::new(Person::new("Sam", "Schultz"), "4, Evans Street", "Wollongong", "4444444444");
        owner.add_pet(Pet::new("typeless"));

        let err = OwnerRepository::save(&store, &mut owner).await.unwrap_err();

        assert!(matches!(err, RepositoryError::Domain(DomainError::InvariantViolation(_))));
        assert!(owner.id.is_none());
        assert!(store.find_by_last_name("Schultz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn updating_unknown_owner_is_not_found() {
        let store = seeded();
        let mut owner = Owner::new(Person::new("No", "Body"), "x", "y", "1");
        owner.id = Some(OwnerId::new(99));

        let err = OwnerRepository::save(&store, &mut owner).await.unwrap_err();

        assert!(matches!(err, RepositoryError::Domain(e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn visits_by_pet_are_newest_first() {
        let store = seeded();

        let visits = store.find_by_pet_id(PetId::new(8)).await.unwrap();

        let descriptions: Vec<_> = visits.iter().map(|v| v.description.as_str()).collect();
        assert_eq!(descriptions, ["neutered", "rabies shot"]);
    }
}
