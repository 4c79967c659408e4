//! Reference dataset loaded into fresh stores.
//!
//! Every record carries its id so both backends end up with identical rows.

use chrono::NaiveDate;

use petclinic_core::{OwnerId, PetId, PetTypeId, SpecialtyId, VetId, VisitId};
use petclinic_model::{Owner, Person, Pet, PetType, Specialty, Vet, Visit};

/// Records to preload, already linked and identified.
#[derive(Debug, Clone)]
pub struct SeedData {
    pub pet_types: Vec<PetType>,
    pub specialties: Vec<Specialty>,
    pub vets: Vec<Vet>,
    /// Owners with their pets, and the pets with their visits.
    pub owners: Vec<Owner>,
}

impl SeedData {
    pub fn pets(&self) -> impl Iterator<Item = &Pet> {
        self.owners.iter().flat_map(|o| o.pets.iter())
    }

    pub fn visits(&self) -> impl Iterator<Item = &Visit> {
        self.pets().flat_map(|p| p.visits.iter())
    }
}

const PET_TYPES: &[(i64, &str)] = &[
    (1, "cat"),
    (2, "dog"),
    (3, "lizard"),
    (4, "snake"),
    (5, "bird"),
    (6, "hamster"),
];

const SPECIALTIES: &[(i64, &str)] = &[(1, "radiology"), (2, "surgery"), (3, "dentistry")];

const VETS: &[(i64, &str, &str, &[i64])] = &[
    (1, "James", "Carter", &[]),
    (2, "Helen", "Leary", &[1]),
    (3, "Linda", "Douglas", &[2, 3]),
    (4, "Rafael", "Ortega", &[2]),
    (5, "Henry", "Stevens", &[1]),
    (6, "Sharon", "Jenkins", &[]),
];

const OWNERS: &[(i64, &str, &str, &str, &str, &str)] = &[
    (1, "George", "Franklin", "110 W. Liberty St.", "Madison", "6085551023"),
    (2, "Betty", "Davis", "638 Cardinal Ave.", "Sun Prairie", "6085551749"),
    (3, "Eduardo", "Rodriquez", "2693 Commerce St.", "McFarland", "6085558763"),
    (4, "Harold", "Davis", "563 Friendly St.", "Windsor", "6085553198"),
    (5, "Peter", "McTavish", "2387 S. Fair Way", "Madison", "6085552765"),
    (6, "Jean", "Coleman", "105 N. Lake St.", "Monona", "6085552654"),
    (7, "Jeff", "Black", "1450 Oak Blvd.", "Monona", "6085555387"),
    (8, "Maria", "Escobito", "345 Maple St.", "Madison", "6085557683"),
    (9, "David", "Schroeder", "2749 Blackhawk Trail", "Madison", "6085559435"),
    (10, "Carlos", "Estaban", "2335 Independence La.", "Waunakee", "6085555487"),
];

/// `(id, name, birth date, type id, owner id)`
const PETS: &[(i64, &str, (i32, u32, u32), i64, i64)] = &[
    (1, "Leo", (2010, 9, 7), 1, 1),
    (2, "Basil", (2012, 8, 6), 6, 2),
    (3, "Rosy", (2011, 4, 17), 2, 3),
    (4, "Jewel", (2010, 3, 7), 2, 3),
    (5, "Iggy", (2010, 11, 30), 3, 4),
    (6, "George", (2010, 1, 20), 4, 5),
    (7, "Samantha", (2012, 9, 4), 1, 6),
    (8, "Max", (2012, 9, 4), 1, 6),
    (9, "Lucky", (2011, 8, 6), 5, 7),
    (10, "Mulligan", (2007, 2, 24), 2, 8),
    (11, "Freddy", (2010, 3, 9), 5, 9),
    (12, "Lucky", (2010, 6, 24), 2, 10),
    (13, "Sly", (2012, 6, 8), 1, 10),
];

/// `(id, pet id, date, description)`
const VISITS: &[(i64, i64, (i32, u32, u32), &str)] = &[
    (1, 7, (2013, 1, 1), "rabies shot"),
    (2, 8, (2013, 1, 2), "rabies shot"),
    (3, 8, (2013, 1, 3), "neutered"),
    (4, 7, (2013, 1, 4), "spayed"),
];

fn date((y, m, d): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// The clinic's reference data: 10 owners, 13 pets, 4 visits, 6 vets.
pub fn reference_dataset() -> SeedData {
    let pet_types: Vec<PetType> = PET_TYPES
        .iter()
        .map(|&(id, name)| PetType::new(PetTypeId::new(id), name))
        .collect();

    let specialties: Vec<Specialty> = SPECIALTIES
        .iter()
        .map(|&(id, name)| Specialty::new(SpecialtyId::new(id), name))
        .collect();

    let vets = VETS
        .iter()
        .map(|&(id, first, last, specialty_ids)| {
            let mut vet = Vet::new(Person::new(first, last));
            vet.id = Some(VetId::new(id));
            for sid in specialty_ids {
                if let Some(s) = specialties.iter().find(|s| s.id == Some(SpecialtyId::new(*sid))) {
                    vet.add_specialty(s.clone());
                }
            }
            vet
        })
        .collect();

    let owners = OWNERS
        .iter()
        .map(|&(id, first, last, address, city, telephone)| {
            let mut owner = Owner::new(Person::new(first, last), address, city, telephone);
            owner.id = Some(OwnerId::new(id));

            for &(pet_id, name, born, type_id, _) in PETS.iter().filter(|p| p.4 == id) {
                let mut pet = Pet::new(name);
                pet.id = Some(PetId::new(pet_id));
                pet.birth_date = Some(date(born));
                pet.pet_type = pet_types
                    .iter()
                    .find(|t| t.id == Some(PetTypeId::new(type_id)))
                    .cloned();

                for &(visit_id, _, on, description) in VISITS.iter().filter(|v| v.1 == pet_id) {
                    let mut visit = Visit::on(date(on), description);
                    visit.id = Some(VisitId::new(visit_id));
                    pet.add_visit(visit);
                }
                pet.sort_visits();
                owner.add_pet(pet);
            }
            owner.sort_pets();
            owner
        })
        .collect();

    SeedData {
        pet_types,
        specialties,
        vets,
        owners,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_dataset_is_linked() {
        let data = reference_dataset();

        assert_eq!(data.owners.len(), 10);
        assert_eq!(data.pets().count(), 13);
        assert_eq!(data.visits().count(), 4);
        assert_eq!(data.vets.len(), 6);

        for owner in &data.owners {
            for pet in &owner.pets {
                assert_eq!(pet.owner.as_ref().map(|o| o.id), owner.id);
                assert!(pet.pet_type.is_some());
                assert!(pet.visits.iter().all(|v| v.pet_id == pet.id));
            }
        }
    }

    #[test]
    fn douglas_has_two_specialties_in_name_order() {
        let data = reference_dataset();
        let douglas = &data.vets[2];
        let names: Vec<_> = douglas.specialties().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["dentistry", "surgery"]);
    }
}
