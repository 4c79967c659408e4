use serde::{Deserialize, Serialize};

use petclinic_core::{Constraint, Entity, FieldRule, OwnerId, Validate};

use crate::person::{Person, REQUIRED};
use crate::pet::Pet;

/// A pet owner and the pets they own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub id: Option<OwnerId>,
    #[serde(flatten)]
    pub person: Person,
    pub address: String,
    pub city: String,
    pub telephone: String,
    /// Ordered by name when loaded from a store.
    pub pets: Vec<Pet>,
}

/// Back-reference from a pet to its owner.
///
/// Carries the owner's identity and name only; the owner's pets are not
/// repeated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRef {
    pub id: OwnerId,
    #[serde(flatten)]
    pub person: Person,
}

impl OwnerRef {
    pub fn first_name(&self) -> &str {
        &self.person.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.person.last_name
    }
}

impl Owner {
    pub fn new(
        person: Person,
        address: impl Into<String>,
        city: impl Into<String>,
        telephone: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            person,
            address: address.into(),
            city: city.into(),
            telephone: telephone.into(),
            pets: Vec::new(),
        }
    }

    pub fn first_name(&self) -> &str {
        &self.person.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.person.last_name
    }

    /// Reference to this owner, available once it has been saved.
    pub fn owner_ref(&self) -> Option<OwnerRef> {
        self.id.map(|id| OwnerRef {
            id,
            person: self.person.clone(),
        })
    }

    /// Take ownership of a pet.
    pub fn add_pet(&mut self, mut pet: Pet) {
        pet.owner = self.owner_ref();
        self.pets.push(pet);
    }

    /// Find a pet by name, ignoring case.
    ///
    /// With `ignore_new`, pets that have not been saved yet are skipped.
    pub fn pet_named(&self, name: &str, ignore_new: bool) -> Option<&Pet> {
        self.pets
            .iter()
            .filter(|p| !(ignore_new && p.is_new()))
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Order pets by name, ignoring case.
    pub fn sort_pets(&mut self) {
        self.pets.sort_by_key(|p| (p.name.to_lowercase(), p.id));
    }

    /// Point every pet's owner reference (and its visits) at this owner.
    ///
    /// Stores call this after assigning the owner id.
    pub fn relink_pets(&mut self) {
        let owner = self.owner_ref();
        for pet in &mut self.pets {
            pet.owner = owner.clone();
            if let Some(pet_id) = pet.id {
                for visit in &mut pet.visits {
                    visit.pet_id = Some(pet_id);
                }
            }
        }
    }
}

impl Entity for Owner {
    type Id = OwnerId;
    const NAME: &'static str = "owner";

    fn id(&self) -> Option<OwnerId> {
        self.id
    }
}

const TELEPHONE: &[Constraint] = &[
    Constraint::NotEmpty,
    Constraint::Digits {
        integer: 10,
        fraction: 0,
    },
];

fn first_name(o: &Owner) -> &str {
    &o.person.first_name
}

fn last_name(o: &Owner) -> &str {
    &o.person.last_name
}

fn address(o: &Owner) -> &str {
    &o.address
}

fn city(o: &Owner) -> &str {
    &o.city
}

fn telephone(o: &Owner) -> &str {
    &o.telephone
}

impl Validate for Owner {
    fn rules() -> &'static [FieldRule<Self>] {
        const RULES: &[FieldRule<Owner>] = &[
            FieldRule {
                path: "firstName",
                value: first_name,
                constraints: REQUIRED,
            },
            FieldRule {
                path: "lastName",
                value: last_name,
                constraints: REQUIRED,
            },
            FieldRule {
                path: "address",
                value: address,
                constraints: REQUIRED,
            },
            FieldRule {
                path: "city",
                value: city,
                constraints: REQUIRED,
            },
            FieldRule {
                path: "telephone",
                value: telephone,
                constraints: TELEPHONE,
            },
        ];
        RULES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petclinic_core::{PetId, Validator};

    fn sam_schultz(telephone: &str) -> Owner {
        Owner::new(
            Person::new("Sam", "Schultz"),
            "4, Evans Street",
            "Wollongong",
            telephone,
        )
    }

    #[test]
    fn should_not_validate_owner_when_phone_number_not_valid() {
        let violations = Validator::new().validate(&sam_schultz("444zeezt4444"));

        assert_eq!(violations.len(), 1);
        assert!(violations.for_path("telephone").is_some());
    }

    #[test]
    fn valid_owner_passes() {
        assert!(Validator::new().validate(&sam_schultz("4444444444")).is_empty());
    }

    #[test]
    fn too_many_digits_is_rejected() {
        let violations = Validator::new().validate(&sam_schultz("44444444444"));
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn add_pet_on_unsaved_owner_leaves_reference_empty() {
        let mut owner = sam_schultz("4444444444");
        owner.add_pet(Pet::new("bowser"));

        assert_eq!(owner.pets.len(), 1);
        assert!(owner.pets[0].owner.is_none());

        owner.id = Some(OwnerId::new(11));
        owner.relink_pets();
        assert_eq!(owner.pets[0].owner.as_ref().unwrap().id, OwnerId::new(11));
        assert_eq!(owner.pets[0].owner.as_ref().unwrap().first_name(), "Sam");
    }

    #[test]
    fn pet_named_ignores_case_and_optionally_new_pets() {
        let mut owner = sam_schultz("4444444444");
        owner.id = Some(OwnerId::new(3));
        let mut saved = Pet::new("Rosy");
        saved.id = Some(PetId::new(3));
        owner.add_pet(saved);
        owner.add_pet(Pet::new("Jewel"));

        assert!(owner.pet_named("rosy", true).is_some());
        assert!(owner.pet_named("jewel", false).is_some());
        assert!(owner.pet_named("jewel", true).is_none());
    }

    #[test]
    fn pets_sort_by_name() {
        let mut owner = sam_schultz("4444444444");
        owner.add_pet(Pet::new("Samantha"));
        owner.add_pet(Pet::new("max"));

        owner.sort_pets();

        assert_eq!(owner.pets[0].name, "max");
    }

    #[test]
    fn serializes_flat_person_fields() {
        let json = serde_json::to_value(sam_schultz("4444444444")).unwrap();
        assert_eq!(json["firstName"], "Sam");
        assert_eq!(json["telephone"], "4444444444");
    }
}
