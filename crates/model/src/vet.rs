use serde::{Deserialize, Deserializer, Serialize};

use petclinic_core::{Entity, FieldRule, Validate, VetId};

use crate::named::Specialty;
use crate::person::{Person, REQUIRED};

/// A veterinarian and the specialties they practice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vet {
    pub id: Option<VetId>,
    #[serde(flatten)]
    pub person: Person,
    /// Always ordered by name.
    #[serde(deserialize_with = "ordered_specialties")]
    specialties: Vec<Specialty>,
}

impl Vet {
    pub fn new(person: Person) -> Self {
        Self {
            id: None,
            person,
            specialties: Vec::new(),
        }
    }

    pub fn first_name(&self) -> &str {
        &self.person.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.person.last_name
    }

    pub fn specialties(&self) -> &[Specialty] {
        &self.specialties
    }

    pub fn nr_of_specialties(&self) -> usize {
        self.specialties.len()
    }

    /// Add a specialty, keeping the list ordered by name.
    ///
    /// A specialty whose id is already present is ignored.
    pub fn add_specialty(&mut self, specialty: Specialty) {
        if specialty.id.is_some() && self.specialties.iter().any(|s| s.id == specialty.id) {
            return;
        }
        let at = self
            .specialties
            .partition_point(|s| s.name.as_str() <= specialty.name.as_str());
        self.specialties.insert(at, specialty);
    }
}

impl Entity for Vet {
    type Id = VetId;
    const NAME: &'static str = "vet";

    fn id(&self) -> Option<VetId> {
        self.id
    }
}

fn ordered_specialties<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<Specialty>, D::Error> {
    let mut vet = Vet::default();
    for specialty in Vec::<Specialty>::deserialize(de)? {
        vet.add_specialty(specialty);
    }
    Ok(vet.specialties)
}

fn first_name(v: &Vet) -> &str {
    &v.person.first_name
}

fn last_name(v: &Vet) -> &str {
    &v.person.last_name
}

impl Validate for Vet {
    fn rules() -> &'static [FieldRule<Self>] {
        const RULES: &[FieldRule<Vet>] = &[
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
        ];
        RULES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petclinic_core::SpecialtyId;

    #[test]
    fn specialties_stay_alphabetical_and_unique() {
        let mut vet = Vet::new(Person::new("Linda", "Douglas"));
        vet.add_specialty(Specialty::new(SpecialtyId::new(2), "surgery"));
        vet.add_specialty(Specialty::new(SpecialtyId::new(3), "dentistry"));
        vet.add_specialty(Specialty::new(SpecialtyId::new(2), "surgery"));

        assert_eq!(vet.nr_of_specialties(), 2);
        assert_eq!(vet.specialties()[0].name, "dentistry");
        assert_eq!(vet.specialties()[1].name, "surgery");
    }

    #[test]
    fn blank_names_are_reported_once_each() {
        let vet = Vet::new(Person::new("", "  "));

        let violations = petclinic_core::Validator::new().validate(&vet);

        assert_eq!(violations.len(), 2);
        assert_eq!(violations.for_path("firstName").unwrap().message, "may not be empty");
        assert!(violations.for_path("lastName").is_some());
    }

    #[test]
    fn deserialized_specialties_are_ordered_and_unique() {
        let json = r#"{
            "id": 3,
            "firstName": "Linda",
            "lastName": "Douglas",
            "specialties": [
                {"id": 2, "name": "surgery"},
                {"id": 3, "name": "dentistry"},
                {"id": 2, "name": "surgery"}
            ]
        }"#;

        let vet: Vet = serde_json::from_str(json).unwrap();

        let names: Vec<_> = vet.specialties().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["dentistry", "surgery"]);
    }
}
