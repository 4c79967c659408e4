use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use petclinic_core::{Constraint, Entity, FieldRule, PetId, Validate};

use crate::named::PetType;
use crate::owner::OwnerRef;
use crate::visit::Visit;

/// A pet, with its type, owning owner reference and visit history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: Option<PetId>,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub pet_type: Option<PetType>,
    pub owner: Option<OwnerRef>,
    /// Newest first when loaded from a store.
    pub visits: Vec<Visit>,
}

impl Pet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Attach a visit to this pet.
    ///
    /// The visit is appended; it carries this pet's id when the pet is saved.
    pub fn add_visit(&mut self, mut visit: Visit) {
        visit.pet_id = self.id;
        self.visits.push(visit);
    }

    /// Order visits newest first (ties by id).
    pub fn sort_visits(&mut self) {
        self.visits
            .sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
    }
}

impl Entity for Pet {
    type Id = PetId;
    const NAME: &'static str = "pet";

    fn id(&self) -> Option<PetId> {
        self.id
    }
}

fn name(p: &Pet) -> &str {
    &p.name
}

impl Validate for Pet {
    fn rules() -> &'static [FieldRule<Self>] {
        const RULES: &[FieldRule<Pet>] = &[FieldRule {
            path: "name",
            value: name,
            constraints: &[Constraint::NotEmpty],
        }];
        RULES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petclinic_core::{Validator, VisitId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn add_visit_links_visit_to_pet() {
        let mut pet = Pet::new("Samantha");
        pet.id = Some(PetId::new(7));

        pet.add_visit(Visit::on(date(2013, 1, 1), "rabies shot"));

        assert_eq!(pet.visits.len(), 1);
        assert_eq!(pet.visits[0].pet_id, Some(PetId::new(7)));
    }

    #[test]
    fn visits_sort_newest_first() {
        let mut pet = Pet::new("Max");
        let mut older = Visit::on(date(2013, 1, 2), "rabies shot");
        older.id = Some(VisitId::new(2));
        let mut newer = Visit::on(date(2013, 1, 3), "neutered");
        newer.id = Some(VisitId::new(3));
        pet.add_visit(older);
        pet.add_visit(newer);

        pet.sort_visits();

        let order: Vec<_> = pet.visits.iter().map(|v| v.description.as_str()).collect();
        assert_eq!(order, ["neutered", "rabies shot"]);
    }

    #[test]
    fn name_is_required() {
        let violations = Validator::new().validate(&Pet::new(""));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations.for_path("name").unwrap().message, "may not be empty");
    }

    #[test]
    fn serializes_type_field_name() {
        let mut pet = Pet::new("Leo");
        pet.pet_type = Some(PetType::new(petclinic_core::PetTypeId::new(1), "cat"));

        let json = serde_json::to_value(&pet).unwrap();

        assert_eq!(json["type"]["name"], "cat");
        assert!(json["birthDate"].is_null());
    }
}
