use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use petclinic_core::{Constraint, Entity, FieldRule, PetId, Validate, VisitId};

/// A visit of a pet to the clinic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: Option<VisitId>,
    pub date: NaiveDate,
    pub description: String,
    /// Set when the visit is attached to a saved pet.
    pub pet_id: Option<PetId>,
}

impl Visit {
    /// A new, unsaved visit dated today.
    pub fn new() -> Self {
        Self::on(Utc::now().date_naive(), "")
    }

    pub fn on(date: NaiveDate, description: impl Into<String>) -> Self {
        Self {
            id: None,
            date,
            description: description.into(),
            pet_id: None,
        }
    }
}

impl Default for Visit {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for Visit {
    type Id = VisitId;
    const NAME: &'static str = "visit";

    fn id(&self) -> Option<VisitId> {
        self.id
    }
}

fn description(v: &Visit) -> &str {
    &v.description
}

impl Validate for Visit {
    fn rules() -> &'static [FieldRule<Self>] {
        const RULES: &[FieldRule<Visit>] = &[FieldRule {
            path: "description",
            value: description,
            constraints: &[Constraint::NotEmpty],
        }];
        RULES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petclinic_core::Validator;

    #[test]
    fn new_visit_is_dated_today_and_unsaved() {
        let visit = Visit::new();
        assert_eq!(visit.date, Utc::now().date_naive());
        assert!(visit.is_new());
        assert!(visit.pet_id.is_none());
    }

    #[test]
    fn description_is_required() {
        let violations = Validator::new().validate(&Visit::new());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations.for_path("description").unwrap().message, "may not be empty");
    }
}
