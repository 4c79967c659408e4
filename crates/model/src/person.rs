use serde::{Deserialize, Serialize};

use petclinic_core::{Constraint, FieldRule, Validate};

/// Name fields shared by owners and vets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
}

impl Person {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

pub(crate) const REQUIRED: &[Constraint] = &[Constraint::NotEmpty];

fn first_name(p: &Person) -> &str {
    &p.first_name
}

fn last_name(p: &Person) -> &str {
    &p.last_name
}

impl Validate for Person {
    fn rules() -> &'static [FieldRule<Self>] {
        const RULES: &[FieldRule<Person>] = &[
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
    use petclinic_core::Validator;

    #[test]
    fn should_not_validate_when_first_name_empty() {
        let person = Person::new("", "smith");

        let violations = Validator::new().validate(&person);

        assert_eq!(violations.len(), 1);
        let violation = violations.iter().next().unwrap();
        assert_eq!(violation.path, "firstName");
        assert_eq!(violation.message, "may not be empty");
    }

    #[test]
    fn both_names_blank_reports_each_once() {
        let violations = Validator::new().validate(&Person::new(" ", "\t"));
        assert_eq!(violations.len(), 2);
        assert!(violations.for_path("firstName").is_some());
        assert!(violations.for_path("lastName").is_some());
    }
}
