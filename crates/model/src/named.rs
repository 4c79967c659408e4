//! Lookup-table records identified by id and carrying only a name.

use serde::{Deserialize, Serialize};

use petclinic_core::{Entity, PetTypeId, SpecialtyId};

/// Kind of animal (cat, dog, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetType {
    pub id: Option<PetTypeId>,
    pub name: String,
}

/// Veterinary specialty (radiology, surgery, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specialty {
    pub id: Option<SpecialtyId>,
    pub name: String,
}

macro_rules! impl_named {
    ($t:ty, $id:ty, $name:literal) => {
        impl $t {
            /// A record already known to the store.
            pub fn new(id: $id, name: impl Into<String>) -> Self {
                Self {
                    id: Some(id),
                    name: name.into(),
                }
            }
        }

        impl Entity for $t {
            type Id = $id;
            const NAME: &'static str = $name;

            fn id(&self) -> Option<$id> {
                self.id
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.name)
            }
        }
    };
}

impl_named!(PetType, PetTypeId, "pet type");
impl_named!(Specialty, SpecialtyId, "specialty");

#[cfg(test)]
mod tests {
    use super::*;
    use petclinic_core::find_by_id;

    #[test]
    fn pet_types_are_found_by_id() {
        let types = vec![
            PetType::new(PetTypeId::new(1), "cat"),
            PetType::new(PetTypeId::new(4), "snake"),
        ];

        assert_eq!(find_by_id(&types, PetTypeId::new(4)).unwrap().name, "snake");
        assert!(find_by_id(&types, PetTypeId::new(2)).unwrap_err().is_not_found());
    }
}
