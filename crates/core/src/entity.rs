//! Entity trait: identity + continuity across state changes.

use crate::error::{DomainError, DomainResult};

/// Entity marker + minimal interface.
///
/// Entities are transient until the store assigns them an identifier.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + Into<i64>;

    /// Human-readable entity name used in error messages.
    const NAME: &'static str;

    /// Returns the identifier, or `None` while the entity has never been saved.
    fn id(&self) -> Option<Self::Id>;

    /// Whether the entity has not been persisted yet.
    fn is_new(&self) -> bool {
        self.id().is_none()
    }
}

/// Look up an entity by id in a collection.
///
/// Misses are an error, not an `Option`: callers use this on collections that
/// are expected to contain the id (e.g. the full list of pet types).
pub fn find_by_id<'a, E, I>(entities: I, id: E::Id) -> DomainResult<&'a E>
where
    E: Entity + 'a,
    I: IntoIterator<Item = &'a E>,
{
    entities
        .into_iter()
        .find(|e| e.id() == Some(id))
        .ok_or_else(|| DomainError::not_found(E::NAME, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::PetTypeId;

    struct Kind {
        id: Option<PetTypeId>,
    }

    impl Entity for Kind {
        type Id = PetTypeId;
        const NAME: &'static str = "kind";

        fn id(&self) -> Option<PetTypeId> {
            self.id
        }
    }

    #[test]
    fn finds_present_and_reports_missing() {
        let kinds = vec![
            Kind { id: Some(PetTypeId::new(1)) },
            Kind { id: None },
            Kind { id: Some(PetTypeId::new(4)) },
        ];

        let found = find_by_id(&kinds, PetTypeId::new(4)).unwrap();
        assert_eq!(found.id, Some(PetTypeId::new(4)));

        let err = find_by_id(&kinds, PetTypeId::new(9)).err().unwrap();
        assert_eq!(err, DomainError::not_found("kind", 9));
        assert!(kinds[1].is_new());
    }
}
