//! Clinic domain records: owners, pets, visits, vets and their lookup tables.
//!
//! Records are plain data. Relationships are held as fully-populated
//! collections assembled by the store; nothing is fetched on access.

pub mod named;
pub mod owner;
pub mod person;
pub mod pet;
pub mod vet;
pub mod visit;

pub use named::{PetType, Specialty};
pub use owner::{Owner, OwnerRef};
pub use person::Person;
pub use pet::Pet;
pub use vet::Vet;
pub use visit::Visit;
