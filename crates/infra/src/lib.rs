//! Infrastructure layer: configuration, seed data and the clinic stores.

pub mod config;
pub mod seed;
pub mod store;

pub use config::{ClinicConfig, ConfigError, DatabaseConfig, StoreProfile};
pub use seed::{SeedData, reference_dataset};
pub use store::{
    ClinicStore, InMemoryClinicStore, OwnerRepository, PetRepository, Repositories,
    RepositoryError, RepositoryResult, SqliteClinicStore, VetRepository, VisitRepository, open,
};
