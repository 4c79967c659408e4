//! Clinic persistence boundary.
//!
//! The repository traits in [`r#trait`] are what the service layer sees. Two
//! backends implement all of them: an in-memory store for tests and a SQLite
//! store. [`open`] picks one from a [`ClinicConfig`].

pub mod in_memory;
pub mod sqlite;
pub mod r#trait;

use std::sync::Arc;

use tracing::info;

pub use in_memory::InMemoryClinicStore;
pub use r#trait::{
    ClinicStore, OwnerRepository, PetRepository, RepositoryError, RepositoryResult,
    VetRepository, VisitRepository,
};
pub use sqlite::SqliteClinicStore;

use crate::config::{ClinicConfig, StoreProfile};
use crate::seed::reference_dataset;

/// One handle per repository, all backed by the same store.
#[derive(Clone)]
pub struct Repositories {
    pub owners: Arc<dyn OwnerRepository>,
    pub pets: Arc<dyn PetRepository>,
    pub visits: Arc<dyn VisitRepository>,
    pub vets: Arc<dyn VetRepository>,
}

impl Repositories {
    pub fn from_store<S: ClinicStore + 'static>(store: Arc<S>) -> Self {
        Self {
            owners: store.clone(),
            pets: store.clone(),
            visits: store.clone(),
            vets: store,
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}

/// Open the store selected by `config`, seeding it when asked to.
pub async fn open(config: &ClinicConfig) -> RepositoryResult<Repositories> {
    let repos = match config.profile {
        StoreProfile::Memory => {
            let store = if config.seed {
                InMemoryClinicStore::with_seed(&reference_dataset())
            } else {
                InMemoryClinicStore::new()
            };
            Repositories::from_store(Arc::new(store))
        }
        StoreProfile::Sqlite => {
            let store = SqliteClinicStore::connect(&config.database).await?;
            if config.seed {
                store.seed(&reference_dataset()).await?;
            }
            Repositories::from_store(Arc::new(store))
        }
    };

    info!(profile = %config.profile, seeded = config.seed, "clinic store ready");
    Ok(repos)
}
