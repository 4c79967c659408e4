//! Every clinic scenario, run against both stores.
//!
//! Each test opens its own seeded store, so writes never leak between tests.

use petclinic_infra::{ClinicConfig, DatabaseConfig, StoreProfile};
use petclinic_service::{ClinicService, suite};

async fn in_memory() -> ClinicService {
    ClinicService::in_memory()
}

async fn sqlite() -> ClinicService {
    let config = ClinicConfig {
        profile: StoreProfile::Sqlite,
        database: DatabaseConfig::in_memory(),
        seed: true,
    };
    ClinicService::open(&config).await.unwrap()
}

macro_rules! clinic_scenarios {
    ($backend:ident: $($scenario:ident),* $(,)?) => {
        mod $backend {
            $(
                #[tokio::test]
                async fn $scenario() {
                    let clinic = super::$backend().await;
                    if let Err(e) = petclinic_service::suite::$scenario(&clinic).await {
                        panic!("{e:#}");
                    }
                }
            )*
        }
    };
}

macro_rules! on_every_backend {
    ($($scenario:ident),* $(,)?) => {
        clinic_scenarios!(in_memory: $($scenario),*);
        clinic_scenarios!(sqlite: $($scenario),*);
    };
}

petclinic_service::for_each_scenario!(on_every_backend);

macro_rules! scenario_names {
    ($($scenario:ident),* $(,)?) => {
        &[$(stringify!($scenario)),*]
    };
}

#[test]
fn every_scenario_runs_on_both_backends() {
    let tested: &[&str] = petclinic_service::for_each_scenario!(scenario_names);
    let registered: Vec<&str> = suite::SCENARIOS.iter().map(|s| s.name).collect();

    assert_eq!(tested, registered.as_slice());
}

#[tokio::test]
async fn sqlite_suite_reports_success() {
    let config = ClinicConfig {
        profile: StoreProfile::Sqlite,
        ..ClinicConfig::default()
    };

    let report = petclinic_service::run_all(&config).await;

    assert!(report.successful(), "{:#?}", report.failures);
}

#[tokio::test]
async fn stores_are_isolated_per_test() {
    let a = sqlite().await;
    let b = sqlite().await;
    let mut owner = a.find_owner_by_id(petclinic_core::OwnerId::new(1)).await.unwrap();
    owner.person.last_name = "Changed".into();

    a.save_owner(&mut owner).await.unwrap();

    let untouched = b.find_owner_by_id(petclinic_core::OwnerId::new(1)).await.unwrap();
    assert_eq!(untouched.last_name(), "Franklin");
}
