//! `petclinic-service`: the clinic facade and its scenario suite.

pub mod error;
pub mod service;
pub mod suite;

pub use error::{ClinicError, ClinicResult};
pub use service::ClinicService;
pub use suite::{SCENARIOS, Scenario, ScenarioFailure, SuiteReport, run_all};
