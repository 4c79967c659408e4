//! Named clinic scenarios.
//!
//! Each scenario runs against its own freshly seeded service and checks one
//! behavior end to end. The same list drives the `petclinic-suite` binary and
//! the integration tests, so both backends are held to identical expectations.

use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, ensure};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use petclinic_core::{
    DomainError, Locale, OwnerId, PetId, PetTypeId, Validator, VetId, find_by_id,
};
use petclinic_infra::ClinicConfig;
use petclinic_model::{Owner, OwnerRef, Person, Pet, Vet, Visit};

use crate::error::ClinicError;
use crate::service::ClinicService;

type ScenarioFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// A named check run against a seeded clinic.
#[derive(Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub run: for<'a> fn(&'a ClinicService) -> ScenarioFuture<'a>,
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario").field("name", &self.name).finish()
    }
}

macro_rules! scenarios {
    ($($name:ident),* $(,)?) => {
        /// Every scenario, in run order.
        pub const SCENARIOS: &[Scenario] = &[
            $(Scenario { name: stringify!($name), run: |clinic| Box::pin($name(clinic)) },)*
        ];
    };
}

/// Invoke `$callback!` with the name of every scenario, in run order.
///
/// The suite and the integration tests both expand from this one list.
#[macro_export]
macro_rules! for_each_scenario {
    ($callback:ident) => {
        $callback! {
            should_not_validate_when_first_name_empty,
            should_report_each_blank_owner_field_once,
            should_reject_non_numeric_telephone,
            should_reject_telephone_longer_than_ten_digits,
            should_report_violations_in_german,
            should_find_owners_by_last_name,
            should_find_single_owner_with_pet,
            should_insert_owner,
            should_update_owner,
            should_find_pet_with_correct_id,
            should_find_all_pet_types,
            should_insert_pet_into_database_and_generate_id,
            should_update_pet_name,
            should_find_vets,
            should_add_new_visit_for_pet,
            should_find_visits_by_pet_id,
            should_not_save_pet_without_type,
            should_report_missing_ids_as_not_found,
            should_report_dangling_references_as_not_found,
            should_validate_vet_names,
        }
    };
}

for_each_scenario!(scenarios);

// Validation

pub async fn should_not_validate_when_first_name_empty(_: &ClinicService) -> anyhow::Result<()> {
    let person = Person::new("", "smith");

    let violations = Validator::new().validate(&person);

    ensure!(violations.len() == 1, "expected 1 violation, got {violations}");
    let violation = violations
        .for_path("firstName")
        .context("no violation for firstName")?;
    ensure!(
        violation.message == "may not be empty",
        "unexpected message '{}'",
        violation.message
    );
    Ok(())
}

pub async fn should_report_each_blank_owner_field_once(_: &ClinicService) -> anyhow::Result<()> {
    let validator = Validator::new();
    let fields: [(&str, fn(&mut Owner)); 5] = [
        ("firstName", |o| o.person.first_name = "  ".into()),
        ("lastName", |o| o.person.last_name.clear()),
        ("address", |o| o.address.clear()),
        ("city", |o| o.city = "\t".into()),
        ("telephone", |o| o.telephone.clear()),
    ];

    for (path, blank) in fields {
        let mut owner = valid_owner();
        blank(&mut owner);

        let violations = validator.validate(&owner);

        ensure!(violations.len() == 1, "{path}: expected 1 violation, got {violations}");
        let violation = violations.for_path(path).context(format!("no violation for {path}"))?;
        ensure!(violation.message == "may not be empty", "{path}: '{}'", violation.message);
    }
    Ok(())
}

pub async fn should_reject_non_numeric_telephone(_: &ClinicService) -> anyhow::Result<()> {
    let mut owner = valid_owner();
    owner.telephone = "444zeezt4444".into();

    let violations = Validator::new().validate(&owner);

    ensure!(violations.len() == 1, "expected 1 violation, got {violations}");
    ensure!(violations.for_path("telephone").is_some(), "telephone not reported");
    Ok(())
}

pub async fn should_reject_telephone_longer_than_ten_digits(
    _: &ClinicService,
) -> anyhow::Result<()> {
    let mut owner = valid_owner();
    owner.telephone = "60855510234".into();

    let violations = Validator::new().validate(&owner);

    let violation = violations.for_path("telephone").context("telephone not reported")?;
    ensure!(
        violation.message == "numeric value out of bounds (<10 digits>.<0 digits> expected)",
        "unexpected message '{}'",
        violation.message
    );
    Ok(())
}

pub async fn should_report_violations_in_german(_: &ClinicService) -> anyhow::Result<()> {
    let person = Person::new("", "smith");

    let violations = Validator::with_locale(Locale::German).validate(&person);

    let violation = violations.for_path("firstName").context("no violation for firstName")?;
    ensure!(
        violation.message == "darf nicht leer sein",
        "unexpected message '{}'",
        violation.message
    );
    Ok(())
}

// Owners

pub async fn should_find_owners_by_last_name(clinic: &ClinicService) -> anyhow::Result<()> {
    for (prefix, expected) in [("", 10), ("Davis", 2), ("davis", 2), ("Daviss", 0), ("Omar Trigui", 0)] {
        let owners = clinic.find_owner_by_last_name(prefix).await?;
        ensure!(
            owners.len() == expected,
            "'{prefix}': expected {expected} owners, got {}",
            owners.len()
        );
    }
    Ok(())
}

pub async fn should_find_single_owner_with_pet(clinic: &ClinicService) -> anyhow::Result<()> {
    let owner = clinic.find_owner_by_id(OwnerId::new(1)).await?;

    ensure!(owner.last_name().starts_with("Franklin"), "got {}", owner.last_name());
    ensure!(owner.pets.len() == 1, "expected 1 pet, got {}", owner.pets.len());
    let pet_type = owner.pets[0].pet_type.as_ref().context("pet has no type")?;
    ensure!(pet_type.name == "cat", "expected a cat, got {}", pet_type.name);
    Ok(())
}

pub async fn should_insert_owner(clinic: &ClinicService) -> anyhow::Result<()> {
    let found = clinic.find_owner_by_last_name("Schultz").await?.len();

    let mut owner = Owner::new(
        Person::new("Sam", "Schultz"),
        "4, Evans Street",
        "Wollongong",
        "4444444444",
    );
    clinic.save_owner(&mut owner).await?;

    let id = owner.id.context("owner id not assigned")?;
    ensure!(id.get() != 0, "owner id is zero");
    let now = clinic.find_owner_by_last_name("Schultz").await?.len();
    ensure!(now == found + 1, "expected {} owners named Schultz, got {now}", found + 1);
    Ok(())
}

pub async fn should_update_owner(clinic: &ClinicService) -> anyhow::Result<()> {
    let mut owner = clinic.find_owner_by_id(OwnerId::new(1)).await?;
    let new_last_name = format!("{}X", owner.last_name());

    owner.person.last_name = new_last_name.clone();
    clinic.save_owner(&mut owner).await?;

    let owner = clinic.find_owner_by_id(OwnerId::new(1)).await?;
    ensure!(owner.last_name() == new_last_name, "got {}", owner.last_name());
    Ok(())
}

// Pets

pub async fn should_find_pet_with_correct_id(clinic: &ClinicService) -> anyhow::Result<()> {
    let pet = clinic.find_pet_by_id(PetId::new(7)).await?;

    ensure!(pet.name.starts_with("Samantha"), "got {}", pet.name);
    let owner = pet.owner.as_ref().context("pet has no owner")?;
    ensure!(owner.first_name() == "Jean", "got {}", owner.first_name());
    Ok(())
}

pub async fn should_find_all_pet_types(clinic: &ClinicService) -> anyhow::Result<()> {
    let types = clinic.find_pet_types().await?;

    let cat = find_by_id(&types, PetTypeId::new(1))?;
    ensure!(cat.name == "cat", "type 1 is {}", cat.name);
    let snake = find_by_id(&types, PetTypeId::new(4))?;
    ensure!(snake.name == "snake", "type 4 is {}", snake.name);
    Ok(())
}

pub async fn should_insert_pet_into_database_and_generate_id(
    clinic: &ClinicService,
) -> anyhow::Result<()> {
    let mut owner6 = clinic.find_owner_by_id(OwnerId::new(6)).await?;
    let found = owner6.pets.len();

    let types = clinic.find_pet_types().await?;
    let mut pet = Pet::new("bowser");
    pet.pet_type = Some(find_by_id(&types, PetTypeId::new(2))?.clone());
    pet.birth_date = Some(Utc::now().date_naive());
    owner6.add_pet(pet);
    ensure!(owner6.pets.len() == found + 1, "pet not added to owner");

    let bowser = owner6.pets.last_mut().context("pet not added to owner")?;
    clinic.save_pet(bowser).await?;
    let bowser_id = bowser.id.context("pet id not assigned by save_pet")?;
    clinic.save_owner(&mut owner6).await?;

    let bowser = owner6.pet_named("bowser", true).context("bowser has no id")?;
    ensure!(bowser.id == Some(bowser_id), "save_owner changed the pet id");
    let owner6 = clinic.find_owner_by_id(OwnerId::new(6)).await?;
    ensure!(
        owner6.pets.len() == found + 1,
        "expected {} pets, got {}",
        found + 1,
        owner6.pets.len()
    );
    Ok(())
}

pub async fn should_update_pet_name(clinic: &ClinicService) -> anyhow::Result<()> {
    let mut pet7 = clinic.find_pet_by_id(PetId::new(7)).await?;
    let new_name = format!("{}X", pet7.name);

    pet7.name = new_name.clone();
    clinic.save_pet(&mut pet7).await?;

    let pet7 = clinic.find_pet_by_id(PetId::new(7)).await?;
    ensure!(pet7.name == new_name, "got {}", pet7.name);
    Ok(())
}

pub async fn should_not_save_pet_without_type(clinic: &ClinicService) -> anyhow::Result<()> {
    let owner6 = clinic.find_owner_by_id(OwnerId::new(6)).await?;
    let mut pet = Pet::new("nameless kind");
    pet.owner = owner6.owner_ref();

    let result = clinic.save_pet(&mut pet).await;

    ensure!(
        matches!(result, Err(ClinicError::Domain(DomainError::InvariantViolation(_)))),
        "expected an invariant violation, got {result:?}"
    );
    ensure!(pet.id.is_none(), "failed save assigned an id");
    let after = clinic.find_owner_by_id(OwnerId::new(6)).await?;
    ensure!(after.pets.len() == owner6.pets.len(), "failed save changed the store");
    Ok(())
}

// Vets

pub async fn should_validate_vet_names(_: &ClinicService) -> anyhow::Result<()> {
    let validator = Validator::new();

    let clean = validator.validate(&Vet::new(Person::new("James", "Carter")));
    ensure!(clean.is_empty(), "unexpected violations: {clean}");

    let violations = validator.validate(&Vet::new(Person::new("James", " ")));
    ensure!(violations.len() == 1, "expected 1 violation, got {violations}");
    ensure!(violations.for_path("lastName").is_some(), "lastName not reported");
    Ok(())
}

pub async fn should_find_vets(clinic: &ClinicService) -> anyhow::Result<()> {
    let vets = clinic.find_vets().await?;

    let vet = find_by_id(&vets, VetId::new(3))?;
    ensure!(vet.last_name() == "Douglas", "got {}", vet.last_name());
    ensure!(vet.nr_of_specialties() == 2, "got {} specialties", vet.nr_of_specialties());
    let names: Vec<&str> = vet.specialties().iter().map(|s| s.name.as_str()).collect();
    ensure!(names == ["dentistry", "surgery"], "got {names:?}");
    Ok(())
}

// Visits

pub async fn should_add_new_visit_for_pet(clinic: &ClinicService) -> anyhow::Result<()> {
    let mut pet7 = clinic.find_pet_by_id(PetId::new(7)).await?;
    let found = pet7.visits.len();

    let mut visit = Visit::new();
    visit.description = "test".into();
    pet7.add_visit(visit);
    let visit = pet7.visits.last_mut().context("visit not added")?;
    clinic.save_visit(visit).await?;
    let visit_id = visit.id.context("visit id not assigned")?;
    clinic.save_pet(&mut pet7).await?;

    let pet7 = clinic.find_pet_by_id(PetId::new(7)).await?;
    ensure!(
        pet7.visits.len() == found + 1,
        "expected {} visits, got {}",
        found + 1,
        pet7.visits.len()
    );
    ensure!(
        pet7.visits.iter().any(|v| v.id == Some(visit_id)),
        "saved visit missing on re-fetch"
    );
    Ok(())
}

pub async fn should_find_visits_by_pet_id(clinic: &ClinicService) -> anyhow::Result<()> {
    let visits = clinic.find_visits_by_pet_id(PetId::new(7)).await?;

    ensure!(visits.len() == 2, "expected 2 visits, got {}", visits.len());
    ensure!(
        visits[0].description == "spayed",
        "newest visit is '{}'",
        visits[0].description
    );
    ensure!(visits[0].date > visits[1].date, "visits not newest first");
    Ok(())
}

// Failures

pub async fn should_report_missing_ids_as_not_found(clinic: &ClinicService) -> anyhow::Result<()> {
    let owner = clinic.find_owner_by_id(OwnerId::new(999)).await;
    ensure!(
        matches!(&owner, Err(e) if e.is_not_found()),
        "owner 999: {owner:?}"
    );

    let pet = clinic.find_pet_by_id(PetId::new(999)).await;
    ensure!(matches!(&pet, Err(e) if e.is_not_found()), "pet 999: {pet:?}");
    Ok(())
}

pub async fn should_report_dangling_references_as_not_found(
    clinic: &ClinicService,
) -> anyhow::Result<()> {
    let types = clinic.find_pet_types().await?;
    let mut pet = Pet::new("ghost");
    pet.pet_type = Some(find_by_id(&types, PetTypeId::new(1))?.clone());
    pet.owner = Some(OwnerRef {
        id: OwnerId::new(999),
        person: Person::new("No", "Body"),
    });

    let result = clinic.save_pet(&mut pet).await;
    ensure!(
        matches!(&result, Err(e) if e.is_not_found()),
        "pet of owner 999: {result:?}"
    );
    ensure!(pet.id.is_none(), "failed save assigned an id");

    let mut visit = Visit::new();
    visit.description = "checkup".into();
    visit.pet_id = Some(PetId::new(999));

    let result = clinic.save_visit(&mut visit).await;
    ensure!(
        matches!(&result, Err(e) if e.is_not_found()),
        "visit of pet 999: {result:?}"
    );
    ensure!(visit.id.is_none(), "failed save assigned an id");
    Ok(())
}

fn valid_owner() -> Owner {
    Owner::new(
        Person::new("George", "Franklin"),
        "110 W. Liberty St.",
        "Madison",
        "6085551023",
    )
}

// Runner

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioFailure {
    pub scenario: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SuiteReport {
    pub run: usize,
    pub failures: Vec<ScenarioFailure>,
}

impl SuiteReport {
    pub fn successful(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run every scenario, each against a freshly opened store.
///
/// A file-backed SQLite database is shared between scenarios, so the suite
/// only passes against a freshly seeded one.
pub async fn run_all(config: &ClinicConfig) -> SuiteReport {
    let mut report = SuiteReport::default();

    for scenario in SCENARIOS {
        report.run += 1;
        let outcome = match ClinicService::open(config).await {
            Ok(clinic) => (scenario.run)(&clinic).await,
            Err(e) => Err(anyhow::Error::new(e).context("opening the clinic store")),
        };

        match outcome {
            Ok(()) => info!(scenario = scenario.name, "scenario passed"),
            Err(e) => {
                warn!(scenario = scenario.name, error = %e, "scenario failed");
                report.failures.push(ScenarioFailure {
                    scenario: scenario.name,
                    message: format!("{e:#}"),
                });
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use petclinic_infra::StoreProfile;

    #[test]
    fn scenario_names_are_unique() {
        let mut names: Vec<_> = SCENARIOS.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SCENARIOS.len());
    }

    #[tokio::test]
    async fn suite_passes_in_memory() {
        let config = ClinicConfig {
            profile: StoreProfile::Memory,
            ..ClinicConfig::default()
        };

        let report = run_all(&config).await;

        assert!(report.successful(), "{:#?}", report.failures);
        assert_eq!(report.run, SCENARIOS.len());
    }
}
