use std::process::ExitCode;

use anyhow::Context;

use petclinic_infra::ClinicConfig;
use petclinic_service::run_all;

const REPORT_VAR: &str = "PETCLINIC_SUITE_REPORT";
const SEPARATOR: &str = "--------------------------------------------------";

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    petclinic_observability::init();

    let config = ClinicConfig::from_env().context("reading PETCLINIC_* configuration")?;
    tracing::info!(profile = %config.profile, url = %config.database.url, "running clinic suite");

    let report = run_all(&config).await;

    for failure in &report.failures {
        println!("{}: {}", failure.scenario, failure.message);
    }
    println!("{SEPARATOR}");
    println!("SUCCESSFUL TEST => {}", report.successful());
    println!("{SEPARATOR}");

    if std::env::var(REPORT_VAR).is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(if report.successful() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
