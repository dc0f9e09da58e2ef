use crate::infra::{print_json, read_request, Runtime};
use clap::Args;
use rail_claims::claims::scenario::load_scenarios;
use rail_claims::claims::tables::TableError;
use rail_claims::claims::{per_contract_claims, RuleTables, ScenarioOutcome, ScenarioRunner};
use rail_claims::error::AppError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Args, Debug)]
pub(crate) struct RequestArgs {
    /// Request JSON file, or `-` to read stdin
    pub(crate) request: PathBuf,
    /// Print single-line JSON instead of pretty output
    #[arg(long)]
    pub(crate) compact: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ScenarioArgs {
    /// Fixture file: an array of scenarios or {"scenarios": [...]}
    pub(crate) fixtures: PathBuf,
    /// Write a per-scenario summary to this CSV file
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

pub(crate) fn run_compute(runtime: &Runtime, args: RequestArgs) -> Result<(), AppError> {
    let request = read_request(&args.request)?;
    let report = runtime.service().compute(&request);
    print_json(&report, args.compact)
}

pub(crate) fn run_profile(runtime: &Runtime, args: RequestArgs) -> Result<(), AppError> {
    let request = read_request(&args.request)?;
    let profile = runtime.service().calculator().profile(&request.journey);
    print_json(&profile, args.compact)
}

pub(crate) fn run_contracts(args: RequestArgs) -> Result<(), AppError> {
    let request = read_request(&args.request)?;
    if request.journey.through_ticket {
        warn!("journey is a through ticket; contracts are split regardless");
    }
    print_json(&per_contract_claims(&request.journey), args.compact)
}

pub(crate) fn run_scenarios(runtime: &Runtime, args: ScenarioArgs) -> Result<(), AppError> {
    let scenarios = load_scenarios(&args.fixtures)?;
    let service = runtime.service();
    let outcomes = ScenarioRunner::new(&service).run_all(&scenarios)?;

    let passed = outcomes.iter().filter(|outcome| outcome.passed()).count();
    println!(
        "Scenarios: {passed}/{} passed ({})",
        outcomes.len(),
        args.fixtures.display()
    );
    for outcome in &outcomes {
        let status = if outcome.passed() { "PASS" } else { "FAIL" };
        println!("- [{status}] {} ({} checks)", outcome.name, outcome.checks);
        for failure in &outcome.failures {
            println!(
                "    {}: expected {}, got {}",
                failure.path, failure.expected, failure.actual
            );
        }
    }

    if let Some(path) = args.csv {
        write_summary(&path, &outcomes)?;
        println!("Summary written to {}", path.display());
    }
    Ok(())
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    scenario: &'a str,
    passed: bool,
    checks: usize,
    failures: usize,
    failed_paths: String,
}

fn write_summary(path: &Path, outcomes: &[ScenarioOutcome]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(std::io::Error::from)?;
    for outcome in outcomes {
        let failed_paths = outcome
            .failures
            .iter()
            .map(|failure| failure.path.as_str())
            .collect::<Vec<_>>()
            .join(";");
        writer
            .serialize(SummaryRow {
                scenario: &outcome.name,
                passed: outcome.passed(),
                checks: outcome.checks,
                failures: outcome.failures.len(),
                failed_paths,
            })
            .map_err(std::io::Error::from)?;
    }
    writer.flush()?;
    Ok(())
}

pub(crate) fn run_validate(runtime: &Runtime) -> Result<(), AppError> {
    let dir = runtime.data_dir();
    match RuleTables::load_strict(dir) {
        Ok(tables) => {
            println!("Rule tables in {} are valid", dir.display());
            println!("- {} override records", tables.overrides.records().len());
            println!("- {} exemption notices", tables.exemptions.len());
            println!("- {} operators", tables.catalog.operators().len());
            Ok(())
        }
        Err(TableError::Invalid(issues)) => {
            println!("Rule tables in {} have invalid entries:", dir.display());
            for issue in &issues {
                println!("- {}[{}]: {}", issue.table, issue.index, issue.message);
            }
            Err(TableError::Invalid(issues).into())
        }
        Err(err) => Err(err.into()),
    }
}
