use crate::demo::{run_demo, DemoArgs};
use crate::infra::Runtime;
use crate::report::{
    run_compute, run_contracts, run_profile, run_scenarios, run_validate, RequestArgs,
    ScenarioArgs,
};
use clap::{Parser, Subcommand};
use rail_claims::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "rail-claims",
    about = "Determine compensation, refunds and claim forms for disrupted rail journeys",
    version
)]
struct Cli {
    /// Directory holding the rule tables (overrides CLAIMS_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the full claim report for a request file
    Compute(RequestArgs),
    /// Print only the exemption profile for a request file
    Profile(RequestArgs),
    /// Split a separately ticketed journey into contracts and band each one
    Contracts(RequestArgs),
    /// Run fixture scenarios against their expected values
    Scenarios(ScenarioArgs),
    /// Load the rule tables strictly and report invalid entries
    Validate,
    /// Walk through the canonical claim scenarios
    Demo(DemoArgs),
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let runtime = Runtime::bootstrap(cli.data_dir)?;

    match cli.command {
        Command::Compute(args) => run_compute(&runtime, args),
        Command::Profile(args) => run_profile(&runtime, args),
        Command::Contracts(args) => run_contracts(args),
        Command::Scenarios(args) => run_scenarios(&runtime, args),
        Command::Validate => run_validate(&runtime),
        Command::Demo(args) => run_demo(&runtime, args),
    }
}
