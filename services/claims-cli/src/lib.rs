mod cli;
mod demo;
mod infra;
mod report;

use rail_claims::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
