use chrono::NaiveDate;
use rail_claims::claims::{ClaimRequest, ClaimService, TableCache};
use rail_claims::config::AppConfig;
use rail_claims::error::AppError;
use rail_claims::telemetry;
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;

/// Configuration and lazily loaded tables shared by every command.
pub(crate) struct Runtime {
    pub(crate) config: AppConfig,
    tables: TableCache,
}

impl Runtime {
    pub(crate) fn bootstrap(data_dir: Option<PathBuf>) -> Result<Self, AppError> {
        let mut config = AppConfig::load()?;
        if let Some(dir) = data_dir {
            config.data_dir = dir;
        }

        telemetry::init(&config.telemetry)?;
        info!(
            ?config.environment,
            data_dir = %config.data_dir.display(),
            fee_pct = config.engine.service_fee_pct,
            "claims engine configured"
        );

        let tables = TableCache::new(config.data_dir.clone());
        Ok(Self { config, tables })
    }

    pub(crate) fn data_dir(&self) -> &Path {
        self.tables.data_dir()
    }

    pub(crate) fn service(&self) -> ClaimService {
        ClaimService::new(self.tables.get(), self.config.engine)
    }
}

/// Read a request from a file, or from stdin when the path is `-`.
pub(crate) fn read_request(path: &Path) -> Result<ClaimRequest, AppError> {
    let raw = if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(path)?
    };
    Ok(ClaimRequest::from_json(&raw)?)
}

pub(crate) fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<(), AppError> {
    let rendered = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{rendered}");
    Ok(())
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
