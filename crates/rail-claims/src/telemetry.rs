//! Tracing setup for the engine and its front ends.
//!
//! Reports go to stdout, so every log line is written to stderr. A bare level such
//! as `debug` only raises the claims crates; dependencies stay at `warn`.

use crate::config::{LogFormat, TelemetryConfig};
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

const CLAIMS_TARGETS: [&str; 2] = ["rail_claims", "rail_claims_cli"];
const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(f, "invalid APP_LOG_LEVEL filter '{value}'")
            }
            TelemetryError::Subscriber(err) => write!(f, "telemetry error: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// Filter directives for a configured level. Full directive strings pass through.
pub fn directives(log_level: &str) -> String {
    let level = log_level.trim().to_ascii_lowercase();
    if !LEVELS.contains(&level.as_str()) {
        return log_level.trim().to_string();
    }
    let mut directives = vec!["warn".to_string()];
    directives.extend(
        CLAIMS_TARGETS
            .iter()
            .map(|target| format!("{target}={level}")),
    );
    directives.join(",")
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let value = directives(&config.log_level);
            EnvFilter::try_new(&value)
                .map_err(|source| TelemetryError::EnvFilter { value, source })?
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);

    match config.format {
        LogFormat::Json => builder
            .json()
            .with_current_span(false)
            .try_init()
            .map_err(TelemetryError::Subscriber),
        LogFormat::Compact => builder
            .with_target(false)
            .compact()
            .try_init()
            .map_err(TelemetryError::Subscriber),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_levels_scope_to_claims_crates() {
        assert_eq!(
            directives(" Debug "),
            "warn,rail_claims=debug,rail_claims_cli=debug"
        );
        assert!(EnvFilter::try_new(directives("info")).is_ok());
    }

    #[test]
    fn explicit_directives_pass_through() {
        assert_eq!(
            directives("rail_claims::claims::profile=trace,info"),
            "rail_claims::claims::profile=trace,info"
        );
    }

    #[test]
    fn invalid_filters_report_the_configured_value() {
        let config = TelemetryConfig {
            log_level: "rail_claims=loud".to_string(),
            format: LogFormat::Compact,
        };
        std::env::remove_var("RUST_LOG");
        let error = init(&config).expect_err("filter is rejected");
        assert_eq!(
            error.to_string(),
            "invalid APP_LOG_LEVEL filter 'rail_claims=loud'"
        );
    }
}
