use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::claims::domain::FeeMode;

const DEFAULT_SERVICE_FEE_PCT: u8 = 25;
const DEFAULT_DATA_DIR: &str = "data";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub data_dir: PathBuf,
    pub engine: EngineConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let data_dir = env::var("CLAIMS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));

        let service_fee_pct = match env::var("CLAIMS_SERVICE_FEE_PCT") {
            Ok(raw) => raw
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|pct| *pct <= 100)
                .ok_or(ConfigError::InvalidServiceFee(raw))?,
            Err(_) => DEFAULT_SERVICE_FEE_PCT,
        };

        let fee_mode = match env::var("CLAIMS_FEE_MODE") {
            Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "gross" => FeeMode::Gross,
                "expenses_only" => FeeMode::ExpensesOnly,
                _ => return Err(ConfigError::InvalidFeeMode(raw)),
            },
            Err(_) => FeeMode::Gross,
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let format = match env::var("APP_LOG_FORMAT") {
            Ok(raw) => LogFormat::parse(&raw).ok_or(ConfigError::InvalidLogFormat(raw))?,
            Err(_) if environment == AppEnvironment::Production => LogFormat::Json,
            Err(_) => LogFormat::Compact,
        };

        Ok(Self {
            environment,
            data_dir,
            engine: EngineConfig {
                service_fee_pct,
                fee_mode,
            },
            telemetry: TelemetryConfig { log_level, format },
        })
    }
}

/// Knobs applied to every claim computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub service_fee_pct: u8,
    pub fee_mode: FeeMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            service_fee_pct: DEFAULT_SERVICE_FEE_PCT,
            fee_mode: FeeMode::Gross,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// A bare level for the claims crates, or full filter directives.
    pub log_level: String,
    pub format: LogFormat,
}

/// Log line layout on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Some(LogFormat::Compact),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidServiceFee(String),
    InvalidFeeMode(String),
    InvalidLogFormat(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidServiceFee(value) => write!(
                f,
                "CLAIMS_SERVICE_FEE_PCT must be an integer between 0 and 100 (found '{value}')"
            ),
            ConfigError::InvalidFeeMode(value) => write!(
                f,
                "CLAIMS_FEE_MODE must be 'gross' or 'expenses_only' (found '{value}')"
            ),
            ConfigError::InvalidLogFormat(value) => write!(
                f,
                "APP_LOG_FORMAT must be 'compact' or 'json' (found '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
