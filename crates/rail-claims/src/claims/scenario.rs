//! Fixture runner comparing computed reports against expected values.
//!
//! A fixture names a request and a map of dotted report paths
//! (`result.totals.net_to_client`, `rules.verdicts.0.status`) to either a
//! literal JSON value or `{"reasonContains": "..."}` for substring checks.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{ClaimRequest, RequestError};
use super::service::ClaimService;

const AMOUNT_TOLERANCE: f64 = 0.005;

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub request: Value,
    #[serde(default)]
    pub expected: BTreeMap<String, Expectation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Expectation {
    Contains {
        #[serde(rename = "reasonContains")]
        reason_contains: String,
    },
    Equals(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    pub path: String,
    pub expected: String,
    pub actual: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub checks: usize,
    pub failures: Vec<Mismatch>,
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("failed to read fixtures {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse fixtures {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("scenario '{name}' has an unreadable request: {source}")]
    Request {
        name: String,
        #[source]
        source: RequestError,
    },
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FixtureFile {
    List(Vec<Scenario>),
    Wrapped { scenarios: Vec<Scenario> },
}

/// Accepts a bare array or `{"scenarios": [...]}`.
pub fn parse_scenarios(raw: &str) -> Result<Vec<Scenario>, serde_json::Error> {
    Ok(match serde_json::from_str::<FixtureFile>(raw)? {
        FixtureFile::List(scenarios) | FixtureFile::Wrapped { scenarios } => scenarios,
    })
}

pub fn load_scenarios(path: &Path) -> Result<Vec<Scenario>, ScenarioError> {
    let raw = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_scenarios(&raw).map_err(|source| ScenarioError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub struct ScenarioRunner<'a> {
    service: &'a ClaimService,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(service: &'a ClaimService) -> Self {
        Self { service }
    }

    pub fn run(&self, scenario: &Scenario) -> Result<ScenarioOutcome, ScenarioError> {
        let request =
            ClaimRequest::from_value(scenario.request.clone()).map_err(|source| ScenarioError::Request {
                name: scenario.name.clone(),
                source,
            })?;
        let report = serde_json::to_value(self.service.compute(&request))?;

        let failures = scenario
            .expected
            .iter()
            .filter_map(|(path, expectation)| check(&report, path, expectation))
            .collect();

        Ok(ScenarioOutcome {
            name: scenario.name.clone(),
            checks: scenario.expected.len(),
            failures,
        })
    }

    pub fn run_all(&self, scenarios: &[Scenario]) -> Result<Vec<ScenarioOutcome>, ScenarioError> {
        scenarios.iter().map(|scenario| self.run(scenario)).collect()
    }
}

/// Value at a dotted path; numeric segments index arrays.
pub fn lookup<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.')
        .filter(|part| !part.is_empty())
        .try_fold(value, |current, part| match current {
            Value::Object(map) => map.get(part),
            Value::Array(items) => part.parse::<usize>().ok().and_then(|index| items.get(index)),
            _ => None,
        })
}

fn check(report: &Value, path: &str, expectation: &Expectation) -> Option<Mismatch> {
    let actual = lookup(report, path);
    let passed = match (expectation, actual) {
        (Expectation::Contains { reason_contains }, Some(actual)) => {
            contains_text(actual, reason_contains)
        }
        (Expectation::Equals(expected), Some(actual)) => values_match(expected, actual),
        (Expectation::Equals(Value::Null), None) => true,
        _ => false,
    };
    if passed {
        return None;
    }

    let expected = match expectation {
        Expectation::Contains { reason_contains } => format!("contains '{reason_contains}'"),
        Expectation::Equals(value) => value.to_string(),
    };
    Some(Mismatch {
        path: path.to_string(),
        expected,
        actual: actual.map_or_else(|| "<absent>".to_string(), Value::to_string),
    })
}

fn contains_text(actual: &Value, needle: &str) -> bool {
    match actual {
        Value::String(text) => text.contains(needle),
        Value::Array(items) => items.iter().any(|item| contains_text(item, needle)),
        other => other.to_string().contains(needle),
    }
}

fn values_match(expected: &Value, actual: &Value) -> bool {
    match (expected.as_f64(), actual.as_f64()) {
        (Some(expected), Some(actual)) => (expected - actual).abs() < AMOUNT_TOLERANCE,
        _ => expected == actual,
    }
}
