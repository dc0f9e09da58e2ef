//! Read-only rule tables shared by every computation.
//!
//! Tables are loaded once from a data directory. [`RuleTables::load`] never fails:
//! a missing or malformed file yields an empty table and a warning, so the engine
//! keeps producing results. [`RuleTables::load_strict`] surfaces the same problems
//! as [`TableError`] for tooling.

pub mod catalog;
pub mod countries;
pub mod exemptions;
pub mod forms;
pub mod matrix;
pub mod overrides;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

pub use catalog::{DowngradeRule, OperatorCatalog, OperatorEntry, Supplement};
pub use exemptions::{ExemptionRow, ExemptionsTable};
pub use forms::{NationalFormEntry, NationalForms};
pub use matrix::{ExemptionMatrix, MatrixRow};
pub use overrides::{
    NationalOverrides, OverrideContext, OverrideQuery, OverrideRecord, OverrideTier, PayoutMode,
};

pub const MATRIX_FILE: &str = "exemption_matrix.json";
pub const EXEMPTIONS_FILE: &str = "exemptions.json";
pub const OVERRIDES_FILE: &str = "national_overrides.json";
pub const CATALOG_FILE: &str = "operators_catalog.json";
pub const FORMS_FILE: &str = "national_forms.json";

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} invalid table entries", .0.len())]
    Invalid(Vec<TableIssue>),
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableIssue {
    pub table: &'static str,
    pub index: usize,
    pub message: String,
}

/// All tables the engine consults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleTables {
    pub matrix: ExemptionMatrix,
    pub exemptions: ExemptionsTable,
    pub overrides: NationalOverrides,
    pub catalog: OperatorCatalog,
    pub forms: NationalForms,
}

impl RuleTables {
    /// Load every table, degrading each one independently to empty on failure.
    pub fn load(dir: &Path) -> Self {
        let tables = Self {
            matrix: degrade(read_json(dir, MATRIX_FILE).map(ExemptionMatrix::from_rows)),
            exemptions: degrade(read_json(dir, EXEMPTIONS_FILE).map(ExemptionsTable::new)),
            overrides: degrade(read_json(dir, OVERRIDES_FILE).map(NationalOverrides::new)),
            catalog: degrade(read_json(dir, CATALOG_FILE)),
            forms: degrade(read_forms(dir)),
        };
        info!(
            data_dir = %dir.display(),
            overrides = tables.overrides.records().len(),
            operators = tables.catalog.operators().len(),
            "rule tables loaded"
        );
        tables
    }

    /// Load every table, failing on the first unreadable file or invalid entry.
    pub fn load_strict(dir: &Path) -> Result<Self, TableError> {
        let tables = Self {
            matrix: read_json(dir, MATRIX_FILE).map(ExemptionMatrix::from_rows)?,
            exemptions: read_json(dir, EXEMPTIONS_FILE).map(ExemptionsTable::new)?,
            overrides: read_json(dir, OVERRIDES_FILE).map(NationalOverrides::new)?,
            catalog: read_json(dir, CATALOG_FILE)?,
            forms: read_forms(dir)?,
        };
        let issues = tables.validate();
        if issues.is_empty() {
            Ok(tables)
        } else {
            Err(TableError::Invalid(issues))
        }
    }

    /// Structural checks on the override table.
    pub fn validate(&self) -> Vec<TableIssue> {
        let mut issues = Vec::new();
        for (index, record) in self.overrides.records().iter().enumerate() {
            let mut report = |message: String| {
                issues.push(TableIssue {
                    table: OVERRIDES_FILE,
                    index,
                    message,
                })
            };
            // An empty product matches every product of the operator.
            for (field, value) in [("country", &record.country), ("operator", &record.operator)] {
                if value.trim().is_empty() {
                    report(format!("missing {field}"));
                }
            }
            for (position, tier) in record.tiers.iter().enumerate() {
                if tier.min_delay_min < 0 {
                    report(format!("tier {position}: minDelayMin must be >= 0"));
                }
                if !(0..=100).contains(&tier.percent) {
                    report(format!("tier {position}: percent must be within 0..=100"));
                }
                if let Some(payout) = tier.payout.as_deref() {
                    if PayoutMode::parse(payout).is_none() {
                        report(format!("tier {position}: unknown payout '{payout}'"));
                    }
                }
            }
        }
        issues
    }
}

fn read_json<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<T, TableError> {
    let path = dir.join(file);
    let raw = fs::read_to_string(&path).map_err(|source| TableError::Read {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| TableError::Parse { path, source })
}

fn read_forms(dir: &Path) -> Result<NationalForms, TableError> {
    let path = dir.join(FORMS_FILE);
    let raw = fs::read_to_string(&path).map_err(|source| TableError::Read {
        path: path.clone(),
        source,
    })?;
    let mut forms =
        NationalForms::from_json(&raw).map_err(|source| TableError::Parse { path, source })?;
    forms.resolve_templates(dir);
    Ok(forms)
}

fn degrade<T: Default>(result: Result<T, TableError>) -> T {
    result.unwrap_or_else(|error| {
        warn!(%error, "rule table unavailable; continuing with an empty table");
        T::default()
    })
}

/// Load-once holder for [`RuleTables`].
///
/// Nothing is read until the first [`TableCache::get`]; afterwards every caller
/// shares the same `Arc`.
#[derive(Debug)]
pub struct TableCache {
    dir: PathBuf,
    tables: OnceLock<Arc<RuleTables>>,
}

impl TableCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            tables: OnceLock::new(),
        }
    }

    /// A cache that is already initialized, for callers holding in-memory tables.
    pub fn with_tables(tables: RuleTables) -> Self {
        let cache = Self::new(PathBuf::new());
        let _ = cache.tables.set(Arc::new(tables));
        cache
    }

    pub fn get(&self) -> Arc<RuleTables> {
        Arc::clone(
            self.tables
                .get_or_init(|| Arc::new(RuleTables::load(&self.dir))),
        )
    }

    pub fn is_loaded(&self) -> bool {
        self.tables.get().is_some()
    }

    pub fn data_dir(&self) -> &Path {
        &self.dir
    }
}
