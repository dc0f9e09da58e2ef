use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::countries;
use crate::claims::domain::Scope;
use crate::claims::lenient;

/// One country/scope row of the exemption matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixRow {
    pub scope: String,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default)]
    pub exemptions: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub notes: Vec<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl MatrixRow {
    pub fn scope(&self) -> Option<Scope> {
        Scope::parse(&self.scope)
    }

    pub fn exempts(&self, label: &str) -> bool {
        self.exemptions.iter().any(|entry| entry.trim() == label)
    }
}

/// Country (ISO) keyed exemption rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExemptionMatrix {
    rows: BTreeMap<String, Vec<MatrixRow>>,
}

impl ExemptionMatrix {
    pub fn from_rows(raw: BTreeMap<String, Vec<MatrixRow>>) -> Self {
        let mut rows: BTreeMap<String, Vec<MatrixRow>> = BTreeMap::new();
        for (country, entries) in raw {
            match countries::to_iso(&country) {
                Some(iso) => rows.entry(iso).or_default().extend(entries),
                None => warn!(%country, "skipping exemption matrix rows for unknown country"),
            }
        }
        Self { rows }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let parsed: BTreeMap<String, Vec<MatrixRow>> = serde_json::from_str(raw)?;
        Ok(Self::from_rows(parsed))
    }

    /// Rows for a country (ISO or name) restricted to one scope.
    pub fn find(&self, country: &str, scope: Scope) -> Vec<&MatrixRow> {
        let Some(iso) = countries::to_iso(country) else {
            return Vec::new();
        };
        self.rows
            .get(&iso)
            .map(|rows| {
                rows.iter()
                    .filter(|row| row.scope() == Some(scope))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_blocked(&self, country: &str, scope: Scope) -> bool {
        self.find(country, scope).iter().any(|row| row.blocked)
    }

    pub fn countries(&self) -> impl Iterator<Item = (&String, &Vec<MatrixRow>)> {
        self.rows.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
