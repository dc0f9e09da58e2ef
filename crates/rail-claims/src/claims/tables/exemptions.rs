use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::countries;
use crate::claims::domain::Scope;

/// Dated national exemption notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExemptionRow {
    pub country: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub articles_exempt: Vec<String>,
    #[serde(default)]
    pub until: Option<NaiveDate>,
}

impl ExemptionRow {
    /// Article labels in matrix form, e.g. `19` becomes `Art.19`.
    pub fn article_labels(&self) -> Vec<String> {
        self.articles_exempt
            .iter()
            .map(|raw| normalize_article(raw))
            .filter(|label| !label.is_empty())
            .collect()
    }

    fn active_on(&self, travel_date: Option<NaiveDate>) -> bool {
        match (self.until, travel_date) {
            (Some(until), Some(date)) => date <= until,
            _ => true,
        }
    }
}

pub(crate) fn normalize_article(raw: &str) -> String {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let body = compact
        .strip_prefix("Art.")
        .or_else(|| compact.strip_prefix("art."))
        .or_else(|| compact.strip_prefix("Art"))
        .or_else(|| compact.strip_prefix("art"))
        .unwrap_or(&compact);
    if body.is_empty() {
        String::new()
    } else {
        format!("Art.{body}")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExemptionsTable {
    rows: Vec<ExemptionRow>,
}

impl ExemptionsTable {
    pub fn new(rows: Vec<ExemptionRow>) -> Self {
        Self { rows }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(raw)?))
    }

    /// Rows for the country whose scope is unset or equal, skipping rows expired before travel.
    pub fn find(
        &self,
        country: &str,
        scope: Scope,
        travel_date: Option<NaiveDate>,
    ) -> Vec<&ExemptionRow> {
        if country.trim().is_empty() {
            return Vec::new();
        }
        self.rows
            .iter()
            .filter(|row| countries::same_country(&row.country, country))
            .filter(|row| {
                row.scope
                    .as_deref()
                    .map_or(true, |raw| Scope::parse(raw) == Some(scope))
            })
            .filter(|row| row.active_on(travel_date))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
