use serde::{Deserialize, Serialize};

use super::countries;
use crate::claims::domain::Scope;

/// Payout channel attached to an override tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutMode {
    Voucher,
    CashOrVoucher,
    Cash,
    Other,
}

impl PayoutMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "voucher" => Some(PayoutMode::Voucher),
            "cash_or_voucher" => Some(PayoutMode::CashOrVoucher),
            "cash" => Some(PayoutMode::Cash),
            "other" => Some(PayoutMode::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideTier {
    #[serde(default)]
    pub min_delay_min: i64,
    #[serde(default)]
    pub percent: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout: Option<String>,
}

impl OverrideTier {
    pub fn percent(&self) -> u8 {
        self.percent.clamp(0, 100) as u8
    }

    pub fn payout_mode(&self) -> Option<PayoutMode> {
        self.payout.as_deref().and_then(PayoutMode::parse)
    }
}

/// Tiered national or operator scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRecord {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub operator: String,
    #[serde(default)]
    pub product: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default)]
    pub tiers: Vec<OverrideTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl OverrideRecord {
    /// Highest percent reached at `delay_minutes`; ties go to the higher threshold.
    pub fn best_tier(&self, delay_minutes: i64) -> Option<&OverrideTier> {
        self.tiers
            .iter()
            .filter(|tier| delay_minutes >= tier.min_delay_min)
            .fold(None, |best: Option<&OverrideTier>, tier| match best {
                Some(current)
                    if (current.percent(), current.min_delay_min)
                        >= (tier.percent(), tier.min_delay_min) =>
                {
                    Some(current)
                }
                _ => Some(tier),
            })
    }

    /// True when some tier with a positive threshold is reached.
    pub fn triggers_at(&self, delay_minutes: i64) -> bool {
        self.tiers.is_empty()
            || self
                .tiers
                .iter()
                .any(|tier| tier.min_delay_min > 0 && delay_minutes >= tier.min_delay_min)
    }

    /// Unset or unrecognized scopes apply everywhere.
    pub fn scope_matches(&self, journey: &OverrideContext) -> bool {
        let Some(raw) = self.scope.as_deref() else {
            return true;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "" => true,
            "commuter_exempt" | "commuter" => journey.is_commuter,
            "intl_beyond_eu" => journey.beyond_eu_flag || journey.scope == Scope::IntlBeyondEu,
            other => match Scope::parse(other) {
                Some(scope) => journey.scope == scope,
                None => true,
            },
        }
    }
}

/// Journey facts an override's scope is gated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverrideContext {
    pub scope: Scope,
    pub is_commuter: bool,
    pub beyond_eu_flag: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OverrideQuery<'a> {
    pub country: &'a str,
    pub operator: &'a str,
    pub product: &'a str,
}

impl OverrideQuery<'_> {
    fn is_empty(&self) -> bool {
        self.country.trim().is_empty()
            && self.operator.trim().is_empty()
            && self.product.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NationalOverrides {
    records: Vec<OverrideRecord>,
}

impl NationalOverrides {
    pub fn new(records: Vec<OverrideRecord>) -> Self {
        Self { records }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(raw)?))
    }

    /// Best scoring record: operator +2, product +2, country +1. First record wins ties.
    pub fn find_one(&self, query: &OverrideQuery<'_>) -> Option<&OverrideRecord> {
        if query.is_empty() {
            return None;
        }

        let operator = query.operator.trim();
        let product = query.product.trim();
        let country_forms = countries::lookup_forms(query.country);

        let mut best: Option<(&OverrideRecord, u8)> = None;
        for record in &self.records {
            let mut score = 0;
            if !operator.is_empty() && record.operator.trim().eq_ignore_ascii_case(operator) {
                score += 2;
            }
            if !product.is_empty() && record.product.trim().eq_ignore_ascii_case(product) {
                score += 2;
            }
            if !country_forms.is_empty()
                && country_forms.contains(&record.country.trim().to_ascii_lowercase())
            {
                score += 1;
            }
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((record, score));
            }
        }

        best.filter(|(_, score)| *score > 0).map(|(record, _)| record)
    }

    pub fn records(&self) -> &[OverrideRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides() -> NationalOverrides {
        NationalOverrides::from_json(
            r#"[
                {"country": "Denmark", "operator": "DSB", "product": "Re", "tiers": [
                    {"minDelayMin": 30, "percent": 50, "payout": "cash_or_voucher"},
                    {"minDelayMin": 60, "percent": 100}
                ]},
                {"country": "France", "operator": "SNCF", "product": "TGV INOUI G30", "tiers": [
                    {"minDelayMin": 30, "percent": 25, "payout": "voucher"},
                    {"minDelayMin": 120, "percent": 50, "payout": "voucher"}
                ]},
                {"country": "Finland", "operator": "VR", "product": "Commuter", "scope": "commuter_exempt",
                 "tiers": [{"minDelayMin": 20, "percent": 50}]}
            ]"#,
        )
        .expect("overrides parse")
    }

    #[test]
    fn empty_query_matches_nothing() {
        assert!(overrides().find_one(&OverrideQuery::default()).is_none());
        let blank = OverrideQuery {
            country: " ",
            operator: "",
            product: "",
        };
        assert!(overrides().find_one(&blank).is_none());
    }

    #[test]
    fn iso_query_matches_country_names() {
        let overrides = overrides();
        let record = overrides
            .find_one(&OverrideQuery {
                country: "DK",
                ..OverrideQuery::default()
            })
            .expect("country match");
        assert_eq!(record.operator, "DSB");
    }

    #[test]
    fn operator_outranks_country() {
        let overrides = overrides();
        let record = overrides
            .find_one(&OverrideQuery {
                country: "DK",
                operator: "sncf",
                product: "",
            })
            .expect("operator match");
        assert_eq!(record.operator, "SNCF");
    }

    #[test]
    fn unmatched_query_returns_none() {
        let query = OverrideQuery {
            country: "PT",
            operator: "CP",
            product: "Alfa Pendular",
        };
        assert!(overrides().find_one(&query).is_none());
    }

    #[test]
    fn best_tier_prefers_percent_then_threshold() {
        let overrides = overrides();
        let dsb = &overrides.records()[0];
        assert_eq!(dsb.best_tier(45).map(OverrideTier::percent), Some(50));
        assert_eq!(dsb.best_tier(75).map(OverrideTier::percent), Some(100));
        assert!(dsb.best_tier(10).is_none());

        let tied = OverrideRecord {
            tiers: vec![
                OverrideTier {
                    min_delay_min: 30,
                    percent: 25,
                    payout: Some("voucher".into()),
                },
                OverrideTier {
                    min_delay_min: 60,
                    percent: 25,
                    payout: Some("cash".into()),
                },
            ],
            ..dsb.clone()
        };
        let tier = tied.best_tier(90).expect("tier reached");
        assert_eq!(tier.min_delay_min, 60);
        assert_eq!(tier.payout_mode(), Some(PayoutMode::Cash));
    }

    #[test]
    fn commuter_scope_requires_commuter_journey() {
        let overrides = overrides();
        let vr = &overrides.records()[2];
        let context = OverrideContext {
            scope: Scope::Regional,
            is_commuter: false,
            beyond_eu_flag: false,
        };
        assert!(!vr.scope_matches(&context));
        assert!(vr.scope_matches(&OverrideContext {
            is_commuter: true,
            ..context
        }));
        assert!(overrides.records()[0].scope_matches(&context));
    }
}
