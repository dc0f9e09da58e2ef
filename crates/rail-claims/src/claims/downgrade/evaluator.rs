use serde::Serialize;

use crate::claims::domain::{round2, ClassDelivery, JourneyInput, Segment};
use crate::claims::tables::{OperatorCatalog, OperatorEntry};

const DEFAULT_UPLIFT_FRACTION: f64 = 0.33;

const LEGAL_BASES: [&str; 2] = [
    "CIV + GCC-CIV/PRR (contract of carriage)",
    "Art. 9(1) (pre-contract information)",
];
const REROUTE_BASIS: &str = "Art. 18(2) (rerouting)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundMethod {
    Supplement,
    Fixed,
    Tariff,
    Prorata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefundBasis {
    pub method: RefundMethod,
    pub amount: f64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
}

/// Downgrade verdict for one leg.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegDowngrade {
    pub leg_index: usize,
    pub segment: String,
    pub downgraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund: Option<RefundBasis>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub legal: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasoning: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DowngradeEvaluation {
    /// `None` when no leg was downgraded, `Some(false)` when a refund could not be computed.
    pub compliance_status: Option<bool>,
    pub missing: Vec<String>,
    pub results: Vec<LegDowngrade>,
}

impl DowngradeEvaluation {
    pub fn total_refund(&self) -> f64 {
        round2(
            self.results
                .iter()
                .filter_map(|leg| leg.refund.as_ref())
                .map(|refund| refund.amount)
                .sum(),
        )
    }
}

/// Deterministic per-leg refund basis: supplement, operator fixed, tariff, then prorata.
#[derive(Debug, Clone, Copy)]
pub struct DowngradeEvaluator<'a> {
    catalog: &'a OperatorCatalog,
}

impl<'a> DowngradeEvaluator<'a> {
    pub fn new(catalog: &'a OperatorCatalog) -> Self {
        Self { catalog }
    }

    pub fn evaluate(&self, journey: &JourneyInput) -> DowngradeEvaluation {
        let mut results = Vec::with_capacity(journey.segments.len());
        let mut missing = Vec::new();
        let mut any_downgraded = false;
        let mut all_computed = true;

        for (index, segment) in journey.segments.iter().enumerate() {
            let leg = self.evaluate_leg(index, segment, journey);
            if leg.downgraded {
                any_downgraded = true;
                all_computed &= leg.refund.is_some();
                for field in &leg.missing {
                    if !missing.contains(field) {
                        missing.push(field.clone());
                    }
                }
            }
            results.push(leg);
        }

        DowngradeEvaluation {
            compliance_status: any_downgraded.then_some(all_computed),
            missing,
            results,
        }
    }

    fn operator_for(&self, segment: &Segment, journey: &JourneyInput) -> Option<&'a OperatorEntry> {
        let name = if segment.operator.is_empty() {
            journey.operator.as_str()
        } else {
            segment.operator.as_str()
        };
        self.catalog.operator(name)
    }

    fn evaluate_leg(&self, index: usize, segment: &Segment, journey: &JourneyInput) -> LegDowngrade {
        let amenity = segment
            .reserved_amenity_booked
            .as_deref()
            .map(str::trim)
            .filter(|booked| !booked.is_empty() && !booked.eq_ignore_ascii_case("none"));
        let class_lower = segment.class_delivered == ClassDelivery::Lower;
        let amenity_missing = amenity.is_some() && segment.reserved_amenity_delivered.is_no();

        let label = segment.label(index);
        if !class_lower && !amenity_missing {
            return LegDowngrade {
                leg_index: index,
                segment: label,
                downgraded: false,
                refund: None,
                missing: Vec::new(),
                legal: Vec::new(),
                reasoning: Vec::new(),
            };
        }

        let currency = segment
            .currency
            .clone()
            .unwrap_or_else(|| journey.currency.clone());
        let operator = self.operator_for(segment, journey);
        let rule = operator.and_then(|entry| entry.downgrade_rules.as_ref());
        let uplift = rule.and_then(|rule| rule.uplift());
        let mut missing = Vec::new();

        let supplement = amenity
            .filter(|_| amenity_missing)
            .and_then(|kind| operator.and_then(|entry| entry.supplement(kind)))
            .map(|supplement| RefundBasis {
                method: RefundMethod::Supplement,
                amount: supplement.amount,
                currency: supplement
                    .currency
                    .clone()
                    .unwrap_or_else(|| currency.clone()),
                percent: None,
            });

        let fixed = || {
            rule.and_then(|rule| {
                rule.fixed_refund().map(|amount| RefundBasis {
                    method: RefundMethod::Fixed,
                    amount,
                    currency: rule.currency.clone().unwrap_or_else(|| currency.clone()),
                    percent: None,
                })
            })
        };

        let tariff = || {
            let price = segment.price.filter(|price| *price > 0.0)?;
            let ratio = uplift?;
            let fraction = ratio / (1.0 + ratio);
            Some(RefundBasis {
                method: RefundMethod::Tariff,
                amount: round2(price * fraction),
                currency: currency.clone(),
                percent: Some(percent_of(fraction)),
            })
        };

        let prorata = || {
            let share = segment.downgrade_share;
            let total = Some(journey.ticket_price_total).filter(|total| *total > 0.0);
            if share.is_none() {
                missing.push("downgrade_share".to_string());
            }
            if total.is_none() {
                missing.push("ticket_price_total".to_string());
            }
            let (share, total) = (share?, total?);
            let fraction = uplift.map_or(DEFAULT_UPLIFT_FRACTION, |ratio| ratio / (1.0 + ratio));
            Some(RefundBasis {
                method: RefundMethod::Prorata,
                amount: round2(total * share.clamp(0.0, 1.0) * fraction),
                currency: currency.clone(),
                percent: Some(percent_of(fraction)),
            })
        };

        let refund = supplement.or_else(fixed).or_else(tariff).or_else(prorata);

        let mut legal: Vec<String> = LEGAL_BASES.iter().map(|basis| basis.to_string()).collect();
        if segment.is_reroute_leg {
            legal.push(REROUTE_BASIS.to_string());
        }

        let mut reasoning = Vec::new();
        if class_lower {
            reasoning.push("delivered class lower than purchased".to_string());
        }
        if amenity_missing {
            reasoning.push("reserved amenity not delivered".to_string());
        }
        if let Some(note) = segment.downgrade_reason.as_deref() {
            reasoning.push(note.to_string());
        }

        LegDowngrade {
            leg_index: index,
            segment: label,
            downgraded: true,
            refund,
            missing,
            legal,
            reasoning,
        }
    }
}

fn percent_of(fraction: f64) -> f64 {
    (fraction * 1000.0).round() / 10.0
}
