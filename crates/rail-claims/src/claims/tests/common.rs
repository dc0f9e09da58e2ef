use std::sync::Arc;

use chrono::NaiveDateTime;
use serde_json::{json, Value};

use crate::claims::calculator::ClaimCalculator;
use crate::claims::domain::{ClaimRequest, JourneyInput, Segment};
use crate::claims::lenient::parse_datetime;
use crate::claims::profile::{ExemptionProfile, ExemptionProfileBuilder};
use crate::claims::service::ClaimService;
use crate::claims::tables::{
    ExemptionMatrix, ExemptionsTable, NationalForms, NationalOverrides, OperatorCatalog,
    RuleTables,
};
use crate::config::EngineConfig;

pub(super) fn tables() -> Arc<RuleTables> {
    let matrix = ExemptionMatrix::from_json(
        r#"{
            "SE": [
                {"scope": "regional", "exemptions": ["Art.17", "Art.19", "Art.20(2)"], "notes": "regional services exempted"}
            ],
            "Poland": [
                {"scope": "regional", "blocked": true, "reason": "national regime"}
            ],
            "DE": [
                {"scope": "intl_beyond_eu", "exemptions": ["Art.9(2)"]}
            ],
            "Czechia": [
                {"scope": "regional", "exemptions": ["Art.9(1)"]}
            ]
        }"#,
    )
    .expect("matrix fixture parses");

    let exemptions = ExemptionsTable::from_json(
        r#"[
            {"country": "HR", "scope": "regional", "articlesExempt": ["19", "Art. 20(2)"], "until": "2024-12-03"}
        ]"#,
    )
    .expect("exemptions fixture parses");

    let overrides = NationalOverrides::from_json(
        r#"[
            {"country": "DK", "operator": "DSB", "product": "", "tiers": [
                {"minDelayMin": 30, "percent": 50, "payout": "cash"},
                {"minDelayMin": 60, "percent": 100, "payout": "cash"}
            ], "source": "DSB travel time guarantee"},
            {"country": "France", "operator": "SNCF", "product": "TGV INOUI G30", "tiers": [
                {"minDelayMin": 30, "percent": 25, "payout": "voucher"}
            ]},
            {"country": "FI", "operator": "VR", "product": "commuter", "scope": "commuter_exempt", "tiers": [
                {"minDelayMin": 20, "percent": 25, "payout": "cash_or_voucher"}
            ]},
            {"country": "SE", "operator": "SJ", "product": "", "scope": "long_domestic", "tiers": [
                {"minDelayMin": 60, "percent": 50},
                {"minDelayMin": 120, "percent": 100}
            ]}
        ]"#,
    )
    .expect("overrides fixture parses");

    let catalog = OperatorCatalog::from_json(
        r#"{
            "operators": [
                {"name": "DSB", "aliases": ["Danske Statsbaner"], "country": "DK", "products": ["IC", "ICL"],
                 "downgrade_rules": {"method": "tariff", "upliftRatio": 0.5},
                 "supplement_map": {"seat": {"amount": 30, "currency": "DKK"}}},
                {"name": "SNCF", "country": "FR", "products": ["TGV INOUI"],
                 "downgrade_rules": {"method": "fixed", "fixedAmount": 15, "currency": "EUR"}},
                {"name": "DB", "country": "DE", "products": ["ICE"]}
            ],
            "product_aliases": {"InterCity": "IC"}
        }"#,
    )
    .expect("catalog fixture parses");

    let forms = NationalForms::from_json(
        r#"{"defaults": {"prefer_national": false}, "countries": {"fr": {"prefer_national": true}}}"#,
    )
    .expect("forms fixture parses");

    Arc::new(RuleTables {
        matrix,
        exemptions,
        overrides,
        catalog,
        forms,
    })
}

pub(super) fn calculator() -> ClaimCalculator {
    ClaimCalculator::new(tables(), EngineConfig::default())
}

pub(super) fn service() -> ClaimService {
    ClaimService::new(tables(), EngineConfig::default())
}

pub(super) fn profile_for(journey: &JourneyInput) -> ExemptionProfile {
    ExemptionProfileBuilder::new(tables()).build(journey)
}

pub(super) fn at(raw: &str) -> NaiveDateTime {
    parse_datetime(raw).expect("fixture timestamp parses")
}

pub(super) fn request(value: Value) -> ClaimRequest {
    ClaimRequest::from_value(value).expect("fixture request parses")
}

/// Single-leg journey arriving `delay` minutes late.
pub(super) fn delayed_leg(country: &str, operator: &str, delay: i64) -> Segment {
    let scheduled = at("2025-03-10T10:00");
    Segment {
        country: country.to_string(),
        operator: operator.to_string(),
        from: "Origin".to_string(),
        to: "Destination".to_string(),
        scheduled_departure: Some(at("2025-03-10T08:00")),
        scheduled_arrival: Some(scheduled),
        actual_arrival: Some(scheduled + chrono::Duration::minutes(delay)),
        eu: true,
        ..Segment::default()
    }
}

/// Delay 125 minutes on a 100 EUR ticket with no exemptions.
pub(super) fn scenario_a() -> ClaimRequest {
    request(json!({
        "journey": {
            "country": "DE",
            "operator": "DB",
            "ticket_price_total": 100,
            "service_scope": "long_domestic",
            "segments": [{
                "country": "DE", "operator": "DB", "from": "Hamburg", "to": "Berlin",
                "scheduled_departure": "2025-03-10T08:00", "scheduled_arrival": "2025-03-10T10:00",
                "actual_arrival": "2025-03-10T12:05"
            }]
        }
    }))
}

/// Swedish regional trip under 150 km, 90 minutes late.
pub(super) fn scenario_b() -> ClaimRequest {
    request(json!({
        "journey": {
            "country": "SE",
            "operator": "Norrtag",
            "ticket_price_total": 120,
            "currency": "SEK",
            "distance_km": 120,
            "segments": [{
                "country": "SE", "operator": "Norrtag", "from": "Umea", "to": "Vannas",
                "scheduled_departure": "2025-03-10T08:00", "scheduled_arrival": "2025-03-10T09:00"
            }]
        },
        "disruption": {"delay_minutes": 90}
    }))
}

/// Return ticket without leg prices, 130 minutes late.
pub(super) fn scenario_c() -> ClaimRequest {
    request(json!({
        "journey": {
            "country": "DE",
            "operator": "DB",
            "ticket_price_total": 200,
            "return_ticket": true,
            "service_scope": "long_domestic",
            "segments": [
                {"country": "DE", "operator": "DB", "scheduled_arrival": "2025-03-10T10:00"},
                {"country": "DE", "operator": "DB", "scheduled_arrival": "2025-03-12T18:00"}
            ]
        },
        "disruption": {"delay_minutes": 130}
    }))
}

/// Refund chosen at 65 minutes.
pub(super) fn scenario_d() -> ClaimRequest {
    request(json!({
        "journey": {
            "country": "DE",
            "operator": "DB",
            "ticket_price_total": 80,
            "service_scope": "long_domestic",
            "segments": [{"country": "DE", "operator": "DB"}]
        },
        "disruption": {"delay_minutes": 65},
        "choices": {"wants_refund": true}
    }))
}
