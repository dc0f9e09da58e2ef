use std::path::{Path, PathBuf};
use std::sync::Arc;

use rail_claims::claims::domain::Clause;
use rail_claims::claims::scenario::load_scenarios;
use rail_claims::claims::tables::PayoutMode;
use rail_claims::claims::{ClaimRequest, ClaimService, EligibilitySource, RuleTables, ScenarioRunner};
use rail_claims::config::EngineConfig;
use serde_json::json;

fn data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data")
}

fn service() -> ClaimService {
    ClaimService::new(Arc::new(RuleTables::load(&data_dir())), EngineConfig::default())
}

fn request(value: serde_json::Value) -> ClaimRequest {
    ClaimRequest::from_value(value).expect("request parses")
}

#[test]
fn bundled_scenarios_match_their_expectations() {
    let scenarios = load_scenarios(&data_dir().join("scenarios.json")).expect("fixtures load");
    assert_eq!(scenarios.len(), 4);

    let service = service();
    let outcomes = ScenarioRunner::new(&service)
        .run_all(&scenarios)
        .expect("scenarios run");
    for outcome in &outcomes {
        assert!(outcome.passed(), "{}: {:?}", outcome.name, outcome.failures);
    }
}

#[test]
fn operator_guarantee_outbids_the_eu_baseline() {
    let report = service().compute(&request(json!({
        "journey": {
            "country": "DK",
            "operator": "DSB",
            "currency": "DKK",
            "ticket_price_total": 300,
            "segments": [{
                "country": "DK", "operator": "DSB", "from": "Aarhus H", "to": "Kobenhavn H",
                "scheduled_departure": "2025-03-10T07:00", "scheduled_arrival": "2025-03-10T10:00",
                "actual_arrival": "2025-03-10T11:05"
            }]
        }
    })));

    assert_eq!(report.eligibility.source, EligibilitySource::Override);
    assert_eq!(report.eligibility.percent, 100);
    assert_eq!(report.eligibility.payout, Some(PayoutMode::Cash));
    assert_eq!(report.result.breakdown.compensation.amount, 300.0);
    assert_eq!(report.result.totals.net_to_client, 225.0);
    assert!(report.result.totals.eur_equivalent.is_some());
    assert_eq!(report.form.form, "dk_dsb_rejsetidsgaranti");
}

#[test]
fn expired_national_exemption_restores_compensation() {
    let journey = |date: &str| {
        request(json!({
            "journey": {
                "country": "HR",
                "operator": "HZPP",
                "service_scope": "regional",
                "ticket_price_total": 20,
                "segments": [{"country": "HR", "operator": "HZPP", "scheduled_departure": date}]
            },
            "disruption": {"delay_minutes": 130}
        }))
    };
    let service = service();

    let during = service.compute(&journey("2024-06-01T08:00"));
    assert!(!during.profile.applies(Clause::Art19));
    assert_eq!(during.result.breakdown.compensation.amount, 0.0);
    assert_eq!(during.form.form, "none");

    let after = service.compute(&journey("2025-06-01T08:00"));
    assert!(after.profile.applies(Clause::Art19));
    assert_eq!(after.result.breakdown.compensation.amount, 10.0);
}

#[test]
fn blocked_regional_scope_yields_no_claim_form() {
    let report = service().compute(&request(json!({
        "journey": {
            "country": "PL",
            "operator": "Polregio",
            "service_scope": "regional",
            "ticket_price_total": 40,
            "segments": [{"country": "PL", "operator": "Polregio"}]
        },
        "disruption": {"delay_minutes": 150}
    })));

    assert!(report.profile.is_blocked());
    assert_eq!(report.eligibility.source, EligibilitySource::Denied);
    assert_eq!(report.result.totals.gross_claim, 0.0);
    assert_eq!(report.form.form, "none");
}

#[test]
fn computation_is_deterministic_across_runs() {
    let service = service();
    let request = request(json!({
        "journey": {
            "country": "FR",
            "operator": "SNCF",
            "product": "TGV INOUI G30",
            "service_scope": "long_domestic",
            "ticket_price_total": 89,
            "segments": [{
                "country": "FR", "operator": "SNCF", "fare_class_purchased": "1st", "class_delivered": "lower",
                "price": 89, "downgrade_share": 1.0,
                "scheduled_departure": "2025-03-10T09:00", "scheduled_arrival": "2025-03-10T12:00",
                "actual_arrival": "2025-03-10T12:40"
            }]
        },
        "expenses": {"meals": 12.5}
    }));

    let first = serde_json::to_string(&service.compute(&request)).expect("report serializes");
    let second = serde_json::to_string(&service.compute(&request)).expect("report serializes");
    assert_eq!(first, second);
}
