use super::common::*;
use crate::claims::domain::{Answer, Clause, JourneyInput, Scope, SubClause};
use crate::claims::profile::{classify_scope, ExemptionProfileBuilder};
use crate::claims::providers::{DistanceEstimator, ProviderError, StationDistance};
use std::sync::Arc;

fn swedish_regional(distance_km: Option<f64>) -> JourneyInput {
    JourneyInput {
        country: "SE".to_string(),
        distance_km,
        segments: vec![delayed_leg("SE", "Norrtag", 70)],
        ..JourneyInput::default()
    }
}

#[test]
fn scope_prefers_explicit_value_then_flags() {
    let mut journey = JourneyInput {
        is_long_domestic: true,
        is_international_inside_eu: true,
        ..JourneyInput::default()
    };
    assert_eq!(classify_scope(&journey), Scope::IntlInsideEu);

    journey.is_international_beyond_eu = true;
    assert_eq!(classify_scope(&journey), Scope::IntlBeyondEu);

    journey.service_scope = Some(Scope::Regional);
    assert_eq!(classify_scope(&journey), Scope::Regional);

    assert_eq!(classify_scope(&JourneyInput::default()), Scope::Regional);
}

#[test]
fn swedish_regional_exemptions_hold_under_150_km() {
    let profile = profile_for(&swedish_regional(Some(120.0)));

    assert_eq!(profile.scope(), Scope::Regional);
    assert!(profile.is_exempt(Clause::Art19));
    assert!(profile.is_exempt(Clause::Art17));
    assert!(profile.is_exempt(Clause::Art20p2));
    assert!(profile.applies(Clause::Art18p3));
    assert_eq!(profile.distance_km(), Some(120.0));
    assert!(profile
        .banners()
        .iter()
        .any(|banner| banner.starts_with("Art. 19:")));
}

#[test]
fn swedish_regional_exemptions_lift_from_150_km() {
    let profile = profile_for(&swedish_regional(Some(150.0)));

    assert!(profile.applies(Clause::Art19));
    assert!(profile.applies(Clause::Art17));
    assert!(profile.applies(Clause::Art20p2));
    assert!(profile.exemption_ids().is_empty());
    assert!(profile
        .notes()
        .iter()
        .any(|note| note == "SE regional: 150 km or more, Art. 17, 19 and 20(2) apply"));
}

#[test]
fn unknown_swedish_distance_keeps_matrix_exemptions() {
    let mut journey = swedish_regional(None);
    let profile = profile_for(&journey);
    assert!(profile.is_exempt(Clause::Art19));
    assert!(profile
        .notes()
        .iter()
        .any(|note| note.contains("distance unknown")));

    journey.under_distance_threshold = Answer::No;
    assert!(profile_for(&journey).applies(Clause::Art19));
}

#[test]
fn leg_distances_are_summed_before_asking_the_estimator() {
    let mut journey = swedish_regional(None);
    journey.segments[0].distance_km = Some(90.0);
    let mut second = delayed_leg("SE", "Norrtag", 0);
    second.distance_km = Some(80.0);
    journey.segments.push(second);

    let profile = profile_for(&journey);
    assert_eq!(profile.distance_km(), Some(170.0));
    assert!(profile.applies(Clause::Art19));
}

#[test]
fn estimator_supplies_missing_distance() {
    let mut journey = swedish_regional(None);
    journey.segments[0].from = "Stockholm".to_string();
    journey.segments[0].to = "Uppsala".to_string();

    let estimator = StationDistance::with_stations([
        ("Stockholm", (59.3303, 18.0586)),
        ("Uppsala", (59.8586, 17.6389)),
    ]);
    let profile = ExemptionProfileBuilder::new(tables())
        .with_distance_estimator(Arc::new(estimator))
        .build(&journey);

    let km = profile.distance_km().expect("estimated distance");
    assert!(km > 55.0 && km < 75.0, "unexpected distance {km}");
    assert!(profile.is_exempt(Clause::Art19));
}

struct OfflineEstimator;

impl DistanceEstimator for OfflineEstimator {
    fn km(&self, _from: &str, _to: &str) -> Result<Option<f64>, ProviderError> {
        Err(ProviderError::Unavailable("routing backend down".to_string()))
    }
}

#[test]
fn failing_estimator_degrades_to_unknown_distance() {
    let profile = ExemptionProfileBuilder::new(tables())
        .with_distance_estimator(Arc::new(OfflineEstimator))
        .build(&swedish_regional(None));

    assert_eq!(profile.distance_km(), None);
    assert!(profile.is_exempt(Clause::Art19));
}

#[test]
fn blocked_polish_regional_disables_compensation_and_assistance() {
    let journey = JourneyInput {
        segments: vec![delayed_leg("PL", "Polregio", 90)],
        ..JourneyInput::default()
    };
    let profile = profile_for(&journey);

    assert!(profile.is_blocked());
    assert!(profile.is_exempt(Clause::Art19));
    assert!(profile.is_exempt(Clause::Art20p2));
    assert!(profile
        .notes()
        .iter()
        .any(|note| note == "PL regional: EU-flow disabled (blocked): national regime"));
}

#[test]
fn partial_article_nine_exemption_is_noted_not_applied_wholesale() {
    let journey = JourneyInput {
        service_scope: Some(Scope::IntlBeyondEu),
        segments: vec![delayed_leg("DE", "DB", 0)],
        ..JourneyInput::default()
    };
    let profile = profile_for(&journey);

    assert!(!profile.sub_applies(SubClause::Art9p2));
    assert!(profile.sub_applies(SubClause::Art9p1));
    assert!(profile.applies(Clause::Art9));
    assert!(profile
        .notes()
        .iter()
        .any(|note| note == "Art. 9 partially exempt: 9(2)"));
}

#[test]
fn dated_exemptions_expire_after_their_end_date() {
    let mut journey = JourneyInput {
        segments: vec![delayed_leg("HR", "HZPP", 90)],
        ..JourneyInput::default()
    };
    journey.segments[0].scheduled_departure = Some(at("2024-11-20T07:00"));
    let before = profile_for(&journey);
    assert!(before.is_exempt(Clause::Art19));
    assert!(before.is_exempt(Clause::Art20p2));

    journey.segments[0].scheduled_departure = Some(at("2025-01-15T07:00"));
    let after = profile_for(&journey);
    assert!(after.applies(Clause::Art19));
    assert!(after.applies(Clause::Art20p2));
}

#[test]
fn finnish_services_to_russia_lose_through_ticket_rights() {
    let journey = JourneyInput {
        is_international_beyond_eu: true,
        segments: vec![delayed_leg("FI", "VR", 0), delayed_leg("RU", "RZD", 0)],
        ..JourneyInput::default()
    };
    let profile = profile_for(&journey);

    assert!(profile.is_exempt(Clause::Art12));
    assert!(profile.is_exempt(Clause::Art18p3));
    assert!(profile.applies(Clause::Art19));
    assert!(profile
        .banners()
        .iter()
        .any(|banner| banner.starts_with("Services to Russia or Belarus")));
}

#[test]
fn profile_without_tables_is_the_baseline() {
    let journey = swedish_regional(Some(20.0));
    let profile = ExemptionProfileBuilder::new(Arc::new(Default::default())).build(&journey);
    assert!(profile.exemption_ids().is_empty());
    assert!(!profile.is_blocked());
}

fn czech_route(countries: &[&str]) -> JourneyInput {
    JourneyInput {
        service_scope: Some(Scope::IntlBeyondEu),
        segments: countries
            .iter()
            .map(|country| delayed_leg(country, "CD", 0))
            .collect(),
        ..JourneyInput::default()
    }
}

#[test]
fn czech_route_returning_to_the_eu_keeps_through_ticket_rights() {
    let profile = profile_for(&czech_route(&["CZ", "HU", "RS", "HU"]));

    assert!(profile.applies(Clause::Art12));
    assert!(profile.applies(Clause::Art18p3));
    assert!(!profile
        .notes()
        .iter()
        .any(|note| note.starts_with("CZ beyond EU")));
}

#[test]
fn czech_route_ending_outside_the_eu_loses_through_ticket_rights() {
    let profile = profile_for(&czech_route(&["CZ", "HU", "RS"]));
    assert!(profile.is_exempt(Clause::Art12));
    assert!(profile.is_exempt(Clause::Art18p3));

    let starting_outside = profile_for(&czech_route(&["UA", "PL", "CZ"]));
    assert!(starting_outside.is_exempt(Clause::Art12));

    let to_switzerland = profile_for(&czech_route(&["CZ", "DE", "CH"]));
    assert!(to_switzerland.applies(Clause::Art12));
}
