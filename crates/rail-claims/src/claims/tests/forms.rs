use super::common::*;
use crate::claims::domain::{JourneyInput, Scope};
use crate::claims::forms::{ClaimFormSelector, FormContext, FormResolver, FORM_EU, FORM_NONE};
use crate::claims::profile::ExemptionProfile;
use crate::claims::tables::NationalOverrides;
use std::sync::Arc;

fn context<'a>(
    profile: &'a ExemptionProfile,
    country: &'a str,
    operator: &'a str,
    product: &'a str,
    delay_minutes: i64,
) -> FormContext<'a> {
    FormContext {
        profile,
        country,
        operator,
        product,
        delay_minutes,
        is_commuter: false,
        beyond_eu_flag: false,
    }
}

#[test]
fn eu_baseline_without_overrides() {
    let selector = ClaimFormSelector::new(tables());
    let profile = ExemptionProfile::baseline(Scope::LongDomestic);

    let selection = selector.select(&context(&profile, "DE", "DB", "ICE", 130));
    assert_eq!(selection.form, FORM_EU);
    assert_eq!(selection.reason, "EU baseline");
    assert!(selection.matched_override.is_none());
}

#[test]
fn national_override_routes_to_scheme_form_once_triggered() {
    let selector = ClaimFormSelector::new(tables());
    let profile = ExemptionProfile::baseline(Scope::LongDomestic);

    let selection = selector.select(&context(&profile, "DK", "DSB", "IC", 35));
    assert_eq!(selection.form, "dk_dsb_rejsetidsgaranti");
    assert_eq!(selection.reason, "National override more specific or more generous");
    assert_eq!(
        selection
            .matched_override
            .as_ref()
            .map(|record| record.operator.as_str()),
        Some("DSB")
    );

    let early = selector.select(&context(&profile, "DK", "DSB", "IC", 20));
    assert_eq!(early.form, FORM_EU);
}

#[test]
fn french_g30_product_maps_to_its_form() {
    let selector = ClaimFormSelector::new(tables());
    let profile = ExemptionProfile::baseline(Scope::LongDomestic);

    let selection = selector.select(&context(&profile, "FR", "SNCF", "TGV INOUI G30", 45));
    assert_eq!(selection.form, "fr_sncf_g30");
}

#[test]
fn exempt_scope_without_override_has_no_form() {
    let selector = ClaimFormSelector::new(tables());
    let profile = profile_for(&scenario_b().journey);

    let selection = selector.select(&context(&profile, "SE", "Norrtag", "", 90));
    assert_eq!(selection.form, FORM_NONE);
    assert_eq!(selection.reason, "Art. 19 exempt (no national form found)");
}

#[test]
fn blocked_scope_has_no_form_without_override() {
    let selector = ClaimFormSelector::new(tables());
    let journey = JourneyInput {
        segments: vec![delayed_leg("PL", "Polregio", 90)],
        ..JourneyInput::default()
    };
    let profile = profile_for(&journey);

    let selection = selector.select(&context(&profile, "PL", "Polregio", "", 90));
    assert_eq!(selection.form, FORM_NONE);
    assert_eq!(selection.reason, "Scope blocked (no national form found)");
    assert_eq!(
        selection.notes,
        vec!["EU-flow disabled for PL/regional (blocked).".to_string()]
    );
}

#[test]
fn blocked_scope_override_without_national_form_notes_the_eu_fallback() {
    let mut custom = (*tables()).clone();
    custom.overrides = NationalOverrides::from_json(
        r#"[{"country": "PL", "operator": "Polregio", "product": "", "tiers": [
            {"minDelayMin": 60, "percent": 25, "payout": "cash"}
        ]}]"#,
    )
    .expect("override fixture parses");
    let selector = ClaimFormSelector::new(Arc::new(custom));
    let journey = JourneyInput {
        segments: vec![delayed_leg("PL", "Polregio", 90)],
        ..JourneyInput::default()
    };
    let profile = profile_for(&journey);

    let selection = selector.select(&context(&profile, "PL", "Polregio", "", 90));
    assert_eq!(selection.form, FORM_EU);
    assert_eq!(selection.reason, "Scope blocked: national override applies");
    assert_eq!(selection.notes.len(), 2);
    assert_eq!(
        selection.notes[1],
        "No national form mapped for the PL Polregio override; EU standard form used for filing."
    );
}

#[test]
fn finnish_commuter_goes_to_the_commuter_form() {
    let selector = ClaimFormSelector::new(tables());
    let profile = ExemptionProfile::baseline(Scope::Regional);
    let mut context = context(&profile, "FI", "VR", "commuter", 25);
    context.is_commuter = true;

    let selection = selector.select(&context);
    assert_eq!(selection.form, "fi_vr_commuter");
    assert_eq!(selection.reason, "Art. 19 exempt: national override applies");
}

#[test]
fn resolver_prefers_national_only_with_a_template() {
    let resolver = FormResolver::new(tables());

    let france = resolver.decide("France");
    assert_eq!(france.form, FORM_EU);
    assert_eq!(
        france.reason,
        "FR prefers national; no local template found, fallback EU."
    );
    assert_eq!(
        france.national.as_ref().map(|national| national.country.as_str()),
        Some("FR")
    );

    let germany = resolver.decide("de");
    assert_eq!(germany.reason, "DE marked EU-level; EU standard applies.");
    assert!(germany.national.is_none());

    assert_eq!(
        resolver.decide("").reason,
        "No country provided; defaulting to EU form."
    );
}
