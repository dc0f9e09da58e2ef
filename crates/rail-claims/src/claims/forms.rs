use std::sync::Arc;

use serde::Serialize;

use super::domain::Clause;
use super::profile::ExemptionProfile;
use super::tables::{countries, OverrideContext, OverrideQuery, OverrideRecord, RuleTables};

pub const FORM_EU: &str = "eu_standard_claim";
pub const FORM_NONE: &str = "none";
pub const FORM_NATIONAL: &str = "national_claim";

const FORM_SNCF_G30: &str = "fr_sncf_g30";
const FORM_RENFE_PUNCTUALITY: &str = "es_renfe_punctuality";
const FORM_TRENITALIA_FRECCE: &str = "it_trenitalia_frecce_bonus";
const FORM_NS_DELAY: &str = "nl_ns_delay";
const FORM_DSB_GUARANTEE: &str = "dk_dsb_rejsetidsgaranti";
const FORM_SJ_LAW: &str = "se_sj_law";
const FORM_VR_COMMUTER: &str = "fi_vr_commuter";

/// Journey facts the form routing depends on.
#[derive(Debug, Clone, Copy)]
pub struct FormContext<'a> {
    pub profile: &'a ExemptionProfile,
    pub country: &'a str,
    pub operator: &'a str,
    pub product: &'a str,
    pub delay_minutes: i64,
    pub is_commuter: bool,
    pub beyond_eu_flag: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSelection {
    pub form: &'static str,
    pub reason: String,
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_override: Option<OverrideRecord>,
}

/// Routes a claim to the EU standard form, a national scheme form, or none.
#[derive(Debug, Clone)]
pub struct ClaimFormSelector {
    tables: Arc<RuleTables>,
}

impl ClaimFormSelector {
    pub fn new(tables: Arc<RuleTables>) -> Self {
        Self { tables }
    }

    pub fn select(&self, context: &FormContext<'_>) -> FormSelection {
        let mut notes = Vec::new();
        let scope = context.profile.scope();
        let country = context.country;
        let delay = context.delay_minutes;

        if context.profile.is_blocked() || self.tables.matrix.is_blocked(country, scope) {
            notes.push(format!("EU-flow disabled for {country}/{scope} (blocked)."));
            return match self.applicable_override(context) {
                Some(record) => exempt_override(record, "Scope blocked: national override applies", notes),
                None => FormSelection {
                    form: FORM_NONE,
                    reason: "Scope blocked (no national form found)".to_string(),
                    notes,
                    matched_override: None,
                },
            };
        }

        if self.art19_exempt(context) {
            notes.push("Art. 19 exempt in this context: EU compensation not available.".to_string());
            return match self.applicable_override(context) {
                Some(record) => {
                    exempt_override(record, "Art. 19 exempt: national override applies", notes)
                }
                None => FormSelection {
                    form: FORM_NONE,
                    reason: "Art. 19 exempt (no national form found)".to_string(),
                    notes,
                    matched_override: None,
                },
            };
        }

        if let Some(record) = self.applicable_override(context) {
            notes.push(format!(
                "National/operator override is applicable at {delay} min."
            ));
            return FormSelection {
                form: form_for_override(record),
                reason: "National override more specific or more generous".to_string(),
                notes,
                matched_override: Some(record.clone()),
            };
        }

        notes.push("EU baseline applies (25% from 60 min, 50% from 120 min).".to_string());
        FormSelection {
            form: FORM_EU,
            reason: "EU baseline".to_string(),
            notes,
            matched_override: None,
        }
    }

    /// Finnish commuter services are outside Art. 19 even when the matrix is silent.
    fn art19_exempt(&self, context: &FormContext<'_>) -> bool {
        context.profile.is_exempt(Clause::Art19)
            || (context.is_commuter && countries::same_country(context.country, "FI"))
    }

    /// Override admitted by its scope gate and reached by the delay.
    fn applicable_override(&self, context: &FormContext<'_>) -> Option<&OverrideRecord> {
        let query = OverrideQuery {
            country: context.country,
            operator: context.operator,
            product: context.product,
        };
        let gate = OverrideContext {
            scope: context.profile.scope(),
            is_commuter: context.is_commuter,
            beyond_eu_flag: context.beyond_eu_flag,
        };
        self.tables
            .overrides
            .find_one(&query)
            .filter(|record| record.scope_matches(&gate))
            .filter(|record| record.triggers_at(context.delay_minutes))
    }
}

/// Override routing on a path where the EU flow is off.
fn exempt_override(record: &OverrideRecord, reason: &str, mut notes: Vec<String>) -> FormSelection {
    let form = form_for_override(record);
    if form == FORM_EU {
        notes.push(format!(
            "No national form mapped for the {} {} override; EU standard form used for filing.",
            record.country, record.operator
        ));
    }
    FormSelection {
        form,
        reason: reason.to_string(),
        notes,
        matched_override: Some(record.clone()),
    }
}

fn form_for_override(record: &OverrideRecord) -> &'static str {
    let country = countries::to_iso(&record.country)
        .and_then(|iso| countries::name_for(&iso))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| record.country.to_ascii_lowercase());
    let product = record.product.to_ascii_lowercase();
    let scope = record
        .scope
        .as_deref()
        .unwrap_or_default()
        .to_ascii_lowercase();

    match country.as_str() {
        "france" if product.contains("g30") => FORM_SNCF_G30,
        "spain" if product.contains("ave") || product.contains("avlo") => FORM_RENFE_PUNCTUALITY,
        "italy" if product.contains("frecce") => FORM_TRENITALIA_FRECCE,
        "netherlands" => FORM_NS_DELAY,
        "denmark" => FORM_DSB_GUARANTEE,
        "sweden" => FORM_SJ_LAW,
        "finland" if scope.contains("commuter") => FORM_VR_COMMUTER,
        _ => FORM_EU,
    }
}

/// National template preference lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NationalTemplate {
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormDecision {
    pub form: &'static str,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national: Option<NationalTemplate>,
}

/// Picks between the EU form and a national template based on the forms table.
#[derive(Debug, Clone)]
pub struct FormResolver {
    tables: Arc<RuleTables>,
}

impl FormResolver {
    pub fn new(tables: Arc<RuleTables>) -> Self {
        Self { tables }
    }

    pub fn decide(&self, country: &str) -> FormDecision {
        let Some(iso) = countries::to_iso(country) else {
            return FormDecision {
                form: FORM_EU,
                reason: "No country provided; defaulting to EU form.".to_string(),
                national: None,
            };
        };

        let forms = &self.tables.forms;
        if !forms.prefers_national(&iso) {
            return FormDecision {
                form: FORM_EU,
                reason: format!("{iso} marked EU-level; EU standard applies."),
                national: None,
            };
        }

        match forms.template_for(&iso) {
            Some(path) => FormDecision {
                form: FORM_NATIONAL,
                reason: format!("{iso} prefers national; template found."),
                national: Some(NationalTemplate {
                    country: iso.clone(),
                    path: Some(path.to_string()),
                }),
            },
            None => FormDecision {
                form: FORM_EU,
                reason: format!("{iso} prefers national; no local template found, fallback EU."),
                national: Some(NationalTemplate {
                    country: iso.clone(),
                    path: None,
                }),
            },
        }
    }
}
