//! Per-journey exemption profile.
//!
//! The builder classifies the journey scope once, folds the exemption matrix and
//! dated exemption notices for every country the journey touches into clause
//! flags, then runs the jurisdiction gates. The resulting profile is immutable.

pub mod gates;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::domain::{Clause, JourneyInput, Scope, SubClause};
use super::providers::{DistanceEstimator, Lookup};
use super::tables::RuleTables;
use gates::{GateInput, GATES};

/// Which baseline clauses apply to one journey, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExemptionProfile {
    scope: Scope,
    blocked: bool,
    articles: BTreeMap<Clause, bool>,
    articles_sub: BTreeMap<SubClause, bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    distance_km: Option<f64>,
    notes: Vec<String>,
    ui_banners: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    unresolved: Vec<String>,
}

impl ExemptionProfile {
    /// Every clause applicable, nothing blocked.
    pub fn baseline(scope: Scope) -> Self {
        Self {
            scope,
            blocked: false,
            articles: Clause::ALL.iter().map(|clause| (*clause, true)).collect(),
            articles_sub: SubClause::ALL.iter().map(|sub| (*sub, true)).collect(),
            distance_km: None,
            notes: Vec::new(),
            ui_banners: Vec::new(),
            unresolved: Vec::new(),
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn applies(&self, clause: Clause) -> bool {
        self.articles.get(&clause).copied().unwrap_or(true)
    }

    pub fn is_exempt(&self, clause: Clause) -> bool {
        !self.applies(clause)
    }

    pub fn sub_applies(&self, sub: SubClause) -> bool {
        self.articles_sub.get(&sub).copied().unwrap_or(true)
    }

    pub fn distance_km(&self) -> Option<f64> {
        self.distance_km
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn banners(&self) -> &[String] {
        &self.ui_banners
    }

    /// Journey facts a gate could not decide on.
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }

    /// Identifiers of exempted clauses, in clause order.
    pub fn exemption_ids(&self) -> Vec<&'static str> {
        self.articles
            .iter()
            .filter(|(_, applies)| !**applies)
            .map(|(clause, _)| clause.id())
            .collect()
    }

    fn set(&mut self, clause: Clause, applies: bool) {
        self.articles.insert(clause, applies);
    }

    fn note(&mut self, note: impl Into<String>) {
        let note = note.into();
        if !note.is_empty() && !self.notes.contains(&note) {
            self.notes.push(note);
        }
    }

    fn banner(&mut self, banner: impl Into<String>) {
        let banner = banner.into();
        if !self.ui_banners.contains(&banner) {
            self.ui_banners.push(banner);
        }
    }
}

/// Banner text shown when a clause is exempted.
fn banner_for(clause: Clause) -> Option<&'static str> {
    match clause {
        Clause::Art9 => Some("Art. 9: pre-contract travel information duties are exempted."),
        Clause::Art10 => Some("Art. 10: real-time travel information duties are exempted."),
        Clause::Art12 => Some("Art. 12: through-ticket liability is exempted."),
        Clause::Art18p3 => Some("Art. 18(3): self-arranged rerouting is not reimbursed."),
        Clause::Art19 => Some("Art. 19: EU delay compensation does not apply."),
        Clause::Art20p2 => Some("Art. 20(2): meals, hotel and transport assistance are exempted."),
        Clause::Art17 | Clause::Art30p2 => None,
    }
}

/// Scope from the explicit value, else from flags (beyond EU > inside EU > long domestic).
pub fn classify_scope(journey: &JourneyInput) -> Scope {
    if let Some(scope) = journey.service_scope {
        return scope;
    }
    if journey.is_international_beyond_eu {
        Scope::IntlBeyondEu
    } else if journey.is_international_inside_eu {
        Scope::IntlInsideEu
    } else if journey.is_long_domestic {
        Scope::LongDomestic
    } else {
        Scope::Regional
    }
}

/// Builds [`ExemptionProfile`]s against shared tables.
#[derive(Clone)]
pub struct ExemptionProfileBuilder {
    tables: Arc<RuleTables>,
    distance: Option<Arc<dyn DistanceEstimator>>,
}

impl ExemptionProfileBuilder {
    pub fn new(tables: Arc<RuleTables>) -> Self {
        Self {
            tables,
            distance: None,
        }
    }

    pub fn with_distance_estimator(mut self, estimator: Arc<dyn DistanceEstimator>) -> Self {
        self.distance = Some(estimator);
        self
    }

    pub fn build(&self, journey: &JourneyInput) -> ExemptionProfile {
        let scope = classify_scope(journey);
        let mut profile = ExemptionProfile::baseline(scope);

        let route = journey.segment_countries();
        let mut countries: Vec<String> = Vec::new();
        for country in &route {
            if !countries.contains(country) {
                countries.push(country.clone());
            }
        }
        if countries.is_empty() && !journey.country.trim().is_empty() {
            countries.push(journey.country.trim().to_ascii_uppercase());
        }

        let travel_date = journey.travel_date();
        for country in &countries {
            for row in self.tables.matrix.find(country, scope) {
                if row.blocked {
                    profile.blocked = true;
                    profile.set(Clause::Art19, false);
                    if country == "PL" && scope == Scope::Regional {
                        profile.set(Clause::Art20p2, false);
                    }
                    let mut note = format!("{country} {scope}: EU-flow disabled (blocked)");
                    if let Some(reason) = row.reason.as_deref().filter(|r| !r.trim().is_empty()) {
                        note.push_str(&format!(": {}", reason.trim()));
                    }
                    profile.note(note);
                }
                for label in &row.exemptions {
                    apply_label(&mut profile, label);
                }
                for note in &row.notes {
                    profile.note(format!("{country} {scope}: {note}"));
                }
            }

            for row in self.tables.exemptions.find(country, scope, travel_date) {
                let labels = row.article_labels();
                for label in &labels {
                    apply_label(&mut profile, label);
                }
                if !labels.is_empty() {
                    let until = row
                        .until
                        .map(|date| format!(" until {date}"))
                        .unwrap_or_default();
                    profile.note(format!(
                        "{country} {scope}: national exemption for {}{until}",
                        labels.join(", ")
                    ));
                }
            }
        }

        let distance_km = self.distance_km(journey);
        profile.distance_km = distance_km;

        let input = GateInput {
            journey,
            scope,
            countries: &countries,
            route: &route,
            distance_km,
        };
        for gate in GATES.iter().filter(|gate| gate.applies_to(&input)) {
            let Some(effect) = (gate.decide)(&input) else {
                continue;
            };
            debug!(gate = gate.name, ?effect.enable, ?effect.disable, "jurisdiction gate applied");
            // A lifted compensation exemption does not lift a block.
            for clause in effect.enable {
                if !(profile.blocked && clause == Clause::Art19) {
                    profile.set(clause, true);
                }
            }
            for clause in effect.disable {
                profile.set(clause, false);
            }
            profile.note(effect.note);
            if let Some(banner) = effect.banner {
                profile.banner(banner);
            }
            for field in effect.missing {
                if !profile.unresolved.iter().any(|known| known == field) {
                    profile.unresolved.push(field.to_string());
                }
            }
        }

        let exempt_subs: Vec<SubClause> = SubClause::ALL
            .iter()
            .copied()
            .filter(|sub| !profile.sub_applies(*sub))
            .collect();
        if exempt_subs.len() == SubClause::ALL.len() {
            profile.set(Clause::Art9, false);
        } else if !exempt_subs.is_empty() {
            let parts: Vec<&str> = exempt_subs.iter().map(|sub| sub.short()).collect();
            profile.note(format!("Art. 9 partially exempt: {}", parts.join(", ")));
        }

        for clause in Clause::ALL {
            if profile.is_exempt(clause) {
                if let Some(banner) = banner_for(clause) {
                    profile.banner(banner);
                }
            }
        }

        profile
    }

    /// Journey distance, else the sum of leg distances, else the estimator.
    fn distance_km(&self, journey: &JourneyInput) -> Option<f64> {
        if let Some(km) = journey.distance_km {
            return Some(km);
        }

        let known: Vec<f64> = journey
            .segments
            .iter()
            .filter_map(|segment| segment.distance_km)
            .collect();
        if !known.is_empty() {
            return Some(known.iter().sum());
        }

        let estimator = self.distance.as_ref()?;
        let mut total = 0.0;
        let mut found = false;
        for segment in &journey.segments {
            if segment.from.is_empty() || segment.to.is_empty() {
                continue;
            }
            let lookup = Lookup::from_result(estimator.km(&segment.from, &segment.to), "distance");
            if let Some(km) = lookup.value() {
                total += km;
                found = true;
            }
        }
        found.then_some(total)
    }
}

fn apply_label(profile: &mut ExemptionProfile, label: &str) {
    if let Some(clause) = Clause::from_label(label) {
        profile.set(clause, false);
    } else if let Some(sub) = SubClause::from_label(label) {
        profile.articles_sub.insert(sub, false);
    }
}
