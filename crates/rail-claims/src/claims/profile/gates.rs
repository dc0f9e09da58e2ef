use crate::claims::domain::{Answer, Clause, JourneyInput, Scope};
use crate::claims::tables::countries;

pub(crate) const SE_REGIONAL_DISTANCE_KM: f64 = 150.0;

/// Facts a gate decides on.
pub struct GateInput<'a> {
    pub journey: &'a JourneyInput,
    pub scope: Scope,
    /// Distinct countries touched, in first-seen order.
    pub countries: &'a [String],
    /// Country of every segment in travel order, repeats kept.
    pub route: &'a [String],
    pub distance_km: Option<f64>,
}

/// Clause changes requested by a gate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GateEffect {
    pub enable: Vec<Clause>,
    pub disable: Vec<Clause>,
    pub note: String,
    pub banner: Option<String>,
    /// Facts the gate needed but could not resolve.
    pub missing: Vec<&'static str>,
}

/// Country-specific rule applied after the matrix.
pub struct JurisdictionGate {
    pub name: &'static str,
    pub country: &'static str,
    pub scope: Scope,
    pub decide: fn(&GateInput<'_>) -> Option<GateEffect>,
}

impl JurisdictionGate {
    pub fn applies_to(&self, input: &GateInput<'_>) -> bool {
        input.scope == self.scope && input.countries.iter().any(|cc| cc == self.country)
    }
}

pub static GATES: [JurisdictionGate; 3] = [
    JurisdictionGate {
        name: "se_regional_distance",
        country: "SE",
        scope: Scope::Regional,
        decide: se_regional_distance,
    },
    JurisdictionGate {
        name: "fi_russia_belarus",
        country: "FI",
        scope: Scope::IntlBeyondEu,
        decide: fi_russia_belarus,
    },
    JurisdictionGate {
        name: "cz_third_country_terminal",
        country: "CZ",
        scope: Scope::IntlBeyondEu,
        decide: cz_third_country_terminal,
    },
];

/// Swedish regional exemptions only cover journeys under 150 km.
fn se_regional_distance(input: &GateInput<'_>) -> Option<GateEffect> {
    let under = match input.distance_km {
        Some(km) => km < SE_REGIONAL_DISTANCE_KM,
        None => match input.journey.under_distance_threshold {
            Answer::Yes => true,
            Answer::No => false,
            Answer::Partial | Answer::Unknown => {
                return Some(GateEffect {
                    note: "SE regional: distance unknown, matrix exemptions kept".to_string(),
                    missing: vec!["distance_km"],
                    ..GateEffect::default()
                })
            }
        },
    };

    if under {
        let note = match input.distance_km {
            Some(km) => format!("SE regional: {km:.0} km is under 150 km, exemptions apply"),
            None => "SE regional: reported under 150 km, exemptions apply".to_string(),
        };
        return Some(GateEffect {
            note,
            ..GateEffect::default()
        });
    }

    Some(GateEffect {
        enable: vec![Clause::Art19, Clause::Art17, Clause::Art20p2],
        note: "SE regional: 150 km or more, Art. 17, 19 and 20(2) apply".to_string(),
        ..GateEffect::default()
    })
}

fn fi_russia_belarus(input: &GateInput<'_>) -> Option<GateEffect> {
    let involved = input
        .countries
        .iter()
        .any(|cc| cc == "RU" || cc == "BY");
    involved.then(|| GateEffect {
        disable: vec![Clause::Art12, Clause::Art18p3],
        note: "FI beyond EU (RU/BY): Art. 12 and Art. 18(3) exempted".to_string(),
        banner: Some(
            "Services to Russia or Belarus: through-ticket and alternative rerouting rights do not apply."
                .to_string(),
        ),
        ..GateEffect::default()
    })
}

fn cz_third_country_terminal(input: &GateInput<'_>) -> Option<GateEffect> {
    let third_country = |cc: &String| cc != "CH" && !countries::is_eu(cc);
    let route = if input.route.is_empty() {
        input.countries
    } else {
        input.route
    };
    let terminal =
        route.first().is_some_and(third_country) || route.last().is_some_and(third_country);
    terminal.then(|| GateEffect {
        disable: vec![Clause::Art12, Clause::Art18p3],
        note: "CZ beyond EU with a third-country terminal: Art. 12 and Art. 18(3) exempted"
            .to_string(),
        ..GateEffect::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(
        journey: &'a JourneyInput,
        scope: Scope,
        countries: &'a [String],
        distance_km: Option<f64>,
    ) -> GateInput<'a> {
        GateInput {
            journey,
            scope,
            countries,
            route: countries,
            distance_km,
        }
    }

    #[test]
    fn se_gate_reenables_clauses_at_or_over_threshold() {
        let journey = JourneyInput::default();
        let countries = vec!["SE".to_string()];
        let effect = se_regional_distance(&input(&journey, Scope::Regional, &countries, Some(150.0)))
            .expect("gate decides");
        assert_eq!(
            effect.enable,
            vec![Clause::Art19, Clause::Art17, Clause::Art20p2]
        );

        let effect = se_regional_distance(&input(&journey, Scope::Regional, &countries, Some(149.9)))
            .expect("gate decides");
        assert!(effect.enable.is_empty());
    }

    #[test]
    fn se_gate_uses_hint_when_distance_missing() {
        let journey = JourneyInput {
            under_distance_threshold: Answer::No,
            ..JourneyInput::default()
        };
        let countries = vec!["SE".to_string()];
        let effect = se_regional_distance(&input(&journey, Scope::Regional, &countries, None))
            .expect("gate decides");
        assert_eq!(effect.enable.len(), 3);
    }

    #[test]
    fn cz_gate_exempts_switzerland() {
        let journey = JourneyInput::default();
        let to_swiss = vec!["CZ".to_string(), "CH".to_string()];
        assert!(cz_third_country_terminal(&input(
            &journey,
            Scope::IntlBeyondEu,
            &to_swiss,
            None
        ))
        .is_none());

        let to_ukraine = vec!["CZ".to_string(), "UA".to_string()];
        let effect = cz_third_country_terminal(&input(
            &journey,
            Scope::IntlBeyondEu,
            &to_ukraine,
            None,
        ))
        .expect("third-country terminal");
        assert_eq!(effect.disable, vec![Clause::Art12, Clause::Art18p3]);
    }

    #[test]
    fn cz_gate_reads_terminals_from_the_route() {
        let journey = JourneyInput::default();
        let countries: Vec<String> = ["CZ", "HU", "RS"].iter().map(|cc| cc.to_string()).collect();
        let route: Vec<String> = ["CZ", "HU", "RS", "HU"].iter().map(|cc| cc.to_string()).collect();
        let gate_input = GateInput {
            journey: &journey,
            scope: Scope::IntlBeyondEu,
            countries: &countries,
            route: &route,
            distance_km: None,
        };
        assert!(cz_third_country_terminal(&gate_input).is_none());
    }
}
