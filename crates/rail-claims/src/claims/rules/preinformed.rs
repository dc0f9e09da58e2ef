use super::{Facts, Rule, RuleStatus, Verdict};
use crate::claims::domain::Answer;

const LABELS: [&str; 2] = [
    "Art. 9(1) + Annex II, pt. 7",
    "Art. 19(9) (compensation exclusion)",
];

/// Whether a known disruption was disclosed before the ticket was bought.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreinformedDisruptionRule;

impl Rule for PreinformedDisruptionRule {
    fn id(&self) -> &'static str {
        "art9_preinformed"
    }

    fn evaluate(&self, facts: &Facts<'_>) -> Verdict {
        let mut verdict = Verdict::new(self.id(), &LABELS);
        match facts.hook("preinformed_disruption") {
            Answer::Yes => {
                verdict.status = RuleStatus::Compliant;
                verdict
                    .recommendations
                    .push("Disruption was disclosed before purchase; compensation is excluded (Art. 19(9)).".to_string());
            }
            Answer::No => {
                verdict.status = RuleStatus::NonCompliant;
                verdict
                    .issues
                    .push("No prior information about the disruption was given at purchase.".to_string());
            }
            Answer::Partial | Answer::Unknown => {
                verdict.missing.push("preinformed_disruption".to_string());
                verdict.status = RuleStatus::Undetermined;
            }
        }
        verdict
    }
}
