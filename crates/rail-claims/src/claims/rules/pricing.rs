use super::{Facts, Rule, Verdict};
use crate::claims::domain::{Clause, SubClause};

const LABELS: [&str; 1] = ["Art. 9(1) + Annex II, pt. 3"];

/// Fare transparency before purchase.
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingTransparencyRule;

impl Rule for PricingTransparencyRule {
    fn id(&self) -> &'static str {
        "art9_pricing"
    }

    fn evaluate(&self, facts: &Facts<'_>) -> Verdict {
        let verdict = Verdict::new(self.id(), &LABELS);
        if facts.profile.is_exempt(Clause::Art9) || !facts.profile.sub_applies(SubClause::Art9p1) {
            return verdict.inactive();
        }

        let mut verdict = verdict;
        verdict.require(facts, &["multiple_fares_shown", "cheapest_highlighted"]);
        if facts.hook("multiple_fares_shown").is_no() {
            verdict
                .issues
                .push("Several fare levels were not shown before purchase.".to_string());
        }
        if facts.hook("cheapest_highlighted").is_no() {
            verdict
                .issues
                .push("The cheapest fare was not clearly highlighted.".to_string());
        }
        if !verdict.issues.is_empty() {
            verdict
                .recommendations
                .push("Raise the pricing information gap with the operator alongside the claim.".to_string());
        }
        verdict.settle()
    }
}
