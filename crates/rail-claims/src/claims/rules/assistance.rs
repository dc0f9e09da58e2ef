use super::{Facts, Rule, Verdict};
use crate::claims::domain::{Answer, Clause};

const LABELS: [&str; 1] = ["Art. 20(2), 20(3), 20(5)"];
const REQUIRED_HOOKS: [&str; 4] = [
    "meal_offered",
    "hotel_offered",
    "blocked_train_alt_transport",
    "alt_transport_provided",
];

/// Assistance duties once a delay of an hour or more, a cancellation or a missed connection occurs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssistanceRule;

impl AssistanceRule {
    fn active(facts: &Facts<'_>) -> bool {
        let disruption = &facts.request.disruption;
        facts.delay_minutes >= 60
            || disruption.cancellation
            || disruption.missed_connection
            || facts.hook("art20_expected_delay_60").is_yes()
    }
}

impl Rule for AssistanceRule {
    fn id(&self) -> &'static str {
        "art20_assistance"
    }

    fn evaluate(&self, facts: &Facts<'_>) -> Verdict {
        let mut verdict = Verdict::new(self.id(), &LABELS);

        if facts.profile.is_exempt(Clause::Art20p2) {
            verdict
                .recommendations
                .push("Art. 20(2) exempted for this journey; self-paid expenses are not reimbursed.".to_string());
            return verdict.inactive();
        }
        if !Self::active(facts) {
            return verdict.inactive();
        }

        verdict.require(facts, &REQUIRED_HOOKS);

        let overnight = facts.hook("overnight_needed") == Answer::Yes;
        if facts.hook("meal_offered").is_no() {
            verdict
                .issues
                .push("Meals or refreshments were not offered (Art. 20(2)(a)).".to_string());
            verdict
                .recommendations
                .push("Claim self-paid meals with receipts attached.".to_string());
        }
        if facts.hook("hotel_offered").is_no() && overnight {
            verdict
                .issues
                .push("Hotel accommodation was not offered when an overnight stay was needed (Art. 20(2)(b)).".to_string());
            verdict
                .recommendations
                .push("Document the overnight stay and self-paid accommodation.".to_string());
        }
        if facts.hook("blocked_train_alt_transport").is_no() {
            verdict
                .issues
                .push("No transport away from the blocked train was offered (Art. 20(2)(c)).".to_string());
        }
        if facts.hook("alt_transport_provided").is_no() {
            verdict
                .issues
                .push("No alternative transport was offered for the interrupted service (Art. 20(3)).".to_string());
            verdict
                .recommendations
                .push("Document the missing alternative transport and the self-arranged solution.".to_string());
        }
        if facts.hook("pmr_user").is_yes() && facts.hook("assistance_pmr_priority_applied").is_no() {
            verdict
                .issues
                .push("Priority assistance for a passenger with reduced mobility was missing (Art. 20(5)).".to_string());
        }

        verdict.settle()
    }
}
