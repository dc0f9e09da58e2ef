use std::sync::Arc;

use serde::Serialize;

use super::domain::{DisruptionInput, Remedy};
use super::profile::ExemptionProfile;
use super::tables::{OverrideContext, OverrideQuery, OverrideRecord, PayoutMode, RuleTables};

/// Baseline band: 50% from 120 minutes, 25% from 60 minutes.
pub fn baseline_percent(delay_minutes: i64) -> u8 {
    if delay_minutes >= 120 {
        50
    } else if delay_minutes >= 60 {
        25
    } else {
        0
    }
}

/// Where the compensation percentage came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilitySource {
    Eu,
    Override,
    OverrideExempt,
    Denied,
}

/// Inputs for one eligibility decision.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityContext<'a> {
    pub profile: &'a ExemptionProfile,
    pub delay_minutes: i64,
    pub disruption: &'a DisruptionInput,
    pub remedy: Option<Remedy>,
    pub country: &'a str,
    pub operator: &'a str,
    pub product: &'a str,
    pub is_commuter: bool,
    pub beyond_eu_flag: bool,
}

impl EligibilityContext<'_> {
    fn override_query(&self) -> OverrideQuery<'_> {
        OverrideQuery {
            country: self.country,
            operator: self.operator,
            product: self.product,
        }
    }

    fn override_context(&self) -> OverrideContext {
        OverrideContext {
            scope: self.profile.scope(),
            is_commuter: self.is_commuter,
            beyond_eu_flag: self.beyond_eu_flag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EligibilityOutcome {
    pub percent: u8,
    pub source: EligibilitySource,
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout: Option<PayoutMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_source: Option<String>,
}

impl EligibilityOutcome {
    fn denied(note: impl Into<String>) -> Self {
        Self {
            percent: 0,
            source: EligibilitySource::Denied,
            notes: vec![note.into()],
            payout: None,
            override_notes: None,
            override_source: None,
        }
    }

    fn from_override(
        record: &OverrideRecord,
        delay_minutes: i64,
        source: EligibilitySource,
        mut notes: Vec<String>,
    ) -> Self {
        let tier = record.best_tier(delay_minutes);
        match tier {
            Some(tier) => notes.push(format!(
                "override tier {}% from {} min",
                tier.percent(),
                tier.min_delay_min
            )),
            None => notes.push(format!("no override tier reached at {delay_minutes} min")),
        }
        Self {
            percent: tier.map(|tier| tier.percent()).unwrap_or(0),
            source,
            notes,
            payout: tier.and_then(|tier| tier.payout_mode()),
            override_notes: record.notes.clone(),
            override_source: record.source.clone(),
        }
    }

    pub fn is_override(&self) -> bool {
        matches!(
            self.source,
            EligibilitySource::Override | EligibilitySource::OverrideExempt
        )
    }
}

/// Resolves the compensation percentage from denials, exemptions, baseline and overrides.
#[derive(Debug, Clone)]
pub struct EligibilityService {
    tables: Arc<RuleTables>,
}

impl EligibilityService {
    pub fn new(tables: Arc<RuleTables>) -> Self {
        Self { tables }
    }

    /// Best matching override whose scope gate admits the journey.
    pub fn applicable_override(&self, context: &EligibilityContext<'_>) -> Option<&OverrideRecord> {
        self.tables
            .overrides
            .find_one(&context.override_query())
            .filter(|record| record.scope_matches(&context.override_context()))
    }

    pub fn evaluate(&self, context: &EligibilityContext<'_>) -> EligibilityOutcome {
        let disruption = context.disruption;
        if disruption.self_inflicted {
            return EligibilityOutcome::denied("self-inflicted disruption: no compensation");
        }
        if disruption.refund_already {
            return EligibilityOutcome::denied("refund already issued: no compensation");
        }
        if context.remedy == Some(Remedy::Refund) {
            return EligibilityOutcome::denied("refund chosen: compensation not combined with refund");
        }
        if disruption.notified_before_purchase {
            return EligibilityOutcome::denied("delay known before purchase (Art. 19(9))");
        }
        if disruption.extraordinary {
            return EligibilityOutcome::denied("extraordinary circumstances (Art. 19(10))");
        }

        let delay = context.delay_minutes;
        let matched = self.applicable_override(context);

        if context.profile.is_blocked() {
            let note = format!("{} scope blocked for EU compensation", context.profile.scope());
            return match matched {
                Some(record) => EligibilityOutcome::from_override(
                    record,
                    delay,
                    EligibilitySource::OverrideExempt,
                    vec![note],
                ),
                None => EligibilityOutcome::denied(note),
            };
        }

        if context.profile.is_exempt(super::domain::Clause::Art19) {
            let note = "Art. 19 exempted for this journey".to_string();
            return match matched {
                Some(record) => EligibilityOutcome::from_override(
                    record,
                    delay,
                    EligibilitySource::OverrideExempt,
                    vec![note],
                ),
                None => EligibilityOutcome::denied(note),
            };
        }

        let baseline = baseline_percent(delay);
        let baseline_outcome = EligibilityOutcome {
            percent: baseline,
            source: EligibilitySource::Eu,
            notes: vec![format!("EU baseline {baseline}% at {delay} min")],
            payout: None,
            override_notes: None,
            override_source: None,
        };

        let Some(record) = matched else {
            return baseline_outcome;
        };
        match record.best_tier(delay) {
            Some(tier) if tier.percent() > baseline => EligibilityOutcome::from_override(
                record,
                delay,
                EligibilitySource::Override,
                vec![format!("override exceeds EU baseline {baseline}%")],
            ),
            _ => baseline_outcome,
        }
    }
}
