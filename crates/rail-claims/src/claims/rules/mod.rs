//! Clause checks run as independent rule objects.
//!
//! Each [`Rule`] reads the tri-state hooks on the request and reports a
//! [`Verdict`]. Unknown hooks never count as a "no": they are listed as missing
//! so the caller can ask for them.

mod assistance;
mod preinformed;
mod pricing;

use serde::Serialize;

use super::domain::{Answer, ClaimRequest};
use super::profile::ExemptionProfile;

pub use assistance::AssistanceRule;
pub use preinformed::PreinformedDisruptionRule;
pub use pricing::PricingTransparencyRule;

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct Facts<'a> {
    pub request: &'a ClaimRequest,
    pub profile: &'a ExemptionProfile,
    pub delay_minutes: i64,
}

impl Facts<'_> {
    pub fn hook(&self, key: &str) -> Answer {
        self.request.hook(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    Compliant,
    NonCompliant,
    Undetermined,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub rule: &'static str,
    pub status: RuleStatus,
    pub missing: Vec<String>,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub labels: Vec<&'static str>,
}

impl Verdict {
    pub fn new(rule: &'static str, labels: &[&'static str]) -> Self {
        Self {
            rule,
            status: RuleStatus::Undetermined,
            missing: Vec::new(),
            issues: Vec::new(),
            recommendations: Vec::new(),
            labels: labels.to_vec(),
        }
    }

    /// Record unknown hooks as missing.
    fn require(&mut self, facts: &Facts<'_>, keys: &[&str]) {
        for key in keys {
            if !facts.hook(key).is_known() && !self.missing.iter().any(|m| m == key) {
                self.missing.push((*key).to_string());
            }
        }
    }

    /// Issues decide non-compliance; otherwise complete hooks decide compliance.
    fn settle(mut self) -> Self {
        self.status = if !self.issues.is_empty() {
            RuleStatus::NonCompliant
        } else if self.missing.is_empty() {
            RuleStatus::Compliant
        } else {
            RuleStatus::Undetermined
        };
        self
    }

    fn inactive(mut self) -> Self {
        self.status = RuleStatus::Inactive;
        self.missing.clear();
        self
    }
}

pub trait Rule: Send + Sync {
    fn id(&self) -> &'static str;
    fn evaluate(&self, facts: &Facts<'_>) -> Verdict;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleReport {
    pub verdicts: Vec<Verdict>,
    pub missing: Vec<String>,
}

/// Ordered collection of rules sharing one runner.
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new(vec![
            Box::new(AssistanceRule),
            Box::new(PricingTransparencyRule),
            Box::new(PreinformedDisruptionRule),
        ])
    }
}

impl RuleSet {
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.id()).collect()
    }

    pub fn run(&self, facts: &Facts<'_>) -> RuleReport {
        let verdicts: Vec<Verdict> = self.rules.iter().map(|rule| rule.evaluate(facts)).collect();
        let mut missing: Vec<String> = Vec::new();
        for field in verdicts.iter().flat_map(|verdict| verdict.missing.iter()) {
            if !missing.contains(field) {
                missing.push(field.clone());
            }
        }
        RuleReport { verdicts, missing }
    }
}
