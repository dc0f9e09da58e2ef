//! Claim computation for disrupted rail journeys.
//!
//! Requests are validated once into [`domain::ClaimRequest`]; from there every
//! phase is a pure function of the request and the shared [`tables::RuleTables`].

pub mod calculator;
pub mod contracts;
pub mod domain;
pub mod downgrade;
pub mod eligibility;
pub mod forms;
pub(crate) mod lenient;
pub mod profile;
pub mod providers;
pub mod rules;
pub mod scenario;
pub mod service;
pub mod tables;

#[cfg(test)]
mod tests;

pub use calculator::{ClaimCalculator, ClaimResult};
pub use contracts::{per_contract_claims, ContractClaim};
pub use domain::{Answer, ClaimRequest, RequestError, Scope};
pub use eligibility::{EligibilityOutcome, EligibilityService, EligibilitySource};
pub use forms::{ClaimFormSelector, FormDecision, FormResolver, FormSelection};
pub use profile::{ExemptionProfile, ExemptionProfileBuilder};
pub use providers::{DistanceEstimator, ProviderError, RateProvider, StaticRates, StationDistance};
pub use rules::{Rule, RuleReport, RuleSet, RuleStatus, Verdict};
pub use scenario::{ScenarioError, ScenarioOutcome, ScenarioRunner};
pub use service::{ClaimReport, ClaimService};
pub use tables::{RuleTables, TableCache, TableError};
