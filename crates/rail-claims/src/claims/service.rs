use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::calculator::{effective_disruption, journey_attr, resolve_delay, ClaimCalculator, ClaimResult};
use super::contracts::{per_contract_claims, ContractClaim};
use super::domain::ClaimRequest;
use super::downgrade::{DowngradeEvaluation, DowngradeEvaluator};
use super::eligibility::EligibilityOutcome;
use super::forms::{ClaimFormSelector, FormContext, FormDecision, FormResolver, FormSelection};
use super::profile::ExemptionProfile;
use super::providers::{DistanceEstimator, RateProvider};
use super::rules::{Facts, RuleReport, RuleSet};
use super::tables::RuleTables;
use crate::config::EngineConfig;

/// Everything computed for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimReport {
    pub profile: ExemptionProfile,
    pub eligibility: EligibilityOutcome,
    pub result: ClaimResult,
    pub form: FormSelection,
    pub form_decision: FormDecision,
    pub rules: RuleReport,
    pub downgrade: DowngradeEvaluation,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contracts: Vec<ContractClaim>,
    pub missing: Vec<String>,
}

/// Service composing the profile builder, calculator, form routing and rule checks.
pub struct ClaimService {
    tables: Arc<RuleTables>,
    calculator: ClaimCalculator,
    selector: ClaimFormSelector,
    resolver: FormResolver,
    rules: Arc<RuleSet>,
}

impl ClaimService {
    pub fn new(tables: Arc<RuleTables>, engine: EngineConfig) -> Self {
        Self {
            calculator: ClaimCalculator::new(Arc::clone(&tables), engine),
            selector: ClaimFormSelector::new(Arc::clone(&tables)),
            resolver: FormResolver::new(Arc::clone(&tables)),
            rules: Arc::new(RuleSet::default()),
            tables,
        }
    }

    pub fn with_rate_provider(mut self, rates: Arc<dyn RateProvider>) -> Self {
        self.calculator = self.calculator.with_rate_provider(rates);
        self
    }

    pub fn with_distance_estimator(mut self, estimator: Arc<dyn DistanceEstimator>) -> Self {
        self.calculator = self.calculator.with_distance_estimator(estimator);
        self
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = Arc::new(rules);
        self
    }

    pub fn tables(&self) -> &RuleTables {
        &self.tables
    }

    pub fn calculator(&self) -> &ClaimCalculator {
        &self.calculator
    }

    /// Run every phase for the request. Never fails; gaps are listed in `missing`.
    pub fn compute(&self, request: &ClaimRequest) -> ClaimReport {
        let journey = &request.journey;
        let profile = self.calculator.profile(journey);
        let disruption = effective_disruption(request);
        let delay = resolve_delay(journey, &disruption);

        let eligibility = self.calculator.eligibility_for(request, &profile);
        let result = self.calculator.calculate_with_profile(request, &profile);

        let country = journey_attr(journey, &journey.country, |segment| &segment.country);
        let form = self.selector.select(&FormContext {
            profile: &profile,
            country,
            operator: journey_attr(journey, &journey.operator, |segment| &segment.operator),
            product: journey_attr(journey, &journey.product, |segment| &segment.product),
            delay_minutes: delay,
            is_commuter: journey.is_commuter,
            beyond_eu_flag: journey.is_international_beyond_eu,
        });
        let form_decision = self.resolver.decide(country);

        let rules = self.rules.run(&Facts {
            request,
            profile: &profile,
            delay_minutes: delay,
        });
        let downgrade = DowngradeEvaluator::new(&self.tables.catalog).evaluate(journey);
        let contracts = if journey.through_ticket {
            Vec::new()
        } else {
            per_contract_claims(journey)
        };

        let mut missing: Vec<String> = Vec::new();
        for field in profile
            .unresolved()
            .iter()
            .chain(rules.missing.iter())
            .chain(downgrade.missing.iter())
        {
            if !missing.contains(field) {
                missing.push(field.clone());
            }
        }

        info!(
            scope = %profile.scope(),
            delay_minutes = delay,
            compensation_pct = result.breakdown.compensation.pct,
            net_to_client = result.totals.net_to_client,
            form = form.form,
            missing = missing.len(),
            "claim computed"
        );

        ClaimReport {
            profile,
            eligibility,
            result,
            form,
            form_decision,
            rules,
            downgrade,
            contracts,
            missing,
        }
    }
}
