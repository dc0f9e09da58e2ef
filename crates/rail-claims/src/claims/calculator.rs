use std::sync::Arc;

use serde::Serialize;

use super::domain::{floor2, round2, Clause, ClaimRequest, DisruptionInput, FeeMode, JourneyInput};
use super::downgrade::{DowngradeComparator, Severity};
use super::eligibility::{EligibilityContext, EligibilityOutcome, EligibilityService, EligibilitySource};
use super::profile::{ExemptionProfile, ExemptionProfileBuilder};
use super::providers::{eur_equivalent, DistanceEstimator, RateProvider, StaticRates};
use super::tables::{PayoutMode, RuleTables};
use crate::config::EngineConfig;

const LEG_FARE_BASIS: &str = "Art.19(3) leg fare (per-leg price)";
const RETURN_HALF_BASIS: &str = "Art.19(3) 1/2 fare (return, no split prices)";
const THROUGH_TICKET_BASIS: &str = "Art.19(3) whole fare (through ticket)";
const WHOLE_FARE_BASIS: &str = "Art.19(3) whole fare";
const EXEMPT_BASIS: &str = "Art.19 exempted (national exemption)";
const NO_COMPENSATION_BASIS: &str = "No compensation (<60 min / excluded)";
const REFUND_BASIS: &str = "Art.18(1)(a) whole fare";
const ART20_BLOCKED: &str = "art20_2_blocked";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefundLine {
    pub basis: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downgrade_component: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompensationLine {
    pub eligible: bool,
    pub delay_minutes: i64,
    pub pct: u8,
    pub basis: String,
    pub basis_amount: f64,
    pub amount: f64,
    pub rule: String,
    pub source: EligibilitySource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout: Option<PayoutMode>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseLine {
    pub meals: f64,
    pub hotel: f64,
    pub alt_transport: f64,
    pub other: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deductions {
    pub already_refunded: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub refund: RefundLine,
    pub compensation: CompensationLine,
    pub expenses: ExpenseLine,
    pub deductions: Deductions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub gross_claim: f64,
    pub service_fee_pct: u8,
    pub service_fee_mode: FeeMode,
    pub service_fee_amount: f64,
    pub net_to_client: f64,
    pub currency: String,
    pub eur_equivalent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimFlags {
    pub extraordinary: bool,
    pub self_inflicted: bool,
    pub exemptions_applied: Vec<String>,
    pub manual_review: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub review_reasons: Vec<String>,
}

/// Monetary outcome of one claim with the reasons behind each figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimResult {
    pub breakdown: Breakdown,
    pub totals: Totals,
    pub flags: ClaimFlags,
}

/// Delay used for compensation, in whole minutes and never negative.
pub fn resolve_delay(journey: &JourneyInput, disruption: &DisruptionInput) -> i64 {
    if disruption.eu_only {
        if let Some(explicit) = disruption.delay_minutes_eu {
            return explicit.max(0);
        }
        return journey
            .segments
            .iter()
            .filter(|segment| segment.eu)
            .filter_map(|segment| segment.arrival_delay_minutes())
            .sum();
    }

    if let Some(explicit) = disruption.delay_minutes {
        return explicit.max(0);
    }
    journey
        .segments
        .last()
        .and_then(|segment| segment.arrival_delay_minutes())
        .unwrap_or(0)
}

/// Amount the compensation percentage applies to, with its label.
pub fn compensation_basis(journey: &JourneyInput, disruption: &DisruptionInput) -> (f64, &'static str) {
    let legs = journey.segments.len();
    let total = journey.ticket_price_total.max(0.0);

    let delayed_leg = disruption.delayed_leg_index.or_else(|| legs.checked_sub(1));
    if let Some(price) = delayed_leg
        .and_then(|index| journey.segments.get(index))
        .and_then(|segment| segment.price)
    {
        return (price.max(0.0), LEG_FARE_BASIS);
    }

    if journey.return_ticket || looks_like_return(journey) {
        return (total / 2.0, RETURN_HALF_BASIS);
    }

    if journey.through_ticket && legs >= 2 {
        return (total, THROUGH_TICKET_BASIS);
    }

    (total, WHOLE_FARE_BASIS)
}

/// Two legs whose scheduled arrival dates are at least a day apart.
fn looks_like_return(journey: &JourneyInput) -> bool {
    let [outbound, inbound] = journey.segments.as_slice() else {
        return false;
    };
    match (outbound.scheduled_arrival, inbound.scheduled_arrival) {
        (Some(a), Some(b)) => (b.date() - a.date()).num_days().abs() >= 1,
        _ => false,
    }
}

/// Refund, compensation and expense waterfall with the service fee.
#[derive(Clone)]
pub struct ClaimCalculator {
    profiles: ExemptionProfileBuilder,
    eligibility: EligibilityService,
    comparator: DowngradeComparator,
    engine: EngineConfig,
    rates: Option<Arc<dyn RateProvider>>,
    fallback_rates: StaticRates,
}

impl ClaimCalculator {
    pub fn new(tables: Arc<RuleTables>, engine: EngineConfig) -> Self {
        Self {
            profiles: ExemptionProfileBuilder::new(Arc::clone(&tables)),
            eligibility: EligibilityService::new(tables),
            comparator: DowngradeComparator,
            engine,
            rates: None,
            fallback_rates: StaticRates::default(),
        }
    }

    pub fn with_rate_provider(mut self, rates: Arc<dyn RateProvider>) -> Self {
        self.rates = Some(rates);
        self
    }

    pub fn with_distance_estimator(mut self, estimator: Arc<dyn DistanceEstimator>) -> Self {
        self.profiles = self.profiles.with_distance_estimator(estimator);
        self
    }

    pub fn profile(&self, journey: &JourneyInput) -> ExemptionProfile {
        self.profiles.build(journey)
    }

    pub fn eligibility(&self) -> &EligibilityService {
        &self.eligibility
    }

    pub fn calculate(&self, request: &ClaimRequest) -> ClaimResult {
        let profile = self.profile(&request.journey);
        self.calculate_with_profile(request, &profile)
    }

    /// Eligibility for the request, with the pre-informed hook folded into the disruption.
    pub fn eligibility_for(&self, request: &ClaimRequest, profile: &ExemptionProfile) -> EligibilityOutcome {
        let disruption = effective_disruption(request);
        let delay = resolve_delay(&request.journey, &disruption);
        self.eligibility
            .evaluate(&eligibility_context(request, profile, &disruption, delay))
    }

    pub fn calculate_with_profile(&self, request: &ClaimRequest, profile: &ExemptionProfile) -> ClaimResult {
        let journey = &request.journey;
        let disruption = effective_disruption(request);
        let delay = resolve_delay(journey, &disruption);
        let ticket_total = journey.ticket_price_total.max(0.0);
        let mut review_reasons = Vec::new();

        let outcome = self
            .eligibility
            .evaluate(&eligibility_context(request, profile, &disruption, delay));
        let (basis_amount, basis_label) = compensation_basis(journey, &disruption);
        let mut compensation = CompensationLine {
            eligible: outcome.percent > 0,
            delay_minutes: delay,
            pct: outcome.percent,
            basis: basis_label.to_string(),
            basis_amount: round2(basis_amount),
            amount: round2(basis_amount * f64::from(outcome.percent) / 100.0),
            rule: rule_label(&outcome, profile).to_string(),
            source: outcome.source,
            payout: outcome.payout,
            notes: outcome.notes.clone(),
        };
        if outcome.percent == 0 {
            compensation.basis = if profile.is_exempt(Clause::Art19) && !outcome.is_override() {
                EXEMPT_BASIS
            } else {
                NO_COMPENSATION_BASIS
            }
            .to_string();
        }

        if let Some(minimum) = request.overrides.min_payout.filter(|minimum| *minimum > 0.0) {
            if compensation.amount > 0.0 && compensation.amount < minimum {
                compensation.notes.push(format!(
                    "compensation {:.2} below minimum payout {:.2}",
                    compensation.amount, minimum
                ));
                zero_compensation(&mut compensation);
                compensation.source = EligibilitySource::Denied;
            }
        }

        let choices = &request.choices;
        let mut refund = RefundLine {
            basis: "none".to_string(),
            amount: 0.0,
            downgrade_component: None,
        };
        if choices.wants_refund
            && (delay >= 60 || disruption.cancellation || choices.wants_reroute())
        {
            refund.basis = REFUND_BASIS.to_string();
            refund.amount = round2(ticket_total);
        }

        let assessment = self.comparator.assess(&request.downgrade);
        if assessment.severity != Severity::None && assessment.suggested_fraction > 0.0 {
            let amount = round2(ticket_total * assessment.suggested_fraction);
            let label = format!(
                "Downgrade refund ({}%; {})",
                assessment.percent(),
                if assessment.basis.is_empty() {
                    "heuristic"
                } else {
                    assessment.basis.as_str()
                }
            );
            if refund.amount <= 0.0 {
                refund.basis = label;
                refund.amount = amount;
            } else {
                refund.basis = format!("{} + {label}", refund.basis);
                refund.amount = round2(refund.amount + amount);
                review_reasons
                    .push("downgrade refund added on top of a whole-fare refund".to_string());
            }
            refund.downgrade_component = Some(amount);
        }

        if refund.amount > 0.0 && refund.amount >= ticket_total - 0.01 {
            if compensation.amount > 0.0 {
                compensation
                    .notes
                    .push("refund covers the whole fare; compensation withheld".to_string());
            }
            zero_compensation(&mut compensation);
        } else if ticket_total > 0.0 && refund.amount + compensation.amount > ticket_total {
            let cap = round2(ticket_total - refund.amount);
            compensation.notes.push(format!(
                "compensation capped at {cap:.2}; refund and compensation cannot exceed the fare"
            ));
            compensation.amount = cap;
        }

        let mut exemptions_applied: Vec<String> = profile
            .exemption_ids()
            .into_iter()
            .map(str::to_string)
            .collect();

        let expenses_in = &request.expenses;
        let assistance_allowed = profile.applies(Clause::Art20p2);
        let claimed = expenses_in.sum();
        let expenses = ExpenseLine {
            meals: round2(expenses_in.meals),
            hotel: round2(expenses_in.hotel),
            alt_transport: round2(expenses_in.alt_transport),
            other: round2(expenses_in.other),
            total: if assistance_allowed { round2(claimed) } else { 0.0 },
        };
        if !assistance_allowed && claimed > 0.0 && !exemptions_applied.iter().any(|id| id == ART20_BLOCKED) {
            exemptions_applied.push(ART20_BLOCKED.to_string());
        }

        let already_refunded = round2(request.already_refunded);
        let gross = round2(
            (refund.amount + compensation.amount + expenses.total - already_refunded).max(0.0),
        );

        let fee_mode = request
            .overrides
            .service_fee_mode
            .unwrap_or(self.engine.fee_mode);
        let fee_pct = self.engine.service_fee_pct.min(100);
        let fee_base = match fee_mode {
            FeeMode::Gross => gross,
            FeeMode::ExpensesOnly => expenses.total.max(0.0),
        };
        let fee = floor2(fee_base * f64::from(fee_pct) / 100.0).min(gross);
        let net = round2(gross - fee).max(0.0);

        let currency = journey.currency.clone();
        let eur = eur_equivalent(net, &currency, self.rates.as_deref(), &self.fallback_rates);

        ClaimResult {
            breakdown: Breakdown {
                refund,
                compensation,
                expenses,
                deductions: Deductions { already_refunded },
            },
            totals: Totals {
                gross_claim: gross,
                service_fee_pct: fee_pct,
                service_fee_mode: fee_mode,
                service_fee_amount: fee,
                net_to_client: net,
                currency,
                eur_equivalent: eur,
            },
            flags: ClaimFlags {
                extraordinary: disruption.extraordinary,
                self_inflicted: disruption.self_inflicted,
                exemptions_applied,
                manual_review: !review_reasons.is_empty(),
                review_reasons,
            },
        }
    }
}

fn zero_compensation(line: &mut CompensationLine) {
    line.eligible = false;
    line.pct = 0;
    line.amount = 0.0;
}

fn rule_label(outcome: &EligibilityOutcome, profile: &ExemptionProfile) -> &'static str {
    if outcome.is_override() {
        "national_override"
    } else if profile.is_exempt(Clause::Art19) {
        "N/A"
    } else {
        "EU"
    }
}

/// Disruption with the pre-informed hook applied.
pub(crate) fn effective_disruption(request: &ClaimRequest) -> DisruptionInput {
    let mut disruption = request.disruption.clone();
    if request.hook("preinformed_disruption").is_yes() {
        disruption.notified_before_purchase = true;
    }
    disruption
}

pub(crate) fn eligibility_context<'a>(
    request: &'a ClaimRequest,
    profile: &'a ExemptionProfile,
    disruption: &'a DisruptionInput,
    delay_minutes: i64,
) -> EligibilityContext<'a> {
    let journey = &request.journey;
    EligibilityContext {
        profile,
        delay_minutes,
        disruption,
        remedy: request.choices.remedy(),
        country: journey_attr(journey, &journey.country, |segment| &segment.country),
        operator: journey_attr(journey, &journey.operator, |segment| &segment.operator),
        product: journey_attr(journey, &journey.product, |segment| &segment.product),
        is_commuter: journey.is_commuter,
        beyond_eu_flag: journey.is_international_beyond_eu,
    }
}

/// Journey-level attribute, falling back to the first leg that has one.
pub(crate) fn journey_attr<'a>(
    journey: &'a JourneyInput,
    value: &'a str,
    from_segment: impl Fn(&'a super::domain::Segment) -> &'a String,
) -> &'a str {
    if !value.trim().is_empty() {
        return value.trim();
    }
    journey
        .segments
        .iter()
        .map(from_segment)
        .map(|raw| raw.trim())
        .find(|raw| !raw.is_empty())
        .unwrap_or("")
}
