//! Per-contract delay and compensation for journeys sold as separate tickets.
//!
//! Banding here is kept separate from the eligibility service on purpose: each
//! contract is judged on its own arrival, without exemptions or overrides.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::domain::{round2, JourneyInput, Segment};

/// Legs sold under one transport contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contract {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_reference: Option<String>,
    pub operators: Vec<String>,
    pub legs: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_total: Option<f64>,
}

/// Groups legs by ticket id, then booking reference, then operator and departure date.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerContractSplitter;

impl PerContractSplitter {
    pub fn split(&self, journey: &JourneyInput) -> Vec<Contract> {
        let mut contracts: Vec<Contract> = Vec::new();

        for (index, segment) in journey.segments.iter().enumerate() {
            let key = contract_key(segment);
            let position = match contracts.iter().position(|contract| contract.key == key) {
                Some(position) => position,
                None => {
                    contracts.push(Contract {
                        key,
                        ticket_id: segment.ticket_id.clone(),
                        booking_reference: segment.booking_reference.clone(),
                        operators: Vec::new(),
                        legs: Vec::new(),
                        currency: segment
                            .currency
                            .clone()
                            .or_else(|| Some(journey.currency.clone()).filter(|c| !c.is_empty())),
                        ticket_total: None,
                    });
                    contracts.len() - 1
                }
            };

            let contract = &mut contracts[position];
            contract.legs.push(index);
            let operator = operator_or_unknown(segment);
            if !contract.operators.iter().any(|known| known == operator) {
                contract.operators.push(operator.to_string());
            }
            if contract.ticket_total.is_none() {
                contract.ticket_total = segment.ticket_total.filter(|total| *total > 0.0);
            }
        }

        contracts
    }
}

fn operator_or_unknown(segment: &Segment) -> &str {
    if segment.operator.is_empty() {
        "UNKNOWN_OP"
    } else {
        segment.operator.as_str()
    }
}

fn contract_key(segment: &Segment) -> String {
    if let Some(ticket) = segment.ticket_id.as_deref().filter(|id| !id.is_empty()) {
        return format!("TICKET:{ticket}");
    }
    if let Some(pnr) = segment.booking_reference.as_deref().filter(|pnr| !pnr.is_empty()) {
        return format!("PNR:{pnr}");
    }
    let date = segment
        .scheduled_departure
        .map(|departure| departure.date().to_string())
        .unwrap_or_default();
    format!("FALLBACK:{}:{date}", operator_or_unknown(segment))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DelayStatus {
    Ok,
    MissingPlanned,
    MissingActual,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractDelay {
    pub planned_arrival: Option<NaiveDateTime>,
    pub actual_arrival: Option<NaiveDateTime>,
    pub delay_minutes: Option<i64>,
    pub status: DelayStatus,
}

/// Latest planned arrival against latest actual arrival within a contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerContractDelayCalculator;

impl PerContractDelayCalculator {
    pub fn end_to_end(&self, journey: &JourneyInput, contract: &Contract) -> ContractDelay {
        let legs = || {
            contract
                .legs
                .iter()
                .filter_map(|index| journey.segments.get(*index))
        };
        let planned_arrival = legs().filter_map(|segment| segment.scheduled_arrival).max();
        let actual_arrival = legs().filter_map(|segment| segment.actual_arrival).max();

        let (status, delay_minutes) = match (planned_arrival, actual_arrival) {
            (None, _) => (DelayStatus::MissingPlanned, None),
            (Some(_), None) => (DelayStatus::MissingActual, None),
            (Some(planned), Some(actual)) => {
                let seconds = (actual - planned).num_seconds();
                (DelayStatus::Ok, Some(seconds.div_euclid(60).max(0)))
            }
        };

        ContractDelay {
            planned_arrival,
            actual_arrival,
            delay_minutes,
            status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Band {
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "25")]
    Quarter,
    #[serde(rename = "50")]
    Half,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractCompensation {
    pub band: Band,
    pub percent: u8,
    pub amount: f64,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PerContractCompensation;

impl PerContractCompensation {
    pub fn compute(
        &self,
        ticket_value: Option<f64>,
        delay_minutes: Option<i64>,
        currency: Option<String>,
    ) -> ContractCompensation {
        let (Some(value), Some(delay)) = (ticket_value, delay_minutes) else {
            return ContractCompensation {
                band: Band::None,
                percent: 0,
                amount: 0.0,
                currency,
            };
        };

        let (band, percent) = if delay >= 120 {
            (Band::Half, 50)
        } else if delay >= 60 {
            (Band::Quarter, 25)
        } else {
            (Band::None, 0)
        };

        ContractCompensation {
            band,
            percent,
            amount: round2(value * f64::from(percent) / 100.0),
            currency,
        }
    }
}

/// Contract, its delay and its compensation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractClaim {
    pub contract: Contract,
    pub delay: ContractDelay,
    pub compensation: ContractCompensation,
}

pub fn per_contract_claims(journey: &JourneyInput) -> Vec<ContractClaim> {
    let delays = PerContractDelayCalculator;
    let bands = PerContractCompensation;
    PerContractSplitter
        .split(journey)
        .into_iter()
        .map(|contract| {
            let delay = delays.end_to_end(journey, &contract);
            let compensation = bands.compute(
                contract.ticket_total,
                delay.delay_minutes,
                contract.currency.clone(),
            );
            ContractClaim {
                contract,
                delay,
                compensation,
            }
        })
        .collect()
}
