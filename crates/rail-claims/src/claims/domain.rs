use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::lenient;

/// Tri-state business fact. `Unknown` never collapses into `No`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    Yes,
    No,
    Partial,
    #[default]
    Unknown,
}

impl Answer {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ja" | "yes" | "y" | "true" | "1" => Answer::Yes,
            "nej" | "no" | "n" | "false" | "0" => Answer::No,
            "delvist" | "partial" | "partly" | "partially" => Answer::Partial,
            _ => Answer::Unknown,
        }
    }

    pub const fn is_yes(self) -> bool {
        matches!(self, Answer::Yes)
    }

    pub const fn is_no(self) -> bool {
        matches!(self, Answer::No)
    }

    pub const fn is_known(self) -> bool {
        !matches!(self, Answer::Unknown)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Answer::Yes => "yes",
            Answer::No => "no",
            Answer::Partial => "partial",
            Answer::Unknown => "unknown",
        }
    }
}

impl<'de> Deserialize<'de> for Answer {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Bool(true) => Answer::Yes,
            Value::Bool(false) => Answer::No,
            Value::Number(number) => match number.as_i64() {
                Some(1) => Answer::Yes,
                Some(0) => Answer::No,
                _ => Answer::Unknown,
            },
            Value::String(raw) => Answer::parse(&raw),
            _ => Answer::Unknown,
        })
    }
}

/// Journey classification driving which exemption rows apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Regional,
    LongDomestic,
    IntlInsideEu,
    IntlBeyondEu,
}

impl Scope {
    pub const fn label(self) -> &'static str {
        match self {
            Scope::Regional => "regional",
            Scope::LongDomestic => "long_domestic",
            Scope::IntlInsideEu => "intl_inside_eu",
            Scope::IntlBeyondEu => "intl_beyond_eu",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "regional" => Some(Scope::Regional),
            "long_domestic" | "domestic" => Some(Scope::LongDomestic),
            "intl_inside_eu" => Some(Scope::IntlInsideEu),
            "intl_beyond_eu" => Some(Scope::IntlBeyondEu),
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Clauses of the baseline passenger-rights rule tracked by the exemption profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Clause {
    #[serde(rename = "art9")]
    Art9,
    #[serde(rename = "art10")]
    Art10,
    #[serde(rename = "art12")]
    Art12,
    #[serde(rename = "art17")]
    Art17,
    #[serde(rename = "art18_3")]
    Art18p3,
    #[serde(rename = "art19")]
    Art19,
    #[serde(rename = "art20_2")]
    Art20p2,
    #[serde(rename = "art30_2")]
    Art30p2,
}

impl Clause {
    pub const ALL: [Clause; 8] = [
        Clause::Art9,
        Clause::Art10,
        Clause::Art12,
        Clause::Art17,
        Clause::Art18p3,
        Clause::Art19,
        Clause::Art20p2,
        Clause::Art30p2,
    ];

    pub const fn id(self) -> &'static str {
        match self {
            Clause::Art9 => "art9",
            Clause::Art10 => "art10",
            Clause::Art12 => "art12",
            Clause::Art17 => "art17",
            Clause::Art18p3 => "art18_3",
            Clause::Art19 => "art19",
            Clause::Art20p2 => "art20_2",
            Clause::Art30p2 => "art30_2",
        }
    }

    /// Matrix label such as `Art.18(3)`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Art.9" => Some(Clause::Art9),
            "Art.10" => Some(Clause::Art10),
            "Art.12" => Some(Clause::Art12),
            "Art.17" => Some(Clause::Art17),
            "Art.18(3)" => Some(Clause::Art18p3),
            "Art.19" => Some(Clause::Art19),
            "Art.20(2)" => Some(Clause::Art20p2),
            "Art.30(2)" => Some(Clause::Art30p2),
            _ => None,
        }
    }
}

/// Parts of Art. 9 that can be exempted individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SubClause {
    #[serde(rename = "art9_1")]
    Art9p1,
    #[serde(rename = "art9_2")]
    Art9p2,
    #[serde(rename = "art9_3")]
    Art9p3,
}

impl SubClause {
    pub const ALL: [SubClause; 3] = [SubClause::Art9p1, SubClause::Art9p2, SubClause::Art9p3];

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Art.9(1)" => Some(SubClause::Art9p1),
            "Art.9(2)" => Some(SubClause::Art9p2),
            "Art.9(3)" => Some(SubClause::Art9p3),
            _ => None,
        }
    }

    pub const fn short(self) -> &'static str {
        match self {
            SubClause::Art9p1 => "9(1)",
            SubClause::Art9p2 => "9(2)",
            SubClause::Art9p3 => "9(3)",
        }
    }
}

/// Delivered travel class compared with the purchased one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassDelivery {
    Same,
    Lower,
    Higher,
    #[default]
    Unknown,
}

impl<'de> Deserialize<'de> for ClassDelivery {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let raw = value.as_str().unwrap_or_default().trim().to_ascii_lowercase();
        Ok(match raw.as_str() {
            "same" | "samme" => ClassDelivery::Same,
            "lower" | "nedgraderet" | "downgrade" | "downgraded" => ClassDelivery::Lower,
            "higher" | "upgraded" => ClassDelivery::Higher,
            _ => ClassDelivery::Unknown,
        })
    }
}

/// One operated leg of the journey.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default, deserialize_with = "lenient::text")]
    pub country: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub operator: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub product: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub from: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub to: String,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub scheduled_departure: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub scheduled_arrival: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub actual_departure: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub actual_arrival: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient::optional_amount")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub fare_class_purchased: Option<String>,
    #[serde(default)]
    pub class_delivered: ClassDelivery,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub reserved_amenity_booked: Option<String>,
    #[serde(default)]
    pub reserved_amenity_delivered: Answer,
    #[serde(default, deserialize_with = "lenient::optional_amount")]
    pub downgrade_share: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub downgrade_reason: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_reroute_leg: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub eu: bool,
    #[serde(default, deserialize_with = "lenient::optional_amount")]
    pub distance_km: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub ticket_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub booking_reference: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_amount")]
    pub ticket_total: Option<f64>,
}

impl Segment {
    /// Positive arrival delay of this leg in whole minutes.
    pub fn arrival_delay_minutes(&self) -> Option<i64> {
        let scheduled = self.scheduled_arrival?;
        let actual = self.actual_arrival?;
        let seconds = (actual - scheduled).num_seconds();
        Some(((seconds as f64) / 60.0).round().max(0.0) as i64)
    }

    pub fn label(&self, index: usize) -> String {
        if !self.from.is_empty() && !self.to.is_empty() {
            format!("{} -> {}", self.from, self.to)
        } else {
            format!("Leg #{}", index + 1)
        }
    }
}

/// Ordered legs plus fare and scope hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneyInput {
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub ticket_price_total: f64,
    #[serde(default = "default_currency", deserialize_with = "lenient::text")]
    pub currency: String,
    #[serde(default, deserialize_with = "lenient::scope")]
    pub service_scope: Option<Scope>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_long_domestic: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_international_inside_eu: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_international_beyond_eu: bool,
    #[serde(default = "default_true", deserialize_with = "lenient::flag_or_true")]
    pub through_ticket: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub return_ticket: bool,
    #[serde(default, deserialize_with = "lenient::text")]
    pub country: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub operator: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub product: String,
    #[serde(default, deserialize_with = "lenient::optional_amount")]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub under_distance_threshold: Answer,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_commuter: bool,
}

impl Default for JourneyInput {
    fn default() -> Self {
        Self {
            segments: Vec::new(),
            ticket_price_total: 0.0,
            currency: default_currency(),
            service_scope: None,
            is_long_domestic: false,
            is_international_inside_eu: false,
            is_international_beyond_eu: false,
            through_ticket: true,
            return_ticket: false,
            country: String::new(),
            operator: String::new(),
            product: String::new(),
            distance_km: None,
            under_distance_threshold: Answer::Unknown,
            is_commuter: false,
        }
    }
}

impl JourneyInput {
    /// Upper-cased country per segment, falling back to the journey country.
    pub fn segment_countries(&self) -> Vec<String> {
        self.segments
            .iter()
            .map(|segment| {
                if segment.country.is_empty() {
                    self.country.to_ascii_uppercase()
                } else {
                    segment.country.to_ascii_uppercase()
                }
            })
            .filter(|country| !country.is_empty())
            .collect()
    }

    /// Travel date used to expire dated exemption rows.
    pub fn travel_date(&self) -> Option<NaiveDate> {
        self.segments
            .iter()
            .find_map(|segment| segment.scheduled_departure.or(segment.scheduled_arrival))
            .map(|dt| dt.date())
    }
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_true() -> bool {
    true
}

/// What went wrong and why.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisruptionInput {
    #[serde(default, deserialize_with = "lenient::optional_minutes")]
    pub delay_minutes: Option<i64>,
    #[serde(default, deserialize_with = "lenient::optional_minutes")]
    pub delay_minutes_eu: Option<i64>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub eu_only: bool,
    #[serde(default, deserialize_with = "lenient::optional_index")]
    pub delayed_leg_index: Option<usize>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub self_inflicted: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub extraordinary: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub notified_before_purchase: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub cancellation: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub missed_connection: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub refund_already: bool,
}

/// Remedy selected by the passenger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Remedy {
    Refund,
    RerouteSoonest,
    RerouteLater,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoiceInput {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub wants_refund: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub wants_reroute_soonest: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub wants_reroute_later: bool,
}

impl ChoiceInput {
    pub fn remedy(&self) -> Option<Remedy> {
        if self.wants_refund {
            Some(Remedy::Refund)
        } else if self.wants_reroute_soonest {
            Some(Remedy::RerouteSoonest)
        } else if self.wants_reroute_later {
            Some(Remedy::RerouteLater)
        } else {
            None
        }
    }

    pub fn wants_reroute(&self) -> bool {
        self.wants_reroute_soonest || self.wants_reroute_later
    }
}

/// Self-paid expenses claimed under the assistance clause.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseInput {
    #[serde(default, deserialize_with = "lenient::amount")]
    pub meals: f64,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub hotel: f64,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub alt_transport: f64,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub other: f64,
}

impl ExpenseInput {
    pub fn sum(&self) -> f64 {
        self.meals + self.hotel + self.alt_transport + self.other
    }
}

/// Which downgrade dimension a passenger override refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DowngradeBasis {
    Class,
    Amenity,
}

/// Journey-level downgrade signals for the heuristic comparator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DowngradeInput {
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub fare_class_purchased: Option<String>,
    #[serde(default)]
    pub class_delivered: ClassDelivery,
    #[serde(default)]
    pub reserved_amenity_delivered: Answer,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub promised_facilities: Vec<String>,
    #[serde(default)]
    pub facilities_delivered: Answer,
    #[serde(default)]
    pub downgrade_occurred: Answer,
    #[serde(default, deserialize_with = "lenient::optional_variant")]
    pub basis_override: Option<DowngradeBasis>,
}

/// Base the service fee is charged on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeMode {
    #[default]
    Gross,
    ExpensesOnly,
}

/// Per-request adjustments to engine defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputeOverrides {
    #[serde(default, deserialize_with = "lenient::optional_variant")]
    pub service_fee_mode: Option<FeeMode>,
    #[serde(default, deserialize_with = "lenient::optional_amount")]
    pub min_payout: Option<f64>,
}

/// Fully typed computation request, validated once at the boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimRequest {
    #[serde(default)]
    pub journey: JourneyInput,
    #[serde(default)]
    pub disruption: DisruptionInput,
    #[serde(default)]
    pub choices: ChoiceInput,
    #[serde(default)]
    pub expenses: ExpenseInput,
    #[serde(default)]
    pub downgrade: DowngradeInput,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub already_refunded: f64,
    #[serde(default)]
    pub hooks: BTreeMap<String, Answer>,
    #[serde(default)]
    pub overrides: ComputeOverrides,
}

impl ClaimRequest {
    pub fn from_json(raw: &str) -> Result<Self, RequestError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, RequestError> {
        if !value.is_object() {
            return Err(RequestError::NotAnObject);
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn hook(&self, key: &str) -> Answer {
        self.hooks.get(key).copied().unwrap_or_default()
    }
}

/// Only structurally unreadable payloads are rejected.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("request payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("request payload must be a JSON object")]
    NotAnObject,
}

/// Round half away from zero to cents.
pub fn round2(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Truncate to cents, tolerating binary representation noise.
pub fn floor2(amount: f64) -> f64 {
    ((amount * 100.0) + 1e-6).floor() / 100.0
}
