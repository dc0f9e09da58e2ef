use serde::Serialize;

use crate::claims::domain::{Answer, ClassDelivery, DowngradeBasis, DowngradeInput};

const CLASS_POINTS: u8 = 30;
const AMENITY_POINTS: u8 = 10;
const CAP_POINTS: u8 = 50;
const MAJOR_POINTS: u8 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    None,
    Minor,
    Major,
}

/// Journey-level downgrade verdict with a suggested refund fraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DowngradeAssessment {
    pub severity: Severity,
    pub suggested_fraction: f64,
    pub basis: String,
    pub reasoning: Vec<String>,
}

impl DowngradeAssessment {
    pub fn none() -> Self {
        Self {
            severity: Severity::None,
            suggested_fraction: 0.0,
            basis: String::new(),
            reasoning: vec!["no downgrade identified".to_string()],
        }
    }

    pub fn percent(&self) -> u8 {
        (self.suggested_fraction * 100.0).round() as u8
    }
}

/// Heuristic comparison of what was purchased against what was delivered.
#[derive(Debug, Clone, Copy, Default)]
pub struct DowngradeComparator;

impl DowngradeComparator {
    pub fn assess(&self, input: &DowngradeInput) -> DowngradeAssessment {
        let mut reasoning = Vec::new();
        let mut basis = Vec::new();
        let mut points: u8 = 0;

        let reported = input.downgrade_occurred.is_yes();
        let override_covers = |dimension: DowngradeBasis| {
            reported && input.basis_override.map_or(true, |chosen| chosen == dimension)
        };

        let class_hit = if override_covers(DowngradeBasis::Class) {
            reasoning.push("passenger reports a class downgrade".to_string());
            true
        } else if input.class_delivered == ClassDelivery::Lower {
            reasoning.push("delivered class lower than purchased".to_string());
            true
        } else {
            false
        };
        if class_hit {
            points += CLASS_POINTS;
            basis.push("class");
        }

        let mut amenity_hit = false;
        if override_covers(DowngradeBasis::Amenity) {
            amenity_hit = true;
            reasoning.push("passenger reports a missing amenity".to_string());
        }
        if input.reserved_amenity_delivered.is_no() {
            amenity_hit = true;
            reasoning.push("reserved amenity not delivered".to_string());
        }
        if matches!(input.facilities_delivered, Answer::No | Answer::Partial) {
            amenity_hit = true;
            reasoning.push("promised facilities not or only partially delivered".to_string());
        }
        if !input.promised_facilities.is_empty() {
            reasoning.push(format!(
                "promised facilities: {}",
                input.promised_facilities.join(", ")
            ));
        }
        if amenity_hit {
            points += AMENITY_POINTS;
            basis.push("amenity");
        }

        if points == 0 {
            return DowngradeAssessment::none();
        }

        let points = points.min(CAP_POINTS);
        DowngradeAssessment {
            severity: if points >= MAJOR_POINTS {
                Severity::Major
            } else {
                Severity::Minor
            },
            suggested_fraction: f64::from(points) / 100.0,
            basis: basis.join("+"),
            reasoning,
        }
    }
}
