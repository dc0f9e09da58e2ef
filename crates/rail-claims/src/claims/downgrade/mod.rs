//! Downgrade-based partial refunds.
//!
//! [`DowngradeComparator`] gives a journey-level heuristic fraction used by the
//! claim calculator. [`DowngradeEvaluator`] works per leg against the operator
//! catalog and reports legs it cannot price as missing data.

mod comparator;
mod evaluator;

pub use comparator::{DowngradeAssessment, DowngradeComparator, Severity};
pub use evaluator::{
    DowngradeEvaluation, DowngradeEvaluator, LegDowngrade, RefundBasis, RefundMethod,
};
