//! The deterministic rulebook.
//!
//! Each check inspects the extracted facts independently and emits
//! zero or more findings. The engine runs every check in a fixed
//! order and folds the deltas into the score; no check sees another
//! check's output, with one deliberate exception: the missing-data
//! check re-derives the GAP/VSC overpricing predicates to decide the
//! low-risk incomplete-data cap.

pub mod addons;
pub mod bundle;
pub mod financing;
pub mod gap;
pub mod missing_data;
pub mod term;
pub mod vsc;

use crate::facts::DealFacts;

/// Which of the three flag collections a finding lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagColor {
    Red,
    Green,
    Blue,
}

/// One rulebook observation: classification, explanation, subject,
/// and score effect.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub color: FlagColor,
    pub label: String,
    pub message: String,
    pub item: String,
    pub delta: i32,
}

impl Finding {
    pub fn red(label: &str, message: String, item: &str, delta: i32) -> Self {
        Self {
            color: FlagColor::Red,
            label: label.to_string(),
            message,
            item: item.to_string(),
            delta,
        }
    }

    pub fn green(label: &str, message: String, item: &str, delta: i32) -> Self {
        Self {
            color: FlagColor::Green,
            label: label.to_string(),
            message,
            item: item.to_string(),
            delta,
        }
    }

    pub fn blue(label: &str, message: String, item: &str) -> Self {
        Self {
            color: FlagColor::Blue,
            label: label.to_string(),
            message,
            item: item.to_string(),
            delta: 0,
        }
    }

    /// Blue finding that still carries a deduction (missing-data
    /// penalties are advisory in color but not in score).
    pub fn blue_with_delta(label: &str, message: String, item: &str, delta: i32) -> Self {
        Self {
            color: FlagColor::Blue,
            label: label.to_string(),
            message,
            item: item.to_string(),
            delta,
        }
    }
}

/// One independent audit check.
pub trait RuleCheck: Send + Sync {
    /// Stable identifier used in logs.
    fn name(&self) -> &'static str;

    fn evaluate(&self, facts: &DealFacts) -> Vec<Finding>;
}

/// Every check in evaluation order.
pub fn all_checks() -> Vec<Box<dyn RuleCheck>> {
    vec![
        Box::new(gap::GapCheck),
        Box::new(vsc::VscCheck),
        Box::new(addons::AddonCheck),
        Box::new(financing::AprCheck),
        Box::new(term::TermCheck),
        Box::new(bundle::BundleCheck),
        Box::new(missing_data::MissingDataCheck),
    ]
}

/// Format a dollar amount the way the messages print it: cents only
/// when they are non-zero.
pub(crate) fn dollars(amount: f64) -> String {
    if (amount - amount.trunc()).abs() < 0.005 {
        format!("${}", amount.trunc() as i64)
    } else {
        format!("${amount:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dollars_formatting() {
        assert_eq!(dollars(900.0), "$900");
        assert_eq!(dollars(1234.5), "$1234.50");
        assert_eq!(dollars(0.0), "$0");
    }

    #[test]
    fn test_check_order_is_stable() {
        let names: Vec<_> = all_checks().iter().map(|check| check.name()).collect();
        assert_eq!(
            names,
            vec!["gap", "vsc", "addons", "apr", "term", "bundle", "missing_data"]
        );
    }
}
