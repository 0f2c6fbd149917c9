//! Fluff add-on audit.
//!
//! Add-ons from the fixed catalog (nitrogen fill, VIN etching, key
//! replacement, paint/interior/theft protection, GPS tracking, ghost
//! immobilizer) are low-cost items routinely marked up. The total
//! drives the deduction; a single expensive item and a pile of smaller
//! ones are penalized differently.

use crate::facts::DealFacts;
use crate::rules::{dollars, Finding, RuleCheck};

const ITEM: &str = "Add-ons";

/// Combined add-on cost above this is considered excessive.
pub const FLUFF_THRESHOLD: f64 = 500.0;

pub struct AddonCheck;

impl RuleCheck for AddonCheck {
    fn name(&self) -> &'static str {
        "addons"
    }

    fn evaluate(&self, facts: &DealFacts) -> Vec<Finding> {
        if facts.fluff.is_empty() {
            return Vec::new();
        }

        let total = facts.total_fluff();
        let count = facts.fluff.len();

        if total <= FLUFF_THRESHOLD {
            return vec![Finding::blue(
                "Add-ons within tolerance",
                format!(
                    "{count} add-on(s) totaling {} are within the reasonable threshold",
                    dollars(total)
                ),
                ITEM,
            )];
        }

        if count == 1 {
            let item = &facts.fluff[0];
            vec![Finding::red(
                "Overpriced add-on",
                format!("Overpriced add-on: {} at {}", item.name, dollars(item.price)),
                item.name,
                -5,
            )]
        } else {
            vec![Finding::red(
                "Excessive add-on bundle",
                format!(
                    "{count} add-ons totaling {} exceed reasonable threshold",
                    dollars(total)
                ),
                ITEM,
                -8,
            )]
        }
    }
}
