//! Backend bundle abuse audit.

use crate::facts::DealFacts;
use crate::rules::{dollars, Finding, RuleCheck};

const ITEM: &str = "Backend Products";

/// GAP + VSC + add-ons at or above this total is treated as forced
/// bundling regardless of how each item prices individually.
pub const BUNDLE_THRESHOLD: f64 = 6_000.0;

pub fn is_abusive(facts: &DealFacts) -> bool {
    facts.backend_total() >= BUNDLE_THRESHOLD
}

pub struct BundleCheck;

impl RuleCheck for BundleCheck {
    fn name(&self) -> &'static str {
        "bundle"
    }

    fn evaluate(&self, facts: &DealFacts) -> Vec<Finding> {
        if !is_abusive(facts) {
            return Vec::new();
        }
        vec![Finding::red(
            "Bundle abuse",
            format!(
                "Backend products total {} - excessive bundling detected",
                dollars(facts.backend_total())
            ),
            ITEM,
            -15,
        )]
    }
}
