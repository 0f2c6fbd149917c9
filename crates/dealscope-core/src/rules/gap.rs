//! GAP insurance audit.

use crate::facts::DealFacts;
use crate::rules::{dollars, Finding, RuleCheck};

const ITEM: &str = "GAP Insurance";

/// Price ceiling for GAP on this vehicle. Higher-MSRP vehicles get the
/// higher fixed cap; the percentage leg binds on cheap vehicles.
pub fn cap(msrp: f64) -> f64 {
    if msrp >= 60_000.0 {
        1_500.0_f64.min(msrp * 0.03)
    } else {
        1_200.0_f64.min(msrp * 0.03)
    }
}

/// Overpriced means any excess over the cap, even one dollar.
pub fn is_overpriced(facts: &DealFacts) -> bool {
    match (facts.gap_price, facts.msrp) {
        (Some(charged), Some(msrp)) => charged > cap(msrp),
        _ => false,
    }
}

/// Missing GAP on a zero-down loan of 75+ months leaves the buyer
/// exposed for the whole underwater stretch of the loan.
pub fn missing_high_risk(facts: &DealFacts) -> bool {
    facts.gap_price.is_none()
        && facts.down_payment == Some(0.0)
        && facts.term_months.is_some_and(|term| term >= 75)
}

pub struct GapCheck;

impl RuleCheck for GapCheck {
    fn name(&self) -> &'static str {
        "gap"
    }

    fn evaluate(&self, facts: &DealFacts) -> Vec<Finding> {
        let Some(charged) = facts.gap_price else {
            if missing_high_risk(facts) {
                return vec![Finding::red(
                    "GAP missing on high-risk loan",
                    "GAP protection missing on high-risk loan ($0 down, 75+ month term)"
                        .to_string(),
                    ITEM,
                    -10,
                )];
            }
            return vec![Finding::blue(
                "GAP not included",
                "No GAP coverage detected in this deal".to_string(),
                ITEM,
            )];
        };

        // Without an MSRP there is no cap to audit against; the
        // missing-data check reports the absent MSRP itself.
        let Some(msrp) = facts.msrp else {
            return vec![Finding::blue(
                "GAP price unverifiable",
                format!(
                    "GAP charged at {} but no MSRP found to compute the cap",
                    dollars(charged)
                ),
                ITEM,
            )];
        };

        let cap = cap(msrp);
        if charged > cap {
            vec![Finding::red(
                "GAP overpriced",
                format!(
                    "GAP overpriced by {} (Cap: {}, Charged: {})",
                    dollars(charged - cap),
                    dollars(cap),
                    dollars(charged)
                ),
                ITEM,
                -10,
            )]
        } else {
            vec![Finding::green(
                "GAP fairly priced",
                format!(
                    "GAP fairly priced at {} (within cap of {})",
                    dollars(charged),
                    dollars(cap)
                ),
                ITEM,
                0,
            )]
        }
    }
}
