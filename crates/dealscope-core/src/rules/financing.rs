//! APR bonus audit.
//!
//! Bonuses apply only to dealer-arranged financing; a low rate from
//! the buyer's own bank says nothing about the dealer's offer, and a
//! cash deal has no rate at all.

use crate::facts::DealFacts;
use crate::rules::{Finding, RuleCheck};
use crate::types::FinancingSource;

const ITEM: &str = "APR";

pub const EXCELLENT_APR: f64 = 6.5;
pub const COMPETITIVE_APR: f64 = 9.5;
/// Above this the rate itself is flagged as predatory.
pub const EXTREME_APR: f64 = 15.0;

/// Bonus points for a dealer-financed APR.
pub fn bonus_for(apr: f64, source: FinancingSource) -> i32 {
    if source != FinancingSource::Dealer {
        return 0;
    }
    if apr <= EXCELLENT_APR {
        5
    } else if apr <= COMPETITIVE_APR {
        2
    } else {
        0
    }
}

pub struct AprCheck;

impl RuleCheck for AprCheck {
    fn name(&self) -> &'static str {
        "apr"
    }

    fn evaluate(&self, facts: &DealFacts) -> Vec<Finding> {
        // Missing APR is the missing-data check's business.
        let Some(apr) = facts.apr else {
            return Vec::new();
        };
        if facts.financing != FinancingSource::Dealer {
            return Vec::new();
        }

        if apr <= EXCELLENT_APR {
            vec![Finding::green(
                "Excellent APR",
                format!("Excellent APR of {apr}% - well below market average"),
                ITEM,
                5,
            )]
        } else if apr <= COMPETITIVE_APR {
            vec![Finding::green(
                "Competitive APR",
                format!("Competitive APR of {apr}% - within acceptable range"),
                ITEM,
                2,
            )]
        } else if apr > EXTREME_APR {
            vec![Finding::red(
                "Extremely high APR",
                format!("APR of {apr}% is far above market rates for dealer financing"),
                ITEM,
                0,
            )]
        } else {
            Vec::new()
        }
    }
}
