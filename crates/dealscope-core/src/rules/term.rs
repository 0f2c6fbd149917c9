//! Loan term risk audit.
//!
//! Long terms stack two deductions (the 75-month threshold plus an
//! extra 84-month increment) into one finding. Lease terms are judged
//! by lease math, not purchase-loan risk, so lease deals skip this
//! check entirely.

use crate::facts::DealFacts;
use crate::rules::{Finding, RuleCheck};

const ITEM: &str = "Loan Term";

/// Deduction for a purchase-loan term.
pub fn risk_deduction(term_months: u32) -> i32 {
    if term_months >= 84 {
        -7
    } else if term_months >= 75 {
        -5
    } else {
        0
    }
}

pub struct TermCheck;

impl RuleCheck for TermCheck {
    fn name(&self) -> &'static str {
        "term"
    }

    fn evaluate(&self, facts: &DealFacts) -> Vec<Finding> {
        if facts.is_lease {
            return Vec::new();
        }
        let Some(term) = facts.term_months else {
            return Vec::new();
        };

        if term >= 84 {
            vec![Finding::red(
                "High-risk loan term",
                format!(
                    "High-risk loan term of {term} months increases long-term cost and negative equity risk"
                ),
                ITEM,
                -7,
            )]
        } else if term >= 75 {
            vec![Finding::red(
                "Extended loan term",
                format!("Extended loan term of {term} months may lead to being underwater on loan"),
                ITEM,
                -5,
            )]
        } else if term < 60 {
            vec![Finding::green(
                "Short loan term",
                format!("Short {term}-month term keeps total interest and equity risk low"),
                ITEM,
                0,
            )]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::FlagColor;

    fn facts(term: u32) -> DealFacts {
        DealFacts {
            term_months: Some(term),
            ..Default::default()
        }
    }

    #[test]
    fn test_deduction_bands() {
        assert_eq!(risk_deduction(96), -7);
        assert_eq!(risk_deduction(84), -7);
        assert_eq!(risk_deduction(83), -5);
        assert_eq!(risk_deduction(75), -5);
        assert_eq!(risk_deduction(74), 0);
        assert_eq!(risk_deduction(36), 0);
    }

    #[test]
    fn test_eighty_four_month_term() {
        let findings = TermCheck.evaluate(&facts(84));
        assert_eq!(findings[0].color, FlagColor::Red);
        assert_eq!(findings[0].delta, -7);
        assert!(findings[0].message.contains("84"));
    }

    #[test]
    fn test_seventy_five_month_term() {
        let findings = TermCheck.evaluate(&facts(78));
        assert_eq!(findings[0].delta, -5);
    }

    #[test]
    fn test_short_term_is_green() {
        let findings = TermCheck.evaluate(&facts(48));
        assert_eq!(findings[0].color, FlagColor::Green);
        assert_eq!(findings[0].delta, 0);
    }

    #[test]
    fn test_middle_band_no_finding() {
        assert!(TermCheck.evaluate(&facts(72)).is_empty());
        assert!(TermCheck.evaluate(&facts(60)).is_empty());
    }

    #[test]
    fn test_lease_skips_term_risk() {
        let mut lease = facts(39);
        lease.is_lease = true;
        assert!(TermCheck.evaluate(&lease).is_empty());
    }

    #[test]
    fn test_missing_term_no_finding() {
        assert!(TermCheck.evaluate(&DealFacts::default()).is_empty());
    }
}
