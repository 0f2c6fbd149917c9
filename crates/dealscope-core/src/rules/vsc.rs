//! Vehicle service contract (extended warranty) audit.

use crate::facts::DealFacts;
use crate::rules::{dollars, Finding, RuleCheck};

const ITEM: &str = "VSC";

/// Price ceiling for a service contract. Cheaper vehicles get the
/// lower fixed cap; the 15% leg binds below roughly $27k.
pub fn cap(msrp: f64) -> f64 {
    if msrp < 40_000.0 {
        4_000.0_f64.min(msrp * 0.15)
    } else {
        6_000.0_f64.min(msrp * 0.15)
    }
}

pub fn is_overpriced(facts: &DealFacts) -> bool {
    match (facts.vsc_price, facts.msrp) {
        (Some(charged), Some(msrp)) => charged > cap(msrp),
        _ => false,
    }
}

pub struct VscCheck;

impl RuleCheck for VscCheck {
    fn name(&self) -> &'static str {
        "vsc"
    }

    fn evaluate(&self, facts: &DealFacts) -> Vec<Finding> {
        let Some(charged) = facts.vsc_price else {
            let high_mileage_long_term = facts.mileage.is_some_and(|miles| miles >= 60_000.0)
                && facts.term_months.is_some_and(|term| term >= 72);
            if high_mileage_long_term {
                return vec![Finding::blue(
                    "VSC recommended",
                    "Consider VSC for high-mileage, long-term financing".to_string(),
                    ITEM,
                )];
            }
            return vec![Finding::blue(
                "VSC not included",
                "No service contract detected in this deal".to_string(),
                ITEM,
            )];
        };

        let Some(msrp) = facts.msrp else {
            return vec![Finding::blue(
                "VSC price unverifiable",
                format!(
                    "VSC charged at {} but no MSRP found to compute the cap",
                    dollars(charged)
                ),
                ITEM,
            )];
        };

        let cap = cap(msrp);
        if charged > cap {
            vec![Finding::red(
                "VSC overpriced",
                format!(
                    "VSC overpriced by {} (Cap: {}, Charged: {})",
                    dollars(charged - cap),
                    dollars(cap),
                    dollars(charged)
                ),
                ITEM,
                -10,
            )]
        } else {
            vec![Finding::green(
                "VSC fairly priced",
                format!(
                    "VSC fairly priced at {} (within cap of {})",
                    dollars(charged),
                    dollars(cap)
                ),
                ITEM,
                0,
            )]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::FlagColor;

    #[test]
    fn test_cap_tiers() {
        assert_eq!(cap(20_000.0), 3_000.0);
        assert_eq!(cap(35_000.0), 4_000.0);
        assert_eq!(cap(40_000.0), 6_000.0);
        assert_eq!(cap(50_000.0), 6_000.0);
    }

    #[test]
    fn test_overpriced_vsc() {
        let facts = DealFacts {
            msrp: Some(35_000.0),
            vsc_price: Some(4_500.0),
            ..Default::default()
        };

        let findings = VscCheck.evaluate(&facts);
        assert_eq!(findings[0].color, FlagColor::Red);
        assert_eq!(findings[0].delta, -10);
        assert!(findings[0].message.contains("$4000"));
        assert!(findings[0].message.contains("$4500"));
    }

    #[test]
    fn test_fair_vsc() {
        let facts = DealFacts {
            msrp: Some(50_000.0),
            vsc_price: Some(5_500.0),
            ..Default::default()
        };

        let findings = VscCheck.evaluate(&facts);
        assert_eq!(findings[0].color, FlagColor::Green);
        assert_eq!(findings[0].delta, 0);
    }

    #[test]
    fn test_missing_vsc_high_mileage_advisory() {
        let facts = DealFacts {
            mileage: Some(65_000.0),
            term_months: Some(72),
            ..Default::default()
        };

        let findings = VscCheck.evaluate(&facts);
        assert_eq!(findings[0].color, FlagColor::Blue);
        assert_eq!(findings[0].delta, 0);
        assert!(findings[0].message.contains("Consider VSC"));
    }

    #[test]
    fn test_missing_vsc_plain() {
        let findings = VscCheck.evaluate(&DealFacts::default());
        assert_eq!(findings[0].color, FlagColor::Blue);
        assert_eq!(findings[0].delta, 0);
    }
}
