//! Missing critical data penalties.
//!
//! Absence is penalized only when the field is genuinely absent, never
//! inferred. Cash deals carry no APR or loan term, so those two
//! penalties only apply to financed deals.
//!
//! The low-risk exception: when both APR and term are missing but the
//! deal shows no GAP or VSC overpricing and the financed amount is
//! under 90% of the price, the two penalties collapse into a single
//! capped -10 and nothing further is added for the uncertainty.

use crate::facts::DealFacts;
use crate::rules::{gap, vsc, Finding, RuleCheck};

/// Financed share of the price below which incomplete finance data is
/// considered low risk.
const LOW_RISK_FINANCED_SHARE: f64 = 0.90;

fn is_low_risk_incomplete(facts: &DealFacts) -> bool {
    if facts.apr.is_some() || facts.term_months.is_some() {
        return false;
    }
    if gap::is_overpriced(facts) || vsc::is_overpriced(facts) {
        return false;
    }
    match (facts.amount_financed, facts.selling_price) {
        (Some(financed), Some(price)) if price > 0.0 => {
            financed < price * LOW_RISK_FINANCED_SHARE
        }
        _ => false,
    }
}

pub struct MissingDataCheck;

impl RuleCheck for MissingDataCheck {
    fn name(&self) -> &'static str {
        "missing_data"
    }

    fn evaluate(&self, facts: &DealFacts) -> Vec<Finding> {
        let mut findings = Vec::new();

        if facts.msrp.is_none() {
            findings.push(Finding::red(
                "MSRP missing",
                "MSRP not found; pricing caps cannot be verified".to_string(),
                "MSRP",
                -10,
            ));
        }

        if facts.selling_price.is_none() {
            findings.push(Finding::blue_with_delta(
                "Selling price missing",
                "Selling price not found in the document".to_string(),
                "Selling Price",
                -5,
            ));
        }

        if !facts.financing.is_financed() {
            return findings;
        }

        if is_low_risk_incomplete(facts) {
            findings.push(Finding::blue_with_delta(
                "Incomplete finance data, low risk",
                "APR and loan term missing; no backend overpricing and financed amount \
                 is under 90% of the price, capped at a combined -10"
                    .to_string(),
                "APR / Loan Term",
                -10,
            ));
            return findings;
        }

        if facts.apr.is_none() {
            findings.push(Finding::blue_with_delta(
                "APR missing",
                "APR not found on a financed deal".to_string(),
                "APR",
                -5,
            ));
        }
        if facts.term_months.is_none() {
            findings.push(Finding::blue_with_delta(
                "Loan term missing",
                "Loan term not found on a financed deal".to_string(),
                "Loan Term",
                -5,
            ));
        }

        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::FlagColor;
    use crate::types::FinancingSource;

    fn complete_facts() -> DealFacts {
        DealFacts {
            msrp: Some(30_000.0),
            selling_price: Some(28_000.0),
            down_payment: Some(3_000.0),
            amount_financed: Some(25_000.0),
            apr: Some(6.9),
            term_months: Some(60),
            ..Default::default()
        }
    }

    #[test]
    fn test_complete_deal_no_findings() {
        assert!(MissingDataCheck.evaluate(&complete_facts()).is_empty());
    }

    #[test]
    fn test_missing_msrp_is_red_ten() {
        let mut facts = complete_facts();
        facts.msrp = None;

        let findings = MissingDataCheck.evaluate(&facts);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].color, FlagColor::Red);
        assert_eq!(findings[0].delta, -10);
    }

    #[test]
    fn test_missing_selling_price_is_blue_five() {
        let mut facts = complete_facts();
        facts.selling_price = None;

        let findings = MissingDataCheck.evaluate(&facts);
        assert_eq!(findings[0].color, FlagColor::Blue);
        assert_eq!(findings[0].delta, -5);
    }

    #[test]
    fn test_missing_apr_and_term_on_financed_deal() {
        let mut facts = complete_facts();
        facts.apr = None;
        facts.term_months = None;
        // financed 25k of 28k is over the 90% line? 25_000/28_000 ~ 0.89,
        // so push it over to exercise the separate penalties.
        facts.amount_financed = Some(26_000.0);

        let findings = MissingDataCheck.evaluate(&facts);
        let total: i32 = findings.iter().map(|f| f.delta).sum();
        assert_eq!(findings.len(), 2);
        assert_eq!(total, -10);
    }

    #[test]
    fn test_low_risk_incomplete_caps_at_ten() {
        let mut facts = complete_facts();
        facts.apr = None;
        facts.term_months = None;
        facts.amount_financed = Some(20_000.0);

        let findings = MissingDataCheck.evaluate(&facts);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].color, FlagColor::Blue);
        assert_eq!(findings[0].delta, -10);
    }

    #[test]
    fn test_overpricing_disables_low_risk_exception() {
        let mut facts = complete_facts();
        facts.apr = None;
        facts.term_months = None;
        facts.amount_financed = Some(20_000.0);
        facts.gap_price = Some(2_000.0);

        let findings = MissingDataCheck.evaluate(&facts);
        assert_eq!(findings.len(), 2);
    }

    #[test]
    fn test_cash_deal_skips_finance_penalties() {
        let mut facts = complete_facts();
        facts.financing = FinancingSource::Cash;
        facts.apr = None;
        facts.term_months = None;

        assert!(MissingDataCheck.evaluate(&facts).is_empty());
    }
}
