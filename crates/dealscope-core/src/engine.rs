//! Audit synthesis.
//!
//! Runs the full rulebook over a deal record and folds the findings
//! into the final [`AuditResult`]. The same record always produces the
//! same score, flags, and narrative (timestamps aside); nothing here
//! touches the network or the environment.

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::facts::{self, DealFacts};
use crate::narrative;
use crate::rules::{self, financing, gap, term, vsc, FlagColor};
use crate::types::{
    AprSummary, AuditResult, Badge, BundleAbuse, DealRecord, Flag, FinancingSource,
    NormalizedPricing, QuoteType, Region, TermSummary,
};

pub const BASE_SCORE: i32 = 100;

lazy_static! {
    static ref PURCHASE_AGREEMENT: Regex = Regex::new(r"(?i)\bpurchase\s+agreement\b").unwrap();
    static ref PENCIL: Regex = Regex::new(r"(?i)\b(?:pencil|deal\s+sheet|worksheet)\b").unwrap();
}

/// Run the deterministic audit over a normalized record.
pub fn evaluate(record: &DealRecord) -> AuditResult {
    let facts = facts::extract(record);
    let mut red_flags = Vec::new();
    let mut green_flags = Vec::new();
    let mut blue_flags = Vec::new();
    let mut delta_total = 0i32;

    for check in rules::all_checks() {
        let findings = check.evaluate(&facts);
        debug!(check = check.name(), findings = findings.len(), "rule check evaluated");
        for finding in findings {
            delta_total += finding.delta;
            let flag = Flag {
                label: finding.label,
                message: finding.message,
                item: finding.item,
                delta: finding.delta,
            };
            match finding.color {
                FlagColor::Red => red_flags.push(flag),
                FlagColor::Green => green_flags.push(flag),
                FlagColor::Blue => blue_flags.push(flag),
            }
        }
    }

    let score = (BASE_SCORE + delta_total).clamp(0, 100) as u8;
    let badge = Badge::for_score(score);
    let pricing = normalized_pricing(&facts);
    let bundle_deduction = red_flags
        .iter()
        .find(|flag| flag.item == "Backend Products")
        .map(|flag| flag.delta)
        .unwrap_or(0);

    debug!(score, ?badge, flags = red_flags.len() + green_flags.len() + blue_flags.len(), "audit synthesized");

    let region = Region::from_state(facts.identity.state.as_deref());
    let narrative = narrative::generate(
        &facts,
        score,
        badge,
        &pricing,
        &red_flags,
        &green_flags,
        &blue_flags,
    );

    AuditResult {
        score,
        badge,
        buyer_name: facts.identity.buyer_name.clone(),
        dealer_name: facts.identity.dealer_name.clone(),
        logo_text: facts.identity.logo_text.clone(),
        email: facts.identity.email.clone(),
        phone_number: facts.identity.phone_number.clone(),
        address: facts.identity.address.clone(),
        state: facts.identity.state.clone(),
        region,
        selling_price: facts.selling_price,
        vin_number: facts.identity.vin_number.clone(),
        date: facts.identity.date.clone(),
        buyer_message: buyer_message(score, badge, &red_flags),
        red_flags,
        green_flags,
        blue_flags,
        normalized_pricing: pricing,
        apr: AprSummary {
            listed: facts.apr,
            bonus: facts
                .apr
                .map(|rate| financing::bonus_for(rate, facts.financing))
                .unwrap_or(0),
            source: facts.financing,
        },
        term: TermSummary {
            months: facts.term_months,
            risk_deduction: match (facts.is_lease, facts.term_months) {
                (false, Some(months)) => term::risk_deduction(months),
                _ => 0,
            },
        },
        quote_type: classify_quote(&record.text, &facts),
        bundle_abuse: BundleAbuse {
            active: bundle_deduction < 0,
            deduction: bundle_deduction,
        },
        narrative,
        evaluated_at: Utc::now(),
    }
}

fn normalized_pricing(facts: &DealFacts) -> NormalizedPricing {
    // No MSRP means no caps; the missing-MSRP red flag covers it.
    let (gap_cap, vsc_cap) = match facts.msrp {
        Some(msrp) => (gap::cap(msrp), vsc::cap(msrp)),
        None => (0.0, 0.0),
    };
    NormalizedPricing {
        gap_cap,
        vsc_cap,
        bundle_total: facts.backend_total(),
    }
}

fn classify_quote(text: &str, facts: &DealFacts) -> QuoteType {
    if facts.is_lease {
        QuoteType::Lease
    } else if facts.financing == FinancingSource::Cash {
        QuoteType::CashOffer
    } else if PURCHASE_AGREEMENT.is_match(text) {
        QuoteType::PurchaseAgreement
    } else if PENCIL.is_match(text) {
        QuoteType::Pencil
    } else {
        QuoteType::Unknown
    }
}

fn buyer_message(score: u8, badge: Badge, red_flags: &[Flag]) -> String {
    match badge {
        Badge::Gold => format!("Exceptional deal ({score}/100). Terms are fair across the board."),
        Badge::Silver => format!("Good deal ({score}/100). A few items are worth a second look."),
        Badge::Bronze => format!(
            "Acceptable deal ({score}/100). Negotiate the {} flagged item(s) before signing.",
            red_flags.len()
        ),
        Badge::Red => format!(
            "Review before signing ({score}/100). {} critical issue(s) were flagged.",
            red_flags.len()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(text: &str) -> DealRecord {
        DealRecord::from_text(text)
    }

    #[test]
    fn test_clean_deal_scores_high() {
        let result = evaluate(&record(
            "MSRP: $30,000\nSelling Price: $28,000\nDown Payment: $3,000\n\
             APR: 5.9%\nLoan Term: 48 months\nGAP Insurance $850\nExtended Warranty $3,900",
        ));
        // +5 APR bonus, no deductions.
        assert_eq!(result.score, 100);
        assert_eq!(result.badge, Badge::Gold);
        assert!(result.red_flags.is_empty());
        assert_eq!(result.apr.bonus, 5);
        assert_eq!(result.normalized_pricing.gap_cap, 900.0);
        assert_eq!(result.normalized_pricing.vsc_cap, 4_000.0);
    }

    #[test]
    fn test_rulebook_example_deal() {
        // MSRP $30k: GAP cap $900, charged $1,000 -> -10.
        let result = evaluate(&record(
            "MSRP: $30,000\nSelling Price: $28,000\nDown Payment: $3,000\n\
             APR: 7.2%\nLoan Term: 72 months\nGAP Insurance $1,000",
        ));
        // -10 GAP, +2 APR bonus.
        assert_eq!(result.score, 92);
        let gap_flag = &result.red_flags[0];
        assert!(gap_flag.message.contains("$900"));
        assert!(gap_flag.message.contains("$1000"));
        assert_eq!(gap_flag.delta, -10);
    }

    #[test]
    fn test_stacked_deductions() {
        let result = evaluate(&record(
            "Selling Price: $28,000\nLoan Term: 84 months\n\
             GAP $1,400\nVSC $4,800\nNitrogen Fill $400\nGPS Tracking $400",
        ));
        // MSRP missing -10, APR missing -5, term -7, bundle 7_000 -> -15,
        // two fluff items totaling $800 -> -8, GAP/VSC unverifiable (blue, 0).
        assert_eq!(result.score, 55);
        assert_eq!(result.badge, Badge::Red);
        assert!(result.bundle_abuse.active);
        assert_eq!(result.bundle_abuse.deduction, -15);
        assert_eq!(result.term.risk_deduction, -7);
    }

    #[test]
    fn test_flag_completeness() {
        let deal = record("MSRP: $30,000\nGAP Insurance $1,000\nAPR: 7.2%\nLoan Term: 72 months");
        let result = evaluate(&deal);

        // Re-run the checks directly: every finding must surface as
        // exactly one flag, none dropped, none duplicated.
        let facts = facts::extract(&deal);
        let findings: usize = rules::all_checks()
            .iter()
            .map(|check| check.evaluate(&facts).len())
            .sum();
        assert_eq!(result.flag_count(), findings);
        // gap red, vsc blue, apr green, selling price blue.
        assert!(result.flag_count() >= 4);
    }

    #[test]
    fn test_cash_deal_classification() {
        let result = evaluate(&record(
            "Cash Offer\nMSRP: $25,000\nSelling Price: $24,000\nthis is a cash deal",
        ));
        assert_eq!(result.quote_type, QuoteType::CashOffer);
        assert_eq!(result.apr.source, FinancingSource::Cash);
        assert_eq!(result.apr.bonus, 0);
        // No APR/term penalties on a cash deal.
        assert!(result
            .blue_flags
            .iter()
            .all(|flag| flag.item != "APR" && flag.item != "Loan Term"));
    }

    #[test]
    fn test_lease_classification_and_term_skip() {
        let result = evaluate(&record(
            "Lease | 39 Months\nMSRP: $32,000\nSelling Price: $30,000\nAPR: 6.0%",
        ));
        assert_eq!(result.quote_type, QuoteType::Lease);
        assert_eq!(result.term.risk_deduction, 0);
        assert!(result.narrative.lease_audit.contains("lease"));
    }

    #[test]
    fn test_region_from_extracted_state() {
        let result = evaluate(&record(
            "MSRP: $30,000\nAddress: 1200 Main St, Houston, TX 77002",
        ));
        assert_eq!(result.state.as_deref(), Some("TX"));
        assert_eq!(result.region, Region::South);
    }

    #[test]
    fn test_region_defaults_outside_us() {
        let result = evaluate(&record("MSRP: $30,000"));
        assert_eq!(result.region, Region::OutsideUs);
    }

    #[test]
    fn test_low_risk_incomplete_combined_cap() {
        let result = evaluate(&record(
            "MSRP: $30,000\nSelling Price: $28,000\nDown Payment: $8,000",
        ));
        let combined: Vec<_> = result
            .blue_flags
            .iter()
            .filter(|flag| flag.item == "APR / Loan Term")
            .collect();
        assert_eq!(combined.len(), 1);
        assert_eq!(combined[0].delta, -10);
    }

    proptest! {
        /// The score never leaves [0, 100] whatever the document says.
        #[test]
        fn prop_score_bounded(text in "\\PC{0,400}") {
            let result = evaluate(&record(&text));
            prop_assert!(result.score <= 100);
        }

        /// Badge always matches the score band.
        #[test]
        fn prop_badge_matches_band(text in "\\PC{0,400}") {
            let result = evaluate(&record(&text));
            prop_assert_eq!(result.badge, Badge::for_score(result.score));
        }
    }
}
