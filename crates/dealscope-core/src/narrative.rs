//! Narrative section generation and fallbacks.
//!
//! The engine always produces a complete deterministic narrative from
//! the computed findings. When a model-written narrative is merged in
//! later, any section that comes back empty or as the literal "none"
//! is replaced by the fixed fallback below, so callers never see a
//! blank section.

use crate::facts::DealFacts;
use crate::rules::{dollars, financing, gap, vsc};
use crate::types::{Badge, Flag, Narrative, NormalizedPricing};

/// Fixed replacement text for an absent section. Unknown keys get the
/// generic final-recommendation fallback rather than an empty string.
pub fn fallback(section: &str) -> &'static str {
    match section {
        "vehicle_overview" => {
            "Vehicle overview information is missing. Please include details about the \
             make, model, year, mileage, condition, and key features of the vehicle."
        }
        "trust_score_summary" => {
            "No trust score summary provided. Please include insights on fairness, \
             transparency, and APR context."
        }
        "market_comparison" => {
            "No market comparison found. Include pricing comparisons for GAP, VSC, and \
             total deal structure."
        }
        "gap_logic" => {
            "GAP pricing information is missing. However, GAP can be beneficial for \
             buyers with high loan-to-value ratios, low down payments, or long-term \
             loans. Assess buyer risk and discuss coverage value."
        }
        "vsc_logic" => {
            "VSC price data is unavailable. Still, extended warranties may be useful \
             for buyers planning to keep the car long-term or purchasing a vehicle with \
             uncertain reliability."
        }
        "apr_bonus_rule" => {
            "APR data not found. Ensure APR is competitive (6.5-9.5% typical). If too \
             high, negotiate a rate reduction or explore outside financing."
        }
        "lease_audit" => {
            "If the deal is a lease, check the lease terms including residual value, \
             money factor, lease duration, monthly payments, and implications for the \
             buyer's financial risk and benefits."
        }
        "negotiation_insight" => {
            "Ask to waive unnecessary fees, negotiate APR and monthly payments, and \
             request added perks such as free service or better warranty coverage."
        }
        _ => {
            "Final recommendation is missing. Please provide a concise summary of key \
             findings and next steps for the buyer."
        }
    }
}

/// Whether a model-provided section value counts as absent.
pub fn is_absent(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none")
}

/// Replace every absent section with its fallback.
pub fn apply_fallbacks(narrative: &mut Narrative) {
    for section in Narrative::SECTIONS {
        let absent = narrative.get(section).is_some_and(is_absent);
        if absent {
            narrative.set(section, fallback(section).to_string());
        }
    }
}

/// Build the full deterministic narrative from the computed audit.
pub fn generate(
    facts: &DealFacts,
    score: u8,
    badge: Badge,
    pricing: &NormalizedPricing,
    red_flags: &[Flag],
    green_flags: &[Flag],
    blue_flags: &[Flag],
) -> Narrative {
    Narrative {
        vehicle_overview: vehicle_overview(facts),
        trust_score_summary: trust_score_summary(score, badge, red_flags, green_flags, blue_flags),
        market_comparison: market_comparison(facts, pricing),
        gap_logic: gap_logic(facts, pricing),
        vsc_logic: vsc_logic(facts, pricing),
        apr_bonus_rule: apr_bonus_rule(facts),
        lease_audit: lease_audit(facts),
        negotiation_insight: negotiation_insight(red_flags, green_flags),
        final_recommendation: final_recommendation(score, badge, red_flags),
    }
}

fn vehicle_overview(facts: &DealFacts) -> String {
    let mut parts = Vec::new();
    if facts.is_lease {
        parts.push("THIS IS A LEASE DEAL.".to_string());
    }
    match facts.identity.vin_number.as_deref() {
        Some(vin) => parts.push(format!("Vehicle identified by VIN {vin}.")),
        None => parts.push("No VIN was found in the document.".to_string()),
    }
    if let Some(mileage) = facts.mileage {
        parts.push(format!("Odometer reads {} miles.", mileage as i64));
    }
    match (facts.msrp, facts.selling_price) {
        (Some(msrp), Some(price)) => parts.push(format!(
            "MSRP is {} with a selling price of {}.",
            dollars(msrp),
            dollars(price)
        )),
        (Some(msrp), None) => parts.push(format!("MSRP is {}.", dollars(msrp))),
        (None, Some(price)) => parts.push(format!("Selling price is {}.", dollars(price))),
        (None, None) => parts.push("Neither MSRP nor selling price was found.".to_string()),
    }
    parts.join(" ")
}

fn trust_score_summary(
    score: u8,
    badge: Badge,
    red_flags: &[Flag],
    green_flags: &[Flag],
    blue_flags: &[Flag],
) -> String {
    let deductions: i32 = red_flags
        .iter()
        .chain(blue_flags.iter())
        .map(|flag| flag.delta)
        .filter(|delta| *delta < 0)
        .sum();
    let bonuses: i32 = green_flags.iter().map(|flag| flag.delta).sum();
    format!(
        "This deal scores {score}/100 ({badge:?} badge) after {deductions} in deductions \
         and +{bonuses} in bonuses. {} red flag(s) mark issues to challenge, {} green \
         flag(s) mark terms worth keeping, and {} blue flag(s) are advisory.",
        red_flags.len(),
        green_flags.len(),
        blue_flags.len()
    )
}

fn market_comparison(facts: &DealFacts, pricing: &NormalizedPricing) -> String {
    let mut parts = Vec::new();
    if let (Some(charged), true) = (facts.gap_price, pricing.gap_cap > 0.0) {
        let relation = if charged > pricing.gap_cap { "above" } else { "within" };
        parts.push(format!(
            "GAP at {} is {} the {} cap for this MSRP.",
            dollars(charged),
            relation,
            dollars(pricing.gap_cap)
        ));
    }
    if let (Some(charged), true) = (facts.vsc_price, pricing.vsc_cap > 0.0) {
        let relation = if charged > pricing.vsc_cap { "above" } else { "within" };
        parts.push(format!(
            "VSC at {} is {} the {} cap (15% of MSRP rule).",
            dollars(charged),
            relation,
            dollars(pricing.vsc_cap)
        ));
    }
    if pricing.bundle_total > 0.0 {
        parts.push(format!(
            "Backend products total {}.",
            dollars(pricing.bundle_total)
        ));
    }
    if parts.is_empty() {
        parts.push("No backend products were priced in this deal to compare.".to_string());
    }
    parts.join(" ")
}

fn gap_logic(facts: &DealFacts, pricing: &NormalizedPricing) -> String {
    match facts.gap_price {
        Some(charged) if pricing.gap_cap > 0.0 && charged > pricing.gap_cap => format!(
            "GAP is overpriced: charged {} against a cap of {}. Negotiate it down or \
             source GAP from your own insurer.",
            dollars(charged),
            dollars(pricing.gap_cap)
        ),
        Some(charged) => format!(
            "GAP is present at {} and within the computed cap. It protects against \
             negative equity if the vehicle is totaled early in the loan.",
            dollars(charged)
        ),
        None if gap::missing_high_risk(facts) => {
            "GAP is missing on a high-risk structure ($0 down with a 75+ month term); \
             the buyer would be exposed to the full negative-equity gap. Adding GAP at \
             or below the cap is strongly advised."
                .to_string()
        }
        None => "GAP is not part of this deal. With meaningful money down or a shorter \
                 term the exposure is limited, but review loan-to-value before passing."
            .to_string(),
    }
}

fn vsc_logic(facts: &DealFacts, pricing: &NormalizedPricing) -> String {
    match facts.vsc_price {
        Some(charged) if pricing.vsc_cap > 0.0 && charged > pricing.vsc_cap => format!(
            "VSC is overpriced: charged {} against a cap of {}. Ask for the itemized \
             warranty pricing or decline the contract.",
            dollars(charged),
            dollars(pricing.vsc_cap)
        ),
        Some(charged) => format!(
            "VSC is present at {} and within the computed cap, reasonable coverage if \
             the vehicle will be kept past the factory warranty.",
            dollars(charged)
        ),
        None => {
            let advisory = facts.mileage.is_some_and(|m| m >= 60_000.0)
                && facts.term_months.is_some_and(|t| t >= 72);
            if advisory {
                "No VSC is included. Given the high mileage and long financing term, a \
                 fairly priced service contract is worth considering."
                    .to_string()
            } else {
                "No VSC is included in this deal.".to_string()
            }
        }
    }
}

fn apr_bonus_rule(facts: &DealFacts) -> String {
    use crate::types::FinancingSource;
    match (facts.apr, facts.financing) {
        (_, FinancingSource::Cash) => {
            "No APR bonus applies: this is a cash deal with no dealer financing.".to_string()
        }
        (_, FinancingSource::OutsideBank) => {
            "No APR bonus applies: financing is arranged outside the dealer, so the \
             dealer-rate bonus rule is out of scope."
                .to_string()
        }
        (Some(apr), FinancingSource::Dealer) => {
            let bonus = financing::bonus_for(apr, FinancingSource::Dealer);
            match bonus {
                5 => format!(
                    "Dealer APR of {apr}% qualifies for the +5 excellent-rate bonus \
                     (at or below {}%).",
                    financing::EXCELLENT_APR
                ),
                2 => format!(
                    "Dealer APR of {apr}% earns the +2 competitive-rate bonus \
                     (at or below {}%).",
                    financing::COMPETITIVE_APR
                ),
                _ => format!(
                    "Dealer APR of {apr}% earns no bonus; a rate at or below {}% would \
                     qualify.",
                    financing::COMPETITIVE_APR
                ),
            }
        }
        (None, FinancingSource::Dealer) => {
            "No APR was found, so the dealer-rate bonus could not be evaluated.".to_string()
        }
    }
}

fn lease_audit(facts: &DealFacts) -> String {
    if facts.is_lease {
        let term = facts
            .term_months
            .map(|t| format!(" over {t} months"))
            .unwrap_or_default();
        format!(
            "This is a lease deal{term}. Verify the residual value, money factor, \
             mileage allowance, and disposition fee; the trust score above covers the \
             backend products, not lease-specific economics."
        )
    } else {
        "This deal is not a lease.".to_string()
    }
}

fn negotiation_insight(red_flags: &[Flag], green_flags: &[Flag]) -> String {
    let mut parts = Vec::new();
    if red_flags.is_empty() {
        parts.push("No red-flag items require challenge.".to_string());
    } else {
        let items: Vec<&str> = red_flags.iter().map(|flag| flag.label.as_str()).collect();
        parts.push(format!("Challenge these items first: {}.", items.join("; ")));
    }
    if !green_flags.is_empty() {
        let items: Vec<&str> = green_flags.iter().map(|flag| flag.label.as_str()).collect();
        parts.push(format!("Preserve what already works: {}.", items.join("; ")));
    }
    parts.push(
        "Ask for an itemized backend breakdown before signing and be prepared to \
         remove any product that exceeds its cap."
            .to_string(),
    );
    parts.join(" ")
}

fn final_recommendation(score: u8, badge: Badge, red_flags: &[Flag]) -> String {
    let verdict = match badge {
        Badge::Gold => "Proceed; this deal is priced fairly across the board.",
        Badge::Silver => "Proceed after addressing the noted items; the structure is sound.",
        Badge::Bronze => "Negotiate before signing; several terms leave money on the table.",
        Badge::Red => "Do not sign as-is; renegotiate or walk away.",
    };
    format!(
        "Score {score}/100. {verdict} {} red flag(s) drive the deductions; resolve \
         them in order of deduction size and re-check the total backend cost against \
         the caps above.",
        red_flags.len()
    )
}
