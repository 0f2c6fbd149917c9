//! Prompt construction for audit enrichment.
//!
//! The model does not score anything. The deterministic engine has
//! already produced the score, flags, caps, and deductions; the model
//! is asked only for the fields rules cannot derive (names, address,
//! date disambiguation) and for the narrative prose, grounded in the
//! engine's computed findings.

use dealscope_core::{AuditResult, DealRecord};
use serde_json::json;

/// System prompt for the enrichment call.
pub const ENRICHMENT_SYSTEM_PROMPT: &str = r#"You are the narrative writer for an auto-finance deal audit service.

The deal has ALREADY been scored by a deterministic rule engine. You will receive the OCR'd deal data and the engine's computed result: score, badge, red/green/blue flags, pricing caps, APR and term analysis, and bundle verdict. Those numbers are final. Do not recompute, adjust, or contradict them.

Your job is limited to two things:

1. IDENTITY FIELDS. From the OCR data, extract buyer_name, dealer_name, email, phone_number, address, state (2-letter code), vin_number, date, logo_text, and selling_price. Buyer indicators: "Buyer:", "Customer:", "Client:", "Applicant:", "Borrower:", "Purchaser:", or a top-left name with a phone number. Dealer indicators: "Salesperson:", "Contact Sales:", "Dealer:", or a top-right name; prefer the individual salesperson's name over the dealership name. Use null for anything you cannot find. Never invent a value.

2. NARRATIVE SECTIONS. Write vehicle_overview, trust_score_summary, market_comparison, gap_logic, vsc_logic, apr_bonus_rule, lease_audit, negotiation_insight, and final_recommendation. Reference the engine's actual figures (caps, charged amounts, score, deductions). If the engine marked the deal a lease, state "THIS IS A LEASE DEAL" in the vehicle overview. If it is not a lease, keep lease_audit to one brief sentence.

The engine's rulebook, for context only: GAP cap is min($1,500, 3% of MSRP) at $60k+ MSRP, else min($1,200, 3%); VSC cap is min($4,000, 15% of MSRP) under $40k MSRP, else min($6,000, 15%); overpricing deducts 10; add-ons over $500 deduct 5 (one item) or 8 (several); APR at or under 6.5% earns +5 and under 9.5% earns +2 on dealer financing only; terms of 75+ months deduct 5, 84+ deduct 7; backend totals of $6,000+ deduct 15; missing MSRP deducts 10.

Return exactly one JSON object matching the reply schema, with every top-level field present. Copy the engine's numeric fields through unchanged. No markdown fences, no commentary."#;

/// User message: the canonical deal JSON plus the engine's findings.
///
/// serde_json sorts object keys, so the serialization is canonical and
/// doubles as the cache key input.
pub fn enrichment_request(
    record: &DealRecord,
    engine_result: &AuditResult,
) -> Result<String, serde_json::Error> {
    let payload = json!({
        "deal": record,
        "engine_result": engine_result,
    });
    serde_json::to_string(&payload)
}

/// Canonical JSON of the deal alone, used for cache keying.
pub fn canonical_deal_json(record: &DealRecord) -> Result<String, serde_json::Error> {
    serde_json::to_string(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealscope_core::audit;

    #[test]
    fn test_request_carries_deal_and_engine_result() {
        let record = DealRecord::from_text("MSRP: $30,000\nGAP Insurance $1,000");
        let result = audit(&record).unwrap();
        let request = enrichment_request(&record, &result).unwrap();

        assert!(request.contains("GAP Insurance $1,000"));
        assert!(request.contains("\"score\""));
        assert!(request.contains("\"red_flags\""));
    }

    #[test]
    fn test_canonical_json_is_stable() {
        let record = DealRecord::from_text("Selling Price: $28,000");
        let first = canonical_deal_json(&record).unwrap();
        let second = canonical_deal_json(&record).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_system_prompt_pins_the_engine_numbers() {
        assert!(ENRICHMENT_SYSTEM_PROMPT.contains("ALREADY been scored"));
        assert!(ENRICHMENT_SYSTEM_PROMPT.contains("Do not recompute"));
        assert!(ENRICHMENT_SYSTEM_PROMPT.contains("one JSON object"));
    }
}
