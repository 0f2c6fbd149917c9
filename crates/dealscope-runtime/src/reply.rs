//! Reply validation and repair.
//!
//! The model's reply is untrusted input. This module defends the
//! contract: pull the JSON out of whatever wrapper came back, validate
//! it against the embedded schema, default the identity fields that
//! may legitimately be unknown, and hard-fail on anything financial
//! that is missing. Errors carry the raw reply text so a bad upstream
//! response can be diagnosed from the error alone.

use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

use dealscope_core::{narrative, Narrative, Region};

/// Embedded reply schema (loaded at compile time).
const REPLY_SCHEMA_JSON: &str = include_str!("../../../spec/audit_reply.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Identity fields the model may legitimately fail to extract; these
/// default to null instead of failing validation.
const NULLABLE_IDENTITY_FIELDS: [&str; 5] =
    ["buyer_name", "dealer_name", "address", "state", "region"];

/// Every top-level field the reply contract requires.
const REQUIRED_FIELDS: [&str; 23] = [
    "score",
    "buyer_name",
    "logo_text",
    "dealer_name",
    "email",
    "phone_number",
    "address",
    "state",
    "region",
    "selling_price",
    "vin_number",
    "date",
    "badge",
    "buyer_message",
    "red_flags",
    "green_flags",
    "blue_flags",
    "normalized_pricing",
    "apr",
    "term",
    "quote_type",
    "bundle_abuse",
    "narrative",
];

/// Errors from reply validation.
#[derive(Error, Debug)]
pub enum ReplyError {
    #[error("malformed reply: no valid JSON object found")]
    Malformed { raw: String },

    #[error("reply missing required field '{field}'")]
    ContractViolation { field: String, raw: String },

    #[error("reply violates schema: {detail}")]
    SchemaViolation { detail: String, raw: String },
}

impl ReplyError {
    /// The raw upstream text that triggered the error.
    pub fn raw_response(&self) -> &str {
        match self {
            ReplyError::Malformed { raw }
            | ReplyError::ContractViolation { raw, .. }
            | ReplyError::SchemaViolation { raw, .. } => raw,
        }
    }
}

/// The trusted subset of a validated reply: identity and prose only.
/// Numeric audit fields never leave this module; the engine's values
/// are authoritative.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedReply {
    pub buyer_name: Option<String>,
    pub dealer_name: Option<String>,
    pub logo_text: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub region: Region,
    pub selling_price: Option<f64>,
    pub vin_number: Option<String>,
    pub date: Option<String>,
    pub buyer_message: Option<String>,
    pub narrative: Narrative,
}

/// Extract the first balanced top-level JSON object from raw text.
///
/// Handles markdown fences, leading prose, and trailing commentary.
/// String contents are tracked so braces inside values do not
/// unbalance the scan.
pub fn extract_json(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let bytes = raw.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn get_validator() -> Result<&'static jsonschema::Validator, String> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = match serde_json::from_str(REPLY_SCHEMA_JSON) {
            Ok(v) => v,
            Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
        };

        match jsonschema::options().build(&schema_value) {
            Ok(v) => Ok(v),
            Err(e) => Err(format!("Failed to compile schema: {}", e)),
        }
    });

    match result {
        Ok(v) => Ok(v),
        Err(e) => Err(e.clone()),
    }
}

/// Validate a raw upstream reply and extract its trusted subset.
pub fn validate(raw: &str) -> Result<ValidatedReply, ReplyError> {
    let json_text = extract_json(raw).ok_or_else(|| ReplyError::Malformed {
        raw: raw.to_string(),
    })?;

    let mut value: serde_json::Value =
        serde_json::from_str(json_text).map_err(|_| ReplyError::Malformed {
            raw: raw.to_string(),
        })?;

    let object = value.as_object_mut().ok_or_else(|| ReplyError::Malformed {
        raw: raw.to_string(),
    })?;

    // Identity fields default to null; everything else must be there.
    for field in NULLABLE_IDENTITY_FIELDS {
        object
            .entry(field)
            .or_insert(serde_json::Value::Null);
    }
    for field in REQUIRED_FIELDS {
        if !object.contains_key(field) {
            return Err(ReplyError::ContractViolation {
                field: field.to_string(),
                raw: raw.to_string(),
            });
        }
    }

    let validator = get_validator().map_err(|detail| ReplyError::SchemaViolation {
        detail,
        raw: raw.to_string(),
    })?;
    if let Some(error) = validator.iter_errors(&value).next() {
        return Err(ReplyError::SchemaViolation {
            detail: format!("{} at {}", error, error.instance_path),
            raw: raw.to_string(),
        });
    }

    debug!("reply passed contract validation");
    Ok(build_reply(&value))
}

fn build_reply(value: &serde_json::Value) -> ValidatedReply {
    let string_field = |key: &str| {
        value[key]
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    let state = string_field("state");
    let region = match value["region"].as_str() {
        Some("West") => Region::West,
        Some("South") => Region::South,
        Some("North") => Region::North,
        Some("East") => Region::East,
        Some("Outside US") => Region::OutsideUs,
        // Absent region: classify from the state if present, else
        // Outside US.
        _ => Region::from_state(state.as_deref()),
    };

    let mut sections = Narrative::default();
    if let Some(narrative_value) = value["narrative"].as_object() {
        for section in Narrative::SECTIONS {
            if let Some(text) = narrative_value.get(section).and_then(|v| v.as_str()) {
                sections.set(section, text.to_string());
            }
        }
    }
    narrative::apply_fallbacks(&mut sections);

    ValidatedReply {
        buyer_name: string_field("buyer_name"),
        dealer_name: string_field("dealer_name"),
        logo_text: string_field("logo_text"),
        email: string_field("email"),
        phone_number: string_field("phone_number"),
        address: string_field("address"),
        state,
        region,
        selling_price: value["selling_price"].as_f64(),
        vin_number: string_field("vin_number"),
        date: string_field("date"),
        buyer_message: string_field("buyer_message"),
        narrative: sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete_reply() -> serde_json::Value {
        json!({
            "score": 92,
            "buyer_name": "Martin Bowden",
            "dealer_name": "Dylan Herlehy",
            "logo_text": "Shottenkirk Kia",
            "email": "martin@example.com",
            "phone_number": "+1(979) 229-0953",
            "address": "1200 Main St, Houston, TX 77002",
            "state": "TX",
            "region": "South",
            "badge": "Gold",
            "selling_price": 28000.0,
            "vin_number": "1HGCM82633A004352",
            "date": "2025-09-25",
            "buyer_message": "Solid deal with one overpriced item.",
            "red_flags": [
                {"type": "GAP overpriced", "message": "GAP overpriced by $100", "item": "GAP Insurance", "deduction": -10}
            ],
            "green_flags": [],
            "blue_flags": [],
            "normalized_pricing": {"gap_cap": 900.0, "vsc_cap": 4000.0, "bundle_total": 1000.0},
            "apr": {"listed": 7.2, "bonus": 2, "source": "Dealer"},
            "term": {"months": 72, "risk_deduction": 0},
            "quote_type": "Pencil",
            "bundle_abuse": {"active": false, "deduction": 0},
            "narrative": {
                "vehicle_overview": "A sedan in good condition.",
                "trust_score_summary": "Strong score overall.",
                "market_comparison": "GAP is above cap.",
                "gap_logic": "GAP exceeds the computed cap.",
                "vsc_logic": "No VSC included.",
                "apr_bonus_rule": "APR earned the +2 bonus.",
                "lease_audit": "This deal is not a lease.",
                "negotiation_insight": "Challenge the GAP price.",
                "final_recommendation": "Negotiate GAP, then proceed."
            }
        })
    }

    #[test]
    fn test_plain_json_validates() {
        let raw = complete_reply().to_string();
        let reply = validate(&raw).unwrap();
        assert_eq!(reply.buyer_name.as_deref(), Some("Martin Bowden"));
        assert_eq!(reply.region, Region::South);
        assert_eq!(reply.narrative.gap_logic, "GAP exceeds the computed cap.");
    }

    #[test]
    fn test_markdown_fenced_json_accepted() {
        let raw = format!("```json\n{}\n```\nHope this helps!", complete_reply());
        assert!(validate(&raw).is_ok());
    }

    #[test]
    fn test_non_json_is_malformed_with_raw() {
        let raw = "I could not audit this document.";
        match validate(raw) {
            Err(ReplyError::Malformed { raw: attached }) => assert_eq!(attached, raw),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_score_is_contract_violation() {
        let mut value = complete_reply();
        value.as_object_mut().unwrap().remove("score");
        match validate(&value.to_string()) {
            Err(ReplyError::ContractViolation { field, .. }) => assert_eq!(field, "score"),
            other => panic!("expected ContractViolation, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_buyer_name_defaults_to_null() {
        let mut value = complete_reply();
        value.as_object_mut().unwrap().remove("buyer_name");
        let reply = validate(&value.to_string()).unwrap();
        assert_eq!(reply.buyer_name, None);
    }

    #[test]
    fn test_missing_region_backfills_from_state() {
        let mut value = complete_reply();
        value.as_object_mut().unwrap().remove("region");
        let reply = validate(&value.to_string()).unwrap();
        assert_eq!(reply.region, Region::South);
    }

    #[test]
    fn test_missing_region_and_state_is_outside_us() {
        let mut value = complete_reply();
        let object = value.as_object_mut().unwrap();
        object.remove("region");
        object.remove("state");
        let reply = validate(&value.to_string()).unwrap();
        assert_eq!(reply.region, Region::OutsideUs);
    }

    #[test]
    fn test_narrative_none_gets_fallback() {
        let mut value = complete_reply();
        value["narrative"]["lease_audit"] = json!("None");
        let reply = validate(&value.to_string()).unwrap();
        assert_eq!(reply.narrative.lease_audit, narrative::fallback("lease_audit"));
    }

    #[test]
    fn test_out_of_range_score_is_schema_violation() {
        let mut value = complete_reply();
        value["score"] = json!(150);
        assert!(matches!(
            validate(&value.to_string()),
            Err(ReplyError::SchemaViolation { .. })
        ));
    }

    #[test]
    fn test_extract_json_ignores_braces_in_strings() {
        let raw = r#"prefix {"message": "has } brace", "n": 1} suffix"#;
        let extracted = extract_json(raw).unwrap();
        assert_eq!(extracted, r#"{"message": "has } brace", "n": 1}"#);
        let parsed: serde_json::Value = serde_json::from_str(extracted).unwrap();
        assert_eq!(parsed["n"], 1);
    }

    #[test]
    fn test_extract_json_unbalanced_is_none() {
        assert!(extract_json("{\"truncated\": ").is_none());
        assert!(extract_json("no json here").is_none());
    }
}
