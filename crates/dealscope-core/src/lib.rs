//! # dealscope-core
//!
//! Deterministic auto-finance deal audit engine.
//!
//! This crate turns OCR output from a deal sheet into a scored audit,
//! answering:
//! - Is this deal priced fairly against the rulebook caps?
//! - What should the buyer challenge, keep, or ask about?
//! - How trustworthy is the deal overall (0-100)?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same input always produces same output
//! 2. **No LLM calls**: All scoring is rule-based; model-written prose
//!    is layered on elsewhere and never changes a number
//! 3. **Itemized**: Every deduction and bonus appears as a flag with
//!    the computed figures in its message
//! 4. **Total**: Malformed or empty documents still audit; missing
//!    data becomes findings, not errors
//!
//! ## Example
//!
//! ```rust,ignore
//! use dealscope_core::{audit, DealRecord};
//!
//! let record = DealRecord::from_text("MSRP: $30,000\nGAP Insurance $1,000");
//! let result = audit(&record)?;
//! println!("{} ({:?})", result.score, result.badge);
//! for flag in &result.red_flags {
//!     println!("  {}: {}", flag.label, flag.message);
//! }
//! ```

pub mod apr;
pub mod document;
pub mod engine;
pub mod facts;
pub mod narrative;
pub mod normalizer;
pub mod region;
pub mod rules;
pub mod types;

// Re-export main types at crate root
pub use apr::select_apr;
pub use document::OcrDocument;
pub use facts::{DealFacts, FluffItem, IdentityFacts};
pub use normalizer::normalize;
pub use region::extract_state;
pub use rules::{Finding, FlagColor, RuleCheck};
pub use types::{
    AprSummary, AuditResult, Badge, BundleAbuse, DealRecord, FinancingSource, Flag, FormField,
    LogoText, Narrative, NormalizedPricing, QuoteType, Region, TermSummary,
};

use thiserror::Error;

/// Errors that can occur during an audit
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Invalid deal record: {0}")]
    InvalidRecord(String),
}

/// Audit a normalized deal record.
///
/// This is the main entry point for deterministic evaluation. The
/// record's text may be empty; the audit then consists almost entirely
/// of missing-data findings. The only rejected input is a record whose
/// text exceeds the hard size limit, which indicates a caller bug
/// rather than a bad deal sheet.
pub fn audit(record: &DealRecord) -> Result<AuditResult, AuditError> {
    const MAX_TEXT_BYTES: usize = 1 << 20;
    if record.text.len() > MAX_TEXT_BYTES {
        return Err(AuditError::InvalidRecord(format!(
            "document text of {} bytes exceeds the {} byte limit",
            record.text.len(),
            MAX_TEXT_BYTES
        )));
    }
    Ok(engine::evaluate(record))
}

/// Audit a raw OCR document: normalize, then audit.
pub fn audit_document(document: &OcrDocument) -> Result<AuditResult, AuditError> {
    audit(&normalizer::normalize(document))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_audit() {
        let record = DealRecord::from_text(
            "MSRP: $30,000\nSelling Price: $28,000\nDown Payment: $3,000\n\
             APR: 5.9%\nLoan Term: 48 months",
        );
        let result = audit(&record).unwrap();
        assert!(result.score >= 90);
        assert_eq!(result.badge, Badge::for_score(result.score));
    }

    #[test]
    fn test_empty_record_still_audits() {
        let result = audit(&DealRecord::default()).unwrap();
        assert!(result.score < 100);
        assert!(result
            .red_flags
            .iter()
            .any(|flag| flag.item == "MSRP"));
    }

    #[test]
    fn test_oversized_text_is_rejected() {
        let record = DealRecord::from_text("x".repeat((1 << 20) + 1));
        assert!(matches!(
            audit(&record),
            Err(AuditError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_determinism_modulo_timestamp() {
        let record = DealRecord::from_text("MSRP: $30,000\nGAP Insurance $1,000");
        let mut first = audit(&record).unwrap();
        let mut second = audit(&record).unwrap();
        first.evaluated_at = second.evaluated_at;
        second.evaluated_at = first.evaluated_at;
        assert_eq!(first, second);
    }
}
