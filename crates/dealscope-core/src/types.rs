//! Shared types for the audit pipeline.
//!
//! A [`DealRecord`] is built once per request from OCR output and never
//! mutated afterwards. An [`AuditResult`] is produced once by the engine,
//! optionally enriched by the runtime, and returned to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A labeled form field detected by the OCR service.
///
/// Absence of a value stays `None`. The normalizer never substitutes a
/// default price for a missing field; only the engine's missing-data
/// rules may react to absence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormField {
    /// Field label as printed on the document (e.g. "Selling Price:").
    pub name: String,

    /// Field value text, if a value region was detected.
    #[serde(default)]
    pub value: Option<String>,

    /// OCR confidence of the value region, in [0, 1].
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// A header-region or vision-extracted text candidate for the dealer logo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogoText {
    pub text: String,

    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Normalized, audit-ready view of one deal document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DealRecord {
    /// Full document text (may be empty).
    #[serde(default)]
    pub text: String,

    /// Labeled fields in document order.
    #[serde(default)]
    pub form_fields: Vec<FormField>,

    /// Logo text candidates in document order.
    #[serde(default)]
    pub logo_text: Vec<LogoText>,

    /// APR selected by the normalizer, if any percentage survived the
    /// plausibility filter.
    #[serde(default)]
    pub detected_apr: Option<f64>,
}

impl DealRecord {
    /// Create a record from bare document text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// US sales region derived from the buyer's state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Region {
    West,
    South,
    North,
    East,
    #[serde(rename = "Outside US")]
    OutsideUs,
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Region::West => write!(f, "West"),
            Region::South => write!(f, "South"),
            Region::North => write!(f, "North"),
            Region::East => write!(f, "East"),
            Region::OutsideUs => write!(f, "Outside US"),
        }
    }
}

/// Deal-quality badge. Derived from the score band and nothing else.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Badge {
    Gold,
    Silver,
    Bronze,
    Red,
}

impl Badge {
    /// The only way a badge is assigned: 90-100 Gold, 80-89 Silver,
    /// 70-79 Bronze, below 70 Red.
    pub fn for_score(score: u8) -> Self {
        match score {
            90..=100 => Badge::Gold,
            80..=89 => Badge::Silver,
            70..=79 => Badge::Bronze,
            _ => Badge::Red,
        }
    }
}

/// How the purchase is financed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum FinancingSource {
    #[default]
    Dealer,
    Cash,
    #[serde(rename = "OSF")]
    OutsideBank,
}

impl FinancingSource {
    /// Cash deals carry no APR and no loan term, so the missing-data
    /// penalties for those fields do not apply.
    pub fn is_financed(&self) -> bool {
        !matches!(self, FinancingSource::Cash)
    }
}

/// Document classification for the quote as a whole.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum QuoteType {
    Pencil,
    #[serde(rename = "Purchase Agreement")]
    PurchaseAgreement,
    #[serde(rename = "Cash Offer")]
    CashOffer,
    Lease,
    #[default]
    Unknown,
}

/// One itemized audit finding.
///
/// Red flags carry negative deltas, green flags carry bonuses (>= 0),
/// blue flags are advisory and carry zero or a missing-data deduction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flag {
    /// Short classification, under ten words (e.g. "GAP overpriced").
    #[serde(rename = "type")]
    pub label: String,

    /// Detailed explanation referencing the actual computed numbers.
    pub message: String,

    /// The product or field the finding is about.
    pub item: String,

    /// Score effect. Deductions are negative, bonuses positive.
    pub delta: i32,
}

/// Derived pricing caps, not raw inputs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct NormalizedPricing {
    pub gap_cap: f64,
    pub vsc_cap: f64,
    pub bundle_total: f64,
}

/// APR as listed plus the bonus it earned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AprSummary {
    pub listed: Option<f64>,
    pub bonus: i32,
    pub source: FinancingSource,
}

/// Loan term and the risk deduction it triggered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TermSummary {
    pub months: Option<u32>,
    pub risk_deduction: i32,
}

/// Backend bundling verdict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct BundleAbuse {
    pub active: bool,
    pub deduction: i32,
}

/// The narrative sections of an audit. None may be empty in a returned
/// result; the formatter substitutes fixed fallbacks for absent prose.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Narrative {
    pub vehicle_overview: String,
    pub trust_score_summary: String,
    pub market_comparison: String,
    pub gap_logic: String,
    pub vsc_logic: String,
    pub apr_bonus_rule: String,
    pub lease_audit: String,
    pub negotiation_insight: String,
    pub final_recommendation: String,
}

impl Narrative {
    /// Section keys in contract order.
    pub const SECTIONS: [&'static str; 9] = [
        "vehicle_overview",
        "trust_score_summary",
        "market_comparison",
        "gap_logic",
        "vsc_logic",
        "apr_bonus_rule",
        "lease_audit",
        "negotiation_insight",
        "final_recommendation",
    ];

    /// Read a section by key.
    pub fn get(&self, section: &str) -> Option<&str> {
        match section {
            "vehicle_overview" => Some(&self.vehicle_overview),
            "trust_score_summary" => Some(&self.trust_score_summary),
            "market_comparison" => Some(&self.market_comparison),
            "gap_logic" => Some(&self.gap_logic),
            "vsc_logic" => Some(&self.vsc_logic),
            "apr_bonus_rule" => Some(&self.apr_bonus_rule),
            "lease_audit" => Some(&self.lease_audit),
            "negotiation_insight" => Some(&self.negotiation_insight),
            "final_recommendation" => Some(&self.final_recommendation),
            _ => None,
        }
    }

    /// Write a section by key. Unknown keys are ignored.
    pub fn set(&mut self, section: &str, value: String) {
        match section {
            "vehicle_overview" => self.vehicle_overview = value,
            "trust_score_summary" => self.trust_score_summary = value,
            "market_comparison" => self.market_comparison = value,
            "gap_logic" => self.gap_logic = value,
            "vsc_logic" => self.vsc_logic = value,
            "apr_bonus_rule" => self.apr_bonus_rule = value,
            "lease_audit" => self.lease_audit = value,
            "negotiation_insight" => self.negotiation_insight = value,
            "final_recommendation" => self.final_recommendation = value,
            _ => {}
        }
    }
}

/// The validated audit record returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditResult {
    /// Trust score, always within [0, 100].
    pub score: u8,

    /// Badge matching the score band.
    pub badge: Badge,

    pub buyer_name: Option<String>,
    pub dealer_name: Option<String>,
    pub logo_text: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub state: Option<String>,

    /// Never absent: unknown or non-US states classify as Outside US.
    pub region: Region,

    pub selling_price: Option<f64>,
    pub vin_number: Option<String>,
    pub date: Option<String>,

    /// One-line summary for the buyer.
    pub buyer_message: String,

    pub red_flags: Vec<Flag>,
    pub green_flags: Vec<Flag>,
    pub blue_flags: Vec<Flag>,

    pub normalized_pricing: NormalizedPricing,
    pub apr: AprSummary,
    pub term: TermSummary,
    pub quote_type: QuoteType,
    pub bundle_abuse: BundleAbuse,

    pub narrative: Narrative,

    /// When the engine produced this result.
    pub evaluated_at: DateTime<Utc>,
}

impl AuditResult {
    /// Total number of itemized findings across all three collections.
    pub fn flag_count(&self) -> usize {
        self.red_flags.len() + self.green_flags.len() + self.blue_flags.len()
    }
}
