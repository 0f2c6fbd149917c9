//! Deterministic fact extraction from a normalized deal record.
//!
//! Everything the rulebook consumes is pulled out here with fixed
//! label lists and regexes. Absence is preserved as `None`; no
//! financial value is ever defaulted. Extraction is line oriented:
//! labeled form fields are folded into the text lines so both sources
//! go through the same patterns.

use lazy_static::lazy_static;
use regex::Regex;

use crate::region;
use crate::types::{DealRecord, FinancingSource};

/// One backend add-on from the fluff catalog, with its charged price.
#[derive(Debug, Clone, PartialEq)]
pub struct FluffItem {
    pub name: &'static str,
    pub price: f64,
}

/// Identity details extracted without model assistance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityFacts {
    pub buyer_name: Option<String>,
    pub dealer_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub vin_number: Option<String>,
    pub date: Option<String>,
    pub logo_text: Option<String>,
}

/// Everything the rule checks consume.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DealFacts {
    pub msrp: Option<f64>,
    pub selling_price: Option<f64>,
    pub down_payment: Option<f64>,
    pub amount_financed: Option<f64>,
    pub term_months: Option<u32>,
    pub mileage: Option<f64>,
    pub apr: Option<f64>,
    pub financing: FinancingSource,

    /// `Some(price)` only when a named indicator appears with a price
    /// above zero; a mention without a price does not count as present.
    pub gap_price: Option<f64>,
    pub vsc_price: Option<f64>,

    pub fluff: Vec<FluffItem>,
    pub is_lease: bool,
    pub identity: IdentityFacts,
}

impl DealFacts {
    pub fn total_fluff(&self) -> f64 {
        self.fluff.iter().map(|item| item.price).sum()
    }

    /// GAP + VSC + add-ons, the backend bundle the abuse rule caps.
    pub fn backend_total(&self) -> f64 {
        self.gap_price.unwrap_or(0.0) + self.vsc_price.unwrap_or(0.0) + self.total_fluff()
    }
}

/// Add-on catalog. Each entry is a canonical name plus the lowercase
/// phrases that identify it on a deal sheet line.
const FLUFF_CATALOG: [(&str, &[&str]); 8] = [
    ("Nitrogen Fill", &["nitrogen"]),
    ("VIN Etching", &["vin etching", "window etching"]),
    ("Key Replacement", &["key replacement"]),
    ("Paint Protection", &["paint protection"]),
    ("Interior Protection", &["interior protection", "fabric protection"]),
    ("Theft Protection", &["theft protection", "anti-theft"]),
    ("GPS Tracking", &["gps tracking", "gps locator"]),
    ("Ghost Immobilizer", &["ghost immobilizer", "immobilizer"]),
];

lazy_static! {
    static ref MONEY: Regex = Regex::new(r"\$?\s*([0-9][0-9,]*(?:\.[0-9]{1,2})?)").unwrap();

    static ref MSRP_LABEL: Regex =
        Regex::new(r"(?i)\b(?:msrp(?:\s*/\s*retail)?|retail)\b").unwrap();
    static ref SELLING_LABEL: Regex =
        Regex::new(r"(?i)\b(?:selling|sale|purchase|total)\s+price\b").unwrap();
    static ref DOWN_LABEL: Regex =
        Regex::new(r"(?i)\b(?:down\s+payment|cash\s+down|due\s+at\s+signing)\b").unwrap();
    static ref AMOUNT_FINANCED_LABEL: Regex =
        Regex::new(r"(?i)\bamount\s+financed\b").unwrap();
    static ref TERM_VALUE: Regex =
        Regex::new(r"(?i)\b(?:loan\s+term|term)\s*:?\s*([0-9]{2,3})\b").unwrap();
    static ref MONTHS_VALUE: Regex = Regex::new(r"(?i)\b([0-9]{2,3})\s*(?:months|mos?)\b").unwrap();
    static ref MILEAGE_LABEL: Regex =
        Regex::new(r"(?i)\b(?:mileage|odometer|miles)\b").unwrap();
    static ref APR_VALUE: Regex =
        Regex::new(r"(?i)\b(?:apr|interest\s+rate)\s*:?\s*([0-9]{1,2}(?:\.[0-9]{1,2})?)\s*%?").unwrap();

    static ref GAP_LINE: Regex =
        Regex::new(r"(?i)\b(?:gap|guaranteed\s+auto\s+protection)\b").unwrap();
    static ref VSC_LINE: Regex = Regex::new(
        r"(?i)\b(?:vsc|extended\s+warranty|service\s+contract|protection\s+plan|warranty\s+coverage)\b"
    )
    .unwrap();

    static ref CASH_DEAL: Regex =
        Regex::new(r"(?i)\bcash\s+(?:deal|offer|purchase|sale)\b").unwrap();
    static ref OUTSIDE_FINANCING: Regex = Regex::new(
        r"(?i)\b(?:credit\s+union|outside\s+(?:bank|financing|lender)|pre-?approved)\b"
    )
    .unwrap();

    static ref LEASE_LABEL: Regex =
        Regex::new(r"(?i)\blease\b(?:\s+(?:agreement|contract|terms|payments|options))?").unwrap();
    static ref LEASE_TERM_TABLE: Regex =
        Regex::new(r"(?i)\blease\b\D{0,20}\b(24|36|39|48)\s*months\b").unwrap();
    static ref MONTHLY_PAYMENT: Regex =
        Regex::new(r"(?i)\$\s*[0-9][0-9,]*(?:\.[0-9]{2})?\s*(?:/\s*mo|per\s+month|/month|monthly)").unwrap();

    static ref BUYER_LABEL: Regex = Regex::new(
        r"(?i)\b(?:buyer|customer|client|applicant|borrower|purchaser)\s*:\s*([^\n,]+)"
    )
    .unwrap();
    static ref DEALER_LABEL: Regex = Regex::new(
        r"(?i)\b(?:salesperson|sales\s+rep(?:resentative)?|contact\s+sales|dealer(?:ship)?|seller)\s*:\s*([^\n,]+)"
    )
    .unwrap();
    static ref ADDRESS_LABEL: Regex =
        Regex::new(r"(?i)\b(?:address|location)\s*:\s*([^\n]+)").unwrap();
    static ref EMAIL: Regex =
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap();
    static ref PHONE: Regex =
        Regex::new(r"(?:\+1\s*)?\(?\d{3}\)?[\s.\-]*\d{3}[\s.\-]*\d{4}").unwrap();
    // 17 characters, no I/O/Q per the VIN standard.
    static ref VIN: Regex = Regex::new(r"\b[A-HJ-NPR-Z0-9]{17}\b").unwrap();
    static ref DATE: Regex = Regex::new(
        r"\b\d{4}-\d{2}-\d{2}\b|\b\d{1,2}/\d{1,2}/\d{4}\b|\b(?:Mon|Tue|Wed|Thu|Fri|Sat|Sun)\s+[A-Z][a-z]{2}\s+\d{1,2}\s+\d{4}\b"
    )
    .unwrap();
}

/// Extract every rulebook input from a normalized record.
pub fn extract(record: &DealRecord) -> DealFacts {
    let lines = collect_lines(record);

    let msrp = labeled_money(&lines, &MSRP_LABEL);
    let selling_price = labeled_money(&lines, &SELLING_LABEL);
    let down_payment = labeled_money(&lines, &DOWN_LABEL);
    let amount_financed = labeled_money(&lines, &AMOUNT_FINANCED_LABEL)
        .or_else(|| match (selling_price, down_payment) {
            (Some(price), Some(down)) => Some((price - down).max(0.0)),
            _ => None,
        });

    let term_months = extract_term(&lines);
    let mileage = labeled_money(&lines, &MILEAGE_LABEL);
    let apr = extract_apr(&lines).or(record.detected_apr);

    let financing = detect_financing(&record.text);
    let gap_price = product_price(&lines, &GAP_LINE);
    let vsc_price = product_price(&lines, &VSC_LINE);
    let fluff = extract_fluff(&lines);
    let is_lease = detect_lease(&record.text, term_months);

    DealFacts {
        msrp,
        selling_price,
        down_payment,
        amount_financed,
        term_months,
        mileage,
        apr,
        financing,
        gap_price,
        vsc_price,
        fluff,
        is_lease,
        identity: extract_identity(record),
    }
}

/// Text lines plus form fields rendered as "label value" lines, so a
/// single pass over lines sees both sources.
fn collect_lines(record: &DealRecord) -> Vec<String> {
    let mut lines: Vec<String> = record
        .text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();
    for field in &record.form_fields {
        let mut line = field.name.clone();
        if let Some(value) = &field.value {
            line.push(' ');
            line.push_str(value);
        }
        lines.push(line);
    }
    lines
}

fn parse_money(text: &str) -> Option<f64> {
    MONEY
        .captures(text)
        .and_then(|caps| caps[1].replace(',', "").parse::<f64>().ok())
}

/// First money amount on a line whose label matches.
fn labeled_money(lines: &[String], label: &Regex) -> Option<f64> {
    lines.iter().find_map(|line| {
        let matched = label.find(line)?;
        parse_money(&line[matched.end()..])
    })
}

fn extract_term(lines: &[String]) -> Option<u32> {
    let parse = |caps: regex::Captures<'_>| caps[1].parse::<u32>().ok();
    lines
        .iter()
        .find_map(|line| TERM_VALUE.captures(line).and_then(parse))
        .or_else(|| {
            lines
                .iter()
                .find_map(|line| MONTHS_VALUE.captures(line).and_then(parse))
        })
}

fn extract_apr(lines: &[String]) -> Option<f64> {
    lines
        .iter()
        .find_map(|line| APR_VALUE.captures(line))
        .and_then(|caps| caps[1].parse::<f64>().ok())
}

/// Presence requires the indicator and a price above zero on the same
/// line. A bare mention, or a $0 price, is not presence.
fn product_price(lines: &[String], indicator: &Regex) -> Option<f64> {
    lines.iter().find_map(|line| {
        let matched = indicator.find(line)?;
        parse_money(&line[matched.end()..]).filter(|price| *price > 0.0)
    })
}

fn extract_fluff(lines: &[String]) -> Vec<FluffItem> {
    let mut found = Vec::new();
    for (name, phrases) in FLUFF_CATALOG {
        if found.iter().any(|item: &FluffItem| item.name == name) {
            continue;
        }
        for line in lines {
            // Lowercasing can change byte lengths, so the phrase offset
            // is only valid on the lowercased line itself. The money
            // pattern is ASCII and survives case folding.
            let lower = line.to_lowercase();
            let Some(end) = phrases
                .iter()
                .find_map(|p| lower.find(p).map(|at| at + p.len()))
            else {
                continue;
            };
            if let Some(price) = parse_money(&lower[end..]).filter(|p| *p > 0.0) {
                found.push(FluffItem { name, price });
                break;
            }
        }
    }
    found
}

fn detect_financing(text: &str) -> FinancingSource {
    if CASH_DEAL.is_match(text) {
        FinancingSource::Cash
    } else if OUTSIDE_FINANCING.is_match(text) {
        FinancingSource::OutsideBank
    } else {
        FinancingSource::Dealer
    }
}

/// A deal is a lease on an explicit label, a "Lease … NN Months" table
/// pattern, or a typical lease term paired with multiple monthly
/// payment figures (option grids).
fn detect_lease(text: &str, term_months: Option<u32>) -> bool {
    if LEASE_TERM_TABLE.is_match(text) {
        return true;
    }
    if LEASE_LABEL.is_match(text) {
        return true;
    }
    let lease_term = matches!(term_months, Some(24 | 36 | 39 | 48));
    lease_term && MONTHLY_PAYMENT.find_iter(text).count() >= 2
}

fn extract_identity(record: &DealRecord) -> IdentityFacts {
    let text = &record.text;
    let capture = |pattern: &Regex| {
        pattern
            .captures(text)
            .map(|caps| caps[1].trim().to_string())
            .filter(|s| !s.is_empty())
    };

    let address = capture(&ADDRESS_LABEL);
    let state = address
        .as_deref()
        .and_then(region::extract_state)
        .or_else(|| {
            // Fall back to "City, ST 12345" shapes anywhere in the text.
            CITY_STATE_ZIP
                .captures(text)
                .map(|caps| caps[1].to_string())
        });

    IdentityFacts {
        buyer_name: capture(&BUYER_LABEL),
        dealer_name: capture(&DEALER_LABEL),
        email: EMAIL.find(text).map(|m| m.as_str().to_string()),
        phone_number: PHONE.find(text).map(|m| m.as_str().trim().to_string()),
        address,
        state,
        vin_number: VIN.find(text).map(|m| m.as_str().to_string()),
        date: DATE.find(text).map(|m| m.as_str().to_string()),
        logo_text: combine_logo_text(record),
    }
}

lazy_static! {
    static ref CITY_STATE_ZIP: Regex =
        Regex::new(r",\s*([A-Z]{2})\s+\d{5}(?:-\d{4})?\b").unwrap();
}

/// Combine logo candidates into one label: deduplicated words, at most
/// five, original casing preserved.
fn combine_logo_text(record: &DealRecord) -> Option<String> {
    let mut seen = Vec::new();
    let mut words = Vec::new();
    for candidate in &record.logo_text {
        for word in candidate.text.split_whitespace() {
            let key = word.to_lowercase();
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            words.push(word);
            if words.len() == 5 {
                return Some(words.join(" "));
            }
        }
    }
    (!words.is_empty()).then(|| words.join(" "))
}
