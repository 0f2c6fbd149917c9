//! APR candidate selection.
//!
//! OCR text yields many percentage-looking strings (tax rates, fee
//! percentages, the APR itself). The selector keeps only plausible
//! consumer auto-loan rates and picks the lowest, on the observation
//! that the advertised APR is the smallest percentage printed on a
//! deal sheet once sales-tax style figures are filtered out.

use lazy_static::lazy_static;
use regex::Regex;

/// Rates at or above this are not plausible consumer auto-loan APRs.
pub const APR_PLAUSIBILITY_CEILING: f64 = 20.0;

lazy_static! {
    /// A percentage with one or two digits before and after the point.
    pub static ref PERCENT_PATTERN: Regex = Regex::new(r"\d{1,2}\.\d{1,2}\s*%").unwrap();
}

/// Collect every percentage-shaped match from a block of text.
pub fn collect_candidates(text: &str) -> Vec<String> {
    PERCENT_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Pick the most plausible APR from raw percentage strings.
///
/// Unparseable candidates are silently discarded, as are values at or
/// above [`APR_PLAUSIBILITY_CEILING`]. Returns the minimum survivor,
/// or `None` when nothing survives. `None` is a normal outcome for
/// cash deals and sparse documents, not an error.
pub fn select_apr(candidates: &[String]) -> Option<f64> {
    candidates
        .iter()
        .filter_map(|raw| raw.trim().trim_end_matches('%').trim().parse::<f64>().ok())
        .filter(|rate| *rate < APR_PLAUSIBILITY_CEILING)
        .fold(None, |best: Option<f64>, rate| match best {
            Some(current) if current <= rate => Some(current),
            _ => Some(rate),
        })
}
