//! US regional classification from state codes.
//!
//! Total function over fixed membership sets: any recognized US code not
//! in the West/South/North sets falls into East, and anything else
//! (including `None`) classifies as Outside US. The sets are process-wide
//! constants, safe for unsynchronized concurrent reads.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

use crate::types::Region;

lazy_static! {
    static ref WEST_STATES: HashSet<&'static str> = [
        "AK", "AZ", "CA", "CO", "HI", "ID", "MT", "NV", "NM", "OR", "UT", "WA", "WY",
    ]
    .into_iter()
    .collect();

    static ref SOUTH_STATES: HashSet<&'static str> = [
        "AL", "AR", "FL", "GA", "KY", "LA", "MS", "NC", "OK", "SC", "TN", "TX", "VA", "WV", "DC",
    ]
    .into_iter()
    .collect();

    static ref NORTH_STATES: HashSet<&'static str> = [
        "CT", "DE", "IL", "IN", "IA", "KS", "ME", "MD", "MA", "MI", "MN", "MO", "NE", "NH",
        "NJ", "NY", "ND", "OH", "PA", "RI", "SD", "VT", "WI",
    ]
    .into_iter()
    .collect();

    /// Two-letter US state codes, anchored on word boundaries.
    static ref STATE_CODE_PATTERN: Regex = Regex::new(
        r"\b(A[KLRZ]|C[AOT]|D[CE]|FL|GA|HI|I[ADLN]|K[SY]|LA|M[ADEINOST]|N[CDEHJMVY]|O[HKR]|P[AR]|RI|S[CD]|T[NX]|UT|V[AIT]|W[AIVY])\b"
    )
    .unwrap();
}

impl Region {
    /// Classify a 2-letter state code into its region.
    ///
    /// Case-insensitive and whitespace-tolerant. `None`, empty, and
    /// unrecognized codes classify as Outside US.
    pub fn from_state(state: Option<&str>) -> Region {
        let code = match state {
            Some(s) => s.trim().to_ascii_uppercase(),
            None => return Region::OutsideUs,
        };

        if code.is_empty() {
            return Region::OutsideUs;
        }

        if WEST_STATES.contains(code.as_str()) {
            Region::West
        } else if SOUTH_STATES.contains(code.as_str()) {
            Region::South
        } else if NORTH_STATES.contains(code.as_str()) {
            Region::North
        } else if is_us_state(&code) {
            // Remaining recognized US codes fall into the East region.
            Region::East
        } else {
            Region::OutsideUs
        }
    }
}

/// Whether a (already upper-cased) code is a recognized US state code.
fn is_us_state(code: &str) -> bool {
    code.len() == 2
        && STATE_CODE_PATTERN
            .find(code)
            .is_some_and(|m| m.as_str() == code)
}

/// Extract the first 2-letter state code from a free-form address.
pub fn extract_state(address: &str) -> Option<String> {
    let upper = address.to_ascii_uppercase();
    STATE_CODE_PATTERN
        .find(&upper)
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_regions() {
        assert_eq!(Region::from_state(Some("CA")), Region::West);
        assert_eq!(Region::from_state(Some("TX")), Region::South);
        assert_eq!(Region::from_state(Some("NY")), Region::North);
        assert_eq!(Region::from_state(Some("DC")), Region::South);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(Region::from_state(Some("ny")), Region::North);
        assert_eq!(Region::from_state(Some(" tx ")), Region::South);
    }

    #[test]
    fn test_none_and_unrecognized_are_outside_us() {
        assert_eq!(Region::from_state(None), Region::OutsideUs);
        assert_eq!(Region::from_state(Some("")), Region::OutsideUs);
        assert_eq!(Region::from_state(Some("ZZ")), Region::OutsideUs);
        assert_eq!(Region::from_state(Some("Ontario")), Region::OutsideUs);
    }

    #[test]
    fn test_state_extraction_from_address() {
        assert_eq!(
            extract_state("1200 Main St, Houston, TX 77002"),
            Some("TX".to_string())
        );
        assert_eq!(extract_state("somewhere in Canada"), None);
    }

    proptest! {
        /// Classification is total and deterministic for arbitrary input.
        #[test]
        fn prop_total_and_idempotent(code in "\\PC{0,4}") {
            let first = Region::from_state(Some(&code));
            let second = Region::from_state(Some(&code));
            prop_assert_eq!(first, second);
        }
    }
}
