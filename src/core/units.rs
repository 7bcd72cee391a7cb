//! SIFEN units of measure (`cUniMed`).
//!
//! Partial extract of the tax authority's unit table; unknown codes
//! describe as an empty string.

/// Check whether `code` is a known SIFEN unit code.
pub fn is_known_unit_code(code: &str) -> bool {
    UNITS.binary_search_by_key(&code, |(c, _)| *c).is_ok()
}

/// Representation for `dDesUniMed`, or an empty string when unknown.
pub fn describe_unit(code: &str) -> &'static str {
    UNITS
        .binary_search_by_key(&code, |(c, _)| *c)
        .map(|i| UNITS[i].1)
        .unwrap_or("")
}

/// Sorted (as strings) for binary search.
static UNITS: &[(&str, &str)] = &[
    ("1", "TN"),
    ("10", "M3"),
    ("2", "KG"),
    ("77", "UNI"),
    ("83", "kg"),
    ("86", "g"),
    ("87", "m"),
    ("89", "l"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted() {
        assert!(UNITS.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn lookups() {
        assert!(is_known_unit_code("77"));
        assert_eq!(describe_unit("77"), "UNI");
        assert_eq!(describe_unit("999"), "");
        assert!(!is_known_unit_code(""));
    }
}
