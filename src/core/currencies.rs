//! ISO 4217 currency codes accepted in `cMoneOpe` / `cMoneCuo`.

/// Check whether `code` is a known ISO 4217 currency code.
pub fn is_known_currency_code(code: &str) -> bool {
    CURRENCIES.binary_search_by_key(&code, |(c, _)| *c).is_ok()
}

/// Currency name for `dDesMoneOpe` / `dDMoneCuo`, or an empty string when unknown.
pub fn describe_currency(code: &str) -> &'static str {
    CURRENCIES
        .binary_search_by_key(&code, |(c, _)| *c)
        .map(|i| CURRENCIES[i].1)
        .unwrap_or("")
}

/// Sorted for binary search.
static CURRENCIES: &[(&str, &str)] = &[
    ("ARS", "Argentine Peso"),
    ("AUD", "Australian Dollar"),
    ("BOB", "Boliviano"),
    ("BRL", "Brazilian Real"),
    ("CAD", "Canadian Dollar"),
    ("CHF", "Swiss Franc"),
    ("CLP", "Chilean Peso"),
    ("CNY", "Yuan Renminbi"),
    ("COP", "Colombian Peso"),
    ("EUR", "Euro"),
    ("GBP", "Pound Sterling"),
    ("JPY", "Yen"),
    ("MXN", "Mexican Peso"),
    ("PEN", "Sol"),
    ("PYG", "Guarani"),
    ("USD", "US Dollar"),
    ("UYU", "Peso Uruguayo"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted() {
        assert!(CURRENCIES.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn known_and_unknown_currencies() {
        assert!(is_known_currency_code("PYG"));
        assert!(is_known_currency_code("USD"));
        assert!(!is_known_currency_code("XXX"));
        assert_eq!(describe_currency("PYG"), "Guarani");
        assert_eq!(describe_currency("pyg"), "");
    }
}
