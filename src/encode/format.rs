//! One formatting rule per field family.
//!
//! The receiving system compares these strings byte-for-byte, so every
//! numeric field goes through exactly one of the functions below.

use rust_decimal::Decimal;

use crate::core::{DateInput, SifenError, pad_digits, quantize};

/// Fixed number of decimals, half away from zero: `fixed(dec!(1.5), 2)` is `"1.50"`.
pub fn fixed(value: Decimal, dp: u32) -> String {
    let mut rounded = quantize(value, dp);
    rounded.rescale(dp);
    rounded.to_string()
}

/// Monetary amounts: fixed 2 decimals.
pub fn money(value: Decimal) -> String {
    fixed(value, 2)
}

/// Rounded to 4 decimals, then trailing zeros and a dangling point stripped.
///
/// Used for quantities, unit prices, percentages, installment amounts and readings.
pub fn trimmed4(value: Decimal) -> String {
    let trimmed = quantize(value, 4).normalize();
    if trimmed.is_zero() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Truncate free text to `max` characters.
pub fn truncate(field: &str, value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((cut, _)) => {
            tracing::warn!(field, max, "free text truncated");
            value[..cut].to_string()
        }
        None => value.to_string(),
    }
}

/// Left-pad a numeric identifier with zeros to `width`.
pub fn zero_pad(field: &str, value: &str, width: usize) -> Result<String, SifenError> {
    pad_digits(value.trim(), width)
        .map_err(|reason| SifenError::format(value, format!("{field} {reason}")))
}

/// `%Y-%m-%d`.
pub fn date(input: &DateInput) -> Result<String, SifenError> {
    Ok(input.to_date()?.format("%Y-%m-%d").to_string())
}

/// `%Y-%m-%dT%H:%M:%S`.
pub fn datetime(input: &DateInput) -> Result<String, SifenError> {
    Ok(input.to_datetime()?.format("%Y-%m-%dT%H:%M:%S").to_string())
}

/// Code-table description, warning when the table does not know the code.
pub fn described(field: &str, code: &str, description: &'static str) -> &'static str {
    if description.is_empty() {
        tracing::warn!(field, code, "unknown code, writing empty description");
    }
    description
}

/// Keep only ASCII digits.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// dPlazoCre: at most 15 characters, at least 2 (left-padded with "0").
pub fn credit_term(value: &str) -> String {
    let term = truncate("dPlazoCre", value.trim(), 15);
    if term.chars().count() < 2 {
        format!("0{term}")
    } else {
        term
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn fixed_decimals() {
        assert_eq!(money(dec!(15750000)), "15750000.00");
        assert_eq!(money(dec!(1.005)), "1.01");
        assert_eq!(money(dec!(-1.005)), "-1.01");
        assert_eq!(fixed(dec!(2.5), 4), "2.5000");
        assert_eq!(fixed(dec!(0.1234567), 6), "0.123457");
    }

    #[test]
    fn trimmed_four() {
        assert_eq!(trimmed4(dec!(2)), "2");
        assert_eq!(trimmed4(dec!(2.5000)), "2.5");
        assert_eq!(trimmed4(dec!(1.23456)), "1.2346");
        assert_eq!(trimmed4(dec!(100.00)), "100");
        assert_eq!(trimmed4(dec!(0.00001)), "0");
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate("f", "añoñoño", 3), "año");
        assert_eq!(truncate("f", "short", 10), "short");
    }

    #[test]
    fn padding() {
        assert_eq!(zero_pad("dCodSeg", "1234", 9).unwrap(), "000001234");
        assert!(zero_pad("dNumTim", "123456789", 8).is_err());
        assert!(matches!(
            zero_pad("dNumTim", "12a", 8),
            Err(SifenError::Format { .. })
        ));
    }

    #[test]
    fn credit_terms() {
        assert_eq!(credit_term("5"), "05");
        assert_eq!(credit_term("30 días"), "30 días");
        assert_eq!(credit_term("a very long credit term"), "a very long cre");
    }

    #[test]
    fn dates() {
        assert_eq!(date(&"2025-03-01T10:00:00".into()).unwrap(), "2025-03-01");
        assert_eq!(datetime(&"2025-03-01".into()).unwrap(), "2025-03-01T00:00:00");
        assert!(date(&"03/01/2025".into()).is_err());
    }
}
