use serde::{Deserialize, Serialize};

use super::error::{SifenError, ValidationError};

/// Width of the random/sequential tail of the document identifier.
pub const SUFFIX_WIDTH: usize = 11;

const SUFFIX_MAX: u64 = 99_999_999_999;

/// Left-pad a purely numeric value with zeros to `width`.
///
/// Fails when the value is empty, contains non-digits or is wider than `width`.
pub fn pad_digits(value: &str, width: usize) -> Result<String, String> {
    if value.is_empty() {
        return Err("must not be empty".into());
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err("must contain only digits".into());
    }
    if value.len() > width {
        return Err(format!("must have at most {width} digits"));
    }
    Ok(format!("{value:0>width$}"))
}

/// Document number split into establishment, expedition point and sequence.
///
/// Parts are stored zero-padded to 3 / 3 / 7 digits. Shorter numeric parts are
/// padded, longer or non-numeric parts are rejected.
///
/// ```
/// use sifen::core::DocumentNumber;
///
/// let n = DocumentNumber::parse("001-002-5").unwrap();
/// assert_eq!(n.sequence(), "0000005");
/// assert_eq!(n.to_string(), "001-002-0000005");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentNumber {
    establishment: String,
    point: String,
    sequence: String,
}

impl DocumentNumber {
    pub const ESTABLISHMENT_WIDTH: usize = 3;
    pub const POINT_WIDTH: usize = 3;
    pub const SEQUENCE_WIDTH: usize = 7;

    /// Parse the `EEE-PPP-NNNNNNN` form.
    pub fn parse(number: &str) -> Result<Self, SifenError> {
        let parts: Vec<&str> = number.trim().split('-').collect();
        let [establishment, point, sequence] = parts.as_slice() else {
            return Err(SifenError::Validation(vec![ValidationError::new(
                "number",
                format!("'{number}' must have the form EEE-PPP-NNNNNNN"),
            )]));
        };
        Self::new(establishment, point, sequence)
    }

    /// Build from separate parts, reporting every invalid part.
    pub fn new(establishment: &str, point: &str, sequence: &str) -> Result<Self, SifenError> {
        let mut errors = Vec::new();
        let establishment = pad_part(
            establishment,
            Self::ESTABLISHMENT_WIDTH,
            "number.establishment",
            "dEst",
            &mut errors,
        );
        let point = pad_part(point, Self::POINT_WIDTH, "number.point", "dPunExp", &mut errors);
        let sequence = pad_part(
            sequence,
            Self::SEQUENCE_WIDTH,
            "number.sequence",
            "dNumDoc",
            &mut errors,
        );

        match (establishment, point, sequence) {
            (Some(establishment), Some(point), Some(sequence)) if errors.is_empty() => Ok(Self {
                establishment,
                point,
                sequence,
            }),
            _ => Err(SifenError::Validation(errors)),
        }
    }

    pub fn establishment(&self) -> &str {
        &self.establishment
    }

    pub fn point(&self) -> &str {
        &self.point
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }
}

fn pad_part(
    value: &str,
    width: usize,
    field: &str,
    rule: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<String> {
    match pad_digits(value.trim(), width) {
        Ok(padded) => {
            if padded != value {
                tracing::warn!(field, value, padded = %padded, "zero-padded document number part");
            }
            Some(padded)
        }
        Err(reason) => {
            errors.push(ValidationError::with_rule(
                field,
                format!("'{value}' {reason}"),
                rule,
            ));
            None
        }
    }
}

impl std::fmt::Display for DocumentNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.establishment, self.point, self.sequence)
    }
}

impl TryFrom<String> for DocumentNumber {
    type Error = SifenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DocumentNumber> for String {
    fn from(number: DocumentNumber) -> Self {
        number.to_string()
    }
}

/// Gapless generator for the 11-digit identifier suffix.
///
/// Tracks the last issued value so consecutive documents receive
/// `00000000001`, `00000000002`, and so on.
#[derive(Debug, Clone)]
pub struct SuffixSequence {
    next_number: u64,
}

impl Default for SuffixSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl SuffixSequence {
    /// Create a new sequence starting at 1.
    pub fn new() -> Self {
        Self { next_number: 1 }
    }

    /// Create a sequence continuing from a given number.
    pub fn starting_at(next_number: u64) -> Self {
        Self { next_number }
    }

    /// Issue the next suffix.
    pub fn next_suffix(&mut self) -> Result<String, SifenError> {
        let suffix = self.peek()?;
        self.next_number += 1;
        Ok(suffix)
    }

    /// Preview the next suffix without consuming it.
    pub fn peek(&self) -> Result<String, SifenError> {
        if self.next_number > SUFFIX_MAX {
            return Err(SifenError::format(
                self.next_number.to_string(),
                format!("identifier suffix exceeds {SUFFIX_WIDTH} digits"),
            ));
        }
        Ok(format!("{:0>width$}", self.next_number, width = SUFFIX_WIDTH))
    }

    /// Get the next number that will be issued (without formatting).
    pub fn next_raw(&self) -> u64 {
        self.next_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_width_number() {
        let n = DocumentNumber::parse("001-002-0000005").unwrap();
        assert_eq!(n.establishment(), "001");
        assert_eq!(n.point(), "002");
        assert_eq!(n.sequence(), "0000005");
    }

    #[test]
    fn pads_short_parts() {
        let n = DocumentNumber::parse("1-2-5").unwrap();
        assert_eq!(n.to_string(), "001-002-0000005");
    }

    #[test]
    fn rejects_wide_and_non_numeric_parts() {
        let err = DocumentNumber::parse("0001-0A2-12345678").unwrap_err();
        let SifenError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].field, "number.establishment");
        assert_eq!(errors[1].rule.as_deref(), Some("dPunExp"));
        assert_eq!(errors[2].field, "number.sequence");
    }

    #[test]
    fn rejects_wrong_shape() {
        assert!(DocumentNumber::parse("001-0000005").is_err());
        assert!(DocumentNumber::parse("").is_err());
    }

    #[test]
    fn serde_round_trips_through_string() {
        let n = DocumentNumber::parse("001-001-0000042").unwrap();
        let s: String = n.clone().into();
        assert_eq!(DocumentNumber::try_from(s).unwrap(), n);
    }

    #[test]
    fn sequential_suffixes() {
        let mut seq = SuffixSequence::new();
        assert_eq!(seq.next_suffix().unwrap(), "00000000001");
        assert_eq!(seq.next_suffix().unwrap(), "00000000002");
        assert_eq!(seq.next_raw(), 3);
    }

    #[test]
    fn peek_does_not_consume() {
        let mut seq = SuffixSequence::starting_at(42);
        assert_eq!(seq.peek().unwrap(), "00000000042");
        assert_eq!(seq.next_suffix().unwrap(), "00000000042");
        assert_eq!(seq.peek().unwrap(), "00000000043");
    }

    #[test]
    fn suffix_overflow_is_an_error() {
        let mut seq = SuffixSequence::starting_at(SUFFIX_MAX + 1);
        assert!(seq.next_suffix().is_err());
    }
}
