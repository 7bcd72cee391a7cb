//! Content-derived document identifier (CDC).
//!
//! Built from fields that are already in the encoded tree, so the value a
//! receiver re-derives from the document always matches `DE/@Id`:
//!
//! | part       | source      | width |
//! |------------|-------------|-------|
//! | emission   | `iTipEmi`   | 1     |
//! | issuer RUC | `dRucEm`    | 8     |
//! | check digit| `dDVEmi`    | 1     |
//! | doc type   | `iTiDE`     | 2     |
//! | number     | `dEst` `dPunExp` `dNumDoc` | 3+3+7 |
//! | date       | `dFeEmiDE`  | 8     |
//! | suffix     | caller      | 11    |

use std::fmt;

use crate::config::{DEFAULT_SUFFIX, normalize_suffix};
use crate::core::{SifenError, pad_digits};
use crate::xml::Document;

/// Identifier length in characters.
pub const IDENTIFIER_LEN: usize = 44;

/// A 44-digit document identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Modulo-11 check digit written to dDVId.
    pub fn check_digit(&self) -> u8 {
        mod11_check_digit(&self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

/// Derive the identifier with the default suffix.
pub fn generate(doc: &Document) -> Result<Identifier, SifenError> {
    generate_with_suffix(doc, DEFAULT_SUFFIX)
}

/// Derive the identifier with an explicit suffix (at most 11 digits).
pub fn generate_with_suffix(doc: &Document, suffix: &str) -> Result<Identifier, SifenError> {
    let emitted = field(doc, "dFeEmiDE")?;
    let date: String = emitted.chars().take(10).filter(|c| *c != '-').collect();
    if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SifenError::format(emitted, "dFeEmiDE does not start with %Y-%m-%d"));
    }

    let id = [
        padded(doc, "iTipEmi", 1)?,
        padded(doc, "dRucEm", 8)?,
        padded(doc, "dDVEmi", 1)?,
        padded(doc, "iTiDE", 2)?,
        padded(doc, "dEst", 3)?,
        padded(doc, "dPunExp", 3)?,
        padded(doc, "dNumDoc", 7)?,
        date,
        normalize_suffix(suffix)?,
    ]
    .concat();

    debug_assert_eq!(id.len(), IDENTIFIER_LEN);
    Ok(Identifier(id))
}

fn field(doc: &Document, name: &str) -> Result<String, SifenError> {
    doc.find_text(name)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| SifenError::format(name, "field missing from encoded document"))
}

fn padded(doc: &Document, name: &str, width: usize) -> Result<String, SifenError> {
    let value = field(doc, name)?;
    pad_digits(&value, width).map_err(|reason| SifenError::format(value, format!("{name} {reason}")))
}

/// Derive the identifier, set it as `DE/@Id` and write its check digit to dDVId.
pub fn assign(doc: &mut Document, suffix: &str) -> Result<Identifier, SifenError> {
    let id = generate_with_suffix(doc, suffix)?;
    let de = doc
        .find_mut("DE")
        .ok_or_else(|| SifenError::format("DE", "document has no DE element"))?;
    de.set_attr("Id", id.as_str());
    if let Some(check) = de.child_mut("dDVId") {
        check.set_text(id.check_digit().to_string());
    }
    tracing::debug!(id = %id, "identifier assigned");
    Ok(id)
}

/// Weights 2 to 11 applied from the rightmost digit, restarting at 2.
/// Non-digit characters are skipped.
fn mod11_check_digit(digits: &str) -> u8 {
    let mut weight = 2u32;
    let mut total = 0u32;
    for d in digits.chars().rev().filter_map(|c| c.to_digit(10)) {
        total += d * weight;
        weight = if weight == 11 { 2 } else { weight + 1 };
    }
    match total % 11 {
        0 | 1 => 0,
        r => (11 - r) as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::Element;

    fn encoded(ruc: &str, number: &str) -> Document {
        let mut de = Element::new("DE");
        de.push_leaf("dDVId", "0");
        let mut emission = Element::new("gOpeDE");
        emission.push_leaf("iTipEmi", "1");
        de.push(emission);
        let mut stamp = Element::new("gTimb");
        stamp.push_leaf("iTiDE", "1");
        stamp.push_leaf("dEst", "001");
        stamp.push_leaf("dPunExp", "001");
        stamp.push_leaf("dNumDoc", number);
        de.push(stamp);
        let mut general = Element::new("gDatGralOpe");
        general.push_leaf("dFeEmiDE", "2025-03-10T09:30:00");
        let mut issuer = Element::new("gEmis");
        issuer.push_leaf("dRucEm", ruc);
        issuer.push_leaf("dDVEmi", "7");
        general.push(issuer);
        de.push(general);
        let mut root = Element::new("rDE");
        root.push(de);
        Document::new(root)
    }

    #[test]
    fn concatenates_padded_fields() {
        let id = generate(&encoded("80012345", "0000001")).unwrap();
        assert_eq!(id.as_str(), "18001234570100100100000012025031000000000001");
        assert_eq!(id.as_str().len(), IDENTIFIER_LEN);
    }

    #[test]
    fn short_ruc_is_zero_padded() {
        let id = generate(&encoded("123456", "0000001")).unwrap();
        assert_eq!(&id.as_str()[1..9], "00123456");
    }

    #[test]
    fn explicit_suffix() {
        let id = generate_with_suffix(&encoded("80012345", "0000001"), "42").unwrap();
        assert!(id.as_str().ends_with("00000000042"));
        assert!(generate_with_suffix(&encoded("80012345", "0000001"), "123456789012").is_err());
    }

    #[test]
    fn missing_field_is_a_format_error() {
        let mut doc = encoded("80012345", "0000001");
        doc.find_mut("gTimb").unwrap().remove_children("dNumDoc");
        assert!(matches!(generate(&doc), Err(SifenError::Format { .. })));
    }

    #[test]
    fn assign_sets_id_and_check_digit() {
        let mut doc = encoded("80012345", "0000002");
        let id = assign(&mut doc, "00000000001").unwrap();
        let de = doc.find("DE").unwrap();
        assert_eq!(de.attr("Id"), Some(id.as_str()));
        assert_eq!(de.child("dDVId").map(Element::text), Some(id.check_digit().to_string()));
    }

    #[test]
    fn check_digits() {
        assert_eq!(mod11_check_digit("80069563"), 1);
        assert_eq!(mod11_check_digit("1234567"), 9);
        assert_eq!(
            mod11_check_digit("01800695631001001000000012021070810000000001"),
            5
        );
    }
}
