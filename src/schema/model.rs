//! Compiled schema components.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use base64ct::{Base64, Encoding};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use rust_decimal::Decimal;

/// Namespace-qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct QName {
    pub ns: String,
    pub local: String,
}

impl QName {
    pub fn new(ns: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            ns: ns.into(),
            local: local.into(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.local)
    }
}

/// Built-in primitive (or derived built-in) the value space comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    String,
    Token,
    Boolean,
    Decimal,
    Integer { min: Option<i128>, max: Option<i128> },
    Date,
    DateTime,
    Base64,
    Hex,
    NcName,
}

impl Builtin {
    /// Built-in named `local` in the XML Schema namespace.
    pub fn by_name(local: &str) -> Option<Self> {
        let int = |min: Option<i128>, max: Option<i128>| Self::Integer { min, max };
        Some(match local {
            "string" | "anyURI" | "anySimpleType" => Self::String,
            "normalizedString" | "token" | "language" | "NMTOKEN" => Self::Token,
            "boolean" => Self::Boolean,
            "decimal" => Self::Decimal,
            "integer" => int(None, None),
            "nonNegativeInteger" => int(Some(0), None),
            "positiveInteger" => int(Some(1), None),
            "nonPositiveInteger" => int(None, Some(0)),
            "negativeInteger" => int(None, Some(-1)),
            "long" => int(Some(i64::MIN.into()), Some(i64::MAX.into())),
            "int" => int(Some(i32::MIN.into()), Some(i32::MAX.into())),
            "short" => int(Some(i16::MIN.into()), Some(i16::MAX.into())),
            "byte" => int(Some(i8::MIN.into()), Some(i8::MAX.into())),
            "unsignedLong" => int(Some(0), Some(u64::MAX.into())),
            "unsignedInt" => int(Some(0), Some(u32::MAX.into())),
            "unsignedShort" => int(Some(0), Some(u16::MAX.into())),
            "unsignedByte" => int(Some(0), Some(u8::MAX.into())),
            "date" => Self::Date,
            "dateTime" => Self::DateTime,
            "base64Binary" => Self::Base64,
            "hexBinary" => Self::Hex,
            "ID" | "IDREF" | "NCName" | "Name" => Self::NcName,
            _ => return None,
        })
    }

    fn is_numeric(self) -> bool {
        matches!(self, Self::Decimal | Self::Integer { .. })
    }

    /// Whitespace handling before the lexical check.
    fn normalize(self, value: &str) -> String {
        match self {
            Self::String => value.to_string(),
            _ => value.split_whitespace().collect::<Vec<_>>().join(" "),
        }
    }

    fn check(self, value: &str) -> Result<(), String> {
        let ok = match self {
            Self::String | Self::Token => true,
            Self::Boolean => matches!(value, "true" | "false" | "1" | "0"),
            Self::Decimal => is_decimal(value),
            Self::Integer { min, max } => {
                let n = value
                    .strip_prefix('+')
                    .unwrap_or(value)
                    .parse::<i128>()
                    .map_err(|_| format!("'{value}' is not an integer"))?;
                if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) {
                    return Err(format!("'{value}' is out of range"));
                }
                true
            }
            Self::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
            Self::DateTime => {
                let head = value.get(..19).unwrap_or(value);
                NaiveDateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S").is_ok()
                    && is_zone_suffix(&value[head.len()..])
            }
            Self::Base64 => {
                let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
                Base64::decode_vec(&compact).is_ok()
            }
            Self::Hex => value.len() % 2 == 0 && value.bytes().all(|b| b.is_ascii_hexdigit()),
            Self::NcName => is_ncname(value),
        };
        if ok {
            Ok(())
        } else {
            Err(format!("'{value}' is not a valid {}", self.label()))
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::String | Self::Token => "string",
            Self::Boolean => "boolean",
            Self::Decimal => "decimal",
            Self::Integer { .. } => "integer",
            Self::Date => "date",
            Self::DateTime => "dateTime",
            Self::Base64 => "base64Binary",
            Self::Hex => "hexBinary",
            Self::NcName => "NCName",
        }
    }
}

fn is_decimal(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    let (int, frac) = digits.split_once('.').unwrap_or((digits, ""));
    (!int.is_empty() || !frac.is_empty())
        && int.bytes().all(|b| b.is_ascii_digit())
        && frac.bytes().all(|b| b.is_ascii_digit())
}

/// Optional fractional seconds then an optional zone.
fn is_zone_suffix(rest: &str) -> bool {
    let rest = match rest.strip_prefix('.') {
        Some(frac) => {
            let end = frac.find(|c: char| !c.is_ascii_digit()).unwrap_or(frac.len());
            if end == 0 {
                return false;
            }
            &frac[end..]
        }
        None => rest,
    };
    match rest.as_bytes() {
        [] | [b'Z'] => true,
        [b'+' | b'-', h1, h2, b':', m1, m2] => {
            [h1, h2, m1, m2].iter().all(|b| b.is_ascii_digit())
        }
        _ => false,
    }
}

fn is_ncname(value: &str) -> bool {
    let mut chars = value.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Significant digits (total, fraction) of a decimal literal.
fn digit_counts(value: &str) -> (usize, usize) {
    let digits = value.trim_start_matches(['+', '-']);
    let (int, frac) = digits.split_once('.').unwrap_or((digits, ""));
    let int = int.trim_start_matches('0');
    let frac = frac.trim_end_matches('0');
    ((int.len() + frac.len()).max(1), frac.len())
}

/// Restriction facets accumulated along a derivation chain.
#[derive(Debug, Clone, Default)]
pub(crate) struct Facets {
    pub enumeration: Option<Vec<String>>,
    /// Every pattern must match; each one is already anchored.
    pub patterns: Vec<Regex>,
    pub length: Option<usize>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub total_digits: Option<usize>,
    pub fraction_digits: Option<usize>,
    pub min_inclusive: Option<Decimal>,
    pub max_inclusive: Option<Decimal>,
    pub min_exclusive: Option<Decimal>,
    pub max_exclusive: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub(crate) struct SimpleType {
    pub builtin: Builtin,
    pub facets: Facets,
}

impl SimpleType {
    pub fn builtin(builtin: Builtin) -> Self {
        Self {
            builtin,
            facets: Facets::default(),
        }
    }

    /// Check a lexical value against the built-in and every facet.
    pub fn check(&self, raw: &str) -> Result<(), String> {
        let value = self.builtin.normalize(raw);
        let value = value.as_str();
        self.builtin.check(value)?;
        let f = &self.facets;

        if let Some(allowed) = &f.enumeration {
            if !allowed.iter().any(|a| a == value) {
                return Err(format!(
                    "'{value}' is not one of [{}]",
                    allowed.join(", ")
                ));
            }
        }
        if let Some(pattern) = f.patterns.iter().find(|p| !p.is_match(value)) {
            return Err(format!(
                "'{value}' does not match pattern {}",
                pattern.as_str()
            ));
        }

        let len = value.chars().count();
        if f.length.is_some_and(|n| len != n) {
            return Err(format!("'{value}' must have length {}", f.length.unwrap_or_default()));
        }
        if let Some(min) = f.min_length.filter(|&n| len < n) {
            return Err(format!("'{value}' is shorter than {min}"));
        }
        if let Some(max) = f.max_length.filter(|&n| len > n) {
            return Err(format!("'{value}' is longer than {max}"));
        }

        if self.builtin.is_numeric() {
            let (total, fraction) = digit_counts(value);
            if let Some(max) = f.total_digits.filter(|&n| total > n) {
                return Err(format!("'{value}' has more than {max} digits"));
            }
            if let Some(max) = f.fraction_digits.filter(|&n| fraction > n) {
                return Err(format!("'{value}' has more than {max} fraction digits"));
            }
            let number = Decimal::from_str(value)
                .map_err(|_| format!("'{value}' is out of the supported decimal range"))?;
            let bounds = [
                (f.min_inclusive, number >= f.min_inclusive.unwrap_or(number), ">="),
                (f.max_inclusive, number <= f.max_inclusive.unwrap_or(number), "<="),
                (f.min_exclusive, f.min_exclusive.is_none_or(|m| number > m), ">"),
                (f.max_exclusive, f.max_exclusive.is_none_or(|m| number < m), "<"),
            ];
            for (bound, holds, op) in bounds {
                if let (Some(bound), false) = (bound, holds) {
                    return Err(format!("'{value}' must be {op} {bound}"));
                }
            }
        }
        Ok(())
    }
}

/// Reference to a compiled type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TypeRef {
    Simple(usize),
    Complex(usize),
    /// `xs:anyType`: anything goes.
    Any,
}

#[derive(Debug, Clone)]
pub(crate) struct ElementDecl {
    pub name: QName,
    pub ty: TypeRef,
}

#[derive(Debug, Clone)]
pub(crate) struct AttributeDecl {
    pub name: String,
    pub ty: usize,
    pub required: bool,
    pub fixed: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Process {
    Strict,
    Lax,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NamespaceConstraint {
    Any,
    /// Any namespace except this one (and except no namespace).
    Other(String),
    List(Vec<String>),
}

#[derive(Debug, Clone)]
pub(crate) struct Wildcard {
    pub namespaces: NamespaceConstraint,
    pub process: Process,
}

impl Wildcard {
    pub fn allows(&self, ns: &str) -> bool {
        match &self.namespaces {
            NamespaceConstraint::Any => true,
            NamespaceConstraint::Other(target) => !ns.is_empty() && ns != target,
            NamespaceConstraint::List(list) => list.iter().any(|n| n == ns),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Term {
    /// Index into [`Model::elements`].
    Element(usize),
    Sequence(Vec<Particle>),
    Choice(Vec<Particle>),
    Any(Wildcard),
}

#[derive(Debug, Clone)]
pub(crate) struct Particle {
    pub min: u32,
    /// `None` is unbounded.
    pub max: Option<u32>,
    pub term: Term,
}

#[derive(Debug, Clone)]
pub(crate) enum Content {
    Empty,
    Elements(Particle),
    /// Text only, checked against a simple type.
    Simple(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct ComplexType {
    pub content: Content,
    pub attributes: Vec<AttributeDecl>,
    pub any_attribute: bool,
}

/// All compiled components, addressed by index.
#[derive(Debug, Default)]
pub(crate) struct Model {
    pub simple: Vec<SimpleType>,
    pub complex: Vec<ComplexType>,
    pub elements: Vec<ElementDecl>,
    pub globals: HashMap<QName, usize>,
}
