//! Validation against the XSD contract.
//!
//! The contract is compiled once into an immutable [`Schema`] that can be
//! shared between threads. Validation reports every issue it finds, each with
//! the line and element path of the offending node.
//!
//! ```no_run
//! use sifen::schema::Schema;
//!
//! let schema = Schema::load("schemas/siRecepDE_v150.xsd")?;
//! let xml = std::fs::read("signed.xml")?;
//! let result = schema.validate(&xml)?;
//! for issue in result.issues() {
//!     eprintln!("{issue}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod compile;
mod model;
mod validate;

use std::path::Path;

use crate::config::SifenConfig;
use crate::core::{SchemaIssue, Severity, SifenError};
use crate::xml::Document;

use model::Model;

/// A compiled schema contract.
#[derive(Debug)]
pub struct Schema {
    model: Model,
}

impl Schema {
    /// Compile the contract at `path`, following its includes and imports.
    ///
    /// A missing, malformed or unsupported contract is
    /// [`SifenError::ContractUnavailable`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SifenError> {
        let path = path.as_ref();
        let docs = compile::load_sources(path)?;
        let model = compile::compile(&docs)?;
        tracing::debug!(path = %path.display(), documents = docs.len(), "schema contract loaded");
        Ok(Self { model })
    }

    /// Compile the contract named by the configuration.
    pub fn from_config(config: &SifenConfig) -> Result<Self, SifenError> {
        Self::load(&config.schema_path)
    }

    /// Compile a self-contained contract from text. Relative includes resolve
    /// against the working directory.
    pub fn parse(xsd: &str) -> Result<Self, SifenError> {
        let docs = compile::parse_sources(xsd, Path::new("."))?;
        let model = compile::compile(&docs)?;
        Ok(Self { model })
    }

    /// Validate serialized bytes. Bytes that are not well-formed fail with
    /// [`SifenError::Syntax`] before any schema check runs.
    pub fn validate(&self, xml: &[u8]) -> Result<ValidationResult, SifenError> {
        let doc = Document::parse(xml)?;
        Ok(self.validate_document(&doc))
    }

    pub fn validate_document(&self, doc: &Document) -> ValidationResult {
        let issues = validate::validate(&self.model, doc.root());
        let errors = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count();
        if errors == 0 {
            for issue in &issues {
                tracing::warn!(%issue, "schema warning");
            }
            tracing::debug!(root = %doc.root().name, "document is schema-valid");
            ValidationResult::Valid
        } else {
            tracing::debug!(errors, total = issues.len(), "document violates schema");
            ValidationResult::Invalid(issues)
        }
    }
}

/// Outcome of a validation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    /// At least one error. Warnings found in the same run are kept alongside.
    Invalid(Vec<SchemaIssue>),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn issues(&self) -> &[SchemaIssue] {
        match self {
            Self::Valid => &[],
            Self::Invalid(issues) => issues,
        }
    }

    /// `Valid` becomes `Ok(())`, `Invalid` becomes [`SifenError::SchemaViolation`].
    pub fn into_result(self) -> Result<(), SifenError> {
        match self {
            Self::Valid => Ok(()),
            Self::Invalid(issues) => Err(SifenError::SchemaViolation(issues)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_problems_are_unavailable_not_violations() {
        let missing = Schema::load("does/not/exist.xsd");
        assert!(matches!(missing, Err(SifenError::ContractUnavailable(_))));

        let not_schema = Schema::parse("<root/>");
        assert!(matches!(not_schema, Err(SifenError::ContractUnavailable(_))));

        let broken = Schema::parse("<xs:schema xmlns:xs=\"http://www.w3.org/2001/XMLSchema\">");
        assert!(matches!(broken, Err(SifenError::ContractUnavailable(_))));

        let unsupported = Schema::parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:group name="g"><xs:sequence/></xs:group>
               </xs:schema>"#,
        );
        assert!(matches!(unsupported, Err(SifenError::ContractUnavailable(_))));
    }

    #[test]
    fn malformed_instance_is_a_syntax_error() {
        let schema = Schema::parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:element name="a" type="xs:string"/>
               </xs:schema>"#,
        )
        .unwrap();
        assert!(matches!(schema.validate(b"<a>"), Err(SifenError::Syntax { .. })));
        assert!(schema.validate(b"<a>x</a>").unwrap().is_valid());

        let result = schema.validate(b"<b/>").unwrap();
        assert_eq!(result.issues().len(), 1);
        assert!(matches!(
            result.into_result(),
            Err(SifenError::SchemaViolation(_))
        ));
    }

    #[test]
    fn schema_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Schema>();
    }
}
