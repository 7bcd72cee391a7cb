//! Runtime configuration for the document pipeline.
//!
//! ```
//! use sifen::config::{SifenConfigBuilder, SuffixPolicy};
//!
//! let config = SifenConfigBuilder::new()
//!     .csc("0001", "ABCD0000000000000000000000000000")
//!     .suffix_policy(SuffixPolicy::Sequence)
//!     .build();
//! assert_eq!(config.format_version, 150);
//! assert_eq!(config.schema_path.to_str(), Some("schemas/siRecepDE_v150.xsd"));
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::{SUFFIX_WIDTH, SifenError, SuffixSequence};

/// Default literal identifier suffix.
pub const DEFAULT_SUFFIX: &str = "00000000001";

/// Test-environment QR lookup endpoint.
pub const DEFAULT_QR_BASE_URL: &str = "https://ekuatia.set.gov.py/consultas-test/qr";

/// How the 11-digit tail of the document identifier is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuffixPolicy {
    /// Always the same value, zero-padded to 11 digits.
    Fixed(String),
    /// Next value of a caller-owned [`SuffixSequence`].
    Sequence,
}

impl Default for SuffixPolicy {
    fn default() -> Self {
        Self::Fixed(DEFAULT_SUFFIX.to_string())
    }
}

impl SuffixPolicy {
    /// Produce the suffix for the next document.
    ///
    /// `Sequence` consumes one value from `sequence` and fails when none is given.
    pub fn next_suffix(&self, sequence: Option<&mut SuffixSequence>) -> Result<String, SifenError> {
        match self {
            Self::Fixed(value) => normalize_suffix(value),
            Self::Sequence => sequence
                .ok_or_else(|| {
                    SifenError::invalid("suffix_policy", "sequence policy needs a suffix sequence")
                })?
                .next_suffix(),
        }
    }
}

/// Check a suffix is numeric and at most 11 digits, then zero-pad it.
pub fn normalize_suffix(value: &str) -> Result<String, SifenError> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) || value.len() > SUFFIX_WIDTH
    {
        return Err(SifenError::format(
            value,
            format!("identifier suffix must be 1 to {SUFFIX_WIDTH} digits"),
        ));
    }
    Ok(format!("{value:0>SUFFIX_WIDTH$}"))
}

/// Pipeline configuration: contract and key locations, QR settings, suffix policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SifenConfig {
    /// Schema contract, `schemas/siRecepDE_v150.xsd` by default.
    pub schema_path: PathBuf,
    /// PEM certificate, `cert/cert.pem` by default.
    pub certificate_path: PathBuf,
    /// PEM private key (PKCS#8 or PKCS#1), `cert/key.pem` by default.
    pub key_path: PathBuf,
    pub qr_base_url: String,
    /// IdCSC issued by the tax authority.
    pub csc_id: Option<String>,
    /// CSC secret keying the QR hash.
    pub csc_secret: Option<String>,
    pub suffix_policy: SuffixPolicy,
    /// dVerFor / nVersion.
    pub format_version: u16,
}

impl Default for SifenConfig {
    fn default() -> Self {
        Self {
            schema_path: PathBuf::from("schemas/siRecepDE_v150.xsd"),
            certificate_path: PathBuf::from("cert/cert.pem"),
            key_path: PathBuf::from("cert/key.pem"),
            qr_base_url: DEFAULT_QR_BASE_URL.to_string(),
            csc_id: None,
            csc_secret: None,
            suffix_policy: SuffixPolicy::default(),
            format_version: 150,
        }
    }
}

impl SifenConfig {
    /// The CSC pair, or a verification-code error naming what is missing.
    pub fn csc(&self) -> Result<(&str, &str), SifenError> {
        match (self.csc_id.as_deref(), self.csc_secret.as_deref()) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            (None, _) => Err(SifenError::VerificationCode("CSC id is not configured".into())),
            (_, None) => Err(SifenError::VerificationCode(
                "CSC secret is not configured".into(),
            )),
        }
    }
}

/// Builder for [`SifenConfig`].
#[derive(Debug, Default)]
pub struct SifenConfigBuilder {
    config: SifenConfig,
}

impl SifenConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.schema_path = path.into();
        self
    }

    pub fn certificate_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.certificate_path = path.into();
        self
    }

    pub fn key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.key_path = path.into();
        self
    }

    pub fn qr_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.qr_base_url = url.into();
        self
    }

    /// Set both the CSC id and its secret.
    pub fn csc(mut self, id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.config.csc_id = Some(id.into());
        self.config.csc_secret = Some(secret.into());
        self
    }

    pub fn suffix_policy(mut self, policy: SuffixPolicy) -> Self {
        self.config.suffix_policy = policy;
        self
    }

    pub fn format_version(mut self, version: u16) -> Self {
        self.config.format_version = version;
        self
    }

    pub fn build(self) -> SifenConfig {
        self.config
    }
}
