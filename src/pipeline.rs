//! The full encode → identify → sign → verification code → validate run.
//!
//! ```no_run
//! use sifen::config::SifenConfigBuilder;
//! use sifen::pipeline::Pipeline;
//! # fn invoice() -> sifen::core::Invoice { unimplemented!() }
//!
//! let config = SifenConfigBuilder::new()
//!     .csc("0001", "ABCD0000000000000000000000000000")
//!     .build();
//! let pipeline = Pipeline::from_config(config)?;
//! let now = chrono::Local::now().naive_local();
//! let processed = pipeline.process(&invoice(), now)?;
//! std::fs::write("signed.xml", processed.bytes())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDateTime;

use crate::config::{SifenConfig, SuffixPolicy};
use crate::core::{Invoice, SifenError, SuffixSequence};
use crate::encode::encode_with_version;
use crate::identifier::{self, Identifier};
use crate::qr::{self, VerificationString};
use crate::schema::Schema;
use crate::sign::{SignatureOutcome, Signer};
use crate::xml::Document;

/// Shared key material, compiled contract and suffix state.
///
/// `process` takes `&self`, so one pipeline can serve many threads.
#[derive(Debug)]
pub struct Pipeline {
    config: SifenConfig,
    signer: Arc<Signer>,
    schema: Arc<Schema>,
    sequence: Mutex<SuffixSequence>,
}

/// A signed, verified and schema-valid document.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub document: Document,
    pub identifier: Identifier,
    pub signature: SignatureOutcome,
    pub verification: VerificationString,
    bytes: Vec<u8>,
}

impl ProcessedDocument {
    /// The exact serialized bytes that passed validation.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl Pipeline {
    pub fn new(config: SifenConfig, signer: Arc<Signer>, schema: Arc<Schema>) -> Self {
        Self {
            config,
            signer,
            schema,
            sequence: Mutex::new(SuffixSequence::new()),
        }
    }

    /// Load the key material and contract named by `config`.
    pub fn from_config(config: SifenConfig) -> Result<Self, SifenError> {
        let signer = Arc::new(Signer::from_config(&config)?);
        let schema = Arc::new(Schema::from_config(&config)?);
        Ok(Self::new(config, signer, schema))
    }

    /// Continue identifier suffixes from `sequence` under [`SuffixPolicy::Sequence`].
    pub fn with_sequence(mut self, sequence: SuffixSequence) -> Self {
        self.sequence = Mutex::new(sequence);
        self
    }

    pub fn config(&self) -> &SifenConfig {
        &self.config
    }

    /// Run every stage on one invoice. The first failing stage ends the run.
    ///
    /// Under [`SuffixPolicy::Sequence`] the suffix is committed only once the
    /// document passes validation; runs using the sequence are serialized.
    pub fn process(
        &self,
        invoice: &Invoice,
        now: NaiveDateTime,
    ) -> Result<ProcessedDocument, SifenError> {
        let csc = self.config.csc()?;
        let document = encode_with_version(invoice, now, self.config.format_version)?;

        match &self.config.suffix_policy {
            SuffixPolicy::Sequence => {
                let mut sequence = self.sequence.lock().unwrap_or_else(PoisonError::into_inner);
                let processed = self.complete(invoice, document, &sequence.peek()?, csc)?;
                sequence.next_suffix()?;
                Ok(processed)
            }
            fixed => self.complete(invoice, document, &fixed.next_suffix(None)?, csc),
        }
    }

    /// Identify, sign, attach the verification code and validate.
    fn complete(
        &self,
        invoice: &Invoice,
        mut document: Document,
        suffix: &str,
        (csc_id, csc_secret): (&str, &str),
    ) -> Result<ProcessedDocument, SifenError> {
        let identifier = identifier::assign(&mut document, suffix)?;
        let signature = self.signer.sign(&mut document)?;

        let verification = qr::derive_code_with_base(
            &document,
            &self.config.qr_base_url,
            csc_id,
            csc_secret,
        )?;
        qr::attach(&mut document, &verification)?;

        let bytes = document.to_bytes()?;
        self.schema.validate(&bytes)?.into_result()?;

        tracing::info!(
            number = %invoice.number,
            id = %identifier,
            bytes = bytes.len(),
            "document processed"
        );
        Ok(ProcessedDocument {
            document,
            identifier,
            signature,
            verification,
            bytes,
        })
    }
}
