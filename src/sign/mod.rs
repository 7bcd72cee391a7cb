//! Enveloped XML-DSig signature over the `DE` element.
//!
//! The reference points at `#<Id>`, is transformed with enveloped-signature
//! then exclusive C14N, and is digested with SHA-256. `SignedInfo` is
//! canonicalized the same way and signed with RSA-SHA256 (PKCS#1 v1.5). The
//! `Signature` block, in the XML-DSig default namespace, lands right after
//! `DE` and embeds the signing certificate.

mod c14n;

use std::path::Path;

use base64ct::{Base64, Encoding};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::{Signature as RsaSignature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::signature::{SignatureEncoding, Signer as _, Verifier as _};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use x509_cert::Certificate;
use x509_cert::der::{DecodePem, Encode};

use crate::config::SifenConfig;
use crate::core::SifenError;
use crate::xml::{Document, Element};

use c14n::{canonicalize, in_scope};

/// XML-DSig namespace.
pub const DSIG_NS: &str = "http://www.w3.org/2000/09/xmldsig#";
/// Exclusive XML canonicalization 1.0, without comments.
pub const EXC_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";
pub const RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";
pub const ENVELOPED: &str = "http://www.w3.org/2000/09/xmldsig#enveloped-signature";
pub const SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";

fn sig_err(message: impl Into<String>) -> SifenError {
    SifenError::Signature(message.into())
}

/// Values produced by a signature, for logging and the QR stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureOutcome {
    /// The referenced `Id`, without `#`.
    pub reference: String,
    /// Base64 SHA-256 digest of the canonical `DE`.
    pub digest_value: String,
    /// Base64 RSA-SHA256 signature over the canonical `SignedInfo`.
    pub signature_value: String,
}

/// RSA private key plus the X.509 certificate embedded in every signature.
///
/// Load once and share; signing borrows immutably.
pub struct Signer {
    key: SigningKey<Sha256>,
    certificate: Certificate,
    certificate_der: Vec<u8>,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("subject", &self.certificate.tbs_certificate.subject.to_string())
            .finish_non_exhaustive()
    }
}

impl Signer {
    /// Build from PEM text. The key may be PKCS#8 or PKCS#1; the certificate
    /// must carry the key's public half.
    pub fn from_pem(key_pem: &str, certificate_pem: &str) -> Result<Self, SifenError> {
        let private = RsaPrivateKey::from_pkcs8_pem(key_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(key_pem))
            .map_err(|e| sig_err(format!("unreadable private key: {e}")))?;
        let certificate = Certificate::from_pem(certificate_pem)
            .map_err(|e| sig_err(format!("unreadable certificate: {e}")))?;

        if public_key(&certificate)? != private.to_public_key() {
            return Err(sig_err("certificate does not match the private key"));
        }

        let certificate_der = certificate
            .to_der()
            .map_err(|e| sig_err(format!("certificate encoding failed: {e}")))?;
        Ok(Self {
            key: SigningKey::new(private),
            certificate,
            certificate_der,
        })
    }

    /// Read both PEM files. A missing file is a [`SifenError::Signature`].
    pub fn from_pem_files(
        key_path: impl AsRef<Path>,
        certificate_path: impl AsRef<Path>,
    ) -> Result<Self, SifenError> {
        let read = |path: &Path| {
            std::fs::read_to_string(path)
                .map_err(|e| sig_err(format!("cannot read {}: {e}", path.display())))
        };
        let key_pem = read(key_path.as_ref())?;
        let certificate_pem = read(certificate_path.as_ref())?;
        Self::from_pem(&key_pem, &certificate_pem)
    }

    /// Load the key material named by the configuration.
    pub fn from_config(config: &SifenConfig) -> Result<Self, SifenError> {
        Self::from_pem_files(&config.key_path, &config.certificate_path)
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// Sign the `DE` element in place and insert the `Signature` block after it.
    ///
    /// `DE` must carry an `Id` (see [`crate::identifier::assign`]) and sit
    /// directly under the root. A document that is already signed is refused.
    pub fn sign(&self, doc: &mut Document) -> Result<SignatureOutcome, SifenError> {
        let reference = doc
            .root()
            .child("DE")
            .ok_or_else(|| sig_err("reference target DE not found"))?
            .attr("Id")
            .filter(|id| !id.is_empty())
            .ok_or_else(|| sig_err("DE has no Id to reference"))?
            .to_string();
        if doc.root().child("Signature").is_some() {
            return Err(sig_err("document is already signed"));
        }

        let digest_value = reference_digest(doc.root(), &reference)?;
        tracing::debug!(reference = %reference, digest = %digest_value, "reference digest computed");

        let signature = signature_template(&reference, &digest_value, &self.certificate_der);
        if !doc.root_mut().insert_after("DE", signature) {
            return Err(sig_err("reference target DE not found"));
        }

        let signed_info = canonical_signed_info(doc.root())?;
        let signature_value = Base64::encode_string(&self.key.sign(&signed_info).to_bytes());

        let value = doc
            .root_mut()
            .child_mut("Signature")
            .and_then(|s| s.child_mut("SignatureValue"))
            .ok_or_else(|| sig_err("signature block lost after insertion"))?;
        value.set_text(signature_value.as_str());

        tracing::info!(reference = %reference, "document signed");
        Ok(SignatureOutcome {
            reference,
            digest_value,
            signature_value,
        })
    }
}

fn public_key(certificate: &Certificate) -> Result<RsaPublicKey, SifenError> {
    let spki = certificate
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| sig_err(format!("certificate key encoding failed: {e}")))?;
    RsaPublicKey::from_public_key_der(&spki)
        .map_err(|e| sig_err(format!("certificate does not hold an RSA key: {e}")))
}

/// Base64 SHA-256 of the exclusive-canonical form of the element with `Id == reference`.
fn reference_digest(root: &Element, reference: &str) -> Result<String, SifenError> {
    let target = root
        .find_by_id(reference)
        .ok_or_else(|| sig_err(format!("reference target #{reference} not found")))?;
    let scope = in_scope(root, target)
        .ok_or_else(|| sig_err(format!("reference target #{reference} not found")))?;
    let canonical = canonicalize(target, &scope, true)?;
    Ok(Base64::encode_string(&Sha256::digest(&canonical)))
}

fn canonical_signed_info(root: &Element) -> Result<Vec<u8>, SifenError> {
    let signed_info = root
        .child("Signature")
        .and_then(|s| s.child("SignedInfo"))
        .ok_or_else(|| sig_err("SignedInfo not found"))?;
    let scope = in_scope(root, signed_info).ok_or_else(|| sig_err("SignedInfo not found"))?;
    canonicalize(signed_info, &scope, false)
}

fn algorithm(name: &str, uri: &str) -> Element {
    Element::new(name).with_attr("Algorithm", uri)
}

/// The `Signature` block with an empty `SignatureValue`.
fn signature_template(reference: &str, digest_value: &str, certificate_der: &[u8]) -> Element {
    let mut transforms = Element::new("Transforms");
    transforms.push(algorithm("Transform", ENVELOPED));
    transforms.push(algorithm("Transform", EXC_C14N));

    let mut reference_el = Element::new("Reference").with_attr("URI", format!("#{reference}"));
    reference_el.push(transforms);
    reference_el.push(algorithm("DigestMethod", SHA256));
    reference_el.push_leaf("DigestValue", digest_value);

    let mut signed_info = Element::new("SignedInfo");
    signed_info.push(algorithm("CanonicalizationMethod", EXC_C14N));
    signed_info.push(algorithm("SignatureMethod", RSA_SHA256));
    signed_info.push(reference_el);

    let mut x509 = Element::new("X509Data");
    x509.push_leaf("X509Certificate", Base64::encode_string(certificate_der));
    let mut key_info = Element::new("KeyInfo");
    key_info.push(x509);

    let mut signature = Element::new("Signature").with_attr("xmlns", DSIG_NS);
    signature.push(signed_info);
    signature.push_leaf("SignatureValue", "");
    signature.push(key_info);
    signature
}

/// Check the signature of a signed document against `certificate`.
///
/// Recomputes the reference digest, then verifies `SignatureValue` over the
/// canonical `SignedInfo` with the certificate's RSA key.
pub fn verify(doc: &Document, certificate: &Certificate) -> Result<(), SifenError> {
    let root = doc.root();
    let signature = root
        .child("Signature")
        .ok_or_else(|| sig_err("document is not signed"))?;
    let reference = signature
        .child("SignedInfo")
        .and_then(|s| s.child("Reference"))
        .ok_or_else(|| sig_err("Reference not found"))?;
    let id = reference
        .attr("URI")
        .and_then(|uri| uri.strip_prefix('#'))
        .ok_or_else(|| sig_err("Reference URI is not a same-document fragment"))?;

    let expected = reference
        .child("DigestValue")
        .map(Element::text)
        .unwrap_or_default();
    if reference_digest(root, id)? != expected.trim() {
        return Err(sig_err("digest does not match the referenced content"));
    }

    let encoded: String = signature
        .child("SignatureValue")
        .map(Element::text)
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let bytes = Base64::decode_vec(&encoded)
        .map_err(|e| sig_err(format!("SignatureValue is not base64: {e}")))?;
    let value = RsaSignature::try_from(bytes.as_slice())
        .map_err(|e| sig_err(format!("malformed SignatureValue: {e}")))?;

    let verifying_key = VerifyingKey::<Sha256>::new(public_key(certificate)?);
    verifying_key
        .verify(&canonical_signed_info(root)?, &value)
        .map_err(|_| sig_err("SignatureValue does not verify"))?;
    tracing::debug!(reference = %id, "signature verified");
    Ok(())
}
