//! QR verification string (`dCarQR`).
//!
//! Nine fields are read back from the signed document and joined as
//! `k=v&...`. `cHashQR` is the lowercase hex HMAC-SHA256 of that exact
//! string, keyed with the CSC secret.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::DEFAULT_QR_BASE_URL;
use crate::core::SifenError;
use crate::xml::{Document, Element};

type HmacSha256 = Hmac<Sha256>;

fn qr_err(message: impl Into<String>) -> SifenError {
    SifenError::VerificationCode(message.into())
}

/// A complete verification string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationString {
    base_url: String,
    query: String,
    hash: String,
}

impl VerificationString {
    /// The joined `k=v` pairs the hash was computed over.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// `cHashQR`.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// `<base_url>?<query>&cHashQR=<hash>`.
    pub fn url(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for VerificationString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}?{}&cHashQR={}", self.base_url, self.query, self.hash)
    }
}

/// Derive the verification string against the default lookup endpoint.
pub fn derive_code(
    doc: &Document,
    csc_id: &str,
    csc_secret: &str,
) -> Result<VerificationString, SifenError> {
    derive_code_with_base(doc, DEFAULT_QR_BASE_URL, csc_id, csc_secret)
}

/// Derive the verification string against `base_url`.
///
/// Every field must be present: a document that is not signed, or whose
/// recipient has neither `dRucRec` nor `dNumIDRec`, fails with
/// [`SifenError::VerificationCode`].
pub fn derive_code_with_base(
    doc: &Document,
    base_url: &str,
    csc_id: &str,
    csc_secret: &str,
) -> Result<VerificationString, SifenError> {
    let root = doc.root();
    let de = root
        .child("DE")
        .ok_or_else(|| qr_err("document has no DE element"))?;
    let text = |scope: &Element, name: &str| {
        scope
            .find(name)
            .map(|e| e.text().trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| qr_err(format!("{name} is missing")))
    };

    let version = text(root, "dVerFor")?;
    let id = de
        .attr("Id")
        .filter(|id| !id.is_empty())
        .ok_or_else(|| qr_err("DE has no Id"))?;
    let emitted = text(de, "dFeEmiDE")?;
    let recipient = de
        .find("gDatRec")
        .ok_or_else(|| qr_err("gDatRec is missing"))?;
    let (recipient_key, recipient_id) = match text(recipient, "dRucRec") {
        Ok(ruc) => ("dRucRec", ruc),
        Err(_) => ("dNumIDRec", text(recipient, "dNumIDRec")?),
    };
    let total = text(de, "dTotGralOpe")?;
    let tax = text(de, "dTotIVA")?;
    let mut items = Vec::new();
    de.find_all("gCamItem", &mut items);
    let item_count = items.len().to_string();
    let signature = root
        .child("Signature")
        .ok_or_else(|| qr_err("document is not signed"))?;
    let digest = text(signature, "DigestValue")?;
    if csc_id.trim().is_empty() {
        return Err(qr_err("IdCSC is missing"));
    }

    let fields = [
        ("nVersion", version.as_str()),
        ("Id", id),
        ("dFeEmiDE", emitted.as_str()),
        (recipient_key, recipient_id.as_str()),
        ("dTotGralOpe", total.as_str()),
        ("dTotIVA", tax.as_str()),
        ("cItems", item_count.as_str()),
        ("DigestValue", digest.as_str()),
        ("IdCSC", csc_id),
    ];
    let query = fields
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut mac = HmacSha256::new_from_slice(csc_secret.as_bytes())
        .map_err(|e| qr_err(format!("invalid CSC secret: {e}")))?;
    mac.update(query.as_bytes());
    let hash = hex::encode(mac.finalize().into_bytes());

    tracing::debug!(id = %id, items = items.len(), "verification code derived");
    Ok(VerificationString {
        base_url: base_url.to_string(),
        query,
        hash,
    })
}

/// Write `gCamFuFD/dCarQR` right after the signature, replacing an earlier one.
pub fn attach(doc: &mut Document, code: &VerificationString) -> Result<(), SifenError> {
    let root = doc.root_mut();
    root.remove_children("gCamFuFD");
    let mut block = Element::new("gCamFuFD");
    block.push_leaf("dCarQR", code.url());
    if root.insert_after("Signature", block) {
        Ok(())
    } else {
        Err(qr_err("document is not signed"))
    }
}
