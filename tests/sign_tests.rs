//! Signature and verification code tests against the PEM fixtures.
//!
//! Run with: `cargo test --features qr --test sign_tests`

#![cfg(feature = "sign")]

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal_macros::dec;
use sifen::core::*;
use sifen::encode::encode;
use sifen::identifier::{self, Identifier};
use sifen::sign::{self, DSIG_NS, Signer};
use sifen::xml::{Document, Element};
use x509_cert::Certificate;
use x509_cert::der::DecodePem;

const KEY: &str = include_str!("fixtures/key.pem");
const KEY_PKCS1: &str = include_str!("fixtures/key_pkcs1.pem");
const CERT: &str = include_str!("fixtures/cert.pem");
const OTHER_CERT: &str = include_str!("fixtures/other_cert.pem");

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn invoice() -> Invoice {
    InvoiceBuilder::new("001-001-0000001", at(2025, 3, 10, 9, 30))
        .security_code("123456789")
        .stamp("12345678", "2025-01-01")
        .issuer(
            IssuerBuilder::new(
                "80012345",
                "7",
                "Tecnología S.A.",
                AddressBuilder::new("Av. Mcal. López", "1234", "1", "1").build(),
            )
            .phone("021555000")
            .email("ventas@tecnologia.com.py")
            .activity("62010")
            .build(),
        )
        .recipient(RecipientBuilder::taxpayer("80054321", "3", "Cliente S.R.L.").build())
        .add_line(LineItemBuilder::new("SRV-01", "Consultoría", dec!(1), dec!(1500000)).build())
        .build()
        .unwrap()
}

fn signer() -> Signer {
    Signer::from_pem(KEY, CERT).unwrap()
}

/// Encoded and identified, not yet signed.
fn identified() -> (Document, Identifier) {
    let mut doc = encode(&invoice(), at(2025, 3, 10, 10, 0)).unwrap();
    let id = identifier::assign(&mut doc, "00000000001").unwrap();
    (doc, id)
}

fn names(element: &Element) -> Vec<&str> {
    element.elements().map(Element::local_name).collect()
}

// ── Key material ────────────────────────────────────────────────────────────

#[test]
fn pkcs1_and_pkcs8_keys_sign_identically() {
    let (mut a, _) = identified();
    let (mut b, _) = identified();
    let pkcs8 = signer().sign(&mut a).unwrap();
    let pkcs1 = Signer::from_pem(KEY_PKCS1, CERT).unwrap().sign(&mut b).unwrap();
    assert_eq!(pkcs8, pkcs1);
}

#[test]
fn mismatched_certificate_is_rejected() {
    let err = Signer::from_pem(KEY, OTHER_CERT).unwrap_err();
    assert!(matches!(err, SifenError::Signature(ref m) if m.contains("does not match")));
}

#[test]
fn unreadable_material_is_a_signature_error() {
    assert!(matches!(
        Signer::from_pem("not a key", CERT),
        Err(SifenError::Signature(_))
    ));
    assert!(matches!(
        Signer::from_pem(KEY, "not a certificate"),
        Err(SifenError::Signature(_))
    ));
    assert!(matches!(
        Signer::from_pem_files("missing/key.pem", "missing/cert.pem"),
        Err(SifenError::Signature(_))
    ));
}

#[test]
fn loads_from_files() {
    let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");
    let signer = Signer::from_pem_files(format!("{dir}/key.pem"), format!("{dir}/cert.pem"));
    assert!(signer.is_ok());
}

// ── Signing ─────────────────────────────────────────────────────────────────

#[test]
fn signature_follows_document() {
    let (mut doc, id) = identified();
    let signer = signer();
    let outcome = signer.sign(&mut doc).unwrap();

    assert_eq!(outcome.reference, id.as_str());
    assert_eq!(names(doc.root()), ["dVerFor", "DE", "Signature"]);

    let signature = doc.root().child("Signature").unwrap();
    assert_eq!(signature.attr("xmlns"), Some(DSIG_NS));
    assert_eq!(names(signature), ["SignedInfo", "SignatureValue", "KeyInfo"]);
    assert_eq!(
        signature.find("Reference").and_then(|r| r.attr("URI")),
        Some(format!("#{id}").as_str())
    );
    assert_eq!(doc.find_text("DigestValue"), Some(outcome.digest_value.clone()));
    assert_eq!(doc.find_text("SignatureValue"), Some(outcome.signature_value.clone()));
    assert!(!outcome.signature_value.is_empty());

    sign::verify(&doc, signer.certificate()).unwrap();
}

#[test]
fn signature_survives_serialization() {
    let (mut doc, _) = identified();
    let signer = signer();
    signer.sign(&mut doc).unwrap();

    let parsed = Document::parse(&doc.to_bytes().unwrap()).unwrap();
    sign::verify(&parsed, signer.certificate()).unwrap();
}

#[test]
fn signing_is_deterministic() {
    let (mut a, _) = identified();
    let (mut b, _) = identified();
    let signer = signer();
    signer.sign(&mut a).unwrap();
    signer.sign(&mut b).unwrap();
    assert_eq!(a.to_bytes().unwrap(), b.to_bytes().unwrap());
}

#[test]
fn missing_reference_is_a_signature_error() {
    let mut doc = encode(&invoice(), at(2025, 3, 10, 10, 0)).unwrap();
    let err = signer().sign(&mut doc).unwrap_err();
    assert!(matches!(err, SifenError::Signature(_)));
    assert_eq!(names(doc.root()), ["dVerFor", "DE"]);

    let mut empty = Document::new(Element::new("rDE"));
    assert!(matches!(
        signer().sign(&mut empty),
        Err(SifenError::Signature(_))
    ));
}

#[test]
fn refuses_to_sign_twice() {
    let (mut doc, _) = identified();
    let signer = signer();
    signer.sign(&mut doc).unwrap();
    assert!(matches!(signer.sign(&mut doc), Err(SifenError::Signature(_))));
}

// ── Verification ────────────────────────────────────────────────────────────

#[test]
fn tampered_content_fails_verification() {
    let (mut doc, _) = identified();
    let signer = signer();
    signer.sign(&mut doc).unwrap();

    doc.find_mut("dNomRec").unwrap().set_text("Otro Cliente S.A.");
    let err = sign::verify(&doc, signer.certificate()).unwrap_err();
    assert!(matches!(err, SifenError::Signature(ref m) if m.contains("digest")));
}

#[test]
fn tampered_signature_value_fails_verification() {
    let (mut doc, _) = identified();
    let signer = signer();
    let outcome = signer.sign(&mut doc).unwrap();

    let mut forged = outcome.signature_value.into_bytes();
    forged[10] = if forged[10] == b'A' { b'B' } else { b'A' };
    doc.find_mut("SignatureValue")
        .unwrap()
        .set_text(String::from_utf8(forged).unwrap());
    assert!(matches!(
        sign::verify(&doc, signer.certificate()),
        Err(SifenError::Signature(_))
    ));
}

#[test]
fn other_certificate_does_not_verify() {
    let (mut doc, _) = identified();
    signer().sign(&mut doc).unwrap();
    let other = Certificate::from_pem(OTHER_CERT).unwrap();
    assert!(matches!(
        sign::verify(&doc, &other),
        Err(SifenError::Signature(_))
    ));
}

#[test]
fn unsigned_document_does_not_verify() {
    let (doc, _) = identified();
    assert!(matches!(
        sign::verify(&doc, signer().certificate()),
        Err(SifenError::Signature(_))
    ));
}

// ── Verification code ───────────────────────────────────────────────────────

#[cfg(feature = "qr")]
mod verification_code {
    use super::*;
    use hmac::{Hmac, Mac};
    use sha2::Sha256;
    use sifen::qr;

    const SECRET: &str = "ABCD0000000000000000000000000000";

    #[test]
    fn derived_from_signed_document() {
        let (mut doc, id) = identified();
        let outcome = signer().sign(&mut doc).unwrap();
        let code = qr::derive_code(&doc, "0001", SECRET).unwrap();

        let expected = format!(
            "nVersion=150&Id={id}&dFeEmiDE=2025-03-10T09:30:00&dRucRec=80054321\
             &dTotGralOpe=1650000.00&dTotIVA=150000.00&cItems=1&DigestValue={}&IdCSC=0001",
            outcome.digest_value
        );
        assert_eq!(code.query(), expected);

        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(expected.as_bytes());
        assert_eq!(code.hash(), hex::encode(mac.finalize().into_bytes()));
        assert_eq!(code.hash().len(), 64);
        assert!(code.hash().bytes().all(|b| !b.is_ascii_uppercase()));
    }

    #[test]
    fn secret_keys_the_hash() {
        let (mut doc, _) = identified();
        signer().sign(&mut doc).unwrap();
        let a = qr::derive_code(&doc, "0001", SECRET).unwrap();
        let b = qr::derive_code(&doc, "0001", "another-secret").unwrap();
        assert_eq!(a.query(), b.query());
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn attached_after_signature() {
        let (mut doc, _) = identified();
        signer().sign(&mut doc).unwrap();
        let code =
            qr::derive_code_with_base(&doc, "https://ekuatia.set.gov.py/consultas/qr", "0001", SECRET)
                .unwrap();
        qr::attach(&mut doc, &code).unwrap();

        assert_eq!(names(doc.root()), ["dVerFor", "DE", "Signature", "gCamFuFD"]);
        let stored = doc.find_text("dCarQR").unwrap();
        assert!(stored.starts_with("https://ekuatia.set.gov.py/consultas/qr?nVersion=150&"));
        assert!(stored.ends_with(&format!("&cHashQR={}", code.hash())));
    }

    #[test]
    fn unsigned_document_has_no_code() {
        let (mut doc, _) = identified();
        assert!(matches!(
            qr::derive_code(&doc, "0001", SECRET),
            Err(SifenError::VerificationCode(_))
        ));

        signer().sign(&mut doc).unwrap();
        let code = qr::derive_code(&doc, "0001", SECRET).unwrap();
        let mut unsigned = doc.clone();
        unsigned.root_mut().remove_children("Signature");
        assert!(matches!(
            qr::attach(&mut unsigned, &code),
            Err(SifenError::VerificationCode(_))
        ));
    }
}
