//! End-to-end runs: encode, identify, sign, verification code, validate.
//!
//! Run with: `cargo test --features all --test pipeline_tests`

#![cfg(all(feature = "qr", feature = "schema"))]

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal_macros::dec;
use sifen::config::{SifenConfig, SifenConfigBuilder, SuffixPolicy};
use sifen::core::*;
use sifen::pipeline::Pipeline;
use sifen::schema::Schema;
use sifen::sign::{self, Signer};
use sifen::xml::{Document, Element};

const SECRET: &str = "ABCD0000000000000000000000000000";

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn path(relative: &str) -> String {
    format!("{}/{relative}", env!("CARGO_MANIFEST_DIR"))
}

fn config() -> SifenConfigBuilder {
    SifenConfigBuilder::new()
        .schema_path(path("schemas/siRecepDE_v150.xsd"))
        .key_path(path("tests/fixtures/key.pem"))
        .certificate_path(path("tests/fixtures/cert.pem"))
        .csc("0001", SECRET)
}

fn pipeline() -> Pipeline {
    init_logging();
    Pipeline::from_config(config().build()).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn invoice(number: &str) -> Invoice {
    InvoiceBuilder::new(number, at(2025, 3, 10, 9, 30))
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
        .add_line(LineItemBuilder::new("NB-14", "Notebook", dec!(2), dec!(7500000)).build())
        .add_line(LineItemBuilder::new("MS-01", "Mouse", dec!(5), dec!(150000)).build())
        .build()
        .unwrap()
}

fn names(element: &Element) -> Vec<&str> {
    element.elements().map(Element::local_name).collect()
}

#[test]
fn processed_document_is_complete_and_valid() {
    let pipeline = pipeline();
    let processed = pipeline
        .process(&invoice("001-001-0000002"), at(2025, 3, 10, 10, 0))
        .unwrap();

    assert_eq!(
        names(processed.document.root()),
        ["dVerFor", "DE", "Signature", "gCamFuFD"]
    );
    let de = processed.document.find("DE").unwrap();
    assert_eq!(de.attr("Id"), Some(processed.identifier.as_str()));
    assert_eq!(processed.signature.reference, processed.identifier.as_str());
    assert_eq!(
        processed.document.find_text("dCarQR"),
        Some(processed.verification.url())
    );
    assert!(processed.verification.query().contains("&cItems=2&"));
    assert!(processed.verification.query().contains("&dTotGralOpe=17325000.00&"));

    // The returned bytes are the validated ones.
    assert_eq!(processed.bytes(), processed.document.to_bytes().unwrap());
    let schema = Schema::load(path("schemas/siRecepDE_v150.xsd")).unwrap();
    assert!(schema.validate(processed.bytes()).unwrap().is_valid());

    let parsed = Document::parse(processed.bytes()).unwrap();
    let signer = Signer::from_pem_files(
        path("tests/fixtures/key.pem"),
        path("tests/fixtures/cert.pem"),
    )
    .unwrap();
    sign::verify(&parsed, signer.certificate()).unwrap();
}

#[test]
fn same_input_same_bytes() {
    let pipeline = pipeline();
    let invoice = invoice("001-001-0000003");
    let now = at(2025, 3, 10, 10, 0);
    let a = pipeline.process(&invoice, now).unwrap().into_bytes();
    let b = pipeline.process(&invoice, now).unwrap().into_bytes();
    assert_eq!(a, b);
}

#[test]
fn fixed_suffix_policy() {
    init_logging();
    let pipeline = Pipeline::from_config(
        config()
            .suffix_policy(SuffixPolicy::Fixed("7".into()))
            .build(),
    )
    .unwrap();
    let processed = pipeline
        .process(&invoice("001-001-0000004"), at(2025, 3, 10, 10, 0))
        .unwrap();
    assert!(processed.identifier.as_str().ends_with("00000000007"));
}

#[test]
fn sequence_suffix_policy() {
    init_logging();
    let pipeline = Pipeline::from_config(config().suffix_policy(SuffixPolicy::Sequence).build())
        .unwrap()
        .with_sequence(SuffixSequence::starting_at(41));
    let now = at(2025, 3, 10, 10, 0);
    let first = pipeline.process(&invoice("001-001-0000005"), now).unwrap();
    let second = pipeline.process(&invoice("001-001-0000005"), now).unwrap();
    assert!(first.identifier.as_str().ends_with("00000000041"));
    assert!(second.identifier.as_str().ends_with("00000000042"));
}

#[test]
fn shared_across_threads() {
    init_logging();
    let pipeline = Arc::new(
        Pipeline::from_config(config().suffix_policy(SuffixPolicy::Sequence).build()).unwrap(),
    );
    let invoice = invoice("001-001-0000006");
    let now = at(2025, 3, 10, 10, 0);

    let ids: HashSet<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pipeline = Arc::clone(&pipeline);
                let invoice = &invoice;
                scope.spawn(move || {
                    pipeline
                        .process(invoice, now)
                        .map(|p| String::from(p.identifier))
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(ids.len(), 4);
}

#[test]
fn missing_csc_fails_before_encoding() {
    init_logging();
    let config = SifenConfig {
        csc_secret: None,
        ..config().build()
    };
    let pipeline = Pipeline::from_config(config).unwrap();
    let err = pipeline
        .process(&invoice("001-001-0000007"), at(2025, 3, 10, 10, 0))
        .unwrap_err();
    assert!(matches!(err, SifenError::VerificationCode(_)));
}

#[test]
fn missing_resources_are_reported_by_kind() {
    let no_contract = Pipeline::from_config(
        config()
            .schema_path(path("schemas/missing.xsd"))
            .build(),
    );
    assert!(matches!(no_contract, Err(SifenError::ContractUnavailable(_))));

    let no_key = Pipeline::from_config(config().key_path(path("tests/fixtures/missing.pem")).build());
    assert!(matches!(no_key, Err(SifenError::Signature(_))));
}

#[test]
fn contract_violation_stops_the_run() {
    init_logging();
    let strict = Schema::parse(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                      targetNamespace="http://ekuatia.set.gov.py/sifen/xsd"
                      elementFormDefault="qualified">
             <xs:element name="rDE">
               <xs:complexType>
                 <xs:sequence>
                   <xs:element name="dVerFor" type="xs:unsignedShort"/>
                 </xs:sequence>
               </xs:complexType>
             </xs:element>
           </xs:schema>"#,
    )
    .unwrap();
    let signer = Signer::from_pem_files(
        path("tests/fixtures/key.pem"),
        path("tests/fixtures/cert.pem"),
    )
    .unwrap();
    let pipeline = Pipeline::new(config().build(), Arc::new(signer), Arc::new(strict));

    let err = pipeline
        .process(&invoice("001-001-0000008"), at(2025, 3, 10, 10, 0))
        .unwrap_err();
    let SifenError::SchemaViolation(issues) = err else {
        panic!("expected a schema violation");
    };
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].location.path, "/rDE/DE");
    assert_eq!(issues[0].severity, Severity::Error);
}

/// Accepts any document whose dNumDoc does not end in 9.
const ID_GUARD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                      xmlns="http://ekuatia.set.gov.py/sifen/xsd"
                      targetNamespace="http://ekuatia.set.gov.py/sifen/xsd"
                      elementFormDefault="qualified">
  <xs:simpleType name="tId">
    <xs:restriction base="xs:string">
      <xs:pattern value="[0-9]{24}[0-8][0-9]{19}"/>
    </xs:restriction>
  </xs:simpleType>
  <xs:element name="rDE">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="dVerFor" type="xs:unsignedShort"/>
        <xs:element name="DE">
          <xs:complexType>
            <xs:sequence>
              <xs:any processContents="skip" maxOccurs="unbounded"/>
            </xs:sequence>
            <xs:attribute name="Id" type="tId" use="required"/>
          </xs:complexType>
        </xs:element>
        <xs:any processContents="skip" minOccurs="0" maxOccurs="unbounded"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
</xs:schema>"#;

#[test]
fn rejected_document_keeps_its_suffix() {
    init_logging();
    let signer = Signer::from_pem_files(
        path("tests/fixtures/key.pem"),
        path("tests/fixtures/cert.pem"),
    )
    .unwrap();
    let pipeline = Pipeline::new(
        config().suffix_policy(SuffixPolicy::Sequence).build(),
        Arc::new(signer),
        Arc::new(Schema::parse(ID_GUARD).unwrap()),
    )
    .with_sequence(SuffixSequence::starting_at(7));
    let now = at(2025, 3, 10, 10, 0);

    let err = pipeline
        .process(&invoice("001-001-0000019"), now)
        .unwrap_err();
    let SifenError::SchemaViolation(issues) = err else {
        panic!("expected a schema violation");
    };
    assert_eq!(issues[0].location.path, "/rDE/DE");

    let first = pipeline.process(&invoice("001-001-0000020"), now).unwrap();
    let second = pipeline.process(&invoice("001-001-0000021"), now).unwrap();
    assert!(first.identifier.as_str().ends_with("00000000007"));
    assert!(second.identifier.as_str().ends_with("00000000008"));
}

#[test]
fn invalid_invoice_is_rejected_before_signing() {
    let pipeline = pipeline();
    let mut invoice = invoice("001-001-0000009");
    invoice.lines.clear();
    let err = pipeline.process(&invoice, at(2025, 3, 10, 10, 0)).unwrap_err();
    assert!(matches!(err, SifenError::Validation(_)));
}
