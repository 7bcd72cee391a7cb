//! Contract loading and instance validation tests.
//!
//! Run with: `cargo test --features schema --test schema_tests`

#![cfg(feature = "schema")]

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal_macros::dec;
use sifen::core::*;
use sifen::encode::encode;
use sifen::identifier;
use sifen::schema::{Schema, ValidationResult};
use sifen::xml::Document;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/contract/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn bundled() -> Schema {
    Schema::load(format!(
        "{}/schemas/siRecepDE_v150.xsd",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap()
}

fn order_schema() -> Schema {
    Schema::load(fixture("order.xsd")).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn identified() -> Document {
    let invoice = InvoiceBuilder::new("001-001-0000001", at(2025, 3, 10, 9, 30))
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
        .unwrap();
    let mut doc = encode(&invoice, at(2025, 3, 10, 10, 0)).unwrap();
    identifier::assign(&mut doc, "00000000001").unwrap();
    doc
}

fn errors_at<'a>(result: &'a ValidationResult, path: &str) -> Vec<&'a SchemaIssue> {
    result
        .issues()
        .iter()
        .filter(|i| i.severity == Severity::Error && i.location.path == path)
        .collect()
}

// ── Loading ─────────────────────────────────────────────────────────────────

#[test]
fn bundled_contract_compiles() {
    let schema = bundled();
    let again = Schema::from_config(
        &sifen::config::SifenConfigBuilder::new()
            .schema_path(format!(
                "{}/schemas/siRecepDE_v150.xsd",
                env!("CARGO_MANIFEST_DIR")
            ))
            .build(),
    );
    assert!(again.is_ok());
    assert!(format!("{schema:?}").starts_with("Schema"));
}

#[test]
fn includes_resolve_relative_to_the_contract() {
    let schema = order_schema();
    let result = schema
        .validate(
            r#"<order xmlns="urn:test:order" currency="PYG">
                  <number>001-001-0000001</number>
                  <line><description>Consultoría</description><amount>1500000.00</amount></line>
                </order>"#
                .as_bytes(),
        )
        .unwrap();
    assert_eq!(result, ValidationResult::Valid);
}

#[test]
fn missing_include_is_unavailable() {
    assert!(matches!(
        Schema::load(fixture("broken_include.xsd")),
        Err(SifenError::ContractUnavailable(_))
    ));
    assert!(matches!(
        Schema::load(fixture("does_not_exist.xsd")),
        Err(SifenError::ContractUnavailable(_))
    ));
}

// ── Instance validation ─────────────────────────────────────────────────────

#[test]
fn every_issue_is_reported() {
    let result = order_schema()
        .validate(
            br#"<order xmlns="urn:test:order" currency="EUR">
  <number>1-1-1</number>
  <line><description>a</description><amount>-1</amount></line>
  <line><description>b</description><amount>1.005</amount></line>
</order>"#,
        )
        .unwrap();
    assert!(!result.is_valid());
    let issues = result.issues();
    assert_eq!(issues.len(), 4);

    let currency = errors_at(&result, "/order");
    assert_eq!(currency.len(), 1);
    assert!(currency[0].message.contains("currency"));
    assert_eq!(currency[0].location.line, 1);

    let number = errors_at(&result, "/order/number");
    assert_eq!(number.len(), 1);
    assert_eq!(number[0].location.line, 2);

    let amounts = errors_at(&result, "/order/line/amount");
    assert_eq!(amounts.len(), 2);
    assert_eq!(amounts[0].location.line, 3);
    assert_eq!(amounts[1].location.line, 4);
}

#[test]
fn content_model_is_enforced() {
    let schema = order_schema();

    let missing = schema
        .validate(br#"<order xmlns="urn:test:order" currency="USD"><number>001-001-0000001</number></order>"#)
        .unwrap();
    let incomplete = errors_at(&missing, "/order");
    assert_eq!(incomplete.len(), 1);
    assert!(incomplete[0].message.contains("incomplete"));
    assert!(incomplete[0].message.contains("line"));

    let too_many = schema
        .validate(
            br#"<order xmlns="urn:test:order" currency="USD"><number>001-001-0000001</number>
<line><description>a</description><amount>1</amount></line>
<line><description>b</description><amount>1</amount></line>
<line><description>c</description><amount>1</amount></line>
<line><description>d</description><amount>1</amount></line>
</order>"#,
        )
        .unwrap();
    let extra = errors_at(&too_many, "/order/line");
    assert_eq!(extra.len(), 1);
    assert_eq!(extra[0].location.line, 5);
    assert!(extra[0].message.starts_with("unexpected element"));

    let no_attr = schema
        .validate(br#"<order xmlns="urn:test:order"><number>001-001-0000001</number><line><description>a</description><amount>1</amount></line></order>"#)
        .unwrap();
    assert!(errors_at(&no_attr, "/order")[0].message.contains("required attribute"));
}

#[test]
fn wrong_namespace_is_not_accepted() {
    let result = order_schema()
        .validate(br#"<order currency="PYG"><number>001-001-0000001</number></order>"#)
        .unwrap();
    assert!(!result.is_valid());
}

#[test]
fn malformed_bytes_are_syntax_errors() {
    let err = order_schema()
        .validate(b"<order xmlns=\"urn:test:order\"><number></order>")
        .unwrap_err();
    assert!(matches!(err, SifenError::Syntax { .. }));
}

#[test]
fn violations_convert_to_errors() {
    let result = order_schema()
        .validate(br#"<order xmlns="urn:test:order" currency="XXX"><number>001-001-0000001</number><line><description>a</description><amount>1</amount></line></order>"#)
        .unwrap();
    let err = result.into_result().unwrap_err();
    let SifenError::SchemaViolation(issues) = err else {
        panic!("expected a schema violation");
    };
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].location.path, "/order");
}

// ── Bundled contract ────────────────────────────────────────────────────────

#[test]
fn unsigned_document_is_incomplete() {
    let result = bundled().validate_document(&identified());
    assert!(!result.is_valid());

    let root = errors_at(&result, "/rDE");
    assert_eq!(root.len(), 1, "{:?}", result.issues());
    assert!(root[0].message.contains("Signature"));
    // The encoded content itself conforms.
    assert_eq!(result.issues().len(), 1);
}

#[test]
fn bad_field_values_are_located() {
    let mut doc = identified();
    doc.find_mut("dNumTim").unwrap().set_text("ABC");
    doc.find_mut("cMoneOpe").unwrap().set_text("GUARANI");

    let bytes = doc.to_bytes().unwrap();
    let result = bundled().validate(&bytes).unwrap();
    assert_eq!(errors_at(&result, "/rDE/DE/gTimb/dNumTim").len(), 1);
    assert_eq!(
        errors_at(&result, "/rDE/DE/gDatGralOpe/gOpeCom/cMoneOpe").len(),
        1
    );
}

#[test]
fn identifier_must_be_present() {
    let mut doc = identified();
    doc.find_mut("DE").unwrap().set_attr("Id", "123");
    let result = bundled().validate_document(&doc);
    let de = errors_at(&result, "/rDE/DE");
    assert_eq!(de.len(), 1);
    assert!(de[0].message.contains("Id"));
}
