use chrono::{NaiveDate, NaiveDateTime};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rust_decimal_macros::dec;

use sifen::config::SifenConfigBuilder;
use sifen::core::*;
use sifen::encode::encode;
use sifen::identifier;
use sifen::pipeline::Pipeline;
use sifen::qr;
use sifen::schema::Schema;
use sifen::sign::Signer;
use sifen::xml::Document;

const SECRET: &str = "ABCD0000000000000000000000000000";

fn path(relative: &str) -> String {
    format!("{}/{relative}", env!("CARGO_MANIFEST_DIR"))
}

fn issued_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 10)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

fn build_invoice(lines: usize) -> Invoice {
    let mut builder = InvoiceBuilder::new("001-001-0000001", issued_at())
        .security_code("123456789")
        .stamp("12345678", "2025-01-01")
        .issuer(
            IssuerBuilder::new(
                "80012345",
                "7",
                "Benchmark S.A.",
                AddressBuilder::new("Av. España", "1000", "1", "1").build(),
            )
            .phone("021555000")
            .email("bench@example.com.py")
            .activity("62010")
            .build(),
        )
        .recipient(RecipientBuilder::taxpayer("80054321", "3", "Cliente S.R.L.").build());

    for i in 1..=lines {
        builder = builder.add_line(
            LineItemBuilder::new(
                format!("SKU-{i}"),
                format!("Artículo {i}"),
                dec!(3),
                dec!(125000),
            )
            .build(),
        );
    }
    builder.build().unwrap()
}

fn signer() -> Signer {
    Signer::from_pem_files(path("tests/fixtures/key.pem"), path("tests/fixtures/cert.pem")).unwrap()
}

fn signed(invoice: &Invoice, signer: &Signer) -> Document {
    let mut doc = encode(invoice, issued_at()).unwrap();
    identifier::assign(&mut doc, "00000000001").unwrap();
    signer.sign(&mut doc).unwrap();
    doc
}

fn bench_encode(c: &mut Criterion) {
    let invoice = build_invoice(10);
    c.bench_function("encode_10_lines", |b| {
        b.iter(|| black_box(encode(black_box(&invoice), issued_at())));
    });
}

fn bench_sign(c: &mut Criterion) {
    let invoice = build_invoice(10);
    let signer = signer();
    let mut doc = encode(&invoice, issued_at()).unwrap();
    identifier::assign(&mut doc, "00000000001").unwrap();
    c.bench_function("sign_10_lines", |b| {
        b.iter(|| {
            let mut doc = doc.clone();
            black_box(signer.sign(&mut doc))
        });
    });
}

fn bench_verification_code(c: &mut Criterion) {
    let doc = signed(&build_invoice(10), &signer());
    c.bench_function("verification_code", |b| {
        b.iter(|| black_box(qr::derive_code(black_box(&doc), "0001", SECRET)));
    });
}

fn bench_schema_validate(c: &mut Criterion) {
    let schema = Schema::load(path("schemas/siRecepDE_v150.xsd")).unwrap();
    let mut doc = signed(&build_invoice(10), &signer());
    let code = qr::derive_code(&doc, "0001", SECRET).unwrap();
    qr::attach(&mut doc, &code).unwrap();
    let bytes = doc.to_bytes().unwrap();
    c.bench_function("schema_validate_10_lines", |b| {
        b.iter(|| black_box(schema.validate(black_box(&bytes))));
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let config = SifenConfigBuilder::new()
        .schema_path(path("schemas/siRecepDE_v150.xsd"))
        .key_path(path("tests/fixtures/key.pem"))
        .certificate_path(path("tests/fixtures/cert.pem"))
        .csc("0001", SECRET)
        .build();
    let pipeline = Pipeline::from_config(config).unwrap();
    let invoice = build_invoice(10);
    c.bench_function("pipeline_10_lines", |b| {
        b.iter(|| black_box(pipeline.process(black_box(&invoice), issued_at())));
    });
}

fn bench_encode_999_lines(c: &mut Criterion) {
    let invoice = build_invoice(999);
    c.bench_function("encode_999_lines", |b| {
        b.iter(|| black_box(encode(black_box(&invoice), issued_at())));
    });
}

criterion_group!(
    benches,
    bench_encode,
    bench_sign,
    bench_verification_code,
    bench_schema_validate,
    bench_pipeline,
    bench_encode_999_lines,
);
criterion_main!(benches);
