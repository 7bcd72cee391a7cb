//! Property-based tests for amounts, numbering and encoding.
//!
//! Run with: `cargo test --features all --test proptest_tests`

#![cfg(feature = "core")]

use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sifen::core::*;

fn issued_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 10)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

fn issuer() -> Issuer {
    IssuerBuilder::new(
        "80012345",
        "7",
        "Tecnología S.A.",
        AddressBuilder::new("Av. Mcal. López", "1234", "1", "1").build(),
    )
    .phone("021555000")
    .email("ventas@tecnologia.com.py")
    .activity("62010")
    .build()
}

fn build(lines: Vec<LineItem>) -> Invoice {
    let mut builder = InvoiceBuilder::new("001-001-0000001", issued_at())
        .security_code("123456789")
        .stamp("12345678", "2025-01-01")
        .issuer(issuer())
        .recipient(RecipientBuilder::taxpayer("80054321", "3", "Cliente S.R.L.").build());
    for line in lines {
        builder = builder.add_line(line);
    }
    builder.build().unwrap()
}

// ── Strategies ──────────────────────────────────────────────────────────────

/// 0.0001 to 999,999.9999 with up to four decimals.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000_000i64).prop_map(|raw| Decimal::new(raw, 4))
}

/// Whole-guaraní unit price (1 to 50,000,000).
fn arb_price() -> impl Strategy<Value = Decimal> {
    (1i64..=50_000_000i64).prop_map(Decimal::from)
}

fn arb_quantity() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        (1u32..=100u32).prop_map(Decimal::from),
        (1i64..=100_000i64).prop_map(|raw| Decimal::new(raw, 3)),
    ]
}

fn arb_line() -> impl Strategy<Value = LineItem> {
    (arb_quantity(), arb_price(), 0u8..3).prop_map(|(qty, price, kind)| {
        let line = LineItemBuilder::new("ITEM", "Artículo", qty, price);
        match kind {
            0 => line.exempt().build(),
            1 => line.tax_rate(dec!(5)).build(),
            _ => line.build(),
        }
    })
}

fn arb_lines() -> impl Strategy<Value = Vec<LineItem>> {
    prop::collection::vec(arb_line(), 1..=8)
}

// ── Properties ──────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn quantize_is_idempotent(value in arb_amount(), dp in 0u32..=4) {
        let once = quantize(value, dp);
        prop_assert_eq!(quantize(once, dp), once);
        prop_assert!(once.scale() <= dp);
    }

    #[test]
    fn quantize_rounds_half_away_from_zero(units in 0i64..1_000_000) {
        let half = Decimal::new(units * 10 + 5, 1);
        prop_assert_eq!(quantize(half, 0), Decimal::from(units + 1));
        prop_assert_eq!(quantize(-half, 0), -Decimal::from(units + 1));
    }

    #[test]
    fn padding_keeps_value_and_width(value in 0u64..10_000_000u64) {
        let padded = pad_digits(&value.to_string(), 7).unwrap();
        prop_assert_eq!(padded.len(), 7);
        prop_assert_eq!(padded.parse::<u64>().unwrap(), value);
    }

    #[test]
    fn padding_rejects_overflow(value in 10_000_000u64..u64::MAX) {
        prop_assert!(pad_digits(&value.to_string(), 7).is_err());
    }

    #[test]
    fn document_number_normalizes(est in 0u32..1000, point in 0u32..1000, seq in 0u32..10_000_000) {
        let number = DocumentNumber::parse(&format!("{est}-{point}-{seq}")).unwrap();
        prop_assert_eq!(number.to_string(), format!("{est:03}-{point:03}-{seq:07}"));
        let again = DocumentNumber::parse(&number.to_string()).unwrap();
        prop_assert_eq!(again, number);
    }

    #[test]
    fn suffix_sequence_is_gapless(start in 1u64..1_000_000, count in 1usize..20) {
        let mut sequence = SuffixSequence::starting_at(start);
        for offset in 0..count as u64 {
            let suffix = sequence.next_suffix().unwrap();
            prop_assert_eq!(suffix.len(), SUFFIX_WIDTH);
            prop_assert_eq!(suffix.parse::<u64>().unwrap(), start + offset);
        }
    }

    #[test]
    fn totals_are_sum_of_lines(lines in arb_lines()) {
        let invoice = build(lines);
        let totals = invoice.totals();

        let line_total: Decimal = invoice.lines.iter().map(LineItem::total).sum();
        let line_tax: Decimal = invoice.lines.iter().map(LineItem::tax_amount).sum();
        prop_assert_eq!(totals.grand_total, line_total);
        prop_assert_eq!(totals.tax_total, line_tax);
        prop_assert_eq!(totals.tax_total, totals.tax_5 + totals.tax_10);
        prop_assert!(totals.grand_total >= totals.tax_total);
        prop_assert!(totals.grand_total.scale() <= 2);
    }

    #[test]
    fn ten_percent_tax_is_a_tenth(qty in 1u32..=100, price in arb_price()) {
        let line = LineItemBuilder::new("ITEM", "Artículo", Decimal::from(qty), price).build();
        prop_assert_eq!(line.tax_amount(), quantize(line.subtotal() / dec!(10), 2));
    }
}

#[cfg(feature = "encode")]
mod encoded {
    use super::*;
    use sifen::encode::encode;
    use sifen::encode::format::money;
    use sifen::identifier::{self, IDENTIFIER_LEN};

    proptest! {
        #[test]
        fn encoding_is_deterministic(lines in arb_lines(), minute in 0u32..60) {
            let invoice = build(lines);
            let now = issued_at().date().and_hms_opt(10, minute, 0).unwrap();
            let a = encode(&invoice, now).unwrap().to_bytes().unwrap();
            let b = encode(&invoice, now).unwrap().to_bytes().unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn encoded_totals_match_model(lines in arb_lines()) {
            let invoice = build(lines);
            let totals = invoice.totals();
            let doc = encode(&invoice, issued_at()).unwrap();
            prop_assert_eq!(
                doc.find_text("dTotGralOpe"),
                Some(money(totals.grand_total))
            );
            prop_assert_eq!(
                doc.find_text("dTotIVA"),
                Some(money(totals.tax_total))
            );
        }

        #[test]
        fn identifier_shape(seq in 1u32..10_000_000, suffix in 1u64..100_000_000_000u64) {
            let invoice = InvoiceBuilder::new(format!("001-001-{seq}"), issued_at())
                .security_code("1")
                .stamp("12345678", "2025-01-01")
                .issuer(issuer())
                .recipient(RecipientBuilder::non_taxpayer(1, "1234567", "Juan Pérez").build())
                .add_line(LineItemBuilder::new("ITEM", "Artículo", dec!(1), dec!(1000)).build())
                .build()
                .unwrap();
            let mut doc = encode(&invoice, issued_at()).unwrap();
            let id = identifier::assign(&mut doc, &suffix.to_string()).unwrap();

            prop_assert_eq!(id.as_str().len(), IDENTIFIER_LEN);
            prop_assert!(id.as_str().bytes().all(|b| b.is_ascii_digit()));
            let sequence = format!("{seq:07}");
            prop_assert_eq!(&id.as_str()[18..25], sequence.as_str());
            prop_assert_eq!(id.as_str()[33..].parse::<u64>().unwrap(), suffix);
            prop_assert!(id.check_digit() <= 9);
        }
    }
}
