//! Document model → ordered markup tree.
//!
//! [`encode`] validates the invoice shape, then assembles every group in
//! schema order. It is deterministic for a given invoice and `now`: nothing
//! here reads the clock. The result carries no `Id` yet; see
//! [`crate::identifier::assign`].
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use sifen::core::*;
//! use sifen::encode::encode;
//!
//! let at = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap().and_hms_opt(9, 30, 0).unwrap();
//! let invoice = InvoiceBuilder::new("001-001-0000001", at)
//!     .security_code("123456789")
//!     .stamp("12345678", "2025-01-01")
//!     .issuer(IssuerBuilder::new("80012345", "7", "Tecnología S.A.",
//!             AddressBuilder::new("Av. Mcal. López", "1234", "1", "1").build())
//!         .phone("021555000")
//!         .email("ventas@tecnologia.com.py")
//!         .activity("62010")
//!         .build())
//!     .recipient(RecipientBuilder::taxpayer("80054321", "3", "Cliente S.R.L.").build())
//!     .add_line(LineItemBuilder::new("SRV-01", "Consultoría", dec!(1), dec!(1500000)).build())
//!     .build()
//!     .unwrap();
//!
//! let doc = encode(&invoice, at).unwrap();
//! assert_eq!(doc.find_text("dTotGralOpe").as_deref(), Some("1650000.00"));
//! ```

mod details;
pub mod format;
mod parties;
pub mod predicates;
mod totals;

use chrono::NaiveDateTime;

use crate::core::codes;
use crate::core::{Invoice, SifenError, describe_currency, validate_invoice};
use crate::xml::{Document, Element, SIFEN_NS, XSI_NS};

use format::{described, trimmed4, truncate, zero_pad};

/// dVerFor written by [`encode`].
pub const FORMAT_VERSION: u16 = 150;

/// iTiDE of an electronic invoice.
pub const INVOICE_DOCUMENT_TYPE: u8 = 1;

const SCHEMA_LOCATION: &str = "http://ekuatia.set.gov.py/sifen/xsd siRecepDE_v150.xsd";

pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Encode an invoice with the current format version.
pub fn encode(invoice: &Invoice, now: NaiveDateTime) -> Result<Document, SifenError> {
    encode_with_version(invoice, now, FORMAT_VERSION)
}

/// Encode an invoice, writing `version` as dVerFor.
///
/// `now` becomes dFecFirma. Shape violations fail with
/// [`SifenError::Validation`]; bad dates or widths with [`SifenError::Format`].
pub fn encode_with_version(
    invoice: &Invoice,
    now: NaiveDateTime,
    version: u16,
) -> Result<Document, SifenError> {
    let errors = validate_invoice(invoice);
    if !errors.is_empty() {
        return Err(SifenError::Validation(errors));
    }

    tracing::debug!(
        number = %invoice.number,
        items = invoice.lines.len(),
        "encoding document"
    );

    let totals = invoice.totals();

    let mut de = Element::new("DE");
    // Replaced by the identifier check digit on assign.
    de.push_leaf("dDVId", "0");
    de.push_leaf("dFecFirma", now.format(DATETIME_FORMAT).to_string());
    de.push_leaf("dSisFact", "1");
    de.push(operation_group(invoice)?);
    de.push(stamp_group(invoice)?);

    let mut general = Element::new("gDatGralOpe");
    general.push_leaf(
        "dFeEmiDE",
        invoice.issued_at.format(DATETIME_FORMAT).to_string(),
    );
    general.push(commercial_group(invoice));
    general.push(parties::issuer_group(&invoice.issuer));
    general.push(parties::recipient_group(&invoice.recipient));
    de.push(general);

    de.push(details::document_type_group(invoice)?);
    de.push(totals::totals_group(&totals));
    if let Some(cargo) = predicates::general_cargo(invoice) {
        de.push(totals::cargo_group(cargo));
    }

    let mut root = Element::new("rDE")
        .with_attr("xmlns", SIFEN_NS)
        .with_attr("xmlns:xsi", XSI_NS)
        .with_attr("xsi:schemaLocation", SCHEMA_LOCATION);
    root.push_leaf("dVerFor", version.to_string());
    root.push(de);

    tracing::debug!(number = %invoice.number, "document encoded");
    Ok(Document::new(root))
}

/// gOpeDE.
fn operation_group(invoice: &Invoice) -> Result<Element, SifenError> {
    let mut group = Element::new("gOpeDE");
    group.push_leaf("iTipEmi", invoice.emission_type.to_string());
    group.push_leaf(
        "dDesTipEmi",
        described(
            "dDesTipEmi",
            &invoice.emission_type.to_string(),
            codes::describe_emission_type(invoice.emission_type),
        ),
    );
    group.push_leaf("dCodSeg", zero_pad("dCodSeg", &invoice.security_code, 9)?);
    if let Some(info) = &invoice.issuer_info {
        group.push_leaf("dInfoEmi", truncate("dInfoEmi", info, 3000));
    }
    if let Some(info) = &invoice.fiscal_info {
        group.push_leaf("dInfoFisc", truncate("dInfoFisc", info, 3000));
    }
    Ok(group)
}

/// gTimb.
fn stamp_group(invoice: &Invoice) -> Result<Element, SifenError> {
    let mut group = Element::new("gTimb");
    group.push_leaf("iTiDE", INVOICE_DOCUMENT_TYPE.to_string());
    group.push_leaf(
        "dDesTiDE",
        codes::describe_document_type(INVOICE_DOCUMENT_TYPE),
    );
    group.push_leaf("dNumTim", zero_pad("dNumTim", &invoice.stamp.number, 8)?);
    group.push_leaf("dEst", invoice.number.establishment());
    group.push_leaf("dPunExp", invoice.number.point());
    group.push_leaf("dNumDoc", invoice.number.sequence());
    if let Some(series) = &invoice.stamp.series {
        group.push_leaf("dSerieNum", series.as_str());
    }
    group.push_leaf("dFeIniT", format::date(&invoice.stamp.valid_from)?);
    Ok(group)
}

/// gOpeCom.
fn commercial_group(invoice: &Invoice) -> Element {
    let mut group = Element::new("gOpeCom");
    group.push_leaf("iTipTra", invoice.transaction_type.to_string());
    group.push_leaf(
        "dDesTipTra",
        codes::describe_transaction_type(invoice.transaction_type),
    );
    group.push_leaf("iTImp", invoice.tax_affected.to_string());
    group.push_leaf("dDesTImp", codes::describe_tax_affected(invoice.tax_affected));
    group.push_leaf("cMoneOpe", invoice.currency.as_str());
    group.push_leaf(
        "dDesMoneOpe",
        described(
            "dDesMoneOpe",
            &invoice.currency,
            describe_currency(&invoice.currency),
        ),
    );
    if let Some(exchange) = &invoice.exchange_rate {
        group.push_leaf("dCondTiCam", exchange.condition.to_string());
        group.push_leaf("dTiCam", trimmed4(exchange.rate));
    }
    if let Some(advance) = invoice.advance_condition {
        group.push_leaf("iCondAnt", advance.to_string());
        group.push_leaf("dDesCondAnt", codes::describe_advance_condition(advance));
    }
    group
}
