//! # sifen
//!
//! Electronic invoices for Paraguay's SIFEN scheme: build the document model,
//! encode it into the strictly ordered `rDE` markup, derive the 44-digit
//! document identifier (CDC), sign it with an enveloped XML-DSig signature,
//! attach the QR verification string and check the result against the XSD
//! contract.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//! Nothing in the crate reads the clock: the caller passes `now`.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use sifen::core::*;
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
//! let totals = invoice.totals();
//! assert_eq!(totals.grand_total, dec!(1650000));
//! assert_eq!(totals.tax_total, dec!(150000));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Document model, builders, shape validation, code tables, configuration |
//! | `encode` | Markup tree, parser, encoder, document identifier |
//! | `sign` | Exclusive C14N, RSA-SHA256 enveloped signature, verification |
//! | `qr` | QR verification string (`dCarQR`) |
//! | `schema` | XSD contract compiler and instance validator |
//! | `all` | Everything, including [`pipeline::Pipeline`] |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "core")]
pub mod config;

#[cfg(feature = "encode")]
pub mod xml;

#[cfg(feature = "encode")]
pub mod encode;

#[cfg(feature = "encode")]
pub mod identifier;

#[cfg(feature = "sign")]
pub mod sign;

#[cfg(feature = "qr")]
pub mod qr;

#[cfg(feature = "schema")]
pub mod schema;

#[cfg(all(feature = "qr", feature = "schema"))]
pub mod pipeline;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
