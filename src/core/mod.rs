//! Core document model, validation, numbering and code tables.
//!
//! This module provides the foundational types for Paraguayan electronic
//! invoices (SIFEN format version 150). It has no optional dependencies.

mod builder;
pub mod codes;
mod countries;
mod currencies;
mod error;
mod numbering;
mod types;
pub mod units;
mod validation;

pub use builder::*;
pub use countries::{describe_country, is_known_country_code};
pub use currencies::{describe_currency, is_known_currency_code};
pub use error::*;
pub use numbering::*;
pub use types::*;
pub use units::is_known_unit_code;
pub use validation::*;
