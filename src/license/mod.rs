//! License identity, normalization and category lookup.
//!
//! - [`catalog`] — normalized license id → [`LicenseRecord`] with alias resolution
//!   and `AND`-conjunction reduction.
//! - [`expression`] — raw license strings parsed into the single/alternatives
//!   sum type [`LicenseExpr`].

pub mod catalog;
pub mod expression;

pub use catalog::{LicenseCatalog, LicenseRecord, Limitation, Obligation, Permission, UNKNOWN_LICENSE};
pub use expression::LicenseExpr;
