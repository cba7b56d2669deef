//! Core NFe types, errors, options and decimal helpers.
//!
//! Everything here is format-agnostic: the XML reader fills these types and
//! the table assembler consumes them.

pub mod decimal;
mod error;
mod options;
pub mod tax;
mod types;

pub use error::*;
pub use options::*;
pub use tax::{
    Contribution, ContributionKind, ContributionRegime, Icms, IcmsRegime, Ipi, IpiRegime,
    ItemTaxes,
};
pub use types::*;
