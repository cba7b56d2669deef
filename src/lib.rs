//! # nfe-tabular
//!
//! Turns NFe (Brazilian electronic invoice) XML documents into flat rows, one
//! per (product, lot) pairing.
//!
//! Lot numbers on many NFe are not in the structured `rastro` element but in
//! the free-text `infAdic/infCpl` annotation, e.g.
//! `-100141432-LOTE: 0052246201-32SAC, 0052246203-8SAC`. This crate parses the
//! invoice, recovers those lots, and reconciles them with the line items.
//!
//! All monetary values and quantities use [`rust_decimal::Decimal`].
//!
//! ## Quick Start
//!
//! ```rust
//! use nfe_tabular::core::ExtractOptions;
//! use nfe_tabular::table::extract_rows;
//!
//! let xml = r#"<NFe xmlns="http://www.portalfiscal.inf.br/nfe">
//!   <infNFe>
//!     <ide><nNF>123</nNF><serie>1</serie></ide>
//!     <det nItem="1">
//!       <prod><cProd>100141432</cProd><qCom>40</qCom><vProd>800.00</vProd></prod>
//!     </det>
//!     <infAdic><infCpl>-100141432-LOTE: 0052246201-32SAC, 0052246203-8SAC</infCpl></infAdic>
//!   </infNFe>
//! </NFe>"#;
//!
//! let rows = extract_rows(xml, &ExtractOptions::default()).unwrap();
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[0].lot_number, "0052246201");
//! assert_eq!(rows[1].item_index.to_string(), "1_lote_extra");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Invoice types, tax regimes, options, errors |
//! | `nfe` | NFe XML reader and tax sub-element resolver |
//! | `lote` | Lot annotation parser |
//! | `table` (default) | Reconciliation and flat rows |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "nfe")]
pub mod nfe;

#[cfg(feature = "lote")]
pub mod lote;

#[cfg(feature = "table")]
pub mod table;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
