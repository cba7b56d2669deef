//! NFe XML reading.
//!
//! Reads NFe 4.00 documents, either a bare `NFe` root or the `nfeProc`
//! wrapper returned by SEFAZ after authorization, into [`Invoice`].
//!
//! # Example
//!
//! ```
//! use nfe_tabular::nfe;
//!
//! let xml = r#"<nfeProc xmlns="http://www.portalfiscal.inf.br/nfe" versao="4.00">
//!   <NFe><infNFe><ide><nNF>42</nNF></ide></infNFe></NFe>
//! </nfeProc>"#;
//! let invoice = nfe::parse_invoice(xml).unwrap();
//! assert_eq!(invoice.header.number, "42");
//! assert!(invoice.items.is_empty());
//! ```
//!
//! [`Invoice`]: crate::core::Invoice

mod reader;
pub mod taxes;

pub use reader::parse_invoice;
pub use taxes::{TaxBlock, resolve_taxes};

/// NFe portal namespace URI. Elements outside it are ignored.
pub const NFE_NAMESPACE: &str = "http://www.portalfiscal.inf.br/nfe";

/// Root element of a bare invoice.
pub const INVOICE_ROOT: &str = "NFe";

/// Wrapper root carrying the invoice plus its authorization protocol.
pub const PROCESSED_ROOT: &str = "nfeProc";

/// The mandatory information block under the invoice root.
pub const INFO_BLOCK: &str = "infNFe";
