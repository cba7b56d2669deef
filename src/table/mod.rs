//! Flat rows out of NFe documents.
//!
//! [`extract_rows`] runs the whole pipeline for one document: XML reader,
//! lot parser over `infCpl`, then [`reconcile`]. [`extract_batch`] does the
//! same for many documents and reports each outcome on its own.

mod reconcile;
mod row;

pub use reconcile::reconcile;
pub use row::{Cell, EXTRA_SUFFIX, ItemIndex, Row};

use crate::core::{ExtractOptions, NfeError};
use crate::{lote, nfe};

/// Rows for one NFe document.
pub fn extract_rows(xml: &str, options: &ExtractOptions) -> Result<Vec<Row>, NfeError> {
    let invoice = nfe::parse_invoice(xml)?;
    let lots = lote::parse_lots_with(&invoice.header.additional_info, options);
    Ok(reconcile(&invoice, lots, options))
}

/// Result of one document in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentOutcome {
    /// Caller-supplied label, usually a file name.
    pub source: String,
    pub result: Result<Vec<Row>, NfeError>,
}

impl DocumentOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Rows of a successful document, empty on failure.
    pub fn rows(&self) -> &[Row] {
        match &self.result {
            Ok(rows) => rows,
            Err(_) => &[],
        }
    }

    pub fn error(&self) -> Option<&NfeError> {
        self.result.as_ref().err()
    }
}

/// Extract every document; a failing document never stops the others.
///
/// ```
/// use nfe_tabular::core::ExtractOptions;
/// use nfe_tabular::table::extract_batch;
///
/// let good = r#"<NFe xmlns="http://www.portalfiscal.inf.br/nfe"><infNFe>
///   <det nItem="1"><prod><cProd>1</cProd></prod></det>
/// </infNFe></NFe>"#;
/// let docs = [("a.xml", "<NFe><infNFe>"), ("b.xml", good)];
/// let outcomes = extract_batch(docs, &ExtractOptions::default());
/// assert!(!outcomes[0].is_ok());
/// assert_eq!(outcomes[1].rows().len(), 1);
/// ```
pub fn extract_batch<I, S, X>(documents: I, options: &ExtractOptions) -> Vec<DocumentOutcome>
where
    I: IntoIterator<Item = (S, X)>,
    S: Into<String>,
    X: AsRef<str>,
{
    documents
        .into_iter()
        .map(|(source, xml)| {
            let source = source.into();
            let result = extract_rows(xml.as_ref(), options);
            match &result {
                Ok(rows) => {
                    tracing::debug!(source = %source, rows = rows.len(), "document extracted")
                }
                Err(e) => tracing::warn!(source = %source, error = %e, "document failed"),
            }
            DocumentOutcome { source, result }
        })
        .collect()
}

/// Rows of all successful documents in a batch, in batch order.
pub fn successful_rows(outcomes: &[DocumentOutcome]) -> Vec<Row> {
    outcomes.iter().flat_map(|o| o.rows().iter().cloned()).collect()
}
