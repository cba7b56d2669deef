use crate::core::{ExtractOptions, Invoice, OrphanLotPolicy};
use crate::lote::LotTable;

use super::row::Row;

/// Pair line items with lots, one row per pairing.
///
/// Each line item takes the earliest lot still queued for its product code.
/// Lots left over after every item has been visited become extra rows cloned
/// from the first row of that product code, with quantity and values zeroed
/// so they do not inflate invoice totals.
pub fn reconcile(invoice: &Invoice, mut lots: LotTable, options: &ExtractOptions) -> Vec<Row> {
    let base = Row::from_header(invoice);
    let mut rows: Vec<Row> = Vec::with_capacity(invoice.items.len() + lots.remaining());

    for item in &invoice.items {
        let mut row = base.clone();
        row.set_item(item);
        if let Some(lot) = lots.pop_front(&item.product_code) {
            row.set_lot(&lot);
        }
        rows.push(row);
    }

    let item_rows = rows.len();
    for queue in lots {
        if queue.lots.is_empty() {
            continue;
        }
        let template = rows[..item_rows]
            .iter()
            .find(|r| r.product_code == queue.product_code)
            .cloned();

        match (template, options.orphan_lots) {
            (Some(template), _) => {
                let extra_index = template.item_index.to_extra();
                for lot in &queue.lots {
                    let mut row = template.clone();
                    row.set_lot(lot);
                    row.zero_commercial_values();
                    row.item_index = extra_index.clone();
                    rows.push(row);
                }
            }
            (None, OrphanLotPolicy::EmitBareRow) => {
                for lot in &queue.lots {
                    let mut row = base.clone();
                    row.set_lot(lot);
                    rows.push(row);
                }
            }
            (None, OrphanLotPolicy::Drop) => {
                tracing::debug!(
                    product_code = %queue.product_code,
                    lots = queue.lots.len(),
                    "lots without a matching line item dropped"
                );
            }
        }
    }

    rows
}
