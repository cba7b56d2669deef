//! Lot annotation parsing.
//!
//! Emitters that do not fill the structured `rastro` element often list lots
//! in the free-text `infCpl` annotation, after any disclaimers:
//!
//! ```text
//! ... -100141432-LOTE: 0052246201-32SAC, 0052246203-8SAC-100141447-LOTE: 0052132134-500SAC
//! ```
//!
//! Each `-<product code>-LOTE:` marker opens a chunk of
//! `<lot>-<quantity><unit>` tuples for that product.
//!
//! ```
//! use nfe_tabular::lote::parse_lots;
//! use rust_decimal::Decimal;
//!
//! let lots = parse_lots("-100141447-LOTE: 0052132134-500SAC, 0052132136-1,300SAC");
//! let queue = lots.get("100141447").unwrap();
//! assert_eq!(queue.len(), 2);
//! assert_eq!(queue[1].quantity, Decimal::from(1300));
//! ```

mod quantity;

use regex::Regex;
use std::collections::VecDeque;
use std::sync::LazyLock;

use crate::core::{ExtractOptions, LotRecord};

pub use quantity::normalize_quantity;

/// `-<digits>-LOTE:` opens the lot list of one product code.
static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-([0-9]+)-LOTE:").unwrap());

/// `<lot digits>-<quantity token><2-3 uppercase unit letters>`.
static LOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)-([0-9,.]+)([A-Z]{2,3})").unwrap());

/// Lots of one product code, earliest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotQueue {
    pub product_code: String,
    pub lots: VecDeque<LotRecord>,
}

/// Product code to lot queue, in order of first appearance in the annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LotTable {
    queues: Vec<LotQueue>,
}

impl LotTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no product code was found at all.
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Number of product codes.
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    /// Lots still queued across all product codes.
    pub fn remaining(&self) -> usize {
        self.queues.iter().map(|q| q.lots.len()).sum()
    }

    pub fn get(&self, product_code: &str) -> Option<&VecDeque<LotRecord>> {
        self.queues
            .iter()
            .find(|q| q.product_code == product_code)
            .map(|q| &q.lots)
    }

    pub fn contains(&self, product_code: &str) -> bool {
        self.get(product_code).is_some()
    }

    /// Queue for `product_code`, created empty at the end if missing.
    fn queue_mut(&mut self, product_code: &str) -> &mut VecDeque<LotRecord> {
        let pos = match self
            .queues
            .iter()
            .position(|q| q.product_code == product_code)
        {
            Some(pos) => pos,
            None => {
                self.queues.push(LotQueue {
                    product_code: product_code.to_string(),
                    lots: VecDeque::new(),
                });
                self.queues.len() - 1
            }
        };
        &mut self.queues[pos].lots
    }

    /// Append a lot to the back of its product code's queue.
    pub fn push(&mut self, lot: LotRecord) {
        let code = lot.product_code.clone();
        self.queue_mut(&code).push_back(lot);
    }

    /// Remove and return the earliest remaining lot for `product_code`.
    pub fn pop_front(&mut self, product_code: &str) -> Option<LotRecord> {
        self.queues
            .iter_mut()
            .find(|q| q.product_code == product_code)
            .and_then(|q| q.lots.pop_front())
    }

    /// Queues in order of first appearance.
    pub fn iter(&self) -> impl Iterator<Item = &LotQueue> {
        self.queues.iter()
    }
}

impl IntoIterator for LotTable {
    type Item = LotQueue;
    type IntoIter = std::vec::IntoIter<LotQueue>;

    fn into_iter(self) -> Self::IntoIter {
        self.queues.into_iter()
    }
}

/// Parse lot records out of an annotation with default options.
pub fn parse_lots(text: &str) -> LotTable {
    parse_lots_with(text, &ExtractOptions::default())
}

/// Parse lot records out of an annotation.
///
/// Text before the first `-<digits>-LOTE:` marker is ignored. No marker
/// yields an empty table, which is not an error.
pub fn parse_lots_with(text: &str, options: &ExtractOptions) -> LotTable {
    let text = cap_len(text, options.max_annotation_len);
    let mut table = LotTable::new();

    let markers: Vec<_> = MARKER_RE.captures_iter(text).collect();
    if markers.is_empty() {
        tracing::trace!("no lot marker in annotation");
        return table;
    }

    for (i, caps) in markers.iter().enumerate() {
        let (Some(marker), Some(code)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = markers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |m| m.start());
        let body = text[marker.end()..end].trim();
        if body.is_empty() {
            continue;
        }

        let code = code.as_str();
        let queue = table.queue_mut(code);
        for lot in LOT_RE.captures_iter(body) {
            queue.push_back(LotRecord::new(
                code,
                &lot[1],
                normalize_quantity(&lot[2]),
                &lot[3],
            ));
        }
    }

    table
}

/// Longest prefix of `text` within `max` bytes that ends on a char boundary.
fn cap_len(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    tracing::warn!(
        len = text.len(),
        max,
        "annotation exceeds length cap, truncating"
    );
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ExtractOptionsBuilder;
    use rust_decimal_macros::dec;

    #[test]
    fn no_marker_is_empty() {
        let lots = parse_lots("Produto produzido a partir de milho transgenico");
        assert!(lots.is_empty());
        assert_eq!(lots.remaining(), 0);
    }

    #[test]
    fn chunk_without_tuples_keeps_code() {
        let lots = parse_lots("-123-LOTE: sem lote informado");
        assert!(lots.contains("123"));
        assert_eq!(lots.remaining(), 0);
    }

    #[test]
    fn empty_chunk_is_skipped() {
        let lots = parse_lots("-123-LOTE:   -456-LOTE: 1-2UN");
        assert!(!lots.contains("123"));
        assert_eq!(lots.get("456").map(|q| q.len()), Some(1));
    }

    #[test]
    fn repeated_code_appends() {
        let lots = parse_lots("-7-LOTE: 1-2UN-8-LOTE: 3-4KG-7-LOTE: 5-6UN");
        let codes: Vec<_> = lots.iter().map(|q| q.product_code.as_str()).collect();
        assert_eq!(codes, ["7", "8"]);
        let seven: Vec<_> = lots
            .get("7")
            .unwrap()
            .iter()
            .map(|l| l.lot_number.as_str())
            .collect();
        assert_eq!(seven, ["1", "5"]);
    }

    #[test]
    fn pop_front_consumes_in_order() {
        let mut lots = parse_lots("-7-LOTE: 1-2UN, 3-4UN");
        assert_eq!(lots.pop_front("7").unwrap().quantity, dec!(2));
        assert_eq!(lots.pop_front("7").unwrap().quantity, dec!(4));
        assert!(lots.pop_front("7").is_none());
        assert!(lots.pop_front("8").is_none());
    }

    #[test]
    fn cap_truncates_on_char_boundary() {
        assert_eq!(cap_len("ação", 2), "a");
        assert_eq!(cap_len("ação", 3), "aç");
        assert_eq!(cap_len("abc", 10), "abc");
    }

    #[test]
    fn lots_beyond_cap_are_ignored() {
        let options = ExtractOptionsBuilder::new().max_annotation_len(20).build();
        let lots = parse_lots_with("-7-LOTE: 1-2UN, 3-4UN, 5-6UN", &options);
        assert_eq!(lots.get("7").map(|q| q.len()), Some(1));
    }
}
