use serde::{Deserialize, Serialize};

/// Default cap on the annotation text handed to the lot parser (64 KiB).
pub const DEFAULT_MAX_ANNOTATION_LEN: usize = 64 * 1024;

/// What to do with lot records whose product code matches no line item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrphanLotPolicy {
    /// Drop them: there is no line item row to derive from.
    #[default]
    Drop,
    /// Emit one row per lot carrying only header, party and lot fields.
    EmitBareRow,
}

/// Knobs for extraction and reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Annotation text beyond this many bytes is ignored by the lot parser.
    pub max_annotation_len: usize,
    /// Handling of lots without a matching line item.
    pub orphan_lots: OrphanLotPolicy,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_annotation_len: DEFAULT_MAX_ANNOTATION_LEN,
            orphan_lots: OrphanLotPolicy::Drop,
        }
    }
}

/// Builder for [`ExtractOptions`].
///
/// ```
/// use nfe_tabular::core::{ExtractOptionsBuilder, OrphanLotPolicy};
///
/// let options = ExtractOptionsBuilder::new()
///     .max_annotation_len(16 * 1024)
///     .orphan_lots(OrphanLotPolicy::EmitBareRow)
///     .build();
/// assert_eq!(options.max_annotation_len, 16 * 1024);
/// ```
#[derive(Debug, Default)]
pub struct ExtractOptionsBuilder {
    options: ExtractOptions,
}

impl ExtractOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the annotation length cap in bytes.
    pub fn max_annotation_len(mut self, len: usize) -> Self {
        self.options.max_annotation_len = len;
        self
    }

    /// Set the orphan lot policy.
    pub fn orphan_lots(mut self, policy: OrphanLotPolicy) -> Self {
        self.options.orphan_lots = policy;
        self
    }

    pub fn build(self) -> ExtractOptions {
        self.options
    }
}
