//! Tax sub-element resolution.
//!
//! The reader records every `imposto/<group>/<variant>` block it meets as a
//! [`TaxBlock`]. [`resolve_taxes`] then probes the known variants of each
//! group in their fixed order and binds to the first one present.

use crate::core::decimal::decimal_or_zero;
use crate::core::{
    Contribution, ContributionKind, ContributionRegime, Icms, IcmsRegime, Ipi, IpiRegime,
    ItemTaxes,
};

/// One regime block, e.g. `ICMS/ICMS40`, with its leaf fields as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxBlock {
    /// Group element (`ICMS`, `IPI`, `PIS`, `COFINS`).
    pub group: String,
    /// Regime element (`ICMS40`, `IPINT`, ...).
    pub variant: String,
    /// Leaf fields in document order.
    pub fields: Vec<(String, String)>,
}

impl TaxBlock {
    pub fn new(group: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            variant: variant.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Text of the first field named `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Text of the first of `names` that is present, or `""`.
    fn first_of(&self, names: &[&str]) -> &str {
        names.iter().find_map(|n| self.get(n)).unwrap_or("")
    }

    fn text(&self, name: &str) -> String {
        self.get(name).unwrap_or("").to_string()
    }
}

/// Resolve the four tax groups of one line item.
pub fn resolve_taxes(blocks: &[TaxBlock]) -> ItemTaxes {
    for block in blocks {
        if !is_known(block) {
            tracing::trace!(
                group = %block.group,
                variant = %block.variant,
                "ignoring unknown tax regime"
            );
        }
    }
    ItemTaxes {
        icms: resolve_icms(blocks),
        ipi: resolve_ipi(blocks),
        pis: resolve_contribution(blocks, ContributionKind::Pis),
        cofins: resolve_contribution(blocks, ContributionKind::Cofins),
    }
}

fn is_known(block: &TaxBlock) -> bool {
    match block.group.as_str() {
        "ICMS" => IcmsRegime::from_tag(&block.variant).is_some(),
        "IPI" => IpiRegime::from_tag(&block.variant).is_some(),
        "PIS" => ContributionRegime::from_tag(ContributionKind::Pis, &block.variant).is_some(),
        "COFINS" => {
            ContributionRegime::from_tag(ContributionKind::Cofins, &block.variant).is_some()
        }
        _ => false,
    }
}

/// First block of `group` whose variant matches a candidate, in candidate order.
fn probe<'a, R: Copy>(
    blocks: &'a [TaxBlock],
    group: &str,
    candidates: impl IntoIterator<Item = (R, &'static str)>,
) -> Option<(R, &'a TaxBlock)> {
    candidates.into_iter().find_map(|(regime, tag)| {
        blocks
            .iter()
            .find(|b| b.group == group && b.variant == tag)
            .map(|b| (regime, b))
    })
}

fn resolve_icms(blocks: &[TaxBlock]) -> Icms {
    let Some((regime, b)) = probe(blocks, "ICMS", IcmsRegime::ALL.map(|r| (r, r.tag()))) else {
        return Icms::default();
    };
    Icms {
        regime: Some(regime),
        origin: b.text("orig"),
        cst: b.first_of(&["CST", "CSOSN"]).to_string(),
        base: decimal_or_zero("vBC", b.first_of(&["vBC"])),
        rate: decimal_or_zero("pICMS", b.first_of(&["pICMS"])),
        value: decimal_or_zero("vICMS", b.first_of(&["vICMS", "vICMSMono"])),
        deducted: decimal_or_zero("vICMSDeson", b.first_of(&["vICMSDeson"])),
        deduction_reason: b.text("motDesICMS"),
    }
}

fn resolve_ipi(blocks: &[TaxBlock]) -> Ipi {
    let Some((regime, b)) = probe(blocks, "IPI", IpiRegime::ALL.map(|r| (r, r.tag()))) else {
        return Ipi::default();
    };
    Ipi {
        regime: Some(regime),
        cst: b.text("CST"),
        base: decimal_or_zero("vBC", b.first_of(&["vBC"])),
        rate: decimal_or_zero("pIPI", b.first_of(&["pIPI"])),
        value: decimal_or_zero("vIPI", b.first_of(&["vIPI"])),
    }
}

fn resolve_contribution(blocks: &[TaxBlock], kind: ContributionKind) -> Contribution {
    let candidates = ContributionRegime::ALL.map(|r| (r, r.tag(kind)));
    let Some((regime, b)) = probe(blocks, kind.group(), candidates) else {
        return Contribution::default();
    };
    Contribution {
        regime: Some(regime),
        cst: b.text("CST"),
        base: decimal_or_zero("vBC", b.first_of(&["vBC", "qBCProd"])),
        rate: decimal_or_zero(kind.rate_field(), b.first_of(&[kind.rate_field(), "vAliqProd"])),
        value: decimal_or_zero(kind.value_field(), b.first_of(&[kind.value_field()])),
    }
}
