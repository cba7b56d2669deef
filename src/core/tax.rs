//! Per-item tax groups and their regime variants.
//!
//! Each NFe tax group (`ICMS`, `IPI`, `PIS`, `COFINS`) carries exactly one
//! regime-specific child element, e.g. `ICMS/ICMS40` or `PIS/PISOutr`. The
//! regime enums below name every known variant; `ALL` lists them in the
//! order the resolver probes them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// ICMS regime, one per `ICMS/ICMSxx` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IcmsRegime {
    /// Fully taxed.
    Icms00,
    /// Monophasic fuel taxation.
    Icms02,
    /// Taxed with substitution (ST).
    Icms10,
    /// Monophasic with retention.
    Icms15,
    /// Reduced calculation base.
    Icms20,
    /// Exempt or untaxed with ST.
    Icms30,
    /// Exempt, untaxed or suspended (CST 40/41/50).
    Icms40,
    /// Deferred.
    Icms51,
    /// Monophasic deferred.
    Icms53,
    /// Previously charged by ST.
    Icms60,
    /// Monophasic previously charged.
    Icms61,
    /// Reduced base with ST.
    Icms70,
    /// Other.
    Icms90,
    /// Shared between states.
    IcmsPart,
    /// ST repass.
    IcmsSt,
    /// Simples Nacional, CSOSN 101.
    IcmsSn101,
    /// Simples Nacional, CSOSN 102/103/300/400.
    IcmsSn102,
    IcmsSn201,
    IcmsSn202,
    IcmsSn500,
    IcmsSn900,
}

impl IcmsRegime {
    /// Probe order used by the resolver.
    pub const ALL: [IcmsRegime; 21] = [
        Self::Icms00,
        Self::Icms02,
        Self::Icms10,
        Self::Icms15,
        Self::Icms20,
        Self::Icms30,
        Self::Icms40,
        Self::Icms51,
        Self::Icms53,
        Self::Icms60,
        Self::Icms61,
        Self::Icms70,
        Self::Icms90,
        Self::IcmsPart,
        Self::IcmsSt,
        Self::IcmsSn101,
        Self::IcmsSn102,
        Self::IcmsSn201,
        Self::IcmsSn202,
        Self::IcmsSn500,
        Self::IcmsSn900,
    ];

    /// Element name of the regime block.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Icms00 => "ICMS00",
            Self::Icms02 => "ICMS02",
            Self::Icms10 => "ICMS10",
            Self::Icms15 => "ICMS15",
            Self::Icms20 => "ICMS20",
            Self::Icms30 => "ICMS30",
            Self::Icms40 => "ICMS40",
            Self::Icms51 => "ICMS51",
            Self::Icms53 => "ICMS53",
            Self::Icms60 => "ICMS60",
            Self::Icms61 => "ICMS61",
            Self::Icms70 => "ICMS70",
            Self::Icms90 => "ICMS90",
            Self::IcmsPart => "ICMSPart",
            Self::IcmsSt => "ICMSST",
            Self::IcmsSn101 => "ICMSSN101",
            Self::IcmsSn102 => "ICMSSN102",
            Self::IcmsSn201 => "ICMSSN201",
            Self::IcmsSn202 => "ICMSSN202",
            Self::IcmsSn500 => "ICMSSN500",
            Self::IcmsSn900 => "ICMSSN900",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.tag() == tag)
    }

    /// Simples Nacional regimes report a CSOSN instead of a CST.
    pub fn is_simples_nacional(&self) -> bool {
        matches!(
            self,
            Self::IcmsSn101
                | Self::IcmsSn102
                | Self::IcmsSn201
                | Self::IcmsSn202
                | Self::IcmsSn500
                | Self::IcmsSn900
        )
    }
}

/// IPI regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpiRegime {
    /// `IPITrib`: taxed.
    Taxed,
    /// `IPINT`: not taxed.
    NotTaxed,
}

impl IpiRegime {
    pub const ALL: [IpiRegime; 2] = [Self::Taxed, Self::NotTaxed];

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Taxed => "IPITrib",
            Self::NotTaxed => "IPINT",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.tag() == tag)
    }
}

/// PIS and COFINS share the same four regime shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContributionKind {
    Pis,
    Cofins,
}

impl ContributionKind {
    /// Group element name, also the prefix of every regime element.
    pub fn group(&self) -> &'static str {
        match self {
            Self::Pis => "PIS",
            Self::Cofins => "COFINS",
        }
    }

    /// Element holding the percentage rate.
    pub fn rate_field(&self) -> &'static str {
        match self {
            Self::Pis => "pPIS",
            Self::Cofins => "pCOFINS",
        }
    }

    /// Element holding the computed amount.
    pub fn value_field(&self) -> &'static str {
        match self {
            Self::Pis => "vPIS",
            Self::Cofins => "vCOFINS",
        }
    }
}

/// PIS/COFINS regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContributionRegime {
    /// `Aliq`: percentage rate over a value base.
    Rate,
    /// `Qtde`: fixed amount per quantity.
    Quantity,
    /// `NT`: not taxed.
    NotTaxed,
    /// `Outr`: other operations.
    Other,
}

impl ContributionRegime {
    pub const ALL: [ContributionRegime; 4] =
        [Self::Rate, Self::Quantity, Self::NotTaxed, Self::Other];

    pub fn tag(&self, kind: ContributionKind) -> &'static str {
        match (kind, self) {
            (ContributionKind::Pis, Self::Rate) => "PISAliq",
            (ContributionKind::Pis, Self::Quantity) => "PISQtde",
            (ContributionKind::Pis, Self::NotTaxed) => "PISNT",
            (ContributionKind::Pis, Self::Other) => "PISOutr",
            (ContributionKind::Cofins, Self::Rate) => "COFINSAliq",
            (ContributionKind::Cofins, Self::Quantity) => "COFINSQtde",
            (ContributionKind::Cofins, Self::NotTaxed) => "COFINSNT",
            (ContributionKind::Cofins, Self::Other) => "COFINSOutr",
        }
    }

    pub fn from_tag(kind: ContributionKind, tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.tag(kind) == tag)
    }
}

/// Resolved ICMS fields. All empty/zero when no known regime is present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Icms {
    pub regime: Option<IcmsRegime>,
    /// `orig`: goods origin.
    pub origin: String,
    /// `CST`, or `CSOSN` under Simples Nacional.
    pub cst: String,
    /// `vBC`.
    pub base: Decimal,
    /// `pICMS`.
    pub rate: Decimal,
    /// `vICMS`.
    pub value: Decimal,
    /// `vICMSDeson`: relieved amount.
    pub deducted: Decimal,
    /// `motDesICMS`.
    pub deduction_reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ipi {
    pub regime: Option<IpiRegime>,
    pub cst: String,
    pub base: Decimal,
    pub rate: Decimal,
    pub value: Decimal,
}

/// Resolved PIS or COFINS fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub regime: Option<ContributionRegime>,
    pub cst: String,
    pub base: Decimal,
    pub rate: Decimal,
    pub value: Decimal,
}

/// All four tax groups of one line item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemTaxes {
    pub icms: Icms,
    pub ipi: Ipi,
    pub pis: Contribution,
    pub cofins: Contribution,
}
