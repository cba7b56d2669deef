use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::tax::ItemTaxes;

/// A parsed NFe: header, both parties, totals and line items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// `ide` block.
    pub header: InvoiceHeader,
    /// `emit`: the supplier issuing the invoice.
    pub emitter: Party,
    /// `dest`: the recipient.
    pub recipient: Party,
    /// `total/ICMSTot`.
    pub totals: InvoiceTotals,
    /// `det` elements in document order.
    pub items: Vec<LineItem>,
}

/// Invoice identification (`ide`) plus the free-text annotation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceHeader {
    /// `nNF`: invoice number.
    pub number: String,
    /// `serie`.
    pub series: String,
    /// Raw `dhEmi` text (or legacy `dEmi`).
    pub issued_at: String,
    /// Calendar date parsed from `issued_at`.
    pub issue_date: Option<NaiveDate>,
    /// Local time parsed from `issued_at`, when it carries one.
    pub issue_time: Option<NaiveTime>,
    /// `natOp`: nature of the operation.
    pub operation_nature: String,
    /// CFOP of the first line item that carries one.
    pub first_cfop: String,
    /// `infAdic/infCpl`: complementary information, where lot annotations live.
    pub additional_info: String,
}

/// Emitter or recipient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Party {
    /// CNPJ, or CPF for individuals.
    pub tax_id: String,
    /// `xNome`.
    pub name: String,
    /// `IE`: state registration.
    pub state_registration: String,
    /// `enderEmit` / `enderDest`.
    pub address: Address,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    /// `xLgr`.
    pub street: String,
    /// `nro`.
    pub number: String,
    /// `xBairro`.
    pub district: String,
    /// `xMun`.
    pub city: String,
    /// `UF`: two-letter state code.
    pub state: String,
    /// `CEP`.
    pub postal_code: String,
}

impl Address {
    /// Street and number on one line, empty when no street is present.
    pub fn street_line(&self) -> String {
        if self.street.is_empty() {
            return String::new();
        }
        if self.number.is_empty() {
            self.street.clone()
        } else {
            format!("{} {}", self.street, self.number)
        }
    }
}

/// `total/ICMSTot`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    /// `vNF`: invoice grand total.
    pub total_value: Decimal,
    /// `vICMSDeson`: relieved ICMS across the invoice.
    pub deducted_icms: Decimal,
    /// `vProd`: sum of product values.
    pub products_value: Decimal,
    /// `vBC`: ICMS calculation base.
    pub icms_base: Decimal,
    /// `vICMS`.
    pub icms_value: Decimal,
}

/// One `det` element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// `nItem` attribute.
    pub item_index: String,
    /// `cProd`: the key lot annotations are matched against.
    pub product_code: String,
    /// `xProd`.
    pub description: String,
    /// `NCM`.
    pub ncm_code: String,
    pub cfop: String,
    /// `uCom`: commercial unit.
    pub unit: String,
    /// `qCom`.
    pub quantity: Decimal,
    /// `vUnCom`.
    pub unit_value: Decimal,
    /// `vProd`.
    pub total_value: Decimal,
    /// `xPed`: buyer purchase order.
    pub purchase_order: String,
    /// `nItemPed`.
    pub order_item: String,
    pub cest: String,
    /// `nFCI`.
    pub fci: String,
    /// First `rastro/nLote`, the structured lot reference some emitters use.
    pub traced_lot: String,
    pub taxes: ItemTaxes,
}

/// One lot recovered from the free-text annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotRecord {
    pub product_code: String,
    pub lot_number: String,
    pub quantity: Decimal,
    /// Two or three uppercase letters, e.g. `SAC`.
    pub unit: String,
}

impl LotRecord {
    pub fn new(
        product_code: impl Into<String>,
        lot_number: impl Into<String>,
        quantity: Decimal,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            product_code: product_code.into(),
            lot_number: lot_number.into(),
            quantity,
            unit: unit.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn street_line_joins_number() {
        let mut addr = Address {
            street: "Av. Paulista".into(),
            number: "1000".into(),
            ..Default::default()
        };
        assert_eq!(addr.street_line(), "Av. Paulista 1000");
        addr.number.clear();
        assert_eq!(addr.street_line(), "Av. Paulista");
        addr.street.clear();
        addr.number = "12".into();
        assert_eq!(addr.street_line(), "");
    }
}
