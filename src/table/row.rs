use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::core::decimal::format_decimal_comma;
use crate::core::{ContributionKind, Invoice, LineItem, LotRecord, Party};

/// Suffix marking rows synthesized for lots beyond the matching line items.
pub const EXTRA_SUFFIX: &str = "_lote_extra";

/// Where a row's item fields came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ItemIndex {
    /// A `det` element, by its `nItem`.
    Original(String),
    /// A synthetic row cloned from the `det` with this `nItem`.
    Extra(String),
    /// No line item: a lot without a matching product.
    #[default]
    Unmatched,
}

impl ItemIndex {
    /// The derived index for a synthetic row cloned from this one.
    pub fn to_extra(&self) -> Self {
        match self {
            Self::Original(n) | Self::Extra(n) => Self::Extra(n.clone()),
            Self::Unmatched => Self::Unmatched,
        }
    }

    pub fn is_extra(&self) -> bool {
        matches!(self, Self::Extra(_))
    }
}

impl fmt::Display for ItemIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Original(n) => f.write_str(n),
            Self::Extra(n) => write!(f, "{n}{EXTRA_SUFFIX}"),
            Self::Unmatched => Ok(()),
        }
    }
}

impl Serialize for ItemIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A typed table cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Text(String),
    Number(Decimal),
    Date(NaiveDate),
    Time(NaiveTime),
}

impl Cell {
    /// Display text: decimal comma, ISO date, `HH:MM:SS` time.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(d) => format_decimal_comma(*d),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
            Cell::Time(t) => t.format("%H:%M:%S").to_string(),
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Cell::Number(d) => Some(*d),
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<Decimal> for Cell {
    fn from(d: Decimal) -> Self {
        Cell::Number(d)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map_or(Cell::Empty, Into::into)
    }
}

impl From<NaiveDate> for Cell {
    fn from(d: NaiveDate) -> Self {
        Cell::Date(d)
    }
}

impl From<NaiveTime> for Cell {
    fn from(t: NaiveTime) -> Self {
        Cell::Time(t)
    }
}

/// One output row: a line item (or a synthetic copy) paired with at most one lot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Row {
    // Header
    pub invoice_number: String,
    pub series: String,
    pub issue_date: Option<NaiveDate>,
    pub issue_time: Option<NaiveTime>,
    pub operation_nature: String,
    pub invoice_cfop: String,
    pub additional_info: String,
    pub icms_base_total: Decimal,
    pub icms_total: Decimal,
    pub invoice_total: Decimal,
    pub products_total: Decimal,
    pub deducted_icms_total: Decimal,

    // Recipient (dest)
    pub recipient_tax_id: String,
    pub recipient_name: String,
    pub recipient_state_registration: String,
    pub recipient_address: String,
    pub recipient_district: String,
    pub recipient_city: String,
    pub recipient_state: String,
    pub recipient_postal_code: String,

    // Supplier (emit)
    pub supplier_tax_id: String,
    pub supplier_name: String,
    pub supplier_state_registration: String,
    pub supplier_address: String,
    pub supplier_district: String,
    pub supplier_city: String,
    pub supplier_state: String,
    pub supplier_postal_code: String,

    // Line item
    pub item_index: ItemIndex,
    pub product_code: String,
    pub description: String,
    pub ncm_code: String,
    pub cest: String,
    pub fci: String,
    pub cfop: String,
    pub unit: String,
    pub quantity: Decimal,
    pub unit_value: Decimal,
    pub item_total: Decimal,
    pub purchase_order: String,
    pub order_item: String,
    pub traced_lot: String,

    // Taxes
    pub icms_regime: String,
    pub icms_origin: String,
    pub icms_cst: String,
    pub icms_base: Decimal,
    pub icms_rate: Decimal,
    pub icms_value: Decimal,
    pub icms_deducted: Decimal,
    pub icms_deduction_reason: String,
    pub ipi_regime: String,
    pub ipi_cst: String,
    pub ipi_base: Decimal,
    pub ipi_rate: Decimal,
    pub ipi_value: Decimal,
    pub pis_regime: String,
    pub pis_cst: String,
    pub pis_base: Decimal,
    pub pis_rate: Decimal,
    pub pis_value: Decimal,
    pub cofins_regime: String,
    pub cofins_cst: String,
    pub cofins_base: Decimal,
    pub cofins_rate: Decimal,
    pub cofins_value: Decimal,

    // Lot
    pub lot_product_code: String,
    pub lot_number: String,
    pub lot_quantity: Option<Decimal>,
    pub lot_unit: String,
}

impl Row {
    /// Column names, in the order [`Row::cells`] yields values.
    pub const COLUMNS: [&'static str; 69] = [
        "invoice_number",
        "series",
        "issue_date",
        "issue_time",
        "operation_nature",
        "invoice_cfop",
        "additional_info",
        "icms_base_total",
        "icms_total",
        "invoice_total",
        "products_total",
        "deducted_icms_total",
        "recipient_tax_id",
        "recipient_name",
        "recipient_state_registration",
        "recipient_address",
        "recipient_district",
        "recipient_city",
        "recipient_state",
        "recipient_postal_code",
        "supplier_tax_id",
        "supplier_name",
        "supplier_state_registration",
        "supplier_address",
        "supplier_district",
        "supplier_city",
        "supplier_state",
        "supplier_postal_code",
        "item_index",
        "product_code",
        "description",
        "ncm_code",
        "cest",
        "fci",
        "cfop",
        "unit",
        "quantity",
        "unit_value",
        "item_total",
        "purchase_order",
        "order_item",
        "traced_lot",
        "icms_regime",
        "icms_origin",
        "icms_cst",
        "icms_base",
        "icms_rate",
        "icms_value",
        "icms_deducted",
        "icms_deduction_reason",
        "ipi_regime",
        "ipi_cst",
        "ipi_base",
        "ipi_rate",
        "ipi_value",
        "pis_regime",
        "pis_cst",
        "pis_base",
        "pis_rate",
        "pis_value",
        "cofins_regime",
        "cofins_cst",
        "cofins_base",
        "cofins_rate",
        "cofins_value",
        "lot_product_code",
        "lot_number",
        "lot_quantity",
        "lot_unit",
    ];

    /// A row with header and party columns filled, everything else empty.
    pub fn from_header(invoice: &Invoice) -> Self {
        let header = &invoice.header;
        let totals = &invoice.totals;
        let mut row = Row {
            invoice_number: header.number.clone(),
            series: header.series.clone(),
            issue_date: header.issue_date,
            issue_time: header.issue_time,
            operation_nature: header.operation_nature.clone(),
            invoice_cfop: header.first_cfop.clone(),
            additional_info: header.additional_info.clone(),
            icms_base_total: totals.icms_base,
            icms_total: totals.icms_value,
            invoice_total: totals.total_value,
            products_total: totals.products_value,
            deducted_icms_total: totals.deducted_icms,
            ..Default::default()
        };
        row.set_recipient(&invoice.recipient);
        row.set_supplier(&invoice.emitter);
        row
    }

    fn set_recipient(&mut self, party: &Party) {
        self.recipient_tax_id = party.tax_id.clone();
        self.recipient_name = party.name.clone();
        self.recipient_state_registration = party.state_registration.clone();
        self.recipient_address = party.address.street_line();
        self.recipient_district = party.address.district.clone();
        self.recipient_city = party.address.city.clone();
        self.recipient_state = party.address.state.clone();
        self.recipient_postal_code = party.address.postal_code.clone();
    }

    fn set_supplier(&mut self, party: &Party) {
        self.supplier_tax_id = party.tax_id.clone();
        self.supplier_name = party.name.clone();
        self.supplier_state_registration = party.state_registration.clone();
        self.supplier_address = party.address.street_line();
        self.supplier_district = party.address.district.clone();
        self.supplier_city = party.address.city.clone();
        self.supplier_state = party.address.state.clone();
        self.supplier_postal_code = party.address.postal_code.clone();
    }

    /// Fill line item and tax columns.
    pub fn set_item(&mut self, item: &LineItem) {
        self.item_index = ItemIndex::Original(item.item_index.clone());
        self.product_code = item.product_code.clone();
        self.description = item.description.clone();
        self.ncm_code = item.ncm_code.clone();
        self.cest = item.cest.clone();
        self.fci = item.fci.clone();
        self.cfop = item.cfop.clone();
        self.unit = item.unit.clone();
        self.quantity = item.quantity;
        self.unit_value = item.unit_value;
        self.item_total = item.total_value;
        self.purchase_order = item.purchase_order.clone();
        self.order_item = item.order_item.clone();
        self.traced_lot = item.traced_lot.clone();

        let taxes = &item.taxes;
        self.icms_regime = taxes
            .icms
            .regime
            .map(|r| r.tag())
            .unwrap_or_default()
            .to_string();
        self.icms_origin = taxes.icms.origin.clone();
        self.icms_cst = taxes.icms.cst.clone();
        self.icms_base = taxes.icms.base;
        self.icms_rate = taxes.icms.rate;
        self.icms_value = taxes.icms.value;
        self.icms_deducted = taxes.icms.deducted;
        self.icms_deduction_reason = taxes.icms.deduction_reason.clone();

        self.ipi_regime = taxes.ipi.regime.map(|r| r.tag()).unwrap_or_default().to_string();
        self.ipi_cst = taxes.ipi.cst.clone();
        self.ipi_base = taxes.ipi.base;
        self.ipi_rate = taxes.ipi.rate;
        self.ipi_value = taxes.ipi.value;

        self.pis_regime = taxes
            .pis
            .regime
            .map(|r| r.tag(ContributionKind::Pis))
            .unwrap_or_default()
            .to_string();
        self.pis_cst = taxes.pis.cst.clone();
        self.pis_base = taxes.pis.base;
        self.pis_rate = taxes.pis.rate;
        self.pis_value = taxes.pis.value;

        self.cofins_regime = taxes
            .cofins
            .regime
            .map(|r| r.tag(ContributionKind::Cofins))
            .unwrap_or_default()
            .to_string();
        self.cofins_cst = taxes.cofins.cst.clone();
        self.cofins_base = taxes.cofins.base;
        self.cofins_rate = taxes.cofins.rate;
        self.cofins_value = taxes.cofins.value;
    }

    /// Attach a lot, replacing any previous one.
    pub fn set_lot(&mut self, lot: &LotRecord) {
        self.lot_product_code = lot.product_code.clone();
        self.lot_number = lot.lot_number.clone();
        self.lot_quantity = Some(lot.quantity);
        self.lot_unit = lot.unit.clone();
    }

    pub fn has_lot(&self) -> bool {
        !self.lot_number.is_empty()
    }

    /// Zero the commercial quantity and values so synthetic rows do not
    /// add to invoice totals.
    pub fn zero_commercial_values(&mut self) {
        self.quantity = Decimal::ZERO;
        self.unit_value = Decimal::ZERO;
        self.item_total = Decimal::ZERO;
    }

    /// Typed values in [`Row::COLUMNS`] order.
    pub fn cells(&self) -> Vec<Cell> {
        vec![
            self.invoice_number.as_str().into(),
            self.series.as_str().into(),
            self.issue_date.into(),
            self.issue_time.into(),
            self.operation_nature.as_str().into(),
            self.invoice_cfop.as_str().into(),
            self.additional_info.as_str().into(),
            self.icms_base_total.into(),
            self.icms_total.into(),
            self.invoice_total.into(),
            self.products_total.into(),
            self.deducted_icms_total.into(),
            self.recipient_tax_id.as_str().into(),
            self.recipient_name.as_str().into(),
            self.recipient_state_registration.as_str().into(),
            self.recipient_address.as_str().into(),
            self.recipient_district.as_str().into(),
            self.recipient_city.as_str().into(),
            self.recipient_state.as_str().into(),
            self.recipient_postal_code.as_str().into(),
            self.supplier_tax_id.as_str().into(),
            self.supplier_name.as_str().into(),
            self.supplier_state_registration.as_str().into(),
            self.supplier_address.as_str().into(),
            self.supplier_district.as_str().into(),
            self.supplier_city.as_str().into(),
            self.supplier_state.as_str().into(),
            self.supplier_postal_code.as_str().into(),
            Cell::Text(self.item_index.to_string()),
            self.product_code.as_str().into(),
            self.description.as_str().into(),
            self.ncm_code.as_str().into(),
            self.cest.as_str().into(),
            self.fci.as_str().into(),
            self.cfop.as_str().into(),
            self.unit.as_str().into(),
            self.quantity.into(),
            self.unit_value.into(),
            self.item_total.into(),
            self.purchase_order.as_str().into(),
            self.order_item.as_str().into(),
            self.traced_lot.as_str().into(),
            self.icms_regime.as_str().into(),
            self.icms_origin.as_str().into(),
            self.icms_cst.as_str().into(),
            self.icms_base.into(),
            self.icms_rate.into(),
            self.icms_value.into(),
            self.icms_deducted.into(),
            self.icms_deduction_reason.as_str().into(),
            self.ipi_regime.as_str().into(),
            self.ipi_cst.as_str().into(),
            self.ipi_base.into(),
            self.ipi_rate.into(),
            self.ipi_value.into(),
            self.pis_regime.as_str().into(),
            self.pis_cst.as_str().into(),
            self.pis_base.into(),
            self.pis_rate.into(),
            self.pis_value.into(),
            self.cofins_regime.as_str().into(),
            self.cofins_cst.as_str().into(),
            self.cofins_base.into(),
            self.cofins_rate.into(),
            self.cofins_value.into(),
            self.lot_product_code.as_str().into(),
            self.lot_number.as_str().into(),
            self.lot_quantity.into(),
            self.lot_unit.as_str().into(),
        ]
    }

    /// Display strings in [`Row::COLUMNS`] order.
    pub fn display_cells(&self) -> Vec<String> {
        self.cells().iter().map(Cell::display).collect()
    }

    /// Typed value of one column by name.
    pub fn cell(&self, column: &str) -> Option<Cell> {
        let pos = Self::COLUMNS.iter().position(|c| *c == column)?;
        self.cells().into_iter().nth(pos)
    }
}
