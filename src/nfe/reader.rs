use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};

use super::taxes::{TaxBlock, resolve_taxes};
use super::{INFO_BLOCK, INVOICE_ROOT, NFE_NAMESPACE, PROCESSED_ROOT};
use crate::core::decimal::decimal_or_zero;
use crate::core::{Address, Invoice, LineItem, NfeError, Party};

fn malformed(detail: impl Into<String>) -> NfeError {
    NfeError::MalformedDocument(detail.into())
}

/// Parse an NFe XML string into an [`Invoice`].
///
/// Fails only when the XML is not well-formed or when the `NFe` root or its
/// `infNFe` block is missing. Any other absent element is left empty or zero.
pub fn parse_invoice(xml: &str) -> Result<Invoice, NfeError> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut p = NfeParsed::default();
    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut started = false;
    let mut root_seen = false;
    let mut root_closed = false;

    loop {
        let (ns, event) = reader
            .read_resolved_event()
            .map_err(|e| malformed(format!("XML parse error: {e}")))?;
        match event {
            Event::Decl(_) if started => {
                return Err(malformed("XML declaration not at the start of the document"));
            }
            Event::Start(ref e) => {
                if root_closed {
                    return Err(malformed("element after the root element"));
                }
                check_start_tag(e)?;
                path.push(element_name(&ns, e)?);
                root_seen = true;
                p.open(&path, e)?;
                text.clear();
            }
            Event::Empty(ref e) => {
                if root_closed {
                    return Err(malformed("element after the root element"));
                }
                check_start_tag(e)?;
                path.push(element_name(&ns, e)?);
                root_seen = true;
                p.open(&path, e)?;
                p.close(&path, "");
                path.pop();
                text.clear();
                root_closed = path.is_empty();
            }
            Event::Text(ref e) => {
                let t = e
                    .unescape()
                    .map_err(|err| malformed(format!("bad text content: {err}")))?;
                if path.is_empty() {
                    if !t.trim().is_empty() {
                        return Err(malformed("text outside the root element"));
                    }
                } else {
                    text.push_str(&t);
                }
            }
            Event::CData(ref e) => {
                if path.is_empty() {
                    return Err(malformed("CDATA outside the root element"));
                }
                text.push_str(&String::from_utf8_lossy(e));
            }
            Event::End(_) => {
                p.close(&path, text.trim());
                text.clear();
                path.pop();
                root_closed = path.is_empty();
            }
            Event::Eof => break,
            _ => {}
        }
        started = true;
    }

    if !root_seen {
        return Err(malformed("no element found"));
    }
    if let Some(open) = path.last() {
        return Err(malformed(format!(
            "unexpected end of document inside <{}>",
            if open.is_empty() { "?" } else { open.as_str() }
        )));
    }

    p.into_invoice()
}

/// Reject tag names and attributes quick-xml lets through unchecked.
fn check_start_tag(e: &BytesStart) -> Result<(), NfeError> {
    let name = e.name();
    if !is_xml_name(name.as_ref()) {
        return Err(malformed(format!(
            "invalid element name <{}>",
            String::from_utf8_lossy(name.as_ref())
        )));
    }
    for attr in e.attributes() {
        let attr = attr.map_err(|err| malformed(format!("bad attribute: {err}")))?;
        if !is_xml_name(attr.key.as_ref()) {
            return Err(malformed(format!(
                "invalid attribute name {}",
                String::from_utf8_lossy(attr.key.as_ref())
            )));
        }
        if attr.value.contains(&b'<') {
            return Err(malformed("'<' in attribute value"));
        }
        attr.unescape_value()
            .map_err(|err| malformed(format!("bad attribute value: {err}")))?;
    }
    Ok(())
}

/// XML `Name` production, with letters and digits taken from Unicode
/// alphabetic/alphanumeric classes.
fn is_xml_name(name: &[u8]) -> bool {
    let Ok(name) = std::str::from_utf8(name) else {
        return false;
    };
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.' | '\u{b7}'))
}

/// Local name for elements in the NFe namespace, `""` for anything else.
fn element_name(ns: &ResolveResult, e: &BytesStart) -> Result<String, NfeError> {
    match ns {
        ResolveResult::Bound(Namespace(uri)) if *uri == NFE_NAMESPACE.as_bytes() => {
            Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned())
        }
        ResolveResult::Unknown(prefix) => Err(malformed(format!(
            "unbound namespace prefix {}",
            String::from_utf8_lossy(prefix)
        ))),
        _ => Ok(String::new()),
    }
}

/// Depth of `infNFe` within `path` when the path runs through the invoice.
fn info_depth(path: &[String]) -> Option<usize> {
    match path {
        [root, nfe, info, ..]
            if root == PROCESSED_ROOT && nfe == INVOICE_ROOT && info == INFO_BLOCK =>
        {
            Some(2)
        }
        [nfe, info, ..] if nfe == INVOICE_ROOT && info == INFO_BLOCK => Some(1),
        _ => None,
    }
}

/// Path below `infNFe`, or `None` outside the invoice.
fn relative(path: &[String]) -> Option<Vec<&str>> {
    let depth = info_depth(path)?;
    Some(path[depth + 1..].iter().map(String::as_str).collect())
}

#[derive(Default)]
struct NfeParsed {
    seen_invoice_root: bool,
    seen_info_block: bool,
    seen_sections: Vec<&'static str>,
    invoice: Invoice,
    legacy_issue_date: String,
    current_item: Option<ParsedItem>,
}

#[derive(Default)]
struct ParsedItem {
    item: LineItem,
    tax_blocks: Vec<TaxBlock>,
}

impl NfeParsed {
    fn open(&mut self, path: &[String], e: &BytesStart) -> Result<(), NfeError> {
        let invoice_root = match path {
            [nfe] => nfe == INVOICE_ROOT,
            [root, nfe] => root == PROCESSED_ROOT && nfe == INVOICE_ROOT,
            _ => false,
        };
        if invoice_root {
            self.seen_invoice_root = true;
        }

        let Some(rel) = relative(path) else {
            return Ok(());
        };
        match rel.as_slice() {
            [] => self.seen_info_block = true,
            [section] => {
                for known in ["ide", "emit", "dest", "total"] {
                    if *section == known && !self.seen_sections.contains(&known) {
                        self.seen_sections.push(known);
                    }
                }
                if *section == "det" {
                    let index = e
                        .try_get_attribute("nItem")
                        .map_err(|err| malformed(format!("bad det attribute: {err}")))?
                        .map(|a| a.unescape_value().map(|v| v.into_owned()))
                        .transpose()
                        .map_err(|err| malformed(format!("bad nItem value: {err}")))?
                        .unwrap_or_default();
                    let mut parsed = ParsedItem::default();
                    parsed.item.item_index = index;
                    self.current_item = Some(parsed);
                }
            }
            ["det", "imposto", group, variant] => {
                if let Some(parsed) = self.current_item.as_mut() {
                    parsed.tax_blocks.push(TaxBlock::new(*group, *variant));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, path: &[String], text: &str) {
        let Some(rel) = relative(path) else {
            return;
        };

        if rel.as_slice() == ["det"] {
            if let Some(parsed) = self.current_item.take() {
                let mut item = parsed.item;
                item.taxes = resolve_taxes(&parsed.tax_blocks);
                self.invoice.items.push(item);
            }
            return;
        }
        if text.is_empty() {
            return;
        }

        let header = &mut self.invoice.header;
        match rel.as_slice() {
            ["ide", "nNF"] => header.number = text.to_string(),
            ["ide", "serie"] => header.series = text.to_string(),
            ["ide", "dhEmi"] => header.issued_at = text.to_string(),
            ["ide", "dEmi"] => self.legacy_issue_date = text.to_string(),
            ["ide", "natOp"] => header.operation_nature = text.to_string(),
            ["infAdic", "infCpl"] => header.additional_info = text.to_string(),

            ["emit", field] => party_field(&mut self.invoice.emitter, field, text),
            ["emit", "enderEmit", field] => {
                address_field(&mut self.invoice.emitter.address, field, text)
            }
            ["dest", field] => party_field(&mut self.invoice.recipient, field, text),
            ["dest", "enderDest", field] => {
                address_field(&mut self.invoice.recipient.address, field, text)
            }

            ["total", "ICMSTot", field] => {
                let totals = &mut self.invoice.totals;
                match *field {
                    "vNF" => totals.total_value = decimal_or_zero(field, text),
                    "vICMSDeson" => totals.deducted_icms = decimal_or_zero(field, text),
                    "vProd" => totals.products_value = decimal_or_zero(field, text),
                    "vBC" => totals.icms_base = decimal_or_zero(field, text),
                    "vICMS" => totals.icms_value = decimal_or_zero(field, text),
                    _ => {}
                }
            }

            ["det", "prod", field] => {
                if let Some(parsed) = self.current_item.as_mut() {
                    product_field(&mut parsed.item, field, text);
                }
            }
            ["det", "prod", "rastro", "nLote"] => {
                if let Some(parsed) = self.current_item.as_mut() {
                    if parsed.item.traced_lot.is_empty() {
                        parsed.item.traced_lot = text.to_string();
                    }
                }
            }
            ["det", "imposto", group, variant, field] => {
                if let Some(block) = self.current_item.as_mut().and_then(|parsed| {
                    parsed
                        .tax_blocks
                        .iter_mut()
                        .rev()
                        .find(|b| b.group == *group && b.variant == *variant)
                }) {
                    block.fields.push((field.to_string(), text.to_string()));
                }
            }
            _ => {}
        }
    }

    fn into_invoice(self) -> Result<Invoice, NfeError> {
        if !self.seen_invoice_root {
            return Err(NfeError::MissingRequiredSection(format!(
                "{INVOICE_ROOT} root in namespace {NFE_NAMESPACE}"
            )));
        }
        if !self.seen_info_block {
            return Err(NfeError::MissingRequiredSection(INFO_BLOCK.to_string()));
        }
        for section in ["ide", "emit", "dest", "total"] {
            if !self.seen_sections.contains(&section) {
                tracing::debug!(section, "optional section absent, using defaults");
            }
        }

        let mut invoice = self.invoice;
        if invoice.header.issued_at.is_empty() {
            invoice.header.issued_at = self.legacy_issue_date;
        }
        let (date, time) = split_issued_at(&invoice.header.issued_at);
        invoice.header.issue_date = date;
        invoice.header.issue_time = time;
        invoice.header.first_cfop = invoice
            .items
            .iter()
            .map(|item| item.cfop.as_str())
            .find(|cfop| !cfop.is_empty())
            .unwrap_or_default()
            .to_string();
        Ok(invoice)
    }
}

fn party_field(party: &mut Party, field: &str, text: &str) {
    match field {
        "CNPJ" => party.tax_id = text.to_string(),
        "CPF" if party.tax_id.is_empty() => party.tax_id = text.to_string(),
        "xNome" => party.name = text.to_string(),
        "IE" => party.state_registration = text.to_string(),
        _ => {}
    }
}

fn address_field(addr: &mut Address, field: &str, text: &str) {
    let slot = match field {
        "xLgr" => &mut addr.street,
        "nro" => &mut addr.number,
        "xBairro" => &mut addr.district,
        "xMun" => &mut addr.city,
        "UF" => &mut addr.state,
        "CEP" => &mut addr.postal_code,
        _ => return,
    };
    *slot = text.to_string();
}

fn product_field(item: &mut LineItem, field: &str, text: &str) {
    match field {
        "cProd" => item.product_code = text.to_string(),
        "xProd" => item.description = text.to_string(),
        "NCM" => item.ncm_code = text.to_string(),
        "CFOP" => item.cfop = text.to_string(),
        "uCom" => item.unit = text.to_string(),
        "qCom" => item.quantity = decimal_or_zero(field, text),
        "vUnCom" => item.unit_value = decimal_or_zero(field, text),
        "vProd" => item.total_value = decimal_or_zero(field, text),
        "xPed" => item.purchase_order = text.to_string(),
        "nItemPed" => item.order_item = text.to_string(),
        "CEST" => item.cest = text.to_string(),
        "nFCI" => item.fci = text.to_string(),
        _ => {}
    }
}

/// Split `dhEmi` (`2024-03-15T10:30:00-03:00`) or legacy `dEmi`
/// (`2024-03-15`) into local date and time.
fn split_issued_at(raw: &str) -> (Option<NaiveDate>, Option<NaiveTime>) {
    let raw = raw.trim();
    if raw.is_empty() {
        return (None, None);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return (Some(dt.date_naive()), Some(dt.time()));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return (Some(dt.date()), Some(dt.time()));
    }
    let (date_part, time_part) = raw.split_once('T').unwrap_or((raw, ""));
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok();
    let time = time_part
        .get(..8)
        .and_then(|t| NaiveTime::parse_from_str(t, "%H:%M:%S").ok());
    if date.is_none() {
        tracing::debug!(value = raw, "unrecognized issue date");
    }
    (date, time)
}
