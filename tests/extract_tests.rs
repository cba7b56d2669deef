#![cfg(feature = "table")]

use chrono::{NaiveDate, NaiveTime};
use nfe_tabular::core::*;
use nfe_tabular::nfe;
use nfe_tabular::table::{Cell, ItemIndex, Row, extract_batch, extract_rows, successful_rows};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const PROC_WITH_LOTS: &str = include_str!("fixtures/nfe_proc_lots.xml");

fn rows() -> Vec<Row> {
    extract_rows(PROC_WITH_LOTS, &ExtractOptions::default()).unwrap()
}

/// Bare `NFe` root with the given `det` elements and annotation.
fn bare_nfe(dets: &str, annotation: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<NFe xmlns="http://www.portalfiscal.inf.br/nfe">
  <infNFe versao="4.00">
    <ide><nNF>77</nNF><serie>2</serie><dhEmi>2024-01-02T08:00:00-03:00</dhEmi><natOp>VENDA</natOp></ide>
    <emit><CNPJ>11111111000111</CNPJ><xNome>EMITENTE SA</xNome></emit>
    <dest><CPF>12345678909</CPF><xNome>FULANO DE TAL</xNome></dest>
    {dets}
    <total><ICMSTot><vProd>100.00</vProd><vNF>100.00</vNF></ICMSTot></total>
    <infAdic><infCpl>{annotation}</infCpl></infAdic>
  </infNFe>
</NFe>"#
    )
}

fn det(n: u32, code: &str, qty: &str, total: &str) -> String {
    format!(
        r#"<det nItem="{n}"><prod><cProd>{code}</cProd><xProd>ITEM {n}</xProd><uCom>UN</uCom><qCom>{qty}</qCom><vUnCom>1.00</vUnCom><vProd>{total}</vProd></prod></det>"#
    )
}

// ---------------------------------------------------------------------------
// XML extraction
// ---------------------------------------------------------------------------

#[test]
fn wrapped_invoice_header_and_parties() {
    let invoice = nfe::parse_invoice(PROC_WITH_LOTS).unwrap();

    assert_eq!(invoice.header.number, "1234");
    assert_eq!(invoice.header.series, "1");
    assert_eq!(invoice.header.operation_nature, "VENDA DE PRODUCAO DO ESTABELECIMENTO");
    assert_eq!(invoice.header.issue_date, NaiveDate::from_ymd_opt(2024, 3, 15));
    assert_eq!(invoice.header.issue_time, NaiveTime::from_hms_opt(10, 30, 0));
    assert_eq!(invoice.header.first_cfop, "5101");

    assert_eq!(invoice.emitter.tax_id, "60498706000161");
    assert_eq!(invoice.emitter.name, "CARGILL AGRICOLA S A");
    assert_eq!(invoice.emitter.state_registration, "240012345");
    assert_eq!(invoice.emitter.address.street_line(), "ROD BR 101 SUL KM 15");
    assert_eq!(invoice.emitter.address.state, "AL");

    assert_eq!(invoice.recipient.tax_id, "12345678000195");
    assert_eq!(invoice.recipient.address.city, "ARAPIRACA");
    assert_eq!(invoice.recipient.address.postal_code, "57300000");
}

#[test]
fn wrapped_invoice_totals_and_items() {
    let invoice = nfe::parse_invoice(PROC_WITH_LOTS).unwrap();

    assert_eq!(invoice.totals.total_value, dec!(192960.00));
    assert_eq!(invoice.totals.deducted_icms, dec!(34989.22));
    assert_eq!(invoice.totals.products_value, dec!(190400.00));
    assert_eq!(invoice.totals.icms_value, dec!(6144.00));

    assert_eq!(invoice.items.len(), 5);
    let first = &invoice.items[0];
    assert_eq!(first.item_index, "1");
    assert_eq!(first.product_code, "100141432");
    assert_eq!(first.ncm_code, "11042300");
    assert_eq!(first.quantity, dec!(40));
    assert_eq!(first.total_value, dec!(3000.00));
    assert_eq!(first.purchase_order, "4517516666");
    assert_eq!(first.order_item, "10");

    let fourth = &invoice.items[3];
    assert_eq!(fourth.cest, "1709900");
    assert_eq!(fourth.fci, "B01F70AF-10BF-4B1F-848C-65FF57F616FE");

    assert_eq!(invoice.items[4].traced_lot, "0051612259");
}

#[test]
fn tax_regimes_resolved_per_item() {
    let invoice = nfe::parse_invoice(PROC_WITH_LOTS).unwrap();

    let exempt = &invoice.items[0].taxes;
    assert_eq!(exempt.icms.regime, Some(IcmsRegime::Icms40));
    assert_eq!(exempt.icms.deducted, dec!(540.00));
    assert_eq!(exempt.icms.deduction_reason, "9");
    assert_eq!(exempt.ipi.regime, Some(IpiRegime::NotTaxed));
    assert_eq!(exempt.ipi.cst, "53");
    assert_eq!(exempt.pis.regime, Some(ContributionRegime::Other));
    assert_eq!(exempt.cofins.cst, "49");

    let taxed = &invoice.items[4].taxes;
    assert_eq!(taxed.icms.regime, Some(IcmsRegime::Icms00));
    assert_eq!(taxed.icms.rate, dec!(12));
    assert_eq!(taxed.icms.value, dec!(6144.00));
    assert_eq!(taxed.ipi.regime, Some(IpiRegime::Taxed));
    assert_eq!(taxed.ipi.value, dec!(2560.00));
    assert_eq!(taxed.pis.regime, Some(ContributionRegime::Rate));
    assert_eq!(taxed.pis.value, dec!(844.80));
    assert_eq!(taxed.cofins.rate, dec!(7.60));
}

#[test]
fn signature_and_protocol_are_ignored() {
    let invoice = nfe::parse_invoice(PROC_WITH_LOTS).unwrap();
    // infProt carries its own dhRecbto/cStat; none of it leaks into the header.
    assert_eq!(invoice.header.issued_at, "2024-03-15T10:30:00-03:00");
    assert!(!invoice.header.additional_info.contains("Autorizado"));
}

#[test]
fn bare_root_with_cpf_recipient() {
    let xml = bare_nfe(&det(1, "A1", "1", "100.00"), "");
    let invoice = nfe::parse_invoice(&xml).unwrap();
    assert_eq!(invoice.header.number, "77");
    assert_eq!(invoice.recipient.tax_id, "12345678909");
    assert_eq!(invoice.items.len(), 1);
}

#[test]
fn byte_order_mark_is_accepted() {
    let xml = format!("\u{feff}{}", bare_nfe("", ""));
    assert!(nfe::parse_invoice(&xml).is_ok());
}

#[test]
fn missing_optional_sections_default() {
    let xml = r#"<NFe xmlns="http://www.portalfiscal.inf.br/nfe"><infNFe>
        <det nItem="1"><prod><cProd>X</cProd></prod></det>
    </infNFe></NFe>"#;
    let invoice = nfe::parse_invoice(xml).unwrap();
    assert_eq!(invoice.header, InvoiceHeader::default());
    assert_eq!(invoice.emitter, Party::default());
    assert_eq!(invoice.totals, InvoiceTotals::default());
    let item = &invoice.items[0];
    assert_eq!(item.quantity, Decimal::ZERO);
    assert_eq!(item.taxes, ItemTaxes::default());
}

#[test]
fn legacy_issue_date_is_used() {
    let xml = r#"<NFe xmlns="http://www.portalfiscal.inf.br/nfe"><infNFe>
        <ide><dEmi>2012-11-05</dEmi></ide>
    </infNFe></NFe>"#;
    let invoice = nfe::parse_invoice(xml).unwrap();
    assert_eq!(invoice.header.issued_at, "2012-11-05");
    assert_eq!(invoice.header.issue_date, NaiveDate::from_ymd_opt(2012, 11, 5));
    assert_eq!(invoice.header.issue_time, None);
}

#[test]
fn escaped_and_cdata_text() {
    let xml = r#"<NFe xmlns="http://www.portalfiscal.inf.br/nfe"><infNFe>
        <emit><xNome>A &amp; B LTDA</xNome></emit>
        <infAdic><infCpl><![CDATA[-1-LOTE: 9-3UN]]></infCpl></infAdic>
    </infNFe></NFe>"#;
    let invoice = nfe::parse_invoice(xml).unwrap();
    assert_eq!(invoice.emitter.name, "A & B LTDA");
    assert_eq!(invoice.header.additional_info, "-1-LOTE: 9-3UN");
}

#[test]
fn prefixed_namespace_is_resolved() {
    let xml = r#"<n:NFe xmlns:n="http://www.portalfiscal.inf.br/nfe"><n:infNFe>
        <n:ide><n:nNF>9</n:nNF></n:ide>
    </n:infNFe></n:NFe>"#;
    assert_eq!(nfe::parse_invoice(xml).unwrap().header.number, "9");
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn malformed_xml_is_reported() {
    for xml in [
        "<NFe xmlns=\"http://www.portalfiscal.inf.br/nfe\"><infNFe></NFe>",
        "<NFe xmlns=\"http://www.portalfiscal.inf.br/nfe\"><infNFe>",
        "this is not xml",
        "<a/><b/>",
    ] {
        let err = extract_rows(xml, &ExtractOptions::default()).unwrap_err();
        assert!(
            matches!(err, NfeError::MalformedDocument(_)),
            "{xml:?} gave {err:?}"
        );
    }
}

#[test]
fn wrong_root_or_namespace_is_missing_section() {
    let wrong_ns = r#"<NFe xmlns="urn:other"><infNFe/></NFe>"#;
    assert!(matches!(
        nfe::parse_invoice(wrong_ns),
        Err(NfeError::MissingRequiredSection(_))
    ));

    let other_root = r#"<cteProc xmlns="http://www.portalfiscal.inf.br/nfe"/>"#;
    assert!(matches!(
        nfe::parse_invoice(other_root),
        Err(NfeError::MissingRequiredSection(_))
    ));
}

#[test]
fn missing_info_block_is_missing_section() {
    let xml = r#"<NFe xmlns="http://www.portalfiscal.inf.br/nfe"><Signature/></NFe>"#;
    assert_eq!(
        nfe::parse_invoice(xml),
        Err(NfeError::MissingRequiredSection("infNFe".into()))
    );
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[test]
fn wrapped_invoice_rows_with_extras() {
    let rows = rows();
    // 5 items + 3 surplus lots; the lot for 100142397 has no item and is dropped.
    assert_eq!(rows.len(), 8);

    let summary: Vec<(String, &str, &str)> = rows
        .iter()
        .map(|r| (r.item_index.to_string(), r.product_code.as_str(), r.lot_number.as_str()))
        .collect();
    assert_eq!(
        summary,
        [
            ("1".to_string(), "100141432", "0052246201"),
            ("2".to_string(), "100141447", "0052132134"),
            ("3".to_string(), "100141447", "0052132136"),
            ("4".to_string(), "100141493", "0051890670"),
            ("5".to_string(), "100142227", "0051612259"),
            ("1_lote_extra".to_string(), "100141432", "0052246203"),
            ("2_lote_extra".to_string(), "100141447", "0052132139"),
            ("4_lote_extra".to_string(), "100141493", "0051924544"),
        ]
    );

    assert_eq!(rows[2].lot_quantity, Some(dec!(1300)));
    assert_eq!(rows[4].lot_quantity, Some(dec!(16000)));
    assert_eq!(rows[4].lot_unit, "TAM");
}

#[test]
fn extra_rows_do_not_double_count() {
    let rows = rows();
    let item_total: Decimal = rows.iter().map(|r| r.item_total).sum();
    let quantity: Decimal = rows.iter().map(|r| r.quantity).sum();
    assert_eq!(item_total, dec!(190400.00));
    assert_eq!(quantity, dec!(18760));

    for row in rows.iter().filter(|r| r.item_index.is_extra()) {
        assert_eq!(row.unit_value, Decimal::ZERO);
        assert_eq!(row.item_total, Decimal::ZERO);
        // Everything else is inherited from the source item.
        assert_eq!(row.invoice_number, "1234");
        assert!(!row.description.is_empty());
        assert_eq!(row.icms_regime, "ICMS40");
    }
}

#[test]
fn orphan_lot_emitted_when_configured() {
    let options = ExtractOptionsBuilder::new()
        .orphan_lots(OrphanLotPolicy::EmitBareRow)
        .build();
    let rows = extract_rows(PROC_WITH_LOTS, &options).unwrap();
    assert_eq!(rows.len(), 9);
    let orphan = rows.last().unwrap();
    assert_eq!(orphan.item_index, ItemIndex::Unmatched);
    assert_eq!(orphan.lot_product_code, "100142397");
    assert_eq!(orphan.lot_quantity, Some(dec!(700)));
    assert_eq!(orphan.supplier_name, "CARGILL AGRICOLA S A");
    assert_eq!(orphan.item_total, Decimal::ZERO);
}

#[test]
fn no_annotation_means_one_row_per_item() {
    let dets = [
        det(1, "A", "1", "10.00"),
        det(2, "B", "2", "20.00"),
        det(3, "A", "3", "30.00"),
    ]
    .concat();
    let xml = bare_nfe(&dets, "Documento emitido por ME ou EPP optante pelo Simples Nacional.");
    let rows = extract_rows(&xml, &ExtractOptions::default()).unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.lot_number.is_empty() && r.lot_quantity.is_none()));
}

#[test]
fn two_lots_one_item() {
    let xml = bare_nfe(
        &det(1, "100141432", "40", "100.00"),
        "-100141432-LOTE: 0052246201-32SAC, 0052246203-8SAC",
    );
    let rows = extract_rows(&xml, &ExtractOptions::default()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].quantity, dec!(40));
    assert_eq!(rows[0].item_total, dec!(100.00));
    assert_eq!(rows[0].lot_quantity, Some(dec!(32)));
    assert_eq!(rows[1].quantity, Decimal::ZERO);
    assert_eq!(rows[1].item_total, Decimal::ZERO);
    assert_eq!(rows[1].lot_number, "0052246203");
    assert_eq!(rows[1].item_index, ItemIndex::Extra("1".into()));
}

#[test]
fn reparsing_is_idempotent() {
    assert_eq!(rows(), rows());
}

#[test]
fn header_columns_repeat_on_every_row() {
    for row in rows() {
        assert_eq!(row.invoice_number, "1234");
        assert_eq!(row.recipient_name, "AVICOLA EXEMPLO LTDA");
        assert_eq!(row.supplier_tax_id, "60498706000161");
        assert_eq!(row.invoice_total, dec!(192960.00));
        assert_eq!(row.invoice_cfop, "5101");
    }
}

#[test]
fn display_row_uses_decimal_comma() {
    let rows = rows();
    let row = &rows[4];
    let display = row.display_cells();
    let col = |name: &str| {
        let pos = Row::COLUMNS.iter().position(|c| *c == name).unwrap();
        display[pos].clone()
    };
    assert_eq!(col("issue_date"), "2024-03-15");
    assert_eq!(col("issue_time"), "10:30:00");
    assert_eq!(col("unit_value"), "3,2000000000");
    assert_eq!(col("pis_value"), "844,80");
    assert_eq!(col("lot_quantity"), "16000");
    assert_eq!(row.cell("item_total"), Some(Cell::Number(dec!(51200.00))));
}

#[test]
fn display_snapshot_of_lot_columns() {
    let lines: Vec<String> = rows()
        .iter()
        .map(|r| {
            let d = r.display_cells();
            d[d.len() - 4..].join(";")
        })
        .collect();
    insta::assert_snapshot!(lines.join("\n"), @r"
    100141432;0052246201;32;SAC
    100141447;0052132134;500;SAC
    100141447;0052132136;1300;SAC
    100141493;0051890670;10;SAC
    100142227;0051612259;16000;TAM
    100141432;0052246203;8;SAC
    100141447;0052132139;900;SAC
    100141493;0051924544;10;SAC
    ");
}

#[test]
fn rows_serialize_to_json() {
    let rows = rows();
    let value = serde_json::to_value(&rows[5]).unwrap();
    assert_eq!(value["item_index"], "1_lote_extra");
    assert_eq!(value["lot_quantity"], "8");
    assert_eq!(value["item_total"], "0");
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

#[test]
fn batch_reports_each_document() {
    let good = bare_nfe(&det(1, "A", "1", "10.00"), "");
    let docs = vec![
        ("broken.xml", "<NFe><infNFe></NFe>".to_string()),
        ("good.xml", good),
        ("proc.xml", PROC_WITH_LOTS.to_string()),
    ];
    let outcomes = extract_batch(docs, &ExtractOptions::default());

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].source, "broken.xml");
    assert!(matches!(outcomes[0].error(), Some(NfeError::MalformedDocument(_))));
    assert!(outcomes[0].rows().is_empty());
    assert_eq!(outcomes[1].rows().len(), 1);
    assert_eq!(outcomes[2].rows().len(), 8);
    assert_eq!(successful_rows(&outcomes).len(), 9);
}
