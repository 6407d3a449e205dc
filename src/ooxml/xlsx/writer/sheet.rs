//! Worksheet and chartsheet parts.

use std::io::Write;

use super::{AssemblyContext, format_number};
use crate::common::xml::XmlWriter;
use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::namespace;
use crate::ooxml::xlsx::sheet::{Cell, Sheet, StoredValue, cell_ref};

const PAGE_MARGINS: [(&str, &str); 6] = [
    ("left", "0.7"),
    ("right", "0.7"),
    ("top", "0.75"),
    ("bottom", "0.75"),
    ("header", "0.3"),
    ("footer", "0.3"),
];

fn write_drawing_ref<W: Write>(sheet: &Sheet, xml: &mut XmlWriter<W>) -> Result<()> {
    if let Some(r_id) = sheet.drawing_r_id() {
        xml.empty("drawing", &[("r:id", r_id)])?;
    }
    Ok(())
}

/// Write `xl/worksheets/sheetN.xml`.
pub(super) fn write_worksheet_xml<W: Write>(
    ctx: &AssemblyContext<'_>,
    sheet: &Sheet,
    xml: &mut XmlWriter<W>,
) -> Result<()> {
    xml.decl()?;
    xml.start(
        "worksheet",
        &[
            ("xmlns", namespace::SML_MAIN),
            ("xmlns:r", namespace::OFC_RELATIONSHIPS),
        ],
    )?;
    xml.empty("dimension", &[("ref", &sheet.dimension())])?;

    xml.start("sheetViews", &[])?;
    if ctx.is_tab_selected(sheet) {
        xml.empty("sheetView", &[("tabSelected", "1"), ("workbookViewId", "0")])?;
    } else {
        xml.empty("sheetView", &[("workbookViewId", "0")])?;
    }
    xml.end("sheetViews")?;
    xml.empty("sheetFormatPr", &[("defaultRowHeight", "15")])?;

    if sheet.cells.is_empty() {
        xml.empty("sheetData", &[])?;
    } else {
        let mut row_num = itoa::Buffer::new();
        xml.start("sheetData", &[])?;
        for (&row, cells) in &sheet.cells {
            xml.start("row", &[("r", row_num.format(row + 1))])?;
            for (&col, cell) in cells {
                write_cell(&cell_ref(row, col), cell, xml)?;
            }
            xml.end("row")?;
        }
        xml.end("sheetData")?;
    }

    xml.empty("pageMargins", &PAGE_MARGINS)?;
    write_drawing_ref(sheet, xml)?;
    xml.end("worksheet")
}

fn write_cell<W: Write>(r: &str, cell: &Cell, xml: &mut XmlWriter<W>) -> Result<()> {
    let mut style_buf = itoa::Buffer::new();
    let mut attrs: Vec<(&str, &str)> = Vec::with_capacity(3);
    attrs.push(("r", r));
    if let Some(style) = cell.style.filter(|&s| s != 0) {
        attrs.push(("s", style_buf.format(style)));
    }

    match &cell.value {
        StoredValue::Number(n) => {
            xml.start("c", &attrs)?;
            xml.text_element("v", &[], &format_number(*n))?;
        }
        StoredValue::SharedString(idx) => {
            attrs.push(("t", "s"));
            xml.start("c", &attrs)?;
            let mut buf = itoa::Buffer::new();
            xml.text_element("v", &[], buf.format(*idx))?;
        }
        StoredValue::Boolean(b) => {
            attrs.push(("t", "b"));
            xml.start("c", &attrs)?;
            xml.text_element("v", &[], if *b { "1" } else { "0" })?;
        }
        StoredValue::Formula(f) => {
            xml.start("c", &attrs)?;
            xml.text_element("f", &[], f)?;
            xml.text_element("v", &[], "0")?;
        }
        StoredValue::Blank => return xml.empty("c", &attrs),
    }
    xml.end("c")
}

/// Write `xl/chartsheets/sheetN.xml`.
///
/// The `<drawing>` element is present only once a chart is attached.
pub(super) fn write_chartsheet_xml<W: Write>(
    ctx: &AssemblyContext<'_>,
    sheet: &Sheet,
    xml: &mut XmlWriter<W>,
) -> Result<()> {
    xml.decl()?;
    xml.start(
        "chartsheet",
        &[
            ("xmlns", namespace::SML_MAIN),
            ("xmlns:r", namespace::OFC_RELATIONSHIPS),
        ],
    )?;
    xml.empty("sheetPr", &[])?;

    xml.start("sheetViews", &[])?;
    if ctx.is_tab_selected(sheet) {
        xml.empty(
            "sheetView",
            &[("tabSelected", "1"), ("zoomToFit", "1"), ("workbookViewId", "0")],
        )?;
    } else {
        xml.empty("sheetView", &[("zoomToFit", "1"), ("workbookViewId", "0")])?;
    }
    xml.end("sheetViews")?;

    xml.empty("pageMargins", &PAGE_MARGINS)?;
    write_drawing_ref(sheet, xml)?;
    xml.end("chartsheet")
}
