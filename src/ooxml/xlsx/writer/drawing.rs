//! Drawing parts (`xl/drawings/drawingN.xml`).
//!
//! A drawing holds one graphic frame per chart on its sheet. Worksheet charts are
//! anchored to a cell; the single chart of a chartsheet fills the tab.

use std::io::Write;

use super::AssemblyContext;
use crate::common::xml::XmlWriter;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::namespace;
use crate::ooxml::xlsx::chart::{ChartPlacement, EMU_PER_PIXEL};
use crate::ooxml::xlsx::sheet::{Sheet, SheetKind};

/// Size of a chartsheet's full-tab frame in EMUs.
const CHARTSHEET_EXTENT: (&str, &str) = ("9308969", "6078325");

pub(super) fn write_drawing_xml<W: Write>(
    ctx: &AssemblyContext<'_>,
    sheet: &Sheet,
    xml: &mut XmlWriter<W>,
) -> Result<()> {
    xml.decl()?;
    xml.start(
        "xdr:wsDr",
        &[
            ("xmlns:xdr", namespace::DML_SPREADSHEET_DRAWING),
            ("xmlns:a", namespace::DML_MAIN),
        ],
    )?;

    for (i, &chart_id) in sheet.charts().iter().enumerate() {
        let placement = ctx
            .workbook
            .chart(chart_id)
            .and_then(|chart| chart.placement.as_ref())
            .ok_or_else(|| {
                OoxmlError::DanglingReference(format!(
                    "drawing for sheet '{}' lists unplaced {}",
                    sheet.name(),
                    chart_id
                ))
            })?;

        match sheet.kind() {
            SheetKind::Chartsheet => {
                xml.start("xdr:absoluteAnchor", &[])?;
                xml.empty("xdr:pos", &[("x", "0"), ("y", "0")])?;
                xml.empty(
                    "xdr:ext",
                    &[("cx", CHARTSHEET_EXTENT.0), ("cy", CHARTSHEET_EXTENT.1)],
                )?;
                write_graphic_frame(i, placement, xml)?;
                xml.empty("xdr:clientData", &[])?;
                xml.end("xdr:absoluteAnchor")?;
            }
            SheetKind::Worksheet => {
                xml.start("xdr:oneCellAnchor", &[])?;
                write_from(placement, xml)?;
                let (cx, cy) = placement.options.extent_emu()?;
                let mut cx_buf = itoa::Buffer::new();
                let mut cy_buf = itoa::Buffer::new();
                xml.empty(
                    "xdr:ext",
                    &[("cx", cx_buf.format(cx)), ("cy", cy_buf.format(cy))],
                )?;
                write_graphic_frame(i, placement, xml)?;
                xml.empty("xdr:clientData", &[])?;
                xml.end("xdr:oneCellAnchor")?;
            }
        }
    }

    xml.end("xdr:wsDr")
}

fn write_from<W: Write>(placement: &ChartPlacement, xml: &mut XmlWriter<W>) -> Result<()> {
    let options = &placement.options;
    let mut buf = itoa::Buffer::new();

    xml.start("xdr:from", &[])?;
    xml.text_element("xdr:col", &[], buf.format(options.col))?;
    xml.text_element(
        "xdr:colOff",
        &[],
        buf.format(u64::from(options.x_offset) * u64::from(EMU_PER_PIXEL)),
    )?;
    xml.text_element("xdr:row", &[], buf.format(options.row))?;
    xml.text_element(
        "xdr:rowOff",
        &[],
        buf.format(u64::from(options.y_offset) * u64::from(EMU_PER_PIXEL)),
    )?;
    xml.end("xdr:from")
}

fn write_graphic_frame<W: Write>(
    index: usize,
    placement: &ChartPlacement,
    xml: &mut XmlWriter<W>,
) -> Result<()> {
    let mut id = itoa::Buffer::new();
    let name = format!("Chart {}", index + 1);

    xml.start("xdr:graphicFrame", &[("macro", "")])?;
    xml.start("xdr:nvGraphicFramePr", &[])?;
    xml.empty("xdr:cNvPr", &[("id", id.format(index + 2)), ("name", &name)])?;
    xml.start("xdr:cNvGraphicFramePr", &[])?;
    xml.empty("a:graphicFrameLocks", &[("noGrp", "1")])?;
    xml.end("xdr:cNvGraphicFramePr")?;
    xml.end("xdr:nvGraphicFramePr")?;

    xml.start("xdr:xfrm", &[])?;
    xml.empty("a:off", &[("x", "0"), ("y", "0")])?;
    xml.empty("a:ext", &[("cx", "0"), ("cy", "0")])?;
    xml.end("xdr:xfrm")?;

    xml.start("a:graphic", &[])?;
    xml.start("a:graphicData", &[("uri", namespace::DML_CHART)])?;
    xml.empty(
        "c:chart",
        &[
            ("xmlns:c", namespace::DML_CHART),
            ("xmlns:r", namespace::OFC_RELATIONSHIPS),
            ("r:id", &placement.r_id),
        ],
    )?;
    xml.end("a:graphicData")?;
    xml.end("a:graphic")?;
    xml.end("xdr:graphicFrame")
}
