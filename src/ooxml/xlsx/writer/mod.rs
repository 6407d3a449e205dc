//! Part assembly for XLSX packages.
//!
//! Each assembler reads the frozen model and the sealed relationship tables and renders
//! one part into its own buffer. Nothing here mutates the workbook, so sheet parts can
//! be rendered on the rayon pool and then laid out again in creation order.

mod chart;
mod drawing;
mod sheet;
mod workbook;

use std::collections::BTreeSet;
use std::io::{BufWriter, Write};

use rayon::prelude::*;

use crate::common::xml::XmlWriter;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::packuri::{PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::{Part, PartBuffer};
use crate::ooxml::opc::rel::RelationshipManager;
use crate::ooxml::xlsx::sheet::{Sheet, SheetId, SheetKind};
use crate::ooxml::xlsx::workbook::{
    APP_PROPS_PARTNAME, CORE_PROPS_PARTNAME, SHARED_STRINGS_PARTNAME, STYLES_PARTNAME,
    WORKBOOK_PARTNAME, Workbook,
};

/// Read-only view shared by every assembler.
pub(crate) struct AssemblyContext<'a> {
    pub(crate) workbook: &'a Workbook,
    pub(crate) rels: &'a RelationshipManager,
    pub(crate) active: Option<SheetId>,
    pub(crate) first_sheet: Option<SheetId>,
}

impl AssemblyContext<'_> {
    /// Render one part through a buffered XML writer.
    fn render<F>(&self, partname: PackURI, content_type: &'static str, f: F) -> Result<Part>
    where
        F: FnOnce(&mut XmlWriter<BufWriter<PartBuffer>>) -> Result<()>,
    {
        let options = self.workbook.options();
        let buffer = PartBuffer::new(options.spill_threshold, options.tmpdir.clone());
        let mut xml = XmlWriter::new(BufWriter::new(buffer));
        f(&mut xml)?;

        let mut out = xml.into_inner();
        out.flush()?;
        let data = out.into_inner().map_err(|err| err.into_error())?;
        Ok(Part::new(partname, content_type, data))
    }

    /// Render the `.rels` part for `owner`, if it has relationships.
    fn render_rels(&self, owner: &PackURI) -> Result<Option<Part>> {
        match self.rels.table(owner) {
            Some(table) if !table.is_empty() => {
                let part = self.render(owner.rels_uri(), ct::OPC_RELATIONSHIPS, |xml| {
                    table.write_xml(xml)
                })?;
                Ok(Some(part))
            }
            _ => Ok(None),
        }
    }

    fn is_tab_selected(&self, sheet: &Sheet) -> bool {
        sheet.is_selected() || self.active == Some(sheet.id())
    }
}

/// Assemble every part of the package in archive order.
///
/// The order is the package relationships, document properties, the workbook and its
/// relationships, styles, shared strings, and then for each sheet in creation order
/// the sheet, its relationships, its drawing and the drawing's charts.
pub(crate) fn assemble(workbook: &Workbook, rels: &RelationshipManager) -> Result<Vec<Part>> {
    let ctx = AssemblyContext {
        workbook,
        rels,
        active: workbook.active_sheet(),
        first_sheet: workbook.first_sheet(),
    };

    let mut parts = Vec::new();
    let package = PackURI::from_abs(PACKAGE_URI.to_string());
    parts.extend(ctx.render_rels(&package)?);

    let (worksheets, chartsheets): (Vec<&Sheet>, Vec<&Sheet>) = workbook
        .sheets()
        .iter()
        .partition(|s| s.kind() == SheetKind::Worksheet);
    let worksheet_names: Vec<&str> = worksheets.iter().map(|s| s.name()).collect();
    let chartsheet_names: Vec<&str> = chartsheets.iter().map(|s| s.name()).collect();
    parts.push(ctx.render(
        PackURI::from_abs(APP_PROPS_PARTNAME.to_string()),
        ct::OFC_EXTENDED_PROPERTIES,
        |xml| {
            workbook
                .properties()
                .write_app_xml(xml, &worksheet_names, &chartsheet_names)
        },
    )?);
    parts.push(ctx.render(
        PackURI::from_abs(CORE_PROPS_PARTNAME.to_string()),
        ct::OPC_CORE_PROPERTIES,
        |xml| workbook.properties().write_core_xml(xml),
    )?);

    let workbook_uri = PackURI::from_abs(WORKBOOK_PARTNAME.to_string());
    parts.push(ctx.render(workbook_uri.clone(), ct::SML_SHEET_MAIN, |xml| {
        workbook::write_workbook_xml(&ctx, xml)
    })?);
    parts.extend(ctx.render_rels(&workbook_uri)?);

    parts.push(ctx.render(
        PackURI::from_abs(STYLES_PARTNAME.to_string()),
        ct::SML_STYLES,
        |xml| workbook.styles().write_xml(xml),
    )?);
    if !workbook.shared_strings().is_empty() {
        parts.push(ctx.render(
            PackURI::from_abs(SHARED_STRINGS_PARTNAME.to_string()),
            ct::SML_SHARED_STRINGS,
            |xml| workbook.shared_strings().write_xml(xml),
        )?);
    }

    let sheet_parts: Vec<Vec<Part>> = if workbook.options().parallel {
        workbook
            .sheets()
            .par_iter()
            .map(|sheet| assemble_sheet(&ctx, sheet))
            .collect::<Result<_>>()?
    } else {
        workbook
            .sheets()
            .iter()
            .map(|sheet| assemble_sheet(&ctx, sheet))
            .collect::<Result<_>>()?
    };
    parts.extend(sheet_parts.into_iter().flatten());

    check_references(&parts, rels)?;
    tracing::debug!(parts = parts.len(), parallel = workbook.options().parallel, "parts assembled");
    Ok(parts)
}

/// Render one sheet and everything hanging off it.
fn assemble_sheet(ctx: &AssemblyContext<'_>, sheet: &Sheet) -> Result<Vec<Part>> {
    let _span = tracing::debug_span!("assemble_sheet", name = sheet.name()).entered();

    let mut parts = Vec::with_capacity(3 + sheet.charts().len());
    parts.push(ctx.render(
        sheet.partname().clone(),
        sheet.kind().content_type(),
        |xml| match sheet.kind() {
            SheetKind::Worksheet => sheet::write_worksheet_xml(ctx, sheet, xml),
            SheetKind::Chartsheet => sheet::write_chartsheet_xml(ctx, sheet, xml),
        },
    )?);
    parts.extend(ctx.render_rels(sheet.partname())?);

    if let Some(drawing) = &sheet.drawing {
        parts.push(ctx.render(drawing.partname.clone(), ct::DML_DRAWING, |xml| {
            drawing::write_drawing_xml(ctx, sheet, xml)
        })?);
        parts.extend(ctx.render_rels(&drawing.partname)?);

        for &chart_id in sheet.charts() {
            let Some(chart) = ctx.workbook.chart(chart_id) else {
                return Err(OoxmlError::DanglingReference(format!(
                    "sheet '{}' lists missing {}",
                    sheet.name(),
                    chart_id
                )));
            };
            let Some(placement) = &chart.placement else {
                return Err(OoxmlError::DanglingReference(format!(
                    "{} on sheet '{}' has no part",
                    chart_id,
                    sheet.name()
                )));
            };
            parts.push(ctx.render(placement.partname.clone(), ct::DML_CHART, |xml| {
                chart::write_chart_xml(chart, xml)
            })?);
        }
    }
    Ok(parts)
}

/// Fail if any internal relationship targets a part that was not assembled.
fn check_references(parts: &[Part], rels: &RelationshipManager) -> Result<()> {
    let emitted: BTreeSet<&PackURI> = parts.iter().map(Part::partname).collect();
    for (owner, table) in rels.iter() {
        if owner.as_str() != PACKAGE_URI && !emitted.contains(owner) {
            return Err(OoxmlError::DanglingReference(format!(
                "relationships owned by missing part {}",
                owner
            )));
        }
        for rel in table.iter() {
            if let Some(target) = rel.target_partname().filter(|t| !emitted.contains(*t)) {
                return Err(OoxmlError::DanglingReference(format!(
                    "{} {} points at missing part {}",
                    owner,
                    rel.r_id(),
                    target
                )));
            }
        }
    }
    Ok(())
}

/// Write a number the way SpreadsheetML expects: integers without a fraction,
/// everything else in shortest round-trip form.
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        let mut buf = itoa::Buffer::new();
        buf.format(value as i64).to_string()
    } else {
        let mut buf = ryu::Buffer::new();
        buf.format_finite(value).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(-42.0), "-42");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(0.1), "0.1");
        assert_eq!(format_number(1e20), "1e20");
    }

    #[test]
    fn test_dangling_reference_is_reported() {
        let mut rels = RelationshipManager::new();
        let sheet = PackURI::new("/xl/worksheets/sheet1.xml").unwrap();
        rels.attach(&sheet, &PackURI::new("/xl/drawings/drawing1.xml").unwrap(), "t")
            .unwrap();
        let parts = vec![Part::new(sheet, ct::SML_WORKSHEET, PartBuffer::in_memory())];

        let err = check_references(&parts, &rels).unwrap_err();
        assert!(matches!(err, OoxmlError::DanglingReference(_)));
        assert!(err.to_string().contains("/xl/drawings/drawing1.xml"));
    }
}
