/// Workbook manifest (`xl/workbook.xml`).
use std::io::Write;

use super::AssemblyContext;
use crate::common::xml::XmlWriter;
use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::namespace;

/// Write the workbook manifest: one `<sheet>` per sheet in creation order.
pub(super) fn write_workbook_xml<W: Write>(
    ctx: &AssemblyContext<'_>,
    xml: &mut XmlWriter<W>,
) -> Result<()> {
    let mut first = itoa::Buffer::new();
    let mut active = itoa::Buffer::new();

    xml.decl()?;
    xml.start(
        "workbook",
        &[
            ("xmlns", namespace::SML_MAIN),
            ("xmlns:r", namespace::OFC_RELATIONSHIPS),
        ],
    )?;
    xml.empty(
        "fileVersion",
        &[
            ("appName", "xl"),
            ("lastEdited", "4"),
            ("lowestEdited", "4"),
            ("rupBuild", "4505"),
        ],
    )?;
    xml.empty("workbookPr", &[("defaultThemeVersion", "124226")])?;

    let mut view: Vec<(&str, &str)> = vec![
        ("xWindow", "240"),
        ("yWindow", "15"),
        ("windowWidth", "16095"),
        ("windowHeight", "9660"),
    ];
    let first_sheet = ctx.first_sheet.map_or(0, |id| id.index());
    if first_sheet > 0 {
        view.push(("firstSheet", first.format(first_sheet)));
    }
    let active_tab = ctx.active.map_or(0, |id| id.index());
    if active_tab > 0 {
        view.push(("activeTab", active.format(active_tab)));
    }
    xml.start("bookViews", &[])?;
    xml.empty("workbookView", &view)?;
    xml.end("bookViews")?;

    xml.start("sheets", &[])?;
    let mut sheet_id = itoa::Buffer::new();
    for sheet in ctx.workbook.sheets() {
        let id = sheet_id.format(sheet.index() + 1);
        if sheet.is_hidden() {
            xml.empty(
                "sheet",
                &[
                    ("name", sheet.name()),
                    ("sheetId", id),
                    ("state", "hidden"),
                    ("r:id", sheet.workbook_r_id()),
                ],
            )?;
        } else {
            xml.empty(
                "sheet",
                &[
                    ("name", sheet.name()),
                    ("sheetId", id),
                    ("r:id", sheet.workbook_r_id()),
                ],
            )?;
        }
    }
    xml.end("sheets")?;

    xml.empty("calcPr", &[("calcId", "124519"), ("fullCalcOnLoad", "1")])?;
    xml.end("workbook")
}
