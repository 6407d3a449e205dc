//! Excel workbook model and close pipeline.
//!
//! The workbook owns every sheet and chart by value and hands out [`SheetId`] and
//! [`ChartId`] handles. The active and first-visible sheet are workbook fields; sheets
//! never reference each other. Relationships are registered as the model is built, so
//! the ids returned during population are the ids that end up in the archive.

use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use crate::common::xml::validate_xml_text;
use crate::ooxml::common::DocumentProperties;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::packuri::{PACKAGE_URI, PackURI};
use crate::ooxml::opc::phys_pkg::write_atomically;
use crate::ooxml::opc::pkgwriter::PackageWriter;
use crate::ooxml::opc::rel::RelationshipManager;
use crate::ooxml::xlsx::chart::{Chart, ChartId, ChartOptions, ChartPlacement, ChartType};
use crate::ooxml::xlsx::options::WorkbookOptions;
use crate::ooxml::xlsx::sheet::{
    Cell, CellValue, DrawingRef, MAX_COLS, MAX_ROWS, Sheet, SheetId, SheetKind, StoredValue,
    validate_sheet_name,
};
use crate::ooxml::xlsx::strings::SharedStrings;
use crate::ooxml::xlsx::styles::{Format, StyleRegistry};
use crate::ooxml::xlsx::writer;

/// Where a workbook is in its one-shot life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Accepting mutations
    Populating,
    /// `close` is running; the model is frozen
    Assembling,
    /// The archive was written
    Closed,
}

pub(crate) const WORKBOOK_PARTNAME: &str = "/xl/workbook.xml";
pub(crate) const STYLES_PARTNAME: &str = "/xl/styles.xml";
pub(crate) const SHARED_STRINGS_PARTNAME: &str = "/xl/sharedStrings.xml";
pub(crate) const CORE_PROPS_PARTNAME: &str = "/docProps/core.xml";
pub(crate) const APP_PROPS_PARTNAME: &str = "/docProps/app.xml";

/// An XLSX workbook being built.
///
/// # Examples
///
/// ```rust,no_run
/// use litchi_writer::{ChartOptions, ChartSeries, ChartType, Workbook};
///
/// let mut workbook = Workbook::new("report.xlsx");
/// let data = workbook.add_worksheet(Some("Data"))?;
/// for row in 0..5 {
///     workbook.write_cell(data, row, 0, (row as f64) * 10.0, None)?;
/// }
///
/// let chart = workbook.add_chart(ChartType::Column)?;
/// let values = workbook.sheet(data).unwrap().range_ref(0, 0, 4, 0);
/// workbook.chart_mut(chart)?.add_series(ChartSeries::new(values));
///
/// let chartsheet = workbook.add_chartsheet(None)?;
/// workbook.attach_chart(chartsheet, chart, ChartOptions::default())?;
/// workbook.set_active(chartsheet)?;
/// workbook.close()?;
/// # Ok::<(), litchi_writer::OoxmlError>(())
/// ```
#[derive(Debug)]
pub struct Workbook {
    path: PathBuf,
    options: WorkbookOptions,
    sheets: Vec<Sheet>,
    charts: Vec<Chart>,
    shared_strings: SharedStrings,
    styles: StyleRegistry,
    properties: DocumentProperties,
    relationships: RelationshipManager,
    active: Option<SheetId>,
    first_sheet: Option<SheetId>,
    drawing_count: usize,
    chart_part_count: usize,
    state: Lifecycle,
}

impl Workbook {
    /// Create an empty workbook that [`close`](Self::close) will write to `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_options(path, WorkbookOptions::default())
    }

    /// Create an empty workbook with explicit options.
    pub fn with_options(path: impl AsRef<Path>, options: WorkbookOptions) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            options,
            sheets: Vec::new(),
            charts: Vec::new(),
            shared_strings: SharedStrings::new(),
            styles: StyleRegistry::new(),
            properties: DocumentProperties::default(),
            relationships: RelationshipManager::new(),
            active: None,
            first_sheet: None,
            drawing_count: 0,
            chart_part_count: 0,
            state: Lifecycle::Populating,
        }
    }

    fn ensure_populating(&self, action: &str) -> Result<()> {
        match self.state {
            Lifecycle::Populating => Ok(()),
            state => Err(OoxmlError::LifecycleViolation(format!(
                "cannot {} while the workbook is {:?}",
                action, state
            ))),
        }
    }

    fn sheet_index(&self, id: SheetId) -> Result<usize> {
        if id.0 < self.sheets.len() {
            Ok(id.0)
        } else {
            Err(OoxmlError::InvalidState(format!("unknown sheet {}", id)))
        }
    }

    fn visible_sheet(&self, id: SheetId, action: &str) -> Result<usize> {
        let idx = self.sheet_index(id)?;
        if self.sheets[idx].hidden {
            return Err(OoxmlError::InvalidState(format!(
                "cannot {} hidden sheet '{}'",
                action, self.sheets[idx].name()
            )));
        }
        Ok(idx)
    }

    fn first_visible_except(&self, skip: Option<usize>) -> Option<SheetId> {
        self.sheets
            .iter()
            .find(|s| !s.hidden && Some(s.index()) != skip)
            .map(Sheet::id)
    }

    /// Add a sheet with the given name and kind.
    ///
    /// Names are checked for length and characters and must be unique ignoring case.
    pub fn add_sheet(&mut self, name: &str, kind: SheetKind) -> Result<SheetId> {
        self.ensure_populating("add a sheet")?;
        validate_sheet_name(name)?;
        if self.sheet_by_name(name).is_some() {
            return Err(OoxmlError::DuplicateName(name.to_string()));
        }

        let index = self.sheets.len();
        let partname = kind.partname(index);
        let workbook = PackURI::from_abs(WORKBOOK_PARTNAME.to_string());
        let r_id = self.relationships.attach(&workbook, &partname, kind.reltype())?;

        self.sheets
            .push(Sheet::new(name.to_string(), index, kind, r_id));
        tracing::debug!(name, index, ?kind, "sheet added");
        Ok(SheetId(index))
    }

    fn default_name(&self, kind: SheetKind) -> String {
        let count = self.sheets.iter().filter(|s| s.kind() == kind).count() + 1;
        let mut buf = itoa::Buffer::new();
        match kind {
            SheetKind::Worksheet => format!("Sheet{}", buf.format(count)),
            SheetKind::Chartsheet => format!("Chart{}", buf.format(count)),
        }
    }

    /// Add a worksheet, named `SheetN` when no name is given.
    pub fn add_worksheet(&mut self, name: Option<&str>) -> Result<SheetId> {
        match name {
            Some(name) => self.add_sheet(name, SheetKind::Worksheet),
            None => {
                let name = self.default_name(SheetKind::Worksheet);
                self.add_sheet(&name, SheetKind::Worksheet)
            }
        }
    }

    /// Add a chartsheet, named `ChartN` when no name is given.
    pub fn add_chartsheet(&mut self, name: Option<&str>) -> Result<SheetId> {
        match name {
            Some(name) => self.add_sheet(name, SheetKind::Chartsheet),
            None => {
                let name = self.default_name(SheetKind::Chartsheet);
                self.add_sheet(&name, SheetKind::Chartsheet)
            }
        }
    }

    /// Make `id` the active sheet. The active sheet is also selected.
    ///
    /// Fails with [`OoxmlError::InvalidState`] if the sheet is hidden.
    pub fn set_active(&mut self, id: SheetId) -> Result<()> {
        self.ensure_populating("activate a sheet")?;
        let idx = self.visible_sheet(id, "activate")?;
        if let Some(previous) = self.active.filter(|&prev| prev != id) {
            self.sheets[previous.0].selected = false;
        }
        self.sheets[idx].selected = true;
        self.active = Some(id);
        Ok(())
    }

    /// Mark a sheet's tab as selected without making it active.
    pub fn select(&mut self, id: SheetId) -> Result<()> {
        self.ensure_populating("select a sheet")?;
        let idx = self.visible_sheet(id, "select")?;
        self.sheets[idx].selected = true;
        Ok(())
    }

    /// Make `id` the first tab shown in the tab bar.
    pub fn set_first_sheet(&mut self, id: SheetId) -> Result<()> {
        self.ensure_populating("set the first sheet")?;
        self.visible_sheet(id, "scroll to")?;
        self.first_sheet = Some(id);
        Ok(())
    }

    /// Hide a sheet.
    ///
    /// A hidden sheet loses its selection. If it was the active or first sheet, that
    /// role moves to the first sheet that is still visible. Hiding the last visible
    /// sheet fails and changes nothing.
    pub fn hide(&mut self, id: SheetId) -> Result<()> {
        self.ensure_populating("hide a sheet")?;
        let idx = self.sheet_index(id)?;
        if self.sheets[idx].hidden {
            return Ok(());
        }
        let Some(fallback) = self.first_visible_except(Some(idx)) else {
            return Err(OoxmlError::InvalidState(format!(
                "cannot hide '{}', the only visible sheet",
                self.sheets[idx].name()
            )));
        };

        let sheet = &mut self.sheets[idx];
        sheet.hidden = true;
        sheet.selected = false;
        if self.active == Some(id) {
            self.active = Some(fallback);
            self.sheets[fallback.0].selected = true;
            tracing::debug!(from = %id, to = %fallback, "active sheet reassigned");
        }
        if self.first_sheet == Some(id) {
            self.first_sheet = Some(fallback);
        }
        Ok(())
    }

    /// Create a chart in the arena. It is written only once attached to a sheet.
    pub fn add_chart(&mut self, chart_type: ChartType) -> Result<ChartId> {
        self.ensure_populating("add a chart")?;
        let id = ChartId(self.charts.len());
        self.charts.push(Chart::new(id, chart_type));
        Ok(id)
    }

    /// Get a chart for configuration.
    pub fn chart_mut(&mut self, id: ChartId) -> Result<&mut Chart> {
        self.ensure_populating("modify a chart")?;
        self.charts
            .get_mut(id.0)
            .ok_or_else(|| OoxmlError::InvalidState(format!("unknown chart {}", id)))
    }

    /// Attach a chart to a sheet and return the chart's relationship id in the
    /// sheet's drawing.
    ///
    /// The first chart on a sheet also creates the sheet's drawing part and the
    /// sheet → drawing relationship. Chart ids within a drawing are `rId1, rId2, …`
    /// in attachment order.
    pub fn attach_chart(
        &mut self,
        sheet: SheetId,
        chart: ChartId,
        options: ChartOptions,
    ) -> Result<String> {
        self.ensure_populating("attach a chart")?;
        let sheet_idx = self.sheet_index(sheet)?;
        let chart_entry = self
            .charts
            .get(chart.0)
            .ok_or_else(|| OoxmlError::InvalidState(format!("unknown chart {}", chart)))?;

        if let Some(owner) = chart_entry.owner() {
            return Err(OoxmlError::ChartAlreadyAttached {
                chart,
                sheet: self.sheets[owner.0].name().to_string(),
            });
        }
        if chart_entry.series().is_empty() {
            return Err(OoxmlError::InvalidState(format!(
                "{} has no data series",
                chart
            )));
        }
        let target = &self.sheets[sheet_idx];
        if target.kind() == SheetKind::Chartsheet && !target.charts.is_empty() {
            return Err(OoxmlError::InvalidState(format!(
                "chartsheet '{}' already holds a chart",
                target.name()
            )));
        }
        options.validate()?;

        let target = &mut self.sheets[sheet_idx];
        let drawing = match &target.drawing {
            Some(drawing) => drawing.partname.clone(),
            None => {
                let number = self.drawing_count + 1;
                let partname = PackURI::from_abs(format!("/xl/drawings/drawing{}.xml", number));
                let r_id = self
                    .relationships
                    .attach(target.partname(), &partname, rt::DRAWING)?;
                target.rel_count += 1;
                target.drawing = Some(DrawingRef {
                    number,
                    partname: partname.clone(),
                    r_id,
                });
                self.drawing_count = number;
                partname
            }
        };

        let number = self.chart_part_count + 1;
        let partname = PackURI::from_abs(format!("/xl/charts/chart{}.xml", number));
        let r_id = self.relationships.attach(&drawing, &partname, rt::CHART)?;
        self.chart_part_count = number;
        target.charts.push(chart);
        self.charts[chart.0].placement = Some(ChartPlacement {
            sheet,
            options,
            number,
            partname,
            r_id: r_id.clone(),
        });

        tracing::debug!(%chart, sheet = target.name(), %r_id, "chart attached");
        Ok(r_id)
    }

    /// Add a string to the shared string table and return its index.
    pub fn intern_string(&mut self, s: &str) -> Result<u32> {
        self.ensure_populating("add a shared string")?;
        validate_xml_text(s)?;
        self.shared_strings.intern(s)
    }

    /// Register a cell format and return its style index.
    pub fn add_format(&mut self, format: &Format) -> Result<u32> {
        self.ensure_populating("add a format")?;
        for text in [&format.font_name, &format.num_format].into_iter().flatten() {
            validate_xml_text(text)?;
        }
        Ok(self.styles.add(format))
    }

    /// Store a value in a worksheet cell (zero-based row and column).
    ///
    /// `format` is a style index returned by [`add_format`](Self::add_format).
    pub fn write_cell(
        &mut self,
        sheet: SheetId,
        row: u32,
        col: u16,
        value: impl Into<CellValue>,
        format: Option<u32>,
    ) -> Result<()> {
        self.ensure_populating("write a cell")?;
        let idx = self.sheet_index(sheet)?;
        if self.sheets[idx].kind() != SheetKind::Worksheet {
            return Err(OoxmlError::InvalidState(format!(
                "'{}' is a chartsheet and has no cells",
                self.sheets[idx].name()
            )));
        }
        if row >= MAX_ROWS || col >= MAX_COLS {
            return Err(OoxmlError::InvalidState(format!(
                "cell ({}, {}) is outside the worksheet",
                row, col
            )));
        }
        if let Some(style) = format.filter(|&s| s as usize >= self.styles.len()) {
            return Err(OoxmlError::InvalidState(format!("unknown format {}", style)));
        }

        let value = match value.into() {
            CellValue::Number(n) if !n.is_finite() => {
                return Err(OoxmlError::InvalidState(format!(
                    "cell value {} is not a finite number",
                    n
                )));
            }
            CellValue::Number(n) => StoredValue::Number(n),
            CellValue::Boolean(b) => StoredValue::Boolean(b),
            CellValue::Blank => StoredValue::Blank,
            CellValue::Formula(f) => {
                validate_xml_text(&f)?;
                let f = f.strip_prefix('=').map(str::to_string).unwrap_or(f);
                StoredValue::Formula(f)
            }
            CellValue::String(s) => {
                validate_xml_text(&s)?;
                StoredValue::SharedString(self.shared_strings.intern(&s)?)
            }
        };

        self.sheets[idx].set_cell(row, col, Cell { value, style: format });
        Ok(())
    }

    /// Document properties written to `docProps/`.
    pub fn properties_mut(&mut self) -> Result<&mut DocumentProperties> {
        self.ensure_populating("change document properties")?;
        Ok(&mut self.properties)
    }

    /// Replace the document properties.
    pub fn set_properties(&mut self, properties: DocumentProperties) -> Result<()> {
        *self.properties_mut()? = properties;
        Ok(())
    }

    #[inline]
    pub fn properties(&self) -> &DocumentProperties {
        &self.properties
    }

    #[inline]
    pub fn sheet(&self, id: SheetId) -> Option<&Sheet> {
        self.sheets.get(id.0)
    }

    /// Look a sheet up by name, ignoring case.
    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        let lowered = name.to_lowercase();
        self.sheets.iter().find(|s| s.name().to_lowercase() == lowered)
    }

    /// All sheets in creation order.
    #[inline]
    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    #[inline]
    pub fn chart(&self, id: ChartId) -> Option<&Chart> {
        self.charts.get(id.0)
    }

    #[inline]
    pub fn charts(&self) -> &[Chart] {
        &self.charts
    }

    #[inline]
    pub fn shared_strings(&self) -> &SharedStrings {
        &self.shared_strings
    }

    #[inline]
    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    #[inline]
    pub fn relationships(&self) -> &RelationshipManager {
        &self.relationships
    }

    #[inline]
    pub fn options(&self) -> &WorkbookOptions {
        &self.options
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn state(&self) -> Lifecycle {
        self.state
    }

    /// The sheet that opens active: the one set explicitly, otherwise the first
    /// visible sheet.
    pub fn active_sheet(&self) -> Option<SheetId> {
        self.active.or_else(|| self.first_visible_except(None))
    }

    /// The first tab shown: the one set explicitly, otherwise the first visible sheet.
    pub fn first_sheet(&self) -> Option<SheetId> {
        self.first_sheet.or_else(|| self.first_visible_except(None))
    }

    /// Freeze the model and build the close-time relationship tables.
    ///
    /// Package and workbook-level relationships are added to a copy so that a failed
    /// close leaves the population-time tables untouched.
    fn begin_close(&mut self) -> Result<RelationshipManager> {
        self.ensure_populating("close the workbook")?;
        if self.sheets.is_empty() {
            return Err(OoxmlError::InvalidState(
                "a workbook needs at least one sheet".to_string(),
            ));
        }
        self.state = Lifecycle::Assembling;

        let mut rels = self.relationships.clone();
        if let Err(err) = self.finalize_relationships(&mut rels) {
            self.state = Lifecycle::Populating;
            return Err(err);
        }
        rels.seal();
        Ok(rels)
    }

    fn finalize_relationships(&self, rels: &mut RelationshipManager) -> Result<()> {
        let package = PackURI::from_abs(PACKAGE_URI.to_string());
        let workbook = PackURI::from_abs(WORKBOOK_PARTNAME.to_string());
        rels.attach(&package, &workbook, rt::OFFICE_DOCUMENT)?;
        rels.attach(
            &package,
            &PackURI::from_abs(CORE_PROPS_PARTNAME.to_string()),
            rt::CORE_PROPERTIES,
        )?;
        rels.attach(
            &package,
            &PackURI::from_abs(APP_PROPS_PARTNAME.to_string()),
            rt::EXTENDED_PROPERTIES,
        )?;

        rels.attach(
            &workbook,
            &PackURI::from_abs(STYLES_PARTNAME.to_string()),
            rt::STYLES,
        )?;
        if !self.shared_strings.is_empty() {
            rels.attach(
                &workbook,
                &PackURI::from_abs(SHARED_STRINGS_PARTNAME.to_string()),
                rt::SHARED_STRINGS,
            )?;
        }
        Ok(())
    }

    fn finish_close<T>(&mut self, rels: RelationshipManager, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.relationships = rels;
                self.state = Lifecycle::Closed;
                tracing::info!(sheets = self.sheets.len(), charts = self.chart_part_count, "workbook closed");
                Ok(value)
            }
            Err(err) => {
                self.state = Lifecycle::Populating;
                tracing::warn!(error = %err, "workbook close failed");
                Err(err)
            }
        }
    }

    /// Assemble every part and write the archive to the workbook's path.
    ///
    /// The archive is written beside the target and renamed into place only once it
    /// is complete; on failure the target is left as it was and the workbook can be
    /// corrected and closed again.
    pub fn close(&mut self) -> Result<()> {
        let span = tracing::info_span!("close", path = %self.path.display());
        let _enter = span.enter();

        let rels = self.begin_close()?;
        let result = writer::assemble(self, &rels).and_then(|mut parts| {
            let archive = self.options.archive();
            write_atomically(&self.path, |out| {
                PackageWriter::write_to(out, &mut parts, archive).map(drop)
            })
        });
        self.finish_close(rels, result)
    }

    /// Assemble every part and write the archive to `writer` instead of the path.
    pub fn close_to_writer<W: Write + Seek>(&mut self, out: W) -> Result<W> {
        let span = tracing::info_span!("close_to_writer");
        let _enter = span.enter();

        let rels = self.begin_close()?;
        let result = writer::assemble(self, &rels).and_then(|mut parts| {
            PackageWriter::write_to(out, &mut parts, self.options.archive())
        });
        self.finish_close(rels, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xlsx::chart::ChartSeries;

    fn chart_with_series(wb: &mut Workbook) -> ChartId {
        let chart = wb.add_chart(ChartType::Line).unwrap();
        wb.chart_mut(chart)
            .unwrap()
            .add_series(ChartSeries::new("Sheet1!$A$1:$A$3"));
        chart
    }

    #[test]
    fn test_default_names() {
        let mut wb = Workbook::new("unused.xlsx");
        let a = wb.add_worksheet(None).unwrap();
        let b = wb.add_chartsheet(None).unwrap();
        let c = wb.add_worksheet(None).unwrap();
        assert_eq!(wb.sheet(a).unwrap().name(), "Sheet1");
        assert_eq!(wb.sheet(b).unwrap().name(), "Chart1");
        assert_eq!(wb.sheet(c).unwrap().name(), "Sheet2");
        assert_eq!(wb.sheet(c).unwrap().index(), 2);
        assert_eq!(wb.sheet(b).unwrap().workbook_r_id(), "rId2");
    }

    #[test]
    fn test_duplicate_names_are_case_insensitive() {
        let mut wb = Workbook::new("unused.xlsx");
        wb.add_worksheet(Some("Data")).unwrap();
        let err = wb.add_chartsheet(Some("DATA")).unwrap_err();
        assert!(matches!(err, OoxmlError::DuplicateName(_)));
        assert_eq!(wb.sheets().len(), 1);
        assert_eq!(wb.relationships().rel_count(&PackURI::new(WORKBOOK_PARTNAME).unwrap()), 1);
    }

    #[test]
    fn test_single_active_sheet() {
        let mut wb = Workbook::new("unused.xlsx");
        let a = wb.add_worksheet(None).unwrap();
        let b = wb.add_worksheet(None).unwrap();
        let c = wb.add_worksheet(None).unwrap();
        assert_eq!(wb.active_sheet(), Some(a));

        wb.set_active(b).unwrap();
        wb.set_active(c).unwrap();
        assert_eq!(wb.active_sheet(), Some(c));
        assert!(!wb.sheet(b).unwrap().is_selected());
        assert!(wb.sheet(c).unwrap().is_selected());

        wb.hide(a).unwrap();
        let err = wb.set_active(a).unwrap_err();
        assert!(matches!(err, OoxmlError::InvalidState(_)));
        assert_eq!(wb.active_sheet(), Some(c));
    }

    #[test]
    fn test_hiding_active_sheet_reassigns() {
        let mut wb = Workbook::new("unused.xlsx");
        let a = wb.add_worksheet(None).unwrap();
        let b = wb.add_worksheet(None).unwrap();
        let c = wb.add_worksheet(None).unwrap();
        wb.set_active(a).unwrap();
        wb.set_first_sheet(a).unwrap();

        wb.hide(a).unwrap();
        assert_eq!(wb.active_sheet(), Some(b));
        assert_eq!(wb.first_sheet(), Some(b));
        assert!(wb.sheet(b).unwrap().is_selected());
        assert!(!wb.sheet(a).unwrap().is_selected());

        wb.hide(b).unwrap();
        assert_eq!(wb.active_sheet(), Some(c));

        let err = wb.hide(c).unwrap_err();
        assert!(matches!(err, OoxmlError::InvalidState(_)));
        assert!(!wb.sheet(c).unwrap().is_hidden());
        assert_eq!(wb.active_sheet(), Some(c));
    }

    #[test]
    fn test_hidden_sheet_cannot_be_selected_or_first() {
        let mut wb = Workbook::new("unused.xlsx");
        wb.add_worksheet(None).unwrap();
        let b = wb.add_worksheet(None).unwrap();
        wb.hide(b).unwrap();
        assert!(wb.select(b).is_err());
        assert!(wb.set_first_sheet(b).is_err());
    }

    #[test]
    fn test_chart_ids_per_drawing() {
        let mut wb = Workbook::new("unused.xlsx");
        let s1 = wb.add_worksheet(None).unwrap();
        let s2 = wb.add_worksheet(None).unwrap();
        let c1 = chart_with_series(&mut wb);
        let c2 = chart_with_series(&mut wb);
        let c3 = chart_with_series(&mut wb);
        let c4 = chart_with_series(&mut wb);

        assert_eq!(wb.attach_chart(s1, c1, ChartOptions::default()).unwrap(), "rId1");
        assert_eq!(wb.attach_chart(s2, c2, ChartOptions::default()).unwrap(), "rId1");
        assert_eq!(wb.attach_chart(s1, c3, ChartOptions::at(20, 0)).unwrap(), "rId2");
        assert_eq!(wb.attach_chart(s1, c4, ChartOptions::at(40, 0)).unwrap(), "rId3");

        let sheet1 = wb.sheet(s1).unwrap();
        assert_eq!(sheet1.drawing_r_id(), Some("rId1"));
        assert_eq!(sheet1.rel_count(), 1);
        assert_eq!(sheet1.charts(), &[c1, c3, c4]);
        assert_eq!(wb.chart(c2).unwrap().owner(), Some(s2));
    }

    #[test]
    fn test_chart_cannot_be_attached_twice() {
        let mut wb = Workbook::new("unused.xlsx");
        let s1 = wb.add_worksheet(Some("First")).unwrap();
        let s2 = wb.add_worksheet(None).unwrap();
        let chart = chart_with_series(&mut wb);
        wb.attach_chart(s1, chart, ChartOptions::default()).unwrap();

        let err = wb.attach_chart(s2, chart, ChartOptions::default()).unwrap_err();
        match err {
            OoxmlError::ChartAlreadyAttached { chart: id, sheet } => {
                assert_eq!(id, chart);
                assert_eq!(sheet, "First");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(wb.chart(chart).unwrap().owner(), Some(s1));
        assert!(wb.sheet(s2).unwrap().drawing_r_id().is_none());
    }

    #[test]
    fn test_chartsheet_holds_one_chart() {
        let mut wb = Workbook::new("unused.xlsx");
        let cs = wb.add_chartsheet(None).unwrap();
        let c1 = chart_with_series(&mut wb);
        let c2 = chart_with_series(&mut wb);
        wb.attach_chart(cs, c1, ChartOptions::default()).unwrap();
        assert!(matches!(
            wb.attach_chart(cs, c2, ChartOptions::default()),
            Err(OoxmlError::InvalidState(_))
        ));

        let empty = wb.add_chart(ChartType::Pie).unwrap();
        let ws = wb.add_worksheet(None).unwrap();
        assert!(matches!(
            wb.attach_chart(ws, empty, ChartOptions::default()),
            Err(OoxmlError::InvalidState(_))
        ));
    }

    #[test]
    fn test_write_cell_rules() {
        let mut wb = Workbook::new("unused.xlsx");
        let ws = wb.add_worksheet(None).unwrap();
        let cs = wb.add_chartsheet(None).unwrap();

        wb.write_cell(ws, 0, 0, "hello", None).unwrap();
        wb.write_cell(ws, 1, 0, "hello", None).unwrap();
        assert_eq!(wb.shared_strings().unique_count(), 1);
        assert_eq!(wb.shared_strings().count(), 2);

        assert!(matches!(
            wb.write_cell(cs, 0, 0, 1.0, None),
            Err(OoxmlError::InvalidState(_))
        ));
        assert!(wb.write_cell(ws, MAX_ROWS, 0, 1.0, None).is_err());
        assert!(wb.write_cell(ws, 0, MAX_COLS, 1.0, None).is_err());
        assert!(wb.write_cell(ws, 0, 0, f64::NAN, None).is_err());
        assert!(wb.write_cell(ws, 0, 0, 1.0, Some(7)).is_err());
        assert!(matches!(
            wb.write_cell(ws, 5, 0, "bad\u{1}", None),
            Err(OoxmlError::InvalidContent(_))
        ));
        assert_eq!(wb.shared_strings().unique_count(), 1);
    }

    #[test]
    fn test_empty_workbook_cannot_close() {
        let mut wb = Workbook::new("unused.xlsx");
        let err = wb.close_to_writer(std::io::Cursor::new(Vec::new())).unwrap_err();
        assert!(matches!(err, OoxmlError::InvalidState(_)));
        assert_eq!(wb.state(), Lifecycle::Populating);
    }

    #[test]
    fn test_closed_workbook_rejects_mutation() {
        let mut wb = Workbook::new("unused.xlsx");
        let ws = wb.add_worksheet(None).unwrap();
        wb.close_to_writer(std::io::Cursor::new(Vec::new())).unwrap();
        assert_eq!(wb.state(), Lifecycle::Closed);

        for result in [
            wb.add_worksheet(None).map(drop),
            wb.write_cell(ws, 0, 0, 1.0, None),
            wb.set_active(ws),
            wb.add_chart(ChartType::Bar).map(drop),
            wb.close_to_writer(std::io::Cursor::new(Vec::new())).map(drop),
        ] {
            assert!(matches!(result, Err(OoxmlError::LifecycleViolation(_))));
        }
    }

    #[test]
    fn test_oversized_chart_is_rejected_at_attach() {
        let mut wb = Workbook::new("unused.xlsx");
        let ws = wb.add_worksheet(None).unwrap();
        let chart = chart_with_series(&mut wb);
        let err = wb
            .attach_chart(ws, chart, ChartOptions::default().with_scale(1e20, 1.0))
            .unwrap_err();
        assert!(matches!(err, OoxmlError::InvalidState(_)));
        assert!(wb.chart(chart).unwrap().owner().is_none());
        assert!(wb.sheet(ws).unwrap().drawing_r_id().is_none());

        wb.attach_chart(ws, chart, ChartOptions::default().with_scale(2.0, 1.0))
            .unwrap();
        assert!(wb.close_to_writer(std::io::Cursor::new(Vec::new())).is_ok());
        assert_eq!(wb.state(), Lifecycle::Closed);
    }

    #[test]
    fn test_sheet_name_outside_xml_range_is_rejected() {
        let mut wb = Workbook::new("unused.xlsx");
        let err = wb.add_worksheet(Some("Bad\u{1}Name")).unwrap_err();
        assert!(matches!(err, OoxmlError::InvalidName { .. }));
        assert!(wb.sheets().is_empty());

        wb.add_worksheet(Some("Good")).unwrap();
        assert!(wb.close_to_writer(std::io::Cursor::new(Vec::new())).is_ok());
    }

    #[test]
    fn test_sheet_by_name_ignores_case() {
        let mut wb = Workbook::new("unused.xlsx");
        wb.add_worksheet(Some("Data")).unwrap();
        let cs = wb.add_chartsheet(Some("Überblick")).unwrap();
        assert_eq!(wb.sheet_by_name("data").unwrap().name(), "Data");
        assert_eq!(wb.sheet_by_name("ÜBERBLICK").unwrap().id(), cs);
        assert!(wb.sheet_by_name("Chart1").is_none());
    }
}
