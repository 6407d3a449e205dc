//! Sheet model shared by worksheets and chartsheets.
//!
//! A sheet never points at other sheets or at the workbook: the workbook owns the
//! active and first-sheet indices and every cross-part reference lives in the
//! relationship manager. What a sheet keeps is its own identity, its flags and its
//! payload (cells for a worksheet, at most one chart for a chartsheet).

use std::collections::BTreeMap;
use std::fmt;

use crate::common::xml::is_xml_char;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::xlsx::chart::ChartId;

/// Maximum sheet name length in characters.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Number of rows in a worksheet.
pub const MAX_ROWS: u32 = 1_048_576;

/// Number of columns in a worksheet.
pub const MAX_COLS: u16 = 16_384;

const FORBIDDEN_NAME_CHARS: [char; 7] = [':', '\\', '/', '?', '*', '[', ']'];

/// Stable handle to a sheet, its zero-based creation index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SheetId(pub(crate) usize);

impl SheetId {
    /// Zero-based creation index.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sheet#{}", self.0)
    }
}

/// The two sheet variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetKind {
    /// Grid of cells
    Worksheet,
    /// A single chart filling the tab
    Chartsheet,
}

impl SheetKind {
    fn dir(self) -> &'static str {
        match self {
            SheetKind::Worksheet => "worksheets",
            SheetKind::Chartsheet => "chartsheets",
        }
    }

    /// Content type of the sheet part.
    pub fn content_type(self) -> &'static str {
        match self {
            SheetKind::Worksheet => ct::SML_WORKSHEET,
            SheetKind::Chartsheet => ct::SML_CHARTSHEET,
        }
    }

    /// Relationship type from the workbook to the sheet part.
    pub fn reltype(self) -> &'static str {
        match self {
            SheetKind::Worksheet => rt::WORKSHEET,
            SheetKind::Chartsheet => rt::CHARTSHEET,
        }
    }

    /// Part name for the sheet with the given creation index.
    pub fn partname(self, index: usize) -> PackURI {
        PackURI::from_abs(format!("/xl/{}/sheet{}.xml", self.dir(), index + 1))
    }
}

/// Value accepted by [`Workbook::write_cell`](super::workbook::Workbook::write_cell).
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    String(String),
    Boolean(bool),
    /// Formula text, with or without the leading `=`
    Formula(String),
    /// Formatting only
    Blank,
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

/// Cell payload after strings were interned.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StoredValue {
    Number(f64),
    SharedString(u32),
    Boolean(bool),
    Formula(String),
    Blank,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Cell {
    pub(crate) value: StoredValue,
    pub(crate) style: Option<u32>,
}

/// The drawing part a sheet's charts live in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DrawingRef {
    /// 1-based drawing number, `N` in `drawingN.xml`
    pub(crate) number: usize,
    pub(crate) partname: PackURI,
    /// Id of the sheet → drawing relationship
    pub(crate) r_id: String,
}

/// One sheet of a workbook.
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    quoted_name: String,
    index: usize,
    kind: SheetKind,
    pub(crate) selected: bool,
    pub(crate) hidden: bool,
    /// Parts referenced from this sheet so far
    pub(crate) rel_count: u32,
    partname: PackURI,
    /// Id of the workbook → sheet relationship
    pub(crate) workbook_r_id: String,
    pub(crate) drawing: Option<DrawingRef>,
    pub(crate) charts: Vec<ChartId>,
    pub(crate) cells: BTreeMap<u32, BTreeMap<u16, Cell>>,
}

impl Sheet {
    pub(crate) fn new(name: String, index: usize, kind: SheetKind, workbook_r_id: String) -> Self {
        Self {
            quoted_name: quote_sheet_name(&name),
            name,
            index,
            kind,
            selected: false,
            hidden: false,
            rel_count: 0,
            partname: kind.partname(index),
            workbook_r_id,
            drawing: None,
            charts: Vec::new(),
            cells: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> SheetId {
        SheetId(self.index)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name as it must appear in a formula or range reference.
    #[inline]
    pub fn quoted_name(&self) -> &str {
        &self.quoted_name
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn kind(&self) -> SheetKind {
        self.kind
    }

    #[inline]
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    #[inline]
    pub fn rel_count(&self) -> u32 {
        self.rel_count
    }

    #[inline]
    pub fn partname(&self) -> &PackURI {
        &self.partname
    }

    /// Relationship id of this sheet in the workbook relationship table.
    #[inline]
    pub fn workbook_r_id(&self) -> &str {
        &self.workbook_r_id
    }

    /// Charts attached to this sheet, in attachment order.
    #[inline]
    pub fn charts(&self) -> &[ChartId] {
        &self.charts
    }

    /// Relationship id of the sheet's drawing, once a chart is attached.
    pub fn drawing_r_id(&self) -> Option<&str> {
        self.drawing.as_ref().map(|d| d.r_id.as_str())
    }

    /// Absolute range reference such as `'Sales Data'!$A$1:$A$5`.
    pub fn range_ref(&self, first_row: u32, first_col: u16, last_row: u32, last_col: u16) -> String {
        let first = absolute_cell_ref(first_row, first_col);
        if (first_row, first_col) == (last_row, last_col) {
            return format!("{}!{}", self.quoted_name, first);
        }
        format!(
            "{}!{}:{}",
            self.quoted_name,
            first,
            absolute_cell_ref(last_row, last_col)
        )
    }

    /// Used range of the cell grid, `A1` when empty.
    pub fn dimension(&self) -> String {
        let (Some(first_row), Some(last_row)) = (
            self.cells.keys().next().copied(),
            self.cells.keys().next_back().copied(),
        ) else {
            return "A1".to_string();
        };
        let cols = self.cells.values().flat_map(|row| row.keys().copied());
        let (min_col, max_col) = cols.fold((u16::MAX, 0), |(lo, hi), c| (lo.min(c), hi.max(c)));

        let first = cell_ref(first_row, min_col);
        let last = cell_ref(last_row, max_col);
        if first == last { first } else { format!("{}:{}", first, last) }
    }

    pub(crate) fn set_cell(&mut self, row: u32, col: u16, cell: Cell) {
        self.cells.entry(row).or_default().insert(col, cell);
    }
}

/// Check a sheet name against the length and character rules.
///
/// Uniqueness is a workbook concern and is checked there.
pub fn validate_sheet_name(name: &str) -> Result<()> {
    let invalid = |reason| {
        Err(OoxmlError::InvalidName {
            name: name.to_string(),
            reason,
        })
    };

    let len = name.chars().count();
    if len == 0 {
        return invalid("name is empty");
    }
    if len > MAX_SHEET_NAME_LEN {
        return invalid("name is longer than 31 characters");
    }
    if name.contains(FORBIDDEN_NAME_CHARS) {
        return invalid("name contains one of : \\ / ? * [ ]");
    }
    if !name.chars().all(is_xml_char) {
        return invalid("name contains a character not allowed in XML");
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return invalid("name starts or ends with an apostrophe");
    }
    Ok(())
}

/// Derive the form of a sheet name used in references.
///
/// Names made only of ASCII letters, digits, `_` and `.`, not starting with a digit or
/// `.`, are used as-is. Anything else is wrapped in apostrophes with embedded
/// apostrophes doubled.
///
/// ```
/// use litchi_writer::ooxml::xlsx::sheet::quote_sheet_name;
///
/// assert_eq!(quote_sheet_name("Plain"), "Plain");
/// assert_eq!(quote_sheet_name("My Sheet"), "'My Sheet'");
/// assert_eq!(quote_sheet_name("It's Mine"), "'It''s Mine'");
/// ```
pub fn quote_sheet_name(name: &str) -> String {
    let plain = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        && name
            .chars()
            .next()
            .is_some_and(|c| !c.is_ascii_digit() && c != '.');
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// Column letters for a zero-based column index: 0 → `A`, 26 → `AA`.
pub fn col_to_letters(col: u16) -> String {
    let mut n = u32::from(col) + 1;
    let mut letters = Vec::with_capacity(3);
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// A1-style reference for a zero-based cell.
pub fn cell_ref(row: u32, col: u16) -> String {
    let mut buf = itoa::Buffer::new();
    let mut out = col_to_letters(col);
    out.push_str(buf.format(row + 1));
    out
}

fn absolute_cell_ref(row: u32, col: u16) -> String {
    let mut buf = itoa::Buffer::new();
    format!("${}${}", col_to_letters(col), buf.format(row + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_partnames() {
        assert_eq!(
            SheetKind::Worksheet.partname(0).as_str(),
            "/xl/worksheets/sheet1.xml"
        );
        assert_eq!(
            SheetKind::Chartsheet.partname(1).as_str(),
            "/xl/chartsheets/sheet2.xml"
        );
    }

    #[test]
    fn test_name_rules() {
        assert!(validate_sheet_name("Data").is_ok());
        assert!(validate_sheet_name(&"x".repeat(31)).is_ok());
        assert!(validate_sheet_name("Ünïcødé ✓").is_ok());

        for bad in [
            "", "a:b", "a\\b", "a/b", "a?b", "a*b", "[a]", "'lead", "trail'", "a\u{1}b",
            "tab\u{FFFF}",
        ] {
            let err = validate_sheet_name(bad).unwrap_err();
            assert!(matches!(err, OoxmlError::InvalidName { .. }), "{bad}");
        }
        assert!(validate_sheet_name(&"x".repeat(32)).is_err());
    }

    #[test]
    fn test_quoting() {
        assert_eq!(quote_sheet_name("Plain"), "Plain");
        assert_eq!(quote_sheet_name("My Sheet"), "'My Sheet'");
        assert_eq!(quote_sheet_name("It's Mine"), "'It''s Mine'");
        assert_eq!(quote_sheet_name("2024"), "'2024'");
        assert_eq!(quote_sheet_name("Sheet_1.v2"), "Sheet_1.v2");
        assert_eq!(quote_sheet_name("Données"), "'Données'");
    }

    #[test]
    fn test_cell_refs() {
        assert_eq!(col_to_letters(0), "A");
        assert_eq!(col_to_letters(25), "Z");
        assert_eq!(col_to_letters(26), "AA");
        assert_eq!(col_to_letters(701), "ZZ");
        assert_eq!(col_to_letters(MAX_COLS - 1), "XFD");
        assert_eq!(cell_ref(0, 0), "A1");
        assert_eq!(cell_ref(MAX_ROWS - 1, 2), "C1048576");
    }

    #[test]
    fn test_range_ref_uses_quoted_name() {
        let sheet = Sheet::new("Sales Data".into(), 0, SheetKind::Worksheet, "rId1".into());
        assert_eq!(sheet.range_ref(1, 0, 4, 0), "'Sales Data'!$A$2:$A$5");
        assert_eq!(sheet.range_ref(0, 1, 0, 1), "'Sales Data'!$B$1");
    }

    #[test]
    fn test_dimension() {
        let mut sheet = Sheet::new("Data".into(), 0, SheetKind::Worksheet, "rId1".into());
        assert_eq!(sheet.dimension(), "A1");
        let cell = Cell {
            value: StoredValue::Number(1.0),
            style: None,
        };
        sheet.set_cell(2, 3, cell.clone());
        assert_eq!(sheet.dimension(), "D3");
        sheet.set_cell(0, 1, cell.clone());
        sheet.set_cell(4, 0, cell);
        assert_eq!(sheet.dimension(), "A1:D5");
    }

    proptest! {
        #[test]
        fn prop_valid_names_pass(name in "[A-Za-z0-9 _.()-]{1,31}") {
            prop_assert!(validate_sheet_name(&name).is_ok());
        }

        #[test]
        fn prop_quoting_is_idempotent_on_plain_names(name in "[A-Za-z_][A-Za-z0-9_.]{0,30}") {
            prop_assert_eq!(quote_sheet_name(&name), name);
        }

        #[test]
        fn prop_quoted_names_round_trip(name in "[A-Za-z' ]{1,31}") {
            let quoted = quote_sheet_name(&name);
            if quoted != name {
                let inner = &quoted[1..quoted.len() - 1];
                prop_assert_eq!(inner.replace("''", "'"), name);
            }
        }
    }
}
