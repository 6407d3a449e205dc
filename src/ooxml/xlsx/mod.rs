//! Excel (.xlsx) workbook writing.
//!
//! A [`Workbook`] is populated in memory: sheets, cells, formats and charts are added
//! through it and validated as they arrive. [`Workbook::close`] then freezes the model,
//! assembles every part and writes the package atomically to its destination.
//!
//! - `Workbook`: lifecycle, sheet list and chart arena
//! - `Sheet`: worksheet or chartsheet with its cells and drawing
//! - `Chart`: chart definition and its placement
//! - `SharedStrings`, `StyleRegistry`: workbook-wide tables
//!
//! # Example
//!
//! ```rust,no_run
//! use litchi_writer::ooxml::xlsx::{ChartOptions, ChartSeries, ChartType, Workbook};
//!
//! let mut workbook = Workbook::new("sales.xlsx");
//! let data = workbook.add_worksheet(Some("Data"))?;
//! for (row, (month, total)) in [("Jan", 10.0), ("Feb", 14.0), ("Mar", 9.5)].iter().enumerate() {
//!     workbook.write_cell(data, row as u32, 0, *month, None)?;
//!     workbook.write_cell(data, row as u32, 1, *total, None)?;
//! }
//! let tab = workbook.add_chartsheet(None)?;
//!
//! let chart = workbook.add_chart(ChartType::Column)?;
//! let sheet = workbook.sheet(data).expect("sheet exists");
//! let series = ChartSeries::new(sheet.range_ref(0, 1, 2, 1))
//!     .with_categories(sheet.range_ref(0, 0, 2, 0));
//! workbook.chart_mut(chart)?.add_series(series);
//! workbook.attach_chart(tab, chart, ChartOptions::default())?;
//! workbook.set_active(tab)?;
//!
//! workbook.close()?;
//! # Ok::<(), litchi_writer::OoxmlError>(())
//! ```

pub mod chart;
pub mod options;
pub mod sheet;
pub mod strings;
pub mod styles;
pub mod workbook;
pub(crate) mod writer;

#[cfg(test)]
mod tests;

pub use chart::{Chart, ChartId, ChartOptions, ChartSeries, ChartType};
pub use options::WorkbookOptions;
pub use sheet::{CellValue, Sheet, SheetId, SheetKind};
pub use strings::SharedStrings;
pub use styles::{Format, HorizontalAlign, StyleRegistry};
pub use workbook::{Lifecycle, Workbook};
