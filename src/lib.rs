//! Litchi Writer - A Rust library for writing Office Open XML spreadsheets
//!
//! This library produces `.xlsx` packages that Excel and other spreadsheet
//! applications open without repair prompts.
//!
//! # Features
//!
//! - **Worksheets and chartsheets**: any mix, in creation order
//! - **Charts**: area, bar, column, line, pie, doughnut and scatter charts, anchored on a
//!   worksheet or filling a chartsheet
//! - **Cells and formats**: numbers, shared strings, booleans, formulas and deduplicated
//!   cell formats
//! - **Deterministic output**: identical input produces byte-identical archives
//! - **Atomic close**: the destination is replaced only by a complete package
//!
//! # Example - A chartsheet over worksheet data
//!
//! ```no_run
//! use litchi_writer::{ChartOptions, ChartSeries, ChartType, Workbook};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut workbook = Workbook::new("chart.xlsx");
//! let data = workbook.add_worksheet(Some("Data"))?;
//! for row in 0..5u32 {
//!     workbook.write_cell(data, row, 0, f64::from(row + 1) * 10.0, None)?;
//! }
//!
//! let tab = workbook.add_chartsheet(None)?;
//! let chart = workbook.add_chart(ChartType::Line)?;
//! let values = workbook.sheet(data).map(|s| s.range_ref(0, 0, 4, 0)).unwrap_or_default();
//! workbook
//!     .chart_mut(chart)?
//!     .set_title("Growth")
//!     .add_series(ChartSeries::new(values));
//! workbook.attach_chart(tab, chart, ChartOptions::default())?;
//!
//! workbook.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Writing into memory
//!
//! ```
//! use std::io::Cursor;
//! use litchi_writer::{Compression, Workbook, WorkbookOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = WorkbookOptions::new().with_compression(Compression::Stored);
//! let mut workbook = Workbook::with_options("unused.xlsx", options);
//! let sheet = workbook.add_worksheet(None)?;
//! workbook.write_cell(sheet, 0, 0, "hello", None)?;
//!
//! let bytes = workbook.close_to_writer(Cursor::new(Vec::new()))?.into_inner();
//! assert_eq!(&bytes[..2], b"PK");
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//!
//! The close pipeline emits [`tracing`] events and spans. The library never installs a
//! subscriber; applications decide where the output goes.

/// Format-independent utilities (XML emission and escaping)
pub mod common;

/// OOXML (Office Open XML) package writing
///
/// This module provides the OPC packaging layer and the `.xlsx` workbook model.
pub mod ooxml;

// Re-export commonly used types for convenience
pub use ooxml::common::DocumentProperties;
pub use ooxml::error::{OoxmlError, Result};
pub use ooxml::opc::Compression;
pub use ooxml::xlsx::{
    CellValue, ChartId, ChartOptions, ChartSeries, ChartType, Format, HorizontalAlign, Lifecycle,
    SheetId, SheetKind, Workbook, WorkbookOptions,
};
