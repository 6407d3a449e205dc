//! Office Open XML (OOXML) package writing.
//!
//! The module is organized into layers:
//!
//! 1. **OPC Layer** (`opc`): part names, relationships, content types and the ZIP container
//! 2. **Shared Utilities** (`common`, `error`): document properties and the error type
//! 3. **Format-Specific Modules**:
//!    - `xlsx`: Excel workbooks with worksheets, chartsheets and charts
//!
//! # Example
//!
//! ```rust,no_run
//! use litchi_writer::ooxml::xlsx::Workbook;
//!
//! let mut workbook = Workbook::new("report.xlsx");
//! let sheet = workbook.add_worksheet(Some("Data"))?;
//! workbook.write_cell(sheet, 0, 0, "Region", None)?;
//! workbook.write_cell(sheet, 0, 1, 1250.5, None)?;
//! workbook.close()?;
//! # Ok::<(), litchi_writer::OoxmlError>(())
//! ```
pub mod common;
pub mod error;
pub mod opc;
pub mod xlsx;

pub use common::DocumentProperties;
pub use error::{OoxmlError, Result};
pub use opc::PackURI;
