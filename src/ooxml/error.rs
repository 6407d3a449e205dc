/// Error types for workbook assembly and packaging.
use thiserror::Error;

use crate::ooxml::xlsx::chart::ChartId;

/// Result type for workbook assembly and packaging.
pub type Result<T> = std::result::Result<T, OoxmlError>;

/// Error types for workbook assembly and packaging.
///
/// Model-mutation errors (`InvalidName`, `DuplicateName`, `InvalidState`,
/// `ChartAlreadyAttached`, `LifecycleViolation`) are returned by the call that
/// caused them and leave the model unchanged. Assembly and packaging errors
/// abort `close` without producing an archive.
#[derive(Error, Debug)]
pub enum OoxmlError {
    /// Sheet name fails the length or character rules
    #[error("Invalid sheet name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// Another sheet already uses this name (compared case-insensitively)
    #[error("Sheet name '{0}' is already in use")]
    DuplicateName(String),

    /// Illegal transition, e.g. activating a hidden sheet
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The chart already belongs to a sheet
    #[error("Chart {chart} is already attached to sheet '{sheet}'")]
    ChartAlreadyAttached { chart: ChartId, sheet: String },

    /// Mutation attempted after assembly started
    #[error("Lifecycle violation: {0}")]
    LifecycleViolation(String),

    /// A relationship points at a part that was never assembled
    #[error("Dangling reference: {0}")]
    DanglingReference(String),

    /// Archive write or temporary storage failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Text destined for XML contains a disallowed character
    #[error("Invalid XML content: {0}")]
    InvalidContent(String),
}

impl From<zip::result::ZipError> for OoxmlError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(err) => OoxmlError::Io(err),
            other => OoxmlError::Io(std::io::Error::other(other)),
        }
    }
}
