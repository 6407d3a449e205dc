/// Configuration for workbook assembly and packaging.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ooxml::opc::part::DEFAULT_SPILL_THRESHOLD;
use crate::ooxml::opc::phys_pkg::{ArchiveOptions, Compression};

/// Options controlling how a workbook is assembled and packaged.
///
/// # Examples
///
/// ```rust
/// use litchi_writer::{Compression, WorkbookOptions};
///
/// let options = WorkbookOptions::new()
///     .with_compression(Compression::Stored)
///     .with_spill_threshold(64 * 1024)
///     .with_parallel(true);
/// assert!(options.parallel);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbookOptions {
    /// Compression method used for every archive entry
    pub compression: Compression,
    /// DEFLATE level (`None` for the library default)
    pub compression_level: Option<i64>,
    /// Bytes a single part may buffer in memory before spilling to a temporary file
    pub spill_threshold: usize,
    /// Directory for spill files and nothing else; `None` uses the system temp directory
    pub tmpdir: Option<PathBuf>,
    /// Assemble sheet parts on the rayon thread pool
    pub parallel: bool,
}

impl Default for WorkbookOptions {
    fn default() -> Self {
        Self {
            compression: Compression::Deflated,
            compression_level: None,
            spill_threshold: DEFAULT_SPILL_THRESHOLD,
            tmpdir: None,
            parallel: false,
        }
    }
}

impl WorkbookOptions {
    /// Create a new `WorkbookOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the compression method.
    #[inline]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set the DEFLATE compression level.
    #[inline]
    pub fn with_compression_level(mut self, level: i64) -> Self {
        self.compression_level = Some(level);
        self
    }

    /// Set the in-memory limit per part.
    #[inline]
    pub fn with_spill_threshold(mut self, bytes: usize) -> Self {
        self.spill_threshold = bytes;
        self
    }

    /// Set the directory used for spill files.
    #[inline]
    pub fn with_tmpdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tmpdir = Some(dir.into());
        self
    }

    /// Enable or disable parallel sheet assembly.
    #[inline]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub(crate) fn archive(&self) -> ArchiveOptions {
        ArchiveOptions {
            compression: self.compression,
            compression_level: self.compression_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = WorkbookOptions::default();
        assert_eq!(options.compression, Compression::Deflated);
        assert_eq!(options.spill_threshold, DEFAULT_SPILL_THRESHOLD);
        assert!(!options.parallel);
        assert!(options.tmpdir.is_none());
    }

    #[test]
    fn test_builder_chain() {
        let options = WorkbookOptions::new()
            .with_compression(Compression::Stored)
            .with_compression_level(9)
            .with_tmpdir("/var/tmp")
            .with_parallel(true);
        assert_eq!(options.archive().compression, Compression::Stored);
        assert_eq!(options.archive().compression_level, Some(9));
        assert_eq!(options.tmpdir, Some(PathBuf::from("/var/tmp")));
        assert!(options.parallel);
    }
}
