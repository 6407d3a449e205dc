//! Provides a general interface to a physical OPC package (ZIP file).
//!
//! Every entry is written with the same compression method and a fixed 1980-01-01
//! timestamp, so identical parts always produce an identical archive.

use std::fs;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::{Builder, NamedTempFile};
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::Part;

/// Compression method applied uniformly to every archive entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// DEFLATE, what Excel itself writes
    #[default]
    Deflated,
    /// No compression
    Stored,
}

impl From<Compression> for zip::CompressionMethod {
    fn from(value: Compression) -> Self {
        match value {
            Compression::Deflated => zip::CompressionMethod::Deflated,
            Compression::Stored => zip::CompressionMethod::Stored,
        }
    }
}

/// Archive-level settings shared by every entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveOptions {
    pub compression: Compression,
    /// DEFLATE level; ignored for stored entries
    pub compression_level: Option<i64>,
}

impl ArchiveOptions {
    fn file_options(&self) -> SimpleFileOptions {
        let options = SimpleFileOptions::default()
            .compression_method(self.compression.into())
            .last_modified_time(zip::DateTime::default())
            .unix_permissions(0o644);
        match self.compression {
            Compression::Deflated => options.compression_level(self.compression_level),
            Compression::Stored => options,
        }
    }
}

/// Physical package writer that streams parts into a ZIP archive.
pub struct PhysPkgWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
}

impl<W: Write + Seek> PhysPkgWriter<W> {
    /// Start a new archive on `writer`.
    pub fn new(writer: W, options: ArchiveOptions) -> Self {
        Self {
            zip: ZipWriter::new(writer),
            options: options.file_options(),
        }
    }

    /// Write a blob under the membername of `pack_uri`.
    pub fn write(&mut self, pack_uri: &PackURI, blob: &[u8]) -> Result<()> {
        self.zip.start_file(pack_uri.membername(), self.options)?;
        self.zip.write_all(blob)?;
        Ok(())
    }

    /// Stream an assembled part into the archive.
    pub fn write_part(&mut self, part: &mut Part) -> Result<()> {
        self.zip.start_file(part.partname().membername(), self.options)?;
        part.data_mut().copy_to(&mut self.zip)?;
        Ok(())
    }

    /// Write the central directory and return the underlying writer.
    pub fn finish(self) -> Result<W> {
        Ok(self.zip.finish()?)
    }
}

fn parent_dir_or_dot(path: &Path) -> &Path {
    // `Path::parent` is `Some("")` for a bare file name
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Create the temporary file with the mode a plain create would get after the umask.
fn temp_file_beside(dest: &Path) -> std::io::Result<NamedTempFile> {
    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(parent_dir_or_dot(dest))
}

/// Write `dest` by producing the archive in a temporary file beside it and renaming
/// that file into place once `write_fn` succeeds.
///
/// A replaced file keeps its permissions. On any error the temporary file is removed
/// and `dest` is left untouched.
pub fn write_atomically<T>(
    dest: &Path,
    write_fn: impl FnOnce(&mut BufWriter<&mut fs::File>) -> Result<T>,
) -> Result<T> {
    let mut tmp = temp_file_beside(dest)?;

    let out = {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        let out = write_fn(&mut writer)?;
        writer.flush()?;
        out
    };
    tmp.as_file().sync_all()?;
    if let Ok(existing) = fs::metadata(dest) {
        tmp.as_file().set_permissions(existing.permissions())?;
    }

    tmp.persist(dest).map_err(|err| OoxmlError::Io(err.error))?;
    tracing::debug!(path = %dest.display(), "archive persisted");
    Ok(out)
}
