//! Assembled parts and their temporary storage.
//!
//! A part's bytes accumulate in memory until they cross a threshold, after which the
//! buffer moves to an anonymous temporary file. Anonymous files have no directory entry
//! and are removed by the OS once the handle drops, so storage is released on every
//! exit path, including an assembly error halfway through a sheet.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use crate::ooxml::opc::packuri::PackURI;

/// Default number of bytes a part may hold in memory before spilling.
pub const DEFAULT_SPILL_THRESHOLD: usize = 4 * 1024 * 1024;

/// Growable byte sink for one part.
#[derive(Debug)]
pub struct PartBuffer {
    mem: Vec<u8>,
    spill: Option<File>,
    len: u64,
    threshold: usize,
    tmpdir: Option<PathBuf>,
}

impl PartBuffer {
    /// Create a buffer that spills after `threshold` bytes.
    ///
    /// Spill files are created in `tmpdir` or the system temporary directory.
    pub fn new(threshold: usize, tmpdir: Option<PathBuf>) -> Self {
        Self {
            mem: Vec::new(),
            spill: None,
            len: 0,
            threshold,
            tmpdir,
        }
    }

    /// Create a buffer that never spills.
    pub fn in_memory() -> Self {
        Self::new(usize::MAX, None)
    }

    /// Whether the contents moved to a temporary file.
    #[inline]
    pub fn is_spilled(&self) -> bool {
        self.spill.is_some()
    }

    /// Total bytes written.
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn spill_to_file(&mut self) -> io::Result<()> {
        let mut file = match &self.tmpdir {
            Some(dir) => tempfile::tempfile_in(dir)?,
            None => tempfile::tempfile()?,
        };
        file.write_all(&self.mem)?;
        tracing::debug!(bytes = self.mem.len(), "part buffer spilled to temporary file");
        self.mem = Vec::new();
        self.spill = Some(file);
        Ok(())
    }

    /// Copy the full contents into `out`.
    pub fn copy_to<W: Write + ?Sized>(&mut self, out: &mut W) -> io::Result<u64> {
        match &mut self.spill {
            Some(file) => {
                file.flush()?;
                file.seek(SeekFrom::Start(0))?;
                io::copy(file, out)
            }
            None => {
                out.write_all(&self.mem)?;
                Ok(self.mem.len() as u64)
            }
        }
    }

    /// Read the full contents into a vector.
    pub fn to_vec(&mut self) -> io::Result<Vec<u8>> {
        match &mut self.spill {
            Some(file) => {
                let mut data = Vec::with_capacity(self.len as usize);
                file.seek(SeekFrom::Start(0))?;
                file.read_to_end(&mut data)?;
                Ok(data)
            }
            None => Ok(self.mem.clone()),
        }
    }
}

impl Write for PartBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.spill.is_none() && self.mem.len().saturating_add(buf.len()) > self.threshold {
            self.spill_to_file()?;
        }
        let written = match &mut self.spill {
            Some(file) => file.write(buf)?,
            None => {
                self.mem.extend_from_slice(buf);
                buf.len()
            }
        };
        self.len += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.spill {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// One assembled part, ready to be packaged.
#[derive(Debug)]
pub struct Part {
    partname: PackURI,
    content_type: &'static str,
    data: PartBuffer,
}

impl Part {
    pub fn new(partname: PackURI, content_type: &'static str, data: PartBuffer) -> Self {
        Self {
            partname,
            content_type,
            data,
        }
    }

    /// Get the part name.
    #[inline]
    pub fn partname(&self) -> &PackURI {
        &self.partname
    }

    /// Get the content type.
    #[inline]
    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    /// Get the part's byte storage.
    #[inline]
    pub fn data_mut(&mut self) -> &mut PartBuffer {
        &mut self.data
    }

    /// Read the part's bytes into a vector.
    pub fn blob(&mut self) -> io::Result<Vec<u8>> {
        self.data.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stays_in_memory_below_threshold() {
        let mut buf = PartBuffer::new(16, None);
        buf.write_all(b"0123456789").unwrap();
        assert!(!buf.is_spilled());
        assert_eq!(buf.len(), 10);
        assert_eq!(buf.to_vec().unwrap(), b"0123456789");
    }

    #[test]
    fn test_spills_above_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = PartBuffer::new(8, Some(dir.path().to_path_buf()));
        buf.write_all(b"<row>").unwrap();
        buf.write_all(b"<c r=\"A1\"/>").unwrap();
        buf.write_all(b"</row>").unwrap();
        assert!(buf.is_spilled());
        assert_eq!(buf.len(), 22);

        let mut out = Vec::new();
        assert_eq!(buf.copy_to(&mut out).unwrap(), 22);
        assert_eq!(out, b"<row><c r=\"A1\"/></row>");

        // Anonymous spill files leave no directory entry behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_copy_is_repeatable() {
        let mut buf = PartBuffer::new(1, None);
        buf.write_all(b"abc").unwrap();
        let mut first = Vec::new();
        let mut second = Vec::new();
        buf.copy_to(&mut first).unwrap();
        buf.copy_to(&mut second).unwrap();
        assert_eq!(first, second);
    }
}
