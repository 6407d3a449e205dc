/// Shared strings table for XLSX workbooks.
use std::collections::HashMap;
use std::io::Write;

use crate::common::xml::XmlWriter;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::namespace;

/// Shared strings table.
///
/// Excel stores cell strings in one workbook-wide table and cells refer to them by
/// index. Interning the same text twice returns the same index; `count` tracks every
/// reference while `unique_count` tracks distinct strings.
#[derive(Debug, Clone, Default)]
pub struct SharedStrings {
    /// List of unique strings, in first-seen order
    strings: Vec<String>,
    /// Map from string to index for fast lookup
    index: HashMap<String, u32>,
    /// Total number of references handed out
    count: u32,
}

impl SharedStrings {
    /// Create a new empty shared strings table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a string to the table and return its index.
    ///
    /// If the string already exists, returns the existing index.
    pub fn intern(&mut self, s: &str) -> Result<u32> {
        let idx = match self.index.get(s) {
            Some(&idx) => idx,
            None => {
                let idx = u32::try_from(self.strings.len()).map_err(|_| {
                    OoxmlError::InvalidState("shared string table is full".to_string())
                })?;
                self.strings.push(s.to_string());
                self.index.insert(s.to_string(), idx);
                idx
            }
        };
        self.count = self.count.saturating_add(1);
        Ok(idx)
    }

    /// Get the string stored at `idx`.
    pub fn get(&self, idx: u32) -> Option<&str> {
        self.strings.get(idx as usize).map(String::as_str)
    }

    /// Number of references to the table.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Number of distinct strings.
    #[inline]
    pub fn unique_count(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Serialize the table as `xl/sharedStrings.xml`.
    pub fn write_xml<W: Write>(&self, xml: &mut XmlWriter<W>) -> Result<()> {
        let mut count = itoa::Buffer::new();
        let mut unique = itoa::Buffer::new();

        xml.decl()?;
        xml.start(
            "sst",
            &[
                ("xmlns", namespace::SML_MAIN),
                ("count", count.format(self.count)),
                ("uniqueCount", unique.format(self.strings.len())),
            ],
        )?;
        for s in &self.strings {
            xml.start("si", &[])?;
            if needs_space_preserve(s) {
                xml.text_element("t", &[("xml:space", "preserve")], s)?;
            } else {
                xml.text_element("t", &[], s)?;
            }
            xml.end("si")?;
        }
        xml.end("sst")
    }
}

fn needs_space_preserve(s: &str) -> bool {
    s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace)
}
