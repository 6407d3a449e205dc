//! Package writer for OPC packages.
//!
//! This module serializes an ordered list of assembled parts into a ZIP archive,
//! writing [Content_Types].xml first so readers can locate it without scanning.

use std::collections::BTreeMap;
use std::io::{Seek, Write};

use crate::common::xml::XmlWriter;
use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::{content_type as ct, namespace};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PackURI};
use crate::ooxml::opc::part::Part;
use crate::ooxml::opc::phys_pkg::{ArchiveOptions, PhysPkgWriter};

/// Package writer that serializes assembled parts to a ZIP stream.
///
/// Archive layout:
/// - [Content_Types].xml
/// - every part in the order given (relationship parts included)
pub struct PackageWriter;

impl PackageWriter {
    /// Write `parts` to `writer` and return the writer once the central directory is written.
    pub fn write_to<W: Write + Seek>(
        writer: W,
        parts: &mut [Part],
        options: ArchiveOptions,
    ) -> Result<W> {
        let mut phys_writer = PhysPkgWriter::new(writer, options);

        let cti = ContentTypesItem::from_parts(parts);
        let content_types_uri = PackURI::from_abs(CONTENT_TYPES_URI.to_string());
        phys_writer.write(&content_types_uri, &cti.to_xml()?)?;

        for part in parts.iter_mut() {
            phys_writer.write_part(part)?;
        }

        tracing::debug!(parts = parts.len() + 1, "package entries written");
        phys_writer.finish()
    }
}

/// Helper for building [Content_Types].xml content.
///
/// Manages Default and Override elements for content type mapping.
#[derive(Debug, Default)]
pub struct ContentTypesItem {
    /// Default content types by extension
    defaults: BTreeMap<String, &'static str>,

    /// Override content types by partname
    overrides: BTreeMap<PackURI, &'static str>,
}

impl ContentTypesItem {
    /// Create a registry holding the `rels` and `xml` defaults.
    pub fn new() -> Self {
        let mut defaults = BTreeMap::new();
        defaults.insert("rels".to_string(), ct::OPC_RELATIONSHIPS);
        defaults.insert("xml".to_string(), ct::XML);
        Self {
            defaults,
            overrides: BTreeMap::new(),
        }
    }

    /// Build the registry for a set of emitted parts.
    pub fn from_parts(parts: &[Part]) -> Self {
        let mut cti = Self::new();
        for part in parts {
            cti.add_content_type(part.partname(), part.content_type());
        }
        cti
    }

    /// Add a content type for a part.
    ///
    /// Uses a default mapping if the extension matches a well-known type,
    /// otherwise uses an override for the specific partname.
    pub fn add_content_type(&mut self, partname: &PackURI, content_type: &'static str) {
        let ext = partname.ext();
        if Self::is_default_content_type(ext, content_type) {
            self.defaults.insert(ext.to_string(), content_type);
        } else {
            self.overrides.insert(partname.clone(), content_type);
        }
    }

    /// Check if an extension/content-type pair is a standard default.
    fn is_default_content_type(ext: &str, content_type: &str) -> bool {
        matches!(
            (ext, content_type),
            ("rels", ct::OPC_RELATIONSHIPS) | ("xml", ct::XML)
        )
    }

    /// Generate the XML for [Content_Types].xml.
    ///
    /// Defaults are sorted by extension and overrides by partname.
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut xml = XmlWriter::new(Vec::with_capacity(4096));
        xml.decl()?;
        xml.start("Types", &[("xmlns", namespace::OPC_CONTENT_TYPES)])?;
        for (ext, content_type) in &self.defaults {
            xml.empty(
                "Default",
                &[("Extension", ext), ("ContentType", content_type)],
            )?;
        }
        for (partname, content_type) in &self.overrides {
            xml.empty(
                "Override",
                &[("PartName", partname.as_str()), ("ContentType", content_type)],
            )?;
        }
        xml.end("Types")?;
        Ok(xml.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::part::PartBuffer;
    use std::io::{Cursor, Read};

    fn part(name: &str, content_type: &'static str, body: &[u8]) -> Part {
        let mut data = PartBuffer::in_memory();
        data.write_all(body).unwrap();
        Part::new(PackURI::new(name).unwrap(), content_type, data)
    }

    #[test]
    fn test_content_types_xml() {
        let mut cti = ContentTypesItem::new();
        cti.add_content_type(
            &PackURI::new("/xl/workbook.xml").unwrap(),
            ct::SML_SHEET_MAIN,
        );
        cti.add_content_type(
            &PackURI::new("/xl/_rels/workbook.xml.rels").unwrap(),
            ct::OPC_RELATIONSHIPS,
        );

        let xml = String::from_utf8(cti.to_xml().unwrap()).unwrap();
        assert!(xml.contains(&format!(
            r#"<Default Extension="rels" ContentType="{}"/>"#,
            ct::OPC_RELATIONSHIPS
        )));
        assert!(xml.contains(&format!(
            r#"<Override PartName="/xl/workbook.xml" ContentType="{}"/>"#,
            ct::SML_SHEET_MAIN
        )));
        assert!(!xml.contains("/xl/_rels/workbook.xml.rels"));
    }

    #[test]
    fn test_content_types_written_first() {
        let mut parts = vec![
            part("/_rels/.rels", ct::OPC_RELATIONSHIPS, b"<Relationships/>"),
            part("/xl/workbook.xml", ct::SML_SHEET_MAIN, b"<workbook/>"),
        ];
        let cursor =
            PackageWriter::write_to(Cursor::new(Vec::new()), &mut parts, ArchiveOptions::default())
                .unwrap();

        let mut archive = zip::ZipArchive::new(cursor).unwrap();
        let names: Vec<_> = archive.file_names().map(str::to_string).collect();
        assert_eq!(names.len(), 3);
        assert_eq!(archive.by_index(0).unwrap().name(), "[Content_Types].xml");
        assert_eq!(archive.by_index(1).unwrap().name(), "_rels/.rels");
        assert_eq!(archive.by_index(2).unwrap().name(), "xl/workbook.xml");

        let mut types = String::new();
        archive
            .by_name("[Content_Types].xml")
            .unwrap()
            .read_to_string(&mut types)
            .unwrap();
        assert!(types.contains(r#"PartName="/xl/workbook.xml""#));
    }
}
