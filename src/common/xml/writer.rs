//! Streaming XML emitter used by every part assembler.
//!
//! The writer knows nothing about spreadsheets: it appends declarations,
//! elements, attributes and text to an output sink, escaping as it goes.
//! Attributes are written in exactly the order the caller supplies them so
//! that identical input always produces identical bytes.

use std::io::Write;

use super::escape::{escape_xml, validate_xml_text};
use crate::ooxml::error::Result;

/// The declaration every OOXML part starts with.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Append-only XML writer over any [`Write`] sink.
///
/// Text and attribute values are validated against the XML character range
/// and escaped. Element and attribute names are emitted as given.
///
/// # Examples
///
/// ```
/// use litchi_writer::common::xml::XmlWriter;
///
/// let mut xml = XmlWriter::new(Vec::new());
/// xml.start("sheets", &[])?;
/// xml.empty("sheet", &[("name", "Q&A"), ("sheetId", "1")])?;
/// xml.end("sheets")?;
/// assert_eq!(
///     String::from_utf8(xml.into_inner()).unwrap(),
///     r#"<sheets><sheet name="Q&amp;A" sheetId="1"/></sheets>"#
/// );
/// # Ok::<(), litchi_writer::OoxmlError>(())
/// ```
#[derive(Debug)]
pub struct XmlWriter<W: Write> {
    inner: W,
}

impl<W: Write> XmlWriter<W> {
    /// Wrap an output sink.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write the standalone UTF-8 declaration followed by a newline.
    pub fn decl(&mut self) -> Result<()> {
        self.inner.write_all(XML_DECLARATION.as_bytes())?;
        self.inner.write_all(b"\n")?;
        Ok(())
    }

    /// Write `<name attr="value" ...>`.
    pub fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.open_tag(name, attrs)?;
        self.inner.write_all(b">")?;
        Ok(())
    }

    /// Write `<name attr="value" .../>`.
    pub fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.open_tag(name, attrs)?;
        self.inner.write_all(b"/>")?;
        Ok(())
    }

    /// Write `</name>`.
    pub fn end(&mut self, name: &str) -> Result<()> {
        self.inner.write_all(b"</")?;
        self.inner.write_all(name.as_bytes())?;
        self.inner.write_all(b">")?;
        Ok(())
    }

    /// Write escaped character data.
    pub fn text(&mut self, content: &str) -> Result<()> {
        validate_xml_text(content)?;
        self.inner.write_all(escape_xml(content).as_bytes())?;
        Ok(())
    }

    /// Write `<name ...>content</name>`.
    pub fn text_element(&mut self, name: &str, attrs: &[(&str, &str)], content: &str) -> Result<()> {
        self.start(name, attrs)?;
        self.text(content)?;
        self.end(name)
    }

    /// Get a mutable reference to the underlying sink.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Consume the writer and return the sink.
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn open_tag(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.inner.write_all(b"<")?;
        self.inner.write_all(name.as_bytes())?;
        for (key, value) in attrs {
            validate_xml_text(value)?;
            self.inner.write_all(b" ")?;
            self.inner.write_all(key.as_bytes())?;
            self.inner.write_all(b"=\"")?;
            self.inner.write_all(escape_xml(value).as_bytes())?;
            self.inner.write_all(b"\"")?;
        }
        Ok(())
    }
}
