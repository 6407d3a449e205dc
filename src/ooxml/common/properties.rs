//! Document properties written to `docProps/core.xml` and `docProps/app.xml`.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::xml::XmlWriter;
use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::namespace;

/// Format used by `dcterms:W3CDTF` timestamps.
const W3CDTF: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Document core and extended properties.
///
/// Every field is optional; unset fields are omitted from the output. Timestamps are
/// never filled in implicitly so that identical workbooks stay byte-identical.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentProperties {
    /// Document title
    pub title: Option<String>,
    /// Document subject
    pub subject: Option<String>,
    /// Document creator/author
    pub creator: Option<String>,
    /// Document keywords (comma-separated)
    pub keywords: Option<String>,
    /// Document description
    pub description: Option<String>,
    /// Last modified by
    pub last_modified_by: Option<String>,
    /// Document category
    pub category: Option<String>,
    /// Company, written to the extended properties
    pub company: Option<String>,
    /// Creation date
    pub created: Option<DateTime<Utc>>,
    /// Last modification date
    pub modified: Option<DateTime<Utc>>,
}

impl DocumentProperties {
    /// Create a new empty document properties.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document title.
    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Set the document subject.
    pub fn subject(mut self, subject: &str) -> Self {
        self.subject = Some(subject.to_string());
        self
    }

    /// Set the document creator/author.
    pub fn creator(mut self, creator: &str) -> Self {
        self.creator = Some(creator.to_string());
        self
    }

    /// Set the document keywords.
    pub fn keywords(mut self, keywords: &str) -> Self {
        self.keywords = Some(keywords.to_string());
        self
    }

    /// Set the document description.
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Set who last modified the document.
    pub fn last_modified_by(mut self, name: &str) -> Self {
        self.last_modified_by = Some(name.to_string());
        self
    }

    /// Set the document category.
    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    /// Set the company name.
    pub fn company(mut self, company: &str) -> Self {
        self.company = Some(company.to_string());
        self
    }

    /// Set the creation timestamp.
    pub fn created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    /// Set the modification timestamp.
    pub fn modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }

    /// Write `docProps/core.xml`.
    pub fn write_core_xml<W: Write>(&self, xml: &mut XmlWriter<W>) -> Result<()> {
        xml.decl()?;
        xml.start(
            "cp:coreProperties",
            &[
                ("xmlns:cp", namespace::OPC_CORE_PROPERTIES),
                ("xmlns:dc", namespace::DC_ELEMENTS),
                ("xmlns:dcterms", namespace::DC_TERMS),
                ("xmlns:dcmitype", namespace::DC_MITYPE),
                ("xmlns:xsi", namespace::XSI),
            ],
        )?;

        let fields = [
            ("dc:title", &self.title),
            ("dc:subject", &self.subject),
            ("dc:creator", &self.creator),
            ("cp:keywords", &self.keywords),
            ("dc:description", &self.description),
            ("cp:lastModifiedBy", &self.last_modified_by),
            ("cp:category", &self.category),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                xml.text_element(name, &[], value)?;
            }
        }

        for (name, stamp) in [("dcterms:created", &self.created), ("dcterms:modified", &self.modified)] {
            if let Some(stamp) = stamp {
                let formatted = stamp.format(W3CDTF).to_string();
                xml.text_element(name, &[("xsi:type", "dcterms:W3CDTF")], &formatted)?;
            }
        }

        xml.end("cp:coreProperties")
    }

    /// Write `docProps/app.xml` listing the sheet names grouped by kind.
    pub fn write_app_xml<W: Write>(
        &self,
        xml: &mut XmlWriter<W>,
        worksheets: &[&str],
        chartsheets: &[&str],
    ) -> Result<()> {
        let mut buf = itoa::Buffer::new();

        xml.decl()?;
        xml.start(
            "Properties",
            &[
                ("xmlns", namespace::OFC_EXTENDED_PROPERTIES),
                ("xmlns:vt", namespace::OFC_DOC_PROPS_VTYPES),
            ],
        )?;
        xml.text_element("Application", &[], "Microsoft Excel")?;
        xml.text_element("DocSecurity", &[], "0")?;
        xml.text_element("ScaleCrop", &[], "false")?;

        let groups: Vec<(&str, &[&str])> = [("Worksheets", worksheets), ("Charts", chartsheets)]
            .into_iter()
            .filter(|(_, names)| !names.is_empty())
            .collect();

        xml.start("HeadingPairs", &[])?;
        xml.start(
            "vt:vector",
            &[("size", buf.format(groups.len() * 2)), ("baseType", "variant")],
        )?;
        for (heading, names) in &groups {
            xml.start("vt:variant", &[])?;
            xml.text_element("vt:lpstr", &[], heading)?;
            xml.end("vt:variant")?;
            xml.start("vt:variant", &[])?;
            xml.text_element("vt:i4", &[], buf.format(names.len()))?;
            xml.end("vt:variant")?;
        }
        xml.end("vt:vector")?;
        xml.end("HeadingPairs")?;

        let total = worksheets.len() + chartsheets.len();
        xml.start("TitlesOfParts", &[])?;
        xml.start("vt:vector", &[("size", buf.format(total)), ("baseType", "lpstr")])?;
        for name in worksheets.iter().chain(chartsheets) {
            xml.text_element("vt:lpstr", &[], name)?;
        }
        xml.end("vt:vector")?;
        xml.end("TitlesOfParts")?;

        if let Some(company) = &self.company {
            xml.text_element("Company", &[], company)?;
        }
        xml.text_element("LinksUpToDate", &[], "false")?;
        xml.text_element("SharedDoc", &[], "false")?;
        xml.text_element("HyperlinksChanged", &[], "false")?;
        xml.text_element("AppVersion", &[], "12.0000")?;
        xml.end("Properties")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn core(props: &DocumentProperties) -> String {
        let mut xml = XmlWriter::new(Vec::new());
        props.write_core_xml(&mut xml).unwrap();
        String::from_utf8(xml.into_inner()).unwrap()
    }

    #[test]
    fn test_document_properties_builder() {
        let props = DocumentProperties::new()
            .title("Test Document")
            .creator("John Doe")
            .subject("Testing")
            .keywords("test, document, rust");

        assert_eq!(props.title, Some("Test Document".to_string()));
        assert_eq!(props.creator, Some("John Doe".to_string()));
        assert_eq!(props.subject, Some("Testing".to_string()));
        assert_eq!(props.keywords, Some("test, document, rust".to_string()));
    }

    #[test]
    fn test_core_xml() {
        let created = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        let props = DocumentProperties::new()
            .title("Q&A")
            .creator("Test Author")
            .created(created);

        let xml = core(&props);
        assert!(xml.contains("<dc:title>Q&amp;A</dc:title>"));
        assert!(xml.contains("<dc:creator>Test Author</dc:creator>"));
        assert!(xml.contains(
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">2024-03-09T14:05:00Z</dcterms:created>"#
        ));
        assert!(!xml.contains("dcterms:modified"));
    }

    #[test]
    fn test_unset_timestamps_are_omitted() {
        let xml = core(&DocumentProperties::new());
        assert!(!xml.contains("dcterms:created"));
        assert!(xml.ends_with("</cp:coreProperties>"));
    }

    #[test]
    fn test_app_xml_groups_sheets() {
        let props = DocumentProperties::new().company("Acme");
        let mut xml = XmlWriter::new(Vec::new());
        props
            .write_app_xml(&mut xml, &["Data", "Summary"], &["Chart1"])
            .unwrap();
        let xml = String::from_utf8(xml.into_inner()).unwrap();

        assert!(xml.contains(r#"<vt:vector size="4" baseType="variant">"#));
        assert!(xml.contains("<vt:lpstr>Worksheets</vt:lpstr>"));
        assert!(xml.contains("<vt:i4>2</vt:i4>"));
        assert!(xml.contains("<vt:lpstr>Charts</vt:lpstr>"));
        assert!(xml.contains(r#"<vt:vector size="3" baseType="lpstr"><vt:lpstr>Data</vt:lpstr><vt:lpstr>Summary</vt:lpstr><vt:lpstr>Chart1</vt:lpstr></vt:vector>"#));
        assert!(xml.contains("<Company>Acme</Company>"));
    }
}
