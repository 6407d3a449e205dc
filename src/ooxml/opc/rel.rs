/// Relationship tables for OPC packages.
///
/// Every part that references other parts owns one [`Relationships`] table. Ids are
/// handed out as `rId1, rId2, …` in attachment order and are never reused, so the
/// id a caller receives at population time is the id that lands in the `.rels` part.
use std::collections::BTreeMap;
use std::io::Write;

use crate::common::xml::XmlWriter;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::{namespace, target_mode};
use crate::ooxml::opc::packuri::PackURI;

/// A single relationship from a source part to a target.
///
/// Represents a connection between parts in an OPC package, identified by an rId
/// (relationship ID). Can be either internal (pointing to another part) or external
/// (pointing to an external URL).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1", "rId2")
    r_id: String,

    /// Relationship type URI
    reltype: String,

    /// Target reference - either a part URI relative to the owner or an external URL
    target_ref: String,

    /// Absolute target partname for internal relationships
    target_partname: Option<PackURI>,
}

impl Relationship {
    /// Get the relationship ID.
    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    /// Get the relationship type.
    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    /// Get the target reference.
    ///
    /// For internal relationships, this is a relative part reference.
    /// For external relationships, this is an absolute URL.
    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    /// Check if this is an external relationship.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.target_partname.is_none()
    }

    /// Get the absolute target partname, `None` for external relationships.
    #[inline]
    pub fn target_partname(&self) -> Option<&PackURI> {
        self.target_partname.as_ref()
    }
}

/// Collection of relationships from a single source part, in id order.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    rels: Vec<Relationship>,

    /// Number of ids handed out so far
    counter: u32,
}

impl Relationships {
    /// Create a new empty relationships collection.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, reltype: &str, target_ref: String, target_partname: Option<PackURI>) -> String {
        self.counter += 1;
        let mut buf = itoa::Buffer::new();
        let r_id = format!("rId{}", buf.format(self.counter));
        self.rels.push(Relationship {
            r_id: r_id.clone(),
            reltype: reltype.to_string(),
            target_ref,
            target_partname,
        });
        r_id
    }

    /// Get a relationship by its ID.
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|rel| rel.r_id == r_id)
    }

    /// Iterate relationships in id order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.iter()
    }

    /// Get the number of relationships in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    /// Check if the table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Serialize the table as a `.rels` part.
    ///
    /// # Example output
    /// ```xml
    /// <?xml version="1.0" encoding="UTF-8" standalone="yes"?>
    /// <Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    ///   <Relationship Id="rId1" Type="..." Target="../drawings/drawing1.xml"/>
    /// </Relationships>
    /// ```
    /// (without the indentation)
    pub fn write_xml<W: Write>(&self, xml: &mut XmlWriter<W>) -> Result<()> {
        xml.decl()?;
        xml.start("Relationships", &[("xmlns", namespace::OPC_RELATIONSHIPS)])?;
        for rel in &self.rels {
            if rel.is_external() {
                xml.empty(
                    "Relationship",
                    &[
                        ("Id", &rel.r_id),
                        ("Type", &rel.reltype),
                        ("Target", &rel.target_ref),
                        ("TargetMode", target_mode::EXTERNAL),
                    ],
                )?;
            } else {
                xml.empty(
                    "Relationship",
                    &[("Id", &rel.r_id), ("Type", &rel.reltype), ("Target", &rel.target_ref)],
                )?;
            }
        }
        xml.end("Relationships")
    }

    /// Serialize the table to a standalone byte vector.
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut xml = XmlWriter::new(Vec::with_capacity(256 + self.rels.len() * 160));
        self.write_xml(&mut xml)?;
        Ok(xml.into_inner())
    }
}

/// Owner-keyed relationship tables for a whole package.
///
/// Tables are keyed by the owner's partname; the package itself is the owner
/// [`PACKAGE_URI`](super::packuri::PACKAGE_URI). Once [`seal`](Self::seal) is called
/// every further attachment fails with [`OoxmlError::LifecycleViolation`].
#[derive(Debug, Clone, Default)]
pub struct RelationshipManager {
    tables: BTreeMap<PackURI, Relationships>,
    sealed: bool,
}

impl RelationshipManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an internal relationship from `owner` to `target` and return its id.
    ///
    /// The stored target reference is relative to the owner's directory, e.g.
    /// `../drawings/drawing1.xml` for an owner under `/xl/chartsheets`.
    pub fn attach(&mut self, owner: &PackURI, target: &PackURI, reltype: &str) -> Result<String> {
        self.ensure_open(owner)?;
        let target_ref = target.relative_ref(owner.base_uri());
        let r_id = self
            .tables
            .entry(owner.clone())
            .or_default()
            .push(reltype, target_ref, Some(target.clone()));
        tracing::trace!(owner = %owner, target = %target, r_id = %r_id, "relationship attached");
        Ok(r_id)
    }

    /// Register an external relationship (`TargetMode="External"`) and return its id.
    pub fn attach_external(&mut self, owner: &PackURI, url: &str, reltype: &str) -> Result<String> {
        self.ensure_open(owner)?;
        let r_id = self
            .tables
            .entry(owner.clone())
            .or_default()
            .push(reltype, url.to_string(), None);
        Ok(r_id)
    }

    fn ensure_open(&self, owner: &PackURI) -> Result<()> {
        if self.sealed {
            return Err(OoxmlError::LifecycleViolation(format!(
                "cannot attach a relationship to '{}' after assembly started",
                owner
            )));
        }
        Ok(())
    }

    /// Get the table owned by `owner`, if it has any relationships.
    #[inline]
    pub fn table(&self, owner: &PackURI) -> Option<&Relationships> {
        self.tables.get(owner)
    }

    /// Iterate `(owner, table)` pairs in partname order.
    pub fn iter(&self) -> impl Iterator<Item = (&PackURI, &Relationships)> {
        self.tables.iter()
    }

    /// Number of relationships `owner` has handed out.
    pub fn rel_count(&self, owner: &PackURI) -> u32 {
        self.tables.get(owner).map_or(0, |t| t.counter)
    }

    /// Freeze every table. Subsequent attachments fail.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::relationship_type as RT;
    use crate::ooxml::opc::packuri::PACKAGE_URI;

    fn uri(s: &str) -> PackURI {
        PackURI::new(s).unwrap()
    }

    #[test]
    fn test_ids_are_sequential_per_owner() {
        let mut mgr = RelationshipManager::new();
        let d1 = uri("/xl/drawings/drawing1.xml");
        let d2 = uri("/xl/drawings/drawing2.xml");

        assert_eq!(mgr.attach(&d1, &uri("/xl/charts/chart1.xml"), RT::CHART).unwrap(), "rId1");
        assert_eq!(mgr.attach(&d2, &uri("/xl/charts/chart2.xml"), RT::CHART).unwrap(), "rId1");
        assert_eq!(mgr.attach(&d1, &uri("/xl/charts/chart3.xml"), RT::CHART).unwrap(), "rId2");
        assert_eq!(mgr.rel_count(&d1), 2);
        assert_eq!(mgr.rel_count(&d2), 1);
        assert_eq!(mgr.rel_count(&uri("/xl/workbook.xml")), 0);
    }

    #[test]
    fn test_target_refs_are_relative_to_owner() {
        let mut mgr = RelationshipManager::new();
        let sheet = uri("/xl/chartsheets/sheet2.xml");
        mgr.attach(&sheet, &uri("/xl/drawings/drawing1.xml"), RT::DRAWING).unwrap();
        let pkg = uri(PACKAGE_URI);
        mgr.attach(&pkg, &uri("/xl/workbook.xml"), RT::OFFICE_DOCUMENT).unwrap();

        let rel = mgr.table(&sheet).unwrap().get("rId1").unwrap();
        assert_eq!(rel.target_ref(), "../drawings/drawing1.xml");
        assert_eq!(rel.target_partname().unwrap().as_str(), "/xl/drawings/drawing1.xml");
        assert_eq!(
            mgr.table(&pkg).unwrap().get("rId1").unwrap().target_ref(),
            "xl/workbook.xml"
        );
    }

    #[test]
    fn test_sealed_manager_rejects_attach() {
        let mut mgr = RelationshipManager::new();
        let wb = uri("/xl/workbook.xml");
        mgr.attach(&wb, &uri("/xl/styles.xml"), RT::STYLES).unwrap();
        mgr.seal();

        let err = mgr
            .attach(&wb, &uri("/xl/sharedStrings.xml"), RT::SHARED_STRINGS)
            .unwrap_err();
        assert!(matches!(err, OoxmlError::LifecycleViolation(_)));
        assert!(mgr.attach_external(&wb, "https://example.com", RT::HYPERLINK).is_err());
        assert_eq!(mgr.table(&wb).unwrap().len(), 1);
    }

    #[test]
    fn test_rels_xml() {
        let mut mgr = RelationshipManager::new();
        let ws = uri("/xl/worksheets/sheet1.xml");
        mgr.attach(&ws, &uri("/xl/drawings/drawing1.xml"), RT::DRAWING).unwrap();
        mgr.attach_external(&ws, "https://example.com/?a=1&b=2", RT::HYPERLINK)
            .unwrap();

        let xml = String::from_utf8(mgr.table(&ws).unwrap().to_xml().unwrap()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n"));
        assert!(xml.contains(&format!(
            r#"<Relationship Id="rId1" Type="{}" Target="../drawings/drawing1.xml"/>"#,
            RT::DRAWING
        )));
        assert!(xml.contains(r#"Target="https://example.com/?a=1&amp;b=2" TargetMode="External"/>"#));
        let first = xml.find("rId1").unwrap();
        let second = xml.find("rId2").unwrap();
        assert!(first < second);
    }
}
