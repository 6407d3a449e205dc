/// Provides the PackURI value type and utilities for working with package URIs.
///
/// A PackURI represents a part name within an OPC package, following the URI format
/// defined by the Open Packaging Conventions.
use std::fmt;

/// Represents a package URI, which is a partname within an OPC package.
///
/// PackURIs always begin with a forward slash and use forward slashes as path separators,
/// as OPC requires. They provide access to various components like
/// the base URI (directory), filename and extension.
///
/// Ordering is plain string ordering, which keeps maps keyed by partname deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackURI {
    /// The full pack URI string (e.g., "/xl/workbook.xml")
    uri: String,
}

impl PackURI {
    /// Create a new PackURI from a string.
    ///
    /// # Arguments
    /// * `uri` - The URI string, which must begin with a forward slash
    ///
    /// # Returns
    /// * `Ok(PackURI)` if the URI is valid
    /// * `Err` if the URI doesn't start with a forward slash
    pub fn new<S: Into<String>>(uri: S) -> Result<Self, String> {
        let uri = uri.into();
        if !uri.starts_with('/') {
            return Err(format!("PackURI must begin with slash, got '{}'", uri));
        }
        Ok(PackURI { uri })
    }

    /// Build a PackURI from a path the crate itself formats with a leading slash.
    pub(crate) fn from_abs(uri: String) -> Self {
        debug_assert!(uri.starts_with('/'), "partname without leading slash: {uri}");
        PackURI { uri }
    }

    /// Get the base URI (directory portion) of this PackURI.
    ///
    /// For example, "/xl/worksheets" for "/xl/worksheets/sheet1.xml".
    /// For the package pseudo-partname "/", returns "/".
    pub fn base_uri(&self) -> &str {
        match self.uri.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// Get the filename portion of this PackURI.
    ///
    /// For the package pseudo-partname "/", returns an empty string.
    pub fn filename(&self) -> &str {
        match self.uri.rfind('/') {
            Some(pos) => &self.uri[pos + 1..],
            None => "",
        }
    }

    /// Get the extension portion of this PackURI, without the leading period.
    pub fn ext(&self) -> &str {
        let filename = self.filename();
        match filename.rfind('.') {
            Some(pos) => &filename[pos + 1..],
            None => "",
        }
    }

    /// Get the membername (URI with leading slash stripped).
    ///
    /// This is the form used as the Zip file membername for the package item.
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// Get the relative reference from a base URI to this PackURI.
    ///
    /// For example, PackURI("/xl/drawings/drawing1.xml") returns
    /// "../drawings/drawing1.xml" for base_uri "/xl/chartsheets".
    pub fn relative_ref(&self, base_uri: &str) -> String {
        if base_uri == "/" {
            return self.membername().to_string();
        }

        let from_parts: Vec<&str> = base_uri.split('/').filter(|s| !s.is_empty()).collect();
        let to_parts: Vec<&str> = self.uri.split('/').filter(|s| !s.is_empty()).collect();

        // The filename never counts towards the common prefix
        let common = from_parts
            .iter()
            .zip(to_parts.iter().take(to_parts.len().saturating_sub(1)))
            .take_while(|(a, b)| a == b)
            .count();

        let mut result = String::new();
        for _ in common..from_parts.len() {
            result.push_str("../");
        }
        result.push_str(&to_parts[common..].join("/"));
        result
    }

    /// Get the PackURI of the .rels part corresponding to this PackURI.
    ///
    /// For example, "/xl/_rels/workbook.xml.rels" for "/xl/workbook.xml", and
    /// "/_rels/.rels" for the package pseudo-partname.
    pub fn rels_uri(&self) -> PackURI {
        let filename = self.filename();
        let base_uri = self.base_uri();
        if base_uri == "/" {
            PackURI::from_abs(format!("/_rels/{}.rels", filename))
        } else {
            PackURI::from_abs(format!("{}/_rels/{}.rels", base_uri, filename))
        }
    }

    /// Get the full URI string.
    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

impl fmt::Display for PackURI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

impl AsRef<str> for PackURI {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

/// The package pseudo-partname, representing the package itself
pub const PACKAGE_URI: &str = "/";

/// The URI for the [Content_Types].xml part
pub const CONTENT_TYPES_URI: &str = "/[Content_Types].xml";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packuri_new() {
        assert!(PackURI::new("/xl/workbook.xml").is_ok());
        assert!(PackURI::new("xl/workbook.xml").is_err());
    }

    #[test]
    fn test_components() {
        let uri = PackURI::new("/xl/chartsheets/sheet2.xml").unwrap();
        assert_eq!(uri.base_uri(), "/xl/chartsheets");
        assert_eq!(uri.filename(), "sheet2.xml");
        assert_eq!(uri.ext(), "xml");
        assert_eq!(uri.membername(), "xl/chartsheets/sheet2.xml");

        let root = PackURI::new(PACKAGE_URI).unwrap();
        assert_eq!(root.base_uri(), "/");
        assert_eq!(root.filename(), "");
    }

    #[test]
    fn test_rels_uri() {
        let wb = PackURI::new("/xl/workbook.xml").unwrap();
        assert_eq!(wb.rels_uri().as_str(), "/xl/_rels/workbook.xml.rels");

        let sheet = PackURI::new("/xl/chartsheets/sheet2.xml").unwrap();
        assert_eq!(
            sheet.rels_uri().as_str(),
            "/xl/chartsheets/_rels/sheet2.xml.rels"
        );

        let root = PackURI::new(PACKAGE_URI).unwrap();
        assert_eq!(root.rels_uri().as_str(), "/_rels/.rels");
    }

    #[test]
    fn test_relative_ref() {
        let drawing = PackURI::new("/xl/drawings/drawing1.xml").unwrap();
        assert_eq!(drawing.relative_ref("/xl/chartsheets"), "../drawings/drawing1.xml");
        assert_eq!(
            PackURI::new("/xl/charts/chart3.xml").unwrap().relative_ref("/xl/drawings"),
            "../charts/chart3.xml"
        );

        let sheet = PackURI::new("/xl/worksheets/sheet1.xml").unwrap();
        assert_eq!(sheet.relative_ref("/xl"), "worksheets/sheet1.xml");

        let wb = PackURI::new("/xl/workbook.xml").unwrap();
        assert_eq!(wb.relative_ref("/"), "xl/workbook.xml");
    }
}
