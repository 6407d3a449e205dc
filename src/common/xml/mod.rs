//! XML emission utilities.

pub mod escape;
pub mod writer;

pub use escape::{escape_xml, is_xml_char, validate_xml_text};
pub use writer::{XML_DECLARATION, XmlWriter};
