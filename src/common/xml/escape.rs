use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use std::borrow::Cow;

use crate::ooxml::error::{OoxmlError, Result};

// Static initialization: automaton is built only once, thread-safe
static XML_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "'"])
        .expect("Failed to build XML escaper")
});

const XML_ENTITIES: [&str; 5] = ["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"];

/// Escape XML special characters.
///
/// All five predefined entities are substituted, so the result is safe both as
/// element text and inside a double- or single-quoted attribute value. Input
/// without special characters is returned borrowed.
///
/// # Examples
///
/// ```
/// use litchi_writer::common::xml::escape_xml;
/// assert_eq!(escape_xml("a & b"), "a &amp; b");
/// assert_eq!(escape_xml("It's <b>"), "It&apos;s &lt;b&gt;");
/// assert_eq!(escape_xml("plain"), "plain");
/// ```
#[inline]
pub fn escape_xml(s: &str) -> Cow<'_, str> {
    if XML_ESCAPER.is_match(s) {
        Cow::Owned(XML_ESCAPER.replace_all(s, &XML_ENTITIES))
    } else {
        Cow::Borrowed(s)
    }
}

/// Whether `c` matches the XML 1.0 `Char` production.
///
/// Surrogates cannot occur in a Rust `char`, so only the C0 controls (other
/// than tab, line feed and carriage return) and U+FFFE/U+FFFF are excluded.
#[inline]
pub fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Reject text that cannot be represented in an XML document.
///
/// Returns [`OoxmlError::InvalidContent`] naming the first offending character
/// and its byte offset.
pub fn validate_xml_text(s: &str) -> Result<()> {
    match s.char_indices().find(|&(_, c)| !is_xml_char(c)) {
        Some((offset, c)) => Err(OoxmlError::InvalidContent(format!(
            "character U+{:04X} at byte {} is not allowed in XML",
            c as u32, offset
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_escape_all_entities() {
        assert_eq!(
            escape_xml(r#"<foo & "bar" 'baz'>"#),
            "&lt;foo &amp; &quot;bar&quot; &apos;baz&apos;&gt;"
        );
    }

    #[test]
    fn test_escape_borrows_clean_input() {
        assert!(matches!(escape_xml("Sheet1"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_validate_rejects_controls() {
        assert!(validate_xml_text("tab\tnewline\ncr\r").is_ok());
        let err = validate_xml_text("bell\u{7}").unwrap_err();
        assert!(matches!(err, OoxmlError::InvalidContent(_)));
        assert!(err.to_string().contains("U+0007"));
        assert!(validate_xml_text("\u{FFFE}").is_err());
        assert!(validate_xml_text("emoji \u{1F600}").is_ok());
    }

    proptest! {
        #[test]
        fn prop_escaped_text_has_no_markup(s in "\\PC{0,40}") {
            let escaped = escape_xml(&s);
            prop_assert!(!escaped.contains('<'));
            prop_assert!(!escaped.contains('>'));
            prop_assert!(!escaped.contains('"'));
            prop_assert!(!escaped.contains('\''));
        }
    }
}
