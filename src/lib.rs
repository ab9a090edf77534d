//! qdom - Quick DOM: streaming XML parsing into a minimal element tree
//!
//! Pipeline:
//!
//! ```text
//! bytes --> UTF-8 text --> Tokenizer --> TreeBuilder --> Element
//! ```
//!
//! The tokenizer scans the whole input in one pass, resolving namespaced
//! names to `URI local-name`, and pushes start/characters/end events into
//! a [`TreeBuilder`]. The builder folds them into a tree of [`Element`]
//! values: attributes and children per element, plus the trimmed text
//! content set when the end tag arrives.
//!
//! ```
//! let root = qdom::parse_bytes(b"<a x=\"1\"><b>hello</b><c/></a>")?;
//! assert_eq!(root.local_name, "a");
//! assert_eq!(root.get_attribute("x"), Some("1"));
//! assert_eq!(root.children[0].content, "hello");
//! # Ok::<(), qdom::Error>(())
//! ```
//!
//! Parsing is always strict: malformed XML, undefined entities, unbound
//! namespace prefixes, and unsupported encodings are reported as errors,
//! never patched over.

pub mod core;
pub mod dom;
mod error;
pub mod sax;

pub use dom::Element;
pub use error::{Error, Result};
pub use sax::{SaxHandler, TreeBuilder};

use crate::core::encoding::convert_to_utf8;
use crate::core::tokenizer::Tokenizer;
use std::io::Read;
use tracing::debug;

/// Knobs for the parse entry points
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Character joining a namespace URI to a local name in resolved names
    pub namespace_separator: char,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            namespace_separator: ' ',
        }
    }
}

/// Parse a complete XML document from a reader
///
/// Drains the reader to the end first; parsing is not incremental across
/// reads.
pub fn parse<R: Read>(mut source: R) -> Result<Element> {
    let mut input = Vec::new();
    source.read_to_end(&mut input)?;
    parse_bytes(&input)
}

/// Parse a complete XML document held in memory
pub fn parse_bytes(input: &[u8]) -> Result<Element> {
    parse_bytes_with(input, &ParseOptions::default())
}

/// Parse with explicit options
pub fn parse_bytes_with(input: &[u8], options: &ParseOptions) -> Result<Element> {
    let text = convert_to_utf8(input.to_vec())?;
    debug!("parsing {} bytes of XML text", text.len());
    let mut builder = TreeBuilder::with_separator(options.namespace_separator);
    Tokenizer::with_separator(&text, options.namespace_separator).run(&mut builder)?;
    let root = builder.into_document()?;
    debug!("parsed document, root element '{}'", root.local_name);
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn count_elements(element: &Element) -> usize {
        1 + element.children.iter().map(count_elements).sum::<usize>()
    }

    fn utf16_le(text: &str) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    fn utf16_be(text: &str) -> Vec<u8> {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        bytes
    }

    #[test]
    fn test_nested_document() {
        let root = parse_bytes(b"<a x=\"1\"><b>hello</b><c/></a>").unwrap();
        assert_eq!(root.local_name, "a");
        assert_eq!(root.get_attribute("x"), Some("1"));
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].local_name, "b");
        assert_eq!(root.children[0].content, "hello");
        assert_eq!(root.children[1].local_name, "c");
        assert!(root.children[1].children.is_empty());
        assert_eq!(root.children[1].content, "");
    }

    #[test]
    fn test_element_count_matches_start_tags() {
        let root = parse_bytes(b"<a><b><c/><d/></b><e>x</e></a>").unwrap();
        assert_eq!(count_elements(&root), 5);
    }

    #[test]
    fn test_deeply_nested_document() {
        let depth = 70_000;
        let mut doc = String::with_capacity(depth * 7);
        for _ in 0..depth {
            doc.push_str("<a>");
        }
        for _ in 0..depth {
            doc.push_str("</a>");
        }

        let mut element = parse_bytes(doc.as_bytes()).unwrap();
        let mut count = 1;
        // Dismantle one level at a time; dropping a chain this deep in one
        // go would recurse once per level
        while let Some(child) = element.children.pop() {
            element = child;
            count += 1;
        }
        assert_eq!(count, depth);
    }

    #[test]
    fn test_children_in_document_order() {
        let root = parse_bytes(b"<r><one/><two/><three/></r>").unwrap();
        let names: Vec<&str> = root
            .children
            .iter()
            .map(|child| child.local_name.as_str())
            .collect();
        assert_eq!(names, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_unmatched_close_is_an_error() {
        let err = parse_bytes(b"<a></b>").unwrap_err();
        assert!(err.is_parse_error());
        assert!(matches!(err, Error::TagMismatch { .. }));
    }

    #[test]
    fn test_namespace_qualified_element() {
        let root = parse_bytes(b"<ns:tag xmlns:ns=\"urn:x\"/>").unwrap();
        assert_eq!(root.namespace_uri.as_deref(), Some("urn:x"));
        assert_eq!(root.local_name, "tag");
    }

    #[test]
    fn test_unqualified_element_has_no_namespace() {
        let root = parse_bytes(b"<tag/>").unwrap();
        assert_eq!(root.namespace_uri, None);
        assert_eq!(root.local_name, "tag");
    }

    #[test]
    fn test_default_namespace_inherited() {
        let root = parse_bytes(b"<a xmlns=\"urn:x\"><b/></a>").unwrap();
        assert_eq!(root.namespace_uri.as_deref(), Some("urn:x"));
        assert_eq!(root.children[0].namespace_uri.as_deref(), Some("urn:x"));
        assert_eq!(root.children[0].local_name, "b");
    }

    #[test]
    fn test_xmlns_attributes_not_stored() {
        let root = parse_bytes(b"<a xmlns=\"urn:x\" xmlns:p=\"urn:p\" x=\"1\"/>").unwrap();
        assert_eq!(root.attributes.len(), 1);
        assert_eq!(root.get_attribute("x"), Some("1"));
    }

    #[test]
    fn test_absent_attribute_is_none() {
        let root = parse_bytes(b"<a x=\"1\"/>").unwrap();
        assert_eq!(root.get_attribute("y"), None);
    }

    #[test]
    fn test_text_after_last_child_wins() {
        let root = parse_bytes(b"<a> pre <b>inner</b> kept </a>").unwrap();
        assert_eq!(root.content, "kept");
        assert_eq!(root.children[0].content, "inner");
    }

    #[test]
    fn test_entities_decoded_in_text() {
        let root = parse_bytes(b"<a>&lt;&amp;&gt; &#65;</a>").unwrap();
        assert_eq!(root.content, "<&> A");
    }

    #[test]
    fn test_cdata_becomes_content() {
        let root = parse_bytes(b"<a><![CDATA[1 < 2]]></a>").unwrap();
        assert_eq!(root.content, "1 < 2");
    }

    #[test]
    fn test_text_joined_across_comment_and_cdata() {
        let root = parse_bytes(b"<a>one<!-- note -->two<![CDATA[ three]]></a>").unwrap();
        assert_eq!(root.content, "onetwo three");
    }

    #[test]
    fn test_parse_from_reader() {
        let root = parse(Cursor::new(b"<a>hi</a>".to_vec())).unwrap();
        assert_eq!(root.content, "hi");
    }

    #[test]
    fn test_utf16_le_with_bom() {
        let doc = "<a x=\"1\"><b>h\u{e9}llo</b></a>";
        let root = parse_bytes(&utf16_le(doc)).unwrap();
        assert_eq!(root, parse_bytes(doc.as_bytes()).unwrap());
        assert_eq!(root.children[0].content, "h\u{e9}llo");
    }

    #[test]
    fn test_utf16_be_with_bom() {
        let doc = "<a x=\"1\"/>";
        let root = parse_bytes(&utf16_be(doc)).unwrap();
        assert_eq!(root, parse_bytes(doc.as_bytes()).unwrap());
        assert_eq!(root.get_attribute("x"), Some("1"));
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let root = parse_bytes(b"\xEF\xBB\xBF<a/>").unwrap();
        assert_eq!(root.local_name, "a");
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let err = parse_bytes(b"<a>\xFF</a>").unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }

    #[test]
    fn test_empty_input_has_no_root() {
        assert!(matches!(parse_bytes(b""), Err(Error::NoRootElement)));
    }

    #[test]
    fn test_custom_separator_roundtrip() {
        let options = ParseOptions {
            namespace_separator: '|',
        };
        let root = parse_bytes_with(b"<ns:tag xmlns:ns=\"urn:x\"/>", &options).unwrap();
        assert_eq!(root.namespace_uri.as_deref(), Some("urn:x"));
        assert_eq!(root.local_name, "tag");
    }

    #[test]
    fn test_declaration_and_doctype_prolog() {
        let input = b"<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE a>\n<a>ok</a>";
        let root = parse_bytes(input).unwrap();
        assert_eq!(root.content, "ok");
    }

    #[test]
    fn test_unbound_prefix_surfaces() {
        let err = parse_bytes(b"<p:a/>").unwrap_err();
        assert!(matches!(err, Error::UnboundPrefix { ref prefix, .. } if prefix == "p"));
    }
}
