//! XML attribute parsing
//!
//! Parses the attribute list of a start tag (everything between the element
//! name and the closing `>`). Values must be quoted; entities are decoded
//! and whitespace is normalized on the way through.

use super::entities::decode_attr_value;
use memchr::memchr;
use std::borrow::Cow;

/// A parsed XML attribute
#[derive(Debug, Clone)]
pub struct Attribute<'a> {
    /// Qualified name as written (may include a namespace prefix)
    pub qname: &'a str,
    /// Attribute value, entities decoded and whitespace normalized
    pub value: Cow<'a, str>,
}

/// A namespace declaration carried by an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NsDecl<'a> {
    /// `xmlns="uri"`
    Default,
    /// `xmlns:prefix="uri"`
    Prefix(&'a str),
}

impl<'a> Attribute<'a> {
    /// Namespace prefix (before the colon), if any
    pub fn prefix(&self) -> Option<&'a str> {
        split_qname(self.qname).0
    }

    /// Local name (after the colon, or the whole name)
    pub fn local_name(&self) -> &'a str {
        split_qname(self.qname).1
    }

    /// Classify this attribute as a namespace declaration, if it is one
    pub fn ns_declaration(&self) -> Option<NsDecl<'a>> {
        if self.qname == "xmlns" {
            Some(NsDecl::Default)
        } else if self.prefix() == Some("xmlns") {
            Some(NsDecl::Prefix(self.local_name()))
        } else {
            None
        }
    }
}

/// Split a qualified name into prefix and local name at the first colon
pub fn split_qname(name: &str) -> (Option<&str>, &str) {
    match memchr(b':', name.as_bytes()) {
        Some(colon) => (Some(&name[..colon]), &name[colon + 1..]),
        None => (None, name),
    }
}

/// Parse attributes from raw tag content (after the element name)
pub fn parse_attributes(input: &str) -> Result<Vec<Attribute<'_>>, &'static str> {
    let bytes = input.as_bytes();
    let mut attrs = Vec::new();
    let mut pos = 0;
    let mut after_value = false;

    while pos < bytes.len() {
        let ws_start = pos;
        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }
        if after_value && pos == ws_start {
            return Err("whitespace required between attributes");
        }

        // Attribute name
        let name_start = pos;
        if !is_name_start_char(bytes[pos]) {
            return Err("attribute name must start with a letter, underscore, or colon");
        }
        while pos < bytes.len() && is_name_char(bytes[pos]) {
            pos += 1;
        }
        let qname = &input[name_start..pos];

        // '=' with optional whitespace around it
        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }
        if pos >= bytes.len() || bytes[pos] != b'=' {
            return Err("attribute value required");
        }
        pos += 1;
        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }
        if pos >= bytes.len() {
            return Err("attribute value required");
        }

        // Quoted value
        let quote = bytes[pos];
        if quote != b'"' && quote != b'\'' {
            return Err("attribute value must be quoted");
        }
        pos += 1;
        let value_start = pos;
        let close = match memchr(quote, &bytes[pos..]) {
            Some(i) => pos + i,
            None => return Err("attribute value has no closing quote"),
        };
        let raw_value = &input[value_start..close];
        if memchr(b'<', raw_value.as_bytes()).is_some() {
            return Err("'<' not allowed in attribute value");
        }
        let value = decode_attr_value(raw_value)?;
        attrs.push(Attribute { qname, value });
        pos = close + 1;
        after_value = true;
    }

    Ok(attrs)
}

#[inline]
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

#[inline]
fn is_name_start_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

#[inline]
fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':') || b >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_attributes() {
        let attrs = parse_attributes(" id=\"test\" class=\"foo\"").unwrap();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].qname, "id");
        assert_eq!(attrs[0].value, "test");
        assert_eq!(attrs[1].qname, "class");
        assert_eq!(attrs[1].value, "foo");
    }

    #[test]
    fn test_single_quoted() {
        let attrs = parse_attributes(" id='test'").unwrap();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].value, "test");
    }

    #[test]
    fn test_namespaced_attribute() {
        let attrs = parse_attributes(" xmlns:xlink=\"http://www.w3.org/1999/xlink\"").unwrap();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].qname, "xmlns:xlink");
        assert_eq!(attrs[0].prefix(), Some("xmlns"));
        assert_eq!(attrs[0].local_name(), "xlink");
        assert_eq!(attrs[0].ns_declaration(), Some(NsDecl::Prefix("xlink")));
    }

    #[test]
    fn test_default_ns_declaration() {
        let attrs = parse_attributes(" xmlns=\"urn:x\"").unwrap();
        assert_eq!(attrs[0].ns_declaration(), Some(NsDecl::Default));
    }

    #[test]
    fn test_plain_attribute_is_no_declaration() {
        let attrs = parse_attributes(" href=\"#\"").unwrap();
        assert_eq!(attrs[0].ns_declaration(), None);
    }

    #[test]
    fn test_entity_in_value() {
        let attrs = parse_attributes(" title=\"&lt;hello&gt;\"").unwrap();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].value, "<hello>");
    }

    #[test]
    fn test_empty_input() {
        let attrs = parse_attributes("").unwrap();
        assert_eq!(attrs.len(), 0);
    }

    #[test]
    fn test_whitespace_around_equals() {
        let attrs = parse_attributes("  id  =  \"test\"  ").unwrap();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].qname, "id");
        assert_eq!(attrs[0].value, "test");
    }

    #[test]
    fn test_unquoted_value_rejected() {
        assert!(parse_attributes(" id=test").is_err());
    }

    #[test]
    fn test_missing_value_rejected() {
        assert!(parse_attributes(" checked").is_err());
    }

    #[test]
    fn test_angle_bracket_in_value_rejected() {
        assert!(parse_attributes(" x=\"a<b\"").is_err());
    }

    #[test]
    fn test_missing_space_between_attributes_rejected() {
        assert!(parse_attributes(" a=\"1\"b=\"2\"").is_err());
    }

    #[test]
    fn test_unclosed_value_rejected() {
        assert!(parse_attributes(" a=\"1").is_err());
    }
}
