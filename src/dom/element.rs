//! Element - owned XML tree node
//!
//! A plain value type: namespace URI, local name, attributes, children,
//! and the trimmed text content. Built once by the tree builder and not
//! mutated afterwards; callers own the returned tree outright.

use std::collections::HashMap;
use std::fmt;

/// A single element in the parsed tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Namespace URI the element name was resolved against, if any
    pub namespace_uri: Option<String>,
    /// Element name with any namespace part removed
    pub local_name: String,
    /// Attribute name to value mapping, copied at construction
    pub attributes: HashMap<String, String>,
    /// Child elements in document order
    pub children: Vec<Element>,
    /// Character data directly inside this element, whitespace-trimmed.
    /// Empty until the element's end tag is seen.
    pub content: String,
}

impl Element {
    /// Create an element with no children and empty content
    ///
    /// The attribute pairs are copied into the element's own map, so later
    /// changes to the source slice cannot affect it.
    pub fn new(
        namespace_uri: Option<String>,
        local_name: String,
        attributes: &[(String, String)],
    ) -> Self {
        Element {
            namespace_uri,
            local_name,
            attributes: attributes.iter().cloned().collect(),
            children: Vec::new(),
            content: String::new(),
        }
    }

    /// Look up an attribute value by name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Diagnostic rendering: `<{uri}name attr=val ...>` plus children or
/// content. Not valid XML (values are unquoted and unescaped); useful in
/// logs and test failures, nothing more.
impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<")?;
        if let Some(uri) = &self.namespace_uri {
            write!(f, "{{{}}}", uri)?;
        }
        write!(f, "{}", self.local_name)?;
        for (name, value) in &self.attributes {
            write!(f, " {}={}", name, value)?;
        }
        if !self.children.is_empty() {
            write!(f, ">")?;
            for (i, child) in self.children.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                write!(f, "{}", child)?;
            }
            write!(f, "</{}>", self.local_name)
        } else if !self.content.is_empty() {
            write!(f, ">{}</{}>", self.content, self.local_name)
        } else {
            write!(f, "/>")
        }
    }
}
