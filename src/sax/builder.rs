//! Tree builder - SAX events to an Element tree
//!
//! A stack machine over the three handler events. Start tags push a fresh
//! element, character data accumulates, end tags trim the accumulated text
//! into the finished element and attach it to its parent. All state lives
//! in the builder value itself and lasts exactly one parse.

use crate::dom::Element;
use crate::error::{Error, Result};
use crate::sax::SaxHandler;

/// Builds an [`Element`] tree from SAX events
pub struct TreeBuilder {
    separator: char,
    stack: Vec<Element>,
    text: String,
    root: Option<Element>,
}

impl TreeBuilder {
    /// Create a builder expecting the default namespace separator (a space)
    pub fn new() -> Self {
        Self::with_separator(' ')
    }

    /// Create a builder that splits incoming names on the given separator
    ///
    /// Must match the separator the tokenizer joins names with.
    pub fn with_separator(separator: char) -> Self {
        TreeBuilder {
            separator,
            stack: Vec::new(),
            text: String::new(),
            root: None,
        }
    }

    /// Take the finished tree out of the builder
    ///
    /// Fails with [`Error::NoRootElement`] if no element was ever completed.
    pub fn into_document(self) -> Result<Element> {
        self.root.ok_or(Error::NoRootElement)
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SaxHandler for TreeBuilder {
    fn start_element(&mut self, name: &str, attributes: &[(String, String)]) -> Result<()> {
        // Split on the first separator occurrence only; the local name
        // keeps any later ones
        let (namespace_uri, local_name) = match name.split_once(self.separator) {
            Some((uri, local)) => (Some(uri.to_string()), local.to_string()),
            None => (None, name.to_string()),
        };
        self.stack
            .push(Element::new(namespace_uri, local_name, attributes));
        // Text seen before a child element belongs to no one
        self.text.clear();
        Ok(())
    }

    fn characters(&mut self, fragment: &str) -> Result<()> {
        self.text.push_str(fragment);
        Ok(())
    }

    fn end_element(&mut self, name: &str) -> Result<()> {
        let mut element = match self.stack.pop() {
            Some(element) => element,
            None => {
                return Err(Error::StackUnderflow {
                    name: name.to_string(),
                })
            }
        };
        element.content = self.text.trim().to_string();
        self.text.clear();
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None => self.root = Some(element),
        }
        Ok(())
    }
}
