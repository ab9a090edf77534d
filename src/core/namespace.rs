//! Namespace resolution
//!
//! Stack-based prefix-to-URI bindings, pushed and popped with element
//! scopes. Resolution scans newest-to-oldest so inner declarations shadow
//! outer ones. The `xml` prefix is pre-bound; `xmlns` is reserved.

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
}

/// Namespace binding (prefix -> URI); the default namespace uses an empty
/// prefix and an empty URI means "unbound"
#[derive(Debug, Clone)]
struct NsBinding {
    prefix: String,
    uri: String,
    depth: usize,
}

/// Stack-based namespace resolver
#[derive(Debug)]
pub struct NamespaceResolver {
    bindings: Vec<NsBinding>,
    depth: usize,
}

impl NamespaceResolver {
    /// Create a new resolver with the xml and xmlns prefixes pre-bound
    pub fn new() -> Self {
        let mut resolver = NamespaceResolver {
            bindings: Vec::with_capacity(16),
            depth: 0,
        };
        resolver.bindings.push(NsBinding {
            prefix: "xml".to_string(),
            uri: ns::XML.to_string(),
            depth: 0,
        });
        resolver.bindings.push(NsBinding {
            prefix: "xmlns".to_string(),
            uri: ns::XMLNS.to_string(),
            depth: 0,
        });
        resolver
    }

    /// Enter a new element scope
    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave an element scope, removing any bindings declared in it
    pub fn pop_scope(&mut self) {
        while let Some(binding) = self.bindings.last() {
            if binding.depth < self.depth {
                break;
            }
            self.bindings.pop();
        }
        self.depth = self.depth.saturating_sub(1);
    }

    /// Declare a prefix binding for the current scope
    ///
    /// The prefix must be a legal NCName shape (non-empty, no colon); an
    /// empty prefix here is not a default-namespace declaration, it is a
    /// malformed `xmlns:` attribute. Also enforces the reserved-name rules:
    /// `xmlns` is never declarable, `xml` only to its fixed URI, no other
    /// prefix may claim the xml/xmlns URIs, and a prefix cannot be
    /// undeclared with an empty URI.
    pub fn declare(&mut self, prefix: &str, uri: &str) -> Result<(), &'static str> {
        if prefix.is_empty() {
            return Err("a namespace declaration must name a non-empty prefix");
        }
        if prefix.contains(':') {
            return Err("a namespace prefix cannot contain a colon");
        }
        if prefix == "xmlns" {
            return Err("the 'xmlns' prefix cannot be declared");
        }
        if prefix == "xml" {
            if uri != ns::XML {
                return Err("the 'xml' prefix is bound to its fixed namespace");
            }
            return Ok(());
        }
        if uri == ns::XML || uri == ns::XMLNS {
            return Err("reserved namespace URI cannot be bound to another prefix");
        }
        if uri.is_empty() {
            return Err("a namespace prefix cannot be undeclared");
        }
        self.bindings.push(NsBinding {
            prefix: prefix.to_string(),
            uri: uri.to_string(),
            depth: self.depth,
        });
        Ok(())
    }

    /// Declare the default namespace for the current scope; an empty URI
    /// undeclares it
    pub fn declare_default(&mut self, uri: &str) -> Result<(), &'static str> {
        if uri == ns::XML || uri == ns::XMLNS {
            return Err("reserved namespace URI cannot be the default namespace");
        }
        self.bindings.push(NsBinding {
            prefix: String::new(),
            uri: uri.to_string(),
            depth: self.depth,
        });
        Ok(())
    }

    /// Resolve a prefix to a namespace URI, newest binding first
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        for binding in self.bindings.iter().rev() {
            if binding.prefix == prefix {
                return Some(binding.uri.as_str());
            }
        }
        None
    }

    /// Resolve the default namespace; None when unbound or undeclared
    pub fn default_uri(&self) -> Option<&str> {
        for binding in self.bindings.iter().rev() {
            if binding.prefix.is_empty() {
                if binding.uri.is_empty() {
                    return None;
                }
                return Some(binding.uri.as_str());
            }
        }
        None
    }
}

impl Default for NamespaceResolver {
    fn default() -> Self {
        Self::new()
    }
}
