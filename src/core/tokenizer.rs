//! XML tokenizer - push-mode scanning over a SAX handler
//!
//! Walks the input once and reports element starts, character data, and
//! element ends to a [`SaxHandler`]. Namespaces are resolved on the way
//! through: names are reported as `URI{separator}local-name`, namespace
//! declaration attributes are consumed, and end tags reuse the name
//! resolved for their start tag. Always strict: any malformed construct
//! aborts with an error rather than being patched over.

use super::attributes::{parse_attributes, split_qname, NsDecl};
use super::encoding::is_supported_encoding;
use super::entities::{decode_cdata, decode_text, validate_chars};
use super::namespace::NamespaceResolver;
use super::scanner::Scanner;
use crate::error::{Error, Result};
use crate::sax::SaxHandler;
use tracing::trace;

/// An element whose start tag has been reported but whose end tag has not.
///
/// The raw qualified name is kept for end-tag matching (well-formedness is
/// checked on the names as written) and the resolved name is kept so the
/// end tag is reported under the bindings that were in scope at the start.
struct OpenTag {
    qname: String,
    resolved: String,
}

/// Streaming XML tokenizer
///
/// Single-shot: build one per document and consume it with [`Tokenizer::run`].
pub struct Tokenizer<'a> {
    text: &'a str,
    scanner: Scanner<'a>,
    namespaces: NamespaceResolver,
    open: Vec<OpenTag>,
    separator: char,
    root_seen: bool,
    doctype_seen: bool,
}

impl<'a> Tokenizer<'a> {
    /// Create a tokenizer with the default namespace separator (a space)
    pub fn new(input: &'a str) -> Self {
        Self::with_separator(input, ' ')
    }

    /// Create a tokenizer that joins namespace URIs and local names with
    /// the given separator character
    pub fn with_separator(input: &'a str, separator: char) -> Self {
        Tokenizer {
            text: input,
            scanner: Scanner::new(input.as_bytes()),
            namespaces: NamespaceResolver::new(),
            open: Vec::new(),
            separator,
            root_seen: false,
            doctype_seen: false,
        }
    }

    /// Scan the whole input, reporting events to the handler
    ///
    /// Stops at the first error; handler errors propagate unchanged.
    pub fn run<H: SaxHandler>(mut self, handler: &mut H) -> Result<()> {
        while !self.scanner.is_eof() {
            if self.scanner.peek() == Some(b'<') {
                self.scan_markup(handler)?;
            } else {
                self.scan_text(handler)?;
            }
        }
        if !self.open.is_empty() {
            return Err(Error::UnexpectedEof {
                position: self.scanner.position(),
            });
        }
        if !self.root_seen {
            return Err(Error::NoRootElement);
        }
        Ok(())
    }

    // =======================================================================
    // Dispatch
    // =======================================================================

    fn scan_markup<H: SaxHandler>(&mut self, handler: &mut H) -> Result<()> {
        match self.scanner.peek_at(1) {
            Some(b'/') => self.scan_end_tag(handler),
            Some(b'!') => {
                if self.scanner.starts_with(b"<!--") {
                    self.scan_comment()
                } else if self.scanner.starts_with(b"<![CDATA[") {
                    self.scan_cdata(handler)
                } else if self.scanner.starts_with(b"<!DOCTYPE") {
                    self.scan_doctype()
                } else {
                    Err(Error::syntax(
                        "unrecognized markup declaration",
                        self.scanner.position(),
                    ))
                }
            }
            Some(b'?') => self.scan_pi(),
            Some(_) => self.scan_start_tag(handler),
            None => Err(Error::UnexpectedEof {
                position: self.scanner.position(),
            }),
        }
    }

    fn scan_text<H: SaxHandler>(&mut self, handler: &mut H) -> Result<()> {
        let start = self.scanner.position();
        let end = match self.scanner.find_tag_start() {
            Some(lt) => lt,
            None => self.text.len(),
        };
        self.scanner.set_position(end);
        let raw = self.slice(start, end);

        if self.open.is_empty() {
            // Only whitespace may appear outside the root element
            if let Some(offset) = raw
                .bytes()
                .position(|b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
            {
                let message = if self.root_seen {
                    "junk after document element"
                } else {
                    "text outside the root element"
                };
                return Err(Error::syntax(message, start + offset));
            }
            return Ok(());
        }

        let decoded = decode_text(raw).map_err(|message| Error::syntax(message, start))?;
        handler.characters(&decoded)
    }

    // =======================================================================
    // Tags
    // =======================================================================

    fn scan_start_tag<H: SaxHandler>(&mut self, handler: &mut H) -> Result<()> {
        let tag_start = self.scanner.position();
        self.scanner.advance(1);

        let name_start = self.scanner.position();
        if self.scanner.read_name().is_none() {
            return Err(self.bad_name("expected an element name"));
        }
        let name_end = self.scanner.position();
        let qname = self.slice(name_start, name_end);

        if self.open.is_empty() && self.root_seen {
            return Err(Error::MultipleRoots {
                position: tag_start,
            });
        }

        let gt = match self.scanner.find_tag_end_quoted() {
            Some(gt) => gt,
            None => {
                return Err(Error::UnexpectedEof {
                    position: self.scanner.position(),
                })
            }
        };
        let mut content_end = gt;
        let empty = content_end > name_end && self.text.as_bytes()[content_end - 1] == b'/';
        if empty {
            content_end -= 1;
        }
        let content = self.slice(name_end, content_end);

        let attrs =
            parse_attributes(content).map_err(|message| Error::syntax(message, tag_start))?;
        for i in 1..attrs.len() {
            let name = attrs[i].qname;
            if attrs[..i].iter().any(|other| other.qname == name) {
                return Err(Error::DuplicateAttribute {
                    name: name.to_string(),
                    position: tag_start,
                });
            }
        }

        // Declarations on this tag are in scope for its own name and attributes
        self.namespaces.push_scope();
        for attr in &attrs {
            match attr.ns_declaration() {
                Some(NsDecl::Default) => self
                    .namespaces
                    .declare_default(&attr.value)
                    .map_err(|message| Error::syntax(message, tag_start))?,
                Some(NsDecl::Prefix(prefix)) => self
                    .namespaces
                    .declare(prefix, &attr.value)
                    .map_err(|message| Error::syntax(message, tag_start))?,
                None => {}
            }
        }

        let resolved = self.resolve_element_name(qname, tag_start)?;
        let mut reported = Vec::with_capacity(attrs.len());
        for attr in &attrs {
            if attr.ns_declaration().is_some() {
                continue;
            }
            let name = self.resolve_attribute_name(attr.qname, tag_start)?;
            reported.push((name, attr.value.to_string()));
        }

        trace!("start element '{}' at byte {}", resolved, tag_start);
        handler.start_element(&resolved, &reported)?;

        if empty {
            handler.end_element(&resolved)?;
            self.namespaces.pop_scope();
        } else {
            self.open.push(OpenTag {
                qname: qname.to_string(),
                resolved,
            });
        }

        self.root_seen = true;
        self.scanner.set_position(gt + 1);
        Ok(())
    }

    fn scan_end_tag<H: SaxHandler>(&mut self, handler: &mut H) -> Result<()> {
        let tag_start = self.scanner.position();
        self.scanner.advance(2);

        let name_start = self.scanner.position();
        if self.scanner.read_name().is_none() {
            return Err(self.bad_name("expected an element name"));
        }
        let qname = self.slice(name_start, self.scanner.position());

        self.scanner.skip_whitespace();
        match self.scanner.peek() {
            Some(b'>') => self.scanner.advance(1),
            Some(_) => {
                return Err(Error::syntax(
                    "malformed end tag",
                    self.scanner.position(),
                ))
            }
            None => {
                return Err(Error::UnexpectedEof {
                    position: self.scanner.position(),
                })
            }
        }

        let open = match self.open.pop() {
            Some(open) => open,
            None => return Err(Error::syntax("unexpected end tag", tag_start)),
        };
        if open.qname != qname {
            return Err(Error::TagMismatch {
                expected: open.qname,
                found: qname.to_string(),
                position: tag_start,
            });
        }

        trace!("end element '{}' at byte {}", open.resolved, tag_start);
        handler.end_element(&open.resolved)?;
        self.namespaces.pop_scope();
        Ok(())
    }

    // =======================================================================
    // Non-element markup
    // =======================================================================

    fn scan_comment(&mut self) -> Result<()> {
        let start = self.scanner.position();
        self.scanner.advance(4);
        let body_start = self.scanner.position();
        let end = match self.scanner.find_sequence(b"-->") {
            Some(end) => end,
            None => {
                return Err(Error::UnexpectedEof {
                    position: self.scanner.position(),
                })
            }
        };
        let body = self.slice(body_start, end);
        if body.contains("--") {
            return Err(Error::syntax("'--' is not allowed within a comment", start));
        }
        if body.ends_with('-') {
            return Err(Error::syntax("a comment must not end with '-'", start));
        }
        validate_chars(body).map_err(|message| Error::syntax(message, start))?;
        self.scanner.set_position(end + 3);
        Ok(())
    }

    fn scan_cdata<H: SaxHandler>(&mut self, handler: &mut H) -> Result<()> {
        let start = self.scanner.position();
        if self.open.is_empty() {
            return Err(Error::syntax(
                "CDATA section outside the root element",
                start,
            ));
        }
        self.scanner.advance(9);
        let body_start = self.scanner.position();
        let end = match self.scanner.find_sequence(b"]]>") {
            Some(end) => end,
            None => {
                return Err(Error::UnexpectedEof {
                    position: self.scanner.position(),
                })
            }
        };
        let body = self.slice(body_start, end);
        let decoded = decode_cdata(body).map_err(|message| Error::syntax(message, start))?;
        self.scanner.set_position(end + 3);
        handler.characters(&decoded)
    }

    fn scan_pi(&mut self) -> Result<()> {
        let pi_start = self.scanner.position();
        self.scanner.advance(2);

        let name_start = self.scanner.position();
        if self.scanner.read_name().is_none() {
            return Err(self.bad_name("expected a processing instruction target"));
        }
        let target = self.slice(name_start, self.scanner.position());

        let body_start = self.scanner.position();
        let end = match self.scanner.find_sequence(b"?>") {
            Some(end) => end,
            None => {
                return Err(Error::UnexpectedEof {
                    position: self.scanner.position(),
                })
            }
        };

        if target.eq_ignore_ascii_case("xml") {
            // The xml target is only legal as the XML declaration, which must
            // be the very first bytes of the document
            if target != "xml" || pi_start != 0 {
                return Err(Error::syntax(
                    "the 'xml' target is reserved for the XML declaration",
                    pi_start,
                ));
            }
            check_xml_declaration(self.slice(body_start, end), pi_start)?;
        } else {
            validate_chars(self.slice(body_start, end))
                .map_err(|message| Error::syntax(message, pi_start))?;
        }

        self.scanner.set_position(end + 2);
        Ok(())
    }

    fn scan_doctype(&mut self) -> Result<()> {
        let start = self.scanner.position();
        if self.root_seen {
            return Err(Error::syntax(
                "DOCTYPE is only allowed before the root element",
                start,
            ));
        }
        if self.doctype_seen {
            return Err(Error::syntax("multiple DOCTYPE declarations", start));
        }
        self.doctype_seen = true;
        self.scanner.advance(9);

        // Skip to the matching '>', tracking the internal subset brackets
        // and quoted literals
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;
        while let Some(b) = self.scanner.peek() {
            match quote {
                Some(q) => {
                    if b == q {
                        quote = None;
                    }
                }
                None => match b {
                    b'"' | b'\'' => quote = Some(b),
                    b'[' => depth += 1,
                    b']' => depth = depth.saturating_sub(1),
                    b'>' if depth == 0 => {
                        self.scanner.advance(1);
                        return Ok(());
                    }
                    _ => {}
                },
            }
            self.scanner.advance(1);
        }
        Err(Error::UnexpectedEof {
            position: self.scanner.position(),
        })
    }

    // =======================================================================
    // Name resolution
    // =======================================================================

    fn resolve_element_name(&self, qname: &str, position: usize) -> Result<String> {
        let (prefix, local) = split_qname(qname);
        if local.contains(':') {
            return Err(Error::syntax("multiple colons in element name", position));
        }
        match prefix {
            None => Ok(match self.namespaces.default_uri() {
                Some(uri) => join_name(uri, local, self.separator),
                None => local.to_string(),
            }),
            Some("") => Err(Error::syntax(
                "element name must not start with a colon",
                position,
            )),
            Some("xmlns") => Err(Error::syntax(
                "the xmlns prefix is reserved for namespace declarations",
                position,
            )),
            Some(prefix) => match self.namespaces.resolve(prefix) {
                Some(uri) => Ok(join_name(uri, local, self.separator)),
                None => Err(Error::UnboundPrefix {
                    prefix: prefix.to_string(),
                    position,
                }),
            },
        }
    }

    fn resolve_attribute_name(&self, qname: &str, position: usize) -> Result<String> {
        let (prefix, local) = split_qname(qname);
        if local.contains(':') {
            return Err(Error::syntax("multiple colons in attribute name", position));
        }
        match prefix {
            // The default namespace does not apply to attributes
            None => Ok(qname.to_string()),
            Some("") => Err(Error::syntax(
                "attribute name must not start with a colon",
                position,
            )),
            Some(prefix) => match self.namespaces.resolve(prefix) {
                Some(uri) => Ok(join_name(uri, local, self.separator)),
                None => Err(Error::UnboundPrefix {
                    prefix: prefix.to_string(),
                    position,
                }),
            },
        }
    }

    // =======================================================================
    // Helpers
    // =======================================================================

    fn slice(&self, start: usize, end: usize) -> &'a str {
        let text: &'a str = self.text;
        &text[start..end]
    }

    fn bad_name(&self, message: &'static str) -> Error {
        if self.scanner.is_eof() {
            Error::UnexpectedEof {
                position: self.scanner.position(),
            }
        } else {
            Error::syntax(message, self.scanner.position())
        }
    }
}

fn join_name(uri: &str, local: &str, separator: char) -> String {
    let mut name = String::with_capacity(uri.len() + separator.len_utf8() + local.len());
    name.push_str(uri);
    name.push(separator);
    name.push_str(local);
    name
}

fn check_xml_declaration(content: &str, position: usize) -> Result<()> {
    let attrs = parse_attributes(content).map_err(|message| Error::syntax(message, position))?;
    match attrs.first() {
        Some(attr) if attr.qname == "version" => {}
        _ => {
            return Err(Error::syntax(
                "XML declaration is missing the version",
                position,
            ))
        }
    }
    // Prolog grammar: encoding must come before standalone and neither
    // may repeat
    let mut last_seen = 0;
    for attr in &attrs[1..] {
        let rank = match attr.qname {
            "encoding" => {
                if !is_supported_encoding(&attr.value) {
                    return Err(Error::encoding(format!(
                        "unknown encoding '{}'",
                        attr.value
                    )));
                }
                1
            }
            "standalone" => {
                if attr.value != "yes" && attr.value != "no" {
                    return Err(Error::syntax("standalone must be 'yes' or 'no'", position));
                }
                2
            }
            _ => return Err(Error::syntax("unexpected item in XML declaration", position)),
        };
        if rank <= last_seen {
            return Err(Error::syntax("misplaced item in XML declaration", position));
        }
        last_seen = rank;
    }
    Ok(())
}
