//! SAX handler trait
//!
//! The contract between the tokenizer and whatever consumes its events.
//! Three methods, called strictly in document order. Any method may fail;
//! the tokenizer stops at the first error and propagates it unchanged.

use crate::error::Result;

/// Receiver for push-mode parse events
///
/// Names arrive already namespace-resolved: `URI{separator}local-name`
/// for bound names, the plain name otherwise. Namespace declaration
/// attributes (`xmlns`, `xmlns:*`) are consumed by the tokenizer and
/// never show up in `attributes`.
pub trait SaxHandler {
    /// An element's start tag was scanned
    fn start_element(&mut self, name: &str, attributes: &[(String, String)]) -> Result<()>;

    /// A run of character data was scanned
    ///
    /// One text run may be delivered as several fragments; implementations
    /// must concatenate, not treat each call as a separate text node.
    fn characters(&mut self, fragment: &str) -> Result<()>;

    /// An element's end tag was scanned
    ///
    /// `name` is the same resolved name the matching start tag reported,
    /// even if the bindings it used were shadowed in between.
    fn end_element(&mut self, name: &str) -> Result<()>;
}
