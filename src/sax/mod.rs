//! SAX (Simple API for XML) Module
//!
//! Push-mode parsing events and the tree builder that consumes them.
//!
//! ## Architecture
//!
//! The tokenizer drives a [`SaxHandler`] with three event kinds:
//!
//! ```text
//! Tokenizer ---> SaxHandler ---> TreeBuilder ---> Element tree
//! ```
//!
//! The handler sees element starts (with resolved names and attributes),
//! character data fragments, and element ends, in document order.
//! [`TreeBuilder`] is the handler used by the parse entry points; anything
//! implementing the trait can be driven instead.

pub mod builder;
pub mod handler;

pub use builder::TreeBuilder;
pub use handler::SaxHandler;
