//! DOM Module - owned XML element tree
//!
//! A deliberately small tree: one [`Element`] type holding its attributes,
//! children, and trimmed text content directly. No arena, no node ids; the
//! whole tree is an ordinary owned value.

pub mod element;

pub use element::Element;
