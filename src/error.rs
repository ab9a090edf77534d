//! Error types for qdom parsing
//!
//! Two kinds of failure share one enum: parse errors (the input is not
//! well-formed XML, or its encoding is broken) and the structural error
//! raised when the tree builder's stack underflows. The predicates
//! [`Error::is_parse_error`] and [`Error::is_structural`] distinguish them.

use thiserror::Error;

/// Result type alias for qdom operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for qdom parsing
#[derive(Error, Debug)]
pub enum Error {
    /// Input is not well-formed XML
    #[error("syntax error at byte {position}: {message}")]
    Syntax { message: String, position: usize },

    /// Input ended inside an unfinished construct
    #[error("unexpected end of input at byte {position}")]
    UnexpectedEof { position: usize },

    /// End tag does not match the open start tag
    #[error("tag mismatch at byte {position}: <{expected}> closed by </{found}>")]
    TagMismatch {
        expected: String,
        found: String,
        position: usize,
    },

    /// Attribute name repeated within one start tag
    #[error("duplicate attribute '{name}' at byte {position}")]
    DuplicateAttribute { name: String, position: usize },

    /// Name uses a namespace prefix with no binding in scope
    #[error("unbound namespace prefix '{prefix}' at byte {position}")]
    UnboundPrefix { prefix: String, position: usize },

    /// A second element follows the root element
    #[error("document has multiple root elements (second root at byte {position})")]
    MultipleRoots { position: usize },

    /// Document contains no element at all
    #[error("no element found")]
    NoRootElement,

    /// Unsupported or invalid input encoding
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Tree builder received an end tag with no open element
    #[error("end tag </{name}> with no open element")]
    StackUnderflow { name: String },

    /// I/O error while draining the input source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a syntax error at a byte position
    pub fn syntax(message: impl Into<String>, position: usize) -> Self {
        Error::Syntax {
            message: message.into(),
            position,
        }
    }

    /// Create an encoding error
    pub fn encoding(message: impl Into<String>) -> Self {
        Error::Encoding(message.into())
    }

    /// Check if this error came from tokenizing malformed input
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Error::Syntax { .. }
                | Error::UnexpectedEof { .. }
                | Error::TagMismatch { .. }
                | Error::DuplicateAttribute { .. }
                | Error::UnboundPrefix { .. }
                | Error::MultipleRoots { .. }
                | Error::NoRootElement
                | Error::Encoding(_)
        )
    }

    /// Check if this error signals a tokenizer contract violation
    pub fn is_structural(&self) -> bool {
        matches!(self, Error::StackUnderflow { .. })
    }

    /// Get the byte offset where the error was detected, if known
    pub fn position(&self) -> Option<usize> {
        match self {
            Error::Syntax { position, .. }
            | Error::UnexpectedEof { position }
            | Error::TagMismatch { position, .. }
            | Error::DuplicateAttribute { position, .. }
            | Error::UnboundPrefix { position, .. }
            | Error::MultipleRoots { position } => Some(*position),
            _ => None,
        }
    }
}
