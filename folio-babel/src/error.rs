//! Error types for conversion operations.
//!
//! The taxonomy follows the propagation policy of the converters: per-block
//! and per-node failures are recoverable, swallowed at the point of
//! occurrence and reported in an accumulated list next to a best-effort
//! result. Only the absence of a document's mandatory skeleton (the
//! body-matter zone) is fatal to a parse.

use std::fmt;

/// Errors surfaced by the format registry and format implementations.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    /// Format not found in registry
    FormatNotFound(String),
    /// Format does not support the requested operation
    NotSupported(String),
    /// Serialization machinery failed wholesale (not a per-block failure)
    SerializationError(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::FormatNotFound(name) => write!(f, "Format '{name}' not found"),
            FormatError::NotSupported(msg) => write!(f, "Operation not supported: {msg}"),
            FormatError::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
        }
    }
}

impl std::error::Error for FormatError {}

/// A recoverable per-block failure during forward conversion.
///
/// The failing block is replaced in the output by a marked placeholder; the
/// document as a whole is never aborted.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderError {
    /// Identifier of the block whose handler failed.
    pub block_id: String,
    pub message: String,
}

impl RenderError {
    pub fn new(block_id: &str, message: impl Into<String>) -> Self {
        RenderError {
            block_id: block_id.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block '{}': {}", self.block_id, self.message)
    }
}

impl std::error::Error for RenderError {}

/// A failure during reverse conversion.
///
/// `MissingBodyMatter` is the only fatal variant; everything else is
/// recoverable at the node where it occurred, with a generic block
/// substituted.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The markup declared itself a Folio document but carries no body-matter
    /// zone. The parse returns a minimal empty document alongside this.
    MissingBodyMatter,
    /// A node-scoped irregularity that was recovered from.
    Node { path: String, message: String },
}

impl ParseError {
    pub fn node(path: impl Into<String>, message: impl Into<String>) -> Self {
        ParseError::Node {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, ParseError::MissingBodyMatter)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingBodyMatter => {
                write!(f, "document has no body-matter zone (mandatory)")
            }
            ParseError::Node { path, message } => write!(f, "at {path}: {message}"),
        }
    }
}

impl std::error::Error for ParseError {}
