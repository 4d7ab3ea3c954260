//! Format trait definition.
//!
//! This module defines the uniform contract every format implementation
//! follows. Both converters return a best-effort result plus an accumulated
//! error list: callers always receive usable output (markup or a document)
//! even under partial failure, along with diagnostics explaining what was
//! approximated or lost.
//!
//! External backend encoders for non-textual targets (office or typesetting
//! formats) implement this same trait shape; they return
//! [`SerializedDocument::Binary`] from `serialize_with_options` and are
//! otherwise black boxes to this crate.

use crate::error::{FormatError, ParseError, RenderError};
use crate::model::Document;
use std::collections::HashMap;

/// Output of a forward conversion: best-effort markup plus per-block errors.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub markup: String,
    pub errors: Vec<RenderError>,
}

/// Output of a reverse conversion: best-effort document plus parse errors.
///
/// When a fatal error is present the document is the minimal valid empty
/// document.
#[derive(Debug, Clone)]
pub struct Parsed {
    pub document: Document,
    pub errors: Vec<ParseError>,
}

impl Parsed {
    pub fn is_fatal(&self) -> bool {
        self.errors.iter().any(ParseError::is_fatal)
    }
}

/// Serialized output produced by a [`Format`] implementation.
pub enum SerializedDocument {
    /// UTF-8 text output (e.g., HTML)
    Text(String),
    /// Binary output (e.g., an office document produced by a backend encoder)
    Binary(Vec<u8>),
}

impl SerializedDocument {
    /// Consume the serialized output and return the underlying bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            SerializedDocument::Text(text) => text.into_bytes(),
            SerializedDocument::Binary(bytes) => bytes,
        }
    }
}

/// Trait for document formats.
///
/// Implementors provide bidirectional conversion between external markup and
/// the Folio document model. Formats can support parsing, serialization, or
/// both.
pub trait Format: Send + Sync {
    /// The name of this format (e.g., "html")
    fn name(&self) -> &str;

    /// Optional description of this format
    fn description(&self) -> &str {
        ""
    }

    /// File extensions associated with this format, without the leading dot.
    /// Used for automatic format detection from filenames.
    fn file_extensions(&self) -> &[&str] {
        &[]
    }

    /// Whether this format supports parsing (markup → Document)
    fn supports_parsing(&self) -> bool {
        false
    }

    /// Whether this format supports serialization (Document → markup)
    fn supports_serialization(&self) -> bool {
        false
    }

    /// Parse markup into a document plus accumulated errors.
    ///
    /// Default implementation returns NotSupported.
    fn parse(&self, _source: &str) -> Result<Parsed, FormatError> {
        Err(FormatError::NotSupported(format!(
            "Format '{}' does not support parsing",
            self.name()
        )))
    }

    /// Serialize a document into markup plus accumulated per-block errors.
    ///
    /// Default implementation returns NotSupported.
    fn serialize(&self, _doc: &Document) -> Result<Rendered, FormatError> {
        Err(FormatError::NotSupported(format!(
            "Format '{}' does not support serialization",
            self.name()
        )))
    }

    /// Serialize a document, optionally using extra parameters.
    ///
    /// Textual formats can rely on the default implementation, which
    /// delegates to [`Format::serialize`]. Binary backend encoders override
    /// this to return [`SerializedDocument::Binary`].
    fn serialize_with_options(
        &self,
        doc: &Document,
        options: &HashMap<String, String>,
    ) -> Result<SerializedDocument, FormatError> {
        if options.is_empty() {
            self.serialize(doc)
                .map(|rendered| SerializedDocument::Text(rendered.markup))
        } else {
            Err(FormatError::NotSupported(format!(
                "Format '{}' does not support extra parameters",
                self.name()
            )))
        }
    }
}

/// External schema-validation collaborator.
///
/// Validation of the document model against a published contract is out of
/// scope for this crate; implementors are black boxes that consume the same
/// `Document` shape.
pub trait Validator {
    fn validate(&self, doc: &Document) -> (bool, Vec<String>);
}
