//! folio-babel: bidirectional conversion between the Folio document model
//! and presentation markup.
//!
//! The model (see [`model`]) is a typed tree for structured academic
//! content: bibliographic metadata, three ordered zones, structural
//! containers, open-kinded content blocks, rich inline runs, and rendering
//! hints. Formats plug into a [`registry::FormatRegistry`] through the
//! [`format::Format`] trait; the native HTML format lives in
//! [`formats::html`].
//!
//! Conversion is best-effort in both directions: callers always get usable
//! output plus an accumulated error list. The [`fidelity`] module closes the
//! loop by scoring how faithfully a render→parse round trip reconstructs a
//! document.
//!
//! ```ignore
//! use folio_babel::{render_html, parse_html, HtmlOptions};
//!
//! let rendered = render_html(&doc, &HtmlOptions::default());
//! let parsed = parse_html(&rendered.markup);
//! ```

pub mod error;
pub mod fidelity;
pub mod format;
pub mod formats;
pub mod hints;
pub mod model;
pub mod registry;

pub use error::{FormatError, ParseError, RenderError};
pub use fidelity::{compare_documents, test_round_trip, FidelityOptions, FidelityResult};
pub use format::{Format, Parsed, Rendered, SerializedDocument, Validator};
pub use formats::html::{HtmlFormat, HtmlOptions};
pub use hints::{decorate, Decoration, HintContext};
pub use model::{Document, RenderingHint};
pub use registry::FormatRegistry;

/// Serialize a document to HTML with the given options.
pub fn render_html(doc: &Document, options: &HtmlOptions) -> Rendered {
    formats::html::serializer::render(doc, options)
}

/// Parse HTML into a document plus accumulated errors.
pub fn parse_html(source: &str) -> Parsed {
    formats::html::parser::parse(source)
}
