//! HTML format implementation.
//!
//! Bidirectional conversion between the Folio document model and semantic
//! HTML5, built on `html5ever` + `markup5ever_rcdom` for both directions.
//!
//! # Element Mapping Table
//!
//! | Model element        | HTML equivalent                                        | Notes                                         |
//! |----------------------|--------------------------------------------------------|-----------------------------------------------|
//! | Document             | `<div class="folio-document" lang dir data-*>`         | Metadata carried as attributes                |
//! | Front matter         | `<header class="folio-frontmatter">`                   | Omitted when empty                            |
//! | Body matter          | `<main class="folio-bodymatter">`                      | Always emitted (mandatory zone)               |
//! | Back matter          | `<footer class="folio-backmatter">`                    | Omitted when empty                            |
//! | Unit                 | `<section class="folio-unit" role=...>` + `<h2>`       | Role derived from nesting depth               |
//! | Chapter              | `<section class="folio-chapter" role=...>` + `<h3>`    | `data-label` carries the display label        |
//! | Section              | `<section class="folio-section" role=...>` + `<h4>`    |                                               |
//! | paragraph block      | `<p class="folio-paragraph">`                          |                                               |
//! | heading block        | `<h1>`-`<h6>` with `class="folio-heading"`             | Level from payload                            |
//! | code block           | `<pre class="folio-code" data-language>` + `<code>`    |                                               |
//! | list block           | `<ul>`/`<ol>` with `class="folio-list"`                |                                               |
//! | quote block          | `<blockquote class="folio-quote">`                     |                                               |
//! | figure block         | `<figure class="folio-figure">` + `<img>`              | Caption in `<figcaption>`                     |
//! | math block           | `<div class="folio-math-block" role="math">`           |                                               |
//! | unknown block kind   | `<div class="folio-unsupported" data-block-kind data-payload>` | Raw payload preserved, never dropped  |
//! | failed block         | `<div class="folio-render-error" data-block-id>`       | Placeholder; failure recorded in error list   |
//! | Run::Emphasis etc.   | `<em>` `<strong>` `<code>` `<u>` `<s>` `<sub>` `<sup>` |                                               |
//! | Run::Reference       | `<a class="folio-ref" href="#target">`                 |                                               |
//! | Run::Citation        | `<a class="folio-cite" href="#ref-key" data-cite-key>` | Machine-addressable citation key              |
//! | Run::MathInline      | `<span class="folio-math" role="math">`                | Explicit non-text-equivalent marker for AT    |
//! | Run::Index           | `<span class="folio-index" data-index-term>`           | May wrap one inner run                        |
//!
//! Hint decoration (classes, inline styles, extra attributes) is merged onto
//! the block element; the invertible token table lives in [`crate::hints`].
//!
//! # Library Choice
//!
//! `html5ever` + `markup5ever_rcdom`: browser-grade WHATWG parsing that
//! handles foreign and malformed markup gracefully, plus serialization over
//! the same DOM representation, so both converters share one tree shape.

pub mod parser;
pub mod serializer;

pub use serializer::{BlockRegistry, HtmlOptions};

use crate::error::FormatError;
use crate::format::{Format, Parsed, Rendered, SerializedDocument};
use crate::model::Document;

/// Format implementation for HTML.
pub struct HtmlFormat {
    options: HtmlOptions,
}

impl Default for HtmlFormat {
    fn default() -> Self {
        Self::new(HtmlOptions::default())
    }
}

impl HtmlFormat {
    /// Create an HTML format with the given serialization options
    pub fn new(options: HtmlOptions) -> Self {
        Self { options }
    }

    /// Create an HTML format that emits fragments (no document shell)
    pub fn fragment() -> Self {
        Self::new(HtmlOptions {
            fragment: true,
            ..Default::default()
        })
    }
}

impl Format for HtmlFormat {
    fn name(&self) -> &str {
        "html"
    }

    fn description(&self) -> &str {
        "Semantic HTML5 with accessibility decoration"
    }

    fn file_extensions(&self) -> &[&str] {
        &["html", "htm"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<Parsed, FormatError> {
        Ok(parser::parse(source))
    }

    fn serialize(&self, doc: &Document) -> Result<Rendered, FormatError> {
        Ok(serializer::render(doc, &self.options))
    }

    fn serialize_with_options(
        &self,
        doc: &Document,
        options: &std::collections::HashMap<String, String>,
    ) -> Result<SerializedDocument, FormatError> {
        let mut effective = self.options.clone();
        if let Some(fragment) = options.get("fragment") {
            effective.fragment = fragment == "true";
        }
        if let Some(sanitize) = options.get("sanitize") {
            effective.sanitize = sanitize == "true";
        }
        if let Some(css) = options.get("custom_css") {
            effective.custom_css = Some(css.clone());
        }
        Ok(SerializedDocument::Text(
            serializer::render(doc, &effective).markup,
        ))
    }
}
