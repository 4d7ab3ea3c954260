//! The Folio document model.
//!
//! A typed tree of structural containers, content blocks, and inline runs.
//! This module is pure data: no conversion behavior lives here. Converters
//! never mutate a document they were given; they always construct new trees.
//!
//! The shape in brief:
//!
//! - [`Document`] is the root, holding bibliographic metadata and three
//!   ordered zones (front matter, body matter, back matter). Body matter is
//!   always present, even when empty.
//! - [`StructuralContainer`] is a Unit, Chapter, or Section. The hierarchy is
//!   capped at three structural levels; body matter may start at any of them.
//! - [`ContentBlock`] is a leaf content unit tagged with an open, URI-shaped
//!   block-kind. Unknown kinds are preserved, never rejected.
//! - [`SemanticText`] is an ordered sequence of typed [`Run`]s. Anywhere the
//!   model holds prose it holds a `SemanticText`, never a bare string.

pub mod hints;

pub use hints::{HintConditions, HintNamespace, HintValue, RenderingHint, DEFAULT_HINT_PRIORITY};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Block-kind assigned when nothing more specific can be recovered.
pub const GENERIC_BLOCK_KIND: &str = "folio:block/generic";

/// Whether a block-kind identifier is URI-shaped (a scheme plus a path,
/// e.g. `folio:block/paragraph` or `vendor:block/sidebar`).
pub fn is_uri_shaped(kind: &str) -> bool {
    url::Url::parse(kind).is_ok()
}

/// Base text direction of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextDirection {
    Ltr,
    Rtl,
}

impl TextDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextDirection::Ltr => "ltr",
            TextDirection::Rtl => "rtl",
        }
    }
}

/// The root of a Folio document.
///
/// `bibliography` follows an external bibliographic schema (CSL-style JSON)
/// and is treated as an opaque structured value; the accessors below read the
/// handful of fields the converters care about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub version: String,
    pub bibliography: Value,
    pub subject: String,
    pub language: String,
    pub direction: TextDirection,
    pub accessibility_summary: Option<String>,
    pub front_matter: Vec<Node>,
    pub body_matter: Vec<Node>,
    pub back_matter: Vec<Node>,
}

impl Document {
    /// Create an empty document with neutral metadata.
    pub fn new() -> Self {
        Document {
            version: "1.0".to_string(),
            bibliography: Value::Object(Default::default()),
            subject: String::new(),
            language: "en".to_string(),
            direction: TextDirection::Ltr,
            accessibility_summary: None,
            front_matter: vec![],
            body_matter: vec![],
            back_matter: vec![],
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.set_title(title);
        self
    }

    pub fn with_author(mut self, name: &str) -> Self {
        self.add_author(name);
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    pub fn set_title(&mut self, title: &str) {
        if let Value::Object(map) = &mut self.bibliography {
            map.insert("title".to_string(), Value::String(title.to_string()));
        }
    }

    pub fn add_author(&mut self, name: &str) {
        if let Value::Object(map) = &mut self.bibliography {
            let authors = map
                .entry("author".to_string())
                .or_insert_with(|| Value::Array(vec![]));
            if let Value::Array(list) = authors {
                let mut entry = serde_json::Map::new();
                entry.insert("literal".to_string(), Value::String(name.to_string()));
                list.push(Value::Object(entry));
            }
        }
    }

    pub fn set_issued(&mut self, raw_date: &str) {
        if let Value::Object(map) = &mut self.bibliography {
            let mut issued = serde_json::Map::new();
            issued.insert("raw".to_string(), Value::String(raw_date.to_string()));
            map.insert("issued".to_string(), Value::Object(issued));
        }
    }

    /// Document title from the bibliographic record, if any.
    pub fn title(&self) -> Option<&str> {
        self.bibliography.get("title").and_then(Value::as_str)
    }

    /// Author display names, in record order.
    ///
    /// Handles both `{"literal": "..."}` and `{"family": "...", "given": "..."}`
    /// author entries; bare strings are accepted as well.
    pub fn authors(&self) -> Vec<String> {
        let list = match self.bibliography.get("author").and_then(Value::as_array) {
            Some(list) => list,
            None => return vec![],
        };
        list.iter()
            .filter_map(|entry| match entry {
                Value::String(name) => Some(name.clone()),
                Value::Object(map) => {
                    if let Some(literal) = map.get("literal").and_then(Value::as_str) {
                        Some(literal.to_string())
                    } else {
                        let given = map.get("given").and_then(Value::as_str);
                        let family = map.get("family").and_then(Value::as_str);
                        match (given, family) {
                            (Some(g), Some(f)) => Some(format!("{g} {f}")),
                            (None, Some(f)) => Some(f.to_string()),
                            (Some(g), None) => Some(g.to_string()),
                            (None, None) => None,
                        }
                    }
                }
                _ => None,
            })
            .collect()
    }

    /// Issue date as a raw string, if the record carries one.
    pub fn issued(&self) -> Option<&str> {
        self.bibliography
            .get("issued")
            .and_then(|issued| issued.get("raw"))
            .and_then(Value::as_str)
    }

    /// Total number of content blocks across all three zones.
    pub fn block_count(&self) -> usize {
        count_blocks(&self.front_matter)
            + count_blocks(&self.body_matter)
            + count_blocks(&self.back_matter)
    }

    /// Maximum structural nesting depth across all zones (0 = no containers).
    pub fn max_depth(&self) -> usize {
        max_depth(&self.front_matter)
            .max(max_depth(&self.body_matter))
            .max(max_depth(&self.back_matter))
    }

    /// All content blocks across the three zones, in reading order.
    pub fn blocks(&self) -> Vec<&ContentBlock> {
        let mut out = vec![];
        collect_blocks(&self.front_matter, &mut out);
        collect_blocks(&self.body_matter, &mut out);
        collect_blocks(&self.back_matter, &mut out);
        out
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// A child of a zone or container: either a structural container or a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Container(StructuralContainer),
    Block(ContentBlock),
}

/// The three structural levels, outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerKind {
    Unit,
    Chapter,
    Section,
}

impl ContainerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerKind::Unit => "unit",
            ContainerKind::Chapter => "chapter",
            ContainerKind::Section => "section",
        }
    }
}

/// A titled, ordered grouping node.
///
/// `label` is presentational only ("1", "A", "iv"); the position in the
/// parent's child list is the sequencing authority. Child order is reading
/// order and always significant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralContainer {
    pub kind: ContainerKind,
    pub id: String,
    pub label: Option<String>,
    pub title: SemanticText,
    pub children: Vec<Node>,
}

impl StructuralContainer {
    pub fn new(kind: ContainerKind, id: &str, title: SemanticText) -> Self {
        StructuralContainer {
            kind,
            id: id.to_string(),
            label: None,
            title,
            children: vec![],
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }
}

/// A leaf semantic unit of content.
///
/// `kind` is drawn from an open, URI-shaped namespace. The payload shape for
/// each kind is known only to its handler in the dispatch table; the model
/// itself only distinguishes the payload variants below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub id: String,
    pub kind: String,
    pub payload: BlockPayload,
    pub hints: Vec<RenderingHint>,
}

impl ContentBlock {
    pub fn new(id: &str, kind: &str, payload: BlockPayload) -> Self {
        ContentBlock {
            id: id.to_string(),
            kind: kind.to_string(),
            payload,
            hints: vec![],
        }
    }

    pub fn paragraph(id: &str, text: SemanticText) -> Self {
        Self::new(id, "folio:block/paragraph", BlockPayload::Prose(text))
    }

    pub fn heading(id: &str, level: u8, text: SemanticText) -> Self {
        Self::new(id, "folio:block/heading", BlockPayload::Heading { level, text })
    }

    pub fn with_hints(mut self, hints: Vec<RenderingHint>) -> Self {
        self.hints = hints;
        self
    }

    /// Plain text of the payload, used for similarity scoring.
    pub fn plain_text(&self) -> String {
        match &self.payload {
            BlockPayload::Prose(text) => text.plain_text(),
            BlockPayload::Heading { text, .. } => text.plain_text(),
            BlockPayload::Listing { content, .. } => content.clone(),
            BlockPayload::List { items, .. } => items
                .iter()
                .map(SemanticText::plain_text)
                .collect::<Vec<_>>()
                .join(" "),
            BlockPayload::Figure { alt, caption, .. } => match caption {
                Some(caption) => format!("{alt} {}", caption.plain_text()),
                None => alt.clone(),
            },
            BlockPayload::Math(expr) => expr.clone(),
            BlockPayload::Opaque(value) => match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        }
    }
}

/// Kind-specific block payloads.
///
/// This is the tagged union at the dispatch-handler boundary: handlers match
/// on the variant they expect and reject the rest, which keeps the
/// "anything goes" surface bounded to the handler layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockPayload {
    Prose(SemanticText),
    Heading { level: u8, text: SemanticText },
    Listing { language: Option<String>, content: String },
    List { ordered: bool, items: Vec<SemanticText> },
    Figure { src: String, alt: String, caption: Option<SemanticText> },
    Math(String),
    Opaque(Value),
}

/// Rich inline text: an ordered sequence of typed runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticText {
    pub runs: Vec<Run>,
}

impl SemanticText {
    pub fn new(runs: Vec<Run>) -> Self {
        SemanticText { runs }
    }

    pub fn from_text(text: &str) -> Self {
        SemanticText {
            runs: vec![Run::Text(text.to_string())],
        }
    }

    pub fn empty() -> Self {
        SemanticText { runs: vec![] }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Concatenated text content of all runs, ignoring run tags.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            run.append_plain_text(&mut out);
        }
        out
    }
}

/// A typed inline span.
///
/// Runs do not nest, with one exception: an `Index` run may wrap exactly one
/// other run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Run {
    Text(String),
    Emphasis(String),
    Strong(String),
    Code(String),
    Underline(String),
    Strikethrough(String),
    Subscript(String),
    Superscript(String),
    /// Internal link to another node in the same document.
    Reference { target: String, text: String },
    /// External bibliographic link, keyed into the bibliography.
    Citation { key: String, text: String },
    /// Inline mathematics, carried as an expression string.
    MathInline(String),
    /// An indexable term, optionally wrapping another run.
    Index {
        term: String,
        sub_term: Option<String>,
        inner: Option<Box<Run>>,
    },
}

impl Run {
    /// Stable tag name for this run variant, used for formatting fidelity.
    pub fn tag(&self) -> &'static str {
        match self {
            Run::Text(_) => "text",
            Run::Emphasis(_) => "emphasis",
            Run::Strong(_) => "strong",
            Run::Code(_) => "code",
            Run::Underline(_) => "underline",
            Run::Strikethrough(_) => "strikethrough",
            Run::Subscript(_) => "subscript",
            Run::Superscript(_) => "superscript",
            Run::Reference { .. } => "reference",
            Run::Citation { .. } => "citation",
            Run::MathInline(_) => "math-inline",
            Run::Index { .. } => "index",
        }
    }

    fn append_plain_text(&self, out: &mut String) {
        match self {
            Run::Text(s)
            | Run::Emphasis(s)
            | Run::Strong(s)
            | Run::Code(s)
            | Run::Underline(s)
            | Run::Strikethrough(s)
            | Run::Subscript(s)
            | Run::Superscript(s)
            | Run::MathInline(s) => out.push_str(s),
            Run::Reference { text, .. } => out.push_str(text),
            Run::Citation { text, .. } => out.push_str(text),
            Run::Index { term, inner, .. } => match inner {
                Some(inner) => inner.append_plain_text(out),
                None => out.push_str(term),
            },
        }
    }
}

fn count_blocks(nodes: &[Node]) -> usize {
    nodes
        .iter()
        .map(|node| match node {
            Node::Block(_) => 1,
            Node::Container(container) => count_blocks(&container.children),
        })
        .sum()
}

fn max_depth(nodes: &[Node]) -> usize {
    nodes
        .iter()
        .map(|node| match node {
            Node::Block(_) => 0,
            Node::Container(container) => 1 + max_depth(&container.children),
        })
        .max()
        .unwrap_or(0)
}

fn collect_blocks<'a>(nodes: &'a [Node], out: &mut Vec<&'a ContentBlock>) {
    for node in nodes {
        match node {
            Node::Block(block) => out.push(block),
            Node::Container(container) => collect_blocks(&container.children, out),
        }
    }
}
