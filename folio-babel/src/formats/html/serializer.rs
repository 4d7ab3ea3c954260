//! HTML serialization (the forward converter, model → HTML).
//!
//! Pipeline: Document → RcDom → HTML string. Traversal is depth-first in
//! array order; children are always emitted in document order because hint
//! priorities and keep-together layout hints are defined relative to the
//! final emission order matching source order.
//!
//! Block dispatch is an open table keyed by the block-kind URI. An unmatched
//! kind falls through to a default handler that preserves the raw payload
//! behind a visibly-marked "unsupported" wrapper; information is never
//! silently dropped. A handler failure is caught at the block boundary,
//! replaced with a marked placeholder, and recorded in the accumulated error
//! list.
//!
//! All per-call state (the handler registry reference, error list, chunk
//! bookkeeping) lives in a `Renderer` constructed for the call and discarded
//! at its end; nothing is shared between calls.

use crate::error::RenderError;
use crate::format::Rendered;
use crate::hints::{decorate, Decoration, HintContext};
use crate::model::{
    BlockPayload, ContainerKind, ContentBlock, Document, Node, Run, SemanticText,
    StructuralContainer,
};
use html5ever::{
    ns, serialize, serialize::SerializeOpts, serialize::TraversalScope, Attribute, LocalName,
    QualName,
};
use markup5ever_rcdom::{Handle, Node as DomNode, NodeData, SerializableHandle};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::default::Default;
use std::rc::Rc;

/// Number of blocks emitted between cooperative yields on the chunked path.
const CHUNK_SIZE: usize = 64;

/// Options for HTML serialization.
#[derive(Debug, Clone)]
pub struct HtmlOptions {
    /// Emit only the document container, without the HTML5 shell.
    pub fragment: bool,
    /// Run the output sanitizer (strips comments and script elements).
    pub sanitize: bool,
    /// Block count above which traversal yields cooperatively between chunks.
    /// Chunking changes scheduling only; output is byte-identical.
    pub chunk_threshold: usize,
    /// Optional custom CSS appended after the baseline stylesheet.
    pub custom_css: Option<String>,
    /// Context the hints engine evaluates hint conditions against.
    pub hint_context: HintContext,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        HtmlOptions {
            fragment: false,
            sanitize: false,
            chunk_threshold: 500,
            custom_css: None,
            hint_context: HintContext::default(),
        }
    }
}

/// A block handler builds the DOM element for one block payload.
///
/// Handlers validate the payload variant against the shape their kind
/// expects; the error string becomes a recoverable [`RenderError`].
pub type BlockHandler = fn(&ContentBlock) -> Result<Handle, String>;

/// Open dispatch table from block-kind URI to handler.
///
/// Built once at configuration time and immutable during a call. The
/// fallback handler preserves unknown kinds behind an "unsupported" wrapper.
pub struct BlockRegistry {
    handlers: HashMap<String, BlockHandler>,
    fallback: BlockHandler,
}

impl BlockRegistry {
    pub fn new() -> Self {
        BlockRegistry {
            handlers: HashMap::new(),
            fallback: unsupported_block,
        }
    }

    /// Registry with handlers for the built-in block kinds.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("folio:block/paragraph", paragraph_block);
        registry.register("folio:block/heading", heading_block);
        registry.register("folio:block/code", code_block);
        registry.register("folio:block/list", list_block);
        registry.register("folio:block/quote", quote_block);
        registry.register("folio:block/figure", figure_block);
        registry.register("folio:block/math", math_block);
        registry.register("folio:block/generic", generic_block);
        registry
    }

    /// Register a handler for a block-kind URI, replacing any existing one.
    pub fn register(&mut self, kind: &str, handler: BlockHandler) {
        self.handlers.insert(kind.to_string(), handler);
    }

    pub fn has(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    fn resolve(&self, kind: &str) -> BlockHandler {
        self.handlers.get(kind).copied().unwrap_or(self.fallback)
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Serialize a document to HTML with the default block registry.
pub fn render(doc: &Document, options: &HtmlOptions) -> Rendered {
    render_with_registry(doc, options, &BlockRegistry::with_defaults())
}

/// Serialize a document to HTML with a caller-configured block registry.
pub fn render_with_registry(
    doc: &Document,
    options: &HtmlOptions,
    registry: &BlockRegistry,
) -> Rendered {
    let mut renderer = Renderer::new(options, registry, doc.block_count());
    let container = renderer.build_document(doc);

    let markup = match serialize_handle(&container) {
        Ok(body_html) => {
            if options.fragment {
                body_html
            } else {
                wrap_in_document(&body_html, doc, options)
            }
        }
        Err(message) => {
            renderer.errors.push(RenderError::new("document", message));
            String::new()
        }
    };

    let markup = if options.sanitize {
        let sanitized = sanitize_markup(&markup);
        if !options.fragment && !sanitized.starts_with("<!DOCTYPE html>") {
            // The sanitizer must not strip the mandatory format declaration.
            format!("<!DOCTYPE html>\n{sanitized}")
        } else {
            sanitized
        }
    } else {
        markup
    };

    Rendered {
        markup,
        errors: renderer.errors,
    }
}

/// Call-scoped conversion state. Discarded when the call returns.
struct Renderer<'a> {
    options: &'a HtmlOptions,
    registry: &'a BlockRegistry,
    errors: Vec<RenderError>,
    chunked: bool,
    blocks_emitted: usize,
}

impl<'a> Renderer<'a> {
    fn new(options: &'a HtmlOptions, registry: &'a BlockRegistry, block_count: usize) -> Self {
        Renderer {
            options,
            registry,
            errors: vec![],
            chunked: block_count > options.chunk_threshold,
            blocks_emitted: 0,
        }
    }

    fn build_document(&mut self, doc: &Document) -> Handle {
        let container = create_element("div", vec![("class", "folio-document")]);
        set_attribute(&container, "lang", &doc.language);
        set_attribute(&container, "dir", doc.direction.as_str());
        set_attribute(&container, "data-version", &doc.version);
        if let Some(title) = doc.title() {
            set_attribute(&container, "data-title", title);
        }
        let authors = doc.authors();
        if !authors.is_empty() {
            set_attribute(&container, "data-authors", &authors.join("; "));
        }
        if let Some(issued) = doc.issued() {
            set_attribute(&container, "data-issued", issued);
        }
        if !doc.subject.is_empty() {
            set_attribute(&container, "data-subject", &doc.subject);
        }
        if let Some(summary) = &doc.accessibility_summary {
            set_attribute(&container, "aria-description", summary);
        }

        if !doc.front_matter.is_empty() {
            let header = create_element("header", vec![("class", "folio-frontmatter")]);
            self.emit_nodes(&header, &doc.front_matter, 0);
            append_child(&container, header);
        }

        // Body matter is mandatory and always emitted, even when empty.
        let main = create_element("main", vec![("class", "folio-bodymatter")]);
        self.emit_nodes(&main, &doc.body_matter, 0);
        append_child(&container, main);

        if !doc.back_matter.is_empty() {
            let footer = create_element("footer", vec![("class", "folio-backmatter")]);
            self.emit_nodes(&footer, &doc.back_matter, 0);
            append_child(&container, footer);
        }

        container
    }

    fn emit_nodes(&mut self, parent: &Handle, nodes: &[Node], depth: usize) {
        for node in nodes {
            match node {
                Node::Container(container) => self.emit_container(parent, container, depth),
                Node::Block(block) => self.emit_block(parent, block),
            }
        }
    }

    fn emit_container(&mut self, parent: &Handle, container: &StructuralContainer, depth: usize) {
        let class = match container.kind {
            ContainerKind::Unit => "folio-unit",
            ContainerKind::Chapter => "folio-chapter",
            ContainerKind::Section => "folio-section",
        };
        // The landmark role derives purely from nesting depth, so navigation
        // tools can recover the outline without inspecting labels.
        let role = match depth {
            0 => "doc-part",
            1 => "doc-chapter",
            _ => "doc-section",
        };
        let section = create_element("section", vec![("class", class), ("role", role)]);
        if !container.id.is_empty() {
            set_attribute(&section, "id", &container.id);
        }
        if let Some(label) = &container.label {
            set_attribute(&section, "data-label", label);
        }

        let heading_tag = format!("h{}", (depth + 2).min(6));
        let heading = create_element(&heading_tag, vec![]);
        add_runs_to_node(&heading, &container.title.runs);
        append_child(&section, heading);

        self.emit_nodes(&section, &container.children, depth + 1);
        append_child(parent, section);
    }

    fn emit_block(&mut self, parent: &Handle, block: &ContentBlock) {
        let handler = self.registry.resolve(&block.kind);
        let element = match handler(block) {
            Ok(element) => element,
            Err(message) => {
                // One bad block never aborts the document: substitute a
                // marked placeholder and record the failure.
                self.errors.push(RenderError::new(&block.id, message));
                let placeholder = create_element(
                    "div",
                    vec![("class", "folio-render-error")],
                );
                append_child(&placeholder, create_text("[unrenderable block]"));
                placeholder
            }
        };
        if !block.id.is_empty() {
            set_attribute(&element, "data-block-id", &block.id);
        }

        let decoration = decorate(&block.hints, &self.options.hint_context);
        merge_decoration(&element, &decoration);

        append_child(parent, element);
        self.blocks_emitted += 1;
        if self.chunked && self.blocks_emitted % CHUNK_SIZE == 0 {
            // Cooperative suspension point between chunks; scheduling hint
            // only, the emitted markup is identical to the unchunked path.
            std::thread::yield_now();
        }
    }
}

// ---------------------------------------------------------------------------
// Block handlers

fn paragraph_block(block: &ContentBlock) -> Result<Handle, String> {
    let text = expect_prose(block)?;
    let p = create_element("p", vec![("class", "folio-paragraph")]);
    add_runs_to_node(&p, &text.runs);
    Ok(p)
}

fn heading_block(block: &ContentBlock) -> Result<Handle, String> {
    match &block.payload {
        BlockPayload::Heading { level, text } => {
            let clamped = (*level).clamp(1, 6);
            let heading =
                create_element(&format!("h{clamped}"), vec![("class", "folio-heading")]);
            add_runs_to_node(&heading, &text.runs);
            Ok(heading)
        }
        other => Err(payload_mismatch(&block.kind, "heading", other)),
    }
}

fn code_block(block: &ContentBlock) -> Result<Handle, String> {
    match &block.payload {
        BlockPayload::Listing { language, content } => {
            let pre = create_element("pre", vec![("class", "folio-code")]);
            if let Some(language) = language {
                set_attribute(&pre, "data-language", language);
            }
            let code = create_element("code", vec![]);
            append_child(&code, create_text(content));
            append_child(&pre, code);
            Ok(pre)
        }
        other => Err(payload_mismatch(&block.kind, "listing", other)),
    }
}

fn list_block(block: &ContentBlock) -> Result<Handle, String> {
    match &block.payload {
        BlockPayload::List { ordered, items } => {
            let tag = if *ordered { "ol" } else { "ul" };
            let list = create_element(tag, vec![("class", "folio-list")]);
            for item in items {
                let li = create_element("li", vec![]);
                add_runs_to_node(&li, &item.runs);
                append_child(&list, li);
            }
            Ok(list)
        }
        other => Err(payload_mismatch(&block.kind, "list", other)),
    }
}

fn quote_block(block: &ContentBlock) -> Result<Handle, String> {
    let text = expect_prose(block)?;
    let quote = create_element("blockquote", vec![("class", "folio-quote")]);
    add_runs_to_node(&quote, &text.runs);
    Ok(quote)
}

fn figure_block(block: &ContentBlock) -> Result<Handle, String> {
    match &block.payload {
        BlockPayload::Figure { src, alt, caption } => {
            let figure = create_element("figure", vec![("class", "folio-figure")]);
            let img = create_element("img", vec![("src", src.as_str()), ("alt", alt.as_str())]);
            append_child(&figure, img);
            if let Some(caption) = caption {
                let figcaption = create_element("figcaption", vec![]);
                add_runs_to_node(&figcaption, &caption.runs);
                append_child(&figure, figcaption);
            }
            Ok(figure)
        }
        other => Err(payload_mismatch(&block.kind, "figure", other)),
    }
}

fn math_block(block: &ContentBlock) -> Result<Handle, String> {
    match &block.payload {
        BlockPayload::Math(expression) => {
            let div = create_element(
                "div",
                vec![("class", "folio-math-block"), ("role", "math")],
            );
            append_child(&div, create_text(expression));
            Ok(div)
        }
        other => Err(payload_mismatch(&block.kind, "math", other)),
    }
}

fn generic_block(block: &ContentBlock) -> Result<Handle, String> {
    let div = create_element("div", vec![("class", "folio-generic")]);
    match &block.payload {
        BlockPayload::Prose(text) => add_runs_to_node(&div, &text.runs),
        BlockPayload::Opaque(serde_json::Value::String(text)) => {
            append_child(&div, create_text(text))
        }
        other => {
            let encoded = serde_json::to_string(other)
                .map_err(|e| format!("generic payload not encodable: {e}"))?;
            set_attribute(&div, "data-payload", &encoded);
        }
    }
    Ok(div)
}

/// Fallback for block kinds with no registered handler: preserve the raw
/// payload behind a visibly-marked wrapper.
fn unsupported_block(block: &ContentBlock) -> Result<Handle, String> {
    let div = create_element("div", vec![("class", "folio-unsupported")]);
    set_attribute(&div, "data-block-kind", &block.kind);
    let encoded = serde_json::to_string(&block.payload)
        .map_err(|e| format!("payload not encodable: {e}"))?;
    set_attribute(&div, "data-payload", &encoded);
    append_child(&div, create_text(&block.plain_text()));
    Ok(div)
}

fn expect_prose(block: &ContentBlock) -> Result<&SemanticText, String> {
    match &block.payload {
        BlockPayload::Prose(text) => Ok(text),
        other => Err(payload_mismatch(&block.kind, "prose", other)),
    }
}

fn payload_mismatch(kind: &str, expected: &str, got: &BlockPayload) -> String {
    let got = match got {
        BlockPayload::Prose(_) => "prose",
        BlockPayload::Heading { .. } => "heading",
        BlockPayload::Listing { .. } => "listing",
        BlockPayload::List { .. } => "list",
        BlockPayload::Figure { .. } => "figure",
        BlockPayload::Math(_) => "math",
        BlockPayload::Opaque(_) => "opaque",
    };
    format!("'{kind}' expects a {expected} payload, got {got}")
}

// ---------------------------------------------------------------------------
// Inline runs

/// Render a run sequence into a parent element via the run dispatch table.
fn add_runs_to_node(parent: &Handle, runs: &[Run]) {
    for run in runs {
        append_child(parent, run_to_node(run));
    }
}

fn run_to_node(run: &Run) -> Handle {
    match run {
        Run::Text(text) => create_text(text),
        Run::Emphasis(text) => wrap_text("em", vec![], text),
        Run::Strong(text) => wrap_text("strong", vec![], text),
        Run::Code(text) => wrap_text("code", vec![], text),
        Run::Underline(text) => wrap_text("u", vec![], text),
        Run::Strikethrough(text) => wrap_text("s", vec![], text),
        Run::Subscript(text) => wrap_text("sub", vec![], text),
        Run::Superscript(text) => wrap_text("sup", vec![], text),
        Run::Reference { target, text } => {
            let href = format!("#{target}");
            let anchor = create_element("a", vec![("class", "folio-ref")]);
            set_attribute(&anchor, "href", &href);
            append_child(&anchor, create_text(text));
            anchor
        }
        Run::Citation { key, text } => {
            let href = format!("#ref-{key}");
            let anchor = create_element("a", vec![("class", "folio-cite")]);
            set_attribute(&anchor, "href", &href);
            set_attribute(&anchor, "data-cite-key", key);
            append_child(&anchor, create_text(text));
            anchor
        }
        Run::MathInline(expression) => {
            // role="math" marks the span as having no text equivalent for
            // assistive technology.
            let span = create_element("span", vec![("class", "folio-math"), ("role", "math")]);
            append_child(&span, create_text(expression));
            span
        }
        Run::Index {
            term,
            sub_term,
            inner,
        } => {
            let span = create_element("span", vec![("class", "folio-index")]);
            set_attribute(&span, "data-index-term", term);
            if let Some(sub_term) = sub_term {
                set_attribute(&span, "data-index-sub", sub_term);
            }
            match inner {
                Some(inner) => append_child(&span, run_to_node(inner)),
                None => append_child(&span, create_text(term)),
            }
            span
        }
    }
}

fn wrap_text(tag: &str, attrs: Vec<(&str, &str)>, text: &str) -> Handle {
    let element = create_element(tag, attrs);
    append_child(&element, create_text(text));
    element
}

// ---------------------------------------------------------------------------
// DOM helpers

/// Create an HTML element with attributes
fn create_element(tag: &str, attrs: Vec<(&str, &str)>) -> Handle {
    let qual_name = QualName::new(None, ns!(html), LocalName::from(tag));
    let attributes = attrs
        .into_iter()
        .map(|(name, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.to_string().into(),
        })
        .collect();

    Rc::new(DomNode {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Element {
            name: qual_name,
            attrs: RefCell::new(attributes),
            template_contents: Default::default(),
            mathml_annotation_xml_integration_point: false,
        },
    })
}

/// Create a text node
fn create_text(text: &str) -> Handle {
    Rc::new(DomNode {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Text {
            contents: RefCell::new(text.to_string().into()),
        },
    })
}

fn append_child(parent: &Handle, child: Handle) {
    parent.children.borrow_mut().push(child);
}

fn set_attribute(handle: &Handle, name: &str, value: &str) {
    if let NodeData::Element { attrs, .. } = &handle.data {
        let mut attrs = attrs.borrow_mut();
        if let Some(existing) = attrs
            .iter_mut()
            .find(|attr| attr.name.local.as_ref() == name)
        {
            existing.value = value.to_string().into();
            return;
        }
        attrs.push(Attribute {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.to_string().into(),
        });
    }
}

fn get_attribute(handle: &Handle, name: &str) -> Option<String> {
    if let NodeData::Element { attrs, .. } = &handle.data {
        attrs
            .borrow()
            .iter()
            .find(|attr| attr.name.local.as_ref() == name)
            .map(|attr| attr.value.to_string())
    } else {
        None
    }
}

/// Merge hint decoration onto an element. Classes append; the style
/// attribute and extra attributes only fill slots the handler left empty, so
/// handler-emitted attributes are never clobbered by hints.
fn merge_decoration(handle: &Handle, decoration: &Decoration) {
    if decoration.is_empty() {
        return;
    }
    if !decoration.classes.is_empty() {
        let mut class = get_attribute(handle, "class").unwrap_or_default();
        for token in &decoration.classes {
            if !class.split_whitespace().any(|existing| existing == token) {
                if !class.is_empty() {
                    class.push(' ');
                }
                class.push_str(token);
            }
        }
        set_attribute(handle, "class", &class);
    }
    if let Some(style) = decoration.style_attribute() {
        if get_attribute(handle, "style").is_none() {
            set_attribute(handle, "style", &style);
        }
    }
    for (name, value) in &decoration.attributes {
        if get_attribute(handle, name).is_none() {
            set_attribute(handle, name, value);
        }
    }
}

/// Serialize an element (including the element itself) to an HTML string.
fn serialize_handle(handle: &Handle) -> Result<String, String> {
    let mut output = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::IncludeNode,
        ..Default::default()
    };
    let serializable = SerializableHandle::from(handle.clone());
    serialize(&mut output, &serializable, opts)
        .map_err(|e| format!("HTML serialization failed: {e}"))?;
    String::from_utf8(output).map_err(|e| format!("UTF-8 conversion failed: {e}"))
}

// ---------------------------------------------------------------------------
// Document shell and sanitization

/// Wrap the serialized container in a complete HTML document.
fn wrap_in_document(body_html: &str, doc: &Document, options: &HtmlOptions) -> String {
    let baseline_css = include_str!("../../../css/baseline.css");
    let custom_css = options.custom_css.as_deref().unwrap_or("");
    let title = html_escape(doc.title().unwrap_or("Folio Document"));
    let lang = html_escape(&doc.language);
    let dir = doc.direction.as_str();

    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}" dir="{dir}">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <meta name="generator" content="folio-babel">
  <title>{title}</title>
  <style>
{baseline_css}
{custom_css}
  </style>
</head>
<body>
{body_html}
</body>
</html>"#
    )
}

/// Escape HTML special characters in text
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Strip comments and script elements from serialized markup.
///
/// Deliberately conservative: anything it does not recognize passes through
/// untouched. The caller re-adds the document-level format declaration if
/// this pass removed it.
fn sanitize_markup(markup: &str) -> String {
    let without_comments = strip_delimited(markup, "<!--", "-->");
    strip_delimited(&without_comments, "<script", "</script>")
}

fn strip_delimited(input: &str, open: &str, close: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;
    loop {
        match rest.find(open) {
            Some(start) => {
                output.push_str(&rest[..start]);
                match rest[start..].find(close) {
                    Some(end) => {
                        rest = &rest[start + end + close.len()..];
                    }
                    None => {
                        // Unterminated: drop the remainder rather than leak it.
                        break;
                    }
                }
            }
            None => {
                output.push_str(rest);
                break;
            }
        }
    }
    output
}
