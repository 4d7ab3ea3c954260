//! HTML parsing (the reverse converter, HTML → model).
//!
//! Two recovery paths share one walker:
//!
//! - Markup carrying a `folio-document` wrapper is treated as native output:
//!   metadata attributes, zone landmarks, container classes and roles, and
//!   the hint recovery channels are all read back directly. A wrapper with
//!   no body-matter zone is the one fatal case; the parse returns a minimal
//!   empty document plus [`ParseError::MissingBodyMatter`].
//! - Foreign markup (no wrapper) is recovered heuristically: `<main>` or
//!   `<body>` becomes the body matter, `<title>` and `<html lang>` seed the
//!   metadata, sections become containers with kinds inferred by lookahead
//!   over their nested containers.
//!
//! Everything below the fatal check is best-effort: unrecognized elements
//! degrade to generic blocks carrying their text content, and each
//! irregularity is recorded as a recoverable [`ParseError::Node`] rather
//! than aborting the walk.

use crate::error::ParseError;
use crate::format::Parsed;
use crate::hints::{kind_for_token, kind_from_opaque_attribute};
use crate::model::hints::{HintValue, RenderingHint};
use crate::model::{
    is_uri_shaped, BlockPayload, ContainerKind, ContentBlock, Document, Node, Run, SemanticText,
    StructuralContainer, TextDirection, GENERIC_BLOCK_KIND,
};
use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Maximum structural nesting depth. Containers below this are flattened.
const MAX_STRUCTURAL_DEPTH: usize = 3;

/// Parse HTML into a document plus accumulated errors.
pub fn parse(source: &str) -> Parsed {
    let dom = parse_document(RcDom::default(), ParseOpts::default())
        .from_utf8()
        .one(source.as_bytes());
    let mut parser = Parser::new();
    match find_by_class(&dom.document, "folio-document") {
        Some(wrapper) => parser.parse_native(&wrapper),
        None => parser.parse_foreign(&dom.document),
    }
}

/// Call-scoped parse state: the error list and the id counter for nodes
/// whose markup carried no identifier.
struct Parser {
    errors: Vec<ParseError>,
    counter: usize,
}

impl Parser {
    fn new() -> Self {
        Parser {
            errors: vec![],
            counter: 0,
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{prefix}-{}", self.counter)
    }

    fn parse_native(&mut self, wrapper: &Handle) -> Parsed {
        // A self-declared Folio document without a body-matter zone has lost
        // its mandatory skeleton; nothing else is worth recovering.
        let body = match find_by_class(wrapper, "folio-bodymatter") {
            Some(body) => body,
            None => {
                return Parsed {
                    document: Document::new(),
                    errors: vec![ParseError::MissingBodyMatter],
                }
            }
        };

        let mut document = Document::new();
        self.read_metadata(wrapper, &mut document);

        if let Some(front) = find_by_class(wrapper, "folio-frontmatter") {
            document.front_matter = self.parse_children(&front, 0, "front-matter");
        }
        document.body_matter = self.parse_children(&body, 0, "body-matter");
        if let Some(back) = find_by_class(wrapper, "folio-backmatter") {
            document.back_matter = self.parse_children(&back, 0, "back-matter");
        }

        Parsed {
            document,
            errors: std::mem::take(&mut self.errors),
        }
    }

    fn parse_foreign(&mut self, root: &Handle) -> Parsed {
        let mut document = Document::new();

        if let Some(html) = find_element(root, "html") {
            if let Some(lang) = attribute(&html, "lang") {
                if !lang.is_empty() {
                    document.language = lang;
                }
            }
        }
        if let Some(title) = find_element(root, "title") {
            let text = text_content(&title);
            let text = text.trim();
            if !text.is_empty() {
                document.set_title(text);
            }
        }

        self.errors.push(ParseError::node(
            "document",
            "no document wrapper found; recovered structure heuristically",
        ));

        let body_root = find_element(root, "main")
            .or_else(|| find_element(root, "body"))
            .unwrap_or_else(|| root.clone());
        document.body_matter = self.parse_children(&body_root, 0, "body");

        Parsed {
            document,
            errors: std::mem::take(&mut self.errors),
        }
    }

    fn read_metadata(&mut self, wrapper: &Handle, document: &mut Document) {
        if let Some(lang) = attribute(wrapper, "lang") {
            if !lang.is_empty() {
                document.language = lang;
            }
        }
        if attribute(wrapper, "dir").as_deref() == Some("rtl") {
            document.direction = TextDirection::Rtl;
        }
        if let Some(version) = attribute(wrapper, "data-version") {
            document.version = version;
        }
        if let Some(title) = attribute(wrapper, "data-title") {
            document.set_title(&title);
        }
        if let Some(authors) = attribute(wrapper, "data-authors") {
            for author in authors.split("; ") {
                if !author.is_empty() {
                    document.add_author(author);
                }
            }
        }
        if let Some(issued) = attribute(wrapper, "data-issued") {
            document.set_issued(&issued);
        }
        if let Some(subject) = attribute(wrapper, "data-subject") {
            document.subject = subject;
        }
        if let Some(summary) = attribute(wrapper, "aria-description") {
            document.accessibility_summary = Some(summary);
        }
    }

    fn parse_children(&mut self, parent: &Handle, depth: usize, path: &str) -> Vec<Node> {
        let children: Vec<Handle> = parent.children.borrow().clone();
        let mut nodes = vec![];
        for child in &children {
            self.parse_node_into(child, depth, path, &mut nodes);
        }
        nodes
    }

    fn parse_node_into(&mut self, handle: &Handle, depth: usize, path: &str, out: &mut Vec<Node>) {
        match &handle.data {
            NodeData::Text { contents } => {
                let text = contents.borrow().to_string();
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    // Stray prose outside any element is kept as a paragraph.
                    let id = self.next_id("block");
                    out.push(Node::Block(ContentBlock::paragraph(
                        &id,
                        SemanticText::from_text(trimmed),
                    )));
                }
            }
            NodeData::Element { .. } => {
                let tag = element_name(handle).unwrap_or_default();
                if is_structural_container(handle) {
                    if depth >= MAX_STRUCTURAL_DEPTH {
                        self.errors.push(ParseError::node(
                            path,
                            "structure nested deeper than three levels; inner container flattened",
                        ));
                        let flattened = self.parse_children(handle, depth, path);
                        out.extend(flattened);
                    } else {
                        let container = self.parse_container(handle, depth, path);
                        out.push(Node::Container(container));
                    }
                } else if is_transparent(&tag) {
                    let inner = self.parse_children(handle, depth, path);
                    out.extend(inner);
                } else if let Some(node) = self.parse_block(handle, path) {
                    out.push(node);
                }
            }
            _ => {}
        }
    }

    fn parse_container(&mut self, handle: &Handle, depth: usize, path: &str) -> StructuralContainer {
        let kind = container_kind(handle);
        let id = attribute(handle, "id").unwrap_or_else(|| self.next_id("container"));
        let child_path = format!("{path}/{id}");

        let children: Vec<Handle> = handle.children.borrow().clone();
        let mut title = SemanticText::empty();
        let mut title_taken = false;
        let mut nodes = vec![];
        for child in &children {
            // The first heading is the container title; later headings stay
            // heading blocks.
            if !title_taken && heading_level(child).is_some() {
                title = SemanticText::new(parse_runs(child));
                title_taken = true;
                continue;
            }
            self.parse_node_into(child, depth + 1, &child_path, &mut nodes);
        }
        if !title_taken {
            self.errors
                .push(ParseError::node(&child_path, "container has no heading"));
        }

        let mut container = StructuralContainer::new(kind, &id, title).with_children(nodes);
        container.label = attribute(handle, "data-label");
        container
    }

    fn parse_block(&mut self, handle: &Handle, path: &str) -> Option<Node> {
        let tag = element_name(handle)?;
        if matches!(tag.as_str(), "script" | "style" | "head" | "br" | "hr") {
            return None;
        }

        let id = attribute(handle, "data-block-id").unwrap_or_else(|| self.next_id("block"));
        let hints = recover_hints(handle);

        let (kind, payload) = match tag.as_str() {
            "p" => (
                "folio:block/paragraph".to_string(),
                BlockPayload::Prose(SemanticText::new(parse_runs(handle))),
            ),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = heading_level(handle).unwrap_or(1);
                (
                    "folio:block/heading".to_string(),
                    BlockPayload::Heading {
                        level,
                        text: SemanticText::new(parse_runs(handle)),
                    },
                )
            }
            "pre" => {
                let content = match find_element(handle, "code") {
                    Some(code) => text_content(&code),
                    None => text_content(handle),
                };
                (
                    "folio:block/code".to_string(),
                    BlockPayload::Listing {
                        language: attribute(handle, "data-language"),
                        content,
                    },
                )
            }
            "ul" | "ol" => {
                let items = handle
                    .children
                    .borrow()
                    .iter()
                    .filter(|child| element_name(child).as_deref() == Some("li"))
                    .map(|li| SemanticText::new(parse_runs(li)))
                    .collect();
                (
                    "folio:block/list".to_string(),
                    BlockPayload::List {
                        ordered: tag == "ol",
                        items,
                    },
                )
            }
            "blockquote" => (
                "folio:block/quote".to_string(),
                BlockPayload::Prose(SemanticText::new(parse_runs(handle))),
            ),
            "figure" => {
                let img = find_element(handle, "img");
                let src = img
                    .as_ref()
                    .and_then(|img| attribute(img, "src"))
                    .unwrap_or_default();
                let alt = img
                    .as_ref()
                    .and_then(|img| attribute(img, "alt"))
                    .unwrap_or_default();
                let caption = find_element(handle, "figcaption")
                    .map(|figcaption| SemanticText::new(parse_runs(&figcaption)));
                (
                    "folio:block/figure".to_string(),
                    BlockPayload::Figure { src, alt, caption },
                )
            }
            "div" => self.parse_div(handle, path),
            _ => {
                let text = text_content(handle);
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return None;
                }
                self.errors.push(ParseError::node(
                    path,
                    format!("unrecognized element <{tag}> degraded to a generic block"),
                ));
                (
                    GENERIC_BLOCK_KIND.to_string(),
                    BlockPayload::Prose(SemanticText::from_text(trimmed)),
                )
            }
        };

        let block = ContentBlock::new(&id, &kind, payload).with_hints(hints);
        Some(Node::Block(block))
    }

    /// Divs carry the non-element-shaped block kinds: math blocks, preserved
    /// unknown kinds, render-error placeholders, and generic prose.
    fn parse_div(&mut self, handle: &Handle, path: &str) -> (String, BlockPayload) {
        if has_class(handle, "folio-math-block") || attribute(handle, "role").as_deref() == Some("math")
        {
            return ("folio:block/math".to_string(), BlockPayload::Math(text_content(handle)));
        }

        if has_class(handle, "folio-unsupported") {
            let kind = self.recovered_kind(handle, path);
            let payload = match attribute(handle, "data-payload") {
                Some(raw) => match serde_json::from_str::<BlockPayload>(&raw) {
                    Ok(payload) => payload,
                    Err(_) => match serde_json::from_str::<serde_json::Value>(&raw) {
                        Ok(value) => BlockPayload::Opaque(value),
                        Err(_) => {
                            self.errors.push(ParseError::node(
                                path,
                                "preserved payload is not valid JSON; kept as text",
                            ));
                            BlockPayload::Prose(SemanticText::from_text(&text_content(handle)))
                        }
                    },
                },
                None => BlockPayload::Prose(SemanticText::from_text(&text_content(handle))),
            };
            return (kind, payload);
        }

        if has_class(handle, "folio-render-error") {
            self.errors.push(ParseError::node(
                path,
                "markup contains a render-error placeholder",
            ));
            return (
                GENERIC_BLOCK_KIND.to_string(),
                BlockPayload::Prose(SemanticText::from_text(&text_content(handle))),
            );
        }

        let kind = self.recovered_kind(handle, path);
        if let Some(raw) = attribute(handle, "data-payload") {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) {
                return (kind, BlockPayload::Opaque(value));
            }
        }
        (kind, BlockPayload::Prose(SemanticText::new(parse_runs(handle))))
    }

    /// Kind declared by a `data-block-kind` attribute. Identifiers must be
    /// URI-shaped; anything else degrades to the generic kind.
    fn recovered_kind(&mut self, handle: &Handle, path: &str) -> String {
        match attribute(handle, "data-block-kind") {
            Some(kind) if is_uri_shaped(&kind) => kind,
            Some(kind) => {
                self.errors.push(ParseError::node(
                    path,
                    format!("block kind '{kind}' is not URI-shaped; kept as generic"),
                ));
                GENERIC_BLOCK_KIND.to_string()
            }
            None => GENERIC_BLOCK_KIND.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Structural classification

fn is_structural_container(handle: &Handle) -> bool {
    if element_name(handle).as_deref() == Some("section") {
        return true;
    }
    if has_class(handle, "folio-unit")
        || has_class(handle, "folio-chapter")
        || has_class(handle, "folio-section")
    {
        return true;
    }
    matches!(
        attribute(handle, "role").as_deref(),
        Some("doc-part") | Some("doc-chapter") | Some("doc-section")
    )
}

/// Container kind, by precedence: explicit class, then landmark role, then
/// lookahead. The lookahead rule classifies by how many levels of nested
/// containers sit below the candidate: two or more make it a Unit, one a
/// Chapter, none a Section.
fn container_kind(handle: &Handle) -> ContainerKind {
    if has_class(handle, "folio-unit") {
        return ContainerKind::Unit;
    }
    if has_class(handle, "folio-chapter") {
        return ContainerKind::Chapter;
    }
    if has_class(handle, "folio-section") {
        return ContainerKind::Section;
    }
    match attribute(handle, "role").as_deref() {
        Some("doc-part") => ContainerKind::Unit,
        Some("doc-chapter") => ContainerKind::Chapter,
        Some("doc-section") => ContainerKind::Section,
        _ => match nested_container_levels(handle) {
            levels if levels >= 2 => ContainerKind::Unit,
            1 => ContainerKind::Chapter,
            _ => ContainerKind::Section,
        },
    }
}

/// Deepest chain of structural containers among an element's descendants.
fn nested_container_levels(handle: &Handle) -> usize {
    handle
        .children
        .borrow()
        .iter()
        .map(|child| {
            let below = nested_container_levels(child);
            if is_structural_container(child) {
                1 + below
            } else {
                below
            }
        })
        .max()
        .unwrap_or(0)
}

/// Grouping elements that contribute their children but no node of their own.
fn is_transparent(tag: &str) -> bool {
    matches!(tag, "article" | "aside" | "nav" | "header" | "footer" | "main" | "body")
}

fn heading_level(handle: &Handle) -> Option<u8> {
    match element_name(handle)?.as_str() {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Hint recovery

/// Read rendering hints back off an element via the three recovery channels:
/// class tokens, the fixed accessibility attributes, and `data-hint-*`.
fn recover_hints(handle: &Handle) -> Vec<RenderingHint> {
    let mut hints = vec![];

    for token in classes(handle) {
        if let Some(kind) = kind_for_token(&token) {
            hints.push(RenderingHint::flag(kind));
        }
    }

    for (name, value) in attributes(handle) {
        let kind = match name.as_str() {
            "aria-live" => Some("accessibility:live-region".to_string()),
            "aria-hidden" => Some("accessibility:hidden".to_string()),
            "aria-label" => Some("accessibility:label".to_string()),
            "tabindex" => Some("accessibility:tab-order".to_string()),
            "accesskey" => Some("accessibility:access-key".to_string()),
            _ => kind_from_opaque_attribute(&name),
        };
        if let Some(kind) = kind {
            hints.push(RenderingHint::new(&kind, HintValue::decode(&value)));
        }
    }

    hints
}

// ---------------------------------------------------------------------------
// Inline runs

fn parse_runs(parent: &Handle) -> Vec<Run> {
    let children: Vec<Handle> = parent.children.borrow().clone();
    let mut runs = vec![];
    for child in &children {
        match &child.data {
            NodeData::Text { contents } => {
                let text = contents.borrow().to_string();
                if !text.is_empty() {
                    runs.push(Run::Text(text));
                }
            }
            NodeData::Element { .. } => {
                if let Some(run) = parse_inline_element(child) {
                    runs.push(run);
                }
            }
            _ => {}
        }
    }
    runs
}

fn parse_inline_element(handle: &Handle) -> Option<Run> {
    let tag = element_name(handle)?;
    let text = text_content(handle);
    match tag.as_str() {
        "em" | "i" => Some(Run::Emphasis(text)),
        "strong" | "b" => Some(Run::Strong(text)),
        "code" => Some(Run::Code(text)),
        "u" => Some(Run::Underline(text)),
        "s" | "del" | "strike" => Some(Run::Strikethrough(text)),
        "sub" => Some(Run::Subscript(text)),
        "sup" => Some(Run::Superscript(text)),
        "a" => Some(parse_anchor(handle, text)),
        "span" => parse_span(handle, text),
        "br" => None,
        _ => {
            if text.is_empty() {
                None
            } else {
                // Unknown inline markup loses its tag, never its text.
                Some(Run::Text(text))
            }
        }
    }
}

fn parse_anchor(handle: &Handle, text: String) -> Run {
    let href = attribute(handle, "href").unwrap_or_default();
    let cite_key = attribute(handle, "data-cite-key").or_else(|| {
        if has_class(handle, "folio-cite") {
            href.strip_prefix("#ref-").map(str::to_string)
        } else {
            None
        }
    });
    match cite_key {
        Some(key) => Run::Citation { key, text },
        None => Run::Reference {
            target: href.strip_prefix('#').unwrap_or(&href).to_string(),
            text,
        },
    }
}

fn parse_span(handle: &Handle, text: String) -> Option<Run> {
    if has_class(handle, "folio-math") || attribute(handle, "role").as_deref() == Some("math") {
        return Some(Run::MathInline(text));
    }
    if has_class(handle, "folio-index") {
        let term = attribute(handle, "data-index-term").unwrap_or_else(|| text.clone());
        let sub_term = attribute(handle, "data-index-sub");
        let inner_runs = parse_runs(handle);
        // A sole text child equal to the term is the canonical "no inner
        // run" form; anything else wraps the first recovered run.
        let inner = match inner_runs.as_slice() {
            [Run::Text(inner_text)] if *inner_text == term => None,
            _ => inner_runs.into_iter().next().map(Box::new),
        };
        return Some(Run::Index {
            term,
            sub_term,
            inner,
        });
    }
    if text.is_empty() {
        None
    } else {
        Some(Run::Text(text))
    }
}

// ---------------------------------------------------------------------------
// DOM helpers

fn element_name(handle: &Handle) -> Option<String> {
    if let NodeData::Element { name, .. } = &handle.data {
        Some(name.local.as_ref().to_string())
    } else {
        None
    }
}

fn attribute(handle: &Handle, name: &str) -> Option<String> {
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

fn attributes(handle: &Handle) -> Vec<(String, String)> {
    if let NodeData::Element { attrs, .. } = &handle.data {
        attrs
            .borrow()
            .iter()
            .map(|attr| (attr.name.local.as_ref().to_string(), attr.value.to_string()))
            .collect()
    } else {
        vec![]
    }
}

fn classes(handle: &Handle) -> Vec<String> {
    attribute(handle, "class")
        .map(|class| class.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

fn has_class(handle: &Handle, class: &str) -> bool {
    attribute(handle, "class")
        .map(|value| value.split_whitespace().any(|token| token == class))
        .unwrap_or(false)
}

/// Concatenated text of all descendant text nodes.
fn text_content(handle: &Handle) -> String {
    let mut out = String::new();
    collect_text(handle, &mut out);
    out
}

fn collect_text(handle: &Handle, out: &mut String) {
    if let NodeData::Text { contents } = &handle.data {
        out.push_str(&contents.borrow());
    }
    for child in handle.children.borrow().iter() {
        collect_text(child, out);
    }
}

/// Depth-first search for the first element carrying a class token.
fn find_by_class(handle: &Handle, class: &str) -> Option<Handle> {
    if has_class(handle, class) {
        return Some(handle.clone());
    }
    for child in handle.children.borrow().iter() {
        if let Some(found) = find_by_class(child, class) {
            return Some(found);
        }
    }
    None
}

/// Depth-first search for the first element with a tag name.
fn find_element(handle: &Handle, tag: &str) -> Option<Handle> {
    if element_name(handle).as_deref() == Some(tag) {
        return Some(handle.clone());
    }
    for child in handle.children.borrow().iter() {
        if let Some(found) = find_element(child, tag) {
            return Some(found);
        }
    }
    None
}
