//! Export tests for HTML format (Folio → HTML)
//!
//! These tests verify that documents are correctly converted to HTML by
//! checking the resulting structure.

use crate::common::{chapter_doc, fragment_options, textbook_doc};
use folio_babel::format::Format;
use folio_babel::formats::html::HtmlFormat;
use folio_babel::hints::HintContext;
use folio_babel::model::hints::RenderingHint;
use folio_babel::model::{ContentBlock, Node, SemanticText};
use folio_babel::{render_html, Document, FormatRegistry, HtmlOptions};
use std::collections::HashMap;

#[test]
fn test_full_document_shell() {
    let doc = textbook_doc();
    let html_format = HtmlFormat::default();
    let rendered = html_format.serialize(&doc).unwrap();

    assert!(rendered.errors.is_empty());
    assert!(rendered.markup.starts_with("<!DOCTYPE html>"));
    assert!(rendered.markup.contains("<html lang=\"en\" dir=\"ltr\">"));
    assert!(rendered
        .markup
        .contains("<title>Foundations of Information</title>"));
    assert!(rendered.markup.contains("<meta name=\"generator\" content=\"folio-babel\">"));
    // The baseline stylesheet is embedded.
    assert!(rendered.markup.contains(".folio-document {"));
}

#[test]
fn test_metadata_attributes() {
    let rendered = render_html(&textbook_doc(), &fragment_options());
    assert!(rendered
        .markup
        .contains("data-title=\"Foundations of Information\""));
    assert!(rendered.markup.contains("data-authors=\"Claude Shannon\""));
    assert!(rendered.markup.contains("data-issued=\"1948-07\""));
    assert!(rendered.markup.contains("data-subject=\"information theory\""));
    assert!(rendered
        .markup
        .contains("aria-description=\"An introductory textbook chapter.\""));
}

#[test]
fn test_three_zones() {
    let rendered = render_html(&textbook_doc(), &fragment_options());
    assert!(rendered.markup.contains("<header class=\"folio-frontmatter\">"));
    assert!(rendered.markup.contains("<main class=\"folio-bodymatter\">"));
    assert!(rendered.markup.contains("<footer class=\"folio-backmatter\">"));
}

#[test]
fn test_structural_hierarchy_roles_and_headings() {
    let rendered = render_html(&textbook_doc(), &fragment_options());

    assert!(rendered
        .markup
        .contains("<section class=\"folio-unit\" role=\"doc-part\" id=\"unit-1\" data-label=\"I\">"));
    assert!(rendered.markup.contains("<h2>Discrete Systems</h2>"));
    assert!(rendered.markup.contains("role=\"doc-chapter\""));
    assert!(rendered.markup.contains("<h3>A Mathematical Theory</h3>"));
    assert!(rendered.markup.contains("role=\"doc-section\""));
    assert!(rendered.markup.contains("<h4>Entropy</h4>"));
}

#[test]
fn test_block_kinds() {
    let rendered = render_html(&textbook_doc(), &fragment_options());

    assert!(rendered.markup.contains("<p class=\"folio-paragraph\""));
    assert!(rendered.markup.contains("<ol class=\"folio-list\""));
    assert!(rendered
        .markup
        .contains("<pre class=\"folio-code\" data-language=\"rust\""));
    assert!(rendered
        .markup
        .contains("<div class=\"folio-math-block\" role=\"math\""));
    assert!(rendered.markup.contains("<figure class=\"folio-figure\""));
    assert!(rendered
        .markup
        .contains("<img src=\"schematic.png\" alt=\"Communication system schematic\">"));
    assert!(rendered
        .markup
        .contains("<figcaption>Fig. 1. A general system.</figcaption>"));
    assert!(rendered.markup.contains("<blockquote class=\"folio-quote\""));
}

#[test]
fn test_inline_runs() {
    let rendered = render_html(&textbook_doc(), &fragment_options());

    assert!(rendered.markup.contains("<em>reproducing a message</em>"));
    assert!(rendered
        .markup
        .contains("<a class=\"folio-cite\" href=\"#ref-shannon1948\" data-cite-key=\"shannon1948\">[1]</a>"));
    // Index run wrapping a strong run.
    assert!(rendered
        .markup
        .contains("<span class=\"folio-index\" data-index-term=\"entropy\"><strong>Entropy</strong></span>"));
}

#[test]
fn test_hint_decoration_on_export() {
    let rendered = render_html(&textbook_doc(), &fragment_options());
    assert!(rendered
        .markup
        .contains("class=\"folio-paragraph folio-sem-definition\""));
    assert!(rendered.markup.contains("aria-label=\"Definition of entropy\""));
}

#[test]
fn test_preference_conditioned_hint_toggles_decoration_only() {
    let block = ContentBlock::paragraph("p-1", SemanticText::from_text("key idea"))
        .with_hints(vec![RenderingHint::flag("pedagogical:key-concept")
            .with_preferences(&["study-mode"])]);
    let mut doc = Document::new();
    doc.body_matter = vec![Node::Block(block)];

    let inactive = render_html(&doc, &fragment_options());
    let active = render_html(
        &doc,
        &HtmlOptions {
            fragment: true,
            hint_context: HintContext {
                preferences: vec!["study-mode".to_string()],
                ..Default::default()
            },
            ..Default::default()
        },
    );

    assert!(!inactive.markup.contains("folio-ped-key-concept"));
    assert!(active.markup.contains("folio-ped-key-concept"));
    // The two outputs differ exactly in the hint's class token.
    assert_eq!(
        active.markup.replace(" folio-ped-key-concept", ""),
        inactive.markup
    );
}

#[test]
fn test_fragment_format_omits_shell() {
    let rendered = HtmlFormat::fragment().serialize(&chapter_doc()).unwrap();
    assert!(rendered.errors.is_empty());
    assert!(rendered.markup.starts_with("<div class=\"folio-document\""));
    assert!(!rendered.markup.contains("<!DOCTYPE html>"));
    assert!(rendered.markup.contains("<h2>Intro</h2>"));
}

#[test]
fn test_registry_serialize_with_options() {
    let registry = FormatRegistry::with_defaults();
    let mut options = HashMap::new();
    options.insert("fragment".to_string(), "true".to_string());

    let serialized = registry
        .serialize_with_options(&chapter_doc(), "html", &options)
        .unwrap();
    let markup = String::from_utf8(serialized.into_bytes()).unwrap();
    assert!(markup.starts_with("<div class=\"folio-document\""));
    assert!(!markup.contains("<!DOCTYPE html>"));
}

#[test]
fn test_custom_css_appended() {
    let options = HtmlOptions {
        custom_css: Some(".folio-paragraph { color: navy; }".to_string()),
        ..Default::default()
    };
    let rendered = render_html(&chapter_doc(), &options);
    assert!(rendered.markup.contains(".folio-paragraph { color: navy; }"));
}

#[test]
fn test_escaped_title_in_shell() {
    let doc = Document::new().with_title("Q < R & \"S\"");
    let rendered = render_html(&doc, &HtmlOptions::default());
    assert!(rendered
        .markup
        .contains("<title>Q &lt; R &amp; &quot;S&quot;</title>"));
}
