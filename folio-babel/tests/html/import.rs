//! Import tests for HTML format (HTML → Folio)
//!
//! These tests exercise the reverse converter against native output shapes,
//! foreign markup, and malformed input.

use folio_babel::error::ParseError;
use folio_babel::format::Format;
use folio_babel::formats::html::HtmlFormat;
use folio_babel::model::{BlockPayload, ContainerKind, Node, Run, TextDirection, GENERIC_BLOCK_KIND};
use folio_babel::{parse_html, FormatRegistry};

#[test]
fn test_registry_parse() {
    let registry = FormatRegistry::with_defaults();
    let parsed = registry
        .parse(
            r#"<div class="folio-document"><main class="folio-bodymatter">
                <p>One paragraph.</p>
            </main></div>"#,
            "html",
        )
        .unwrap();
    assert!(!parsed.is_fatal());
    assert_eq!(parsed.document.block_count(), 1);
}

#[test]
fn test_format_detection_by_extension() {
    let registry = FormatRegistry::with_defaults();
    assert_eq!(
        registry.detect_format_from_filename("notes.html"),
        Some("html".to_string())
    );
    assert_eq!(
        registry.detect_format_from_filename("notes.htm"),
        Some("html".to_string())
    );
}

#[test]
fn test_missing_body_matter_is_fatal_with_empty_document() {
    let html_format = HtmlFormat::default();
    let parsed = html_format
        .parse(r#"<div class="folio-document"><p>orphan</p></div>"#)
        .unwrap();
    assert!(parsed.is_fatal());
    assert_eq!(parsed.errors, vec![ParseError::MissingBodyMatter]);
    assert_eq!(parsed.document.block_count(), 0);
    assert!(parsed.document.body_matter.is_empty());
}

#[test]
fn test_rtl_and_language_metadata() {
    let parsed = parse_html(
        r#"<div class="folio-document" lang="ar" dir="rtl">
            <main class="folio-bodymatter"><p>نص</p></main>
        </div>"#,
    );
    assert_eq!(parsed.document.language, "ar");
    assert_eq!(parsed.document.direction, TextDirection::Rtl);
}

#[test]
fn test_foreign_article_recovery() {
    let parsed = parse_html(
        r#"<html lang="en"><head><title>A Blog Post</title></head><body>
            <article>
                <h1>Why Parsers Are Fun</h1>
                <p>First <em>reason</em>.</p>
                <section>
                    <h2>Details</h2>
                    <p>More text here.</p>
                </section>
            </article>
        </body></html>"#,
    );
    assert!(!parsed.is_fatal());
    // Heuristic recovery is reported, never silent.
    assert!(parsed
        .errors
        .iter()
        .any(|e| matches!(e, ParseError::Node { message, .. } if message.contains("heuristically"))));

    let doc = &parsed.document;
    assert_eq!(doc.title(), Some("A Blog Post"));
    assert_eq!(doc.block_count(), 3);

    // The unmarked <section> has no containers below it, so the lookahead
    // rule classifies it as a Section.
    let container = doc
        .body_matter
        .iter()
        .find_map(|node| match node {
            Node::Container(container) => Some(container),
            Node::Block(_) => None,
        })
        .expect("section recovered as container");
    assert_eq!(container.kind, ContainerKind::Section);
    assert_eq!(container.title.plain_text(), "Details");
}

#[test]
fn test_malformed_markup_still_recovers() {
    // Unclosed tags; the WHATWG algorithm repairs the tree.
    let parsed = parse_html(
        r#"<div class="folio-document"><main class="folio-bodymatter">
            <p>first
            <p>second <strong>bold
        </main></div>"#,
    );
    assert!(!parsed.is_fatal());
    let texts: Vec<String> = parsed
        .document
        .blocks()
        .iter()
        .map(|b| b.plain_text().trim().to_string())
        .collect();
    assert!(texts.iter().any(|t| t.starts_with("first")));
    assert!(texts.iter().any(|t| t.starts_with("second")));
}

#[test]
fn test_unknown_element_degrades_to_generic_with_error() {
    let parsed = parse_html(
        r#"<div class="folio-document"><main class="folio-bodymatter">
            <details><summary>Click</summary>hidden content</details>
        </main></div>"#,
    );
    assert!(!parsed.is_fatal());
    assert!(parsed
        .errors
        .iter()
        .any(|e| matches!(e, ParseError::Node { message, .. } if message.contains("generic"))));
    let block = parsed.document.blocks()[0];
    assert_eq!(block.kind, GENERIC_BLOCK_KIND);
    assert!(block.plain_text().contains("hidden content"));
}

#[test]
fn test_reference_and_citation_distinguished() {
    let parsed = parse_html(
        r##"<div class="folio-document"><main class="folio-bodymatter">
            <p><a href="#sec-2">see below</a> and <a data-cite-key="knuth84">[2]</a></p>
        </main></div>"##,
    );
    match &parsed.document.blocks()[0].payload {
        BlockPayload::Prose(text) => {
            assert!(text.runs.contains(&Run::Reference {
                target: "sec-2".to_string(),
                text: "see below".to_string()
            }));
            assert!(text.runs.contains(&Run::Citation {
                key: "knuth84".to_string(),
                text: "[2]".to_string()
            }));
        }
        other => panic!("expected prose, got {other:?}"),
    }
}

#[test]
fn test_generated_ids_when_markup_has_none() {
    let parsed = parse_html(
        r#"<div class="folio-document"><main class="folio-bodymatter">
            <p>one</p><p>two</p>
        </main></div>"#,
    );
    let ids: Vec<&str> = parsed
        .document
        .blocks()
        .iter()
        .map(|b| b.id.as_str())
        .collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    assert!(ids.iter().all(|id| id.starts_with("block-")));
}
