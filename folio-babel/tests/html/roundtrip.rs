//! Round-trip tests (Folio → HTML → Folio)
//!
//! Exact-reconstruction checks for native output, plus property tests over
//! generated run sequences.

use crate::common::{chapter_doc, fragment_options, textbook_doc};
use folio_babel::fidelity::{test_round_trip, FidelityOptions};
use folio_babel::model::hints::{HintValue, RenderingHint};
use folio_babel::model::{
    BlockPayload, ContainerKind, ContentBlock, Node, Run, SemanticText,
};
use folio_babel::{parse_html, render_html, Document};
use proptest::prelude::*;

#[test]
fn test_chapter_reconstructs_exactly() {
    let doc = chapter_doc();
    let rendered = render_html(&doc, &fragment_options());
    assert!(rendered.errors.is_empty());

    let parsed = parse_html(&rendered.markup);
    assert!(parsed.errors.is_empty(), "parse errors: {:?}", parsed.errors);

    match &parsed.document.body_matter[0] {
        Node::Container(container) => {
            assert_eq!(container.kind, ContainerKind::Chapter);
            assert_eq!(container.id, "ch-1");
            assert_eq!(container.label.as_deref(), Some("1"));
            assert_eq!(container.title, SemanticText::from_text("Intro"));
            match &container.children[0] {
                Node::Block(block) => {
                    assert_eq!(block.id, "p-1");
                    assert_eq!(
                        block.payload,
                        BlockPayload::Prose(SemanticText::new(vec![
                            Run::Text("Hello ".to_string()),
                            Run::Strong("world".to_string()),
                        ]))
                    );
                }
                other => panic!("expected block, got {other:?}"),
            }
        }
        other => panic!("expected container, got {other:?}"),
    }
}

#[test]
fn test_textbook_round_trip_succeeds() {
    let result = test_round_trip(&textbook_doc(), &FidelityOptions::default());
    assert!(
        result.success,
        "overall={} issues={:#?}",
        result.overall, result.issues
    );
}

#[test]
fn test_metadata_round_trip() {
    let doc = textbook_doc();
    let parsed = parse_html(&render_html(&doc, &fragment_options()).markup);
    let reconstructed = &parsed.document;

    assert_eq!(reconstructed.title(), doc.title());
    assert_eq!(reconstructed.authors(), doc.authors());
    assert_eq!(reconstructed.issued(), doc.issued());
    assert_eq!(reconstructed.subject, doc.subject);
    assert_eq!(reconstructed.language, doc.language);
    assert_eq!(
        reconstructed.accessibility_summary,
        doc.accessibility_summary
    );
}

#[test]
fn test_unknown_block_kind_survives_round_trip() {
    let payload = BlockPayload::Opaque(serde_json::json!({
        "cells": [["a", "b"], ["c", "d"]],
        "header": true
    }));
    let block = ContentBlock::new("tbl-1", "vendor:block/matrix", payload.clone());
    let mut doc = Document::new();
    doc.body_matter = vec![Node::Block(block)];

    let rendered = render_html(&doc, &fragment_options());
    assert!(rendered.errors.is_empty());
    let parsed = parse_html(&rendered.markup);

    let reconstructed = parsed.document.blocks()[0];
    assert_eq!(reconstructed.id, "tbl-1");
    assert_eq!(reconstructed.kind, "vendor:block/matrix");
    assert_eq!(reconstructed.payload, payload);
}

#[test]
fn test_hints_round_trip() {
    let block = ContentBlock::paragraph("p-1", SemanticText::from_text("watch this space"))
        .with_hints(vec![
            RenderingHint::flag("semantic:important"),
            RenderingHint::new(
                "accessibility:live-region",
                HintValue::Text("polite".to_string()),
            ),
            RenderingHint::new("layout:width", HintValue::Text("30em".to_string())),
        ]);
    let mut doc = Document::new();
    doc.body_matter = vec![Node::Block(block)];

    let parsed = parse_html(&render_html(&doc, &fragment_options()).markup);
    let hints = &parsed.document.blocks()[0].hints;

    assert!(hints.contains(&RenderingHint::flag("semantic:important")));
    assert!(hints.contains(&RenderingHint::new(
        "accessibility:live-region",
        HintValue::Text("polite".to_string())
    )));
    assert!(hints.contains(&RenderingHint::new(
        "layout:width",
        HintValue::Text("30em".to_string())
    )));
}

#[test]
fn test_structure_depth_round_trip() {
    let doc = textbook_doc();
    let parsed = parse_html(&render_html(&doc, &fragment_options()).markup);
    assert_eq!(parsed.document.max_depth(), doc.max_depth());
    assert_eq!(parsed.document.block_count(), doc.block_count());
}

// ---------------------------------------------------------------------------
// Property tests

fn run_strategy() -> impl Strategy<Value = Run> {
    let word = "[a-z]{1,10}";
    prop_oneof![
        word.prop_map(Run::Text),
        word.prop_map(Run::Emphasis),
        word.prop_map(Run::Strong),
        word.prop_map(Run::Code),
        word.prop_map(Run::Subscript),
        word.prop_map(Run::Superscript),
        ("[a-z]{1,6}", word).prop_map(|(key, text)| Run::Citation { key, text }),
        word.prop_map(Run::MathInline),
    ]
}

fn doc_strategy() -> impl Strategy<Value = Document> {
    prop::collection::vec(prop::collection::vec(run_strategy(), 1..6), 1..5).prop_map(
        |paragraphs| {
            let mut doc = Document::new();
            doc.body_matter = paragraphs
                .into_iter()
                .enumerate()
                .map(|(i, runs)| {
                    Node::Block(ContentBlock::paragraph(
                        &format!("p-{i}"),
                        SemanticText::new(runs),
                    ))
                })
                .collect();
            doc
        },
    )
}

proptest! {
    // Formatting fidelity: every non-plain run tag count survives the trip.
    #[test]
    fn prop_run_tags_survive_round_trip(doc in doc_strategy()) {
        let result = test_round_trip(&doc, &FidelityOptions::default());
        prop_assert_eq!(result.formatting, 1.0);
        prop_assert_eq!(result.content, 1.0);
        prop_assert!(result.success);
    }

    // Unknown kinds never get rejected or mangled, whatever the payload text.
    #[test]
    fn prop_opaque_payload_survives(text in "[a-zA-Z0-9 .,!?]{0,60}") {
        let block = ContentBlock::new(
            "x-1",
            "vendor:block/custom",
            BlockPayload::Opaque(serde_json::Value::String(text)),
        );
        let mut doc = Document::new();
        doc.body_matter = vec![Node::Block(block)];

        let parsed = parse_html(&render_html(&doc, &fragment_options()).markup);
        let reconstructed = parsed.document.blocks()[0];
        prop_assert_eq!(&reconstructed.kind, "vendor:block/custom");
        prop_assert_eq!(&reconstructed.payload, &doc.blocks()[0].payload);
    }
}
