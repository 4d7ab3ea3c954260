//! Fidelity tester integration tests.
//!
//! Unit-level scoring behavior lives next to the implementation; these tests
//! exercise the public API end to end.

use crate::common::{chapter_doc, textbook_doc};
use folio_babel::fidelity::{
    test_round_trip, ChangeKind, FidelityAxis, FidelityOptions, Severity,
};
use folio_babel::model::{ContentBlock, Node, SemanticText};
use folio_babel::{compare_documents, Document};

#[test]
fn test_round_trip_verdict_is_threshold_dependent() {
    let doc = chapter_doc();
    let strict = FidelityOptions {
        threshold: 1.0,
        ..Default::default()
    };
    let lax = FidelityOptions {
        threshold: 0.5,
        ..Default::default()
    };

    let strict_result = test_round_trip(&doc, &strict);
    let lax_result = test_round_trip(&doc, &lax);
    // Same comparison, same scores; only the verdict depends on the threshold.
    assert_eq!(strict_result.overall, lax_result.overall);
    assert!(lax_result.success);
}

#[test]
fn test_result_is_data_not_error() {
    // Comparing against an empty document fails the verdict but still
    // returns scores and diagnostics.
    let doc = textbook_doc();
    let result = compare_documents(&doc, &Document::new());

    assert!(!result.success);
    assert!(result.overall < 0.85);
    assert!(!result.issues.is_empty());
    assert!(!result.differences.is_empty());
    assert!(result
        .issues
        .iter()
        .any(|i| i.axis == FidelityAxis::Structure && i.severity == Severity::Major));
    assert!(result
        .differences
        .iter()
        .any(|d| d.change == ChangeKind::Missing));
}

#[test]
fn test_reordered_blocks_are_detected() {
    let mut doc = Document::new();
    doc.body_matter = vec![
        Node::Block(ContentBlock::paragraph(
            "p-1",
            SemanticText::from_text("alpha beta gamma delta"),
        )),
        Node::Block(ContentBlock::paragraph(
            "p-2",
            SemanticText::from_text("epsilon zeta eta theta"),
        )),
    ];
    let mut swapped = doc.clone();
    swapped.body_matter.swap(0, 1);

    // Positional comparison: reordering reads as two altered blocks.
    let result = compare_documents(&doc, &swapped);
    assert!(result.content < 1.0);
    assert_eq!(
        result
            .issues
            .iter()
            .filter(|i| i.axis == FidelityAxis::Content)
            .count(),
        2
    );
}

#[test]
fn test_serializable_report() {
    let result = test_round_trip(&textbook_doc(), &FidelityOptions::default());
    let report = serde_json::to_string(&result).unwrap();
    assert!(report.contains("\"overall\""));
    assert!(report.contains("\"issues\""));
}
