//! Shared document builders for the integration tests.

use folio_babel::model::hints::{HintValue, RenderingHint};
use folio_babel::model::{
    BlockPayload, ContainerKind, ContentBlock, Node, SemanticText, StructuralContainer,
};
use folio_babel::Document;
use folio_babel::HtmlOptions;

/// Fragment-mode serialization options.
pub fn fragment_options() -> HtmlOptions {
    HtmlOptions {
        fragment: true,
        ..Default::default()
    }
}

/// A single chapter labeled "1", titled "Intro", holding one paragraph with
/// a plain run and a strong run.
pub fn chapter_doc() -> Document {
    let chapter = StructuralContainer::new(
        ContainerKind::Chapter,
        "ch-1",
        SemanticText::from_text("Intro"),
    )
    .with_label("1")
    .with_children(vec![Node::Block(ContentBlock::paragraph(
        "p-1",
        SemanticText::new(vec![
            folio_babel::model::Run::Text("Hello ".to_string()),
            folio_babel::model::Run::Strong("world".to_string()),
        ]),
    ))]);
    let mut doc = Document::new();
    doc.body_matter = vec![Node::Container(chapter)];
    doc
}

/// A fuller document: metadata, all three zones, nested structure, one of
/// each built-in block kind, and hints on several blocks.
pub fn textbook_doc() -> Document {
    let mut doc = Document::new()
        .with_title("Foundations of Information")
        .with_author("Claude Shannon")
        .with_language("en");
    doc.set_issued("1948-07");
    doc.subject = "information theory".to_string();
    doc.accessibility_summary = Some("An introductory textbook chapter.".to_string());

    doc.front_matter = vec![Node::Block(ContentBlock::paragraph(
        "preface-1",
        SemanticText::from_text("This preface explains the aim of the book."),
    ))];

    let definition = ContentBlock::paragraph(
        "def-1",
        SemanticText::new(vec![
            folio_babel::model::Run::Index {
                term: "entropy".to_string(),
                sub_term: None,
                inner: Some(Box::new(folio_babel::model::Run::Strong(
                    "Entropy".to_string(),
                ))),
            },
            folio_babel::model::Run::Text(" measures uncertainty ".to_string()),
            folio_babel::model::Run::Citation {
                key: "shannon1948".to_string(),
                text: "[1]".to_string(),
            },
        ]),
    )
    .with_hints(vec![
        RenderingHint::flag("semantic:definition"),
        RenderingHint::new(
            "accessibility:label",
            HintValue::Text("Definition of entropy".to_string()),
        ),
    ]);

    let section = StructuralContainer::new(
        ContainerKind::Section,
        "sec-1-1",
        SemanticText::from_text("Entropy"),
    )
    .with_label("1.1")
    .with_children(vec![
        Node::Block(definition),
        Node::Block(ContentBlock::new(
            "math-1",
            "folio:block/math",
            BlockPayload::Math("H = -\\sum p_i \\log p_i".to_string()),
        )),
        Node::Block(ContentBlock::new(
            "code-1",
            "folio:block/code",
            BlockPayload::Listing {
                language: Some("rust".to_string()),
                content: "fn entropy(p: &[f64]) -> f64 { todo!() }".to_string(),
            },
        )),
    ]);

    let chapter = StructuralContainer::new(
        ContainerKind::Chapter,
        "ch-1",
        SemanticText::from_text("A Mathematical Theory"),
    )
    .with_label("1")
    .with_children(vec![
        Node::Block(ContentBlock::paragraph(
            "intro-1",
            SemanticText::new(vec![
                folio_babel::model::Run::Text("Communication reduces to ".to_string()),
                folio_babel::model::Run::Emphasis("reproducing a message".to_string()),
                folio_babel::model::Run::Text(".".to_string()),
            ]),
        )),
        Node::Block(ContentBlock::new(
            "list-1",
            "folio:block/list",
            BlockPayload::List {
                ordered: true,
                items: vec![
                    SemanticText::from_text("source"),
                    SemanticText::from_text("channel"),
                    SemanticText::from_text("destination"),
                ],
            },
        )),
        Node::Container(section),
        Node::Block(ContentBlock::new(
            "fig-1",
            "folio:block/figure",
            BlockPayload::Figure {
                src: "schematic.png".to_string(),
                alt: "Communication system schematic".to_string(),
                caption: Some(SemanticText::from_text("Fig. 1. A general system.")),
            },
        )),
    ]);

    let unit = StructuralContainer::new(
        ContainerKind::Unit,
        "unit-1",
        SemanticText::from_text("Discrete Systems"),
    )
    .with_label("I")
    .with_children(vec![Node::Container(chapter)]);

    doc.body_matter = vec![Node::Container(unit)];

    doc.back_matter = vec![Node::Block(ContentBlock::new(
        "quote-1",
        "folio:block/quote",
        BlockPayload::Prose(SemanticText::from_text(
            "Information is the resolution of uncertainty.",
        )),
    ))];

    doc
}
