//! Round-trip fidelity testing.
//!
//! [`test_round_trip`] renders a document, parses the result back, and scores
//! the reconstruction against the original on three axes:
//!
//! - **content**: bibliographic fields plus positional pairwise block
//!   comparison (equal kind and word-overlap of plain text), scaled down when
//!   block counts diverge;
//! - **formatting**: per-run-tag occurrence counts across all rich text;
//! - **structure**: zone presence and maximum nesting depth.
//!
//! The overall score is a weighted combination; `success` is a threshold
//! check. A [`FidelityResult`] is data, never an error: callers get the full
//! issue and difference lists regardless of the verdict.
//!
//! Plain-text runs are excluded from the formatting counts. Adjacent text
//! runs legitimately merge into one markup text node, so their count is not
//! meaningful across a round trip; text loss shows up on the content axis
//! instead.

use crate::formats::html::{parser, serializer, HtmlOptions};
use crate::model::{BlockPayload, ContentBlock, Document, Node, Run, SemanticText};
use serde::Serialize;
use std::collections::BTreeMap;

/// Default overall-score threshold for a round trip to count as a success.
pub const DEFAULT_THRESHOLD: f64 = 0.85;

/// Minimum word-overlap (Jaccard) for two block texts to count as a match.
const WORD_OVERLAP_THRESHOLD: f64 = 0.8;

const METADATA_PENALTY: f64 = 0.05;
const FORMATTING_TAG_PENALTY: f64 = 0.1;
const MATTER_PENALTY: f64 = 0.15;
const BODY_PENALTY: f64 = 0.4;
const DEPTH_PENALTY: f64 = 0.2;

const CONTENT_WEIGHT: f64 = 0.6;
const FORMATTING_WEIGHT: f64 = 0.2;
const STRUCTURE_WEIGHT: f64 = 0.2;

/// Options for a round-trip run.
#[derive(Debug, Clone)]
pub struct FidelityOptions {
    /// Overall score at or above which the round trip counts as a success.
    pub threshold: f64,
    /// Serialization options for the render leg.
    pub html: HtmlOptions,
}

impl Default for FidelityOptions {
    fn default() -> Self {
        FidelityOptions {
            threshold: DEFAULT_THRESHOLD,
            html: HtmlOptions {
                fragment: true,
                ..Default::default()
            },
        }
    }
}

/// The three scoring axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FidelityAxis {
    Content,
    Formatting,
    Structure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Minor,
    Major,
}

/// A scored divergence between original and reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FidelityIssue {
    pub axis: FidelityAxis,
    pub severity: Severity,
    pub description: String,
    pub expected: String,
    pub actual: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeKind {
    Missing,
    Added,
    Altered,
}

/// A located difference, independent of scoring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentDifference {
    /// Dotted path to the diverging part (e.g. `metadata.title`, `blocks[3]`).
    pub path: String,
    pub change: ChangeKind,
    /// Score impact attributed to this difference, in [0, 1].
    pub impact: f64,
}

/// Scores, verdict, and full diagnostics for one comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FidelityResult {
    pub content: f64,
    pub formatting: f64,
    pub structure: f64,
    pub overall: f64,
    pub success: bool,
    pub issues: Vec<FidelityIssue>,
    pub differences: Vec<DocumentDifference>,
}

/// Render, parse back, and score the reconstruction against the original.
pub fn test_round_trip(document: &Document, options: &FidelityOptions) -> FidelityResult {
    let rendered = serializer::render(document, &options.html);
    let parsed = parser::parse(&rendered.markup);
    compare_with_threshold(document, &parsed.document, options.threshold)
}

/// Compare two documents with the default threshold.
pub fn compare_documents(original: &Document, reconstructed: &Document) -> FidelityResult {
    compare_with_threshold(original, reconstructed, DEFAULT_THRESHOLD)
}

fn compare_with_threshold(
    original: &Document,
    reconstructed: &Document,
    threshold: f64,
) -> FidelityResult {
    let mut issues = vec![];
    let mut differences = vec![];

    let content = score_content(original, reconstructed, &mut issues, &mut differences);
    let formatting = score_formatting(original, reconstructed, &mut issues);
    let structure = score_structure(original, reconstructed, &mut issues, &mut differences);

    let overall =
        CONTENT_WEIGHT * content + FORMATTING_WEIGHT * formatting + STRUCTURE_WEIGHT * structure;

    FidelityResult {
        content,
        formatting,
        structure,
        overall,
        success: overall >= threshold,
        issues,
        differences,
    }
}

// ---------------------------------------------------------------------------
// Content axis

fn score_content(
    original: &Document,
    reconstructed: &Document,
    issues: &mut Vec<FidelityIssue>,
    differences: &mut Vec<DocumentDifference>,
) -> f64 {
    let mut penalty = 0.0;
    penalty += metadata_penalties(original, reconstructed, issues, differences);

    let a = original.blocks();
    let b = reconstructed.blocks();
    let block_score = if a.is_empty() && b.is_empty() {
        1.0
    } else {
        let paired = a.len().min(b.len());
        let matched = (0..paired).filter(|&i| blocks_match(a[i], b[i])).count();
        for i in 0..paired {
            if !blocks_match(a[i], b[i]) {
                issues.push(FidelityIssue {
                    axis: FidelityAxis::Content,
                    severity: Severity::Major,
                    description: format!("block {i} diverged"),
                    expected: describe_block(a[i]),
                    actual: describe_block(b[i]),
                });
                differences.push(DocumentDifference {
                    path: format!("blocks[{i}]"),
                    change: ChangeKind::Altered,
                    impact: 1.0 / paired as f64,
                });
            }
        }
        if a.len() != b.len() {
            let change = if b.len() < a.len() {
                ChangeKind::Missing
            } else {
                ChangeKind::Added
            };
            let ratio = paired as f64 / a.len().max(b.len()) as f64;
            issues.push(FidelityIssue {
                axis: FidelityAxis::Content,
                severity: Severity::Major,
                description: "block count diverged".to_string(),
                expected: a.len().to_string(),
                actual: b.len().to_string(),
            });
            differences.push(DocumentDifference {
                path: format!("blocks[{paired}..]"),
                change,
                impact: 1.0 - ratio,
            });
        }
        let matched_fraction = if paired == 0 {
            0.0
        } else {
            matched as f64 / paired as f64
        };
        let count_ratio = paired as f64 / a.len().max(b.len()) as f64;
        matched_fraction * count_ratio
    };

    (block_score - penalty).clamp(0.0, 1.0)
}

fn metadata_penalties(
    original: &Document,
    reconstructed: &Document,
    issues: &mut Vec<FidelityIssue>,
    differences: &mut Vec<DocumentDifference>,
) -> f64 {
    let fields: [(&str, Option<String>, Option<String>); 5] = [
        (
            "title",
            original.title().map(str::to_string),
            reconstructed.title().map(str::to_string),
        ),
        (
            "authors",
            Some(original.authors().join("; ")),
            Some(reconstructed.authors().join("; ")),
        ),
        (
            "issued",
            original.issued().map(str::to_string),
            reconstructed.issued().map(str::to_string),
        ),
        (
            "subject",
            Some(original.subject.clone()),
            Some(reconstructed.subject.clone()),
        ),
        (
            "language",
            Some(original.language.clone()),
            Some(reconstructed.language.clone()),
        ),
    ];

    let mut penalty = 0.0;
    for (name, expected, actual) in fields {
        if expected != actual {
            penalty += METADATA_PENALTY;
            issues.push(FidelityIssue {
                axis: FidelityAxis::Content,
                severity: Severity::Minor,
                description: format!("bibliographic field '{name}' diverged"),
                expected: expected.unwrap_or_default(),
                actual: actual.unwrap_or_default(),
            });
            differences.push(DocumentDifference {
                path: format!("metadata.{name}"),
                change: ChangeKind::Altered,
                impact: METADATA_PENALTY,
            });
        }
    }
    penalty
}

fn blocks_match(a: &ContentBlock, b: &ContentBlock) -> bool {
    a.kind == b.kind && word_overlap(&a.plain_text(), &b.plain_text()) >= WORD_OVERLAP_THRESHOLD
}

/// Jaccard similarity over lowercased word sets. Two empty texts overlap
/// fully.
fn word_overlap(a: &str, b: &str) -> f64 {
    let words_a: std::collections::BTreeSet<String> =
        a.split_whitespace().map(str::to_lowercase).collect();
    let words_b: std::collections::BTreeSet<String> =
        b.split_whitespace().map(str::to_lowercase).collect();
    if words_a.is_empty() && words_b.is_empty() {
        return 1.0;
    }
    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();
    intersection as f64 / union as f64
}

fn describe_block(block: &ContentBlock) -> String {
    let text = block.plain_text();
    let excerpt: String = text.chars().take(40).collect();
    format!("{} \"{excerpt}\"", block.kind)
}

// ---------------------------------------------------------------------------
// Formatting axis

fn score_formatting(
    original: &Document,
    reconstructed: &Document,
    issues: &mut Vec<FidelityIssue>,
) -> f64 {
    let counts_a = run_tag_counts(original);
    let counts_b = run_tag_counts(reconstructed);

    let mut tags: Vec<&str> = counts_a.keys().chain(counts_b.keys()).copied().collect();
    tags.sort();
    tags.dedup();

    let mut penalty = 0.0;
    for tag in tags {
        let expected = counts_a.get(tag).copied().unwrap_or(0);
        let actual = counts_b.get(tag).copied().unwrap_or(0);
        if expected != actual {
            penalty += FORMATTING_TAG_PENALTY;
            issues.push(FidelityIssue {
                axis: FidelityAxis::Formatting,
                severity: Severity::Minor,
                description: format!("run tag '{tag}' count diverged"),
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
    }
    (1.0 - penalty).clamp(0.0, 1.0)
}

/// Occurrence counts of non-plain run tags across every rich-text field:
/// container titles, prose, headings, list items, and figure captions.
fn run_tag_counts(document: &Document) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for zone in [
        &document.front_matter,
        &document.body_matter,
        &document.back_matter,
    ] {
        count_nodes(zone, &mut counts);
    }
    counts
}

fn count_nodes(nodes: &[Node], counts: &mut BTreeMap<&'static str, usize>) {
    for node in nodes {
        match node {
            Node::Container(container) => {
                count_text(&container.title, counts);
                count_nodes(&container.children, counts);
            }
            Node::Block(block) => match &block.payload {
                BlockPayload::Prose(text) | BlockPayload::Heading { text, .. } => {
                    count_text(text, counts)
                }
                BlockPayload::List { items, .. } => {
                    for item in items {
                        count_text(item, counts);
                    }
                }
                BlockPayload::Figure { caption, .. } => {
                    if let Some(caption) = caption {
                        count_text(caption, counts);
                    }
                }
                BlockPayload::Listing { .. } | BlockPayload::Math(_) | BlockPayload::Opaque(_) => {}
            },
        }
    }
}

fn count_text(text: &SemanticText, counts: &mut BTreeMap<&'static str, usize>) {
    for run in &text.runs {
        count_run(run, counts);
    }
}

fn count_run(run: &Run, counts: &mut BTreeMap<&'static str, usize>) {
    if run.tag() != "text" {
        *counts.entry(run.tag()).or_insert(0) += 1;
    }
    if let Run::Index {
        inner: Some(inner), ..
    } = run
    {
        count_run(inner, counts);
    }
}

// ---------------------------------------------------------------------------
// Structure axis

fn score_structure(
    original: &Document,
    reconstructed: &Document,
    issues: &mut Vec<FidelityIssue>,
    differences: &mut Vec<DocumentDifference>,
) -> f64 {
    let mut penalty = 0.0;

    let zones = [
        ("front_matter", &original.front_matter, &reconstructed.front_matter, MATTER_PENALTY),
        ("body_matter", &original.body_matter, &reconstructed.body_matter, BODY_PENALTY),
        ("back_matter", &original.back_matter, &reconstructed.back_matter, MATTER_PENALTY),
    ];
    for (name, a, b, zone_penalty) in zones {
        if a.is_empty() != b.is_empty() {
            penalty += zone_penalty;
            let severity = if zone_penalty >= BODY_PENALTY {
                Severity::Major
            } else {
                Severity::Minor
            };
            issues.push(FidelityIssue {
                axis: FidelityAxis::Structure,
                severity,
                description: format!("zone '{name}' presence diverged"),
                expected: (!a.is_empty()).to_string(),
                actual: (!b.is_empty()).to_string(),
            });
            differences.push(DocumentDifference {
                path: name.to_string(),
                change: if b.is_empty() {
                    ChangeKind::Missing
                } else {
                    ChangeKind::Added
                },
                impact: zone_penalty,
            });
        }
    }

    let depth_a = original.max_depth();
    let depth_b = reconstructed.max_depth();
    let divergence = depth_a.abs_diff(depth_b);
    if divergence > 0 {
        let (amount, severity) = if divergence > 1 {
            (DEPTH_PENALTY, Severity::Major)
        } else {
            (DEPTH_PENALTY / 2.0, Severity::Minor)
        };
        penalty += amount;
        issues.push(FidelityIssue {
            axis: FidelityAxis::Structure,
            severity,
            description: "maximum nesting depth diverged".to_string(),
            expected: depth_a.to_string(),
            actual: depth_b.to_string(),
        });
        differences.push(DocumentDifference {
            path: "depth".to_string(),
            change: ChangeKind::Altered,
            impact: amount,
        });
    }

    (1.0 - penalty).clamp(0.0, 1.0)
}
