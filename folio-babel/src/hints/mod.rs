//! The rendering hints engine.
//!
//! [`decorate`] is a pure function from a block's hint list plus the caller's
//! context to concrete presentation decoration: class tokens, inline style
//! declarations, and extra attributes. It holds no state between calls.
//!
//! Application order: hints are sorted by descending priority (stable, so
//! document order breaks ties) and applied in that order. Merging is
//! first-wins per style property and per attribute name, which means a
//! higher-priority hint's declarations survive an overlap with a
//! lower-priority one. Class tokens are appended and deduplicated.
//!
//! Recovery channels: every emitted decoration is recoverable by the reverse
//! converter through exactly one channel per hint kind:
//!
//! - flag-like hints map to a class token in [`TOKEN_TABLE`] (invertible in
//!   both directions);
//! - the five accessibility subtypes map to their dedicated attributes
//!   (`aria-live`, `aria-hidden`, `aria-label`, `tabindex`, `accesskey`);
//! - valued layout/pedagogical hints and any unrecognized hint kind carry a
//!   `data-hint-<namespace>-<subtype>` attribute with the encoded value.

use crate::model::hints::{HintNamespace, HintValue, RenderingHint};
use serde_json::Value;

/// Decoration produced by the engine and merged onto an emitted element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Decoration {
    pub classes: Vec<String>,
    pub styles: Vec<(String, String)>,
    pub attributes: Vec<(String, String)>,
}

impl Decoration {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.styles.is_empty() && self.attributes.is_empty()
    }

    /// Inline `style` attribute value, or `None` when no declarations apply.
    pub fn style_attribute(&self) -> Option<String> {
        if self.styles.is_empty() {
            return None;
        }
        let declarations: Vec<String> = self
            .styles
            .iter()
            .map(|(property, value)| format!("{property}: {value}"))
            .collect();
        Some(declarations.join("; "))
    }

    fn add_class(&mut self, class: &str) {
        if !self.classes.iter().any(|existing| existing == class) {
            self.classes.push(class.to_string());
        }
    }

    fn add_style(&mut self, property: &str, value: String) {
        if !self.styles.iter().any(|(existing, _)| existing == property) {
            self.styles.push((property.to_string(), value));
        }
    }

    fn add_attribute(&mut self, name: &str, value: String) {
        if !self.attributes.iter().any(|(existing, _)| existing == name) {
            self.attributes.push((name.to_string(), value));
        }
    }
}

/// Caller context the engine evaluates hint conditions against.
#[derive(Debug, Clone, PartialEq)]
pub struct HintContext {
    /// Current output format name (e.g. `"html"`).
    pub target_format: String,
    /// Current media context, when the caller knows it.
    pub media: Option<String>,
    /// Active user preferences.
    pub preferences: Vec<String>,
}

impl Default for HintContext {
    fn default() -> Self {
        HintContext {
            target_format: "html".to_string(),
            media: None,
            preferences: vec![],
        }
    }
}

/// One row of the presentation-token table: a flag-like hint kind and the
/// class token it emits. Kept as a single static table so the forward and
/// reverse directions cannot drift apart.
pub struct TokenMapping {
    pub hint_kind: &'static str,
    pub class_token: &'static str,
}

/// Invertible hint-kind ↔ class-token table for flag-like hints.
pub const TOKEN_TABLE: &[TokenMapping] = &[
    TokenMapping { hint_kind: "semantic:definition", class_token: "folio-sem-definition" },
    TokenMapping { hint_kind: "semantic:theorem", class_token: "folio-sem-theorem" },
    TokenMapping { hint_kind: "semantic:proof", class_token: "folio-sem-proof" },
    TokenMapping { hint_kind: "semantic:example", class_token: "folio-sem-example" },
    TokenMapping { hint_kind: "semantic:note", class_token: "folio-sem-note" },
    TokenMapping { hint_kind: "semantic:important", class_token: "folio-sem-important" },
    TokenMapping { hint_kind: "layout:keep-together", class_token: "folio-layout-keep-together" },
    TokenMapping { hint_kind: "layout:full-width", class_token: "folio-layout-full-width" },
    TokenMapping { hint_kind: "pedagogical:objective", class_token: "folio-ped-objective" },
    TokenMapping { hint_kind: "pedagogical:exercise", class_token: "folio-ped-exercise" },
    TokenMapping { hint_kind: "pedagogical:key-concept", class_token: "folio-ped-key-concept" },
];

/// Class token for a flag-like hint kind, if the table knows it.
pub fn token_for_kind(kind: &str) -> Option<&'static str> {
    TOKEN_TABLE
        .iter()
        .find(|mapping| mapping.hint_kind == kind)
        .map(|mapping| mapping.class_token)
}

/// Hint kind for a class token, if the table knows it.
pub fn kind_for_token(token: &str) -> Option<&'static str> {
    TOKEN_TABLE
        .iter()
        .find(|mapping| mapping.class_token == token)
        .map(|mapping| mapping.hint_kind)
}

/// Map a hint list and context to decoration. Pure; hints are never mutated.
pub fn decorate(hints: &[RenderingHint], context: &HintContext) -> Decoration {
    let mut applicable: Vec<&RenderingHint> =
        hints.iter().filter(|hint| applies(hint, context)).collect();
    // Stable sort: equal priorities keep document order.
    applicable.sort_by_key(|hint| std::cmp::Reverse(hint.effective_priority()));

    let mut decoration = Decoration::default();
    for hint in applicable {
        apply_hint(hint, &mut decoration);
    }
    decoration
}

fn applies(hint: &RenderingHint, context: &HintContext) -> bool {
    let conditions = match &hint.conditions {
        Some(conditions) => conditions,
        None => return true,
    };

    if let Some(formats) = &conditions.formats {
        if !formats.iter().any(|format| format == &context.target_format) {
            return false;
        }
    }

    if let Some(expression) = &conditions.media {
        // Unrecognized or complex media expressions default to "matches" so
        // content is never silently hidden by an expression we cannot read.
        if let (Some(current), true) = (&context.media, is_simple_media(expression)) {
            if expression != current {
                return false;
            }
        }
    }

    if let Some(preferences) = &conditions.preferences {
        let overlap = preferences
            .iter()
            .any(|preference| context.preferences.contains(preference));
        if !overlap {
            return false;
        }
    }

    true
}

fn is_simple_media(expression: &str) -> bool {
    matches!(expression, "screen" | "print" | "speech" | "all")
}

fn apply_hint(hint: &RenderingHint, decoration: &mut Decoration) {
    let (namespace, subtype) = match hint.namespace() {
        Some(parsed) => parsed,
        None => {
            // Unknown namespace: pass through opaquely rather than drop.
            decoration.add_attribute(&opaque_attribute_name(&hint.kind), hint.value.encode());
            return;
        }
    };

    match namespace {
        HintNamespace::Semantic | HintNamespace::Pedagogical => {
            match token_for_kind(&hint.kind) {
                Some(token) => decoration.add_class(token),
                None => decoration
                    .add_attribute(&opaque_attribute_name(&hint.kind), hint.value.encode()),
            }
        }
        HintNamespace::Accessibility => apply_accessibility(subtype, hint, decoration),
        HintNamespace::Layout => apply_layout(subtype, hint, decoration),
    }
}

/// The fixed accessibility attribute set: live-region mode, hidden flag,
/// label text, tab order, access key. Extending it means extending this
/// table, not the model.
fn apply_accessibility(subtype: &str, hint: &RenderingHint, decoration: &mut Decoration) {
    match subtype {
        "live-region" => decoration.add_attribute("aria-live", hint.value.encode()),
        "hidden" => decoration.add_attribute("aria-hidden", hint.value.encode()),
        "label" => decoration.add_attribute("aria-label", hint.value.encode()),
        "tab-order" => decoration.add_attribute("tabindex", hint.value.encode()),
        "access-key" => decoration.add_attribute("accesskey", hint.value.encode()),
        _ => decoration.add_attribute(&opaque_attribute_name(&hint.kind), hint.value.encode()),
    }
}

fn apply_layout(subtype: &str, hint: &RenderingHint, decoration: &mut Decoration) {
    match subtype {
        "keep-together" | "full-width" => {
            if let Some(token) = token_for_kind(&hint.kind) {
                decoration.add_class(token);
            }
            if subtype == "keep-together" {
                decoration.add_style("break-inside", "avoid".to_string());
            }
        }
        "width" => {
            decoration.add_style("width", hint.value.encode());
            decoration.add_attribute(&opaque_attribute_name(&hint.kind), hint.value.encode());
        }
        "align" => {
            decoration.add_style("text-align", hint.value.encode());
            decoration.add_attribute(&opaque_attribute_name(&hint.kind), hint.value.encode());
        }
        "size" => {
            // Structured multi-field hint: each recognized field contributes
            // its own style declaration.
            if let HintValue::Structured(Value::Object(fields)) = &hint.value {
                for property in ["width", "height", "max-width", "max-height"] {
                    if let Some(Value::String(value)) = fields.get(property) {
                        decoration.add_style(property, value.clone());
                    }
                }
            }
            decoration.add_attribute(&opaque_attribute_name(&hint.kind), hint.value.encode());
        }
        _ => decoration.add_attribute(&opaque_attribute_name(&hint.kind), hint.value.encode()),
    }
}

/// Attribute name carrying an opaque or valued hint: `data-hint-<ns>-<subtype>`.
pub fn opaque_attribute_name(kind: &str) -> String {
    format!("data-hint-{}", kind.replace(':', "-"))
}

/// Inverse of [`opaque_attribute_name`]: recover the hint kind from a
/// `data-hint-*` attribute name, when the namespace is recognizable.
pub fn kind_from_opaque_attribute(name: &str) -> Option<String> {
    let rest = name.strip_prefix("data-hint-")?;
    let (namespace, subtype) = rest.split_once('-')?;
    if subtype.is_empty() {
        return None;
    }
    Some(format!("{namespace}:{subtype}"))
}
