//! Rendering hint types.
//!
//! Hints are author-supplied presentation directives attached to content
//! blocks. They are immutable inputs to conversion: the hints engine
//! interprets them, it never rewrites them. A hint's kind is a namespaced
//! identifier of the form `<namespace>:<subtype>`, e.g.
//! `accessibility:live-region` or `layout:width`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Priority assumed when a hint does not carry one.
pub const DEFAULT_HINT_PRIORITY: i32 = 50;

/// The four hint namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HintNamespace {
    Semantic,
    Accessibility,
    Layout,
    Pedagogical,
}

impl HintNamespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            HintNamespace::Semantic => "semantic",
            HintNamespace::Accessibility => "accessibility",
            HintNamespace::Layout => "layout",
            HintNamespace::Pedagogical => "pedagogical",
        }
    }

    pub fn from_str(name: &str) -> Option<Self> {
        match name {
            "semantic" => Some(HintNamespace::Semantic),
            "accessibility" => Some(HintNamespace::Accessibility),
            "layout" => Some(HintNamespace::Layout),
            "pedagogical" => Some(HintNamespace::Pedagogical),
            _ => None,
        }
    }
}

/// The value carried by a hint: a scalar, or a structured record for
/// multi-field hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HintValue {
    Flag(bool),
    Text(String),
    Number(f64),
    Structured(Value),
}

impl HintValue {
    /// Attribute-friendly encoding; structured values are JSON-encoded.
    pub fn encode(&self) -> String {
        match self {
            HintValue::Flag(flag) => flag.to_string(),
            HintValue::Text(text) => text.clone(),
            HintValue::Number(number) => {
                if number.fract() == 0.0 {
                    format!("{}", *number as i64)
                } else {
                    number.to_string()
                }
            }
            HintValue::Structured(value) => value.to_string(),
        }
    }

    /// Inverse of [`HintValue::encode`], best effort.
    pub fn decode(raw: &str) -> Self {
        match raw {
            "true" => return HintValue::Flag(true),
            "false" => return HintValue::Flag(false),
            _ => {}
        }
        if let Ok(number) = raw.parse::<f64>() {
            return HintValue::Number(number);
        }
        if raw.starts_with('{') || raw.starts_with('[') {
            if let Ok(value) = serde_json::from_str::<Value>(raw) {
                return HintValue::Structured(value);
            }
        }
        HintValue::Text(raw.to_string())
    }
}

/// Conditions restricting when a hint applies.
///
/// All fields are allowlists or expressions; an absent field never restricts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HintConditions {
    /// Output formats the hint applies to (e.g. `["html"]`).
    pub formats: Option<Vec<String>>,
    /// Media-context expression (e.g. `"screen"`, `"print"`).
    pub media: Option<String>,
    /// User preferences, at least one of which must be active.
    pub preferences: Option<Vec<String>>,
}

/// An author-supplied, conditionally-applied presentation directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderingHint {
    /// Namespaced hint kind, `<namespace>:<subtype>`.
    pub kind: String,
    pub value: HintValue,
    pub priority: Option<i32>,
    pub conditions: Option<HintConditions>,
}

impl RenderingHint {
    pub fn new(kind: &str, value: HintValue) -> Self {
        RenderingHint {
            kind: kind.to_string(),
            value,
            priority: None,
            conditions: None,
        }
    }

    pub fn flag(kind: &str) -> Self {
        Self::new(kind, HintValue::Flag(true))
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_formats(mut self, formats: &[&str]) -> Self {
        self.conditions.get_or_insert_with(Default::default).formats =
            Some(formats.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn with_media(mut self, media: &str) -> Self {
        self.conditions.get_or_insert_with(Default::default).media = Some(media.to_string());
        self
    }

    pub fn with_preferences(mut self, preferences: &[&str]) -> Self {
        self.conditions
            .get_or_insert_with(Default::default)
            .preferences = Some(preferences.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn effective_priority(&self) -> i32 {
        self.priority.unwrap_or(DEFAULT_HINT_PRIORITY)
    }

    /// Namespace and subtype parsed out of the kind identifier.
    ///
    /// Returns `None` when the namespace is not one of the four known ones;
    /// such hints still pass through conversion as opaque attributes.
    pub fn namespace(&self) -> Option<(HintNamespace, &str)> {
        let (namespace, subtype) = self.kind.split_once(':')?;
        Some((HintNamespace::from_str(namespace)?, subtype))
    }
}
