//! Shared configuration loader for the folio toolchain.
//!
//! `defaults/folio.default.toml` is embedded into every binary so that docs
//! and runtime behavior stay in sync. Applications layer user-specific files
//! on top of those defaults via [`Loader`] before deserializing into
//! [`FolioConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use folio_babel::fidelity::FidelityOptions;
use folio_babel::hints::HintContext;
use folio_babel::HtmlOptions;
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/folio.default.toml");

/// Top-level configuration consumed by folio applications.
#[derive(Debug, Clone, Deserialize)]
pub struct FolioConfig {
    pub render: RenderConfig,
    pub hints: HintsConfig,
    pub fidelity: FidelityConfig,
}

/// Mirrors the knobs exposed by the HTML serializer.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    pub fragment: bool,
    pub sanitize: bool,
    pub chunk_threshold: usize,
    pub custom_css: Option<String>,
}

/// Context the hints engine evaluates hint conditions against.
#[derive(Debug, Clone, Deserialize)]
pub struct HintsConfig {
    pub target_format: String,
    pub media: Option<String>,
    pub preferences: Vec<String>,
}

impl From<&HintsConfig> for HintContext {
    fn from(config: &HintsConfig) -> Self {
        HintContext {
            target_format: config.target_format.clone(),
            media: config.media.clone(),
            preferences: config.preferences.clone(),
        }
    }
}

/// Round-trip tester configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FidelityConfig {
    pub threshold: f64,
}

impl From<&FolioConfig> for HtmlOptions {
    fn from(config: &FolioConfig) -> Self {
        HtmlOptions {
            fragment: config.render.fragment,
            sanitize: config.render.sanitize,
            chunk_threshold: config.render.chunk_threshold,
            custom_css: config.render.custom_css.clone(),
            hint_context: HintContext::from(&config.hints),
        }
    }
}

impl From<&FolioConfig> for FidelityOptions {
    fn from(config: &FolioConfig) -> Self {
        FidelityOptions {
            threshold: config.fidelity.threshold,
            html: HtmlOptions::from(config),
        }
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<FolioConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<FolioConfig, ConfigError> {
    Loader::new().build()
}
