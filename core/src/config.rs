//! Configuration types for the diagnostics engine

use crate::error::{DiagnosticsError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Main configuration for a validation context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Character encoding detection
    pub encoding: EncodingConfig,

    /// Schema selection
    pub schema: SchemaConfig,

    /// Suggestion generation
    pub suggestions: SuggestionConfig,
}

impl DiagnosticsConfig {
    /// Parse a YAML document
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or the result fails validation.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&text)?;
        debug!(path = %path.display(), "loaded diagnostics configuration");
        Ok(config)
    }

    /// Check values that serde cannot
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.schema.extension.trim().is_empty() {
            return Err(DiagnosticsError::config("schema.extension must not be empty"));
        }
        if self.encoding.fallback.trim().is_empty() {
            return Err(DiagnosticsError::config("encoding.fallback must not be empty"));
        }
        if self.suggestions.max_alternatives == 0 {
            warn!("suggestions.max_alternatives is 0, alternative lists will be elided");
        }
        Ok(())
    }
}

/// Character encoding detection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// Sniff a byte-order mark
    pub detect_bom: bool,

    /// Read `encoding="..."` from the XML declaration
    pub detect_declaration: bool,

    /// Label used when nothing is detected
    pub fallback: String,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            detect_bom: true,
            detect_declaration: true,
            fallback: "UTF-8".to_string(),
        }
    }
}

/// Schema selection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Keep only schemas whose target namespace the document declares
    pub filter_by_namespace: bool,

    /// File extension of schemas collected from a directory
    pub extension: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            filter_by_namespace: true,
            extension: "xsd".to_string(),
        }
    }
}

/// Suggestion configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    /// Largest edit distance still offered as "did you mean"
    pub max_edit_distance: usize,

    /// Cap on alternatives listed in one message
    pub max_alternatives: usize,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            max_edit_distance: 2,
            max_alternatives: 10,
        }
    }
}
