//! Text and structural boundary for configuration documents.
//!
//! Parsing here is structural only: field presence and types, via serde.
//! Semantic validation (ranges, cross-references, live-state checks) is a
//! separate later pass.

use serde_json::Value;

use super::model::ConfigurationDocument;
use crate::domain::{DcError, DcResult};

/// Recognized export forms. `yml` is accepted as a friendly alias and an
/// empty or missing name means JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Dict,
    Json,
    Yaml,
}

impl ExportFormat {
    pub fn parse(name: &str) -> DcResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "json" => Ok(Self::Json),
            "dict" => Ok(Self::Dict),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(DcError::Format(other.to_string())),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dict => "dict",
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

pub fn to_json(document: &ConfigurationDocument) -> DcResult<String> {
    serde_json::to_string_pretty(document)
        .map_err(|error| DcError::Structural(error.to_string()))
}

pub fn to_yaml(document: &ConfigurationDocument) -> DcResult<String> {
    serde_yaml::to_string(document).map_err(|error| DcError::Structural(error.to_string()))
}

/// The generic key/value form behind the "dict" format name.
pub fn to_value(document: &ConfigurationDocument) -> DcResult<Value> {
    serde_json::to_value(document).map_err(|error| DcError::Structural(error.to_string()))
}

/// Render the document in `format`. The dict form is rendered as its JSON
/// text; callers wanting the structural form use `to_value`.
pub fn serialize(document: &ConfigurationDocument, format: ExportFormat) -> DcResult<String> {
    match format {
        ExportFormat::Json | ExportFormat::Dict => to_json(document),
        ExportFormat::Yaml => to_yaml(document),
    }
}

pub fn from_json(text: &str) -> DcResult<ConfigurationDocument> {
    serde_json::from_str(text).map_err(|error| DcError::Structural(error.to_string()))
}

pub fn from_yaml(text: &str) -> DcResult<ConfigurationDocument> {
    serde_yaml::from_str(text).map_err(|error| DcError::Structural(error.to_string()))
}

pub fn from_value(value: Value) -> DcResult<ConfigurationDocument> {
    serde_json::from_value(value).map_err(|error| DcError::Structural(error.to_string()))
}

/// Recognize the kind of configuration text by its structure: trimmed text
/// starting with `{` is JSON, anything else is read as YAML.
pub fn detect_and_parse(text: &str) -> DcResult<ConfigurationDocument> {
    if text.trim_start().starts_with('{') {
        from_json(text)
    } else {
        from_yaml(text)
    }
}
