//! View configuration: dimension setup, placeholder and style, as JSON.

use crate::hierarchy::{BuildOptions, DEFAULT_PLACEHOLDER};
use crate::model::Dimension;
use crate::selection::Selection;
use crate::style::StyleConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewConfig {
    pub dimensions: Vec<Dimension>,
    pub placeholder: String,
    pub max_dimensions: Option<usize>,
    pub style: StyleConfig,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            dimensions: Vec::new(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            max_dimensions: None,
            style: StyleConfig::default(),
        }
    }
}

impl ViewConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Selection state described by this config, normalized.
    pub fn selection(&self) -> Selection {
        Selection::from_dimensions(self.dimensions.clone(), self.max_dimensions)
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            placeholder: self.placeholder.clone(),
        }
    }

    /// Snapshot the live state back into a config.
    pub fn capture(selection: &Selection, options: &BuildOptions, style: &StyleConfig) -> Self {
        Self {
            dimensions: selection.dimensions().to_vec(),
            placeholder: options.placeholder.clone(),
            max_dimensions: selection.limit(),
            style: style.clone(),
        }
    }
}
