//! Configuration types for the canvas engine

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{defaults, layout, limits};
use crate::error::Result;

/// Placement of synthesized nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    /// Offset below the anchor node
    pub vertical_gap: f64,
    /// Size given to synthesized text-editor nodes
    pub text_node_width: f64,
    pub text_node_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            vertical_gap: layout::VERTICAL_GAP,
            text_node_width: layout::TEXT_NODE_WIDTH,
            text_node_height: layout::TEXT_NODE_HEIGHT,
        }
    }
}

/// Limits applied when the graph is edited or extended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LimitsConfig {
    /// Maximum characters in a text payload
    pub max_text_length: usize,
    /// Optional cap on the number of nodes in one graph
    pub max_nodes: Option<usize>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_text_length: limits::MAX_TEXT_LENGTH,
            max_nodes: None,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub layout: LayoutConfig,
    pub limits: LimitsConfig,
    /// Number of snapshots kept for undo/redo (0 disables history)
    pub history_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            limits: LimitsConfig::default(),
            history_depth: defaults::HISTORY_DEPTH,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file.
    ///
    /// A missing file yields the defaults; absent keys take their defaults.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !tokio::fs::try_exists(path).await? {
            log::debug!("No engine config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = tokio::fs::read_to_string(path).await?;
        let config = serde_json::from_str(&content)?;
        log::info!("Loaded engine config from {:?}", path);
        Ok(config)
    }
}
