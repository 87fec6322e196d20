use serde::{Deserialize, Serialize};
use std::path::Path;

/// Width/height pair used for default node sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub w: i32,
    pub h: i32,
}

/// Rendering constants used for content-based node sizing. These
/// mirror the host's monospace text metrics; the core never measures
/// real fonts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSizingConfig {
    /// Padding around node content.
    pub padding: i32,
    /// Height of each line of text.
    pub line_height: i32,
    /// Average character width in the host's monospace font (pixels).
    pub char_width: i32,
}

impl Default for NodeSizingConfig {
    fn default() -> Self {
        Self {
            padding: 8,
            line_height: 14,
            char_width: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Padding inside groups.
    pub group_padding: i32,
    /// Spacing between siblings within a row or layer.
    pub gap: i32,
    /// Vertical distance between consecutive layers in the
    /// hierarchical layout.
    pub row_spacing: i32,
    /// Default size for class-kind entities (UML boxes).
    pub class_size: Size,
    /// Default size for node-kind entities (shapes).
    pub node_size: Size,
    /// Minimum size for groups, even when empty.
    pub min_group_size: Size,
    pub node_sizing: NodeSizingConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            group_padding: 24,
            gap: 24,
            row_spacing: 180,
            class_size: Size { w: 220, h: 120 },
            node_size: Size { w: 80, h: 80 },
            min_group_size: Size { w: 200, h: 120 },
            node_sizing: NodeSizingConfig::default(),
        }
    }
}

/// Load a layout config from a JSON file, or the defaults when no path
/// is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<LayoutConfig> {
    let Some(path) = path else {
        return Ok(LayoutConfig::default());
    };
    let raw = std::fs::read_to_string(path)?;
    let config = serde_json::from_str(&raw)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let config = LayoutConfig::default();
        assert!(config.group_padding > 0);
        assert!(config.class_size.w > config.node_size.w);
        assert!(config.row_spacing > config.class_size.h / 2);
    }

    #[test]
    fn config_roundtrips_through_json() {
        let config = LayoutConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: LayoutConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.gap, config.gap);
        assert_eq!(back.class_size, config.class_size);
    }
}
