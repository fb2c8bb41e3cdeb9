//! Noise ball configuration and dispatch sizing
//!
//! The configuration is the host-editable surface of the component. Whenever
//! it changes it must go through [`NoiseBallConfig::validate`], which clamps
//! the values the GPU sizing depends on.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NoiseBallError, Result};

// =============================================================================
// Default Constants
// =============================================================================

/// Width of one compute thread group (must match `@workgroup_size` in the kernels)
pub const THREAD_GROUP_WIDTH: u32 = 64;

/// Smallest active node count the component ever reports
pub const MIN_ACTIVE_NODES: u32 = 2;

/// Default capacity ceiling
pub const DEFAULT_MAX_NODES: u32 = 1000;

/// Default initial active node count
pub const DEFAULT_NUM_NODES: u32 = 10;

/// Default node scale (also the `_Scale` render uniform)
pub const DEFAULT_SCALE: f32 = 0.1;

/// Default per-frame growth of a node's size
pub const DEFAULT_GROWTH_RATE: f32 = 0.01;

/// Default upper bound on a node's size
pub const DEFAULT_MAX_SIZE: f32 = 0.5;

/// Tunable parameters of a noise ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseBallConfig {
    /// Capacity ceiling; clamped to at least one thread group
    pub max_nodes: u32,
    /// Initial active node count (cosmetic; reset to 2 on every init)
    pub num_nodes: u32,
    /// Node scale passed to both the update kernel and the material
    pub scale: f32,
    /// Growth per step of a node's size
    pub growth_rate: f32,
    /// Maximum node size
    pub max_size: f32,
}

impl Default for NoiseBallConfig {
    fn default() -> Self {
        Self {
            max_nodes: DEFAULT_MAX_NODES,
            num_nodes: DEFAULT_NUM_NODES,
            scale: DEFAULT_SCALE,
            growth_rate: DEFAULT_GROWTH_RATE,
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl NoiseBallConfig {
    /// Set the capacity ceiling
    pub fn with_max_nodes(mut self, max_nodes: u32) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Set the node scale
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the growth rate
    pub fn with_growth_rate(mut self, growth_rate: f32) -> Self {
        self.growth_rate = growth_rate;
        self
    }

    /// Set the maximum node size
    pub fn with_max_size(mut self, max_size: f32) -> Self {
        self.max_size = max_size;
        self
    }

    /// Clamp the configuration to its invariants.
    ///
    /// Run this whenever the configuration is edited. `max_nodes` is raised
    /// to one full thread group and `num_nodes` to two.
    pub fn validate(&mut self) {
        if self.max_nodes < THREAD_GROUP_WIDTH {
            tracing::warn!(
                configured = self.max_nodes,
                clamped = THREAD_GROUP_WIDTH,
                "max_nodes below one thread group"
            );
            self.max_nodes = THREAD_GROUP_WIDTH;
        }
        if self.num_nodes < MIN_ACTIVE_NODES {
            tracing::warn!(
                configured = self.num_nodes,
                clamped = MIN_ACTIVE_NODES,
                "num_nodes below minimum"
            );
            self.num_nodes = MIN_ACTIVE_NODES;
        }
    }

    /// Return a validated copy
    pub fn validated(mut self) -> Self {
        self.validate();
        self
    }

    /// Number of thread groups per dispatch (`max_nodes / 64`, truncating)
    pub fn thread_group_count(&self) -> u32 {
        self.max_nodes / THREAD_GROUP_WIDTH
    }

    /// Number of nodes actually simulated and drawn.
    ///
    /// Always a multiple of the thread group width and never above `max_nodes`.
    pub fn node_count(&self) -> u32 {
        THREAD_GROUP_WIDTH * self.thread_group_count()
    }

    /// Capacity of the edge buffer
    pub fn max_edges(&self) -> u32 {
        self.node_count()
    }

    /// Load a configuration file, choosing the parser by extension.
    ///
    /// `.yaml`/`.yml` and `.json` are supported. The result is validated.
    pub fn load(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| NoiseBallError::UnknownExtension(path.display().to_string()))?;

        let ext = ext.to_ascii_lowercase();
        if !matches!(ext.as_str(), "yaml" | "yml" | "json") {
            return Err(NoiseBallError::UnsupportedFormat(ext));
        }

        let text = std::fs::read_to_string(path)?;
        let config: Self = if ext == "json" {
            serde_json::from_str(&text)?
        } else {
            serde_yaml::from_str(&text)?
        };

        tracing::debug!(path = %path.display(), "loaded noise ball config");
        Ok(config.validated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NoiseBallConfig::default();
        assert_eq!(config.max_nodes, 1000);
        assert_eq!(config.num_nodes, 10);
        assert_eq!(config.scale, 0.1);
        assert_eq!(config.growth_rate, 0.01);
        assert_eq!(config.max_size, 0.5);
    }

    #[test]
    fn test_default_node_count_rounds_down() {
        let config = NoiseBallConfig::default();
        assert_eq!(config.thread_group_count(), 15);
        assert_eq!(config.node_count(), 960);
        assert_eq!(config.max_edges(), 960);
    }

    #[test]
    fn test_node_count_is_positive_multiple_of_group_width() {
        for max_nodes in [64, 65, 127, 128, 129, 1000, 4096, 65_535] {
            let config = NoiseBallConfig::default().with_max_nodes(max_nodes).validated();
            let count = config.node_count();
            assert!(count > 0);
            assert_eq!(count % THREAD_GROUP_WIDTH, 0);
            assert_eq!(count, 64 * (max_nodes / 64));
            assert!(count <= max_nodes);
        }
    }

    #[test]
    fn test_validate_clamps_small_values() {
        let mut config = NoiseBallConfig {
            max_nodes: 10,
            num_nodes: 0,
            ..Default::default()
        };
        config.validate();
        assert_eq!(config.max_nodes, THREAD_GROUP_WIDTH);
        assert_eq!(config.num_nodes, MIN_ACTIVE_NODES);
        assert_eq!(config.node_count(), 64);
    }

    #[test]
    fn test_validate_keeps_valid_values() {
        let mut config = NoiseBallConfig::default().with_max_nodes(200);
        config.validate();
        assert_eq!(config.max_nodes, 200);
        assert_eq!(config.num_nodes, 10);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: NoiseBallConfig = serde_yaml::from_str("max_nodes: 256\nscale: 0.2\n").unwrap();
        assert_eq!(config.max_nodes, 256);
        assert_eq!(config.scale, 0.2);
        assert_eq!(config.growth_rate, DEFAULT_GROWTH_RATE);
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let err = NoiseBallConfig::load(Path::new("ball.toml")).unwrap_err();
        assert!(matches!(err, NoiseBallError::UnsupportedFormat(ref ext) if ext == "toml"));
    }

    #[test]
    fn test_load_yaml_file_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ball.yml");
        std::fs::write(&path, "max_nodes: 3\ngrowth_rate: 0.05\n").unwrap();

        let config = NoiseBallConfig::load(&path).unwrap();
        assert_eq!(config.max_nodes, THREAD_GROUP_WIDTH);
        assert_eq!(config.growth_rate, 0.05);
    }

    #[test]
    fn test_load_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ball.JSON");
        std::fs::write(&path, r#"{"max_nodes": 512, "max_size": 0.25}"#).unwrap();

        let config = NoiseBallConfig::load(&path).unwrap();
        assert_eq!(config.node_count(), 512);
        assert_eq!(config.max_size, 0.25);
        assert_eq!(config.scale, DEFAULT_SCALE);
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ball.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = NoiseBallConfig::load(&path).unwrap_err();
        assert!(matches!(err, NoiseBallError::Json(_)));
    }

    #[test]
    fn test_load_requires_extension() {
        let err = NoiseBallConfig::load(Path::new("noiseball")).unwrap_err();
        assert!(matches!(err, NoiseBallError::UnknownExtension(_)));
    }
}
