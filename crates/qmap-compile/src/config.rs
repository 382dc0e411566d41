//! Compiler configuration.
//!
//! Configuration is resolved in three steps, later steps winning:
//! 1. Default values
//! 2. A YAML configuration file ([`CompilerConfig::from_file`])
//! 3. Environment variables with the `QMAP_` prefix ([`CompilerConfig::apply_env`])

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::device::DeviceCharacterization;
use crate::error::{CompileError, CompileResult};

/// Complete compiler configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Placement settings
    #[serde(default)]
    pub placement: PlacementConfig,

    /// Routing settings
    #[serde(default)]
    pub routing: RoutingConfig,
}

/// How the initial placement is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementStrategy {
    /// The i-th logical qubit goes to the i-th node in id order.
    Trivial,
    /// Best-first subgraph matching of the interaction graph.
    #[default]
    Graph,
}

/// Placement engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Only operations in the first `depth_limit` layers shape the placement
    #[serde(default = "default_depth_limit")]
    pub depth_limit: usize,

    /// Wall-clock budget for the search, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of search states expanded
    #[serde(default = "default_max_expansions")]
    pub max_expansions: usize,

    /// Complete matches compared on noise before settling
    #[serde(default = "default_max_matches")]
    pub max_matches: usize,

    /// Placement strategy
    #[serde(default)]
    pub strategy: PlacementStrategy,

    /// Device error rates for noise-aware tie-breaking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characterization: Option<DeviceCharacterization>,
}

/// Routing engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Number of upcoming two-qubit gates scored when choosing a swap
    #[serde(default = "default_lookahead_depth")]
    pub lookahead_depth: usize,

    /// Weight multiplier applied per lookahead step
    #[serde(default = "default_lookahead_decay")]
    pub lookahead_decay: f64,

    /// Emit BRIDGE instead of SWAP for distance-2 CX when a swap does not pay off
    #[serde(default)]
    pub allow_bridge: bool,
}

fn default_depth_limit() -> usize {
    5
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_max_expansions() -> usize {
    100_000
}

fn default_max_matches() -> usize {
    16
}

fn default_lookahead_depth() -> usize {
    10
}

fn default_lookahead_decay() -> f64 {
    0.5
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            depth_limit: default_depth_limit(),
            timeout_ms: default_timeout_ms(),
            max_expansions: default_max_expansions(),
            max_matches: default_max_matches(),
            strategy: PlacementStrategy::default(),
            characterization: None,
        }
    }
}

impl PlacementConfig {
    /// The search time budget.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Use the given device error rates.
    #[must_use]
    pub fn with_characterization(mut self, characterization: DeviceCharacterization) -> Self {
        self.characterization = Some(characterization);
        self
    }

    /// Use the given strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: PlacementStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            lookahead_depth: default_lookahead_depth(),
            lookahead_decay: default_lookahead_decay(),
            allow_bridge: false,
        }
    }
}

impl RoutingConfig {
    /// Enable or disable BRIDGE insertion.
    #[must_use]
    pub fn with_bridges(mut self, allow: bool) -> Self {
        self.allow_bridge = allow;
        self
    }
}

impl CompilerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> CompileResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CompileError::Config(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(contents: &str) -> CompileResult<Self> {
        let config: CompilerConfig =
            serde_yaml_ng::from_str(contents).map_err(|e| CompileError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Override values from `QMAP_*` environment variables.
    ///
    /// Only variables that are set override; unparsable values are logged
    /// and ignored.
    #[must_use]
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Override values from an arbitrary variable lookup.
    #[must_use]
    pub fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parse<T: std::str::FromStr>(key: &str, value: Option<String>) -> Option<T> {
            let value = value?;
            match value.trim().parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!("Ignoring {key}={value}: not a valid value");
                    None
                }
            }
        }

        if let Some(v) = parse("QMAP_DEPTH_LIMIT", lookup("QMAP_DEPTH_LIMIT")) {
            self.placement.depth_limit = v;
        }
        if let Some(v) = parse("QMAP_PLACEMENT_TIMEOUT_MS", lookup("QMAP_PLACEMENT_TIMEOUT_MS")) {
            self.placement.timeout_ms = v;
        }
        if let Some(v) = parse("QMAP_MAX_EXPANSIONS", lookup("QMAP_MAX_EXPANSIONS")) {
            self.placement.max_expansions = v;
        }
        if let Some(v) = parse("QMAP_LOOKAHEAD_DEPTH", lookup("QMAP_LOOKAHEAD_DEPTH")) {
            self.routing.lookahead_depth = v;
        }
        if let Some(v) = parse("QMAP_ALLOW_BRIDGE", lookup("QMAP_ALLOW_BRIDGE")) {
            self.routing.allow_bridge = v;
        }
        self
    }

    /// Check that all values are in range.
    pub fn validate(&self) -> CompileResult<()> {
        if self.placement.depth_limit == 0 {
            return Err(CompileError::Config("placement.depth_limit must be at least 1".into()));
        }
        if self.placement.max_expansions == 0 {
            return Err(CompileError::Config(
                "placement.max_expansions must be at least 1".into(),
            ));
        }
        if self.placement.max_matches == 0 {
            return Err(CompileError::Config("placement.max_matches must be at least 1".into()));
        }
        let decay = self.routing.lookahead_decay;
        if !(decay > 0.0 && decay <= 1.0) {
            return Err(CompileError::Config(format!(
                "routing.lookahead_decay must be in (0, 1], got {decay}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::default();
        assert_eq!(config.placement.depth_limit, 5);
        assert_eq!(config.placement.timeout(), Duration::from_millis(2000));
        assert_eq!(config.placement.max_expansions, 100_000);
        assert_eq!(config.placement.max_matches, 16);
        assert_eq!(config.placement.strategy, PlacementStrategy::Graph);
        assert_eq!(config.routing.lookahead_depth, 10);
        assert!((config.routing.lookahead_decay - 0.5).abs() < f64::EPSILON);
        assert!(!config.routing.allow_bridge);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml() {
        let config = CompilerConfig::from_yaml(
            "placement:\n  depth_limit: 3\n  strategy: trivial\nrouting:\n  allow_bridge: true\n",
        )
        .unwrap();
        assert_eq!(config.placement.depth_limit, 3);
        assert_eq!(config.placement.strategy, PlacementStrategy::Trivial);
        assert_eq!(config.placement.max_matches, 16);
        assert!(config.routing.allow_bridge);
        assert_eq!(config.routing.lookahead_depth, 10);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = CompilerConfig::from_yaml("placement:\n  depth_limit: 0\n").unwrap_err();
        assert!(matches!(err, CompileError::Config(_)));
        let err = CompilerConfig::from_yaml("routing:\n  lookahead_decay: 1.5\n").unwrap_err();
        assert!(matches!(err, CompileError::Config(_)));
        assert!(CompilerConfig::from_yaml("placement: [1, 2]").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: FxHashMap<&str, &str> = [
            ("QMAP_DEPTH_LIMIT", "8"),
            ("QMAP_ALLOW_BRIDGE", "true"),
            ("QMAP_LOOKAHEAD_DEPTH", "not-a-number"),
        ]
        .into_iter()
        .collect();
        let config = CompilerConfig::default()
            .apply_env_from(|key| vars.get(key).map(|v| (*v).to_string()));
        assert_eq!(config.placement.depth_limit, 8);
        assert!(config.routing.allow_bridge);
        assert_eq!(config.routing.lookahead_depth, 10);
        assert_eq!(config.placement.timeout_ms, 2000);
    }

    #[test]
    fn test_from_file_missing() {
        let err = CompilerConfig::from_file("/nonexistent/qmap.yaml").unwrap_err();
        assert!(matches!(err, CompileError::Config(_)));
    }
}
