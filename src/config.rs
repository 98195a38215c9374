use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

/// Upper bound of a community's density, reached by a single-member community.
pub const MAX_DENSITY: f64 = 1.0;

/// Scores within this distance of the maximum count as a tie.
pub const TIE_TOLERANCE: f64 = 0.0001;

/// Components with at most this many vertices are emitted as a single group.
pub const TRIVIAL_COMPONENT_SIZE: usize = 10;

pub const DEFAULT_SEED_DEPTH: usize = 1;

pub const DEFAULT_WEIGHT_UPDATE: f64 = 1.0;

pub const DEFAULT_MAX_ROUNDS: usize = 100;

/// How the community a vertex leaves is updated when the vertex moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecrementOrder {
    /// Recompute the old community's density from its current size, leaving the
    /// size untouched. Communities therefore never shrink.
    #[default]
    Reference,
    /// Decrement the old community's size first, then recompute its density.
    /// An emptied community is dropped from the table.
    Corrected,
}

/// What happens to vertices that no community ever reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnassignedPolicy {
    /// Each unassigned vertex becomes its own group.
    #[default]
    Singleton,
    /// Unassigned vertices are left out of the result.
    Drop,
}

/// Parameters of one partitioning call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluidConfig {
    /// Fraction of the maximum degree a vertex must exceed to seed a community.
    pub alpha: f64,
    /// BFS radius around a core vertex in which no other core may be chosen.
    pub seed_depth: usize,
    /// Multiplier of the edge-weight bonus added to sampled communities.
    pub weight_update: f64,
    /// Round ceiling for the propagation engine.
    pub max_rounds: usize,
    pub decrement_order: DecrementOrder,
    pub unassigned_policy: UnassignedPolicy,
}

impl Default for FluidConfig {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            seed_depth: DEFAULT_SEED_DEPTH,
            weight_update: DEFAULT_WEIGHT_UPDATE,
            max_rounds: DEFAULT_MAX_ROUNDS,
            decrement_order: DecrementOrder::default(),
            unassigned_policy: UnassignedPolicy::default(),
        }
    }
}

impl FluidConfig {
    /// Create a config with the given alpha and default values elsewhere.
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            ..Default::default()
        }
    }

    pub fn with_seed_depth(mut self, seed_depth: usize) -> Self {
        self.seed_depth = seed_depth;
        self
    }

    pub fn with_weight_update(mut self, weight_update: f64) -> Self {
        self.weight_update = weight_update;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_decrement_order(mut self, order: DecrementOrder) -> Self {
        self.decrement_order = order;
        self
    }

    pub fn with_unassigned_policy(mut self, policy: UnassignedPolicy) -> Self {
        self.unassigned_policy = policy;
        self
    }

    /// Check every parameter is inside its domain.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.alpha.is_finite() && self.alpha > 0.0 && self.alpha <= 1.0,
            "alpha must lie in (0, 1], got {}", self.alpha
        );
        ensure!(
            self.weight_update.is_finite() && self.weight_update >= 0.0,
            "weight_update must be a non-negative finite number, got {}", self.weight_update
        );
        ensure!(self.max_rounds > 0, "max_rounds must be at least 1");
        Ok(())
    }

    /// Parse and validate a config from YAML text. Missing keys take defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: FluidConfig = serde_yaml::from_str(text)
            .context("Failed to parse fluid community config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&text)
    }
}

#[cfg(test)]
mod test_config {
    use std::io::Write;

    use crate::config::{DecrementOrder, FluidConfig, UnassignedPolicy, DEFAULT_MAX_ROUNDS};

    #[test]
    fn test_defaults_are_valid() {
        let config = FluidConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.seed_depth, 1);
        assert_eq!(config.weight_update, 1.0);
        assert_eq!(config.max_rounds, DEFAULT_MAX_ROUNDS);
        assert_eq!(config.decrement_order, DecrementOrder::Reference);
        assert_eq!(config.unassigned_policy, UnassignedPolicy::Singleton);
    }

    #[test]
    fn test_reject_bad_alpha() {
        assert!(FluidConfig::new(0.0).validate().is_err());
        assert!(FluidConfig::new(1.5).validate().is_err());
        assert!(FluidConfig::new(f64::NAN).validate().is_err());
        assert!(FluidConfig::new(1.0).validate().is_ok());
    }

    #[test]
    fn test_reject_bad_rounds_and_update() {
        assert!(FluidConfig::new(0.5).with_max_rounds(0).validate().is_err());
        assert!(FluidConfig::new(0.5).with_weight_update(-1.0).validate().is_err());
    }

    #[test]
    fn test_parse_yaml() {
        let text = "alpha: 0.3\nmax_rounds: 20\ndecrement_order: corrected\nunassigned_policy: drop\n";
        let config = FluidConfig::from_yaml_str(text).unwrap();
        assert_eq!(config.alpha, 0.3);
        assert_eq!(config.max_rounds, 20);
        assert_eq!(config.seed_depth, 1);
        assert_eq!(config.decrement_order, DecrementOrder::Corrected);
        assert_eq!(config.unassigned_policy, UnassignedPolicy::Drop);
    }

    #[test]
    fn test_parse_yaml_rejects_invalid_values() {
        assert!(FluidConfig::from_yaml_str("alpha: 2.0\n").is_err());
        assert!(FluidConfig::from_yaml_str("alpha: [1, 2]\n").is_err());
    }

    #[test]
    fn test_load_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "alpha: 0.8").unwrap();
        writeln!(file, "seed_depth: 2").unwrap();
        let config = FluidConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.alpha, 0.8);
        assert_eq!(config.seed_depth, 2);

        assert!(FluidConfig::from_yaml_file("no/such/config.yaml").is_err());
    }
}
