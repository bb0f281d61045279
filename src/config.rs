//! Planner configuration.
//!
//! Configuration can be built in code or loaded from TOML:
//!
//! ```
//! use rideplan::{ExpansionMode, PlannerConfig};
//! use std::time::Duration;
//!
//! let config = PlannerConfig::from_toml_str(r#"
//!     plans_to_find = 5
//!     output_sample = 2
//!     time_limit_ms = 1500
//!     random_seed = 42
//!     deduplicate_states = true
//!
//!     [expansion]
//!     sample = 4
//! "#).unwrap();
//!
//! assert_eq!(config.plans_to_find, 5);
//! assert_eq!(config.expansion, ExpansionMode::Sample(4));
//! assert_eq!(config.time_limit(), Some(Duration::from_millis(1500)));
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{PlanError, Result};

/// Number of successors drawn per expansion in the default sampling mode.
pub const DEFAULT_EXPANSION_SAMPLE: usize = 8;

/// How a popped state is expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionMode {
    /// Push the successor of every applicable action.
    Exhaustive,
    /// Draw this many applicable actions uniformly, with replacement, and
    /// push only their successors.
    Sample(usize),
}

impl Default for ExpansionMode {
    fn default() -> Self {
        ExpansionMode::Sample(DEFAULT_EXPANSION_SAMPLE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Goal states to collect before stopping.
    pub plans_to_find: usize,

    pub expansion: ExpansionMode,

    /// Down-sample the collected plans to this many (with replacement).
    pub output_sample: Option<usize>,

    /// Cap on pop/expand cycles.
    pub max_iterations: Option<u64>,

    /// Wall-clock limit for a single run.
    pub time_limit_ms: Option<u64>,

    /// Seed for sampling; `None` seeds from the OS.
    pub random_seed: Option<u64>,

    /// Skip states whose facts and metrics were already expanded.
    pub deduplicate_states: bool,

    /// Ground schemas on the rayon thread pool.
    pub parallel_grounding: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            plans_to_find: 1,
            expansion: ExpansionMode::default(),
            output_sample: None,
            max_iterations: None,
            time_limit_ms: None,
            random_seed: None,
            deduplicate_states: false,
            parallel_grounding: false,
        }
    }
}

impl PlannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file can't be read, contains invalid TOML, or
    /// fails [`PlannerConfig::validate`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let ExpansionMode::Sample(0) = self.expansion {
            return Err(PlanError::InvalidConfig(
                "expansion sample size must be at least 1".to_string(),
            ));
        }
        if self.output_sample == Some(0) {
            return Err(PlanError::InvalidConfig(
                "output_sample must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    pub fn with_plans_to_find(mut self, plans: usize) -> Self {
        self.plans_to_find = plans;
        self
    }

    pub fn with_expansion(mut self, expansion: ExpansionMode) -> Self {
        self.expansion = expansion;
        self
    }

    pub fn with_output_sample(mut self, sample: usize) -> Self {
        self.output_sample = Some(sample);
        self
    }

    pub fn with_max_iterations(mut self, iterations: u64) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = Some(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_deduplication(mut self, enabled: bool) -> Self {
        self.deduplicate_states = enabled;
        self
    }

    pub fn with_parallel_grounding(mut self, enabled: bool) -> Self {
        self.parallel_grounding = enabled;
        self
    }
}
