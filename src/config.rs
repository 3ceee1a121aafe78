//! Engine configuration.
//!
//! [`SolverConfig`] controls a single solve; [`EngineConfig`] groups it
//! with rendering defaults and can be loaded from TOML:
//!
//! ```toml
//! [solver]
//! time_limit_secs = 30.0
//! horizon = "list_schedule"
//!
//! [render]
//! cycles = 10
//! ports = [0, 1, 2, 3, 4, 5]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::models::Port;

/// How the planning horizon (and with it the big-M constant) is derived.
///
/// Either choice bounds every feasible finish time of an optimal schedule,
/// so neither can cut off the optimum; the list-schedule horizon is
/// tighter and gives the solver a stronger relaxation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizonPolicy {
    /// Makespan of the greedy list schedule.
    #[default]
    ListSchedule,
    /// Sum of all uop latencies.
    TotalLatency,
}

/// Settings for one optimal solve.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Wall-clock budget for the MILP solver, in seconds. `None` = unbounded.
    pub time_limit_secs: Option<f64>,
    /// Horizon / big-M derivation.
    pub horizon: HorizonPolicy,
}

impl SolverConfig {
    /// Creates a config with no time limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the solver time budget.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_secs = Some(limit.as_secs_f64());
        self
    }

    /// Sets the horizon policy.
    pub fn with_horizon(mut self, horizon: HorizonPolicy) -> Self {
        self.horizon = horizon;
        self
    }

    /// The time budget as a duration.
    ///
    /// # Errors
    /// [`ConfigError::InvalidTimeLimit`] for a negative, NaN, or
    /// unrepresentably large number of seconds.
    pub fn time_limit(&self) -> Result<Option<Duration>, ConfigError> {
        self.time_limit_secs
            .map(|secs| {
                Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidTimeLimit(secs))
            })
            .transpose()
    }
}

/// Defaults for the ASCII occupancy renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Number of cycles shown, starting at cycle 0.
    pub cycles: u32,
    /// Ports shown, one row each.
    pub ports: Vec<Port>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cycles: 10,
            ports: Port::range(6),
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub solver: SolverConfig,
    pub render: RenderConfig,
}

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid time limit: {0} seconds")]
    InvalidTimeLimit(f64),
}

impl EngineConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.solver.time_limit()?;
        Ok(config)
    }

    /// Loads a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.solver.time_limit().unwrap(), None);
        assert_eq!(config.solver.horizon, HorizonPolicy::ListSchedule);
        assert_eq!(config.render.cycles, 10);
        assert_eq!(config.render.ports.len(), 6);
    }

    #[test]
    fn test_from_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            [solver]
            time_limit_secs = 2.5
            horizon = "total_latency"

            [render]
            cycles = 4
            ports = [0, "1"]
            "#,
        )
        .unwrap();
        assert_eq!(
            config.solver.time_limit().unwrap(),
            Some(Duration::from_millis(2500))
        );
        assert_eq!(config.solver.horizon, HorizonPolicy::TotalLatency);
        assert_eq!(config.render.cycles, 4);
        assert_eq!(config.render.ports, vec![Port(0), Port(1)]);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str("[solver]\ntime_limit_secs = 1.0\n").unwrap();
        assert_eq!(config.render, RenderConfig::default());
        assert_eq!(config.solver.horizon, HorizonPolicy::ListSchedule);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(EngineConfig::from_toml_str("[solver]\nhorizon = \"bogus\"\n").is_err());
    }

    #[test]
    fn test_builder() {
        let config = SolverConfig::new()
            .with_time_limit(Duration::from_secs(3))
            .with_horizon(HorizonPolicy::TotalLatency);
        assert_eq!(config.time_limit().unwrap(), Some(Duration::from_secs(3)));
        assert_eq!(config.horizon, HorizonPolicy::TotalLatency);
    }

    #[test]
    fn test_out_of_range_time_limit() {
        let err = EngineConfig::from_toml_str("[solver]\ntime_limit_secs = 1e30\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeLimit(_)));

        let config = SolverConfig {
            time_limit_secs: Some(-1.0),
            ..SolverConfig::default()
        };
        assert!(matches!(
            config.time_limit(),
            Err(ConfigError::InvalidTimeLimit(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load("/nonexistent/uop-sched.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
