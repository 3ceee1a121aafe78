//! Heuristic simulator trace parsing.
//!
//! The rival simulator writes a per-cycle JSON trace:
//!
//! ```json
//! {"cycles": [
//!   {"cycle": 3, "dispatched": {"0": {"rnd": 0}}},
//!   {"cycle": 5, "executed": [{"rnd": 0}, {"rnd": 1}]}
//! ]}
//! ```
//!
//! `rnd` is the loop iteration. Only iteration 0 is compared against the
//! optimal schedule: its length is the last cycle executing an iteration-0
//! uop minus the first cycle dispatching one (or the first executing one,
//! when the trace records no dispatches).

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

/// Errors reading a simulator trace.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("invalid trace JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("trace has no executed uop for the first iteration")]
    NoFirstIteration,
}

/// A rival simulator's cycle trace.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RivalTrace {
    #[serde(default)]
    pub cycles: Vec<CycleRecord>,
}

/// One cycle of the trace.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CycleRecord {
    pub cycle: u64,
    #[serde(default)]
    pub executed: Vec<UopEvent>,
    /// Keyed by port name.
    #[serde(default)]
    pub dispatched: BTreeMap<String, UopEvent>,
}

/// A uop event tagged with its loop iteration.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct UopEvent {
    pub rnd: u64,
}

impl RivalTrace {
    /// Parses a trace.
    pub fn from_json(json: &str) -> Result<Self, TraceError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Cycles taken by the first iteration.
    pub fn first_iteration_cycles(&self) -> Result<u64, TraceError> {
        let executed = self
            .cycles
            .iter()
            .filter(|c| c.executed.iter().any(|e| e.rnd == 0))
            .map(|c| c.cycle);
        let last = executed.clone().max().ok_or(TraceError::NoFirstIteration)?;

        let first = self
            .cycles
            .iter()
            .filter(|c| c.dispatched.values().any(|e| e.rnd == 0))
            .map(|c| c.cycle)
            .min()
            .or_else(|| executed.min())
            .ok_or(TraceError::NoFirstIteration)?;

        Ok(last.saturating_sub(first))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_iteration_with_dispatch() {
        let trace = RivalTrace::from_json(
            r#"{"cycles": [
                {"cycle": 1},
                {"cycle": 2, "dispatched": {"0": {"rnd": 0}, "1": {"rnd": 1}}},
                {"cycle": 4, "executed": [{"rnd": 0}]},
                {"cycle": 7, "executed": [{"rnd": 0}, {"rnd": 1}]},
                {"cycle": 9, "executed": [{"rnd": 1}]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(trace.first_iteration_cycles().unwrap(), 5);
    }

    #[test]
    fn test_first_iteration_without_dispatch() {
        let trace = RivalTrace::from_json(
            r#"{"cycles": [
                {"cycle": 3, "executed": [{"rnd": 0}]},
                {"cycle": 6, "executed": [{"rnd": 0}]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(trace.first_iteration_cycles().unwrap(), 3);
    }

    #[test]
    fn test_later_iteration_dispatch_ignored() {
        let trace = RivalTrace::from_json(
            r#"{"cycles": [
                {"cycle": 0, "dispatched": {"5": {"rnd": 2}}},
                {"cycle": 2, "executed": [{"rnd": 0}]},
                {"cycle": 4, "executed": [{"rnd": 0}]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(trace.first_iteration_cycles().unwrap(), 2);
    }

    #[test]
    fn test_no_first_iteration() {
        let trace = RivalTrace::from_json(r#"{"cycles": [{"cycle": 1}]}"#).unwrap();
        assert!(matches!(
            trace.first_iteration_cycles(),
            Err(TraceError::NoFirstIteration)
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            RivalTrace::from_json("{not json"),
            Err(TraceError::Json(_))
        ));
    }
}
