//! Schedule quality metrics (KPIs).
//!
//! Computes performance indicators from a completed schedule and its block.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan (C_max) | Latest finish cycle |
//! | Critical path | Longest latency-weighted dependency chain |
//! | Port load | Largest latency total pinned to one port |
//! | Port utilization | Busy cycles / makespan, per port |
//! | Avg utilization | Mean over used ports |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use std::collections::BTreeMap;

use serde::Serialize;

use crate::bounds::LowerBounds;
use crate::models::{Port, Schedule, UopBlock};

/// Schedule performance indicators. All times are in cycles.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleKpi {
    /// Latest finish cycle.
    pub makespan: u32,
    /// Critical-path lower bound.
    pub critical_path: u32,
    /// Port-load lower bound.
    pub port_load: u32,
    /// Average port utilization over ports with work (0.0..1.0).
    pub avg_utilization: f64,
    /// Per-port utilization.
    pub utilization_by_port: BTreeMap<Port, f64>,
}

impl ScheduleKpi {
    /// Computes KPIs from a schedule and its block.
    pub fn calculate(schedule: &Schedule, block: &UopBlock) -> Self {
        let bounds = LowerBounds::compute(block);
        let utilization_by_port = schedule.port_utilizations();
        let avg_utilization = if utilization_by_port.is_empty() {
            0.0
        } else {
            let sum: f64 = utilization_by_port.values().sum();
            sum / utilization_by_port.len() as f64
        };

        Self {
            makespan: schedule.makespan(),
            critical_path: bounds.critical_path,
            port_load: bounds.port_load,
            avg_utilization,
            utilization_by_port,
        }
    }

    /// Best lower bound.
    pub fn lower_bound(&self) -> u32 {
        self.critical_path.max(self.port_load)
    }

    /// Whether the makespan meets a lower bound, which proves it optimal
    /// without a solver.
    pub fn meets_lower_bound(&self) -> bool {
        self.makespan == self.lower_bound()
    }

    /// Cycles between the makespan and the best lower bound.
    pub fn bound_gap(&self) -> u32 {
        self.makespan.saturating_sub(self.lower_bound())
    }
}
