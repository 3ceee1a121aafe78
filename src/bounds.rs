//! Makespan lower bounds.
//!
//! Two classic relaxations, each dropping one side of the problem:
//!
//! | Bound | Ignores | Value |
//! |-------|---------|-------|
//! | Critical path | Port contention | Longest latency-weighted dependency chain |
//! | Port load | Dependencies | Max over ports of the latency pinned to that port |
//!
//! Both require a validated (acyclic, in-range) block. Sums saturate at
//! `u32::MAX`; validation rejects blocks whose total latency gets there.
//!
//! # Reference
//! Brucker (2007), "Scheduling Algorithms", Ch. 4 (lower bounds for C_max)

use std::collections::BTreeMap;

use crate::models::{Port, UopBlock};

/// Lower bounds for one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LowerBounds {
    /// Longest dependency chain, weighted by latency.
    pub critical_path: u32,
    /// Largest single-port serialization bound.
    pub port_load: u32,
}

impl LowerBounds {
    /// Computes both bounds.
    pub fn compute(block: &UopBlock) -> Self {
        Self {
            critical_path: critical_path(block),
            port_load: port_load(block).into_values().max().unwrap_or(0),
        }
    }

    /// The tightest of the bounds.
    #[inline]
    pub fn best(&self) -> u32 {
        self.critical_path.max(self.port_load)
    }
}

/// Earliest start of every uop when ports are unlimited.
///
/// `earliest_starts(block)[u]` is the length of the longest chain ending
/// just before `u`. Cyclic or malformed blocks yield all zeros.
pub fn earliest_starts(block: &UopBlock) -> Vec<u32> {
    let mut est = vec![0u32; block.len()];
    let Some(order) = block.topological_order() else {
        return est;
    };

    let uops = block.uops();
    for id in order {
        let ready = uops[id]
            .dependencies
            .iter()
            .map(|&d| est[d].saturating_add(uops[d].latency))
            .max()
            .unwrap_or(0);
        est[id] = ready;
    }
    est
}

/// Length of the longest latency-weighted dependency chain.
pub fn critical_path(block: &UopBlock) -> u32 {
    earliest_starts(block)
        .iter()
        .zip(block.uops())
        .map(|(&s, u)| s.saturating_add(u.latency))
        .max()
        .unwrap_or(0)
}

/// Total latency of uops pinned to a single port, per port.
///
/// A port runs one uop at a time, so the work that can only go to `p`
/// must be serialized there. With unit latencies this is the number of
/// uops eligible only for `p`.
pub fn port_load(block: &UopBlock) -> BTreeMap<Port, u32> {
    let mut load = BTreeMap::new();
    for uop in block.uops() {
        if let Some(port) = uop.pinned_port() {
            let total = load.entry(port).or_insert(0u32);
            *total = total.saturating_add(uop.latency);
        }
    }
    load
}
