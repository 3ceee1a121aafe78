//! Schedule (solution) model.
//!
//! A schedule assigns every uop of a block to one port and a dispatch
//! cycle. Occupancy is fully determined by `(port, start_cycle, latency)`:
//! a uop holds its port during `[start_cycle, start_cycle + latency)`.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Port;

/// A complete schedule for one basic block.
///
/// Entries are kept in uop id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    /// One entry per uop.
    pub entries: Vec<ScheduledUop>,
}

/// A uop-port-cycle assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledUop {
    /// Scheduled uop id. Absent in files written by older tooling, where
    /// the position in the array is the id.
    #[serde(default)]
    pub id: usize,
    /// Assigned port.
    pub port: Port,
    /// Latency, copied from the uop.
    pub latency: u32,
    /// Dispatch cycle.
    pub start_cycle: u32,
}

/// A broken schedule invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Offending uop id.
    pub uop: usize,
    /// Human-readable description.
    pub message: String,
}

/// Classification of schedule violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// A uop starts before one of its producers has finished.
    PrecedenceViolation,
    /// A uop is assigned a port it cannot run on.
    IneligiblePort,
    /// Two uops overlap on the same port.
    PortConflict,
    /// The schedule has no entry (or a mismatched entry) for a uop.
    MissingUop,
}

impl ScheduledUop {
    /// Creates a schedule entry.
    pub fn new(id: usize, port: Port, latency: u32, start_cycle: u32) -> Self {
        Self {
            id,
            port,
            latency,
            start_cycle,
        }
    }

    /// Exclusive end of the occupied interval, saturating at `u32::MAX`.
    #[inline]
    pub fn finish_cycle(&self) -> u32 {
        self.start_cycle.saturating_add(self.latency)
    }

    /// Whether this uop holds its port during `cycle`.
    #[inline]
    pub fn occupies(&self, cycle: u32) -> bool {
        self.start_cycle <= cycle && cycle < self.finish_cycle()
    }

    /// Whether the occupied intervals of two entries intersect.
    ///
    /// Zero-latency entries occupy nothing and never overlap.
    #[inline]
    pub fn overlaps(&self, other: &ScheduledUop) -> bool {
        self.start_cycle < other.finish_cycle() && other.start_cycle < self.finish_cycle()
    }
}

impl Violation {
    /// Creates a precedence violation.
    pub fn precedence(uop: usize, message: impl Into<String>) -> Self {
        Self::new(ViolationType::PrecedenceViolation, uop, message)
    }

    /// Creates an ineligible-port violation.
    pub fn ineligible_port(uop: usize, message: impl Into<String>) -> Self {
        Self::new(ViolationType::IneligiblePort, uop, message)
    }

    /// Creates a port-conflict violation.
    pub fn port_conflict(uop: usize, message: impl Into<String>) -> Self {
        Self::new(ViolationType::PortConflict, uop, message)
    }

    /// Creates a missing-uop violation.
    pub fn missing_uop(uop: usize, message: impl Into<String>) -> Self {
        Self::new(ViolationType::MissingUop, uop, message)
    }

    fn new(violation_type: ViolationType, uop: usize, message: impl Into<String>) -> Self {
        Self {
            violation_type,
            uop,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} at uop {}: {}", self.violation_type, self.uop, self.message)
    }
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry.
    pub fn add(&mut self, entry: ScheduledUop) {
        self.entries.push(entry);
    }

    /// Parses a schedule from its JSON array form.
    ///
    /// Entries without an explicit id take their array position.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let mut schedule = Self::new();
        for (position, value) in raw.into_iter().enumerate() {
            let has_id = value.get("id").is_some();
            let mut entry: ScheduledUop = serde_json::from_value(value)?;
            if !has_id {
                entry.id = position;
            }
            schedule.add(entry);
        }
        Ok(schedule)
    }

    /// Serializes the schedule to its JSON array form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Makespan: latest finish cycle across all entries.
    pub fn makespan(&self) -> u32 {
        self.entries
            .iter()
            .map(ScheduledUop::finish_cycle)
            .max()
            .unwrap_or(0)
    }

    /// Finds the entry for a uop.
    pub fn entry_for_uop(&self, id: usize) -> Option<&ScheduledUop> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Returns all entries dispatched to a port.
    pub fn entries_for_port(&self, port: Port) -> Vec<&ScheduledUop> {
        self.entries.iter().filter(|e| e.port == port).collect()
    }

    /// Whether `port` is busy during `cycle`.
    pub fn is_port_busy(&self, port: Port, cycle: u32) -> bool {
        self.entries
            .iter()
            .any(|e| e.port == port && e.occupies(cycle))
    }

    /// Busy cycles per port that has at least one entry.
    pub fn busy_cycles_by_port(&self) -> BTreeMap<Port, u32> {
        let mut busy = BTreeMap::new();
        for e in &self.entries {
            *busy.entry(e.port).or_insert(0) += e.latency;
        }
        busy
    }

    /// Port utilization: busy cycles / makespan.
    ///
    /// Returns an empty map for a zero-length schedule.
    pub fn port_utilizations(&self) -> BTreeMap<Port, f64> {
        let horizon = self.makespan();
        if horizon == 0 {
            return BTreeMap::new();
        }
        self.busy_cycles_by_port()
            .into_iter()
            .map(|(port, busy)| (port, f64::from(busy) / f64::from(horizon)))
            .collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the schedule has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
