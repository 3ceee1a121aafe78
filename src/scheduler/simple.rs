//! Greedy list scheduler.
//!
//! # Algorithm
//!
//! 1. Visit uops in topological order (issue order when dependencies only
//!    point backwards).
//! 2. A uop is ready once every producer has finished.
//! 3. Dispatch it to the eligible port that frees up first (lowest port id
//!    on ties), no earlier than its ready cycle.
//!
//! Every uop starts no later than the latest finish of the uops placed
//! before it, so the makespan never exceeds the sum of all latencies.
//! The optimal engine uses this makespan as its planning horizon and as a
//! fallback incumbent.
//!
//! # Complexity
//! O(n * p + e) where n=uops, p=eligible ports per uop, e=dependency edges.
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 4: Priority Dispatching

use std::collections::BTreeMap;

use crate::error::ScheduleError;
use crate::models::{Port, Schedule, ScheduledUop, UopBlock};
use crate::validation::{ensure_valid, ValidationError, ValidationErrorKind};

/// Greedy earliest-available-port scheduler.
///
/// # Example
///
/// ```
/// use uop_schedule::models::{Uop, UopBlock};
/// use uop_schedule::scheduler::ListScheduler;
///
/// let block = UopBlock::new()
///     .with_uop(Uop::new(0, 3).with_port(0))
///     .with_uop(Uop::new(1, 2).with_dependency(0).with_ports([0, 1]));
///
/// let schedule = ListScheduler::new().schedule(&block).unwrap();
/// assert_eq!(schedule.makespan(), 5);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ListScheduler;

impl ListScheduler {
    /// Creates a new scheduler.
    pub fn new() -> Self {
        Self
    }

    /// Schedules a block.
    ///
    /// The block is validated first; malformed input is rejected rather
    /// than partially scheduled.
    pub fn schedule(&self, block: &UopBlock) -> Result<Schedule, ScheduleError> {
        ensure_valid(block)?;
        let order = block.topological_order().ok_or_else(|| {
            ScheduleError::Validation(vec![ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                0,
                "dependency graph is not a DAG",
            )])
        })?;

        let uops = block.uops();
        let mut port_free: BTreeMap<Port, u32> = BTreeMap::new();
        let mut entries: Vec<Option<ScheduledUop>> = vec![None; uops.len()];

        for id in order {
            let uop = &uops[id];
            let ready = uop
                .dependencies
                .iter()
                .filter_map(|&d| entries[d].map(|e| e.finish_cycle()))
                .max()
                .unwrap_or(0);

            // Select the port with the earliest feasible start
            let mut best: Option<(Port, u32)> = None;
            for &port in &uop.eligible_ports {
                let start = port_free.get(&port).copied().unwrap_or(0).max(ready);
                if best.map_or(true, |(_, s)| start < s) {
                    best = Some((port, start));
                }
            }

            if let Some((port, start)) = best {
                let entry = ScheduledUop::new(id, port, uop.latency, start);
                port_free.insert(port, entry.finish_cycle());
                entries[id] = Some(entry);
            }
        }

        let mut schedule = Schedule::new();
        for (id, entry) in entries.into_iter().enumerate() {
            let entry = entry.ok_or_else(|| ScheduleError::Extraction {
                uop: id,
                reason: "uop was never dispatched".into(),
            })?;
            schedule.add(entry);
        }
        Ok(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Uop;
    use crate::verify::verify_schedule;

    #[test]
    fn test_single_port_serializes() {
        let block = UopBlock::new()
            .with_uop(Uop::new(0, 1).with_port(0))
            .with_uop(Uop::new(0, 1).with_port(0))
            .with_uop(Uop::new(0, 1).with_port(0));
        let schedule = ListScheduler::new().schedule(&block).unwrap();

        let starts: Vec<u32> = schedule.entries.iter().map(|e| e.start_cycle).collect();
        assert_eq!(starts, vec![0, 1, 2]);
        assert_eq!(schedule.makespan(), 3);
    }

    #[test]
    fn test_parallel_ports() {
        let block = UopBlock::new()
            .with_uop(Uop::new(0, 2).with_port(0))
            .with_uop(Uop::new(0, 2).with_port(1));
        let schedule = ListScheduler::new().schedule(&block).unwrap();
        assert_eq!(schedule.makespan(), 2);
        assert_eq!(schedule.entries[1].start_cycle, 0);
    }

    #[test]
    fn test_picks_free_port() {
        let block = UopBlock::new()
            .with_uop(Uop::new(0, 4).with_ports([0, 1]))
            .with_uop(Uop::new(0, 1).with_ports([0, 1]));
        let schedule = ListScheduler::new().schedule(&block).unwrap();
        assert_eq!(schedule.entries[0].port, Port(0));
        assert_eq!(schedule.entries[1].port, Port(1));
        assert_eq!(schedule.entries[1].start_cycle, 0);
    }

    #[test]
    fn test_respects_dependencies() {
        let block = UopBlock::new()
            .with_uop(Uop::new(0, 3).with_port(0))
            .with_uop(Uop::new(0, 2).with_dependency(0).with_port(1));
        let schedule = ListScheduler::new().schedule(&block).unwrap();
        assert_eq!(schedule.entries[1].start_cycle, 3);
        assert!(verify_schedule(&block, &schedule).is_ok());
    }

    #[test]
    fn test_makespan_within_total_latency() {
        let block = UopBlock::new()
            .with_uop(Uop::new(0, 2).with_ports([0, 1]))
            .with_uop(Uop::new(0, 3).with_dependency(0).with_port(1))
            .with_uop(Uop::new(0, 1).with_port(1))
            .with_uop(Uop::new(0, 4).with_dependency(2).with_ports([0, 5]));
        let schedule = ListScheduler::new().schedule(&block).unwrap();
        assert!(u64::from(schedule.makespan()) <= block.total_latency());
        assert!(verify_schedule(&block, &schedule).is_ok());
    }

    #[test]
    fn test_rejects_invalid_block() {
        let block = UopBlock::new().with_uop(Uop::new(0, 1));
        let err = ListScheduler::new().schedule(&block).unwrap_err();
        assert!(matches!(err, ScheduleError::Validation(_)));
    }

    #[test]
    fn test_rejects_latency_overflow() {
        let half = u32::MAX / 2 + 1;
        let block = UopBlock::new()
            .with_uop(Uop::new(0, half).with_port(0))
            .with_uop(Uop::new(0, half).with_port(0));
        let err = ListScheduler::new().schedule(&block).unwrap_err();
        assert!(matches!(err, ScheduleError::Validation(ref v)
            if v[0].kind == ValidationErrorKind::LatencyOverflow));
    }

    #[test]
    fn test_max_total_latency_fits() {
        let block = UopBlock::new()
            .with_uop(Uop::new(0, u32::MAX - 1).with_port(0))
            .with_uop(Uop::new(0, 1).with_port(0));
        let schedule = ListScheduler::new().schedule(&block).unwrap();
        assert_eq!(schedule.makespan(), u32::MAX);
    }

    #[test]
    fn test_empty_block() {
        let schedule = ListScheduler::new().schedule(&UopBlock::new()).unwrap();
        assert!(schedule.is_empty());
        assert_eq!(schedule.makespan(), 0);
    }
}
