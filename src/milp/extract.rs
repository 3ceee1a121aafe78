//! Schedule extraction from solved variable values.
//!
//! Turns the raw `start` / `use_port` values into a [`Schedule`] and then
//! re-verifies it independently. Inconsistent solver output (no port or
//! several ports selected, fractional start cycles) is reported, never
//! rounded into something plausible.

use tracing::trace;

use super::SolvedValues;
use crate::error::ScheduleError;
use crate::models::{Port, Schedule, ScheduledUop, UopBlock};
use crate::verify::verify_schedule;

/// Tolerance for treating a solver value as integral.
const INTEGRALITY_TOLERANCE: f64 = 1e-6;

/// Threshold above which a binary variable counts as set.
const BINARY_THRESHOLD: f64 = 0.5;

/// Builds and verifies a schedule from solved values.
///
/// # Errors
/// - [`ScheduleError::Extraction`] if a uop has zero or several selected
///   ports, a selected port it is not eligible for, or a start value that
///   is negative, non-integral, or missing.
/// - [`ScheduleError::Verification`] if the resulting schedule breaks
///   precedence, eligibility, or port exclusivity.
pub fn extract_schedule(block: &UopBlock, values: &SolvedValues) -> Result<Schedule, ScheduleError> {
    let mut schedule = Schedule::new();

    for uop in block.uops() {
        let start = values
            .starts
            .get(uop.id)
            .copied()
            .ok_or_else(|| extraction_error(uop.id, "no start value"))?;
        let start_cycle = to_cycle(uop.id, start)?;

        let ports = values
            .ports
            .get(uop.id)
            .ok_or_else(|| extraction_error(uop.id, "no port values"))?;
        let selected: Vec<Port> = ports
            .iter()
            .filter(|(_, &v)| v > BINARY_THRESHOLD)
            .map(|(&p, _)| p)
            .collect();

        let port = match selected.as_slice() {
            [port] => *port,
            [] => return Err(extraction_error(uop.id, "no port selected")),
            many => {
                return Err(extraction_error(
                    uop.id,
                    format!("{} ports selected: {:?}", many.len(), many),
                ))
            }
        };
        if !uop.is_eligible(port) {
            return Err(extraction_error(
                uop.id,
                format!("selected port {port} is not eligible"),
            ));
        }

        trace!(uop = uop.id, %port, start_cycle, "extracted");
        schedule.add(ScheduledUop::new(uop.id, port, uop.latency, start_cycle));
    }

    verify_schedule(block, &schedule).map_err(ScheduleError::Verification)?;
    Ok(schedule)
}

fn to_cycle(uop: usize, value: f64) -> Result<u32, ScheduleError> {
    let rounded = value.round();
    if !value.is_finite() || (value - rounded).abs() > INTEGRALITY_TOLERANCE {
        return Err(extraction_error(uop, format!("start {value} is not integral")));
    }
    if rounded < 0.0 || rounded > f64::from(u32::MAX) {
        return Err(extraction_error(uop, format!("start {value} out of range")));
    }
    Ok(rounded as u32)
}

fn extraction_error(uop: usize, reason: impl Into<String>) -> ScheduleError {
    ScheduleError::Extraction {
        uop,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Uop;
    use std::collections::BTreeMap;

    fn chain_block() -> UopBlock {
        UopBlock::new()
            .with_uop(Uop::new(0, 3).with_port(0))
            .with_uop(Uop::new(0, 2).with_dependency(0).with_ports([0, 1]))
    }

    fn values(starts: &[f64], ports: &[&[(u8, f64)]]) -> SolvedValues {
        SolvedValues {
            starts: starts.to_vec(),
            ports: ports
                .iter()
                .map(|ps| ps.iter().map(|&(p, v)| (Port(p), v)).collect::<BTreeMap<_, _>>())
                .collect(),
            makespan: 0.0,
        }
    }

    #[test]
    fn test_extract_valid() {
        let v = values(&[0.0, 3.0000001], &[&[(0, 1.0)], &[(0, 0.0), (1, 0.9999999)]]);
        let s = extract_schedule(&chain_block(), &v).unwrap();
        assert_eq!(s.entries[1].port, Port(1));
        assert_eq!(s.entries[1].start_cycle, 3);
        assert_eq!(s.makespan(), 5);
    }

    #[test]
    fn test_no_port_selected() {
        let v = values(&[0.0, 3.0], &[&[(0, 1.0)], &[(0, 0.0), (1, 0.0)]]);
        let err = extract_schedule(&chain_block(), &v).unwrap_err();
        assert!(matches!(err, ScheduleError::Extraction { uop: 1, .. }));
    }

    #[test]
    fn test_multiple_ports_selected() {
        let v = values(&[0.0, 3.0], &[&[(0, 1.0)], &[(0, 1.0), (1, 1.0)]]);
        let err = extract_schedule(&chain_block(), &v).unwrap_err();
        assert!(matches!(err, ScheduleError::Extraction { uop: 1, .. }));
    }

    #[test]
    fn test_fractional_start() {
        let v = values(&[0.0, 3.5], &[&[(0, 1.0)], &[(1, 1.0)]]);
        let err = extract_schedule(&chain_block(), &v).unwrap_err();
        assert!(matches!(err, ScheduleError::Extraction { uop: 1, .. }));
    }

    #[test]
    fn test_negative_start() {
        let v = values(&[-1.0, 3.0], &[&[(0, 1.0)], &[(1, 1.0)]]);
        let err = extract_schedule(&chain_block(), &v).unwrap_err();
        assert!(matches!(err, ScheduleError::Extraction { uop: 0, .. }));
    }

    #[test]
    fn test_missing_values() {
        let v = values(&[0.0], &[&[(0, 1.0)]]);
        let err = extract_schedule(&chain_block(), &v).unwrap_err();
        assert!(matches!(err, ScheduleError::Extraction { uop: 1, .. }));
    }

    #[test]
    fn test_verification_catches_precedence() {
        // Uop 1 starts before its producer finishes
        let v = values(&[0.0, 2.0], &[&[(0, 1.0)], &[(1, 1.0)]]);
        let err = extract_schedule(&chain_block(), &v).unwrap_err();
        assert!(matches!(err, ScheduleError::Verification(_)));
    }

    #[test]
    fn test_verification_catches_overlap() {
        let v = values(&[0.0, 3.0], &[&[(0, 1.0)], &[(0, 1.0)]]);
        assert!(extract_schedule(&chain_block(), &v).is_ok());

        let block = UopBlock::new()
            .with_uop(Uop::new(0, 3).with_port(0))
            .with_uop(Uop::new(0, 2).with_port(0));
        let v = values(&[0.0, 1.0], &[&[(0, 1.0)], &[(0, 1.0)]]);
        let err = extract_schedule(&block, &v).unwrap_err();
        assert!(matches!(err, ScheduleError::Verification(_)));
    }
}
