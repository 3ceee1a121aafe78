//! Independent schedule verification.
//!
//! Re-checks a schedule against its block without trusting whoever
//! produced it (the MILP solver, the list scheduler, or a file on disk):
//!
//! 1. Precedence: `start(u) >= start(d) + latency(d)` for every dependency.
//! 2. Eligibility: each uop runs on one of its eligible ports.
//! 3. Exclusivity: uops sharing a port never overlap in time.
//!
//! Entries must line up with uop ids one-to-one.

use crate::models::{Schedule, UopBlock, Violation};

/// Checks invariants 1–3 of a schedule.
///
/// # Returns
/// `Ok(())` if the schedule is feasible, `Err(violations)` listing every
/// broken invariant otherwise.
pub fn verify_schedule(block: &UopBlock, schedule: &Schedule) -> Result<(), Vec<Violation>> {
    let mut violations = Vec::new();

    if schedule.len() != block.len() {
        violations.push(Violation::missing_uop(
            schedule.len().min(block.len()),
            format!(
                "schedule has {} entries for {} uops",
                schedule.len(),
                block.len()
            ),
        ));
        return Err(violations);
    }

    for (uop, entry) in block.uops().iter().zip(&schedule.entries) {
        if entry.id != uop.id || entry.latency != uop.latency {
            violations.push(Violation::missing_uop(
                uop.id,
                format!(
                    "entry (id {}, latency {}) does not match uop latency {}",
                    entry.id, entry.latency, uop.latency
                ),
            ));
            continue;
        }

        if !uop.is_eligible(entry.port) {
            violations.push(Violation::ineligible_port(
                uop.id,
                format!("assigned port {} is not eligible", entry.port),
            ));
        }

        for &dep in &uop.dependencies {
            let Some(producer) = schedule.entries.get(dep) else {
                continue;
            };
            if entry.start_cycle < producer.finish_cycle() {
                violations.push(Violation::precedence(
                    uop.id,
                    format!(
                        "starts at {} before producer {} finishes at {}",
                        entry.start_cycle,
                        dep,
                        producer.finish_cycle()
                    ),
                ));
            }
        }
    }

    let entries = &schedule.entries;
    for i in 0..entries.len() {
        for j in (i + 1)..entries.len() {
            let (a, b) = (&entries[i], &entries[j]);
            if a.port == b.port && a.overlaps(b) {
                violations.push(Violation::port_conflict(
                    a.id,
                    format!(
                        "overlaps uop {} on port {}: [{}, {}) and [{}, {})",
                        b.id,
                        a.port,
                        a.start_cycle,
                        a.finish_cycle(),
                        b.start_cycle,
                        b.finish_cycle()
                    ),
                ));
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
