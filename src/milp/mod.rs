//! MILP-based optimal scheduling.
//!
//! Builds a mixed-integer program from a uop block, solves it with HiGHS,
//! and extracts a verified schedule.
//!
//! # Pipeline
//!
//! 1. Validate the block.
//! 2. Compute lower bounds and a greedy list schedule; its makespan is the
//!    planning horizon and big-M constant.
//! 3. Build the model ([`UopModelBuilder`]).
//! 4. Solve ([`optimize`]).
//! 5. Extract and re-verify ([`extract_schedule`]).
//!
//! A solve that hits its time budget is still a success with status
//! [`SolveStatus::TimeLimit`]. If the solver has no incumbent at that
//! point, or its incumbent is worse than the greedy schedule, the greedy
//! schedule is returned instead. An incumbent that fails extraction is an
//! error, as for an optimal solution.
//!
//! # Reference
//! - Pinedo (2016), "Scheduling", Ch. 5: Parallel Machine Models (unrelated machines)
//! - Wolsey (1998), "Integer Programming", Ch. 1.5 (big-M formulations)

mod builder;
mod extract;
mod solver;

pub use builder::{PortConflict, UopModel, UopModelBuilder};
pub use extract::extract_schedule;
pub use solver::{optimize, SolveStatus, SolvedValues, SolverReport};

use serde::Serialize;
use tracing::{info, warn};

use crate::bounds::LowerBounds;
use crate::config::{HorizonPolicy, SolverConfig};
use crate::error::ScheduleError;
use crate::models::{Schedule, UopBlock};
use crate::scheduler::ListScheduler;
use crate::validation::ensure_valid;

/// Where the returned schedule came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleSource {
    /// Extracted from the MILP solution.
    Solver,
    /// The greedy list schedule, used when the solver stopped without a
    /// better incumbent.
    ListSchedule,
}

/// Result of an optimal solve.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleOutcome {
    /// `Optimal` or `TimeLimit`.
    pub status: SolveStatus,
    /// Verified schedule.
    pub schedule: Schedule,
    /// Makespan of `schedule`. Optimal when `status` is `Optimal`,
    /// best-found otherwise.
    pub makespan: u32,
    /// Critical-path bound.
    pub critical_path: u32,
    /// Single-port serialization bound.
    pub port_load: u32,
    /// Origin of `schedule`.
    pub source: ScheduleSource,
}

impl ScheduleOutcome {
    /// Whether the makespan is proven optimal.
    pub fn is_optimal(&self) -> bool {
        self.status.is_proven()
    }

    /// Best lower bound on the makespan.
    pub fn lower_bound(&self) -> u32 {
        self.critical_path.max(self.port_load)
    }
}

/// Optimal single-block scheduler.
///
/// Each call to [`solve`](Self::solve) builds, solves and discards its own
/// model; the scheduler holds configuration only and can be shared across
/// threads solving different blocks.
///
/// # Example
/// ```no_run
/// use uop_schedule::milp::OptimalScheduler;
/// use uop_schedule::models::{Uop, UopBlock};
///
/// let block = UopBlock::new()
///     .with_uop(Uop::new(0, 3).with_port(0))
///     .with_uop(Uop::new(1, 2).with_dependency(0).with_port(0));
///
/// let outcome = OptimalScheduler::default().solve(&block).unwrap();
/// assert_eq!(outcome.makespan, 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct OptimalScheduler {
    config: SolverConfig,
}

impl OptimalScheduler {
    /// Creates a scheduler with the given configuration.
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Computes an optimal (or time-limited best) schedule for a block.
    ///
    /// # Errors
    /// - [`ScheduleError::Validation`] for malformed blocks.
    /// - [`ScheduleError::Infeasible`] / [`ScheduleError::Solver`] for
    ///   solver failures.
    /// - [`ScheduleError::Extraction`] / [`ScheduleError::Verification`]
    ///   if solver values, optimal or time-limited, cannot be turned into a
    ///   valid schedule.
    /// - [`ScheduleError::Config`] for an unusable time limit.
    pub fn solve(&self, block: &UopBlock) -> Result<ScheduleOutcome, ScheduleError> {
        ensure_valid(block)?;

        let bounds = LowerBounds::compute(block);
        let greedy = ListScheduler::new().schedule(block)?;

        if block.is_empty() {
            return Ok(outcome(SolveStatus::Optimal, greedy, bounds, ScheduleSource::ListSchedule));
        }

        let horizon = match self.config.horizon {
            HorizonPolicy::ListSchedule => greedy.makespan(),
            HorizonPolicy::TotalLatency => {
                u32::try_from(block.total_latency()).unwrap_or(u32::MAX)
            }
        };

        let model = UopModelBuilder::new(block)
            .with_horizon(horizon)
            .with_lower_bound(bounds.best())
            .build()?;
        info!(
            uops = block.len(),
            conflicts = model.conflict_count(),
            horizon,
            lower_bound = bounds.best(),
            "solving block"
        );

        let report = optimize(model, &self.config)?;
        settle(block, report, greedy, bounds)
    }
}

/// Turns a solver report into an outcome.
///
/// Solver values must always extract into a verified schedule; failure to
/// do so is an error whatever the status. A time-limited incumbent longer
/// than the list schedule is replaced by it, and so is a missing one.
fn settle(
    block: &UopBlock,
    report: SolverReport,
    greedy: Schedule,
    bounds: LowerBounds,
) -> Result<ScheduleOutcome, ScheduleError> {
    let status = report.status;
    let Some(values) = report.values else {
        if status.is_proven() {
            return Err(ScheduleError::Solver(
                "optimal status without solution values".to_string(),
            ));
        }
        warn!(list = greedy.makespan(), "no solver incumbent, keeping list schedule");
        return Ok(outcome(status, greedy, bounds, ScheduleSource::ListSchedule));
    };

    let schedule = extract_schedule(block, &values)?;
    if status.is_proven() || schedule.makespan() <= greedy.makespan() {
        return Ok(outcome(status, schedule, bounds, ScheduleSource::Solver));
    }

    warn!(
        solver = schedule.makespan(),
        list = greedy.makespan(),
        "solver incumbent worse than list schedule"
    );
    Ok(outcome(status, greedy, bounds, ScheduleSource::ListSchedule))
}

fn outcome(
    status: SolveStatus,
    schedule: Schedule,
    bounds: LowerBounds,
    source: ScheduleSource,
) -> ScheduleOutcome {
    ScheduleOutcome {
        status,
        makespan: schedule.makespan(),
        schedule,
        critical_path: bounds.critical_path,
        port_load: bounds.port_load,
        source,
    }
}
