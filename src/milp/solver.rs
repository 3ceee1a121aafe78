//! MILP optimizer driver.
//!
//! Hands a built [`UopModel`] to HiGHS through `good_lp`, minimizing the
//! makespan variable, and copies the raw variable values out so that
//! extraction never touches solver types.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use good_lp::solvers::highs::highs;
use good_lp::solvers::{SolutionStatus, WithTimeLimit};
use good_lp::{ResolutionError, Solution, SolverModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::UopModel;
use crate::config::SolverConfig;
use crate::error::ScheduleError;
use crate::models::Port;

/// Solver outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    /// Proven optimal.
    Optimal,
    /// Stopped by the time budget; the best schedule found is unproven.
    TimeLimit,
    /// The model has no feasible solution.
    Infeasible,
    /// The solver failed.
    Error,
}

impl SolveStatus {
    /// Whether the makespan is proven optimal.
    pub fn is_proven(self) -> bool {
        self == Self::Optimal
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Optimal => "OPTIMAL",
            Self::TimeLimit => "TIME_LIMIT",
            Self::Infeasible => "INFEASIBLE",
            Self::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Raw variable values read back from a solved model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolvedValues {
    /// `start(u)` per uop id.
    pub starts: Vec<f64>,
    /// `use_port(u, p)` per uop id.
    pub ports: Vec<BTreeMap<Port, f64>>,
    /// Value of the makespan variable.
    pub makespan: f64,
}

/// Message good_lp's HiGHS backend reports when the solver stopped before
/// finding any feasible point.
const NO_SOLUTION_FOUND: &str = "NoSolutionFound";

/// Result of one solver invocation.
#[derive(Debug, Clone)]
pub struct SolverReport {
    /// Optimal or time-limited; failures are returned as errors.
    pub status: SolveStatus,
    /// Variable values of the best solution found. `None` when the time
    /// budget ran out before the solver found any feasible point.
    pub values: Option<SolvedValues>,
    /// Wall-clock time spent in the solver.
    pub elapsed: Duration,
}

/// Solves a model, blocking until optimality, infeasibility, failure, or
/// the configured time budget.
///
/// Running out of time is not an error: the report carries
/// [`SolveStatus::TimeLimit`], with values only if an incumbent exists.
///
/// # Errors
/// - [`ScheduleError::Config`] for an unusable time limit.
/// - [`ScheduleError::Infeasible`] if the solver proves infeasibility.
/// - [`ScheduleError::Solver`] for any other solver failure.
pub fn optimize(model: UopModel<'_>, config: &SolverConfig) -> Result<SolverReport, ScheduleError> {
    let UopModel {
        vars,
        constraints,
        makespan,
        starts,
        port_vars,
        ..
    } = model;

    let time_limit = config.time_limit()?;
    let mut problem = vars.minimise(makespan).using(highs);
    if let Some(limit) = time_limit {
        problem = problem.with_time_limit(limit.as_secs_f64());
    }
    for c in constraints {
        problem.add_constraint(c);
    }

    let started = Instant::now();
    let result = problem.solve();
    let elapsed = started.elapsed();

    let solution = match result {
        Ok(solution) => solution,
        Err(ResolutionError::Infeasible) => {
            warn!(?elapsed, "scheduling model is infeasible");
            return Err(ScheduleError::Infeasible);
        }
        Err(e) if stopped_without_incumbent(&e, time_limit.is_some()) => {
            warn!(?elapsed, "time limit reached before any feasible solution");
            return Ok(SolverReport {
                status: SolveStatus::TimeLimit,
                values: None,
                elapsed,
            });
        }
        Err(e) => {
            warn!(?elapsed, error = %e, "solver failed");
            return Err(ScheduleError::Solver(e.to_string()));
        }
    };

    let status = match solution.status() {
        SolutionStatus::Optimal => SolveStatus::Optimal,
        // Time or gap limit: feasible at best, never proven.
        _ => SolveStatus::TimeLimit,
    };

    let values = SolvedValues {
        starts: starts.iter().map(|&v| solution.value(v)).collect(),
        ports: port_vars
            .iter()
            .map(|ports| {
                ports
                    .iter()
                    .map(|(&port, &v)| (port, solution.value(v)))
                    .collect()
            })
            .collect(),
        makespan: solution.value(makespan),
    };

    debug!(starts = ?values.starts, "raw solver values");
    info!(%status, makespan = values.makespan, ?elapsed, "solver finished");

    Ok(SolverReport {
        status,
        values: Some(values),
        elapsed,
    })
}

/// Whether a failed solve only means the time budget ran out with no
/// feasible point found yet.
fn stopped_without_incumbent(error: &ResolutionError, time_limited: bool) -> bool {
    let message = match error {
        ResolutionError::Other(message) => *message,
        ResolutionError::Str(message) => message.as_str(),
        _ => return false,
    };
    time_limited && message == NO_SOLUTION_FOUND
}
