//! Error types for the scheduling engine.

use thiserror::Error;

use crate::config::ConfigError;
use crate::milp::SolveStatus;
use crate::models::Violation;
use crate::validation::ValidationError;

/// Errors surfaced by building, solving, or extracting a block's schedule.
///
/// Solver timeout is not an error: it is reported as
/// [`SolveStatus::TimeLimit`] on a successful outcome.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid uop block: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error("solver proved the model infeasible")]
    Infeasible,

    #[error("solver failed: {0}")]
    Solver(String),

    #[error("inconsistent solver output for uop {uop}: {reason}")]
    Extraction { uop: usize, reason: String },

    #[error("extracted schedule violates invariants: {}", join(.0))]
    Verification(Vec<Violation>),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ScheduleError {
    /// Solver status this error corresponds to, if it came from the solver.
    pub fn solve_status(&self) -> Option<SolveStatus> {
        match self {
            Self::Infeasible => Some(SolveStatus::Infeasible),
            Self::Solver(_) => Some(SolveStatus::Error),
            _ => None,
        }
    }
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_validation_message_lists_every_issue() {
        let err = ScheduleError::Validation(vec![
            ValidationError::new(ValidationErrorKind::EmptyPortSet, 1, "no ports"),
            ValidationError::new(ValidationErrorKind::DependencyOutOfRange, 2, "dep 9"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("uop 1"));
        assert!(msg.contains("uop 2"));
        assert_eq!(err.solve_status(), None);
    }

    #[test]
    fn test_solver_statuses() {
        assert_eq!(
            ScheduleError::Infeasible.solve_status(),
            Some(SolveStatus::Infeasible)
        );
        assert_eq!(
            ScheduleError::Solver("boom".into()).solve_status(),
            Some(SolveStatus::Error)
        );
    }
}
