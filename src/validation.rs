//! Input validation for uop blocks.
//!
//! Checks structural integrity of a block before a model is built.
//! Detects:
//! - Dependencies referencing unknown uops
//! - Uops depending on themselves
//! - Circular dependencies (DAG validation)
//! - Uops with no eligible port
//! - Total latency beyond the `u32` cycle range
//!
//! Every issue names the offending uop id. No uop is ever dropped to make
//! a block valid.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::fmt;

use crate::error::ScheduleError;
use crate::models::UopBlock;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Offending uop id.
    pub uop: usize,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A dependency index is not a uop of the block.
    DependencyOutOfRange,
    /// A uop lists itself as a dependency.
    SelfDependency,
    /// Dependency graph contains a cycle.
    CyclicDependency,
    /// A uop has no eligible port.
    EmptyPortSet,
    /// Cumulative latency up to this uop exceeds `u32::MAX` cycles.
    LatencyOverflow,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, uop: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            uop,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "uop {}: {}", self.uop, self.message)
    }
}

/// Validates a block.
///
/// Checks:
/// 1. Every uop has at least one eligible port
/// 2. Every dependency refers to a uop of the block
/// 3. No uop depends on itself
/// 4. No circular dependencies
/// 5. The total latency fits in `u32` cycles
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_block(block: &UopBlock) -> ValidationResult {
    let mut errors = Vec::new();
    let n = block.len();

    for uop in block.uops() {
        if uop.eligible_ports.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyPortSet,
                uop.id,
                "no eligible ports",
            ));
        }

        for &dep in &uop.dependencies {
            if dep >= n {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DependencyOutOfRange,
                    uop.id,
                    format!("dependency {dep} out of range (block has {n} uops)"),
                ));
            } else if dep == uop.id {
                errors.push(ValidationError::new(
                    ValidationErrorKind::SelfDependency,
                    uop.id,
                    "depends on itself",
                ));
            }
        }
    }

    if let Some(err) = detect_latency_overflow(block) {
        errors.push(err);
    }

    // Cycle detection only makes sense over in-range, non-self edges.
    if errors.iter().all(|e| {
        matches!(
            e.kind,
            ValidationErrorKind::EmptyPortSet | ValidationErrorKind::LatencyOverflow
        )
    }) {
        if let Some(cycle_err) = detect_cycles(block) {
            errors.push(cycle_err);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a block, wrapping failures in [`ScheduleError::Validation`].
pub fn ensure_valid(block: &UopBlock) -> Result<(), ScheduleError> {
    validate_block(block).map_err(ScheduleError::Validation)
}

/// Finds the first uop at which the running latency sum leaves `u32`.
///
/// Every start and finish cycle of a schedule is bounded by the total
/// latency, so this keeps all cycle arithmetic in range.
fn detect_latency_overflow(block: &UopBlock) -> Option<ValidationError> {
    let mut total = 0u32;
    for uop in block.uops() {
        match total.checked_add(uop.latency) {
            Some(next) => total = next,
            None => {
                return Some(ValidationError::new(
                    ValidationErrorKind::LatencyOverflow,
                    uop.id,
                    format!("total latency exceeds {} cycles", u32::MAX),
                ))
            }
        }
    }
    None
}

/// Detects cycles in the dependency graph using DFS.
///
/// # Algorithm
/// Topological sort via DFS. If a back-edge is found (visiting a node
/// currently in the recursion stack), a cycle exists.
///
/// # Reference
/// Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4
fn detect_cycles(block: &UopBlock) -> Option<ValidationError> {
    let succ = block.successors();
    let n = block.len();

    let mut visited = vec![false; n];
    let mut in_stack = vec![false; n];

    for node in 0..n {
        if !visited[node] && has_cycle_dfs(node, &succ, &mut visited, &mut in_stack) {
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                node,
                "circular dependency detected",
            ));
        }
    }

    None
}

fn has_cycle_dfs(
    node: usize,
    succ: &[Vec<usize>],
    visited: &mut [bool],
    in_stack: &mut [bool],
) -> bool {
    visited[node] = true;
    in_stack[node] = true;

    for &next in &succ[node] {
        if in_stack[next] {
            return true; // back edge
        }
        if !visited[next] && has_cycle_dfs(next, succ, visited, in_stack) {
            return true;
        }
    }

    in_stack[node] = false;
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Uop;

    fn sample_block() -> UopBlock {
        UopBlock::new()
            .with_uop(Uop::new(0, 1).with_ports([0, 1]))
            .with_uop(Uop::new(0, 3).with_dependency(0).with_port(1))
            .with_uop(Uop::new(0, 1).with_dependency(0).with_dependency(1).with_port(5))
    }

    #[test]
    fn test_valid_block() {
        assert!(validate_block(&sample_block()).is_ok());
        assert!(ensure_valid(&sample_block()).is_ok());
    }

    #[test]
    fn test_empty_block_is_valid() {
        assert!(validate_block(&UopBlock::new()).is_ok());
    }

    #[test]
    fn test_empty_port_set() {
        let block = UopBlock::new()
            .with_uop(Uop::new(0, 1).with_port(0))
            .with_uop(Uop::new(0, 1));

        let errors = validate_block(&block).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::EmptyPortSet);
        assert_eq!(errors[0].uop, 1);
    }

    #[test]
    fn test_dependency_out_of_range() {
        let block = UopBlock::new().with_uop(Uop::new(0, 1).with_dependency(7).with_port(0));

        let errors = validate_block(&block).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DependencyOutOfRange && e.uop == 0));
    }

    #[test]
    fn test_self_dependency() {
        let block = UopBlock::new()
            .with_uop(Uop::new(0, 1).with_port(0))
            .with_uop(Uop::new(0, 1).with_dependency(1).with_port(0));

        let errors = validate_block(&block).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::SelfDependency && e.uop == 1));
    }

    #[test]
    fn test_cyclic_dependency() {
        // 0 → 1 → 2 → 0
        let block = UopBlock::new()
            .with_uop(Uop::new(0, 1).with_dependency(2).with_port(0))
            .with_uop(Uop::new(0, 1).with_dependency(0).with_port(0))
            .with_uop(Uop::new(0, 1).with_dependency(1).with_port(0));

        let errors = validate_block(&block).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::CyclicDependency));
    }

    #[test]
    fn test_forward_reference_without_cycle() {
        // 0 depends on the later uop 1; unusual but acyclic.
        let block = UopBlock::new()
            .with_uop(Uop::new(0, 1).with_dependency(1).with_port(0))
            .with_uop(Uop::new(0, 1).with_port(0));
        assert!(validate_block(&block).is_ok());
    }

    #[test]
    fn test_latency_overflow() {
        let half = u32::MAX / 2 + 1;
        let block = UopBlock::new()
            .with_uop(Uop::new(0, 1).with_port(1))
            .with_uop(Uop::new(0, half).with_port(0))
            .with_uop(Uop::new(0, half).with_port(0));

        let errors = validate_block(&block).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::LatencyOverflow);
        assert_eq!(errors[0].uop, 2);

        let fits = UopBlock::new()
            .with_uop(Uop::new(0, u32::MAX - 1).with_port(0))
            .with_uop(Uop::new(0, 1).with_port(0));
        assert!(validate_block(&fits).is_ok());
    }

    #[test]
    fn test_multiple_errors() {
        let block = UopBlock::new()
            .with_uop(Uop::new(0, 1))
            .with_uop(Uop::new(0, 1).with_dependency(42).with_port(0));

        let errors = validate_block(&block).unwrap_err();
        assert!(errors.len() >= 2);

        let err = ensure_valid(&block).unwrap_err();
        assert!(matches!(err, ScheduleError::Validation(ref v) if v.len() == errors.len()));
    }
}
