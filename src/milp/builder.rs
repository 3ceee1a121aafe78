//! MILP formulation of single-block port scheduling.
//!
//! # Variables
//!
//! | Variable | Kind | Meaning |
//! |----------|------|---------|
//! | `start(u)` | integer in `[0, H - lat(u)]` | dispatch cycle of uop `u` |
//! | `use_port(u, p)` | binary, `p` eligible for `u` | `u` runs on `p` |
//! | `makespan` | integer in `[LB, H]` | objective |
//! | `both(u, v, p)` | binary | `u` and `v` both run on `p` |
//! | `order(u, v, p)` | binary | `u` precedes `v` on `p` |
//!
//! `H` is the planning horizon, the makespan of a known feasible schedule;
//! `LB` is the best combinatorial lower bound.
//!
//! # Constraints
//!
//! - Precedence: `start(u) - start(d) >= lat(d)` per dependency `d` of `u`
//! - Port selection: `sum_p use_port(u, p) = 1`
//! - Makespan: `start(u) + lat(u) <= makespan`
//! - Port exclusion, per pair `u < v` and shared port `p`:
//!   - `both = use_port(u,p) AND use_port(v,p)` (three linear inequalities)
//!   - `finish(u) <= start(v) + M(1 - order) + M(1 - both)`
//!   - `finish(v) <= start(u) + M order + M(1 - both)`
//!
//! With `both = 0` both disjuncts are relaxed by at least `M`, so pairs that
//! end up on different ports are left unconstrained. `M = H` is safe because
//! every finish time is bounded by `H`.
//!
//! # Reference
//! - Pritsker et al. (1969), "Multiproject Scheduling with Limited Resources:
//!   A Zero-One Programming Approach"
//! - Baptiste et al. (2001), "Constraint-Based Scheduling", Ch. 1 (disjunctive constraints)

use std::collections::BTreeMap;

use good_lp::{constraint, variable, Constraint, Expression, ProblemVariables, Variable};
use tracing::debug;

use crate::error::ScheduleError;
use crate::models::{Port, UopBlock};
use crate::validation::ensure_valid;

/// One disjunctive port-conflict triple `(first, second, port)`.
#[derive(Debug, Clone, Copy)]
pub struct PortConflict {
    /// Lower uop id of the pair.
    pub first: usize,
    /// Higher uop id of the pair.
    pub second: usize,
    /// Shared eligible port.
    pub port: Port,
    /// `use_port(first, port) AND use_port(second, port)`.
    pub both: Variable,
    /// Set when `first` runs before `second` on `port`.
    pub order: Variable,
}

/// Builds the scheduling MILP for one block.
///
/// # Example
/// ```
/// use uop_schedule::milp::UopModelBuilder;
/// use uop_schedule::models::{Uop, UopBlock};
///
/// let block = UopBlock::new()
///     .with_uop(Uop::new(0, 1).with_port(0))
///     .with_uop(Uop::new(1, 1).with_port(0));
/// let model = UopModelBuilder::new(&block).with_horizon(2).build().unwrap();
/// assert_eq!(model.conflict_count(), 1);
/// ```
pub struct UopModelBuilder<'a> {
    block: &'a UopBlock,
    horizon: Option<u32>,
    lower_bound: u32,
}

/// A built, not yet solved, scheduling MILP.
///
/// Owns its variables and constraints; consumed by a single solve.
pub struct UopModel<'a> {
    pub(crate) block: &'a UopBlock,
    pub(crate) vars: ProblemVariables,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) makespan: Variable,
    pub(crate) starts: Vec<Variable>,
    pub(crate) port_vars: Vec<BTreeMap<Port, Variable>>,
    conflicts: Vec<PortConflict>,
    horizon: u32,
    lower_bound: u32,
    variable_count: usize,
}

impl<'a> UopModelBuilder<'a> {
    /// Creates a builder for a block.
    pub fn new(block: &'a UopBlock) -> Self {
        Self {
            block,
            horizon: None,
            lower_bound: 0,
        }
    }

    /// Sets the planning horizon, which also serves as the big-M constant.
    ///
    /// Must be at least the makespan of some feasible schedule, otherwise
    /// the model is infeasible. Defaults to the sum of all latencies.
    pub fn with_horizon(mut self, horizon: u32) -> Self {
        self.horizon = Some(horizon);
        self
    }

    /// Sets a known lower bound on the makespan.
    pub fn with_lower_bound(mut self, lower_bound: u32) -> Self {
        self.lower_bound = lower_bound;
        self
    }

    /// Builds the model.
    ///
    /// # Errors
    /// [`ScheduleError::Validation`] if the block is malformed (dangling or
    /// cyclic dependencies, empty port sets, latency overflow).
    pub fn build(&self) -> Result<UopModel<'a>, ScheduleError> {
        let block = self.block;
        ensure_valid(block)?;
        let uops = block.uops();
        let horizon = self.horizon.unwrap_or_else(|| {
            u32::try_from(block.total_latency()).unwrap_or(u32::MAX)
        });
        let lower_bound = self.lower_bound.min(horizon);
        let big_m = f64::from(horizon);

        let mut vars = ProblemVariables::new();
        let mut variable_count = 0usize;
        let mut constraints = Vec::new();

        let makespan = vars.add(
            variable()
                .integer()
                .min(lower_bound)
                .max(horizon)
                .name("makespan"),
        );
        variable_count += 1;

        // Start cycle and port selection per uop
        let mut starts = Vec::with_capacity(uops.len());
        let mut port_vars = Vec::with_capacity(uops.len());
        for uop in uops {
            let start = vars.add(
                variable()
                    .integer()
                    .min(0)
                    .max(horizon.saturating_sub(uop.latency))
                    .name(format!("uop{}-start", uop.id)),
            );
            starts.push(start);

            let mut ports = BTreeMap::new();
            for &port in &uop.eligible_ports {
                let used = vars.add(
                    variable()
                        .binary()
                        .name(format!("uop{}-port{}", uop.id, port)),
                );
                ports.insert(port, used);
            }
            variable_count += 1 + ports.len();
            port_vars.push(ports);
        }

        for uop in uops {
            let id = uop.id;
            let latency = f64::from(uop.latency);

            // Precedence
            for &dep in &uop.dependencies {
                let gap: Expression = starts[id] - starts[dep];
                let dep_latency = f64::from(uops[dep].latency);
                constraints.push(constraint!(gap >= dep_latency));
            }

            // Exactly one port
            let selected = port_vars[id]
                .values()
                .fold(Expression::from(0.0), |acc, &v| acc + v);
            constraints.push(constraint!(selected == 1.0));

            // Makespan covers every finish
            let finish: Expression = starts[id] + latency;
            constraints.push(constraint!(finish <= makespan));
        }

        // Pairwise port exclusion; self-pairs never arise since second > first
        let mut conflicts = Vec::new();
        for (first, a) in uops.iter().enumerate() {
            for (second, b) in uops.iter().enumerate().skip(first + 1) {
                for port in a.shared_ports(b) {
                    let on_a = port_vars[first][&port];
                    let on_b = port_vars[second][&port];

                    let both = vars.add(
                        variable()
                            .binary()
                            .name(format!("both{first}-{second}-port{port}")),
                    );
                    let order = vars.add(
                        variable()
                            .binary()
                            .name(format!("order{first}-{second}-port{port}")),
                    );
                    variable_count += 2;

                    // both = on_a AND on_b
                    constraints.push(constraint!(both <= on_a));
                    constraints.push(constraint!(both <= on_b));
                    let pair: Expression = on_a + on_b - 1.0;
                    constraints.push(constraint!(both >= pair));

                    // order = 1: a finishes before b starts
                    let finish_a: Expression = starts[first] + f64::from(a.latency);
                    let slack_a: Expression =
                        Expression::from(starts[second]) + 2.0 * big_m - big_m * order - big_m * both;
                    constraints.push(constraint!(finish_a <= slack_a));

                    // order = 0: b finishes before a starts
                    let finish_b: Expression = starts[second] + f64::from(b.latency);
                    let slack_b: Expression =
                        Expression::from(starts[first]) + big_m + big_m * order - big_m * both;
                    constraints.push(constraint!(finish_b <= slack_b));

                    conflicts.push(PortConflict {
                        first,
                        second,
                        port,
                        both,
                        order,
                    });
                }
            }
        }

        debug!(
            uops = uops.len(),
            variables = variable_count,
            constraints = constraints.len(),
            conflicts = conflicts.len(),
            horizon,
            lower_bound,
            "built scheduling model"
        );

        Ok(UopModel {
            block,
            vars,
            constraints,
            makespan,
            starts,
            port_vars,
            conflicts,
            horizon,
            lower_bound,
            variable_count,
        })
    }
}

impl UopModel<'_> {
    /// Number of decision variables.
    pub fn variable_count(&self) -> usize {
        self.variable_count
    }

    /// Number of linear constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Disjunctive conflict triples, one per shared port of each uop pair.
    pub fn conflicts(&self) -> &[PortConflict] {
        &self.conflicts
    }

    /// Number of conflict triples.
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    /// Planning horizon.
    pub fn horizon(&self) -> u32 {
        self.horizon
    }

    /// Big-M constant used to relax inactive disjuncts.
    pub fn big_m(&self) -> u32 {
        self.horizon
    }

    /// Lower bound imposed on the makespan variable.
    pub fn lower_bound(&self) -> u32 {
        self.lower_bound
    }

    /// The block this model was built from.
    pub fn block(&self) -> &UopBlock {
        self.block
    }
}
