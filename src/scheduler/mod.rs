//! Greedy scheduling and KPI evaluation.
//!
//! # Algorithm
//!
//! `ListScheduler` dispatches uops in topological order to the eligible
//! port that frees up first. It is not optimal, but it is fast, always
//! feasible, and its makespan bounds the optimal one from above, which
//! makes it the planning horizon for the MILP.
//!
//! # KPI
//!
//! `ScheduleKpi` reports makespan, lower bounds, and port utilization.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4
//! - Graham (1969), "Bounds on Multiprocessing Timing Anomalies"

mod kpi;
mod simple;

pub use kpi::ScheduleKpi;
pub use simple::ListScheduler;
