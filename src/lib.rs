//! Optimal micro-op port scheduling for basic blocks.
//!
//! Given a block of uops (latency, data dependencies, eligible execution
//! ports), computes a schedule with minimum makespan by solving a
//! mixed-integer program, and verifies the result independently of the
//! solver.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Port`, `Uop`, `UopBlock`, `Schedule`
//! - **`validation`**: Input integrity checks (dependency range, cycles, empty port sets)
//! - **`bounds`**: Critical-path and port-load lower bounds
//! - **`scheduler`**: Greedy list scheduling and schedule KPIs
//! - **`milp`**: Model construction, HiGHS solve, extraction, `OptimalScheduler`
//! - **`verify`**: Schedule feasibility checks (precedence, eligibility, port conflicts)
//! - **`render`**: ASCII port-occupancy grid
//! - **`rival`** / **`compare`**: Heuristic simulator traces and gap statistics
//! - **`synthetic`**: Seeded random block generation
//! - **`config`**: Solver and renderer settings, TOML loading
//!
//! # Example
//! ```no_run
//! use uop_schedule::milp::OptimalScheduler;
//! use uop_schedule::models::{Uop, UopBlock};
//!
//! let block = UopBlock::new()
//!     .with_uop(Uop::new(0, 2).with_port(0))
//!     .with_uop(Uop::new(1, 2).with_port(1));
//! let outcome = OptimalScheduler::default().solve(&block).unwrap();
//! assert_eq!(outcome.makespan, 2);
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Brucker (2007), "Scheduling Algorithms"
//! - Abel & Reineke (2019), "uops.info: Characterizing Latency, Throughput,
//!   and Port Usage of Instructions on Intel Microarchitectures"

pub mod bounds;
pub mod compare;
pub mod config;
pub mod error;
pub mod milp;
pub mod models;
pub mod render;
pub mod rival;
pub mod scheduler;
pub mod synthetic;
pub mod validation;
pub mod verify;

pub use error::ScheduleError;
