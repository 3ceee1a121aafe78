//! Scheduling domain models.
//!
//! Provides the data types for one basic block's port-scheduling problem
//! and its solution.
//!
//! # Domain Mappings
//!
//! | uop-schedule | Job-shop | Meaning |
//! |--------------|----------|---------|
//! | Uop | Operation | Micro-operation with a latency |
//! | Port | Machine | Execution unit, one uop at a time |
//! | UopBlock | Problem instance | First iteration of a basic block |
//! | Schedule | Production plan | Port + start cycle per uop |

mod port;
mod schedule;
mod uop;

pub use port::{ParsePortError, Port};
pub use schedule::{Schedule, ScheduledUop, Violation, ViolationType};
pub use uop::{Uop, UopBlock};
