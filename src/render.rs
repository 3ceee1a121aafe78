//! ASCII port-occupancy rendering.
//!
//! Shows which port is busy in which cycle. The cycle window and the port
//! list are supplied by the caller; occupancy is derived from each entry's
//! `(port, start_cycle, latency)` only.
//!
//! ```text
//! 0xxx  x
//! 1 xx
//! 2
//! ```
//!
//! Every row spans the whole window, idle cycles included, so columns line
//! up across ports.

use std::fmt;
use std::ops::Range;

use crate::models::{Port, Schedule};

/// Per-port, per-cycle occupancy over a fixed window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    window: Range<u32>,
    rows: Vec<(Port, Vec<bool>)>,
}

impl OccupancyGrid {
    /// Marks occupancy for each of `ports` in each cycle of `window`.
    ///
    /// Entries on ports outside `ports` are ignored.
    pub fn new(schedule: &Schedule, ports: &[Port], window: Range<u32>) -> Self {
        let rows = ports
            .iter()
            .map(|&port| {
                let cells = window
                    .clone()
                    .map(|cycle| schedule.is_port_busy(port, cycle))
                    .collect();
                (port, cells)
            })
            .collect();
        Self { window, rows }
    }

    /// Cycle window covered.
    pub fn window(&self) -> Range<u32> {
        self.window.clone()
    }

    /// Whether `port` is busy at `cycle`. `None` outside the grid.
    pub fn is_busy(&self, port: Port, cycle: u32) -> Option<bool> {
        if !self.window.contains(&cycle) {
            return None;
        }
        let offset = (cycle - self.window.start) as usize;
        self.rows
            .iter()
            .find(|(p, _)| *p == port)
            .and_then(|(_, cells)| cells.get(offset).copied())
    }

    /// Number of busy cycles on `port` within the window.
    pub fn busy_count(&self, port: Port) -> usize {
        self.rows
            .iter()
            .find(|(p, _)| *p == port)
            .map(|(_, cells)| cells.iter().filter(|&&b| b).count())
            .unwrap_or(0)
    }
}

impl fmt::Display for OccupancyGrid {
    /// One line per port: the port label followed by `x` (busy) or a space
    /// (idle) for every cycle of the window.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (port, cells) in &self.rows {
            let line: String = cells.iter().map(|&b| if b { 'x' } else { ' ' }).collect();
            writeln!(f, "{port}{line}")?;
        }
        Ok(())
    }
}

/// Renders the first `cycles` cycles of a schedule for the given ports.
pub fn render_ascii(schedule: &Schedule, ports: &[Port], cycles: u32) -> String {
    OccupancyGrid::new(schedule, ports, 0..cycles).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScheduledUop;

    fn sample() -> Schedule {
        let mut s = Schedule::new();
        s.add(ScheduledUop::new(0, Port(0), 3, 0));
        s.add(ScheduledUop::new(1, Port(1), 2, 1));
        s.add(ScheduledUop::new(2, Port(0), 1, 5));
        s
    }

    #[test]
    fn test_grid_occupancy() {
        let grid = OccupancyGrid::new(&sample(), &Port::range(3), 0..6);
        assert_eq!(grid.is_busy(Port(0), 0), Some(true));
        assert_eq!(grid.is_busy(Port(0), 3), Some(false));
        assert_eq!(grid.is_busy(Port(0), 5), Some(true));
        assert_eq!(grid.is_busy(Port(1), 0), Some(false));
        assert_eq!(grid.is_busy(Port(1), 2), Some(true));
        assert_eq!(grid.is_busy(Port(2), 2), Some(false));
        assert_eq!(grid.is_busy(Port(0), 6), None);
        assert_eq!(grid.is_busy(Port(4), 0), None);
        assert_eq!(grid.busy_count(Port(0)), 4);
    }

    #[test]
    fn test_render_ascii() {
        let text = render_ascii(&sample(), &Port::range(3), 10);
        assert_eq!(text, "0xxx  x    \n1 xx       \n2          \n");
    }

    #[test]
    fn test_window_offset() {
        let grid = OccupancyGrid::new(&sample(), &[Port(0)], 2..4);
        assert_eq!(grid.to_string(), "0x \n");
        assert_eq!(grid.window(), 2..4);
    }

    #[test]
    fn test_rows_have_equal_width() {
        let text = render_ascii(&sample(), &Port::range(6), 10);
        let widths: Vec<usize> = text.lines().map(str::len).collect();
        assert_eq!(widths, vec![11; 6]);
    }

    #[test]
    fn test_window_truncates() {
        let text = render_ascii(&sample(), &[Port(0)], 2);
        assert_eq!(text, "0xx\n");
    }
}
