//! Heuristic-versus-optimal comparison.
//!
//! Measures how far a heuristic simulator's cycle count is from the
//! optimal makespan of the same block:
//!
//! - relative gap: `1 - optimal / heuristic` (0 = heuristic is optimal)
//! - mean gap across many blocks
//! - a confusion matrix of (optimal, heuristic) cycle counts
//!
//! Results files are CSV with a header line and rows
//! `block,heuristic,optimal`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors parsing comparison results.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompareError {
    #[error("line {line}: expected `block,heuristic,optimal`")]
    MissingColumn { line: usize },

    #[error("line {line}: invalid cycle count '{value}'")]
    InvalidNumber { line: usize, value: String },
}

/// Cycle counts for one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    /// Block identifier (e.g. its hex encoding).
    pub block: String,
    /// Cycles reported by the heuristic simulator.
    pub heuristic: u64,
    /// Optimal makespan.
    pub optimal: u64,
}

impl Comparison {
    /// Creates a comparison record.
    pub fn new(block: impl Into<String>, heuristic: u64, optimal: u64) -> Self {
        Self {
            block: block.into(),
            heuristic,
            optimal,
        }
    }

    /// `1 - optimal / heuristic`; `None` when the heuristic reports 0 cycles.
    pub fn relative_gap(&self) -> Option<f64> {
        relative_gap(self.heuristic, self.optimal)
    }
}

/// `1 - optimal / heuristic`; `None` when `heuristic` is 0.
pub fn relative_gap(heuristic: u64, optimal: u64) -> Option<f64> {
    (heuristic != 0).then(|| 1.0 - optimal as f64 / heuristic as f64)
}

/// Mean relative gap, skipping records without a defined gap.
///
/// Returns `None` if no record has a gap.
pub fn mean_gap(records: &[Comparison]) -> Option<f64> {
    let gaps: Vec<f64> = records.iter().filter_map(Comparison::relative_gap).collect();
    if gaps.is_empty() {
        None
    } else {
        Some(gaps.iter().sum::<f64>() / gaps.len() as f64)
    }
}

/// Parses `block,heuristic,optimal` rows, skipping the header and blank lines.
pub fn parse_csv(text: &str) -> Result<Vec<Comparison>, CompareError> {
    let mut records = Vec::new();
    for (index, line) in text.lines().enumerate().skip(1) {
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        let mut parts = line.split(',').map(str::trim);
        let (Some(block), Some(heuristic), Some(optimal)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(CompareError::MissingColumn { line: line_no });
        };
        records.push(Comparison::new(
            block,
            parse_cycles(line_no, heuristic)?,
            parse_cycles(line_no, optimal)?,
        ));
    }
    Ok(records)
}

fn parse_cycles(line: usize, value: &str) -> Result<u64, CompareError> {
    // Some producers write counts as floats ("12.0").
    value
        .parse::<u64>()
        .ok()
        .or_else(|| {
            value
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0)
                .map(|v| v as u64)
        })
        .ok_or_else(|| CompareError::InvalidNumber {
            line,
            value: value.to_string(),
        })
}

/// Square matrix counting (optimal, heuristic) cycle pairs in `1..=size`.
///
/// Rows are indexed by optimal cycles, columns by heuristic cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    size: usize,
    counts: Vec<Vec<u64>>,
    skipped: u64,
}

impl ConfusionMatrix {
    /// Default side length.
    pub const DEFAULT_SIZE: usize = 15;

    /// Creates an empty `size × size` matrix.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            counts: vec![vec![0; size]; size],
            skipped: 0,
        }
    }

    /// Builds a matrix from comparison records.
    pub fn from_records(size: usize, records: &[Comparison]) -> Self {
        let mut matrix = Self::new(size);
        for r in records {
            matrix.record(r.optimal, r.heuristic);
        }
        matrix
    }

    /// Counts one pair. Pairs with a coordinate outside `1..=size` are skipped.
    pub fn record(&mut self, optimal: u64, heuristic: u64) {
        let in_range = |v: u64| v >= 1 && v <= self.size as u64;
        if in_range(optimal) && in_range(heuristic) {
            self.counts[optimal as usize - 1][heuristic as usize - 1] += 1;
        } else {
            self.skipped += 1;
        }
    }

    /// Count for an (optimal, heuristic) pair, `None` out of range.
    pub fn get(&self, optimal: u64, heuristic: u64) -> Option<u64> {
        let row = usize::try_from(optimal).ok()?.checked_sub(1)?;
        let col = usize::try_from(heuristic).ok()?.checked_sub(1)?;
        self.counts.get(row)?.get(col).copied()
    }

    /// Number of pairs skipped as out of range.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Side length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// CSV rows, highest optimal count first (heatmap orientation).
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for row in self.counts.iter().rev() {
            for value in row {
                out.push_str(&value.to_string());
                out.push(',');
            }
            out.push('\n');
        }
        out
    }
}

impl Default for ConfusionMatrix {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_gap() {
        assert!((relative_gap(10, 8).unwrap() - 0.2).abs() < 1e-12);
        assert!((relative_gap(5, 5).unwrap()).abs() < 1e-12);
        assert_eq!(relative_gap(0, 3), None);
    }

    #[test]
    fn test_mean_gap() {
        let records = vec![
            Comparison::new("a", 10, 8),
            Comparison::new("b", 4, 4),
            Comparison::new("c", 0, 2),
        ];
        assert!((mean_gap(&records).unwrap() - 0.1).abs() < 1e-12);
        assert_eq!(mean_gap(&[]), None);
    }

    #[test]
    fn test_parse_csv() {
        let text = "block,uica,optimal\n4889de,10,8\n\n4889c2, 3.0 ,3\n";
        let records = parse_csv(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], Comparison::new("4889de", 10, 8));
        assert_eq!(records[1].heuristic, 3);
    }

    #[test]
    fn test_parse_csv_errors() {
        assert_eq!(
            parse_csv("h\nx,1\n").unwrap_err(),
            CompareError::MissingColumn { line: 2 }
        );
        assert!(matches!(
            parse_csv("h\nx,1,abc\n").unwrap_err(),
            CompareError::InvalidNumber { line: 2, .. }
        ));
        assert!(matches!(
            parse_csv("h\nx,1.5,1\n").unwrap_err(),
            CompareError::InvalidNumber { .. }
        ));
    }

    #[test]
    fn test_confusion_matrix() {
        let records = vec![
            Comparison::new("a", 3, 2),
            Comparison::new("b", 3, 2),
            Comparison::new("c", 1, 1),
            Comparison::new("d", 20, 2),
            Comparison::new("e", 0, 0),
        ];
        let m = ConfusionMatrix::from_records(3, &records);
        assert_eq!(m.get(2, 3), Some(2));
        assert_eq!(m.get(1, 1), Some(1));
        assert_eq!(m.get(3, 3), Some(0));
        assert_eq!(m.get(0, 1), None);
        assert_eq!(m.get(4, 1), None);
        assert_eq!(m.skipped(), 2);
        assert_eq!(m.to_csv(), "0,0,0,\n0,0,2,\n1,0,0,\n");
    }

    #[test]
    fn test_default_size() {
        assert_eq!(ConfusionMatrix::default().size(), 15);
    }
}
