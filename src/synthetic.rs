//! Seeded random uop blocks.
//!
//! Produces DAG-respecting blocks for stress tests and solver benchmarks:
//! dependencies only ever point to earlier uops, and every uop gets at
//! least one eligible port. The same seed always yields the same block.

use rand::prelude::IndexedRandom;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::models::{Port, Uop, UopBlock};

/// Random block generator.
///
/// # Example
/// ```
/// use uop_schedule::synthetic::SyntheticBlock;
///
/// let block = SyntheticBlock::new(7).with_uops(20).with_ports(4).generate();
/// assert_eq!(block.len(), 20);
/// assert!(uop_schedule::validation::validate_block(&block).is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct SyntheticBlock {
    seed: u64,
    uops: usize,
    ports: u8,
    max_latency: u32,
    max_ports_per_uop: usize,
    dependency_probability: f64,
}

impl SyntheticBlock {
    /// Creates a generator with the given seed and small defaults
    /// (10 uops, 6 ports, latency 1..=4, up to 2 ports per uop, 20% edges).
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            uops: 10,
            ports: 6,
            max_latency: 4,
            max_ports_per_uop: 2,
            dependency_probability: 0.2,
        }
    }

    /// Sets the number of uops.
    pub fn with_uops(mut self, uops: usize) -> Self {
        self.uops = uops;
        self
    }

    /// Sets the number of ports (at least 1).
    pub fn with_ports(mut self, ports: u8) -> Self {
        self.ports = ports.max(1);
        self
    }

    /// Sets the maximum latency (at least 1).
    pub fn with_max_latency(mut self, max_latency: u32) -> Self {
        self.max_latency = max_latency.max(1);
        self
    }

    /// Sets the maximum eligible ports per uop (at least 1).
    pub fn with_max_ports_per_uop(mut self, max_ports: usize) -> Self {
        self.max_ports_per_uop = max_ports.max(1);
        self
    }

    /// Sets the probability that a uop depends on any given earlier uop.
    pub fn with_dependency_probability(mut self, p: f64) -> Self {
        self.dependency_probability = p.clamp(0.0, 1.0);
        self
    }

    /// Generates the block.
    pub fn generate(&self) -> UopBlock {
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let all_ports = Port::range(self.ports);
        let max_ports = self.max_ports_per_uop.min(all_ports.len());

        let mut block = UopBlock::new();
        for id in 0..self.uops {
            let latency = rng.random_range(1..=self.max_latency);
            let port_count = rng.random_range(1..=max_ports);
            let ports: Vec<Port> = all_ports
                .choose_multiple(&mut rng, port_count)
                .copied()
                .collect();

            let mut uop = Uop::new(id, latency).with_ports(ports);
            for producer in 0..id {
                if rng.random_bool(self.dependency_probability) {
                    uop = uop.with_dependency(producer);
                }
            }
            block.push(uop);
        }
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_block;

    #[test]
    fn test_generate_is_deterministic() {
        let a = SyntheticBlock::new(99).with_uops(15).generate();
        let b = SyntheticBlock::new(99).with_uops(15).generate();
        assert_eq!(a, b);
    }

    #[test]
    fn test_generated_block_is_valid() {
        for seed in 0..20 {
            let block = SyntheticBlock::new(seed)
                .with_uops(25)
                .with_ports(3)
                .with_dependency_probability(0.3)
                .generate();
            assert!(validate_block(&block).is_ok());
        }
    }

    #[test]
    fn test_respects_limits() {
        let block = SyntheticBlock::new(5)
            .with_uops(40)
            .with_ports(2)
            .with_max_latency(3)
            .with_max_ports_per_uop(5)
            .generate();
        for uop in block.uops() {
            assert!((1..=3).contains(&uop.latency));
            assert!(!uop.eligible_ports.is_empty());
            assert!(uop.eligible_ports.len() <= 2);
            assert!(uop.eligible_ports.iter().all(|p| p.index() < 2));
            assert!(uop.dependencies.iter().all(|&d| d < uop.id));
        }
    }

    #[test]
    fn test_no_dependencies() {
        let block = SyntheticBlock::new(3)
            .with_dependency_probability(0.0)
            .generate();
        assert!(block.uops().iter().all(|u| u.dependencies.is_empty()));
    }
}
