//! Uop (micro-operation) model.
//!
//! A uop is the smallest schedulable unit of a basic block. It has a
//! latency, a set of producer uops it depends on, and the set of ports
//! it may be dispatched to.
//!
//! A [`UopBlock`] is the ordered uop list of one basic block's first
//! dynamic iteration. A uop's id is its position in issue order and is
//! the key used by dependency references.
//!
//! # JSON form
//!
//! A block is a plain array of uop records. The id is implied by the
//! position and is never serialized:
//!
//! ```json
//! [
//!   { "latency": 3, "dependencies": [],  "possible_ports": ["0"] },
//!   { "latency": 2, "dependencies": [0], "possible_ports": ["0", "1"] }
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::Port;

/// A micro-operation to be scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uop {
    /// Position in issue order (0-based).
    #[serde(skip)]
    pub id: usize,
    /// Cycles from dispatch to result availability.
    pub latency: u32,
    /// Ids of uops whose results this uop consumes.
    #[serde(default)]
    pub dependencies: Vec<usize>,
    /// Ports this uop may be dispatched to.
    #[serde(rename = "possible_ports", alias = "eligible_ports")]
    pub eligible_ports: BTreeSet<Port>,
}

impl Uop {
    /// Creates a uop with the given id and latency, no dependencies and
    /// no eligible ports.
    pub fn new(id: usize, latency: u32) -> Self {
        Self {
            id,
            latency,
            dependencies: Vec::new(),
            eligible_ports: BTreeSet::new(),
        }
    }

    /// Adds a dependency on another uop.
    pub fn with_dependency(mut self, producer: usize) -> Self {
        self.dependencies.push(producer);
        self
    }

    /// Adds an eligible port.
    pub fn with_port(mut self, port: impl Into<Port>) -> Self {
        self.eligible_ports.insert(port.into());
        self
    }

    /// Adds several eligible ports.
    pub fn with_ports<P: Into<Port>>(mut self, ports: impl IntoIterator<Item = P>) -> Self {
        self.eligible_ports.extend(ports.into_iter().map(Into::into));
        self
    }

    /// Whether this uop may run on `port`.
    #[inline]
    pub fn is_eligible(&self, port: Port) -> bool {
        self.eligible_ports.contains(&port)
    }

    /// The single port this uop is pinned to, if it has exactly one.
    pub fn pinned_port(&self) -> Option<Port> {
        if self.eligible_ports.len() == 1 {
            self.eligible_ports.iter().next().copied()
        } else {
            None
        }
    }

    /// Ports on which both `self` and `other` may run.
    pub fn shared_ports<'a>(&'a self, other: &'a Uop) -> impl Iterator<Item = Port> + 'a {
        self.eligible_ports.intersection(&other.eligible_ports).copied()
    }
}

/// The uops of one basic block, in issue order.
///
/// Ids are renumbered to positions on construction, so `block.uops()[i].id == i`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Uop>", into = "Vec<Uop>")]
pub struct UopBlock {
    uops: Vec<Uop>,
}

impl UopBlock {
    /// Creates an empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a uop, assigning it the next id.
    pub fn push(&mut self, mut uop: Uop) -> usize {
        let id = self.uops.len();
        uop.id = id;
        self.uops.push(uop);
        id
    }

    /// Appends a uop (builder form).
    pub fn with_uop(mut self, uop: Uop) -> Self {
        self.push(uop);
        self
    }

    /// Parses a block from its JSON array form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the block to its JSON array form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// All uops in issue order.
    #[inline]
    pub fn uops(&self) -> &[Uop] {
        &self.uops
    }

    /// Looks up a uop by id.
    #[inline]
    pub fn uop(&self, id: usize) -> Option<&Uop> {
        self.uops.get(id)
    }

    /// Number of uops.
    #[inline]
    pub fn len(&self) -> usize {
        self.uops.len()
    }

    /// Whether the block has no uops.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.uops.is_empty()
    }

    /// Sum of all latencies. An upper bound on any sensible makespan.
    pub fn total_latency(&self) -> u64 {
        self.uops.iter().map(|u| u64::from(u.latency)).sum()
    }

    /// Union of every uop's eligible ports.
    pub fn ports(&self) -> BTreeSet<Port> {
        self.uops
            .iter()
            .flat_map(|u| u.eligible_ports.iter().copied())
            .collect()
    }

    /// Successor lists: `successors()[d]` holds every uop depending on `d`.
    ///
    /// Out-of-range dependency ids are ignored here; validation reports them.
    pub fn successors(&self) -> Vec<Vec<usize>> {
        let mut succ = vec![Vec::new(); self.uops.len()];
        for uop in &self.uops {
            for &dep in &uop.dependencies {
                if let Some(list) = succ.get_mut(dep) {
                    list.push(uop.id);
                }
            }
        }
        succ
    }

    /// Topological order (Kahn), ties broken by lowest id.
    ///
    /// Returns `None` if the dependency graph has a cycle or references
    /// unknown uops.
    pub fn topological_order(&self) -> Option<Vec<usize>> {
        let n = self.uops.len();
        let mut indegree = vec![0usize; n];
        for uop in &self.uops {
            for &dep in &uop.dependencies {
                if dep >= n {
                    return None;
                }
                indegree[uop.id] += 1;
            }
        }

        let succ = self.successors();
        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(id) = ready.pop_first() {
            order.push(id);
            for &next in &succ[id] {
                indegree[next] -= 1;
                if indegree[next] == 0 {
                    ready.insert(next);
                }
            }
        }

        (order.len() == n).then_some(order)
    }
}

impl From<Vec<Uop>> for UopBlock {
    fn from(uops: Vec<Uop>) -> Self {
        let mut block = Self::new();
        for uop in uops {
            block.push(uop);
        }
        block
    }
}

impl From<UopBlock> for Vec<Uop> {
    fn from(block: UopBlock) -> Self {
        block.uops
    }
}
