use crate::error::{BisbmError, Result};

/// A single unordered edge `(u, v)`, `u` always the smaller-or-equal
/// node index as returned from the parser; orientation relative to
/// `TypeVec` is what determines which side each endpoint is on.
pub type Edge = (u32, u32);

/// Type label of a node: side `a` or side `b` of the bipartite graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Side {
    A,
    B,
}

/// The type vector, after normalization so that nodes `0..n_a` are
/// side `a` and `n_a..n_a+n_b` are side `b`.
///
/// Construction from a raw, possibly-interleaved type vector records
/// the old->new permutation so callers can translate edge endpoints
/// and partitions back to the caller's original node numbering.
#[derive(Debug, Clone)]
pub struct TypeVec {
    /// Number of side-`a` nodes.
    n_a: usize,
    /// Number of side-`b` nodes.
    n_b: usize,
    /// `old_to_new[i]` = normalized index of original node `i`.
    old_to_new: Vec<u32>,
    /// `new_to_old[i]` = original index of normalized node `i`.
    new_to_old: Vec<u32>,
}

impl TypeVec {
    /// Builds a normalized type vector from raw per-node labels in
    /// `{1, 2}`. Returns `InvalidInput` if either side is empty.
    pub fn normalize(raw: &[u8]) -> Result<Self> {
        let mut a_nodes = Vec::new();
        let mut b_nodes = Vec::new();
        for (i, &t) in raw.iter().enumerate() {
            match t {
                1 => a_nodes.push(i as u32),
                2 => b_nodes.push(i as u32),
                other => {
                    return Err(BisbmError::InvalidInput(format!(
                        "node {i} has type {other}, expected 1 or 2"
                    )))
                }
            }
        }
        if a_nodes.is_empty() || b_nodes.is_empty() {
            return Err(BisbmError::InvalidInput(
                "both sides of the bipartite graph must be non-empty".into(),
            ));
        }
        let n_a = a_nodes.len();
        let n_b = b_nodes.len();
        let n = n_a + n_b;
        let mut old_to_new = vec![0u32; n];
        let mut new_to_old = vec![0u32; n];
        for (new_idx, &old_idx) in a_nodes.iter().chain(b_nodes.iter()).enumerate() {
            old_to_new[old_idx as usize] = new_idx as u32;
            new_to_old[new_idx] = old_idx;
        }
        Ok(Self {
            n_a,
            n_b,
            old_to_new,
            new_to_old,
        })
    }

    pub fn n_a(&self) -> usize {
        self.n_a
    }
    pub fn n_b(&self) -> usize {
        self.n_b
    }
    pub fn n(&self) -> usize {
        self.n_a + self.n_b
    }

    /// Side of a node in normalized indexing.
    pub fn side(&self, normalized_node: u32) -> Side {
        if (normalized_node as usize) < self.n_a {
            Side::A
        } else {
            Side::B
        }
    }

    pub fn old_to_new(&self, old: u32) -> u32 {
        self.old_to_new[old as usize]
    }

    pub fn new_to_old(&self, new: u32) -> u32 {
        self.new_to_old[new as usize]
    }

    /// Renumbers an edge list from original node indices into
    /// normalized (a-then-b) indices.
    pub fn renumber_edges(&self, raw_edges: &[Edge]) -> Vec<Edge> {
        raw_edges
            .iter()
            .map(|&(u, v)| (self.old_to_new(u), self.old_to_new(v)))
            .collect()
    }
}

/// Checks the bipartite invariant: no edge with both endpoints on the
/// same side, no self-loops. Edges are expected in normalized indexing
/// (see `TypeVec::renumber_edges`).
pub fn validate_bipartite(edges: &[Edge], types: &TypeVec) -> Result<()> {
    for &(u, v) in edges {
        if u == v {
            return Err(BisbmError::InvalidInput(format!(
                "self-loop at node {u} is not permitted"
            )));
        }
        if types.side(u) == types.side(v) {
            return Err(BisbmError::InvalidInput(format!(
                "edge ({u}, {v}) has both endpoints on the same side"
            )));
        }
    }
    Ok(())
}
