use crate::edges::{Side, TypeVec};
use crate::error::{BisbmError, Result};

/// A node-to-block assignment, `b[i] in 0..k_a+k_b`, with labels
/// `0..k_a` reserved for side-`a` blocks and `k_a..k_a+k_b` for side-`b`
/// blocks (the block-purity invariant).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    labels: Vec<u32>,
    k_a: u32,
    k_b: u32,
}

impl Partition {
    /// Validates block purity and that every label in `0..k_a+k_b` is
    /// used by at least one node -- an unused label is rejected
    /// upstream.
    pub fn new(labels: Vec<u32>, types: &TypeVec, k_a: u32, k_b: u32) -> Result<Self> {
        if labels.len() != types.n() {
            return Err(BisbmError::InvalidInput(format!(
                "partition has {} labels, expected {}",
                labels.len(),
                types.n()
            )));
        }
        let k = k_a + k_b;
        let mut seen = vec![false; k as usize];
        for (i, &b) in labels.iter().enumerate() {
            if b >= k {
                return Err(BisbmError::InvalidInput(format!(
                    "node {i} assigned to block {b} but only {k} blocks exist"
                )));
            }
            match types.side(i as u32) {
                Side::A => {
                    if b >= k_a {
                        return Err(BisbmError::Inconsistency(format!(
                            "side-a node {i} assigned to side-b block {b}"
                        )));
                    }
                }
                Side::B => {
                    if b < k_a {
                        return Err(BisbmError::Inconsistency(format!(
                            "side-b node {i} assigned to side-a block {b}"
                        )));
                    }
                }
            }
            seen[b as usize] = true;
        }
        if let Some(empty) = seen.iter().position(|&used| !used) {
            return Err(BisbmError::InvalidInput(format!(
                "block {empty} is empty; every block must contain at least one node"
            )));
        }
        Ok(Self { labels, k_a, k_b })
    }

    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    pub fn k_a(&self) -> u32 {
        self.k_a
    }

    pub fn k_b(&self) -> u32 {
        self.k_b
    }

    pub fn k(&self) -> u32 {
        self.k_a + self.k_b
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The all-in-one-block-per-side partition used to seed `(1, 1)`.
    pub fn trivial(types: &TypeVec) -> Self {
        let labels = (0..types.n())
            .map(|i| match types.side(i as u32) {
                Side::A => 0,
                Side::B => 1,
            })
            .collect();
        Self {
            labels,
            k_a: 1,
            k_b: 1,
        }
    }

    /// The one-node-per-block partition used by the natural-merge
    /// starting point when the engine cannot supply one itself.
    pub fn singleton(types: &TypeVec) -> Self {
        let mut a_idx = 0u32;
        let mut b_idx = types.n_a() as u32;
        let labels = (0..types.n())
            .map(|i| match types.side(i as u32) {
                Side::A => {
                    let l = a_idx;
                    a_idx += 1;
                    l
                }
                Side::B => {
                    let l = b_idx;
                    b_idx += 1;
                    l
                }
            })
            .collect();
        Self {
            labels,
            k_a: types.n_a() as u32,
            k_b: types.n_b() as u32,
        }
    }

    /// Relabels by collapsing block `hi` into block `lo` (`lo < hi`,
    /// both strictly on the same side) and decrementing every label
    /// above `hi` by one, as used by the merge step of the
    /// agglomerative search.
    pub fn merge_blocks(&self, lo: u32, hi: u32) -> Self {
        debug_assert!(lo < hi);
        let same_side_a = hi < self.k_a;
        let labels = self
            .labels
            .iter()
            .map(|&b| {
                if b == hi {
                    lo
                } else if b > hi {
                    b - 1
                } else {
                    b
                }
            })
            .collect();
        let (k_a, k_b) = if same_side_a {
            (self.k_a - 1, self.k_b)
        } else {
            (self.k_a, self.k_b - 1)
        };
        Self { labels, k_a, k_b }
    }
}
