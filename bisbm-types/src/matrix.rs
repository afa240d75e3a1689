use crate::error::{BisbmError, Result};

/// `e_{rs}`: the `K x K` block-edge-count matrix, stored row-major
/// and flattened into a single `Vec` rather than `Vec<Vec<_>>`, to
/// keep one contiguous allocation per candidate `(K_a, K_b)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeBlockMatrix {
    k: usize,
    counts: Vec<u64>,
}

impl EdgeBlockMatrix {
    pub fn zeros(k: usize) -> Self {
        Self {
            k,
            counts: vec![0; k * k],
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn get(&self, r: usize, s: usize) -> u64 {
        self.counts[r * self.k + s]
    }

    #[inline]
    pub fn set(&mut self, r: usize, s: usize, v: u64) {
        self.counts[r * self.k + s] = v;
    }

    /// `e_r`: row sums, i.e. the block-degree vector.
    pub fn row_sums(&self) -> Vec<u64> {
        (0..self.k)
            .map(|r| (0..self.k).map(|s| self.get(r, s)).sum())
            .collect()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Checks symmetry and total-edge-count invariants. `two_m` is
    /// `2 * |E|`.
    pub fn validate(&self, two_m: u64) -> Result<()> {
        for r in 0..self.k {
            for s in 0..self.k {
                if self.get(r, s) != self.get(s, r) {
                    return Err(BisbmError::Inconsistency(format!(
                        "e_rs not symmetric at ({r}, {s}): {} != {}",
                        self.get(r, s),
                        self.get(s, r)
                    )));
                }
            }
        }
        let total = self.total();
        if total != two_m {
            return Err(BisbmError::Inconsistency(format!(
                "sum(e_rs) = {total}, expected 2|E| = {two_m}"
            )));
        }
        Ok(())
    }
}

/// `n_r`: block-size vector, length `K`.
pub type BlockSizes = Vec<u64>;

/// `n_k`: degree histogram, indexed by degree.
pub type DegreeHistogram = Vec<u64>;

/// `eta_{rk}`: degree-by-block histogram. `eta[r][k]` = number of
/// degree-`k` nodes in block `r`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDegreeHistogram {
    per_block: Vec<DegreeHistogram>,
}

impl BlockDegreeHistogram {
    pub fn new(k: usize) -> Self {
        Self {
            per_block: vec![Vec::new(); k],
        }
    }

    /// Records one node of the given degree in block `r`, growing the
    /// per-block histogram as needed.
    pub fn record(&mut self, r: usize, degree: usize) {
        let hist = &mut self.per_block[r];
        if hist.len() <= degree {
            hist.resize(degree + 1, 0);
        }
        hist[degree] += 1;
    }

    pub fn block(&self, r: usize) -> &[u64] {
        &self.per_block[r]
    }

    pub fn k(&self) -> usize {
        self.per_block.len()
    }
}
