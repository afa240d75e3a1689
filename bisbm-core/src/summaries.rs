//! Bipartite graph summaries. Builds `e_{rs}`, `n_r`, `n_k`, and
//! `eta_{rk}` from an edge list and a partition.

use bisbm_types::{BlockDegreeHistogram, BlockSizes, DegreeHistogram, Edge, EdgeBlockMatrix};

/// `assemble_e_rs`. Sparse coordinate accumulation followed by
/// densification, so the `K = N` (one-node-per-block) case doesn't
/// force a dense `K x K` scratch matrix to dominate memory during
/// construction.
pub fn assemble_e_rs(edges: &[Edge], labels: &[u32]) -> EdgeBlockMatrix {
    let k = labels.iter().copied().max().map(|m| m as usize + 1).unwrap_or(0);
    let mut coo = rustc_hash::FxHashMap::default();
    for &(u, v) in edges {
        let r = labels[u as usize] as usize;
        let s = labels[v as usize] as usize;
        *coo.entry((r, s)).or_insert(0u64) += 1;
        *coo.entry((s, r)).or_insert(0u64) += 1;
    }
    let mut m = EdgeBlockMatrix::zeros(k);
    for ((r, s), count) in coo {
        m.set(r, s, count);
    }
    m
}

/// `assemble_n_r`: block-size vector, single pass over labels.
pub fn assemble_n_r(labels: &[u32]) -> BlockSizes {
    let k = labels.iter().copied().max().map(|m| m as usize + 1).unwrap_or(0);
    let mut n_r = vec![0u64; k];
    for &b in labels {
        n_r[b as usize] += 1;
    }
    n_r
}

/// Per-node degree, computed once and reused by both `assemble_n_k`
/// and `assemble_eta_rk` so that callers needing both summaries (the
/// driver always does) don't pay for the edge scan twice.
pub fn node_degrees(n: usize, edges: &[Edge]) -> Vec<u64> {
    let mut deg = vec![0u64; n];
    for &(u, v) in edges {
        deg[u as usize] += 1;
        deg[v as usize] += 1;
    }
    deg
}

/// `assemble_n_k`: degree histogram over all nodes.
pub fn assemble_n_k(degrees: &[u64]) -> DegreeHistogram {
    let max_deg = degrees.iter().copied().max().unwrap_or(0) as usize;
    let mut n_k = vec![0u64; max_deg + 1];
    for &d in degrees {
        n_k[d as usize] += 1;
    }
    n_k
}

/// `assemble_eta_rk`: per-block degree histogram.
pub fn assemble_eta_rk(labels: &[u32], degrees: &[u64]) -> BlockDegreeHistogram {
    let k = labels.iter().copied().max().map(|m| m as usize + 1).unwrap_or(0);
    let mut eta = BlockDegreeHistogram::new(k);
    for (i, &b) in labels.iter().enumerate() {
        eta.record(b as usize, degrees[i] as usize);
    }
    eta
}

/// Bundles the four block summaries computed from a single edge/label
/// pass, as consumed together by the description-length evaluator and
/// the merge scorer.
pub struct BlockSummary {
    pub e_rs: EdgeBlockMatrix,
    pub n_r: BlockSizes,
    pub n_k: DegreeHistogram,
    pub eta_rk: BlockDegreeHistogram,
}

impl BlockSummary {
    /// Builds all four summaries, verifying they agree on `K` (spec
    /// §4.2: "all four must agree on `K`").
    pub fn build(n: usize, edges: &[Edge], labels: &[u32]) -> Self {
        let degrees = node_degrees(n, edges);
        let e_rs = assemble_e_rs(edges, labels);
        let n_r = assemble_n_r(labels);
        let n_k = assemble_n_k(&degrees);
        let eta_rk = assemble_eta_rk(labels, &degrees);
        debug_assert_eq!(e_rs.k(), n_r.len());
        debug_assert_eq!(e_rs.k(), eta_rk.k());
        Self {
            e_rs,
            n_r,
            n_k,
            eta_rk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nine_node_example_matches_hand_count() {
        let edges: Vec<Edge> = vec![
            (0, 3),
            (0, 4),
            (0, 5),
            (1, 3),
            (1, 4),
            (1, 5),
            (2, 6),
            (2, 7),
            (2, 8),
        ];
        let labels = vec![0u32, 0, 0, 1, 1, 1, 1, 1, 1];
        let summary = BlockSummary::build(9, &edges, &labels);
        assert_eq!(summary.e_rs.get(0, 1), 9);
        assert_eq!(summary.e_rs.get(1, 0), 9);
        assert_eq!(summary.e_rs.total(), 18);
        assert_eq!(summary.n_r, vec![3, 6]);
    }

    #[test]
    fn degree_histogram_sums_to_node_count() {
        let edges: Vec<Edge> = vec![(0, 2), (1, 2), (1, 3)];
        let labels = vec![0u32, 0, 1, 1];
        let summary = BlockSummary::build(4, &edges, &labels);
        let total: u64 = summary.n_k.iter().sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn eta_rk_sums_to_block_size_per_block() {
        let edges: Vec<Edge> = vec![(0, 2), (1, 2), (1, 3)];
        let labels = vec![0u32, 0, 1, 1];
        let summary = BlockSummary::build(4, &edges, &labels);
        for r in 0..summary.e_rs.k() {
            let sum: u64 = summary.eta_rk.block(r).iter().sum();
            assert_eq!(sum, summary.n_r[r]);
        }
    }
}
