//! The description-length evaluator. Combines the adjacency,
//! partition, degree, and edge-count entropy terms into a single
//! scalar `DL`, reported as four separately-labeled components for
//! `summary()`.

use bisbm_types::{BlockDegreeHistogram, BlockSizes, DegreeHistogram, Edge, EdgeBlockMatrix};
use rustc_hash::FxHashMap;

use crate::qcache::QCache;

/// Choice of prior for the node partition and the degree sequence;
/// a configuration choice rather than a fixed formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegreePrior {
    /// Default: degree sequence drawn conditioned on the per-block
    /// degree histogram, itself from a uniform hyperprior.
    Distributed,
    /// Non-informative prior over all degree sequences with the given
    /// block-degree totals.
    Uniform,
}

impl Default for DegreePrior {
    fn default() -> Self {
        DegreePrior::Distributed
    }
}

/// `DL = S_adj + S_partition + S_edges + S_deg`, reported as four
/// separate components (`summary().DL`).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct DescriptionLength {
    pub adjacency: f64,
    pub partition: f64,
    pub edges: f64,
    pub degree: f64,
}

impl DescriptionLength {
    pub fn total(&self) -> f64 {
        self.adjacency + self.partition + self.edges + self.degree
    }
}

fn log_gamma(x: f64) -> f64 {
    statrs::function::gamma::ln_gamma(x)
}

/// `logC(n, k) = logΓ(n+1) − logΓ(k+1) − logΓ(n−k+1)`, extended to
/// `n < 0` or `k < 0` by returning `0` (the convention `0*log 0 = 0`).
fn log_binom(n: f64, k: f64) -> f64 {
    if n < 0.0 || k < 0.0 || k > n {
        return 0.0;
    }
    log_gamma(n + 1.0) - log_gamma(k + 1.0) - log_gamma(n - k + 1.0)
}

/// `log(double-factorial)(m)`: a closed form split on the parity of
/// `m`. `m = 0` is the empty product, `log 1 = 0`.
fn log_double_factorial(m: u64) -> f64 {
    if m == 0 {
        return 0.0;
    }
    let mf = m as f64;
    if m % 2 == 1 {
        log_gamma(mf + 1.0) - log_gamma((mf - 1.0) / 2.0 + 1.0) - (mf - 1.0) / 2.0 * 2f64.ln()
    } else {
        log_gamma(mf / 2.0 + 1.0) + (mf / 2.0) * 2f64.ln()
    }
}

/// The `Σ_{i,j: m_ij>1} logΓ(m_ij+1)` / `Σ_{i: m_ii>1} logdf(m_ii)`
/// parallel-edge correction, computed directly from the node-level
/// edge list rather than the block-level `e_rs` (multiple edges
/// between the same pair of nodes can land in the same block pair
/// without being parallel at the node level, and vice versa).
fn multi_edge_correction(edges: &[Edge]) -> f64 {
    let mut counts: FxHashMap<(u32, u32), u64> = FxHashMap::default();
    for &(u, v) in edges {
        let key = if u <= v { (u, v) } else { (v, u) };
        *counts.entry(key).or_insert(0) += 1;
    }
    let mut total = 0.0;
    for ((u, v), m) in counts {
        if m <= 1 {
            continue;
        }
        if u == v {
            total += log_double_factorial(m);
        } else {
            total += log_gamma(m as f64 + 1.0);
        }
    }
    total
}

/// Adjacency term: microcanonical degree-corrected multigraph
/// entropy.
fn adjacency_entropy(e_rs: &EdgeBlockMatrix, n_k: &DegreeHistogram, edges: &[Edge]) -> f64 {
    let k = e_rs.k();
    let mut s = 0.0;
    for r in 0..k {
        for c in (r + 1)..k {
            s -= log_gamma(e_rs.get(r, c) as f64 + 1.0);
        }
        s -= log_double_factorial(e_rs.get(r, r));
    }
    for &e_r in &e_rs.row_sums() {
        s += log_gamma(e_r as f64 + 1.0);
    }
    s += multi_edge_correction(edges);
    for (k_deg, &n) in n_k.iter().enumerate() {
        if n == 0 {
            continue;
        }
        s -= n as f64 * log_gamma(k_deg as f64 + 1.0);
    }
    s
}

/// Bipartite partition term.
fn partition_entropy_bipartite(n_a: usize, n_b: usize, k_a: u32, k_b: u32, n_r: &BlockSizes) -> f64 {
    let mut s = log_binom(n_a as f64 - 1.0, k_a as f64 - 1.0)
        + log_binom(n_b as f64 - 1.0, k_b as f64 - 1.0)
        + log_gamma(n_a as f64 + 1.0)
        + log_gamma(n_b as f64 + 1.0);
    for &n in n_r {
        s -= log_gamma(n as f64 + 1.0);
    }
    s += (n_a as f64).ln() + (n_b as f64).ln();
    s
}

/// Non-bipartite fallback partition term.
fn partition_entropy_flat(n: usize, k: u32, n_r: &BlockSizes) -> f64 {
    let mut s = log_binom(k as f64 + n as f64 - 1.0, n as f64) + log_gamma(n as f64 + 1.0);
    for &nr in n_r {
        s -= log_gamma(nr as f64 + 1.0);
    }
    s += (n as f64).ln();
    s
}

/// Edge-count term. `x = K_a * K_b` under the bipartite prior,
/// `x = K(K+1)/2` under the flat prior.
fn edge_count_entropy(x: f64, e: usize) -> f64 {
    log_binom(x + e as f64 - 1.0, e as f64)
}

/// Degree term under the `distributed` prior (the default).
fn degree_entropy_distributed(
    e_rs: &EdgeBlockMatrix,
    n_r: &BlockSizes,
    eta_rk: &BlockDegreeHistogram,
    q: &QCache,
) -> f64 {
    let e_r = e_rs.row_sums();
    let mut s = 0.0;
    for r in 0..e_rs.k() {
        s += q.log_q(e_r[r] as i64, n_r[r] as i64);
        s += log_gamma(n_r[r] as f64 + 1.0);
        for &eta in eta_rk.block(r) {
            if eta == 0 {
                continue;
            }
            s -= log_gamma(eta as f64 + 1.0);
        }
    }
    s
}

/// Degree term under the `uniform` prior.
fn degree_entropy_uniform(e_rs: &EdgeBlockMatrix, n_r: &BlockSizes) -> f64 {
    let e_r = e_rs.row_sums();
    let mut s = 0.0;
    for r in 0..e_rs.k() {
        s += log_binom(n_r[r] as f64 + e_r[r] as f64 - 1.0, e_r[r] as f64);
    }
    s
}

/// Full context needed to evaluate `DL` at one candidate `(K_a, K_b)`.
pub struct DlInputs<'a> {
    pub n_a: usize,
    pub n_b: usize,
    pub e: usize,
    pub k_a: u32,
    pub k_b: u32,
    pub edges: &'a [Edge],
    pub e_rs: &'a EdgeBlockMatrix,
    pub n_r: &'a BlockSizes,
    pub n_k: &'a DegreeHistogram,
    pub eta_rk: &'a BlockDegreeHistogram,
    pub is_bipartite: bool,
    pub prior: DegreePrior,
}

/// Computes `DL = S_adj + S_partition + S_edges + S_deg` for one
/// candidate `(K_a, K_b)`.
pub fn description_length(inputs: &DlInputs, q: &QCache) -> DescriptionLength {
    let adjacency = adjacency_entropy(inputs.e_rs, inputs.n_k, inputs.edges);

    let partition = if inputs.is_bipartite {
        partition_entropy_bipartite(inputs.n_a, inputs.n_b, inputs.k_a, inputs.k_b, inputs.n_r)
    } else {
        let n = inputs.n_a + inputs.n_b;
        let k = inputs.k_a + inputs.k_b;
        partition_entropy_flat(n, k, inputs.n_r)
    };

    let edges = if inputs.is_bipartite {
        edge_count_entropy((inputs.k_a as f64) * (inputs.k_b as f64), inputs.e)
    } else {
        let k = (inputs.k_a + inputs.k_b) as f64;
        edge_count_entropy(k * (k + 1.0) / 2.0, inputs.e)
    };

    let degree = match inputs.prior {
        DegreePrior::Distributed => {
            degree_entropy_distributed(inputs.e_rs, inputs.n_r, inputs.eta_rk, q)
        }
        DegreePrior::Uniform => degree_entropy_uniform(inputs.e_rs, inputs.n_r),
    };

    DescriptionLength {
        adjacency,
        partition,
        edges,
        degree,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summaries::BlockSummary;
    use approx::assert_relative_eq;

    fn nine_node_example() -> (Vec<Edge>, Vec<u32>) {
        let edges = vec![
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
        (edges, labels)
    }

    #[test]
    fn nine_node_example_mdl() {
        let (edges, labels) = nine_node_example();
        let summary = BlockSummary::build(9, &edges, &labels);
        let q = QCache::build(edges.len());
        let inputs = DlInputs {
            n_a: 3,
            n_b: 6,
            e: edges.len(),
            k_a: 1,
            k_b: 1,
            edges: &edges,
            e_rs: &summary.e_rs,
            n_r: &summary.n_r,
            n_k: &summary.n_k,
            eta_rk: &summary.eta_rk,
            is_bipartite: true,
            prior: DegreePrior::Distributed,
        };
        let dl = description_length(&inputs, &q);
        assert_relative_eq!(dl.total(), 15.6152, max_relative = 1e-3);
    }

    #[test]
    fn dl_is_invariant_under_block_relabeling() {
        // A partition with two blocks per side, so a non-trivial
        // same-side bijection actually moves nodes between labels
        // relabeling via any bijection of same-type labels should
        // leave the total DL unchanged.
        let edges: Vec<Edge> = vec![
            (0, 4),
            (0, 5),
            (1, 4),
            (1, 6),
            (2, 6),
            (2, 7),
            (3, 7),
            (3, 5),
        ];
        // side a: nodes 0,1 -> block 0; 2,3 -> block 1.
        // side b: nodes 4,5 -> block 2; 6,7 -> block 3.
        let labels = vec![0u32, 0, 1, 1, 2, 2, 3, 3];
        let summary = BlockSummary::build(8, &edges, &labels);
        let q = QCache::build(edges.len());
        let inputs = DlInputs {
            n_a: 4,
            n_b: 4,
            e: edges.len(),
            k_a: 2,
            k_b: 2,
            edges: &edges,
            e_rs: &summary.e_rs,
            n_r: &summary.n_r,
            n_k: &summary.n_k,
            eta_rk: &summary.eta_rk,
            is_bipartite: true,
            prior: DegreePrior::Distributed,
        };
        let dl_a = description_length(&inputs, &q);

        // Relabel: swap block 0 <-> 1 on side a, and block 2 <-> 3 on
        // side b. Same partition, different (but bijective) labels.
        let relabeled: Vec<u32> = labels
            .iter()
            .map(|&b| match b {
                0 => 1,
                1 => 0,
                2 => 3,
                3 => 2,
                other => other,
            })
            .collect();
        let summary2 = BlockSummary::build(8, &edges, &relabeled);
        let inputs2 = DlInputs {
            e_rs: &summary2.e_rs,
            n_r: &summary2.n_r,
            n_k: &summary2.n_k,
            eta_rk: &summary2.eta_rk,
            ..inputs
        };
        let dl_b = description_length(&inputs2, &q);
        assert_relative_eq!(dl_a.total(), dl_b.total(), max_relative = 1e-9);
    }

    #[test]
    fn log_double_factorial_matches_small_values() {
        // 0!! = 1, 1!! = 1, 2!! = 2, 3!! = 3, 4!! = 8, 5!! = 15.
        let expected = [1.0_f64, 1.0, 2.0, 3.0, 8.0, 15.0];
        for (m, &want) in expected.iter().enumerate() {
            let got = log_double_factorial(m as u64).exp();
            assert_relative_eq!(got, want, max_relative = 1e-6);
        }
    }
}
