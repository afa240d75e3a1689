//! The virtual-merge scorer. Computes the closed-form `ΔS` for
//! collapsing two same-type blocks of `e_{rs}` without materializing
//! the merged matrix.

use bisbm_types::EdgeBlockMatrix;

fn log_gamma(x: f64) -> f64 {
    statrs::function::gamma::ln_gamma(x)
}

/// `Δ` for merging block `p` into block `q` (`p != q`, same type,
/// enforced by the caller): the change in the block-level adjacency +
/// edge-count contribution to the DL that collapsing rows/columns `p`
/// and `q` of `e_rs` would cause. A smaller (more negative, or least
/// positive) `Δ` is a cheaper merge.
pub fn virtual_merge_delta(e_rs: &EdgeBlockMatrix, p: usize, q: usize) -> f64 {
    let k = e_rs.k();
    let mut delta = 0.0;
    for s in 0..k {
        if s == p || s == q {
            continue;
        }
        let combined = e_rs.get(p, s) + e_rs.get(q, s);
        delta -= log_gamma(combined as f64 + 1.0);
        delta += log_gamma(e_rs.get(p, s) as f64 + 1.0);
        delta += log_gamma(e_rs.get(q, s) as f64 + 1.0);
    }
    let e_p: u64 = (0..k).map(|s| e_rs.get(p, s)).sum();
    let e_q: u64 = (0..k).map(|s| e_rs.get(q, s)).sum();
    delta += log_gamma(e_p as f64 + e_q as f64 + 1.0);
    delta -= log_gamma(e_p as f64 + 1.0);
    delta -= log_gamma(e_q as f64 + 1.0);
    delta
}

/// Whether merging `p` into `q` is forbidden by the emptiness guard:
/// merging would collapse the last remaining block on one side to
/// zero.
pub fn merge_is_forbidden(p: usize, q: usize, k_a: u32, k_b: u32) -> bool {
    let (lo, hi) = (p.min(q), p.max(q));
    let same_side_a = (hi as u32) < k_a;
    if same_side_a {
        k_a == 1
    } else {
        debug_assert!(lo as u32 >= k_a || hi as u32 >= k_a);
        k_b == 1
    }
}

/// Whether `p` and `q` are on the same side of the bipartite
/// partition, i.e. both `< k_a` or both `>= k_a`: candidate merge
/// pairs must be same-type.
pub fn same_type(p: usize, q: usize, k_a: u32) -> bool {
    (p < k_a as usize) == (q < k_a as usize)
}

/// Picks the candidate pair with minimum `Δ` from a deduplicated pool.
/// Returns `None` if the pool is empty.
pub fn best_merge(
    e_rs: &EdgeBlockMatrix,
    candidates: &[(usize, usize)],
) -> Option<(f64, (usize, usize))> {
    candidates
        .iter()
        .map(|&(p, q)| (virtual_merge_delta(e_rs, p, q), (p, q)))
        .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
}
