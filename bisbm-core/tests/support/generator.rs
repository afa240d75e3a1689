//! Synthetic planted bipartite SBM generator, used only by the
//! integration tests in this directory -- test-data generation is out
//! of scope for the shipped library itself.

use bisbm_types::Edge;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Builds a planted bipartite SBM with `k_a` equal-sized blocks on
/// side `a`, `k_b` on side `b`. Block pair `(r, s)` connects with
/// probability `p_in` when `r % k_b == s`, `p_out` otherwise, giving a
/// clear repeating assortative pattern recoverable at moderate
/// signal-to-noise. Returns `(edges, raw_types, planted_labels)` in
/// normalized (a-then-b) node order.
pub fn generate_planted_bipartite_sbm(
    n_a: usize,
    n_b: usize,
    k_a: usize,
    k_b: usize,
    p_in: f64,
    p_out: f64,
    rng: &mut ChaCha8Rng,
) -> (Vec<Edge>, Vec<u8>, Vec<u32>) {
    let block_of = |i: usize, n: usize, k: usize| -> usize {
        let base = n / k;
        let extra = n % k;
        let boundary = extra * (base + 1);
        if i < boundary {
            i / (base + 1)
        } else {
            extra + (i - boundary) / base
        }
    };

    let a_block: Vec<usize> = (0..n_a).map(|i| block_of(i, n_a, k_a)).collect();
    let b_block: Vec<usize> = (0..n_b).map(|i| block_of(i, n_b, k_b)).collect();

    let mut edges = Vec::new();
    for i in 0..n_a {
        for j in 0..n_b {
            let p = if a_block[i] % k_b == b_block[j] { p_in } else { p_out };
            if rng.gen::<f64>() < p {
                edges.push((i as u32, (n_a + j) as u32));
            }
        }
    }

    let mut raw_types = vec![1u8; n_a];
    raw_types.extend(std::iter::repeat(2u8).take(n_b));

    let mut labels = vec![0u32; n_a + n_b];
    for i in 0..n_a {
        labels[i] = a_block[i] as u32;
    }
    for j in 0..n_b {
        labels[n_a + j] = (k_a + b_block[j]) as u32;
    }

    (edges, raw_types, labels)
}
