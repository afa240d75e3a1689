//! Stand-in `PartitioningEngine` implementations for integration
//! tests. Neither is the real MCMC/KL-style binary the adapter drives
//! in production (that stays opaque and external); both are
//! deterministic, in-process approximations good enough to exercise
//! the search driver's plumbing and, for `GreedyProfileMatchEngine`, to
//! recover planted block structure at reasonable signal-to-noise.

use std::fs;
use std::path::Path;

use bisbm_engine::{EngineOutput, Method, PartitioningEngine};
use bisbm_types::Result;

fn read_edge_list_one_indexed(path: &Path) -> Vec<(u32, u32)> {
    let contents = fs::read_to_string(path).expect("temp edge file must be readable in tests");
    contents
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|line| {
            let mut parts = line.split_whitespace();
            let u: u32 = parts.next().unwrap().parse().unwrap();
            let v: u32 = parts.next().unwrap().parse().unwrap();
            (u - 1, v - 1)
        })
        .collect()
}

fn equal_split(n: usize, k: usize, offset: u32) -> Vec<u32> {
    if k == 0 {
        return Vec::new();
    }
    let base = n / k;
    let extra = n % k;
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let boundary = extra * (base + 1);
        let block = if i < boundary {
            i / (base + 1)
        } else {
            extra + (i - boundary) / base.max(1)
        };
        labels.push(offset + block as u32);
    }
    labels
}

/// Greedy profile-matching local search: alternately reassigns each
/// node to the same-side block whose current cross-side edge profile
/// best matches the node's own neighbor-block degree profile. A
/// simplified, in-process collapsed-Gibbs-style stand-in for a real
/// MCMC/KL engine.
pub struct GreedyProfileMatchEngine {
    pub sweeps: usize,
}

impl GreedyProfileMatchEngine {
    pub fn new(sweeps: usize) -> Self {
        Self { sweeps }
    }

    fn greedy_refine(
        &self,
        edges: &[(u32, u32)],
        n_a: usize,
        n_b: usize,
        k_a: usize,
        k_b: usize,
        mut labels: Vec<u32>,
    ) -> Vec<u32> {
        let mut adj_a: Vec<Vec<u32>> = vec![Vec::new(); n_a];
        let mut adj_b: Vec<Vec<u32>> = vec![Vec::new(); n_b];
        for &(u, v) in edges {
            let (a, b) = if (u as usize) < n_a { (u, v) } else { (v, u) };
            adj_a[a as usize].push(b - n_a as u32);
            adj_b[(b - n_a as u32) as usize].push(a);
        }

        for _ in 0..self.sweeps {
            let mut e_rs = vec![vec![0u32; k_b]; k_a];
            for i in 0..n_a {
                let r = (labels[i] as usize).min(k_a - 1);
                for &j in &adj_a[i] {
                    let s = (labels[n_a + j as usize] as usize - k_a).min(k_b - 1);
                    e_rs[r][s] += 1;
                }
            }
            for i in 0..n_a {
                let mut profile = vec![0u32; k_b];
                for &j in &adj_a[i] {
                    let s = (labels[n_a + j as usize] as usize - k_a).min(k_b - 1);
                    profile[s] += 1;
                }
                let best = (0..k_a)
                    .max_by_key(|&r| profile.iter().zip(&e_rs[r]).map(|(p, e)| (*p as u64) * (*e as u64)).sum::<u64>())
                    .unwrap_or(0);
                labels[i] = best as u32;
            }
            let mut e_rs = vec![vec![0u32; k_b]; k_a];
            for i in 0..n_a {
                let r = (labels[i] as usize).min(k_a - 1);
                for &j in &adj_a[i] {
                    let s = (labels[n_a + j as usize] as usize - k_a).min(k_b - 1);
                    e_rs[r][s] += 1;
                }
            }
            for j in 0..n_b {
                let mut profile = vec![0u32; k_a];
                for &i in &adj_b[j] {
                    let r = (labels[i as usize] as usize).min(k_a - 1);
                    profile[r] += 1;
                }
                let best = (0..k_b)
                    .max_by_key(|&s| profile.iter().enumerate().map(|(r, p)| (*p as u64) * (e_rs[r][s] as u64)).sum::<u64>())
                    .unwrap_or(0);
                labels[n_a + j] = (k_a + best) as u32;
            }
        }
        labels
    }
}

impl PartitioningEngine for GreedyProfileMatchEngine {
    fn run(
        &self,
        edges_path: &Path,
        n_a: usize,
        n_b: usize,
        k_a: u32,
        k_b: u32,
        mb: Option<&[u32]>,
        method: Method,
    ) -> Result<EngineOutput> {
        let edges = read_edge_list_one_indexed(edges_path);
        let (k_a, k_b) = match method {
            Method::Natural => (k_a.max(1).min(n_a as u32).max(2.min(n_a as u32)), k_b.max(1).min(n_b as u32).max(2.min(n_b as u32))),
            Method::Standard => (k_a, k_b),
        };
        let initial = match mb {
            Some(warm) => warm.to_vec(),
            None => {
                let mut labels = equal_split(n_a, k_a as usize, 0);
                labels.extend(equal_split(n_b, k_b as usize, k_a));
                labels
            }
        };
        let labels = self.greedy_refine(&edges, n_a, n_b, k_a as usize, k_b as usize, initial);
        Ok(EngineOutput {
            partition: labels,
            k_a: if method == Method::Natural { Some(k_a) } else { None },
            k_b: if method == Method::Natural { Some(k_b) } else { None },
        })
    }
}

/// Returns a deterministic equal-split partition with no refinement,
/// used to exercise driver plumbing (bookkeeping, trace, idempotence)
/// on graphs with no planted structure, where recovery correctness is
/// not under test.
pub struct EqualSplitEngine;

impl PartitioningEngine for EqualSplitEngine {
    fn run(
        &self,
        _edges_path: &Path,
        n_a: usize,
        n_b: usize,
        k_a: u32,
        k_b: u32,
        mb: Option<&[u32]>,
        method: Method,
    ) -> Result<EngineOutput> {
        let (k_a, k_b) = match method {
            Method::Natural => (1u32.min(n_a as u32).max(1), 1u32.min(n_b as u32).max(1)),
            Method::Standard => (k_a, k_b),
        };
        let labels = match mb {
            Some(warm) => warm.to_vec(),
            None => {
                let mut labels = equal_split(n_a, k_a as usize, 0);
                labels.extend(equal_split(n_b, k_b as usize, k_a));
                labels
            }
        };
        Ok(EngineOutput {
            partition: labels,
            k_a: if method == Method::Natural { Some(k_a) } else { None },
            k_b: if method == Method::Natural { Some(k_b) } else { None },
        })
    }
}
