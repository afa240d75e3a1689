//! Bag-of-tasks worker pool over independent engine invocations: a
//! worker pool executes a closure `f(i) -> partition` over a range,
//! the driver then reduces by taking the minimum DL, with no shared
//! mutable state between workers.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bisbm_types::Result;
use rayon::prelude::*;

use crate::adapter::{EngineOutput, Method, PartitioningEngine};

/// Cooperative cancellation token: the driver checks it between engine
/// invocations and may terminate early.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs `n_sweeps` independent engine invocations at the same
/// `(K_a, K_b)` in parallel, each producing an independent
/// `EngineOutput`; the caller reduces by minimum DL. Skips dispatch
/// entirely (returns an empty vector) if `token` is already cancelled.
pub fn run_sweeps<E: PartitioningEngine + ?Sized>(
    engine: &E,
    n_sweeps: usize,
    edges_path: &Path,
    n_a: usize,
    n_b: usize,
    k_a: u32,
    k_b: u32,
    mb: Option<&[u32]>,
    method: Method,
    token: &CancellationToken,
) -> Vec<Result<EngineOutput>> {
    if token.is_cancelled() || n_sweeps == 0 {
        return Vec::new();
    }
    (0..n_sweeps)
        .into_par_iter()
        .map(|_| engine.run(edges_path, n_a, n_b, k_a, k_b, mb, method))
        .collect()
}
