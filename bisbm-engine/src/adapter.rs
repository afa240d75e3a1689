//! The typed engine-adapter contract. `PartitioningEngine` is the
//! opaque boundary the search driver (`bisbm-core`) calls through;
//! `ProcessEngine` is the one concrete implementation that spawns an
//! external MCMC/KL-style binary over its CLI contract.

use std::path::Path;

use bisbm_types::Result;

/// Whether the engine is asked to partition at a fixed `(K_a, K_b)`
/// (`Standard`) or to pick its own starting `(K_a, K_b)` greedily from
/// one-node-per-block (`Natural`, used at search initialization).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Standard,
    Natural,
}

/// One engine invocation's result. `k_a`/`k_b` are only populated in
/// `Method::Natural` mode, where the engine reports its own chosen
/// block counts as the first two tokens ahead of the partition vector.
#[derive(Debug, Clone)]
pub struct EngineOutput {
    pub partition: Vec<u32>,
    pub k_a: Option<u32>,
    pub k_b: Option<u32>,
}

/// The opaque external-partitioning-engine contract:
/// `engine(edges_file, n_a, n_b, K_a, K_b, mb?, method?) -> partition`.
///
/// Implementations must be pure w.r.t. caller state so that
/// `bisbm_engine::pool` can run them concurrently with no shared
/// mutable state.
pub trait PartitioningEngine: Send + Sync {
    fn run(
        &self,
        edges_path: &Path,
        n_a: usize,
        n_b: usize,
        k_a: u32,
        k_b: u32,
        mb: Option<&[u32]>,
        method: Method,
    ) -> Result<EngineOutput>;
}
