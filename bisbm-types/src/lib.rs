//! Shared data model for bipartite stochastic block model inference:
//! edge lists, type vectors, partitions, and the block-level summaries
//! (`e_rs`, `n_r`, `n_k`, `eta_rk`) that the description-length
//! evaluator and merge scorer consume.

mod edges;
mod error;
mod matrix;
mod partition;

pub use edges::{validate_bipartite, Edge, Side, TypeVec};
pub use error::{BisbmError, Result};
pub use matrix::{BlockDegreeHistogram, BlockSizes, DegreeHistogram, EdgeBlockMatrix};
pub use partition::Partition;

/// Re-exports for `use bisbm_types::prelude::*;`.
pub mod prelude {
    pub use crate::{
        validate_bipartite, BisbmError, BlockDegreeHistogram, BlockSizes, DegreeHistogram, Edge,
        EdgeBlockMatrix, Partition, Result, Side, TypeVec,
    };
}
