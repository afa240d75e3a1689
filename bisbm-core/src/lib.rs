//! Description-length evaluation and the agglomerative `(K_a, K_b)`
//! search. `bisbm-engine` supplies the opaque external partitioning
//! engine this crate drives; `bisbm-types` supplies the shared data
//! model.

mod bookkeeping;
mod driver;
mod entropy;
mod merge;
mod qcache;
mod summaries;

pub use bookkeeping::{Bookkeeping, Origin, TraceEntry, TraceKind};
pub use driver::{DriverConfig, SearchDriver, Summary};
pub use entropy::{description_length, DegreePrior, DescriptionLength, DlInputs};
pub use merge::{best_merge, merge_is_forbidden, same_type, virtual_merge_delta};
pub use qcache::QCache;
pub use summaries::{assemble_e_rs, assemble_eta_rk, assemble_n_k, assemble_n_r, node_degrees, BlockSummary};

pub mod prelude {
    pub use crate::{
        DegreePrior, DescriptionLength, DlInputs, DriverConfig, QCache, SearchDriver, Summary,
    };
}
