//! Typed adapter over the external bipartite-SBM partitioning engine,
//! plus the ambient machinery around it: cooling-schedule
//! configuration, scoped temp files, and a rayon-backed worker pool
//! that maps a closure over indices.

mod adapter;
mod cooling;
mod pool;
mod process;
mod tempfiles;

pub use adapter::{EngineOutput, Method, PartitioningEngine};
pub use cooling::{CoolingKind, CoolingSchedule};
pub use pool::{run_sweeps, CancellationToken};
pub use process::{EngineOptions, ProcessEngine};
pub use tempfiles::{EdgeListTempFile, EngineScratch};
