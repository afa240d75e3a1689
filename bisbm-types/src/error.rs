use thiserror::Error;

/// Error kinds surfaced by the bisbm-mdl stack.
///
/// An overshoot past the adaptive merge threshold has no variant here:
/// it is an internal signal handled by the search driver's threshold
/// shrinkage and never reaches a caller.
#[derive(Debug, Error)]
pub enum BisbmError {
    /// Malformed or out-of-domain caller input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The external partitioning engine exited non-zero or returned
    /// output that could not be parsed into a partition.
    #[error("engine failure at (K_a={k_a}, K_b={k_b}) running `{command}`: {reason}")]
    EngineFailure {
        k_a: u32,
        k_b: u32,
        command: String,
        reason: String,
    },

    /// An internal invariant was violated. Indicates a bug, not bad
    /// caller data; should not normally be caught and handled.
    #[error("internal invariant violated: {0}")]
    Inconsistency(String),

    /// A scoped resource (temp file, memory-mapped cache) could not be
    /// acquired or released.
    #[error("resource error: {0}")]
    Resource(String),
}

pub type Result<T> = std::result::Result<T, BisbmError>;
