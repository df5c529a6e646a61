//! Error taxonomy for the forward propagation phase
//!
//! Nothing here is transient: a failure is either a misconfiguration caught
//! before any work starts, or an upstream stage handing us data that breaks
//! an invariant. Both abort the pass; the caller restarts the phase.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Phase1Error>;

#[derive(Debug, Error)]
pub enum Phase1Error {
    /// Parameters that cannot work together
    #[error("invalid phase 1 configuration: {0}")]
    Config(String),

    /// Mixing and matching only exist for tables 2 to 7
    #[error("table index {0} is outside 2..=7")]
    InvalidTable(u8),

    /// The input stream was not sorted by `y`
    #[error(
        "input not sorted: bucket index {index} seen after {current} (stream position {position})"
    )]
    UnsortedInput { index: u64, current: u64, position: u64 },

    #[error("output sink failed: {0}")]
    Sink(#[from] anyhow::Error),

    #[error("pipeline thread '{0}' panicked")]
    WorkerPanicked(&'static str),

    #[error("failed to spawn pipeline thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Phase1Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Phase1Error::Config(msg.into())
    }
}
