//! Error types shared by the scheduling, transport and orchestration layers.
//!
//! Codec failures live in [`crate::libs::wire::WireError`] and are wrapped by
//! [`RoundError`].

use crate::libs::wire::WireError;
use thiserror::Error;

/// Failure of the process-group transport.
///
/// Every variant is fatal for the run: the barrier/broadcast protocol cannot
/// continue once one member has lost a message.
#[derive(Error, Debug)]
pub enum GroupError {
    /// A send, receive or collective did not complete.
    #[error("process group desynchronized on rank {rank}: {message}")]
    Desynchronized { rank: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GroupError {
    pub fn desync(rank: usize, message: impl Into<String>) -> Self {
        Self::Desynchronized {
            rank,
            message: message.into(),
        }
    }
}

/// Failure of a distributed alignment run.
#[derive(Error, Debug)]
pub enum RoundError {
    #[error(transparent)]
    Group(#[from] GroupError),

    #[error("wire codec error: {0}")]
    Wire(#[from] WireError),

    /// Leader election found no pending alignment on any process.
    #[error("no pending alignment in the whole group at iteration {iteration}")]
    NoCandidate { iteration: usize },

    /// The pairwise phase scored the same pair twice.
    #[error("pair ({a}, {b}) was scored twice")]
    DuplicatePairscore { a: i32, b: i32 },

    /// A task referenced a cluster that is not live.
    #[error("task refers to unknown cluster {index}")]
    UnknownCluster { index: i32 },

    #[error("a pool thread panicked")]
    WorkerPanicked,

    #[error("no input chains")]
    NoChains,
}
