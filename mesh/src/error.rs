//! Error types for mesh operations.

use thiserror::Error;

use crate::MessageKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("link to rank {peer} is closed")]
    ChannelClosed { peer: usize },

    #[error("{kind} message from rank {peer} has {actual} values, expected {expected}")]
    LengthMismatch {
        peer: usize,
        kind: MessageKind,
        expected: usize,
        actual: usize,
    },

    #[error("rank {rank} is outside a world of size {world_size}")]
    InvalidRank { rank: usize, world_size: usize },

    #[error("invalid mesh configuration: {0}")]
    InvalidConfig(String),

    #[error("transfer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("rank {rank} panicked")]
    RankPanicked { rank: usize },
}
