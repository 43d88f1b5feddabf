//! # Memory Context Error Types
//!
//! All errors that can occur while carving, recycling or addressing chunks.

use thiserror::Error;

use crate::memory::ArenaId;

/// Errors that can occur in the memory context system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    /// Requested size was zero, negative or not representable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Allocate or free was called before any arena was made active.
    #[error("no active arena")]
    NoActiveArena,

    /// The active arena has already been destroyed.
    #[error("arena {0} has been destroyed")]
    DestroyedArena(ArenaId),

    /// The handle does not name an arena in this context.
    #[error("unknown arena: {0}")]
    UnknownArena(ArenaId),

    /// Bounded free-list is full.
    #[error("free-list overflow: capacity {capacity}")]
    FreeListOverflow {
        /// Configured free-list capacity.
        capacity: usize,
    },

    /// A chunk was freed while a different arena was active.
    #[error("cross-arena free: chunk owned by {owner}, active arena is {active}")]
    CrossArenaFree {
        /// Arena that carved the chunk.
        owner: ArenaId,
        /// Arena the free was issued against.
        active: ArenaId,
    },

    /// The chunk reference predates the last reset of its arena.
    #[error("stale chunk reference: epoch {found}, arena is at epoch {current}")]
    StaleChunk {
        /// Epoch carried by the reference.
        found: u64,
        /// Current epoch of the arena.
        current: u64,
    },

    /// The chunk is already on the free-list.
    #[error("double free of chunk {index}")]
    DoubleFree {
        /// Chunk index within its arena.
        index: u32,
    },

    /// The reference does not name a chunk of this arena.
    #[error("unknown chunk {index} in arena {arena}")]
    UnknownChunk {
        /// Arena the lookup was made against.
        arena: ArenaId,
        /// Chunk index that was not found.
        index: u32,
    },

    /// The free-list held an index with no chunk behind it.
    ///
    /// Only reachable in unchecked mode after a cross-arena free.
    #[error("corrupt free-list entry: chunk {index} does not exist")]
    CorruptFreeList {
        /// The discarded free-list entry.
        index: u32,
    },

    /// Byte storage could not grow to fit the chunk.
    #[error("out of memory: cannot carve {requested} bytes")]
    OutOfMemory {
        /// Payload size that was requested.
        requested: usize,
    },

    /// Invalid configuration file or value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for memory context operations.
pub type ArenaResult<T> = Result<T, ArenaError>;
