//! # Chunks
//!
//! Chunk headers and the references handed out to callers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{ArenaError, ArenaResult};

/// Payload offsets are padded to this many bytes.
pub const WORD_SIZE: usize = std::mem::size_of::<usize>();

static NEXT_ARENA_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique arena identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaId(u64);

impl ArenaId {
    pub(crate) fn next() -> Self {
        Self(NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "arena#{}", self.0)
    }
}

/// Reference to a chunk's payload.
///
/// Two allocations that return equal `ChunkRef`s share the same payload
/// region. The reference is plain data: it cannot dangle, an arena simply
/// rejects it once it no longer describes a live chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkRef {
    pub(crate) arena: ArenaId,
    pub(crate) epoch: u64,
    pub(crate) index: u32,
}

impl ChunkRef {
    /// Arena that carved this chunk.
    #[inline]
    #[must_use]
    pub const fn arena(&self) -> ArenaId {
        self.arena
    }

    /// Position of the chunk in carve order.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }
}

/// Bookkeeping for one carved chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkHeader {
    requested_size: usize,
    owner: ArenaId,
    offset: usize,
    in_use: bool,
}

impl ChunkHeader {
    pub(crate) const fn new(requested_size: usize, owner: ArenaId, offset: usize) -> Self {
        Self {
            requested_size,
            owner,
            offset,
            in_use: true,
        }
    }

    /// Size the chunk was carved with. Never shrinks on reuse.
    #[inline]
    #[must_use]
    pub const fn requested_size(&self) -> usize {
        self.requested_size
    }

    /// Arena that carved the chunk. Used for validation only.
    #[inline]
    #[must_use]
    pub const fn owner(&self) -> ArenaId {
        self.owner
    }

    /// Byte offset of the payload inside the arena's storage.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Whether a caller currently holds this chunk.
    #[inline]
    #[must_use]
    pub const fn in_use(&self) -> bool {
        self.in_use
    }

    #[inline]
    pub(crate) fn set_in_use(&mut self, in_use: bool) {
        self.in_use = in_use;
    }

    /// Payload byte range within arena storage.
    #[inline]
    pub(crate) const fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.requested_size
    }
}

/// Converts a caller-supplied size into a positive byte count.
pub(crate) fn checked_size<S>(size: S) -> ArenaResult<usize>
where
    S: TryInto<usize> + fmt::Display + Copy,
{
    match size.try_into() {
        Ok(0) | Err(_) => Err(ArenaError::InvalidArgument(format!(
            "size must be a positive integer, got {size}"
        ))),
        Ok(bytes) => Ok(bytes),
    }
}

/// Rounds `len` up to the next word boundary.
#[inline]
pub(crate) const fn word_align(len: usize) -> Option<usize> {
    match len.checked_add(WORD_SIZE - 1) {
        Some(padded) => Some(padded & !(WORD_SIZE - 1)),
        None => None,
    }
}
