//! # Free List
//!
//! Per-arena stack of chunk indices available for reuse.

use crate::config::FreeListPolicy;
use crate::error::{ArenaError, ArenaResult};

/// Stack of recycled chunk indices.
///
/// Holds indices into the owning arena's chunk table, never the chunks
/// themselves, so releasing the arena releases everything exactly once.
#[derive(Debug)]
pub struct FreeList {
    /// Indices, top of stack last.
    slots: Vec<u32>,
    /// Storage policy.
    policy: FreeListPolicy,
}

impl FreeList {
    /// Creates an empty free-list.
    ///
    /// Storage grows on push for both policies; a bound only caps the length.
    #[must_use]
    pub fn new(policy: FreeListPolicy) -> Self {
        Self {
            slots: Vec::new(),
            policy,
        }
    }

    /// Storage policy.
    #[inline]
    #[must_use]
    pub const fn policy(&self) -> FreeListPolicy {
        self.policy
    }

    /// Number of chunks waiting for reuse.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if nothing is available for reuse.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Index on top of the stack, if any.
    #[inline]
    #[must_use]
    pub fn peek(&self) -> Option<u32> {
        self.slots.last().copied()
    }

    /// Pushes a chunk index.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::FreeListOverflow`] if a bounded list is full.
    /// The list is unchanged in that case.
    pub fn push(&mut self, index: u32) -> ArenaResult<()> {
        if let FreeListPolicy::Bounded { capacity } = self.policy {
            if self.slots.len() >= capacity {
                return Err(ArenaError::FreeListOverflow { capacity });
            }
        }
        self.slots.push(index);
        Ok(())
    }

    /// Pops the top index.
    #[inline]
    pub fn pop(&mut self) -> Option<u32> {
        self.slots.pop()
    }

    /// Empties the list, keeping its storage.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
