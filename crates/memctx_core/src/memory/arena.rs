//! # Arena
//!
//! A memory context: every chunk carved from it lives until the arena is
//! reset or destroyed, and freed chunks are recycled without returning
//! memory to the system allocator.

use std::fmt;

use crate::config::{ArenaConfig, OwnershipCheck};
use crate::error::{ArenaError, ArenaResult};
use crate::memory::chunk::{checked_size, word_align, ArenaId, ChunkHeader, ChunkRef};
use crate::memory::free_list::FreeList;

/// Snapshot of an arena's bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Chunks carved since creation or the last reset.
    pub chunks: usize,
    /// Chunks currently held by callers.
    pub in_use_chunks: usize,
    /// Chunks waiting on the free-list.
    pub free_chunks: usize,
    /// Sum of requested sizes over all chunks.
    pub payload_bytes: usize,
    /// Bytes of storage including word padding.
    pub reserved_bytes: usize,
    /// Allocations satisfied from the free-list.
    pub reuse_hits: u64,
}

/// A region allocator with a bulk-release lifecycle.
///
/// Chunks are carved bump-style from one growable byte buffer. Their
/// headers live in a parallel table, and the free-list stores indices into
/// that table, so the arena is the only owner of chunk memory.
///
/// # Thread Safety
///
/// This arena is NOT thread-safe. Use one arena per thread, or
/// [`SharedContext`](crate::sync::SharedContext) for a lock-guarded set.
///
/// # Example
///
/// ```rust
/// use memctx_core::Arena;
///
/// let mut arena = Arena::new();
/// let p = arena.allocate(32)?;
/// arena.payload_mut(p)?[..5].copy_from_slice(b"hello");
/// arena.free(p)?;
///
/// // Reused verbatim: same chunk, contents untouched.
/// let q = arena.allocate(16)?;
/// assert_eq!(p, q);
/// assert_eq!(&arena.payload(q)?[..5], b"hello");
///
/// let stats = arena.destroy();
/// assert_eq!(stats.chunks, 1);
/// # Ok::<(), memctx_core::ArenaError>(())
/// ```
pub struct Arena {
    id: ArenaId,
    /// Bumped on reset; refs from earlier epochs are rejected.
    epoch: u64,
    config: ArenaConfig,
    /// Headers in carve order.
    chunks: Vec<ChunkHeader>,
    /// Payload bytes for every chunk, word padded.
    storage: Vec<u8>,
    free_list: FreeList,
    reuse_hits: u64,
}

impl Arena {
    /// Creates an empty arena with the default config.
    #[must_use]
    pub fn new() -> Self {
        Self::empty(ArenaConfig::default())
    }

    /// Creates an empty arena.
    ///
    /// # Arguments
    ///
    /// * `config` - Free-list and ownership policies
    ///
    /// # Errors
    ///
    /// * [`ArenaError::InvalidConfig`] if `config` fails validation or its
    ///   initial chunk table cannot be reserved
    /// * [`ArenaError::OutOfMemory`] if the initial byte storage cannot be reserved
    pub fn with_config(config: ArenaConfig) -> ArenaResult<Self> {
        config.validate()?;
        let (initial_chunks, initial_bytes) = (config.initial_chunks, config.initial_bytes);

        let mut arena = Self::empty(config);
        arena.chunks.try_reserve_exact(initial_chunks).map_err(|_| {
            ArenaError::InvalidConfig(format!(
                "initial_chunks = {initial_chunks} cannot be reserved"
            ))
        })?;
        arena
            .storage
            .try_reserve_exact(initial_bytes)
            .map_err(|_| ArenaError::OutOfMemory {
                requested: initial_bytes,
            })?;
        Ok(arena)
    }

    fn empty(config: ArenaConfig) -> Self {
        let arena = Self {
            id: ArenaId::next(),
            epoch: 0,
            chunks: Vec::new(),
            storage: Vec::new(),
            free_list: FreeList::new(config.free_list),
            reuse_hits: 0,
            config,
        };
        tracing::info!(
            "Created {} ({:?}, {:?})",
            arena.id,
            arena.config.free_list,
            arena.config.ownership
        );
        arena
    }

    /// Identifier checked against chunk owners.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ArenaId {
        self.id
    }

    /// Number of resets so far.
    #[inline]
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Active configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Number of chunks carved.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true if nothing has been carved.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Number of chunks on the free-list.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Chunk headers, most recently carved first.
    pub fn chunks(&self) -> impl Iterator<Item = &ChunkHeader> {
        self.chunks.iter().rev()
    }

    /// Allocates a payload of at least `size` bytes.
    ///
    /// If the chunk on top of the free-list is large enough it is popped and
    /// returned as-is: its size is not shrunk and its bytes are not cleared.
    /// Otherwise a new chunk of exactly `size` bytes is carved.
    ///
    /// # Errors
    ///
    /// * [`ArenaError::InvalidArgument`] if `size` is zero or negative
    /// * [`ArenaError::CorruptFreeList`] if the top free-list entry names no chunk
    /// * [`ArenaError::OutOfMemory`] if storage cannot grow
    pub fn allocate<S>(&mut self, size: S) -> ArenaResult<ChunkRef>
    where
        S: TryInto<usize> + fmt::Display + Copy,
    {
        let size = checked_size(size)?;
        if let Some(chunk) = self.reuse(size)? {
            return Ok(chunk);
        }
        self.carve(size)
    }

    /// Pops the top of the free-list if it fits. Only the top is considered.
    fn reuse(&mut self, size: usize) -> ArenaResult<Option<ChunkRef>> {
        let Some(index) = self.free_list.peek() else {
            return Ok(None);
        };

        let Some(header) = self.chunks.get_mut(index as usize) else {
            self.free_list.pop();
            tracing::warn!("{}: discarding free-list entry {} with no chunk", self.id, index);
            return Err(ArenaError::CorruptFreeList { index });
        };

        if header.requested_size() < size {
            return Ok(None);
        }

        self.free_list.pop();
        header.set_in_use(true);
        self.reuse_hits += 1;
        tracing::trace!(
            "{}: reused chunk {} ({} bytes) for {} bytes",
            self.id,
            index,
            header.requested_size(),
            size
        );
        Ok(Some(self.chunk_ref(index)))
    }

    fn carve(&mut self, size: usize) -> ArenaResult<ChunkRef> {
        let oom = ArenaError::OutOfMemory { requested: size };

        let index = u32::try_from(self.chunks.len()).map_err(|_| oom.clone())?;
        let offset = self.storage.len();
        let end = offset
            .checked_add(size)
            .and_then(word_align)
            .ok_or_else(|| oom.clone())?;

        self.storage
            .try_reserve(end - offset)
            .map_err(|_| oom.clone())?;
        self.chunks.try_reserve(1).map_err(|_| oom)?;

        self.storage.resize(end, 0);
        self.chunks.push(ChunkHeader::new(size, self.id, offset));

        tracing::debug!(
            "{}: carved chunk {} ({} bytes at offset {})",
            self.id,
            index,
            size,
            offset
        );
        Ok(self.chunk_ref(index))
    }

    /// Returns a chunk to the free-list.
    ///
    /// Memory stays with the arena until it is reset or destroyed.
    ///
    /// # Errors
    ///
    /// * [`ArenaError::FreeListOverflow`] if a bounded free-list is full
    ///
    /// With [`OwnershipCheck::Validate`]:
    /// * [`ArenaError::CrossArenaFree`] if another arena carved the chunk
    /// * [`ArenaError::StaleChunk`] if the arena was reset since
    /// * [`ArenaError::DoubleFree`] if the chunk is already free
    ///
    /// With [`OwnershipCheck::Unchecked`] the index is pushed unverified and
    /// may corrupt this arena's free-list.
    pub fn free(&mut self, chunk: ChunkRef) -> ArenaResult<()> {
        match self.config.ownership {
            OwnershipCheck::Validate => {
                if chunk.arena != self.id {
                    return Err(ArenaError::CrossArenaFree {
                        owner: chunk.arena,
                        active: self.id,
                    });
                }
                if !self.resolve(chunk)?.in_use() {
                    return Err(ArenaError::DoubleFree { index: chunk.index });
                }
            }
            OwnershipCheck::Unchecked => {
                if chunk.arena != self.id {
                    tracing::warn!(
                        "{}: unchecked free of chunk {} owned by {}",
                        self.id,
                        chunk.index,
                        chunk.arena
                    );
                }
            }
        }

        self.free_list.push(chunk.index)?;
        if let Some(header) = self.chunks.get_mut(chunk.index as usize) {
            header.set_in_use(false);
        }
        tracing::trace!("{}: freed chunk {}", self.id, chunk.index);
        Ok(())
    }

    /// Header of a chunk carved by this arena.
    ///
    /// # Errors
    ///
    /// [`ArenaError::UnknownChunk`] or [`ArenaError::StaleChunk`] if `chunk`
    /// does not name a live chunk of this arena.
    pub fn chunk(&self, chunk: ChunkRef) -> ArenaResult<&ChunkHeader> {
        self.resolve(chunk)
    }

    /// Payload region of a chunk, `requested_size` bytes long.
    ///
    /// # Errors
    ///
    /// Same as [`Arena::chunk`].
    pub fn payload(&self, chunk: ChunkRef) -> ArenaResult<&[u8]> {
        let range = self.resolve(chunk)?.range();
        Ok(&self.storage[range])
    }

    /// Mutable payload region of a chunk.
    ///
    /// # Errors
    ///
    /// Same as [`Arena::chunk`].
    pub fn payload_mut(&mut self, chunk: ChunkRef) -> ArenaResult<&mut [u8]> {
        let range = self.resolve(chunk)?.range();
        Ok(&mut self.storage[range])
    }

    fn resolve(&self, chunk: ChunkRef) -> ArenaResult<&ChunkHeader> {
        if chunk.arena != self.id {
            return Err(ArenaError::UnknownChunk {
                arena: self.id,
                index: chunk.index,
            });
        }
        if chunk.epoch != self.epoch {
            return Err(ArenaError::StaleChunk {
                found: chunk.epoch,
                current: self.epoch,
            });
        }
        self.chunks
            .get(chunk.index as usize)
            .ok_or(ArenaError::UnknownChunk {
                arena: self.id,
                index: chunk.index,
            })
    }

    #[inline]
    const fn chunk_ref(&self, index: u32) -> ChunkRef {
        ChunkRef {
            arena: self.id,
            epoch: self.epoch,
            index,
        }
    }

    /// Releases every chunk at once, keeping the arena usable.
    ///
    /// Previously returned references become stale. Storage capacity is kept.
    pub fn reset(&mut self) {
        tracing::info!("{}: reset, releasing {} chunks", self.id, self.chunks.len());
        self.chunks.clear();
        self.storage.clear();
        self.free_list.clear();
        self.reuse_hits = 0;
        self.epoch += 1;
    }

    /// Current bookkeeping.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        let in_use_chunks = self.chunks.iter().filter(|c| c.in_use()).count();
        ArenaStats {
            chunks: self.chunks.len(),
            in_use_chunks,
            free_chunks: self.free_list.len(),
            payload_bytes: self.chunks.iter().map(ChunkHeader::requested_size).sum(),
            reserved_bytes: self.storage.len(),
            reuse_hits: self.reuse_hits,
        }
    }

    /// Destroys the arena, releasing every chunk it carved.
    ///
    /// Consumes the arena, so any later use is a compile error.
    ///
    /// # Returns
    ///
    /// Final bookkeeping before release.
    pub fn destroy(self) -> ArenaStats {
        let stats = self.stats();
        tracing::info!(
            "Destroyed {}: {} chunks, {} bytes released",
            self.id,
            stats.chunks,
            stats.reserved_bytes
        );
        stats
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("id", &self.id)
            .field("epoch", &self.epoch)
            .field("chunks", &self.chunks.len())
            .field("free", &self.free_list.len())
            .field("bytes", &self.storage.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FreeListPolicy;
    use crate::memory::chunk::WORD_SIZE;

    #[test]
    fn test_round_trip() {
        let mut arena = Arena::new();
        for size in [1_usize, 3, 8, 31, 64, 1000] {
            let p = arena.allocate(size).unwrap();
            let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
            arena.payload_mut(p).unwrap().copy_from_slice(&data);
            assert_eq!(arena.payload(p).unwrap(), data.as_slice());
        }
    }

    #[test]
    fn test_reuse_keeps_contents() {
        let mut arena = Arena::new();
        let p = arena.allocate(32).unwrap();
        for (i, b) in arena.payload_mut(p).unwrap().iter_mut().enumerate() {
            *b = i as u8;
        }
        arena.payload_mut(p).unwrap()[..5].copy_from_slice(b"hello");
        arena.free(p).unwrap();

        let q = arena.allocate(16).unwrap();
        assert_eq!(q, p);
        let payload = arena.payload(q).unwrap();
        assert_eq!(&payload[..5], b"hello");
        assert_eq!(&payload[5..16], &(5..16).map(|i| i as u8).collect::<Vec<_>>()[..]);
        // Size is not shrunk on reuse.
        assert_eq!(arena.chunk(q).unwrap().requested_size(), 32);
        assert_eq!(payload.len(), 32);
        assert_eq!(arena.stats().reuse_hits, 1);
    }

    #[test]
    fn test_too_small_chunk_is_not_reused() {
        let mut arena = Arena::new();
        let p = arena.allocate(8).unwrap();
        arena.free(p).unwrap();

        let q = arena.allocate(9).unwrap();
        assert_ne!(q, p);
        assert_eq!(arena.len(), 2);
        // Still waiting on the free-list.
        assert_eq!(arena.free_count(), 1);
    }

    #[test]
    fn test_only_top_of_free_list_is_considered() {
        let mut arena = Arena::new();
        let big = arena.allocate(64).unwrap();
        let small = arena.allocate(4).unwrap();
        arena.free(big).unwrap();
        arena.free(small).unwrap();

        // `big` would fit, but `small` is on top.
        let r = arena.allocate(32).unwrap();
        assert_ne!(r, big);
        assert_ne!(r, small);
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn test_invalid_size_leaves_state_untouched() {
        let mut arena = Arena::new();
        let before = arena.stats();
        assert!(matches!(arena.allocate(0), Err(ArenaError::InvalidArgument(_))));
        assert!(matches!(arena.allocate(-1), Err(ArenaError::InvalidArgument(_))));
        assert_eq!(arena.stats(), before);
        assert!(arena.is_empty());
    }

    #[test]
    fn test_payloads_do_not_overlap() {
        let mut arena = Arena::new();
        let refs: Vec<_> = (1..=20).map(|n| arena.allocate(n).unwrap()).collect();
        let mut ranges: Vec<_> = refs
            .iter()
            .map(|r| arena.chunk(*r).unwrap().range())
            .collect();
        ranges.sort_by_key(|r| r.start);
        for pair in ranges.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
        for r in &refs {
            assert_eq!(arena.chunk(*r).unwrap().offset() % WORD_SIZE, 0);
        }
    }

    #[test]
    fn test_chunks_newest_first() {
        let mut arena = Arena::new();
        arena.allocate(1).unwrap();
        arena.allocate(2).unwrap();
        arena.allocate(3).unwrap();
        let sizes: Vec<_> = arena.chunks().map(ChunkHeader::requested_size).collect();
        assert_eq!(sizes, vec![3, 2, 1]);
        assert!(arena.chunks().all(|c| c.owner() == arena.id()));
    }

    #[test]
    fn test_cross_arena_free_rejected() {
        let mut a = Arena::new();
        let mut b = Arena::new();
        let p = a.allocate(8).unwrap();
        let err = b.free(p).unwrap_err();
        assert_eq!(
            err,
            ArenaError::CrossArenaFree {
                owner: a.id(),
                active: b.id()
            }
        );
        assert_eq!(b.free_count(), 0);
    }

    #[test]
    fn test_double_free_rejected() {
        let mut arena = Arena::new();
        let p = arena.allocate(8).unwrap();
        arena.free(p).unwrap();
        assert_eq!(arena.free(p), Err(ArenaError::DoubleFree { index: p.index() }));
        assert_eq!(arena.free_count(), 1);
    }

    #[test]
    fn test_unchecked_cross_arena_free_corrupts_free_list() {
        let mut a = Arena::with_config(ArenaConfig::faithful()).unwrap();
        let mut b = Arena::with_config(ArenaConfig::faithful()).unwrap();
        a.allocate(8).unwrap();
        let p = a.allocate(8).unwrap(); // index 1 in `a`
        let live = b.allocate(8).unwrap(); // index 0 in `b`

        // Index 1 does not exist in `b`.
        b.free(p).unwrap();
        assert_eq!(b.free_count(), 1);
        assert_eq!(b.allocate(4), Err(ArenaError::CorruptFreeList { index: 1 }));
        assert_eq!(b.free_count(), 0);

        // Index 0 aliases a chunk of `b` that is still in use.
        let q = a.allocate(8).unwrap();
        let q = ChunkRef { index: 0, ..q };
        b.free(q).unwrap();
        assert_eq!(b.allocate(8).unwrap(), live);
    }

    #[test]
    fn test_bounded_free_list_overflow() {
        let config = ArenaConfig {
            free_list: FreeListPolicy::Bounded { capacity: 2 },
            ..ArenaConfig::default()
        };
        let mut arena = Arena::with_config(config).unwrap();
        let refs: Vec<_> = (0..3).map(|_| arena.allocate(8).unwrap()).collect();
        arena.free(refs[0]).unwrap();
        arena.free(refs[1]).unwrap();
        assert_eq!(
            arena.free(refs[2]),
            Err(ArenaError::FreeListOverflow { capacity: 2 })
        );
        // The rejected chunk is still held by the caller.
        assert!(arena.chunk(refs[2]).unwrap().in_use());
    }

    #[test]
    fn test_zero_capacity_config_rejected() {
        let config = ArenaConfig {
            free_list: FreeListPolicy::Bounded { capacity: 0 },
            ..ArenaConfig::default()
        };
        assert!(matches!(
            Arena::with_config(config),
            Err(ArenaError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_unreservable_initial_sizes_rejected() {
        let chunks = ArenaConfig::from_toml_str("initial_chunks = 9223372036854775807").unwrap();
        assert!(matches!(
            Arena::with_config(chunks),
            Err(ArenaError::InvalidConfig(_))
        ));

        let bytes = ArenaConfig::from_toml_str("initial_bytes = 9223372036854775807").unwrap();
        assert_eq!(
            Arena::with_config(bytes).unwrap_err(),
            ArenaError::OutOfMemory {
                requested: 9_223_372_036_854_775_807
            }
        );
    }

    #[test]
    fn test_huge_bounded_capacity_is_lazy() {
        let config = ArenaConfig::from_toml_str(
            "[free_list]\nmode = \"bounded\"\ncapacity = 9223372036854775807",
        )
        .unwrap();
        let mut arena = Arena::with_config(config).unwrap();
        let p = arena.allocate(8).unwrap();
        arena.free(p).unwrap();
        assert_eq!(arena.allocate(8).unwrap(), p);
    }

    #[test]
    fn test_initial_reservation() {
        let config = ArenaConfig {
            initial_chunks: 16,
            initial_bytes: 1024,
            ..ArenaConfig::default()
        };
        let mut arena = Arena::with_config(config).unwrap();
        assert!(arena.is_empty());
        arena.allocate(100).unwrap();
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_faithful_capacity_is_ten() {
        let mut arena = Arena::with_config(ArenaConfig::faithful()).unwrap();
        let refs: Vec<_> = (0..11).map(|_| arena.allocate(4).unwrap()).collect();
        for r in &refs[..10] {
            arena.free(*r).unwrap();
        }
        assert!(matches!(
            arena.free(refs[10]),
            Err(ArenaError::FreeListOverflow { capacity: 10 })
        ));
    }

    #[test]
    fn test_reset_invalidates_refs() {
        let mut arena = Arena::new();
        let p = arena.allocate(16).unwrap();
        arena.reset();
        assert!(arena.is_empty());
        assert_eq!(arena.epoch(), 1);
        assert!(matches!(arena.payload(p), Err(ArenaError::StaleChunk { .. })));

        let q = arena.allocate(16).unwrap();
        assert_eq!(q.index(), p.index());
        assert_ne!(q, p);
        assert!(matches!(arena.free(p), Err(ArenaError::StaleChunk { .. })));
    }

    #[test]
    fn test_epoch_does_not_wrap_at_u32() {
        let mut arena = Arena::new();
        arena.epoch = u64::from(u32::MAX);
        let p = arena.allocate(8).unwrap();
        arena.reset();
        assert_eq!(arena.epoch(), u64::from(u32::MAX) + 1);
        assert_eq!(
            arena.payload(p),
            Err(ArenaError::StaleChunk {
                found: u64::from(u32::MAX),
                current: u64::from(u32::MAX) + 1,
            })
        );
    }

    #[test]
    fn test_destroy_reports_everything() {
        let mut arena = Arena::new();
        let p = arena.allocate(10).unwrap();
        arena.allocate(20).unwrap();
        arena.free(p).unwrap();
        let stats = arena.destroy();
        assert_eq!(stats.chunks, 2);
        assert_eq!(stats.free_chunks, 1);
        assert_eq!(stats.in_use_chunks, 1);
        assert_eq!(stats.payload_bytes, 30);
        assert!(stats.reserved_bytes >= 30);
    }
}
