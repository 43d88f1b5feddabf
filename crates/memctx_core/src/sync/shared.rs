//! # Shared Context
//!
//! One lock over the selector and every arena it can name.

use std::fmt;

use parking_lot::{Mutex, MutexGuard};

use crate::config::ArenaConfig;
use crate::context::{ArenaHandle, ContextRegistry};
use crate::error::ArenaResult;
use crate::memory::{ArenaId, ArenaStats, ChunkRef};

/// A [`ContextRegistry`] behind a single exclusive lock.
///
/// Every call takes the lock for its whole duration, so the active arena
/// cannot change between selecting it and mutating it. Use
/// [`lock`](Self::lock) to run several operations as one unit.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use memctx_core::SharedContext;
///
/// let shared = Arc::new(SharedContext::default());
/// let arena = shared.create_arena()?;
/// shared.set_active(&arena);
///
/// let worker = Arc::clone(&shared);
/// let chunk = std::thread::spawn(move || worker.allocate(64)).join().unwrap()?;
/// assert_eq!(chunk.arena(), arena.id());
/// # Ok::<(), memctx_core::ArenaError>(())
/// ```
#[derive(Default)]
pub struct SharedContext {
    inner: Mutex<ContextRegistry>,
}

impl SharedContext {
    /// Creates an empty shared context.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidConfig`](crate::ArenaError::InvalidConfig)
    /// if `config` fails validation.
    pub fn new(config: ArenaConfig) -> ArenaResult<Self> {
        Ok(Self {
            inner: Mutex::new(ContextRegistry::new(config)?),
        })
    }

    /// Takes the lock for a batch of operations.
    pub fn lock(&self) -> MutexGuard<'_, ContextRegistry> {
        self.inner.lock()
    }

    /// Sets the config for arenas created from now on.
    ///
    /// # Errors
    ///
    /// See [`ContextRegistry::set_config`].
    pub fn configure(&self, config: ArenaConfig) -> ArenaResult<()> {
        self.inner.lock().set_config(config)
    }

    /// Creates an empty arena.
    ///
    /// # Errors
    ///
    /// See [`ContextRegistry::create_arena`].
    pub fn create_arena(&self) -> ArenaResult<ArenaHandle> {
        self.inner.lock().create_arena()
    }

    /// Creates an empty arena with its own config.
    ///
    /// # Errors
    ///
    /// See [`ContextRegistry::create_arena_with`].
    pub fn create_arena_with(&self, config: ArenaConfig) -> ArenaResult<ArenaHandle> {
        self.inner.lock().create_arena_with(config)
    }

    /// Destroys an arena and its chunks.
    ///
    /// # Errors
    ///
    /// See [`ContextRegistry::destroy_arena`].
    pub fn destroy_arena(&self, handle: ArenaHandle) -> ArenaResult<ArenaStats> {
        self.inner.lock().destroy_arena(handle)
    }

    /// Selects the arena for allocate/free, for every thread.
    pub fn set_active(&self, handle: &ArenaHandle) {
        self.inner.lock().set_active(handle);
    }

    /// Currently selected arena.
    #[must_use]
    pub fn active_arena(&self) -> Option<ArenaId> {
        self.inner.lock().active()
    }

    /// Allocates from the active arena.
    ///
    /// # Errors
    ///
    /// See [`ContextRegistry::allocate`].
    pub fn allocate<S>(&self, size: S) -> ArenaResult<ChunkRef>
    where
        S: TryInto<usize> + fmt::Display + Copy,
    {
        self.inner.lock().allocate(size)
    }

    /// Frees into the active arena.
    ///
    /// # Errors
    ///
    /// See [`ContextRegistry::free`].
    pub fn free(&self, chunk: ChunkRef) -> ArenaResult<()> {
        self.inner.lock().free(chunk)
    }

    /// Runs `f` over a chunk's payload under the lock.
    ///
    /// # Errors
    ///
    /// See [`ContextRegistry::payload`].
    pub fn with_payload<R>(&self, chunk: ChunkRef, f: impl FnOnce(&[u8]) -> R) -> ArenaResult<R> {
        self.inner.lock().payload(chunk).map(f)
    }

    /// Runs `f` over a chunk's payload, mutably, under the lock.
    ///
    /// # Errors
    ///
    /// See [`ContextRegistry::payload_mut`].
    pub fn with_payload_mut<R>(
        &self,
        chunk: ChunkRef,
        f: impl FnOnce(&mut [u8]) -> R,
    ) -> ArenaResult<R> {
        self.inner.lock().payload_mut(chunk).map(f)
    }

    /// Bookkeeping of one arena.
    ///
    /// # Errors
    ///
    /// See [`ContextRegistry::arena`].
    pub fn arena_stats(&self, handle: &ArenaHandle) -> ArenaResult<ArenaStats> {
        self.inner.lock().arena(handle).map(crate::memory::Arena::stats)
    }

    /// Destroys every arena and clears the selector.
    pub fn teardown(&self) -> usize {
        self.inner.lock().clear()
    }
}

impl fmt::Debug for SharedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Some(registry) => f
                .debug_struct("SharedContext")
                .field("arenas", &registry.len())
                .field("active", &registry.active())
                .finish(),
            None => f.write_str("SharedContext { <locked> }"),
        }
    }
}
