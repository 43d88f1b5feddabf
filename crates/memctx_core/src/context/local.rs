//! # Thread-Local Context
//!
//! The implicit "current arena" of each thread. Every function here works on
//! the calling thread's registry; arenas never cross threads through it.
//!
//! ## Example
//!
//! ```rust
//! use memctx_core::context;
//!
//! let small = context::create_arena()?;
//! context::set_active(&small);
//!
//! let name = context::allocate(32)?;
//! context::with_payload_mut(name, |bytes| bytes[..5].copy_from_slice(b"small"))?;
//!
//! context::destroy_arena(small)?;
//! # Ok::<(), memctx_core::ArenaError>(())
//! ```
//!
//! ## Panics
//!
//! The payload closures run while the registry is borrowed. Calling back
//! into this module from inside one panics.

use std::cell::RefCell;
use std::fmt;

use crate::config::ArenaConfig;
use crate::context::registry::{ArenaHandle, ContextRegistry};
use crate::error::ArenaResult;
use crate::memory::{ArenaId, ArenaStats, ChunkRef};

thread_local! {
    static CONTEXT: RefCell<ContextRegistry> = RefCell::new(ContextRegistry::default());
}

fn with_context<R>(f: impl FnOnce(&mut ContextRegistry) -> R) -> R {
    CONTEXT.with(|ctx| f(&mut ctx.borrow_mut()))
}

/// Sets the config for arenas this thread creates from now on.
///
/// # Errors
///
/// Returns [`ArenaError::InvalidConfig`](crate::ArenaError::InvalidConfig) if
/// `config` fails validation.
pub fn configure(config: ArenaConfig) -> ArenaResult<()> {
    with_context(|ctx| ctx.set_config(config))
}

/// Creates an empty arena owned by this thread's context.
///
/// # Errors
///
/// See [`ContextRegistry::create_arena`].
pub fn create_arena() -> ArenaResult<ArenaHandle> {
    with_context(ContextRegistry::create_arena)
}

/// Creates an empty arena with its own config.
///
/// # Errors
///
/// Returns [`ArenaError::InvalidConfig`](crate::ArenaError::InvalidConfig) if
/// `config` fails validation.
pub fn create_arena_with(config: ArenaConfig) -> ArenaResult<ArenaHandle> {
    with_context(|ctx| ctx.create_arena_with(config))
}

/// Destroys an arena, releasing all of its chunks.
///
/// Does not reset the active selector.
///
/// # Errors
///
/// Returns [`ArenaError::UnknownArena`](crate::ArenaError::UnknownArena) if
/// the arena was created on another thread. That arena then lives until its
/// own thread calls [`teardown`] or exits.
pub fn destroy_arena(handle: ArenaHandle) -> ArenaResult<ArenaStats> {
    with_context(|ctx| ctx.destroy_arena(handle))
}

/// Makes `handle` the implicit target of [`allocate`] and [`free`].
pub fn set_active(handle: &ArenaHandle) {
    with_context(|ctx| ctx.set_active(handle));
}

/// Arena currently selected on this thread.
#[must_use]
pub fn active_arena() -> Option<ArenaId> {
    with_context(|ctx| ctx.active())
}

/// Allocates from the active arena.
///
/// # Errors
///
/// See [`ContextRegistry::allocate`].
pub fn allocate<S>(size: S) -> ArenaResult<ChunkRef>
where
    S: TryInto<usize> + fmt::Display + Copy,
{
    with_context(|ctx| ctx.allocate(size))
}

/// Returns a chunk to the active arena's free-list.
///
/// # Errors
///
/// See [`ContextRegistry::free`].
pub fn free(chunk: ChunkRef) -> ArenaResult<()> {
    with_context(|ctx| ctx.free(chunk))
}

/// Runs `f` over a chunk's payload.
///
/// # Errors
///
/// See [`ContextRegistry::payload`].
pub fn with_payload<R>(chunk: ChunkRef, f: impl FnOnce(&[u8]) -> R) -> ArenaResult<R> {
    with_context(|ctx| ctx.payload(chunk).map(f))
}

/// Runs `f` over a chunk's payload, mutably.
///
/// # Errors
///
/// See [`ContextRegistry::payload_mut`].
pub fn with_payload_mut<R>(chunk: ChunkRef, f: impl FnOnce(&mut [u8]) -> R) -> ArenaResult<R> {
    with_context(|ctx| ctx.payload_mut(chunk).map(f))
}

/// Bookkeeping of one arena.
///
/// # Errors
///
/// Returns [`ArenaError::UnknownArena`](crate::ArenaError::UnknownArena) if
/// the arena was created on another thread.
pub fn arena_stats(handle: &ArenaHandle) -> ArenaResult<ArenaStats> {
    with_context(|ctx| ctx.arena(handle).map(crate::memory::Arena::stats))
}

/// Destroys every arena on this thread and clears the selector.
///
/// # Returns
///
/// Number of arenas destroyed.
pub fn teardown() -> usize {
    with_context(ContextRegistry::clear)
}
