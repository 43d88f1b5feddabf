//! # Context Registry
//!
//! Owns a set of arenas and the selector naming which one receives
//! allocate/free calls.

use std::collections::HashMap;
use std::fmt;

use crate::config::ArenaConfig;
use crate::error::{ArenaError, ArenaResult};
use crate::memory::{Arena, ArenaId, ArenaStats, ChunkRef};

/// Owning handle to an arena held by a registry.
///
/// Not `Clone`: destroying the arena consumes the handle, so a destroyed
/// arena cannot be named again through it.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ArenaHandle {
    id: ArenaId,
}

impl ArenaHandle {
    /// Identifier of the arena behind this handle.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ArenaId {
        self.id
    }
}

/// A set of arenas plus the active-arena selector.
///
/// The selector starts unset and only changes through
/// [`set_active`](Self::set_active); destroying the active arena leaves it
/// pointing at the destroyed id.
#[derive(Debug, Default)]
pub struct ContextRegistry {
    arenas: HashMap<ArenaId, Arena>,
    active: Option<Selection>,
    /// Config for arenas created without an explicit one.
    config: ArenaConfig,
}

/// Selector state.
#[derive(Clone, Copy, Debug)]
struct Selection {
    id: ArenaId,
    /// Whether the arena lived in this registry when it was selected.
    local: bool,
}

impl ContextRegistry {
    /// Creates an empty registry.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: ArenaConfig) -> ArenaResult<Self> {
        config.validate()?;
        Ok(Self {
            arenas: HashMap::new(),
            active: None,
            config,
        })
    }

    /// Config used by [`create_arena`](Self::create_arena).
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Replaces the config for arenas created from now on.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidConfig`] if `config` fails validation.
    pub fn set_config(&mut self, config: ArenaConfig) -> ArenaResult<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Number of live arenas.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.arenas.len()
    }

    /// Returns true if no arena is live.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arenas.is_empty()
    }

    /// Creates an empty arena with the registry config.
    ///
    /// # Errors
    ///
    /// See [`Arena::with_config`].
    pub fn create_arena(&mut self) -> ArenaResult<ArenaHandle> {
        let arena = Arena::with_config(self.config.clone())?;
        Ok(self.insert(arena))
    }

    /// Creates an empty arena with its own config.
    ///
    /// # Errors
    ///
    /// See [`Arena::with_config`].
    pub fn create_arena_with(&mut self, config: ArenaConfig) -> ArenaResult<ArenaHandle> {
        let arena = Arena::with_config(config)?;
        Ok(self.insert(arena))
    }

    fn insert(&mut self, arena: Arena) -> ArenaHandle {
        let id = arena.id();
        self.arenas.insert(id, arena);
        ArenaHandle { id }
    }

    /// Destroys an arena and every chunk it carved.
    ///
    /// The selector is not touched, even if it names this arena.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::UnknownArena`] if the handle belongs to another
    /// registry. The handle is consumed either way; its arena stays in the
    /// registry that created it until that registry is [`clear`](Self::clear)ed
    /// or dropped.
    pub fn destroy_arena(&mut self, handle: ArenaHandle) -> ArenaResult<ArenaStats> {
        self.arenas
            .remove(&handle.id)
            .map(Arena::destroy)
            .ok_or(ArenaError::UnknownArena(handle.id))
    }

    /// Makes `handle` the target of subsequent allocate/free calls.
    ///
    /// Unconditional: a handle from another registry is accepted here and
    /// reported as [`ArenaError::UnknownArena`] on the next allocate/free.
    pub fn set_active(&mut self, handle: &ArenaHandle) {
        let local = self.arenas.contains_key(&handle.id);
        if !local {
            tracing::warn!("Setting active arena {} from another context", handle.id);
        }
        tracing::debug!("Setting active arena: {}", handle.id);
        self.active = Some(Selection {
            id: handle.id,
            local,
        });
    }

    /// Currently selected arena, if any has ever been selected.
    #[inline]
    #[must_use]
    pub fn active(&self) -> Option<ArenaId> {
        self.active.map(|selection| selection.id)
    }

    fn active_arena_mut(&mut self) -> ArenaResult<&mut Arena> {
        let Selection { id, local } = self.active.ok_or(ArenaError::NoActiveArena)?;
        self.arenas.get_mut(&id).ok_or(if local {
            ArenaError::DestroyedArena(id)
        } else {
            ArenaError::UnknownArena(id)
        })
    }

    /// Allocates from the active arena.
    ///
    /// # Errors
    ///
    /// [`ArenaError::NoActiveArena`], [`ArenaError::DestroyedArena`] or
    /// [`ArenaError::UnknownArena`] if there is no usable active arena,
    /// otherwise as [`Arena::allocate`].
    pub fn allocate<S>(&mut self, size: S) -> ArenaResult<ChunkRef>
    where
        S: TryInto<usize> + fmt::Display + Copy,
    {
        self.active_arena_mut()?.allocate(size)
    }

    /// Frees into the active arena.
    ///
    /// # Errors
    ///
    /// [`ArenaError::NoActiveArena`], [`ArenaError::DestroyedArena`] or
    /// [`ArenaError::UnknownArena`] if there is no usable active arena,
    /// otherwise as [`Arena::free`].
    pub fn free(&mut self, chunk: ChunkRef) -> ArenaResult<()> {
        self.active_arena_mut()?.free(chunk)
    }

    /// Arena behind a handle.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::UnknownArena`] if the handle belongs to another registry.
    pub fn arena(&self, handle: &ArenaHandle) -> ArenaResult<&Arena> {
        self.arenas
            .get(&handle.id)
            .ok_or(ArenaError::UnknownArena(handle.id))
    }

    /// Payload of a chunk, looked up through the arena that carved it.
    ///
    /// # Errors
    ///
    /// [`ArenaError::UnknownArena`] if the owning arena is gone, otherwise
    /// as [`Arena::payload`].
    pub fn payload(&self, chunk: ChunkRef) -> ArenaResult<&[u8]> {
        self.arenas
            .get(&chunk.arena())
            .ok_or(ArenaError::UnknownArena(chunk.arena()))?
            .payload(chunk)
    }

    /// Mutable payload of a chunk.
    ///
    /// # Errors
    ///
    /// Same as [`ContextRegistry::payload`].
    pub fn payload_mut(&mut self, chunk: ChunkRef) -> ArenaResult<&mut [u8]> {
        self.arenas
            .get_mut(&chunk.arena())
            .ok_or(ArenaError::UnknownArena(chunk.arena()))?
            .payload_mut(chunk)
    }

    /// Destroys every arena and clears the selector.
    ///
    /// # Returns
    ///
    /// Number of arenas destroyed.
    pub fn clear(&mut self) -> usize {
        let count = self.arenas.len();
        for (_, arena) in self.arenas.drain() {
            arena.destroy();
        }
        self.active = None;
        count
    }
}
