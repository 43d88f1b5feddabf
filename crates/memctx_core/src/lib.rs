//! # MEMCTX Core
//!
//! Memory contexts: region-based allocation where many small chunks share
//! one lifetime and are released together.
//!
//! - Chunks are carved bump-style from an arena
//! - Freed chunks go on a per-arena free-list and are reused verbatim
//! - Destroying an arena releases every chunk it carved in one pass
//!
//! ## Architecture Rules
//!
//! 1. **No raw chunk pointers** - callers hold a [`ChunkRef`] (arena + index)
//! 2. **Explicit lifetimes** - destroying an arena consumes its handle
//! 3. **Implicit current arena** - per thread via [`context`], or behind a
//!    lock via [`SharedContext`]
//!
//! ## Example
//!
//! ```rust
//! use memctx_core::{context, ArenaError};
//!
//! let a = context::create_arena()?;
//! context::set_active(&a);
//!
//! let p = context::allocate(32)?;
//! context::with_payload_mut(p, |bytes| bytes[..5].copy_from_slice(b"hello"))?;
//! context::free(p)?;
//!
//! let q = context::allocate(16)?;
//! assert_eq!(p, q);
//!
//! let b = context::create_arena()?;
//! context::set_active(&b);
//! assert!(matches!(context::free(q), Err(ArenaError::CrossArenaFree { .. })));
//!
//! context::destroy_arena(a)?;
//! context::destroy_arena(b)?;
//! # Ok::<(), ArenaError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod context;
pub mod error;
pub mod memory;
pub mod sync;

pub use config::{ArenaConfig, FreeListPolicy, OwnershipCheck, FAITHFUL_FREE_LIST_CAPACITY};
pub use context::{ArenaHandle, ContextRegistry};
pub use error::{ArenaError, ArenaResult};
pub use memory::{Arena, ArenaId, ArenaStats, ChunkHeader, ChunkRef, FreeList};
pub use sync::SharedContext;
