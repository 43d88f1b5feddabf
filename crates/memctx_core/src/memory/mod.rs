//! # Memory Management
//!
//! Arenas, their chunks, and the free-lists that recycle them.
//!
//! ## Design Philosophy
//!
//! Memory is grouped by lifetime. Within an arena:
//! - Carving is a bump of the byte storage
//! - Freeing pushes an index, it never releases memory
//! - Destroying releases everything in one pass

mod arena;
mod chunk;
mod free_list;

pub use arena::{Arena, ArenaStats};
pub use chunk::{ArenaId, ChunkHeader, ChunkRef, WORD_SIZE};
pub use free_list::FreeList;
