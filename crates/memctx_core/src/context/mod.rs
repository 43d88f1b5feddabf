//! # Active-Arena Context
//!
//! Selects which arena receives allocate/free calls. The selector is
//! thread-local; for a selector shared across threads see
//! [`SharedContext`](crate::sync::SharedContext).

mod local;
mod registry;

pub use local::{
    active_arena, allocate, arena_stats, configure, create_arena, create_arena_with,
    destroy_arena, free, set_active, teardown, with_payload, with_payload_mut,
};
pub use registry::{ArenaHandle, ContextRegistry};
