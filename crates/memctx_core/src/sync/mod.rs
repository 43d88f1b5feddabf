//! # Cross-Thread Contexts
//!
//! Arenas and the active-arena selector are single-threaded by design.
//! Sharing them across threads goes through one exclusive lock.
//!
//! ## Thread Safety
//!
//! - `SharedContext`: every operation holds the lock end to end
//! - `SharedContext::lock`: several operations under one acquisition

mod shared;

pub use shared::SharedContext;
