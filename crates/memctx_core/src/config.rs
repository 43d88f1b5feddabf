//! # Arena Configuration
//!
//! Free-list and ownership policies for new arenas, loadable from TOML.
//!
//! ```toml
//! ownership = "validate"
//! initial_chunks = 64
//!
//! [free_list]
//! mode = "bounded"
//! capacity = 10
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, ArenaResult};

/// Free-list capacity used by the fixed-size compatibility mode.
pub const FAITHFUL_FREE_LIST_CAPACITY: usize = 10;

/// How an arena's free-list stores recycled chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FreeListPolicy {
    /// Stack grows as needed.
    Growable,
    /// Fixed-capacity stack; pushing past `capacity` fails with
    /// [`ArenaError::FreeListOverflow`].
    Bounded {
        /// Maximum number of free chunks held at once.
        capacity: usize,
    },
}

/// Whether `free` verifies that a chunk belongs to the arena it is freed into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipCheck {
    /// Reject cross-arena, stale and double frees.
    Validate,
    /// Push whatever index is given onto the free-list.
    ///
    /// A chunk freed into the wrong arena corrupts that arena's free-list:
    /// later allocations may alias a live chunk or hit a missing index,
    /// which surfaces as [`ArenaError::CorruptFreeList`].
    Unchecked,
}

/// Configuration for a single arena.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Free-list storage policy.
    pub free_list: FreeListPolicy,
    /// Ownership validation on free.
    pub ownership: OwnershipCheck,
    /// Chunk headers to reserve up front.
    pub initial_chunks: usize,
    /// Payload bytes to reserve up front.
    pub initial_bytes: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            free_list: FreeListPolicy::Growable,
            ownership: OwnershipCheck::Validate,
            initial_chunks: 0,
            initial_bytes: 0,
        }
    }
}

impl ArenaConfig {
    /// Compatibility config: ten-slot free-list, no ownership checks.
    #[must_use]
    pub const fn faithful() -> Self {
        Self {
            free_list: FreeListPolicy::Bounded {
                capacity: FAITHFUL_FREE_LIST_CAPACITY,
            },
            ownership: OwnershipCheck::Unchecked,
            initial_chunks: 0,
            initial_bytes: 0,
        }
    }

    /// Parses and validates a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidConfig`] on malformed TOML or invalid values.
    pub fn from_toml_str(text: &str) -> ArenaResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| ArenaError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a config file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidConfig`] if the file cannot be read or parsed.
    pub fn from_toml_file(path: impl AsRef<Path>) -> ArenaResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ArenaError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidConfig`] for a bounded free-list of capacity zero.
    pub fn validate(&self) -> ArenaResult<()> {
        if let FreeListPolicy::Bounded { capacity: 0 } = self.free_list {
            return Err(ArenaError::InvalidConfig(
                "bounded free-list capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
