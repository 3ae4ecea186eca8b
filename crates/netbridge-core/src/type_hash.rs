//! Deterministic hash-based identity for native classes.
//!
//! [`TypeHash`] identifies a native class by the xxh64 hash of its name. The
//! same name always produces the same hash, so classes can be referenced
//! before they are registered and persisted class references remain valid
//! across process restarts.
//!
//! # Examples
//!
//! ```
//! use netbridge_core::TypeHash;
//!
//! let computer = TypeHash::from_name("Computer");
//! assert_eq!(computer, TypeHash::from_name("Computer"));
//! assert_ne!(computer, TypeHash::from_name("PowerConnector"));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
///
/// Keeps class identities and handle ordering keys from colliding even when
/// they are computed over the same bytes.
pub mod hash_constants {
    /// Domain marker for class hashes
    pub const CLASS: u64 = 0x2fac10b63a6cc57c;

    /// Seed for instance ordering keys
    pub const INSTANCE_ORDER: u64 = 0x5ea77ffbcdf5f302;

    /// Seed for class handle ordering keys
    pub const CLASS_ORDER: u64 = 0x7d3c8b4a92e15f6d;
}

/// A deterministic 64-bit hash identifying a native class.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a class hash from its native name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::CLASS ^ xxh64(name.as_bytes(), 0))
    }

    /// Check if this is the empty hash.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash(0x{:016x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
