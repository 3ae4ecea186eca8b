//! Script-to-native object bridge.
//!
//! Scripts running on in-world computers hold handles to native objects and
//! classes. This crate resolves members on those handles, marshals calls into
//! reflected native functions, and persists handles across a save/resume
//! boundary.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use netbridge::{Bridge, BridgeConfig, ObjectWorld};
//!
//! let registry = BridgeConfig::default().registry_builder().build();
//! let bridge = Bridge::new(registry, Arc::new(ObjectWorld::new()));
//! let mut runtime = bridge.runtime();
//! runtime.begin_wait(0, Some(100));
//! assert_eq!(runtime.wait().deadline_ms(), Some(100));
//! ```
//!
//! Values, handles, traces and reflection live in `netbridge-core`; type and
//! member bindings in `netbridge-registry`. The types a host needs most are
//! re-exported here.

mod bridge;
mod config;
mod dispatch;
mod error;
mod locks;
mod marshal;
mod persist;
mod runtime;
mod wait;

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use dispatch::{DispatchStats, Dispatcher};
pub use error::{ConfigError, SnapshotError};
pub use locks::CallLocks;
pub use persist::{PersistStorage, PersistToken, PersistedMemberKind, PersistedValue};
pub use runtime::{RuntimeSnapshot, ScriptRuntime};
pub use wait::{WaitPoll, WaitState};

pub use netbridge_core::{
    BoundMember, BridgeError, ClassHandle, Dynamic, ExposedType, InstanceHandle, MemberKind, ObjectRef,
    ObjectWorld, PersistError, ScriptHandle, Trace, TypeHash,
};
pub use netbridge_registry::{BridgeRegistry, RegistryBuilder};
