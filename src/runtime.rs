//! Per-computer script runtime state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use netbridge_core::{Dynamic, PersistError};

use crate::bridge::Bridge;
use crate::dispatch::Dispatcher;
use crate::error::SnapshotError;
use crate::persist::{PersistStorage, PersistedValue};
use crate::wait::{WaitPoll, WaitState};

/// The state one in-world computer keeps between script steps.
///
/// A runtime owns its dispatcher (and with it the dispatch cache), the script
/// globals, and the wait state. It is single-threaded; runtimes of different
/// computers run on their own threads and share only the [`Bridge`].
#[derive(Debug)]
pub struct ScriptRuntime {
    dispatcher: Dispatcher,
    globals: BTreeMap<String, Dynamic>,
    wait: WaitState,
}

/// Serialized globals and the storage they were persisted with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuntimeSnapshot {
    pub globals: BTreeMap<String, PersistedValue>,
    pub storage: PersistStorage,
}

impl RuntimeSnapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(source: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(source)?)
    }
}

impl ScriptRuntime {
    pub fn new(bridge: Bridge) -> Self {
        Self {
            dispatcher: Dispatcher::new(bridge),
            globals: BTreeMap::new(),
            wait: WaitState::new(),
        }
    }

    pub fn bridge(&self) -> &Bridge {
        self.dispatcher.bridge()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// Script global `name`, if set.
    pub fn global(&self, name: &str) -> Option<&Dynamic> {
        self.globals.get(name)
    }

    /// Set a script global, returning the previous value.
    pub fn set_global(&mut self, name: impl Into<String>, value: Dynamic) -> Option<Dynamic> {
        self.globals.insert(name.into(), value)
    }

    pub fn remove_global(&mut self, name: &str) -> Option<Dynamic> {
        self.globals.remove(name)
    }

    pub fn globals(&self) -> impl Iterator<Item = (&str, &Dynamic)> {
        self.globals.iter().map(|(name, value)| (name.as_str(), value))
    }

    // ==========================================================================
    // Waiting
    // ==========================================================================

    /// Suspend until a signal arrives or the timeout passes.
    ///
    /// Without an explicit timeout the configured default applies.
    pub fn begin_wait(&mut self, now_ms: u64, timeout_ms: Option<u64>) {
        let timeout_ms = timeout_ms.or(self.bridge().config().default_wait_timeout_ms);
        self.wait.begin(now_ms, timeout_ms);
    }

    /// Check the current wait against the simulation clock.
    pub fn poll_wait(&mut self, now_ms: u64) -> WaitPoll {
        self.wait.poll(now_ms)
    }

    pub fn resolve_wait(&mut self) -> bool {
        self.wait.resolve()
    }

    pub fn abandon_wait(&mut self) -> bool {
        self.wait.abandon()
    }

    pub fn wait(&self) -> &WaitState {
        &self.wait
    }

    // ==========================================================================
    // Persistence
    // ==========================================================================

    /// Persist the globals and wait state through a fresh storage.
    pub fn persist(&self) -> RuntimeSnapshot {
        let mut storage = PersistStorage::new();
        let globals = self
            .globals
            .iter()
            .map(|(name, value)| (name.clone(), storage.persist(value)))
            .collect();
        storage.set_wait(self.wait);
        debug!(
            globals = self.globals.len(),
            traces = storage.trace_count(),
            references = storage.reference_count(),
            waiting = self.wait.is_pending(),
            "persisted runtime"
        );
        RuntimeSnapshot { globals, storage }
    }

    /// Rebuild a runtime from a snapshot taken by [`persist`](Self::persist).
    ///
    /// The dispatch cache starts empty and is repopulated on demand.
    pub fn restore(bridge: Bridge, snapshot: &RuntimeSnapshot) -> Result<Self, PersistError> {
        let storage = &snapshot.storage;
        let globals = snapshot
            .globals
            .iter()
            .map(|(name, value)| Ok((name.clone(), storage.unpersist(bridge.registry(), value)?)))
            .collect::<Result<BTreeMap<_, _>, PersistError>>()?;
        debug!(
            globals = globals.len(),
            waiting = storage.wait().is_pending(),
            "restored runtime"
        );
        Ok(Self {
            dispatcher: Dispatcher::new(bridge),
            globals,
            wait: *storage.wait(),
        })
    }

    /// [`restore`](Self::restore) from a JSON snapshot.
    pub fn restore_json(bridge: Bridge, source: &str) -> Result<Self, SnapshotError> {
        let snapshot = RuntimeSnapshot::from_json(source)?;
        Ok(Self::restore(bridge, &snapshot)?)
    }
}

impl Drop for ScriptRuntime {
    fn drop(&mut self) {
        self.wait.abandon();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use netbridge_core::ObjectWorld;
    use netbridge_registry::RegistryBuilder;

    use super::*;
    use crate::config::BridgeConfig;

    fn bridge(config: BridgeConfig) -> Bridge {
        Bridge::with_config(RegistryBuilder::new().build(), Arc::new(ObjectWorld::new()), config)
    }

    #[test]
    fn default_timeout_applies() {
        let config = BridgeConfig {
            default_wait_timeout_ms: Some(100),
            ..BridgeConfig::default()
        };
        let mut runtime = bridge(config).runtime();
        runtime.begin_wait(10, None);
        assert_eq!(runtime.wait().deadline_ms(), Some(110));
        runtime.begin_wait(10, Some(5));
        assert_eq!(runtime.wait().deadline_ms(), Some(15));
    }

    #[test]
    fn snapshot_keeps_globals_and_deadline() {
        let bridge = bridge(BridgeConfig::default());
        let mut runtime = bridge.runtime();
        runtime.set_global("count", Dynamic::Int(3));
        runtime.set_global("label", Dynamic::String("main".into()));
        runtime.begin_wait(500, Some(1_000));

        let json = runtime.persist().to_json().unwrap();
        let snapshot = RuntimeSnapshot::from_json(&json).unwrap();
        let mut restored = ScriptRuntime::restore(bridge, &snapshot).unwrap();

        assert_eq!(restored.global("count"), Some(&Dynamic::Int(3)));
        assert_eq!(restored.global("label").and_then(Dynamic::as_str), Some("main"));
        assert_eq!(restored.poll_wait(1_499), WaitPoll::Pending);
        assert_eq!(restored.poll_wait(1_500), WaitPoll::TimedOut);
    }

    #[test]
    fn malformed_snapshot_is_an_error() {
        assert!(matches!(
            RuntimeSnapshot::from_json("{\"globals\":"),
            Err(SnapshotError::Json(_))
        ));
    }
}
