//! Shared bridge state.

use std::sync::Arc;

use tracing::debug;

use netbridge_core::{Dynamic, ObjectRef, ObjectWorld, ScriptHandle, Trace, TypeHash};
use netbridge_registry::BridgeRegistry;

use crate::config::BridgeConfig;
use crate::locks::CallLocks;
use crate::runtime::ScriptRuntime;

/// Everything the runtimes of one simulation share.
///
/// Cloning is cheap: the registry, the object world, and the call lock
/// table are reference counted. Each in-world computer gets its own
/// [`ScriptRuntime`] from [`runtime`](Self::runtime).
#[derive(Clone, Debug)]
pub struct Bridge {
    pub(crate) registry: Arc<BridgeRegistry>,
    pub(crate) world: Arc<ObjectWorld>,
    pub(crate) locks: Arc<CallLocks>,
    pub(crate) config: Arc<BridgeConfig>,
}

impl Bridge {
    pub fn new(registry: BridgeRegistry, world: Arc<ObjectWorld>) -> Self {
        Self::with_config(registry, world, BridgeConfig::default())
    }

    pub fn with_config(registry: BridgeRegistry, world: Arc<ObjectWorld>, config: BridgeConfig) -> Self {
        if registry.function_prefix() != config.function_prefix {
            debug!(
                registry = registry.function_prefix(),
                config = %config.function_prefix,
                "registry was built with a different function prefix than configured"
            );
        }
        Self {
            registry: Arc::new(registry),
            world,
            locks: Arc::new(CallLocks::new()),
            config: Arc::new(config),
        }
    }

    pub fn registry(&self) -> &BridgeRegistry {
        &self.registry
    }

    /// The shared object world.
    pub fn world(&self) -> &ObjectWorld {
        &self.world
    }

    /// The per-object call lock table.
    pub fn locks(&self) -> &CallLocks {
        &self.locks
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Script value addressing `object` directly.
    ///
    /// Nil if the object is gone or its class has no exposed type.
    pub fn instance(&self, object: ObjectRef) -> Dynamic {
        self.registry
            .instance_for(&self.world, Trace::new(object))
            .map(|handle| Dynamic::Handle(ScriptHandle::Instance(handle)))
            .unwrap_or_default()
    }

    /// Script value for a native class with a class-level binding.
    pub fn class_instance(&self, class: TypeHash) -> Dynamic {
        self.registry
            .class_instance_for(class)
            .map(|handle| Dynamic::Handle(ScriptHandle::Class(handle)))
            .unwrap_or_default()
    }

    /// Destroy an object and drop its call lock entry.
    ///
    /// Handles still addressing it fail with `InstanceInvalid` from now on.
    pub fn destroy(&self, object: ObjectRef) -> bool {
        let destroyed = self.world.destroy(object);
        if destroyed {
            self.locks.evict(object);
        }
        destroyed
    }

    /// A fresh runtime for one in-world computer.
    pub fn runtime(&self) -> ScriptRuntime {
        ScriptRuntime::new(self.clone())
    }
}
