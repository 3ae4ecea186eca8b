//! Member resolution and dispatch on script handles.
//!
//! Every runtime owns a [`Dispatcher`]. It implements what a script can do
//! with a handle: index a member, assign to one, call a bound member,
//! compare handles, and turn them into strings.
//!
//! # Resolution order for instances
//!
//! 1. `id` / `nick` of network components
//! 2. properties, own type first, then the merged objects in order
//! 3. `getMembers`
//! 4. the dispatch cache of the exposed type
//! 5. registered functions, own type first, then the merged objects
//! 6. reflected functions of the object's class, then of each merged object
//!
//! Results of steps 5 and 6 are cached per exposed type. Cached members
//! capture no receiver, so one entry serves every handle of that type.

mod class;
mod compare;
mod instance;

use std::sync::Arc;

use rustc_hash::FxHashMap;

use netbridge_core::{
    BoundMember, BridgeError, Dynamic, ExposedType, InstanceHandle, MemberKind, NativeObject, ObjectRef,
    ObjectWorld, ScriptHandle,
};

use crate::bridge::Bridge;

/// Counters for dispatch cache behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Function lookups that went past the cache
    pub searches: u64,
    /// Lookups answered from the cache
    pub cache_hits: u64,
}

/// Per-runtime member dispatcher.
#[derive(Debug)]
pub struct Dispatcher {
    bridge: Bridge,
    cache: FxHashMap<ExposedType, FxHashMap<String, Arc<BoundMember>>>,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new(bridge: Bridge) -> Self {
        Self {
            bridge,
            cache: FxHashMap::default(),
            stats: DispatchStats::default(),
        }
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Number of cached members of one exposed type.
    pub fn cached_members(&self, exposed: &ExposedType) -> usize {
        self.cache.get(exposed).map_or(0, FxHashMap::len)
    }

    /// Read member `name` of a handle.
    ///
    /// Returns `Ok(None)` if the handle has no such member.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn index(&mut self, handle: &ScriptHandle, name: &str) -> Result<Option<Dynamic>, BridgeError> {
        match handle {
            ScriptHandle::Instance(h) => self.index_instance(h, name),
            ScriptHandle::Class(h) => Ok(self.index_class(h, name)),
        }
    }

    /// Assign member `name` of a handle.
    pub fn new_index(&mut self, handle: &ScriptHandle, name: &str, value: Dynamic) -> Result<(), BridgeError> {
        match handle {
            ScriptHandle::Instance(h) => self.new_index_instance(h, name, value),
            ScriptHandle::Class(_) => Err(BridgeError::ReadOnlyProperty {
                name: name.to_string(),
            }),
        }
    }

    /// Call a bound member with `receiver` as the implicit first argument.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn call(&self, member: &BoundMember, receiver: &Dynamic, args: &[Dynamic]) -> Result<Vec<Dynamic>, BridgeError> {
        match member.kind {
            MemberKind::Library => {
                let handle = expect_instance(receiver)?;
                self.call_library(member, handle, args)
            }
            MemberKind::Reflected { declaring } => {
                let handle = expect_instance(receiver)?;
                crate::marshal::invoke_reflected(&self.bridge, handle, member, declaring, args)
            }
            MemberKind::ClassLibrary => {
                let handle = match receiver {
                    Dynamic::Handle(ScriptHandle::Class(h)) => h,
                    other => {
                        return Err(BridgeError::InvalidReceiver {
                            expected: "class",
                            actual: other.type_name().to_string(),
                        });
                    }
                };
                self.call_class_library(member, handle, args)
            }
            MemberKind::Introspection => {
                let Dynamic::Handle(handle) = receiver else {
                    return Err(BridgeError::InvalidReceiver {
                        expected: "handle",
                        actual: receiver.type_name().to_string(),
                    });
                };
                let names = self.get_members(handle)?;
                Ok(vec![Dynamic::Array(names.into_iter().map(Dynamic::String).collect())])
            }
        }
    }

    /// Index `name` and call the result with `handle` as receiver.
    pub fn call_method(
        &mut self,
        handle: &ScriptHandle,
        name: &str,
        args: &[Dynamic],
    ) -> Result<Vec<Dynamic>, BridgeError> {
        match self.index(handle, name)? {
            Some(Dynamic::Member(member)) => self.call(&member, &Dynamic::Handle(handle.clone()), args),
            _ => Err(BridgeError::MemberNotFound {
                exposed: handle.exposed().name().to_string(),
                name: name.to_string(),
            }),
        }
    }

    /// Names a script can index on a handle.
    pub fn get_members(&self, handle: &ScriptHandle) -> Result<Vec<String>, BridgeError> {
        match handle {
            ScriptHandle::Instance(h) => self.instance_members(h),
            ScriptHandle::Class(h) => Ok(self.bridge.registry.class_function_names(h.class)),
        }
    }

    fn cached(&mut self, exposed: &ExposedType, name: &str) -> Option<Arc<BoundMember>> {
        let member = self.cache.get(exposed)?.get(name)?.clone();
        self.stats.cache_hits += 1;
        Some(member)
    }

    fn remember(&mut self, member: BoundMember) -> Arc<BoundMember> {
        let member = Arc::new(member);
        self.cache
            .entry(member.owner.clone())
            .or_default()
            .insert(member.name.clone(), Arc::clone(&member));
        member
    }
}

fn expect_instance(receiver: &Dynamic) -> Result<&InstanceHandle, BridgeError> {
    match receiver {
        Dynamic::Handle(ScriptHandle::Instance(h)) => Ok(h),
        other => Err(BridgeError::InvalidReceiver {
            expected: "instance",
            actual: other.type_name().to_string(),
        }),
    }
}

/// Live objects merged with `object`, in enumeration order.
///
/// Merged references that no longer resolve are skipped.
pub(crate) fn merged_objects(world: &ObjectWorld, object: &dyn NativeObject) -> Vec<(ObjectRef, Arc<dyn NativeObject>)> {
    let Some(component) = object.as_network_component() else {
        return Vec::new();
    };
    component
        .merged()
        .into_iter()
        .filter_map(|r| world.get(r).map(|merged| (r, merged)))
        .collect()
}
