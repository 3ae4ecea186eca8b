//! Dispatch on instance handles.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use netbridge_core::convert::arg;
use netbridge_core::{
    BoundMember, BridgeError, Dynamic, InstanceHandle, MemberKind, NativeObject, Trace, TypeHash,
};
use netbridge_registry::{MemberContext, PropertyBinding};

use super::{Dispatcher, merged_objects};

impl Dispatcher {
    pub(super) fn index_instance(
        &mut self,
        handle: &InstanceHandle,
        name: &str,
    ) -> Result<Option<Dynamic>, BridgeError> {
        let object = handle.trace.resolve(&self.bridge.world)?;

        if name == "id" || name == "nick" {
            let component = object
                .as_network_component()
                .ok_or(BridgeError::NotANetworkComponent)?;
            let value = if name == "id" { component.id() } else { component.nick() };
            return Ok(Some(Dynamic::String(value)));
        }

        if let Some((trace, property)) = self.find_property(handle, object.as_ref(), name) {
            let ctx = MemberContext::new(&self.bridge.registry, &self.bridge.world, &trace);
            return property.get(&ctx).map(Some);
        }

        if name == "getMembers" {
            let member = BoundMember::new(name, handle.exposed.clone(), MemberKind::Introspection);
            return Ok(Some(Dynamic::Member(Arc::new(member))));
        }

        if let Some(member) = self.cached(&handle.exposed, name) {
            return Ok(Some(Dynamic::Member(member)));
        }

        self.stats.searches += 1;
        let Some(kind) = self.resolve_function(handle, object.as_ref(), name) else {
            trace!(exposed = handle.exposed.name(), member = name, "member not found");
            return Ok(None);
        };
        debug!(exposed = handle.exposed.name(), member = name, ?kind, "caching member");
        let member = self.remember(BoundMember::new(name, handle.exposed.clone(), kind));
        Ok(Some(Dynamic::Member(member)))
    }

    pub(super) fn new_index_instance(
        &mut self,
        handle: &InstanceHandle,
        name: &str,
        value: Dynamic,
    ) -> Result<(), BridgeError> {
        let object = handle.trace.resolve(&self.bridge.world)?;

        if name == "nick" {
            let component = object
                .as_network_component()
                .ok_or(BridgeError::NotANetworkComponent)?;
            let nick: String = arg(std::slice::from_ref(&value), 0)?;
            component.set_nick(&nick);
            return Ok(());
        }

        let Some((trace, property)) = self.find_property(handle, object.as_ref(), name) else {
            return Err(BridgeError::MemberNotFound {
                exposed: handle.exposed.name().to_string(),
                name: name.to_string(),
            });
        };
        let Some(setter) = property.setter() else {
            return Err(BridgeError::ReadOnlyProperty {
                name: name.to_string(),
            });
        };
        let ctx = MemberContext::new(&self.bridge.registry, &self.bridge.world, &trace);
        setter(&ctx, value)
    }

    /// Property `name` on the handle's own type, else on the first merged
    /// object that has it. The returned trace addresses the owner.
    fn find_property(
        &self,
        handle: &InstanceHandle,
        object: &dyn NativeObject,
        name: &str,
    ) -> Option<(Trace, PropertyBinding)> {
        let registry = &self.bridge.registry;
        if let Some(property) = registry.find_property(handle.exposed.class, name) {
            return Some((handle.trace.clone(), property.clone()));
        }
        merged_objects(&self.bridge.world, object)
            .into_iter()
            .find_map(|(r, merged)| {
                let property = registry.find_property(merged.class(), name)?;
                trace!(exposed = handle.exposed.name(), member = name, "property found on merged object");
                Some((handle.trace.through(r), property.clone()))
            })
    }

    /// Kind of the function `name` resolves to, if any.
    fn resolve_function(&self, handle: &InstanceHandle, object: &dyn NativeObject, name: &str) -> Option<MemberKind> {
        let registry = &self.bridge.registry;
        let merged = merged_objects(&self.bridge.world, object);

        if registry.find_function(handle.exposed.class, name).is_some()
            || merged
                .iter()
                .any(|(_, o)| registry.find_function(o.class(), name).is_some())
        {
            return Some(MemberKind::Library);
        }

        std::iter::once(object.class())
            .chain(merged.iter().map(|(_, o)| o.class()))
            .find_map(|class| registry.reflected_function(class, name))
            .map(|function| MemberKind::Reflected {
                declaring: function.declaring(),
            })
    }

    /// Call a registered instance function, own type first, then merged.
    pub(super) fn call_library(
        &self,
        member: &BoundMember,
        handle: &InstanceHandle,
        args: &[Dynamic],
    ) -> Result<Vec<Dynamic>, BridgeError> {
        let registry = &self.bridge.registry;
        let world = &self.bridge.world;
        let object = handle.trace.resolve(world)?;

        if !registry.is_child_of(handle.exposed.class, member.owner.class) {
            return Err(BridgeError::NotAllowedTypeForFunction {
                name: member.name.clone(),
            });
        }

        if let Some(function) = registry.find_function(handle.exposed.class, &member.name) {
            let ctx = MemberContext::new(registry, world, &handle.trace);
            return function(&ctx, args);
        }

        for (r, merged) in merged_objects(world, object.as_ref()) {
            if let Some(function) = registry.find_function(merged.class(), &member.name) {
                trace!(exposed = handle.exposed.name(), member = %member.name, "calling merged function");
                let trace = handle.trace.through(r);
                let ctx = MemberContext::new(registry, world, &trace);
                return function(&ctx, args);
            }
        }

        Err(BridgeError::UnableToCallFunction {
            name: member.name.clone(),
        })
    }

    /// `id`, `nick`, then registered and reflected member names of the
    /// object and of each merged object. Duplicates are listed once.
    pub(super) fn instance_members(&self, handle: &InstanceHandle) -> Result<Vec<String>, BridgeError> {
        let registry = &self.bridge.registry;
        let world = &self.bridge.world;
        let object = handle.trace.resolve(world)?;

        let mut names = vec!["id".to_string(), "nick".to_string()];
        let push_class = |names: &mut Vec<String>, class: TypeHash| {
            names.extend(registry.member_names(class));
            names.extend(registry.reflected_names(class));
        };

        push_class(&mut names, object.class());
        for (_, merged) in merged_objects(world, object.as_ref()) {
            push_class(&mut names, merged.class());
        }

        let mut seen = FxHashSet::default();
        names.retain(|name| seen.insert(name.clone()));
        Ok(names)
    }
}
