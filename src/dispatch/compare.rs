//! Equality, ordering, and string form of handles.
//!
//! Instances compare by the object their traces address, classes by class
//! identity. A handle is never equal to, or ordered against, a non-handle or
//! a handle of the other kind.

use netbridge_core::{BridgeError, Dynamic, InstanceHandle, ScriptHandle};

use super::Dispatcher;

impl Dispatcher {
    /// Same target, or same class for class handles.
    pub fn equals(&self, handle: &ScriptHandle, other: &Dynamic) -> bool {
        match other {
            Dynamic::Handle(other) => handle == other,
            _ => false,
        }
    }

    /// `<` by target hash. Total within a session, not a domain order.
    pub fn less_than(&self, handle: &ScriptHandle, other: &Dynamic) -> bool {
        match other {
            Dynamic::Handle(other) => handle.less_than(other),
            _ => false,
        }
    }

    pub fn less_equal(&self, handle: &ScriptHandle, other: &Dynamic) -> bool {
        match other {
            Dynamic::Handle(other) => handle.less_equal(other),
            _ => false,
        }
    }

    /// String form of a handle.
    ///
    /// Instances print their exposed type and, for network components, the
    /// quoted nick when set followed by the id.
    pub fn to_display(&self, handle: &ScriptHandle) -> Result<String, BridgeError> {
        match handle {
            ScriptHandle::Instance(h) => self.instance_to_display(h),
            ScriptHandle::Class(h) => self.class_to_display(h),
        }
    }

    fn instance_to_display(&self, handle: &InstanceHandle) -> Result<String, BridgeError> {
        let object = handle.trace.resolve(&self.bridge.world)?;
        let mut text = handle.exposed.name().to_string();
        if let Some(component) = object.as_network_component() {
            let nick = component.nick();
            if !nick.is_empty() {
                text.push_str(&format!(" \"{nick}\""));
            }
            text.push(' ');
            text.push_str(&component.id());
        }
        Ok(text)
    }
}
