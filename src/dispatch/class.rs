//! Dispatch on class handles.

use std::sync::Arc;

use tracing::debug;

use netbridge_core::{BoundMember, BridgeError, ClassHandle, Dynamic, MemberKind};
use netbridge_registry::ClassContext;

use super::Dispatcher;

/// Class function used for the string form of class handles.
pub(super) const TO_STRING: &str = "__tostring";

impl Dispatcher {
    /// Class handles expose only `getMembers` and class-level functions.
    pub(super) fn index_class(&mut self, handle: &ClassHandle, name: &str) -> Option<Dynamic> {
        if name == "getMembers" {
            let member = BoundMember::new(name, handle.exposed.clone(), MemberKind::Introspection);
            return Some(Dynamic::Member(Arc::new(member)));
        }

        if let Some(member) = self.cached(&handle.exposed, name) {
            return Some(Dynamic::Member(member));
        }

        self.stats.searches += 1;
        self.bridge.registry.find_class_function(handle.class, name)?;
        debug!(exposed = handle.exposed.name(), member = name, "caching class member");
        let member = self.remember(BoundMember::new(name, handle.exposed.clone(), MemberKind::ClassLibrary));
        Some(Dynamic::Member(member))
    }

    pub(super) fn call_class_library(
        &self,
        member: &BoundMember,
        handle: &ClassHandle,
        args: &[Dynamic],
    ) -> Result<Vec<Dynamic>, BridgeError> {
        let registry = &self.bridge.registry;
        if !registry.is_child_of(handle.class, member.owner.class) {
            return Err(BridgeError::NotAllowedTypeForFunction {
                name: member.name.clone(),
            });
        }
        let function = registry
            .find_class_function(handle.class, &member.name)
            .ok_or_else(|| BridgeError::UnableToCallFunction {
                name: member.name.clone(),
            })?;
        let ctx = ClassContext::new(registry, handle.class);
        function(&ctx, args)
    }

    /// `__tostring` class function if registered, else the exposed name.
    pub(super) fn class_to_display(&self, handle: &ClassHandle) -> Result<String, BridgeError> {
        let registry = &self.bridge.registry;
        let Some(function) = registry.find_class_function(handle.class, TO_STRING) else {
            return Ok(handle.exposed.name().to_string());
        };
        let ctx = ClassContext::new(registry, handle.class);
        let results = function(&ctx, &[])?;
        match results.into_iter().next() {
            Some(Dynamic::String(s)) => Ok(s),
            other => Err(BridgeError::ArgumentTypeMismatch {
                index: 1,
                expected: "string".to_string(),
                actual: other.unwrap_or_default().type_name().to_string(),
            }),
        }
    }
}
