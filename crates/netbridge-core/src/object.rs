//! Native object capabilities consumed by the bridge.

use std::any::Any;

use crate::world::ObjectRef;
use crate::TypeHash;

/// A native object that can be addressed from scripts.
///
/// Objects are shared between the simulation and any number of script
/// runtimes, so all mutation goes through interior mutability.
pub trait NativeObject: Any + Send + Sync {
    /// The native class this object is an instance of.
    fn class(&self) -> TypeHash;

    fn as_any(&self) -> &dyn Any;

    /// The network capability, if this object participates in a network.
    fn as_network_component(&self) -> Option<&dyn NetworkComponent> {
        None
    }
}

impl dyn NativeObject {
    /// Downcast to a concrete object type.
    pub fn downcast_ref<T: NativeObject>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Capability of objects that are addressable on a network.
pub trait NetworkComponent: Send + Sync {
    /// Stable textual identifier.
    fn id(&self) -> String;

    /// User-assigned nickname, possibly empty.
    fn nick(&self) -> String;

    fn set_nick(&self, nick: &str);

    /// Objects merged with this one behind a single scripted handle.
    ///
    /// The order is stable for the duration of one call.
    fn merged(&self) -> Vec<ObjectRef>;
}
