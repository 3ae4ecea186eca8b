//! Member binding types and the contexts they run in.

use std::any::type_name;
use std::sync::Arc;

use netbridge_core::{
    BridgeError, ClassHandle, Dynamic, NativeObject, ObjectRef, ObjectWorld, ScriptHandle, Trace,
    TypeHash,
};

use crate::BridgeRegistry;

/// Context handed to instance functions and property accessors.
///
/// Carries the trace of the receiver. The target is dereferenced on demand
/// and fails with [`BridgeError::InstanceInvalid`] once it is gone.
pub struct MemberContext<'a> {
    registry: &'a BridgeRegistry,
    world: &'a ObjectWorld,
    trace: &'a Trace,
}

impl<'a> MemberContext<'a> {
    pub fn new(registry: &'a BridgeRegistry, world: &'a ObjectWorld, trace: &'a Trace) -> Self {
        Self {
            registry,
            world,
            trace,
        }
    }

    /// Path to the receiver.
    pub fn trace(&self) -> &Trace {
        self.trace
    }

    pub fn registry(&self) -> &BridgeRegistry {
        self.registry
    }

    pub fn world(&self) -> &ObjectWorld {
        self.world
    }

    /// Dereference the receiver.
    pub fn target(&self) -> Result<Arc<dyn NativeObject>, BridgeError> {
        self.trace.resolve(self.world)
    }

    /// Run `f` against the target downcast to its concrete type.
    pub fn with_target<T: NativeObject, R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, BridgeError> {
        let target = self.target()?;
        let Some(object) = target.downcast_ref::<T>() else {
            let actual = self
                .registry
                .exposed_type(target.class())
                .map(|exposed| exposed.name().to_string())
                .unwrap_or_else(|| format!("{:?}", target.class()));
            return Err(BridgeError::InvalidReceiver {
                expected: type_name::<T>(),
                actual,
            });
        };
        Ok(f(object))
    }

    /// Script value for an object reached from the receiver.
    ///
    /// The returned handle addresses `object` through the receiver's trace.
    /// Objects that are gone or have no exposed type become nil.
    pub fn instance(&self, object: ObjectRef) -> Dynamic {
        self.registry
            .instance_for(self.world, self.trace.through(object))
            .map(|handle| Dynamic::Handle(handle.into()))
            .unwrap_or_default()
    }
}

/// Context handed to class-level functions.
pub struct ClassContext<'a> {
    registry: &'a BridgeRegistry,
    class: TypeHash,
}

impl<'a> ClassContext<'a> {
    pub fn new(registry: &'a BridgeRegistry, class: TypeHash) -> Self {
        Self { registry, class }
    }

    /// The class of the handle the function was called on.
    pub fn class(&self) -> TypeHash {
        self.class
    }

    pub fn registry(&self) -> &BridgeRegistry {
        self.registry
    }

    /// Script value for a class handle, nil if the class has no class-level binding.
    pub fn class_handle(&self, class: TypeHash) -> Dynamic {
        self.registry
            .class_instance_for(class)
            .map(|handle: ClassHandle| Dynamic::Handle(ScriptHandle::Class(handle)))
            .unwrap_or_default()
    }
}

/// Instance function: receives the receiver context and the script arguments.
pub type FunctionBinding =
    Arc<dyn Fn(&MemberContext<'_>, &[Dynamic]) -> Result<Vec<Dynamic>, BridgeError> + Send + Sync>;

/// Class-level function.
pub type ClassFunctionBinding =
    Arc<dyn Fn(&ClassContext<'_>, &[Dynamic]) -> Result<Vec<Dynamic>, BridgeError> + Send + Sync>;

pub type PropertyGetter = Arc<dyn Fn(&MemberContext<'_>) -> Result<Dynamic, BridgeError> + Send + Sync>;

pub type PropertySetter =
    Arc<dyn Fn(&MemberContext<'_>, Dynamic) -> Result<(), BridgeError> + Send + Sync>;

/// Instance property: a getter and an optional setter.
///
/// A property without a setter is read-only.
#[derive(Clone)]
pub struct PropertyBinding {
    get: PropertyGetter,
    set: Option<PropertySetter>,
}

impl PropertyBinding {
    pub fn read_only<G>(get: G) -> Self
    where
        G: Fn(&MemberContext<'_>) -> Result<Dynamic, BridgeError> + Send + Sync + 'static,
    {
        Self {
            get: Arc::new(get),
            set: None,
        }
    }

    pub fn read_write<G, S>(get: G, set: S) -> Self
    where
        G: Fn(&MemberContext<'_>) -> Result<Dynamic, BridgeError> + Send + Sync + 'static,
        S: Fn(&MemberContext<'_>, Dynamic) -> Result<(), BridgeError> + Send + Sync + 'static,
    {
        Self {
            get: Arc::new(get),
            set: Some(Arc::new(set)),
        }
    }

    /// True if the property has no setter.
    pub fn is_read_only(&self) -> bool {
        self.set.is_none()
    }

    /// Read the property of the receiver in `ctx`.
    pub fn get(&self, ctx: &MemberContext<'_>) -> Result<Dynamic, BridgeError> {
        (self.get)(ctx)
    }

    pub fn setter(&self) -> Option<&PropertySetter> {
        self.set.as_ref()
    }
}
