//! Type and member registries for the object bridge.
//!
//! Registration happens once at startup through [`RegistryBuilder`]. The
//! builder is then sealed into a [`BridgeRegistry`], which the dispatcher of
//! every runtime reads concurrently.

mod bindings;
mod builder;
mod registry;

pub use bindings::{
    ClassContext, ClassFunctionBinding, FunctionBinding, MemberContext, PropertyBinding,
    PropertyGetter, PropertySetter,
};
pub use builder::{DEFAULT_FUNCTION_PREFIX, RegistryBuilder};
pub use registry::{BridgeRegistry, TypeBinding};
