//! BridgeRegistry - sealed type and member registry.
//!
//! The registry answers every lookup the dispatcher makes:
//!
//! - **Types**: native class -> exposed scripting name, separately for
//!   instance-level and class-level bindings. Lookups walk the super-class
//!   chain, so a subclass without its own binding is exposed as its nearest
//!   bound ancestor.
//! - **Members**: registered instance functions, properties, and class-level
//!   functions, again resolved through the super-class chain.
//! - **Reflection**: native functions whose declared name carries the
//!   scripting prefix.
//!
//! # Thread Safety
//!
//! A `BridgeRegistry` is only produced by
//! [`RegistryBuilder::build`](crate::RegistryBuilder::build) and is immutable
//! afterwards. It is shared between runtimes behind an `Arc` and read without
//! synchronization.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use netbridge_core::reflection::{ClassCatalog, ReflectedFunction};
use netbridge_core::{ClassHandle, ExposedType, InstanceHandle, ObjectWorld, Trace, TypeHash};

use crate::bindings::{ClassFunctionBinding, FunctionBinding, PropertyBinding};

/// A native class bound to an exposed scripting name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeBinding {
    pub exposed: ExposedType,
    pub is_class_level: bool,
}

/// Members registered directly on one native class.
#[derive(Clone, Default)]
pub(crate) struct MemberTable {
    pub(crate) functions: FxHashMap<String, FunctionBinding>,
    pub(crate) properties: FxHashMap<String, PropertyBinding>,
    pub(crate) class_functions: FxHashMap<String, ClassFunctionBinding>,
    /// Instance member names in registration order
    pub(crate) instance_order: Vec<String>,
    /// Class function names in registration order
    pub(crate) class_order: Vec<String>,
}

impl MemberTable {
    pub(crate) fn note_instance(&mut self, name: &str) {
        if !self.instance_order.iter().any(|n| n == name) {
            self.instance_order.push(name.to_string());
        }
    }

    pub(crate) fn note_class(&mut self, name: &str) {
        if !self.class_order.iter().any(|n| n == name) {
            self.class_order.push(name.to_string());
        }
    }
}

/// Immutable registry shared by all runtimes.
pub struct BridgeRegistry {
    pub(crate) catalog: ClassCatalog,
    pub(crate) instance_types: FxHashMap<TypeHash, TypeBinding>,
    pub(crate) class_types: FxHashMap<TypeHash, TypeBinding>,
    pub(crate) names: FxHashMap<Arc<str>, TypeBinding>,
    pub(crate) members: FxHashMap<TypeHash, MemberTable>,
    pub(crate) function_prefix: String,
}

impl BridgeRegistry {
    /// The reflected class hierarchy.
    pub fn catalog(&self) -> &ClassCatalog {
        &self.catalog
    }

    /// Prefix marking reflected functions as scriptable.
    pub fn function_prefix(&self) -> &str {
        &self.function_prefix
    }

    /// True if `class` is `parent` or derives from it.
    pub fn is_child_of(&self, class: TypeHash, parent: TypeHash) -> bool {
        self.catalog.is_child_of(class, parent)
    }

    // ==========================================================================
    // Types
    // ==========================================================================

    /// Instance-level binding of `class` or its nearest bound ancestor.
    pub fn find_binding(&self, class: TypeHash) -> Option<&TypeBinding> {
        self.catalog
            .ancestors(class)
            .find_map(|ancestor| self.instance_types.get(&ancestor))
    }

    /// Class-level binding of `class` or its nearest bound ancestor.
    pub fn find_class_binding(&self, class: TypeHash) -> Option<&TypeBinding> {
        self.catalog
            .ancestors(class)
            .find_map(|ancestor| self.class_types.get(&ancestor))
    }

    /// Exposed instance type for objects of `class`.
    pub fn exposed_type(&self, class: TypeHash) -> Option<&ExposedType> {
        self.find_binding(class).map(|binding| &binding.exposed)
    }

    /// Look up a binding by exposed name.
    pub fn find_type(&self, name: &str) -> Option<&TypeBinding> {
        self.names.get(name)
    }

    /// Number of exposed types, instance and class level.
    pub fn type_count(&self) -> usize {
        self.names.len()
    }

    // ==========================================================================
    // Members
    // ==========================================================================

    /// Instance function `name` of `class` or an ancestor.
    pub fn find_function(&self, class: TypeHash, name: &str) -> Option<&FunctionBinding> {
        self.catalog
            .ancestors(class)
            .find_map(|ancestor| self.members.get(&ancestor)?.functions.get(name))
    }

    /// Property `name` of `class` or an ancestor.
    pub fn find_property(&self, class: TypeHash, name: &str) -> Option<&PropertyBinding> {
        self.catalog
            .ancestors(class)
            .find_map(|ancestor| self.members.get(&ancestor)?.properties.get(name))
    }

    /// Class-level function `name` of `class` or an ancestor.
    pub fn find_class_function(&self, class: TypeHash, name: &str) -> Option<&ClassFunctionBinding> {
        self.catalog
            .ancestors(class)
            .find_map(|ancestor| self.members.get(&ancestor)?.class_functions.get(name))
    }

    /// Registered instance function and property names, own class first.
    pub fn member_names(&self, class: TypeHash) -> Vec<String> {
        self.collect_names(class, |table| &table.instance_order)
    }

    /// Registered class function names, own class first.
    pub fn class_function_names(&self, class: TypeHash) -> Vec<String> {
        self.collect_names(class, |table| &table.class_order)
    }

    fn collect_names(&self, class: TypeHash, order: impl Fn(&MemberTable) -> &Vec<String>) -> Vec<String> {
        let mut seen = FxHashSet::default();
        let mut names = Vec::new();
        for ancestor in self.catalog.ancestors(class) {
            let Some(table) = self.members.get(&ancestor) else {
                continue;
            };
            for name in order(table) {
                if seen.insert(name.as_str()) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    // ==========================================================================
    // Reflection
    // ==========================================================================

    /// Reflected function exposed as `name`, searched up the chain.
    pub fn reflected_function(&self, class: TypeHash, name: &str) -> Option<&ReflectedFunction> {
        let declared = format!("{}{}", self.function_prefix, name);
        self.catalog.find_function(class, &declared)
    }

    /// Exposed names of every scriptable reflected function, own class first.
    pub fn reflected_names(&self, class: TypeHash) -> Vec<String> {
        let mut seen = FxHashSet::default();
        let mut names = Vec::new();
        for ancestor in self.catalog.ancestors(class) {
            let Some(native) = self.catalog.get(ancestor) else {
                continue;
            };
            for function in native.functions() {
                if let Some(exposed) = function.name().strip_prefix(self.function_prefix.as_str())
                    && !exposed.is_empty()
                    && seen.insert(exposed)
                {
                    names.push(exposed.to_string());
                }
            }
        }
        names
    }

    // ==========================================================================
    // Handles
    // ==========================================================================

    /// Handle for the object `trace` addresses, exposed by its class.
    ///
    /// Returns None if the target is gone or its class has no binding.
    pub fn instance_for(&self, world: &ObjectWorld, trace: Trace) -> Option<InstanceHandle> {
        let object = world.get(trace.target())?;
        let exposed = self.exposed_type(object.class())?.clone();
        Some(InstanceHandle::new(trace, exposed))
    }

    /// Handle for a native class with a class-level binding.
    pub fn class_instance_for(&self, class: TypeHash) -> Option<ClassHandle> {
        let binding = self.find_class_binding(class)?;
        Some(ClassHandle::new(class, binding.exposed.clone()))
    }
}

impl std::fmt::Debug for BridgeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeRegistry")
            .field("classes", &self.catalog.len())
            .field("instance_types", &self.instance_types.len())
            .field("class_types", &self.class_types.len())
            .field("function_prefix", &self.function_prefix)
            .finish()
    }
}
