//! Registration phase of the bridge registry.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use netbridge_core::reflection::{ClassCatalog, NativeClass};
use netbridge_core::{BridgeError, Dynamic, ExposedType, RegistrationError, TypeHash};

use crate::bindings::{ClassContext, MemberContext, PropertyBinding};
use crate::registry::{BridgeRegistry, MemberTable, TypeBinding};

/// Declared-name prefix marking a reflected function as scriptable.
pub const DEFAULT_FUNCTION_PREFIX: &str = "netFunc_";

/// Mutable registry used during startup.
///
/// Classes, type bindings, and members are registered here before any script
/// runs. [`build`](Self::build) seals the result into a [`BridgeRegistry`].
///
/// # Example
///
/// ```
/// use netbridge_core::reflection::NativeClass;
/// use netbridge_core::Dynamic;
/// use netbridge_registry::RegistryBuilder;
///
/// let lamp = NativeClass::new("Lamp");
/// let hash = lamp.hash();
///
/// let mut builder = RegistryBuilder::new();
/// builder.register_class(lamp).unwrap();
/// builder.register_type(hash, "Lamp", false).unwrap();
/// builder
///     .register_function(hash, "isOn", |_ctx, _args| Ok(vec![Dynamic::Bool(true)]))
///     .unwrap();
///
/// let registry = builder.build();
/// assert!(registry.find_function(hash, "isOn").is_some());
/// ```
pub struct RegistryBuilder {
    catalog: ClassCatalog,
    instance_types: FxHashMap<TypeHash, TypeBinding>,
    class_types: FxHashMap<TypeHash, TypeBinding>,
    names: FxHashMap<Arc<str>, TypeBinding>,
    members: FxHashMap<TypeHash, MemberTable>,
    function_prefix: String,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            catalog: ClassCatalog::new(),
            instance_types: FxHashMap::default(),
            class_types: FxHashMap::default(),
            names: FxHashMap::default(),
            members: FxHashMap::default(),
            function_prefix: DEFAULT_FUNCTION_PREFIX.to_string(),
        }
    }

    /// Use a different declared-name prefix for reflected functions.
    pub fn with_function_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.function_prefix = prefix.into();
        self
    }

    /// Add a native class to the catalog.
    pub fn register_class(&mut self, class: NativeClass) -> Result<(), RegistrationError> {
        if self.catalog.contains(class.hash()) {
            return Err(RegistrationError::DuplicateClass {
                name: class.name().to_string(),
            });
        }
        trace!(class = class.name(), functions = class.functions().len(), "registered native class");
        self.catalog.insert(class);
        Ok(())
    }

    /// Bind a native class to an exposed scripting name.
    ///
    /// Registering the same class and name again is a no-op. Registering the
    /// class under a new name replaces its previous binding of the same kind.
    /// A name already bound to a different class is rejected.
    pub fn register_type(
        &mut self,
        class: TypeHash,
        name: &str,
        is_class_level: bool,
    ) -> Result<(), RegistrationError> {
        if !self.catalog.contains(class) {
            return Err(RegistrationError::UnknownClass(class));
        }

        if let Some(existing) = self.names.get(name) {
            if existing.exposed.class == class && existing.is_class_level == is_class_level {
                return Ok(());
            }
            return Err(RegistrationError::DuplicateType {
                name: name.to_string(),
            });
        }

        let binding = TypeBinding {
            exposed: ExposedType::new(class, name),
            is_class_level,
        };
        let table = if is_class_level {
            &mut self.class_types
        } else {
            &mut self.instance_types
        };
        if let Some(previous) = table.insert(class, binding.clone()) {
            self.names.remove(&previous.exposed.name);
        }
        self.names.insert(binding.exposed.name.clone(), binding);

        trace!(name, is_class_level, "registered type binding");
        Ok(())
    }

    /// Register an instance function on an instance-level type.
    pub fn register_function<F>(&mut self, class: TypeHash, name: &str, function: F) -> Result<(), RegistrationError>
    where
        F: Fn(&MemberContext<'_>, &[Dynamic]) -> Result<Vec<Dynamic>, BridgeError> + Send + Sync + 'static,
    {
        self.check_kind(class, name, "function", false)?;
        let table = self.members.entry(class).or_default();
        table.functions.insert(name.to_string(), Arc::new(function));
        table.note_instance(name);
        Ok(())
    }

    /// Register a property on an instance-level type.
    pub fn register_property(
        &mut self,
        class: TypeHash,
        name: &str,
        property: PropertyBinding,
    ) -> Result<(), RegistrationError> {
        self.check_kind(class, name, "property", false)?;
        let table = self.members.entry(class).or_default();
        table.properties.insert(name.to_string(), property);
        table.note_instance(name);
        Ok(())
    }

    /// Register a class-level function on a class-level type.
    pub fn register_class_function<F>(
        &mut self,
        class: TypeHash,
        name: &str,
        function: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&ClassContext<'_>, &[Dynamic]) -> Result<Vec<Dynamic>, BridgeError> + Send + Sync + 'static,
    {
        self.check_kind(class, name, "class function", true)?;
        let table = self.members.entry(class).or_default();
        table.class_functions.insert(name.to_string(), Arc::new(function));
        table.note_class(name);
        Ok(())
    }

    /// Members may only be registered on a class bound with the matching kind.
    fn check_kind(
        &self,
        class: TypeHash,
        name: &str,
        member: &'static str,
        class_level: bool,
    ) -> Result<(), RegistrationError> {
        let (wanted, other) = if class_level {
            (&self.class_types, &self.instance_types)
        } else {
            (&self.instance_types, &self.class_types)
        };
        if wanted.contains_key(&class) {
            return Ok(());
        }
        if other.contains_key(&class) {
            return Err(RegistrationError::WrongBindingKind {
                name: name.to_string(),
                member,
                kind: if class_level { "instance" } else { "class" },
            });
        }
        Err(RegistrationError::UnboundType {
            class,
            kind: if class_level { "class" } else { "instance" },
        })
    }

    /// Seal the registry.
    pub fn build(self) -> BridgeRegistry {
        debug!(
            classes = self.catalog.len(),
            instance_types = self.instance_types.len(),
            class_types = self.class_types.len(),
            prefix = %self.function_prefix,
            "bridge registry sealed"
        );
        BridgeRegistry {
            catalog: self.catalog,
            instance_types: self.instance_types,
            class_types: self.class_types,
            names: self.names,
            members: self.members,
            function_prefix: self.function_prefix,
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
