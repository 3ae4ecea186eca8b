//! Native class descriptions and the inheritance catalog.

use rustc_hash::FxHashMap;

use crate::reflection::function::ReflectedFunction;
use crate::TypeHash;

/// Reflection data for one native class.
#[derive(Clone, Debug)]
pub struct NativeClass {
    name: String,
    hash: TypeHash,
    super_class: Option<TypeHash>,
    functions: Vec<ReflectedFunction>,
}

impl NativeClass {
    /// Describe a class. Its hash is derived from the name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            hash: TypeHash::from_name(&name),
            name,
            super_class: None,
            functions: Vec::new(),
        }
    }

    /// Set the direct super class.
    pub fn extends(mut self, super_class: TypeHash) -> Self {
        self.super_class = Some(super_class);
        self
    }

    /// Declare a reflected function on this class.
    pub fn function(mut self, mut function: ReflectedFunction) -> Self {
        function.set_declaring(self.hash);
        self.functions.push(function);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hash(&self) -> TypeHash {
        self.hash
    }

    pub fn super_class(&self) -> Option<TypeHash> {
        self.super_class
    }

    /// Functions declared directly on this class.
    pub fn functions(&self) -> &[ReflectedFunction] {
        &self.functions
    }
}

/// All known native classes, linked by their super-class chain.
#[derive(Clone, Debug, Default)]
pub struct ClassCatalog {
    classes: FxHashMap<TypeHash, NativeClass>,
}

impl ClassCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class, returning the one it replaced.
    pub fn insert(&mut self, class: NativeClass) -> Option<NativeClass> {
        self.classes.insert(class.hash, class)
    }

    pub fn get(&self, hash: TypeHash) -> Option<&NativeClass> {
        self.classes.get(&hash)
    }

    pub fn contains(&self, hash: TypeHash) -> bool {
        self.classes.contains_key(&hash)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// The class itself followed by each super class up to the root.
    pub fn ancestors(&self, hash: TypeHash) -> Ancestors<'_> {
        Ancestors {
            catalog: self,
            next: Some(hash),
            remaining: self.classes.len() + 1,
        }
    }

    /// True if `class` is `parent` or derives from it.
    pub fn is_child_of(&self, class: TypeHash, parent: TypeHash) -> bool {
        self.ancestors(class).any(|ancestor| ancestor == parent)
    }

    /// Find a reflected function by declared name, searching up the chain.
    pub fn find_function(&self, class: TypeHash, name: &str) -> Option<&ReflectedFunction> {
        self.ancestors(class)
            .filter_map(|ancestor| self.get(ancestor))
            .find_map(|c| c.functions.iter().find(|f| f.name() == name))
    }
}

/// Iterator over a class and its super classes.
///
/// Bounded by the catalog size so a malformed cyclic chain terminates.
pub struct Ancestors<'a> {
    catalog: &'a ClassCatalog,
    next: Option<TypeHash>,
    remaining: usize,
}

impl Iterator for Ancestors<'_> {
    type Item = TypeHash;

    fn next(&mut self) -> Option<TypeHash> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.next?;
        self.next = self.catalog.get(current).and_then(NativeClass::super_class);
        Some(current)
    }
}
