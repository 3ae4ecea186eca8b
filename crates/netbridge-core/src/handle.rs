//! Script handles to native objects, classes, and bound members.
//!
//! Handles are plain values created on demand. Two handles created for the
//! same target are equal even though they are distinct wrappers.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

use crate::trace::Trace;
use crate::type_hash::hash_constants;
use crate::TypeHash;

/// A native class together with the name scripts know it by.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExposedType {
    /// The class the binding was registered for
    pub class: TypeHash,
    /// The exposed scripting name
    pub name: Arc<str>,
}

impl ExposedType {
    pub fn new(class: TypeHash, name: impl Into<Arc<str>>) -> Self {
        Self {
            class,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ExposedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Handle to a native object reached through a trace.
#[derive(Clone, Debug)]
pub struct InstanceHandle {
    pub trace: Trace,
    pub exposed: ExposedType,
}

impl InstanceHandle {
    pub fn new(trace: Trace, exposed: ExposedType) -> Self {
        Self { trace, exposed }
    }
}

impl PartialEq for InstanceHandle {
    fn eq(&self, other: &Self) -> bool {
        self.trace == other.trace
    }
}

/// Handle to a native class.
#[derive(Clone, Debug)]
pub struct ClassHandle {
    pub class: TypeHash,
    pub exposed: ExposedType,
}

impl ClassHandle {
    pub fn new(class: TypeHash, exposed: ExposedType) -> Self {
        Self { class, exposed }
    }
}

impl PartialEq for ClassHandle {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class
    }
}

/// A handle as stored in script values.
#[derive(Clone, Debug, PartialEq)]
pub enum ScriptHandle {
    Instance(InstanceHandle),
    Class(ClassHandle),
}

impl ScriptHandle {
    pub fn exposed(&self) -> &ExposedType {
        match self {
            ScriptHandle::Instance(h) => &h.exposed,
            ScriptHandle::Class(h) => &h.exposed,
        }
    }

    /// "instance" or "class".
    pub fn kind_name(&self) -> &'static str {
        match self {
            ScriptHandle::Instance(_) => "instance",
            ScriptHandle::Class(_) => "class",
        }
    }

    pub fn as_instance(&self) -> Option<&InstanceHandle> {
        match self {
            ScriptHandle::Instance(h) => Some(h),
            ScriptHandle::Class(_) => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassHandle> {
        match self {
            ScriptHandle::Class(h) => Some(h),
            ScriptHandle::Instance(_) => None,
        }
    }

    /// Hash of the target identity used for ordering.
    ///
    /// Stable within a session only. The order it induces has no meaning
    /// beyond being total.
    pub fn ordering_key(&self) -> u64 {
        match self {
            ScriptHandle::Instance(h) => {
                let target = h.trace.target();
                let mut bytes = [0u8; 8];
                bytes[..4].copy_from_slice(&target.index.to_le_bytes());
                bytes[4..].copy_from_slice(&target.generation.to_le_bytes());
                xxh64(&bytes, hash_constants::INSTANCE_ORDER)
            }
            ScriptHandle::Class(h) => xxh64(&h.class.0.to_le_bytes(), hash_constants::CLASS_ORDER),
        }
    }

    /// `<` between handles of the same kind. Handles of different kinds are unordered.
    pub fn less_than(&self, other: &ScriptHandle) -> bool {
        self.same_kind(other) && self.ordering_key() < other.ordering_key()
    }

    /// `<=` between handles of the same kind.
    pub fn less_equal(&self, other: &ScriptHandle) -> bool {
        self.same_kind(other) && self.ordering_key() <= other.ordering_key()
    }

    fn same_kind(&self, other: &ScriptHandle) -> bool {
        matches!(
            (self, other),
            (ScriptHandle::Instance(_), ScriptHandle::Instance(_))
                | (ScriptHandle::Class(_), ScriptHandle::Class(_))
        )
    }
}

impl From<InstanceHandle> for ScriptHandle {
    fn from(handle: InstanceHandle) -> Self {
        ScriptHandle::Instance(handle)
    }
}

impl From<ClassHandle> for ScriptHandle {
    fn from(handle: ClassHandle) -> Self {
        ScriptHandle::Class(handle)
    }
}

/// How a bound member is implemented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberKind {
    /// Registered instance function
    Library,
    /// Reflected native function declared on `declaring`
    Reflected { declaring: TypeHash },
    /// Registered class-level function
    ClassLibrary,
    /// The built-in `getMembers` listing
    Introspection,
}

/// A member resolved by name on an exposed type.
///
/// Bound members capture no receiver: the same bound member serves every
/// handle of its exposed type and receives the handle when it is called.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundMember {
    pub name: String,
    pub owner: ExposedType,
    pub kind: MemberKind,
}

impl BoundMember {
    pub fn new(name: impl Into<String>, owner: ExposedType, kind: MemberKind) -> Self {
        Self {
            name: name.into(),
            owner,
            kind,
        }
    }
}
