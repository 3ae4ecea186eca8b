//! Script-side value type.

use std::fmt;
use std::sync::Arc;

use crate::handle::{BoundMember, ScriptHandle};

/// A value as the scripting runtime sees it.
///
/// Every argument passed into the bridge and every result handed back is a
/// `Dynamic`. Handles to native objects and bound members are ordinary values
/// so they can be stored in script globals and persisted with them.
#[derive(Clone, PartialEq, Default)]
pub enum Dynamic {
    /// Absent value
    #[default]
    Nil,
    /// Boolean value
    Bool(bool),
    /// Integer value (all integer widths stored as i64)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value (owned)
    String(String),
    /// Ordered sequence
    Array(Vec<Dynamic>),
    /// Handle to a native object or class
    Handle(ScriptHandle),
    /// A member already resolved on an exposed type, callable with a receiver
    Member(Arc<BoundMember>),
}

impl Dynamic {
    /// Get a human-readable name for this value's type.
    ///
    /// Handles report the exposed type name they are bound to.
    pub fn type_name(&self) -> &str {
        match self {
            Dynamic::Nil => "nil",
            Dynamic::Bool(_) => "bool",
            Dynamic::Int(_) => "int",
            Dynamic::Float(_) => "float",
            Dynamic::String(_) => "string",
            Dynamic::Array(_) => "array",
            Dynamic::Handle(handle) => handle.exposed().name(),
            Dynamic::Member(_) => "function",
        }
    }

    /// Check if this value is nil.
    pub fn is_nil(&self) -> bool {
        matches!(self, Dynamic::Nil)
    }

    /// The handle, if this is one.
    pub fn as_handle(&self) -> Option<&ScriptHandle> {
        match self {
            Dynamic::Handle(handle) => Some(handle),
            _ => None,
        }
    }

    /// The bound member, if this is one.
    pub fn as_member(&self) -> Option<&Arc<BoundMember>> {
        match self {
            Dynamic::Member(member) => Some(member),
            _ => None,
        }
    }

    /// The string contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Dynamic::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dynamic::Nil => write!(f, "Nil"),
            Dynamic::Bool(v) => write!(f, "Bool({})", v),
            Dynamic::Int(v) => write!(f, "Int({})", v),
            Dynamic::Float(v) => write!(f, "Float({})", v),
            Dynamic::String(s) => write!(f, "String({:?})", s),
            Dynamic::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Dynamic::Handle(h) => write!(f, "Handle({:?})", h),
            Dynamic::Member(m) => write!(f, "Member({}.{})", m.owner.name, m.name),
        }
    }
}

impl From<ScriptHandle> for Dynamic {
    fn from(handle: ScriptHandle) -> Self {
        Dynamic::Handle(handle)
    }
}

impl From<Arc<BoundMember>> for Dynamic {
    fn from(member: Arc<BoundMember>) -> Self {
        Dynamic::Member(member)
    }
}
