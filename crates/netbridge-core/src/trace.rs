//! Object addressing through merge hops.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;
use crate::object::NativeObject;
use crate::world::{ObjectRef, ObjectWorld};

/// Path from a root object to the object a handle addresses.
///
/// A trace starts at the object a script first obtained and records every
/// hop taken since: into a merged object, or into an object returned by a
/// native call. It never owns its target. Two traces are equal when their
/// final targets are the same object, whatever path reached it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trace {
    root: ObjectRef,
    hops: Vec<ObjectRef>,
}

impl Trace {
    /// A trace addressing `root` directly.
    pub fn new(root: ObjectRef) -> Self {
        Self {
            root,
            hops: Vec::new(),
        }
    }

    /// The object the path starts at.
    pub fn root(&self) -> ObjectRef {
        self.root
    }

    /// The object this trace addresses.
    pub fn target(&self) -> ObjectRef {
        self.hops.last().copied().unwrap_or(self.root)
    }

    /// Objects entered after the root, in order.
    pub fn hops(&self) -> &[ObjectRef] {
        &self.hops
    }

    /// Extend the trace by one hop.
    ///
    /// Hopping to the current target leaves the path unchanged.
    pub fn through(&self, hop: ObjectRef) -> Trace {
        let mut next = self.clone();
        if next.target() != hop {
            next.hops.push(hop);
        }
        next
    }

    /// Dereference the target.
    pub fn resolve(&self, world: &ObjectWorld) -> Result<Arc<dyn NativeObject>, BridgeError> {
        world.get(self.target()).ok_or(BridgeError::InstanceInvalid)
    }

    /// True while the target is still alive in `world`.
    pub fn is_valid(&self, world: &ObjectWorld) -> bool {
        world.contains(self.target())
    }
}

impl PartialEq for Trace {
    fn eq(&self, other: &Self) -> bool {
        self.target() == other.target()
    }
}

impl Eq for Trace {}

impl Hash for Trace {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.target().hash(state);
    }
}

impl From<ObjectRef> for Trace {
    fn from(root: ObjectRef) -> Self {
        Trace::new(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trace_targets_root() {
        let root = ObjectRef::new(1, 0);
        let trace = Trace::new(root);
        assert_eq!(trace.target(), root);
        assert!(trace.hops().is_empty());
    }

    #[test]
    fn through_appends_hop() {
        let root = ObjectRef::new(1, 0);
        let merged = ObjectRef::new(2, 0);
        let trace = Trace::new(root).through(merged);
        assert_eq!(trace.root(), root);
        assert_eq!(trace.target(), merged);
        assert_eq!(trace.hops(), &[merged]);
    }

    #[test]
    fn through_current_target_is_noop() {
        let root = ObjectRef::new(1, 0);
        let trace = Trace::new(root).through(root);
        assert!(trace.hops().is_empty());
    }

    #[test]
    fn equality_by_target_only() {
        let a = ObjectRef::new(1, 0);
        let b = ObjectRef::new(2, 0);
        assert_eq!(Trace::new(a).through(b), Trace::new(b));
        assert_ne!(Trace::new(a), Trace::new(b));
    }

    #[test]
    fn stale_target_is_invalid() {
        let world = ObjectWorld::new();
        let trace = Trace::new(ObjectRef::new(0, 3));
        assert!(!trace.is_valid(&world));
        assert!(matches!(trace.resolve(&world), Err(BridgeError::InstanceInvalid)));
    }
}
