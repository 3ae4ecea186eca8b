//! Generational arena holding the simulation's native objects.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::object::NativeObject;

/// Reference to an object in the [`ObjectWorld`].
///
/// This is a copyable, non-owning address. The generation prevents a
/// reference to a destroyed object from reaching whatever reuses its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Index into ObjectWorld slots
    pub index: u32,
    /// Generation for use-after-free detection
    pub generation: u32,
}

impl ObjectRef {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// Shared storage for native objects with generational indices.
///
/// When an object is destroyed its slot is reused but the generation is
/// incremented, so stale references resolve to nothing instead of to the
/// new occupant. The world is internally synchronized and is shared between
/// runtimes behind an `Arc`.
pub struct ObjectWorld {
    inner: RwLock<Slots>,
}

#[derive(Default)]
struct Slots {
    slots: Vec<WorldSlot>,
    free_list: Vec<u32>,
}

struct WorldSlot {
    generation: u32,
    value: Option<Arc<dyn NativeObject>>,
}

impl ObjectWorld {
    /// Create a new empty world.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Slots::default()),
        }
    }

    /// Place a new object in the world.
    pub fn spawn<T: NativeObject>(&self, value: T) -> ObjectRef {
        self.spawn_shared(Arc::new(value))
    }

    /// Place an already shared object in the world.
    pub fn spawn_shared(&self, value: Arc<dyn NativeObject>) -> ObjectRef {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        if let Some(index) = inner.free_list.pop() {
            let slot = &mut inner.slots[index as usize];
            slot.value = Some(value);
            ObjectRef::new(index, slot.generation)
        } else {
            let index = inner.slots.len() as u32;
            inner.slots.push(WorldSlot {
                generation: 0,
                value: Some(value),
            });
            ObjectRef::new(index, 0)
        }
    }

    /// Get the object a reference points at.
    ///
    /// Returns None if the reference is stale.
    pub fn get(&self, r: ObjectRef) -> Option<Arc<dyn NativeObject>> {
        let inner = self.inner.read();
        let slot = inner.slots.get(r.index as usize)?;
        if slot.generation != r.generation {
            return None;
        }
        slot.value.clone()
    }

    /// True if `r` addresses a live object.
    pub fn contains(&self, r: ObjectRef) -> bool {
        let inner = self.inner.read();
        inner
            .slots
            .get(r.index as usize)
            .is_some_and(|slot| slot.generation == r.generation && slot.value.is_some())
    }

    /// Destroy an object.
    ///
    /// Returns true if the reference was live. Runtimes holding an `Arc` to
    /// the object keep it alive until they drop it, but it is no longer
    /// reachable through any reference.
    pub fn destroy(&self, r: ObjectRef) -> bool {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        if let Some(slot) = inner.slots.get_mut(r.index as usize)
            && slot.generation == r.generation
            && slot.value.is_some()
        {
            slot.value = None;
            slot.generation = slot.generation.wrapping_add(1);
            inner.free_list.push(r.index);
            return true;
        }
        false
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        let inner = self.inner.read();
        inner.slots.len() - inner.free_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ObjectWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("ObjectWorld")
            .field("slot_count", &inner.slots.len())
            .field("free_count", &inner.free_list.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use super::*;
    use crate::TypeHash;

    struct Lamp(u32);

    impl NativeObject for Lamp {
        fn class(&self) -> TypeHash {
            TypeHash::from_name("Lamp")
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn spawn_and_get() {
        let world = ObjectWorld::new();
        let r = world.spawn(Lamp(7));
        let obj = world.get(r).unwrap();
        assert_eq!(obj.downcast_ref::<Lamp>().unwrap().0, 7);
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn destroyed_reference_is_stale() {
        let world = ObjectWorld::new();
        let r = world.spawn(Lamp(1));
        assert!(world.destroy(r));
        assert!(world.get(r).is_none());
        assert!(!world.contains(r));
        assert!(!world.destroy(r));
        assert!(world.is_empty());
    }

    #[test]
    fn reused_slot_does_not_alias() {
        let world = ObjectWorld::new();
        let old = world.spawn(Lamp(1));
        world.destroy(old);
        let new = world.spawn(Lamp(2));

        assert_eq!(old.index, new.index);
        assert_ne!(old.generation, new.generation);
        assert!(world.get(old).is_none());
        assert_eq!(world.get(new).unwrap().downcast_ref::<Lamp>().unwrap().0, 2);
    }
}
