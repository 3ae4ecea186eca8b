//! Per-object call lock table.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::trace;

use netbridge_core::{BridgeError, ObjectRef, ObjectWorld};

/// Serializes reflected native calls per target object.
///
/// Runtimes on different threads may call into the same object. Each call
/// holds the lock for its target for the duration of the native body, so
/// bodies on one object never overlap while calls on different objects run
/// in parallel. Keys carry the object generation, so a destroyed object's
/// entry is never shared with whatever reuses its slot.
#[derive(Default)]
pub struct CallLocks {
    locks: Mutex<FxHashMap<ObjectRef, Arc<Mutex<()>>>>,
}

impl CallLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `target`.
    ///
    /// A destroyed target gets no entry and `f` is not run. The target is
    /// checked again once the lock is held, since it may have been destroyed
    /// while this call waited behind another.
    pub fn with_lock<R>(
        &self,
        world: &ObjectWorld,
        target: ObjectRef,
        f: impl FnOnce() -> R,
    ) -> Result<R, BridgeError> {
        let lock = {
            let mut locks = self.locks.lock();
            if !world.contains(target) {
                return Err(BridgeError::InstanceInvalid);
            }
            Arc::clone(locks.entry(target).or_default())
        };
        let _guard = lock.lock();
        if !world.contains(target) {
            trace!(index = target.index, generation = target.generation, "target destroyed while waiting");
            return Err(BridgeError::InstanceInvalid);
        }
        Ok(f())
    }

    /// Drop the entry of a destroyed object.
    ///
    /// Destroy the object in the world first. A call already holding the
    /// evicted lock finishes, and later calls are refused by [`with_lock`](Self::with_lock).
    pub fn evict(&self, target: ObjectRef) -> bool {
        let removed = self.locks.lock().remove(&target).is_some();
        if removed {
            trace!(index = target.index, generation = target.generation, "evicted call lock");
        }
        removed
    }

    /// Number of objects with a lock entry.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// True when no object has a lock entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for CallLocks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallLocks").field("entries", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    use netbridge_core::{NativeObject, TypeHash};

    use super::*;

    struct Lamp;

    impl NativeObject for Lamp {
        fn class(&self) -> TypeHash {
            TypeHash::from_name("Lamp")
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn entries_created_on_demand() {
        let world = ObjectWorld::new();
        let target = world.spawn(Lamp);
        let locks = CallLocks::new();
        assert!(locks.is_empty());
        let value = locks.with_lock(&world, target, || 5).unwrap();
        assert_eq!(value, 5);
        assert_eq!(locks.len(), 1);
        locks.with_lock(&world, target, || ()).unwrap();
        assert_eq!(locks.len(), 1);
    }

    #[test]
    fn generations_get_separate_entries() {
        let world = ObjectWorld::new();
        let locks = CallLocks::new();
        let old = world.spawn(Lamp);
        locks.with_lock(&world, old, || ()).unwrap();
        world.destroy(old);
        let new = world.spawn(Lamp);
        assert_eq!(old.index, new.index);
        locks.with_lock(&world, new, || ()).unwrap();
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn evict_removes_entry() {
        let world = ObjectWorld::new();
        let locks = CallLocks::new();
        let target = world.spawn(Lamp);
        locks.with_lock(&world, target, || ()).unwrap();
        assert!(locks.evict(target));
        assert!(!locks.evict(target));
        assert!(locks.is_empty());
    }

    #[test]
    fn destroyed_target_gets_no_entry() {
        let world = ObjectWorld::new();
        let locks = CallLocks::new();
        let target = world.spawn(Lamp);
        world.destroy(target);

        let mut ran = false;
        let result = locks.with_lock(&world, target, || ran = true);
        assert!(matches!(result, Err(BridgeError::InstanceInvalid)));
        assert!(!ran);
        assert!(locks.is_empty());
    }

    #[test]
    fn waiter_does_not_run_after_destroy() {
        let world = Arc::new(ObjectWorld::new());
        let locks = Arc::new(CallLocks::new());
        let target = world.spawn(Lamp);
        locks.with_lock(&world, target, || ()).unwrap();

        let held = Arc::clone(&locks.locks.lock()[&target]);
        let guard = held.lock();
        let ran = Arc::new(AtomicBool::new(false));
        let waiter = {
            let (world, locks, ran) = (Arc::clone(&world), Arc::clone(&locks), Arc::clone(&ran));
            thread::spawn(move || locks.with_lock(&world, target, || ran.store(true, Ordering::SeqCst)))
        };

        world.destroy(target);
        locks.evict(target);
        drop(guard);

        let result = waiter.join().unwrap();
        assert!(matches!(result, Err(BridgeError::InstanceInvalid)));
        assert!(!ran.load(Ordering::SeqCst));
        assert!(locks.is_empty());
    }
}
