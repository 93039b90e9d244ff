/// Stable storage for one target kind, and the guard handed to callers
///
/// Targets are boxed into an append-only arena owned by the store, so a
/// `&'pool T` handed out stays valid until the pool is dropped, and dropping
/// the pool destroys every target whatever its usage count. A `SlotMap`
/// maps stable keys to arena slots; arena order is allocation order, which
/// is the order cache lookups scan.

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use elsa::FrozenVec;
use slotmap::{new_key_type, Key, SlotMap};
use super::target_desc::TargetDesc;
use super::texture_target::Target;

// ===== SLOT MAP KEYS =====

new_key_type! {
    /// Stable key of a color target within its pool
    pub struct ColorTargetKey;

    /// Stable key of a depth-stencil target within its pool
    pub struct DepthStencilTargetKey;

    /// Stable key of a stage target within its pool
    pub struct StageTargetKey;
}

// ===== STORE =====

pub(crate) struct TargetStore<K: Key, T> {
    targets: FrozenVec<Box<T>>,
    keys: RefCell<Vec<K>>,
    slots: RefCell<SlotMap<K, usize>>,
}

impl<K: Key, T: Target> TargetStore<K, T> {
    pub(crate) fn new() -> Self {
        Self {
            targets: FrozenVec::new(),
            keys: RefCell::new(Vec::new()),
            slots: RefCell::new(SlotMap::with_key()),
        }
    }

    /// First idle target (in allocation order) whose descriptor equals `desc`
    pub(crate) fn find_idle(&self, desc: &TargetDesc) -> Option<(K, &T)> {
        let keys = self.keys.borrow();
        keys.iter().enumerate().find_map(|(slot, &key)| {
            let target = self.targets.get(slot)?;
            (!target.is_in_use() && target.desc() == desc).then_some((key, target))
        })
    }

    /// Take ownership of a new target and append it to the arena
    pub(crate) fn insert(&self, target: T) -> (K, &T) {
        let slot = self.targets.len();
        let target = self.targets.push_get(Box::new(target));
        let key = self.slots.borrow_mut().insert(slot);
        self.keys.borrow_mut().push(key);
        (key, target)
    }

    /// Release one use of the target stored under `key`
    pub(crate) fn release(&self, key: K) {
        let slot = self.slots.borrow().get(key).copied();
        match slot.and_then(|slot| self.targets.get(slot)) {
            Some(target) => target.base().release(),
            None => debug_assert!(false, "release() of a key this store never issued"),
        }
    }

    /// Number of targets ever allocated
    pub(crate) fn len(&self) -> usize {
        self.targets.len()
    }

    /// Number of targets currently in use
    pub(crate) fn in_use_count(&self) -> usize {
        (0..self.targets.len())
            .filter_map(|slot| self.targets.get(slot))
            .filter(|target| target.is_in_use())
            .count()
    }
}

// ===== GUARD =====

/// Ref-counted handle to a pooled target
///
/// Holding a `PooledTarget` keeps the target marked in use. Cloning adds a
/// use; dropping releases one back to the pool. The guard borrows the pool,
/// so it can never outlive it.
///
/// Leaking a guard (`std::mem::forget`) leaves its target marked in use;
/// it is still destroyed with the pool.
pub struct PooledTarget<'pool, K: Key, T: Target> {
    store: &'pool TargetStore<K, T>,
    key: K,
    target: &'pool T,
}

impl<'pool, K: Key, T: Target> PooledTarget<'pool, K, T> {
    /// Wrap a target whose usage count already includes this guard
    pub(crate) fn new(store: &'pool TargetStore<K, T>, key: K, target: &'pool T) -> Self {
        Self { store, key, target }
    }

    /// Stable key of the target within its pool
    pub fn key(&self) -> K {
        self.key
    }

    /// Whether two guards refer to the same pooled target
    pub fn same_target(&self, other: &Self) -> bool {
        std::ptr::eq(self.target, other.target)
    }
}

impl<K: Key, T: Target> Deref for PooledTarget<'_, K, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.target
    }
}

impl<K: Key, T: Target> Clone for PooledTarget<'_, K, T> {
    fn clone(&self) -> Self {
        self.target.base().add_ref();
        Self {
            store: self.store,
            key: self.key,
            target: self.target,
        }
    }
}

impl<K: Key, T: Target> Drop for PooledTarget<'_, K, T> {
    fn drop(&mut self) {
        self.store.release(self.key);
    }
}

impl<K: Key, T: Target> fmt::Debug for PooledTarget<'_, K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledTarget")
            .field("key", &self.key)
            .field("kind", &self.target.kind())
            .field("desc", self.target.desc())
            .field("references", &self.target.base().references())
            .finish()
    }
}
