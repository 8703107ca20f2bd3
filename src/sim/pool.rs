//! Generic object pool
//!
//! Objects live in slots that are never freed; a slot is either available
//! or active. Handles carry a generation so a released (or recycled) slot
//! cannot be released twice through a stale handle.

/// Handle to an active pooled object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    index: u32,
    generation: u32,
}

struct Slot<T> {
    value: T,
    generation: u32,
    active: bool,
}

/// Reusable-object allocator with active/available sets
pub struct ObjectPool<T> {
    slots: Vec<Slot<T>>,
    available: Vec<u32>,
    active_count: usize,
    create: Box<dyn Fn() -> T>,
    reset: Box<dyn Fn(&mut T)>,
}

impl<T> ObjectPool<T> {
    /// Create an empty pool from a factory and a reset function
    pub fn new(create: impl Fn() -> T + 'static, reset: impl Fn(&mut T) + 'static) -> Self {
        Self {
            slots: Vec::new(),
            available: Vec::new(),
            active_count: 0,
            create: Box::new(create),
            reset: Box::new(reset),
        }
    }

    /// Create a pool pre-filled with `capacity` available objects
    pub fn with_capacity(
        capacity: usize,
        create: impl Fn() -> T + 'static,
        reset: impl Fn(&mut T) + 'static,
    ) -> Self {
        let mut pool = Self::new(create, reset);
        pool.slots.reserve(capacity);
        pool.available.reserve(capacity);
        for _ in 0..capacity {
            let index = pool.slots.len() as u32;
            pool.slots.push(Slot {
                value: (pool.create)(),
                generation: 0,
                active: false,
            });
            pool.available.push(index);
        }
        pool
    }

    /// Take an object, recycling an available one or constructing a new one
    pub fn get(&mut self) -> PoolHandle {
        let index = match self.available.pop() {
            Some(index) => index,
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    value: (self.create)(),
                    generation: 0,
                    active: false,
                });
                index
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.active = true;
        self.active_count += 1;
        PoolHandle {
            index,
            generation: slot.generation,
        }
    }

    /// Return an object to the pool. No-op (returns false) unless the handle is active.
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index as usize) else {
            return false;
        };
        if !slot.active || slot.generation != handle.generation {
            return false;
        }
        (self.reset)(&mut slot.value);
        slot.active = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.available.push(handle.index);
        self.active_count -= 1;
        true
    }

    /// Reset and reclaim every active object
    pub fn release_all(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.active {
                (self.reset)(&mut slot.value);
                slot.active = false;
                slot.generation = slot.generation.wrapping_add(1);
                self.available.push(index as u32);
            }
        }
        self.active_count = 0;
    }

    pub fn is_active(&self, handle: PoolHandle) -> bool {
        self.slots
            .get(handle.index as usize)
            .is_some_and(|s| s.active && s.generation == handle.generation)
    }

    pub fn get_ref(&self, handle: PoolHandle) -> Option<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.active && s.generation == handle.generation)
            .map(|s| &s.value)
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.active && s.generation == handle.generation)
            .map(|s| &mut s.value)
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    /// Total objects ever constructed
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectPool")
            .field("len", &self.slots.len())
            .field("active", &self.active_count)
            .field("available", &self.available.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn counter_pool() -> ObjectPool<u32> {
        ObjectPool::new(|| 0, |v| *v = 0)
    }

    #[test]
    fn test_get_constructs_when_empty() {
        let mut pool = counter_pool();
        let h = pool.get();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.active_count(), 1);
        assert_eq!(pool.available_count(), 0);
        assert_eq!(pool.get_ref(h), Some(&0));
    }

    #[test]
    fn test_release_resets_and_recycles() {
        let mut pool = counter_pool();
        let h = pool.get();
        *pool.get_mut(h).unwrap() = 7;
        assert!(pool.release(h));
        assert_eq!(pool.available_count(), 1);

        let h2 = pool.get();
        assert_eq!(pool.len(), 1, "slot should be reused");
        assert_eq!(pool.get_ref(h2), Some(&0), "reset should have run");
    }

    #[test]
    fn test_double_release_is_noop() {
        let mut pool = counter_pool();
        let h = pool.get();
        assert!(pool.release(h));
        assert!(!pool.release(h));
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.available_count(), 1);
    }

    #[test]
    fn test_stale_handle_cannot_release_new_owner() {
        let mut pool = counter_pool();
        let old = pool.get();
        pool.release(old);
        let new = pool.get();
        assert!(!pool.release(old));
        assert!(pool.is_active(new));
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn test_release_all() {
        let mut pool = ObjectPool::with_capacity(4, || 1u32, |v| *v = 1);
        assert_eq!(pool.available_count(), 4);
        let handles: Vec<_> = (0..6).map(|_| pool.get()).collect();
        for h in &handles {
            *pool.get_mut(*h).unwrap() = 99;
        }
        pool.release_all();
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.available_count(), 6);
        assert!(handles.iter().all(|h| !pool.is_active(*h)));
        let h = pool.get();
        assert_eq!(pool.get_ref(h), Some(&1));
    }

    proptest! {
        #[test]
        fn prop_every_object_in_exactly_one_set(ops in proptest::collection::vec((any::<bool>(), 0usize..16), 0..200)) {
            let mut pool = counter_pool();
            let mut outstanding: Vec<PoolHandle> = Vec::new();
            let mut released: Vec<PoolHandle> = Vec::new();

            for (is_get, pick) in ops {
                if is_get || outstanding.is_empty() {
                    outstanding.push(pool.get());
                } else if pick % 4 == 0 && !released.is_empty() {
                    // Releasing a stale handle must change nothing
                    let stale = released[pick % released.len()];
                    let before = (pool.active_count(), pool.available_count());
                    prop_assert!(!pool.release(stale));
                    prop_assert_eq!(before, (pool.active_count(), pool.available_count()));
                } else {
                    let h = outstanding.swap_remove(pick % outstanding.len());
                    prop_assert!(pool.release(h));
                    released.push(h);
                }

                prop_assert_eq!(pool.active_count(), outstanding.len());
                prop_assert_eq!(pool.active_count() + pool.available_count(), pool.len());
            }
        }
    }
}
