//! Fixed-capacity entity pool
//!
//! Every slot is allocated once at construction. `acquire` hands out a free
//! slot, `release` returns it; nothing is allocated or freed during play.
//! Exhaustion is not an error: `acquire` returns `None` and the caller drops
//! the request.

/// An entity that can live in a [`Pool`]
pub trait Poolable: Default {
    /// Reinitialize every field to its pooled state
    fn reset(&mut self);
    /// Simulation flag; cleared when the entity destroys itself
    fn is_active(&self) -> bool;
    fn set_active(&mut self, active: bool);
}

/// Generational reference to a pool slot
///
/// A handle goes stale once its slot is released; stale handles never alias
/// the slot's next occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

/// Lifetime counters for one pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub acquired: u64,
    pub released: u64,
    /// Acquire requests refused for lack of a free slot or the active ceiling
    pub rejected: u64,
    /// Released slots not returned to the free set (backpressure)
    pub dropped: u64,
}

#[derive(Debug, Clone)]
pub struct Pool<T> {
    name: &'static str,
    slots: Vec<T>,
    generations: Vec<u32>,
    /// Position of each slot in `active`, `None` while pooled
    positions: Vec<Option<usize>>,
    free: Vec<usize>,
    active: Vec<Handle>,
    capacity: usize,
    max_active: usize,
    /// Set on the first refused acquire, cleared by the next release
    exhausted: bool,
    stats: PoolStats,
}

impl<T: Poolable> Pool<T> {
    /// Pre-allocate `capacity` entities; `max_active` caps how many may be
    /// live at once independent of capacity
    pub fn new(name: &'static str, capacity: usize, max_active: usize) -> Self {
        let capacity = capacity.max(1);
        let slots = (0..capacity).map(|_| T::default()).collect();
        // Pop order hands out slot 0 first
        let free = (0..capacity).rev().collect();

        Self {
            name,
            slots,
            generations: vec![0; capacity],
            positions: vec![None; capacity],
            free,
            active: Vec::with_capacity(capacity),
            capacity,
            max_active: max_active.clamp(1, capacity),
            exhausted: false,
            stats: PoolStats::default(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn max_active(&self) -> usize {
        self.max_active
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// True once the active ceiling is reached
    pub fn is_saturated(&self) -> bool {
        self.active.len() >= self.max_active || self.free.is_empty()
    }

    /// Take a free slot, reset it and mark it active
    pub fn acquire(&mut self) -> Option<Handle> {
        if self.active.len() >= self.max_active {
            self.reject();
            return None;
        }
        let Some(index) = self.free.pop() else {
            self.reject();
            return None;
        };

        let generation = self.generations[index].wrapping_add(1);
        self.generations[index] = generation;

        let slot = &mut self.slots[index];
        slot.reset();
        slot.set_active(true);

        let handle = Handle {
            index: index as u32,
            generation,
        };
        self.positions[index] = Some(self.active.len());
        self.active.push(handle);
        self.stats.acquired += 1;
        Some(handle)
    }

    fn reject(&mut self) {
        self.stats.rejected += 1;
        if !self.exhausted {
            self.exhausted = true;
            log::warn!(
                "{} pool exhausted ({} active / {} capacity, ceiling {})",
                self.name,
                self.active.len(),
                self.capacity,
                self.max_active
            );
        }
    }

    /// Return an entity to the free set; no-op for stale or pooled handles
    pub fn release(&mut self, handle: Handle) -> bool {
        let Some(position) = self.position_of(handle) else {
            return false;
        };
        self.release_at(position);
        true
    }

    fn position_of(&self, handle: Handle) -> Option<usize> {
        let index = handle.index();
        if index >= self.capacity || self.generations[index] != handle.generation {
            return None;
        }
        self.positions[index]
    }

    /// Swap-remove the active entry at `position`
    fn release_at(&mut self, position: usize) {
        let handle = self.active.swap_remove(position);
        let index = handle.index();
        if let Some(moved) = self.active.get(position) {
            self.positions[moved.index()] = Some(position);
        }
        self.positions[index] = None;
        self.slots[index].set_active(false);

        if self.free.len() < self.capacity {
            self.free.push(index);
        } else {
            self.stats.dropped += 1;
        }
        self.stats.released += 1;
        self.exhausted = false;
    }

    /// Visit active entities in reverse order, releasing every entity for
    /// which `keep` returns false
    pub fn retain_active<F>(&mut self, mut keep: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        let mut position = self.active.len();
        while position > 0 {
            position -= 1;
            let index = self.active[position].index();
            if !keep(&mut self.slots[index]) {
                // Swap-remove pulls an already-visited entry into `position`
                self.release_at(position);
            }
        }
    }

    /// Release every active entity
    pub fn clear(&mut self) {
        while !self.active.is_empty() {
            self.release_at(self.active.len() - 1);
        }
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.position_of(handle).map(|_| &self.slots[handle.index()])
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.position_of(handle)
            .map(|_| &mut self.slots[handle.index()])
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.position_of(handle).is_some()
    }

    /// Snapshot of the active list
    pub fn active_handles(&self) -> &[Handle] {
        &self.active
    }

    /// Active entities in active-list order
    pub fn iter_active(&self) -> impl Iterator<Item = &T> + '_ {
        self.active.iter().map(|h| &self.slots[h.index()])
    }

    /// Active entities in slot order
    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.slots
            .iter_mut()
            .zip(&self.positions)
            .filter(|(_, position)| position.is_some())
            .map(|(slot, _)| slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Dummy {
        active: bool,
        value: u32,
    }

    impl Poolable for Dummy {
        fn reset(&mut self) {
            self.value = 0;
        }
        fn is_active(&self) -> bool {
            self.active
        }
        fn set_active(&mut self, active: bool) {
            self.active = active;
        }
    }

    #[test]
    fn test_exhausted_pool_returns_none() {
        let mut pool: Pool<Dummy> = Pool::new("dummy", 2, 2);
        let a = pool.acquire().expect("first");
        let b = pool.acquire().expect("second");
        assert_ne!(a, b);
        assert_ne!(a.index(), b.index());
        assert!(pool.acquire().is_none());
        assert_eq!(pool.stats().rejected, 1);
        assert_eq!(pool.active_len() + pool.free_len(), pool.capacity());
    }

    #[test]
    fn test_max_active_ceiling() {
        let mut pool: Pool<Dummy> = Pool::new("dummy", 10, 3);
        for _ in 0..3 {
            assert!(pool.acquire().is_some());
        }
        assert!(pool.acquire().is_none());
        assert_eq!(pool.free_len(), 7);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut pool: Pool<Dummy> = Pool::new("dummy", 4, 4);
        let h = pool.acquire().unwrap();
        assert!(pool.release(h));
        assert!(!pool.release(h));
        assert_eq!(pool.free_len(), 4);
        assert_eq!(pool.stats().released, 1);
    }

    #[test]
    fn test_stale_handle_does_not_alias() {
        let mut pool: Pool<Dummy> = Pool::new("dummy", 1, 1);
        let old = pool.acquire().unwrap();
        pool.release(old);
        let new = pool.acquire().unwrap();
        assert_eq!(old.index(), new.index());
        assert!(pool.get(old).is_none());
        assert!(!pool.release(old));
        assert!(pool.contains(new));
    }

    #[test]
    fn test_acquire_resets_entity() {
        let mut pool: Pool<Dummy> = Pool::new("dummy", 1, 1);
        let h = pool.acquire().unwrap();
        pool.get_mut(h).unwrap().value = 42;
        pool.release(h);
        let h = pool.acquire().unwrap();
        let slot = pool.get(h).unwrap();
        assert_eq!(slot.value, 0);
        assert!(slot.is_active());
    }

    #[test]
    fn test_release_by_identity_after_reordering() {
        let mut pool: Pool<Dummy> = Pool::new("dummy", 5, 5);
        let handles: Vec<_> = (0..5).map(|_| pool.acquire().unwrap()).collect();
        // First removal moves the last handle into slot 0 of the active list
        assert!(pool.release(handles[0]));
        assert!(pool.release(handles[4]));
        assert!(pool.release(handles[2]));
        let remaining: Vec<_> = pool.active_handles().to_vec();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.contains(&handles[1]));
        assert!(remaining.contains(&handles[3]));
    }

    #[test]
    fn test_retain_active_visits_each_once() {
        let mut pool: Pool<Dummy> = Pool::new("dummy", 6, 6);
        for i in 0..6 {
            let h = pool.acquire().unwrap();
            pool.get_mut(h).unwrap().value = i;
        }
        let mut visited = Vec::new();
        pool.retain_active(|d| {
            visited.push(d.value);
            d.value % 2 == 0
        });
        visited.sort_unstable();
        assert_eq!(visited, vec![0, 1, 2, 3, 4, 5]);
        let mut kept: Vec<_> = pool.iter_active().map(|d| d.value).collect();
        kept.sort_unstable();
        assert_eq!(kept, vec![0, 2, 4]);
        assert!(pool.iter_active().all(|d| d.is_active()));
    }

    #[test]
    fn test_iter_active_mut_touches_only_active() {
        let mut pool: Pool<Dummy> = Pool::new("dummy", 4, 4);
        let a = pool.acquire().unwrap();
        let _b = pool.acquire().unwrap();
        pool.release(a);
        for d in pool.iter_active_mut() {
            d.value = 7;
        }
        assert_eq!(pool.iter_active().map(|d| d.value).sum::<u32>(), 7);
    }

    #[test]
    fn test_clear_returns_everything() {
        let mut pool: Pool<Dummy> = Pool::new("dummy", 3, 3);
        for _ in 0..3 {
            pool.acquire();
        }
        pool.clear();
        assert_eq!(pool.active_len(), 0);
        assert_eq!(pool.free_len(), 3);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_pool_conservation(
                ops in prop::collection::vec((any::<bool>(), 0usize..16), 0..200)
            ) {
                let mut pool: Pool<Dummy> = Pool::new("dummy", 8, 8);
                let mut live: Vec<Handle> = Vec::new();
                for (acquire, pick) in ops {
                    if acquire {
                        if let Some(h) = pool.acquire() {
                            // Never hands out something already live
                            prop_assert!(!live.contains(&h));
                            live.push(h);
                        }
                    } else if !live.is_empty() {
                        let h = live.swap_remove(pick % live.len());
                        prop_assert!(pool.release(h));
                    }
                    prop_assert_eq!(pool.free_len() + pool.active_len(), pool.capacity());
                    prop_assert_eq!(pool.active_len(), live.len());
                }
            }
        }
    }
}
