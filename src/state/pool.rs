use std::collections::VecDeque;

use crate::model::{Entity, EntityId};

/// Monotonic id allocator; ids never repeat for the lifetime of the engine.
#[derive(Clone, Debug, Default)]
pub struct IdSource {
    next: u64,
}

impl IdSource {
    pub fn next_id(&mut self) -> EntityId {
        self.next += 1;
        EntityId(self.next)
    }
}

/// Anything a pool can retire by age.
pub trait Expiring {
    fn is_expired(&self, now: f64) -> bool;
}

impl Expiring for Entity {
    fn is_expired(&self, now: f64) -> bool {
        Entity::is_expired(self, now)
    }
}

/// Bounded, insertion-ordered collection. Full pools evict their oldest item.
#[derive(Clone, Debug)]
pub struct Pool<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> Pool<T> {
    /// `capacity` is raised to at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { items: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert at the back, returning the evicted oldest item if the pool was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() >= self.capacity { self.items.pop_front() } else { None };
        self.items.push_back(item);
        evicted
    }

    pub fn retain(&mut self, f: impl FnMut(&T) -> bool) {
        self.items.retain(f);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    pub fn snapshot(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.items.iter().cloned().collect()
    }
}

impl<T: Expiring> Pool<T> {
    /// Drop everything expired at `now`; returns how many were removed.
    pub fn retire_expired(&mut self, now: f64) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !item.is_expired(now));
        before - self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Tick {
        id: u32,
        dies_at: f64,
    }

    impl Expiring for Tick {
        fn is_expired(&self, now: f64) -> bool {
            now >= self.dies_at
        }
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut pool = Pool::new(3);
        for id in 0..50 {
            pool.push(Tick { id, dies_at: 1e9 });
            assert!(pool.len() <= pool.capacity());
        }
        let ids: Vec<u32> = pool.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![47, 48, 49]);
        assert_eq!(Pool::<Tick>::new(0).capacity(), 1);
    }

    #[test]
    fn evicts_oldest_first() {
        let mut pool = Pool::new(2);
        assert_eq!(pool.push(Tick { id: 1, dies_at: 1.0 }), None);
        assert_eq!(pool.push(Tick { id: 2, dies_at: 1.0 }), None);
        let evicted = pool.push(Tick { id: 3, dies_at: 1.0 });
        assert_eq!(evicted.map(|t| t.id), Some(1));
    }

    #[test]
    fn retires_expired_in_order() {
        let mut pool = Pool::new(8);
        for (id, dies_at) in [(1, 10.0), (2, 30.0), (3, 20.0)] {
            pool.push(Tick { id, dies_at });
        }
        assert_eq!(pool.retire_expired(20.0), 2);
        assert_eq!(pool.snapshot(), vec![Tick { id: 2, dies_at: 30.0 }]);
    }

    #[test]
    fn ids_are_unique() {
        let mut ids = IdSource::default();
        let a = ids.next_id();
        let b = ids.next_id();
        assert!(b > a);
    }
}
