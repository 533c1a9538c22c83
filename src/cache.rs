use std::cell::Cell;

use crate::utils::MyHash;

struct Slot<K, V> {
    key: K,
    value: V,
}

/// A direct-mapped operation cache (computed table).
///
/// Slots store the full key and compare it on lookup, so a hash collision
/// costs a miss rather than a wrong hit.
pub struct Cache<K, V> {
    data: Vec<Option<Slot<K, V>>>,
    bitmask: u64,
    hits: Cell<usize>,
    misses: Cell<usize>,
}

impl<K, V> Cache<K, V> {
    /// Create a new cache of size `2^bits`.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Bits should be in the range 0..=31");

        let size = 1 << bits;
        let bitmask = (size - 1) as u64;

        Self {
            data: std::iter::repeat_with(|| None).take(size).collect(),
            bitmask,
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.get()
    }
    pub fn misses(&self) -> usize {
        self.misses.get()
    }

    pub fn clear(&mut self) {
        self.data.fill_with(|| None);
    }

    fn index(&self, hash: u64) -> usize {
        (hash & self.bitmask) as usize
    }
}

impl<K, V> Cache<K, V>
where
    K: MyHash + Eq,
{
    pub fn get(&self, key: &K) -> Option<&V> {
        let index = self.index(key.hash());
        match &self.data[index] {
            Some(slot) if &slot.key == key => {
                self.hits.set(self.hits.get() + 1);
                Some(&slot.value)
            }
            _ => {
                self.misses.set(self.misses.get() + 1);
                None
            }
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        let index = self.index(key.hash());
        self.data[index] = Some(Slot { key, value });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache() {
        let mut cache = Cache::<(u64, u64), i32>::new(3);

        cache.insert((1, 2), 3);
        cache.insert((2, 3), 1);
        cache.insert((1, 3), 2);

        assert_eq!(cache.get(&(1, 2)), Some(&3));
        assert_eq!(cache.get(&(2, 3)), Some(&1));
        assert_eq!(cache.get(&(1, 3)), Some(&2));
        assert_eq!(cache.get(&(2, 1)), None);
        assert_eq!(cache.get(&(1, 1)), None);
    }

    #[test]
    fn test_collision_is_a_miss() {
        // Two keys mapping to the same slot must not alias.
        let mut cache = Cache::<(u64, u64), i32>::new(0);

        cache.insert((1, 2), 10);
        assert_eq!(cache.get(&(1, 2)), Some(&10));
        assert_eq!(cache.get(&(2, 1)), None);

        cache.insert((2, 1), 20);
        assert_eq!(cache.get(&(2, 1)), Some(&20));
    }
}
