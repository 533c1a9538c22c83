use std::cmp::min;
use std::ops::{Index, IndexMut};

use crate::utils::MyHash;

#[derive(Clone)]
struct Entry<T> {
    value: T,
    next: usize,
    occupied: bool,
}

impl<T> Entry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            next: 0,
            occupied: false,
        }
    }
}

impl<T> Default for Entry<T>
where
    T: Default,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// A hash-consing table with intrusive bucket chains.
///
/// Cell 0 is a sentry: it is never allocated and a `next`/bucket value of 0
/// terminates a chain.
pub struct Table<T> {
    data: Vec<Entry<T>>,

    buckets: Vec<usize>,
    bitmask: u64,

    /// Index of the first *possibly* free (non-occupied) cell.
    min_free: usize,
    /// Index of the last occupied cell.
    last_index: usize,
    /// Number of occupied cells.
    real_size: usize,
}

impl<T> Table<T>
where
    T: Default,
{
    /// Create a new table of size `2^bits`.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Storage bits should be in the range 0..=31");

        let capacity = 1 << bits;
        let mut data: Vec<Entry<T>> = Vec::with_capacity(capacity);
        data.resize_with(capacity, Entry::default);
        data[0].occupied = true; // sentry

        let buckets_bits = min(bits, 16);
        let buckets_size = 1 << buckets_bits;
        let buckets = vec![0; buckets_size];
        let bitmask = (buckets_size - 1) as u64;

        Self {
            data,
            buckets,
            bitmask,
            min_free: 1,
            last_index: 0,
            real_size: 0,
        }
    }
}

impl<T> Table<T> {
    pub fn capacity(&self) -> usize {
        self.data.len()
    }
    /// Index of the last occupied cell.
    pub fn size(&self) -> usize {
        self.last_index
    }
    /// Number of occupied cells.
    pub fn real_size(&self) -> usize {
        self.real_size
    }

    pub fn value(&self, index: usize) -> &T {
        assert_ne!(index, 0, "Index is 0");
        &self.data[index].value
    }
    pub fn value_mut(&mut self, index: usize) -> &mut T {
        assert_ne!(index, 0, "Index is 0");
        &mut self.data[index].value
    }

    pub fn is_occupied(&self, index: usize) -> bool {
        assert_ne!(index, 0, "Index is 0");
        self.data[index].occupied
    }

    /// Index of the next cell in the chain (0 terminates).
    pub fn next(&self, index: usize) -> usize {
        assert_ne!(index, 0, "Index is 0");
        self.data[index].next
    }
    pub fn set_next(&mut self, index: usize, next: usize) {
        assert_ne!(index, 0, "Index is 0");
        self.data[index].next = next;
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }
    pub fn bucket(&self, i: usize) -> usize {
        self.buckets[i]
    }
    pub fn set_bucket(&mut self, i: usize, index: usize) {
        self.buckets[i] = index;
    }

    /// Allocate a new cell in the table and return its index, or `None` when
    /// every cell is occupied.
    pub(crate) fn alloc(&mut self) -> Option<usize> {
        let index = match (self.min_free..=self.last_index).find(|&i| !self.is_occupied(i)) {
            Some(i) => i,
            None => {
                if self.last_index + 1 >= self.capacity() {
                    return None;
                }
                self.last_index += 1;
                self.last_index
            }
        };

        self.data[index].occupied = true;
        self.min_free = index + 1;
        self.real_size += 1;

        Some(index)
    }

    /// Drop the value at the given index.
    pub fn drop(&mut self, index: usize) {
        assert_ne!(index, 0, "Index is 0");

        self.data[index].occupied = false;
        self.min_free = min(self.min_free, index);
        self.real_size -= 1;
    }

    /// Add a new value to the table and return its index, or `None` when the
    /// table is full.
    pub fn add(&mut self, value: T) -> Option<usize> {
        let index = self.alloc()?;

        self.data[index].value = value;
        self.data[index].next = 0;

        Some(index)
    }
}

impl<T> Table<T>
where
    T: MyHash,
{
    fn bucket_index(&self, value: &T) -> usize {
        (value.hash() & self.bitmask) as usize
    }

    /// Put a value into the table, reusing an existing cell if the value is
    /// already present, and return its index. Returns `None` when the value is
    /// absent and the table is full.
    pub fn put(&mut self, value: T) -> Option<usize>
    where
        T: Eq,
    {
        let bucket_index = self.bucket_index(&value);
        let mut index = self.buckets[bucket_index];

        if index == 0 {
            // Empty bucket: create the node and hang it off the bucket.
            let i = self.add(value)?;
            self.buckets[bucket_index] = i;
            return Some(i);
        }

        loop {
            assert!(index > 0);

            if &value == self.value(index) {
                return Some(index);
            }

            let next = self.next(index);

            if next == 0 {
                // End of the chain: append the new node.
                let i = self.add(value)?;
                self.set_next(index, i);
                return Some(i);
            } else {
                index = next;
            }
        }
    }
}

impl<T> Index<usize> for Table<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.value(index)
    }
}

impl<T> IndexMut<usize> for Table<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        self.value_mut(index)
    }
}
