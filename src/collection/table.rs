//! Collection implementation
//!
//! Open-addressed hash table mapping key hashes to storage slot indices.

use crate::error::{LatticeError, Result};
use crate::schema::{Layout, Schema};
use crate::storage::Storage;

use super::key::KeyStrategy;

/// Bucket count after the first growth; always doubled from there, so the
/// table length stays a power of two and probing can mask instead of mod
const INIT_BUCKETS: usize = 32;

/// Logical state of a bucket, stored explicitly
///
/// No sentinel key or hash bit patterns: a stored key of all zeros or all
/// ones is as legal as any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BucketState {
    /// Never held an entry
    Empty,
    /// Holds a live entry
    Occupied,
    /// Held an entry that was removed; probed over on lookup
    Tombstone,
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    state: BucketState,
    key_hash: u64,
    value_index: usize,
}

const EMPTY_BUCKET: Bucket = Bucket {
    state: BucketState::Empty,
    key_hash: 0,
    value_index: 0,
};

/// An open-addressed hash index over records of one schema
///
/// Owns a private copy of its schema, the record storage, and the bucket
/// table. Single-threaded by design: nothing here suspends or locks, and a
/// `put` that triggers growth rehashes the whole table before returning.
pub struct Collection {
    schema: Schema,
    layout: Layout,
    key: KeyStrategy,
    storage: Storage,
    buckets: Vec<Bucket>,
}

impl Collection {
    /// Build an empty collection bound to `schema`
    pub fn new(schema: Schema) -> Self {
        let layout = Layout::new(&schema);
        let key = KeyStrategy::resolve(&schema);
        let storage = Storage::new(layout.size());

        Self {
            schema,
            layout,
            key,
            storage,
            buckets: Vec::new(),
        }
    }

    /// Insert a record, or update in place if its key already exists
    ///
    /// Returns the storage slot index of the record. The only error is a
    /// full probe wraparound, which the growth policy makes unreachable; it
    /// is surfaced rather than retried because it means the invariant broke.
    pub fn put(&mut self, record: &[u8]) -> Result<usize> {
        debug_assert_eq!(record.len(), self.storage.doc_size());

        if self.needs_growth() {
            self.grow();
        }

        let key = self.key.key_of(record);
        let hash = self.key.hash(key);

        let mask = self.buckets.len() - 1;
        let start = (hash as usize) & mask;

        for i in 0..self.buckets.len() {
            let pos = (start + i) & mask;
            let bucket = self.buckets[pos];

            match bucket.state {
                // First reusable bucket claims the new entry
                BucketState::Empty | BucketState::Tombstone => {
                    let index = self.storage.put(record);
                    self.buckets[pos] = Bucket {
                        state: BucketState::Occupied,
                        key_hash: hash,
                        value_index: index,
                    };
                    return Ok(index);
                }
                BucketState::Occupied => {
                    if bucket.key_hash == hash
                        && self.key.key_of(self.storage.get(bucket.value_index)) == key
                    {
                        // Upsert: overwrite the slot, count unchanged
                        self.storage.get_mut(bucket.value_index).copy_from_slice(record);
                        return Ok(bucket.value_index);
                    }
                }
            }
        }

        Err(LatticeError::CollectionFull)
    }

    /// Look up a record by its key bytes
    pub fn find(&self, key: &[u8]) -> Option<&[u8]> {
        let pos = self.probe(key)?;
        Some(self.storage.get(self.buckets[pos].value_index))
    }

    /// Remove the record matching `key`; absent keys are a silent no-op
    pub fn remove(&mut self, key: &[u8]) {
        let Some(pos) = self.probe(key) else {
            return;
        };

        let slot = self.buckets[pos].value_index;
        self.buckets[pos].state = BucketState::Tombstone;

        if let Some(old_last) = self.storage.swap_remove(slot) {
            // The last record was relocated into the freed slot; re-probe by
            // its own key to find the bucket still pointing at the old index.
            let moved = self.storage.get(slot);
            let moved_hash = self.key.hash(self.key.key_of(moved));

            let mask = self.buckets.len() - 1;
            let start = (moved_hash as usize) & mask;

            for i in 0..self.buckets.len() {
                let p = (start + i) & mask;
                let bucket = self.buckets[p];

                if bucket.state == BucketState::Occupied && bucket.value_index == old_last {
                    self.buckets[p].value_index = slot;
                    return;
                }
            }

            debug_assert!(false, "relocated record has no bucket");
        }
    }

    /// Probe for the occupied bucket holding `key`
    ///
    /// Stops at the first Empty bucket or after a full wraparound; tombstones
    /// are probed over.
    fn probe(&self, key: &[u8]) -> Option<usize> {
        if self.buckets.is_empty() {
            return None;
        }

        let hash = self.key.hash(key);
        let mask = self.buckets.len() - 1;
        let start = (hash as usize) & mask;

        for i in 0..self.buckets.len() {
            let pos = (start + i) & mask;
            let bucket = self.buckets[pos];

            match bucket.state {
                BucketState::Empty => return None,
                BucketState::Tombstone => continue,
                BucketState::Occupied => {
                    if bucket.key_hash == hash
                        && self.key.key_of(self.storage.get(bucket.value_index)) == key
                    {
                        return Some(pos);
                    }
                }
            }
        }

        None
    }

    /// Whether the next insert would push the load factor past 1/1.4
    ///
    /// 1/1.4 is exactly 5/7, so the check stays in integers.
    fn needs_growth(&self) -> bool {
        self.buckets.is_empty() || (self.storage.count() + 1) * 7 >= self.buckets.len() * 5
    }

    /// Double the bucket table and re-insert every live record's key
    ///
    /// Storage slots are untouched; only the index is rebuilt. Runs fully
    /// inside the triggering `put`.
    fn grow(&mut self) {
        let new_len = if self.buckets.is_empty() {
            INIT_BUCKETS
        } else {
            self.buckets.len() * 2
        };

        let mut buckets = vec![EMPTY_BUCKET; new_len];
        let mask = new_len - 1;

        for index in 0..self.storage.count() {
            let hash = self.key.hash(self.key.key_of(self.storage.get(index)));
            let start = (hash as usize) & mask;

            // A fresh table below the load cap always has an empty bucket
            for i in 0..new_len {
                let pos = (start + i) & mask;
                if buckets[pos].state == BucketState::Empty {
                    buckets[pos] = Bucket {
                        state: BucketState::Occupied,
                        key_hash: hash,
                        value_index: index,
                    };
                    break;
                }
            }
        }

        self.buckets = buckets;
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// The schema this collection was built from
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The per-field offset table
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Number of live records
    pub fn count(&self) -> usize {
        self.storage.count()
    }

    /// Size in bytes of one record
    pub fn doc_size(&self) -> usize {
        self.storage.doc_size()
    }

    /// Current bucket table length (0 before the first insert)
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}
