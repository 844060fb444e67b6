//! Storage Tests
//!
//! Tests verify:
//! - Append and indexed read
//! - Capacity doubling past the initial 16 slots
//! - Swap-remove compaction and its relocation signal
//! - Clear keeping backing capacity

use latticekv::Storage;

const DOC_SIZE: usize = 8;

fn record(fill: u8) -> Vec<u8> {
    vec![fill; DOC_SIZE]
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_storage_is_empty() {
    let storage = Storage::new(DOC_SIZE);

    assert!(storage.is_empty());
    assert_eq!(storage.count(), 0);
    assert_eq!(storage.doc_size(), DOC_SIZE);
}

#[test]
fn test_put_and_get_roundtrip() {
    let mut storage = Storage::new(DOC_SIZE);

    let index = storage.put(&record(0xAB));

    assert_eq!(index, 0);
    assert_eq!(storage.count(), 1);
    assert_eq!(storage.get(0), record(0xAB).as_slice());
}

#[test]
fn test_put_returns_sequential_indices() {
    let mut storage = Storage::new(DOC_SIZE);

    for i in 0..5u8 {
        assert_eq!(storage.put(&record(i)), i as usize);
    }

    assert_eq!(storage.count(), 5);
}

#[test]
fn test_get_mut_overwrites_in_place() {
    let mut storage = Storage::new(DOC_SIZE);

    storage.put(&record(1));
    storage.get_mut(0).copy_from_slice(&record(2));

    assert_eq!(storage.get(0), record(2).as_slice());
    assert_eq!(storage.count(), 1);
}

// =============================================================================
// Growth Tests
// =============================================================================

#[test]
fn test_growth_beyond_initial_capacity() {
    let mut storage = Storage::new(DOC_SIZE);

    // Well past the initial 16-slot capacity
    for i in 0..40u8 {
        storage.put(&record(i));
    }

    assert_eq!(storage.count(), 40);

    for i in 0..40u8 {
        assert_eq!(storage.get(i as usize), record(i).as_slice());
    }
}

// =============================================================================
// Swap-Remove Tests
// =============================================================================

#[test]
fn test_swap_remove_last_returns_none() {
    let mut storage = Storage::new(DOC_SIZE);

    storage.put(&record(1));
    storage.put(&record(2));

    assert_eq!(storage.swap_remove(1), None);
    assert_eq!(storage.count(), 1);
    assert_eq!(storage.get(0), record(1).as_slice());
}

#[test]
fn test_swap_remove_nonlast_relocates_last() {
    let mut storage = Storage::new(DOC_SIZE);

    storage.put(&record(1));
    storage.put(&record(2));
    storage.put(&record(3));

    // The last record (index 2) backfills the freed slot
    assert_eq!(storage.swap_remove(0), Some(2));
    assert_eq!(storage.count(), 2);
    assert_eq!(storage.get(0), record(3).as_slice());
    assert_eq!(storage.get(1), record(2).as_slice());
}

#[test]
fn test_swap_remove_only_record() {
    let mut storage = Storage::new(DOC_SIZE);

    storage.put(&record(9));

    assert_eq!(storage.swap_remove(0), None);
    assert!(storage.is_empty());
}

// =============================================================================
// Clear Tests
// =============================================================================

#[test]
fn test_clear_resets_count_and_allows_reuse() {
    let mut storage = Storage::new(DOC_SIZE);

    for i in 0..20u8 {
        storage.put(&record(i));
    }

    storage.clear();
    assert!(storage.is_empty());

    let index = storage.put(&record(0xFF));
    assert_eq!(index, 0);
    assert_eq!(storage.get(0), record(0xFF).as_slice());
}
