//! Collection Tests
//!
//! Tests verify:
//! - Put/find round trips for scalar and string keys
//! - Upsert semantics (duplicate key updates in place)
//! - Remove semantics, including storage compaction fixups
//! - Tombstone reuse after remove-then-reinsert
//! - Bucket table growth at the load-factor boundary
//! - The bulk sequential-key stress scenario

use latticekv::schema::{Field, FieldType, Schema};
use latticekv::Collection;

// =============================================================================
// Record helpers
// =============================================================================

/// { id: uint64 (key), balance: int64 }, 16 bytes
fn int_schema() -> Schema {
    Schema::new(
        vec![
            Field::new("id", FieldType::UInt64),
            Field::new("balance", FieldType::Int64),
        ],
        0,
    )
    .unwrap()
}

fn int_record(id: u64, balance: i64) -> Vec<u8> {
    let mut r = vec![0u8; 16];
    r[0..8].copy_from_slice(&id.to_ne_bytes());
    r[8..16].copy_from_slice(&balance.to_ne_bytes());
    r
}

fn balance_of(record: &[u8]) -> i64 {
    i64::from_ne_bytes(record[8..16].try_into().unwrap())
}

/// { id: uint64, name: string<3> (key), balance: int64 }, 24 bytes
fn user_schema() -> Schema {
    Schema::new(
        vec![
            Field::new("id", FieldType::UInt64),
            Field::new("name", FieldType::String { capacity: 3 }),
            Field::new("balance", FieldType::Int64),
        ],
        1,
    )
    .unwrap()
}

fn user_record(id: u64, name: &str, balance: i64) -> Vec<u8> {
    assert!(name.len() <= 3);

    let mut r = vec![0u8; 24];
    r[0..8].copy_from_slice(&id.to_ne_bytes());
    r[8..12].copy_from_slice(&(name.len() as u32).to_ne_bytes());
    r[12..12 + name.len()].copy_from_slice(name.as_bytes());
    r[16..24].copy_from_slice(&balance.to_ne_bytes());
    r
}

fn user_id(record: &[u8]) -> u64 {
    u64::from_ne_bytes(record[0..8].try_into().unwrap())
}

fn user_balance(record: &[u8]) -> i64 {
    i64::from_ne_bytes(record[16..24].try_into().unwrap())
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_collection_is_empty() {
    let coll = Collection::new(int_schema());

    assert_eq!(coll.count(), 0);
    assert_eq!(coll.doc_size(), 16);
    assert_eq!(coll.bucket_count(), 0);
    assert_eq!(coll.schema().key_field_index(), 0);
}

#[test]
fn test_put_then_find_roundtrip() {
    let mut coll = Collection::new(int_schema());

    let record = int_record(42, -7);
    coll.put(&record).unwrap();

    assert_eq!(coll.count(), 1);
    assert_eq!(coll.find(&42u64.to_ne_bytes()), Some(record.as_slice()));
}

#[test]
fn test_find_missing_returns_none() {
    let mut coll = Collection::new(int_schema());

    assert_eq!(coll.find(&1u64.to_ne_bytes()), None);

    coll.put(&int_record(1, 1)).unwrap();
    assert_eq!(coll.find(&2u64.to_ne_bytes()), None);
}

#[test]
fn test_upsert_preserves_count_and_overwrites() {
    let mut coll = Collection::new(int_schema());

    coll.put(&int_record(7, 100)).unwrap();
    coll.put(&int_record(7, 200)).unwrap();

    assert_eq!(coll.count(), 1);

    let found = coll.find(&7u64.to_ne_bytes()).unwrap();
    assert_eq!(balance_of(found), 200);
}

#[test]
fn test_remove_then_find_misses() {
    let mut coll = Collection::new(int_schema());

    coll.put(&int_record(1, 10)).unwrap();
    coll.put(&int_record(2, 20)).unwrap();

    coll.remove(&1u64.to_ne_bytes());

    assert_eq!(coll.count(), 1);
    assert_eq!(coll.find(&1u64.to_ne_bytes()), None);
    assert!(coll.find(&2u64.to_ne_bytes()).is_some());
}

#[test]
fn test_remove_absent_key_is_noop() {
    let mut coll = Collection::new(int_schema());

    coll.put(&int_record(1, 10)).unwrap();
    coll.remove(&99u64.to_ne_bytes());

    assert_eq!(coll.count(), 1);
    assert!(coll.find(&1u64.to_ne_bytes()).is_some());
}

#[test]
fn test_remove_on_empty_collection_is_noop() {
    let mut coll = Collection::new(int_schema());
    coll.remove(&1u64.to_ne_bytes());
    assert_eq!(coll.count(), 0);
}

// =============================================================================
// Compaction Tests
// =============================================================================

#[test]
fn test_swap_compaction_keeps_other_keys_findable() {
    let mut coll = Collection::new(int_schema());

    // A, B, C in insertion order; removing A backfills its storage slot
    // with C, and C's bucket must follow it
    coll.put(&int_record(1, 100)).unwrap();
    coll.put(&int_record(2, 200)).unwrap();
    coll.put(&int_record(3, 300)).unwrap();

    coll.remove(&1u64.to_ne_bytes());

    assert_eq!(coll.count(), 2);
    assert_eq!(balance_of(coll.find(&2u64.to_ne_bytes()).unwrap()), 200);
    assert_eq!(balance_of(coll.find(&3u64.to_ne_bytes()).unwrap()), 300);
}

#[test]
fn test_repeated_removal_from_front() {
    let mut coll = Collection::new(int_schema());

    for id in 1..=10u64 {
        coll.put(&int_record(id, id as i64)).unwrap();
    }

    // Each removal relocates the current last record
    for id in 1..=5u64 {
        coll.remove(&id.to_ne_bytes());
    }

    assert_eq!(coll.count(), 5);

    for id in 1..=5u64 {
        assert_eq!(coll.find(&id.to_ne_bytes()), None);
    }
    for id in 6..=10u64 {
        assert_eq!(balance_of(coll.find(&id.to_ne_bytes()).unwrap()), id as i64);
    }
}

#[test]
fn test_remove_then_reinsert_is_findable() {
    let mut coll = Collection::new(int_schema());

    coll.put(&int_record(5, 1)).unwrap();
    coll.remove(&5u64.to_ne_bytes());
    coll.put(&int_record(5, 2)).unwrap();

    assert_eq!(coll.count(), 1);
    assert_eq!(balance_of(coll.find(&5u64.to_ne_bytes()).unwrap()), 2);
}

// =============================================================================
// Key Edge Cases
// =============================================================================

#[test]
fn test_zero_and_all_ones_keys_are_legal() {
    // Bucket state is explicit, so no key bit pattern is reserved
    let mut coll = Collection::new(int_schema());

    coll.put(&int_record(0, 10)).unwrap();
    coll.put(&int_record(u64::MAX, 20)).unwrap();

    assert_eq!(coll.count(), 2);
    assert_eq!(balance_of(coll.find(&0u64.to_ne_bytes()).unwrap()), 10);
    assert_eq!(
        balance_of(coll.find(&u64::MAX.to_ne_bytes()).unwrap()),
        20
    );

    coll.remove(&0u64.to_ne_bytes());
    assert_eq!(coll.count(), 1);
    assert!(coll.find(&u64::MAX.to_ne_bytes()).is_some());
}

#[test]
fn test_string_key_uses_runtime_length() {
    let mut coll = Collection::new(user_schema());

    // Junk in the unused capacity bytes must not affect key identity
    let mut record = user_record(1, "ab", 50);
    record[14] = b'X'; // third payload byte, beyond len == 2

    coll.put(&record).unwrap();

    let found = coll.find(b"ab").unwrap();
    assert_eq!(user_id(found), 1);
    assert_eq!(coll.find(b"abX"), None);
}

// =============================================================================
// Growth Tests
// =============================================================================

#[test]
fn test_first_insert_allocates_initial_buckets() {
    let mut coll = Collection::new(int_schema());

    coll.put(&int_record(1, 1)).unwrap();
    assert_eq!(coll.bucket_count(), 32);
}

#[test]
fn test_growth_trigger_boundary() {
    let mut coll = Collection::new(int_schema());

    // 22 entries stay below 32 / 1.4; the 23rd crosses it
    for id in 1..=22u64 {
        coll.put(&int_record(id, 0)).unwrap();
        assert_eq!(coll.bucket_count(), 32);
    }

    coll.put(&int_record(23, 0)).unwrap();
    assert_eq!(coll.bucket_count(), 64);

    // Exactly one doubling
    for id in 24..=30u64 {
        coll.put(&int_record(id, 0)).unwrap();
    }
    assert_eq!(coll.bucket_count(), 64);
}

#[test]
fn test_records_survive_rehash() {
    let mut coll = Collection::new(user_schema());

    for i in 1..=100u64 {
        coll.put(&user_record(i, &i.to_string(), i as i64)).unwrap();
    }

    assert!(coll.bucket_count() > 32);
    assert_eq!(balance_of_user(&coll, "73"), 73);
}

fn balance_of_user(coll: &Collection, name: &str) -> i64 {
    user_balance(coll.find(name.as_bytes()).unwrap())
}

// =============================================================================
// Scenario Tests
// =============================================================================

#[test]
fn test_hundred_users_remove_half_then_reinsert() {
    let mut coll = Collection::new(user_schema());

    for i in 1..=100u64 {
        coll.put(&user_record(i, &i.to_string(), i as i64)).unwrap();
    }

    assert!(coll.find(b"1").is_some());

    for i in 1..=50u64 {
        coll.remove(i.to_string().as_bytes());
    }

    assert_eq!(coll.count(), 50);
    assert_eq!(coll.find(b"2"), None);

    let found = coll.find(b"73").unwrap();
    assert_eq!(user_id(found), 73);
    assert_eq!(user_balance(found), 73);

    for i in 1..=50u64 {
        coll.put(&user_record(i, &i.to_string(), i as i64)).unwrap();
    }

    assert_eq!(coll.count(), 100);
    assert!(coll.find(b"20").is_some());
}

#[test]
fn test_bulk_insert_sequential_keys() {
    let mut coll = Collection::new(int_schema());

    const N: u64 = 1_000_000;

    let mut record = int_record(0, 0);
    for id in 0..N {
        record[0..8].copy_from_slice(&id.to_ne_bytes());
        record[8..16].copy_from_slice(&(id as i64).to_ne_bytes());
        coll.put(&record).unwrap();
    }

    assert_eq!(coll.count(), N as usize);

    for id in 0..N {
        let found = coll
            .find(&id.to_ne_bytes())
            .unwrap_or_else(|| panic!("key {id} missing"));
        assert_eq!(balance_of(found), id as i64);
    }
}
