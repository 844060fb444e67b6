//! Collection Module
//!
//! A schema-keyed open-addressed hash index over a dense record array.
//!
//! ## Responsibilities
//! - Insert-or-update, lookup, and delete, keyed by the schema's key field
//! - Linear probing with explicit Empty/Occupied/Tombstone bucket states
//! - Load-factor-triggered table doubling with a full synchronous rehash
//! - Keep the bucket table consistent with storage's swap-remove compaction
//!
//! ## Bucket lifecycle
//!
//! ```text
//! Empty ──insert──► Occupied ──remove──► Tombstone ──reinsert──► Occupied
//! ```
//!
//! Tombstones are probed over on lookup, so a removed-then-reinserted key
//! stays reachable; they become Empty again only when the table is rebuilt.

mod key;
mod table;

pub use table::Collection;
