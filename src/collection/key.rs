//! Key extraction and hashing
//!
//! The key field's position and kind are resolved once, when a collection is
//! built, so the per-operation path never re-dispatches over the full
//! `FieldType` union. String keys hash and compare their runtime-length
//! payload; scalar keys their fixed-size raw bytes.

use crate::schema::{FieldType, Schema, STRING_HEADER_SIZE};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over a byte span
pub(crate) fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;

    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }

    hash
}

#[derive(Debug, Clone, Copy)]
enum KeyKind {
    /// Fixed-size raw bytes
    Scalar { size: usize },
    /// Length header + payload; only the first `len` payload bytes count
    Str,
}

/// Cached strategy for pulling key bytes out of a record
#[derive(Debug, Clone)]
pub(crate) struct KeyStrategy {
    offset: usize,
    kind: KeyKind,
}

impl KeyStrategy {
    /// Resolve the strategy from a schema's key field
    ///
    /// The schema constructor guarantees the key field is never an
    /// aggregate.
    pub(crate) fn resolve(schema: &Schema) -> Self {
        let offset = schema.offset(schema.key_field_index() as usize);

        let kind = match &schema.key_field().ty {
            FieldType::String { .. } => KeyKind::Str,
            FieldType::Aggregate(_) => {
                unreachable!("aggregate key fields are rejected at schema construction")
            }
            scalar => KeyKind::Scalar {
                size: scalar.size(),
            },
        };

        Self { offset, kind }
    }

    /// The key bytes of a stored record
    pub(crate) fn key_of<'a>(&self, record: &'a [u8]) -> &'a [u8] {
        match self.kind {
            KeyKind::Scalar { size } => &record[self.offset..self.offset + size],
            KeyKind::Str => {
                let h = &record[self.offset..self.offset + STRING_HEADER_SIZE];
                let len = u32::from_ne_bytes([h[0], h[1], h[2], h[3]]) as usize;

                let payload = self.offset + STRING_HEADER_SIZE;
                &record[payload..payload + len]
            }
        }
    }

    /// Hash a key byte span
    pub(crate) fn hash(&self, key: &[u8]) -> u64 {
        hash_bytes(key)
    }
}
