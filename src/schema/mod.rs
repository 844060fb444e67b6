//! Schema Module
//!
//! Defines the record type system and the binary layout it induces.
//!
//! A [`Schema`] is an ordered list of named fields plus the index of the
//! field records are keyed by. Field types form a closed set: scalars,
//! fixed-capacity strings, and nested aggregates. The layout of a record is
//! fully determined by its schema: each field starts at the next offset
//! aligned to the field type's natural alignment, and the record size is the
//! end of the last field.
//!
//! ## String fields
//!
//! A string field occupies `4 + capacity` bytes: a native-endian `u32`
//! length header followed by exactly `capacity` payload bytes, of which only
//! the first `len` are meaningful. Records are assembled from host structs,
//! so the header is host byte order (unlike the wire protocol, which is
//! big-endian throughout).
//!
//! ## Example layout
//!
//! ```text
//! schema { id: u64 (key), name: string<3>, balance: i64 }
//!
//! ┌─────────────┬──────────┬─────────┬───────┬─────────────┐
//! │ id (8)      │ len (4)  │ name(3) │ pad(1)│ balance (8) │
//! └─────────────┴──────────┴─────────┴───────┴─────────────┘
//! offset 0        8          12        15      16            size 24
//! ```

mod layout;

pub use layout::{FieldSlot, Layout};

use crate::error::{LatticeError, Result};

/// Size of the `u32` length header preceding string field payloads
pub const STRING_HEADER_SIZE: usize = 4;

/// The closed set of field types a schema may use
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Bool,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    /// Fixed-capacity string: a 4-byte length header + `capacity` bytes
    String { capacity: usize },
    /// Nested aggregate: an ordered list of member fields, laid out like a
    /// record of its own
    Aggregate(Vec<Field>),
}

impl FieldType {
    /// Natural alignment of this type's in-record representation
    ///
    /// Strings align to their length header; aggregates to their most
    /// aligned member. Panics on an empty aggregate (programmer error, the
    /// same class as indexing a field out of range).
    pub fn alignment(&self) -> usize {
        match self {
            FieldType::Bool => std::mem::align_of::<bool>(),
            FieldType::UInt8 => std::mem::align_of::<u8>(),
            FieldType::UInt16 => std::mem::align_of::<u16>(),
            FieldType::UInt32 => std::mem::align_of::<u32>(),
            FieldType::UInt64 => std::mem::align_of::<u64>(),
            FieldType::Int8 => std::mem::align_of::<i8>(),
            FieldType::Int16 => std::mem::align_of::<i16>(),
            FieldType::Int32 => std::mem::align_of::<i32>(),
            FieldType::Int64 => std::mem::align_of::<i64>(),
            FieldType::Float32 => std::mem::align_of::<f32>(),
            FieldType::Float64 => std::mem::align_of::<f64>(),
            FieldType::String { .. } => std::mem::align_of::<u32>(),
            FieldType::Aggregate(fields) => {
                assert!(!fields.is_empty(), "empty aggregate has no alignment");
                fields
                    .iter()
                    .map(|f| f.ty.alignment())
                    .max()
                    .unwrap_or(1)
            }
        }
    }

    /// Size in bytes of this type's in-record representation
    pub fn size(&self) -> usize {
        match self {
            FieldType::Bool => std::mem::size_of::<bool>(),
            FieldType::UInt8 => std::mem::size_of::<u8>(),
            FieldType::UInt16 => std::mem::size_of::<u16>(),
            FieldType::UInt32 => std::mem::size_of::<u32>(),
            FieldType::UInt64 => std::mem::size_of::<u64>(),
            FieldType::Int8 => std::mem::size_of::<i8>(),
            FieldType::Int16 => std::mem::size_of::<i16>(),
            FieldType::Int32 => std::mem::size_of::<i32>(),
            FieldType::Int64 => std::mem::size_of::<i64>(),
            FieldType::Float32 => std::mem::size_of::<f32>(),
            FieldType::Float64 => std::mem::size_of::<f64>(),
            FieldType::String { capacity } => STRING_HEADER_SIZE + capacity,
            FieldType::Aggregate(fields) => layout::fields_size(fields),
        }
    }

    /// Whether this type may be used as a schema's key field
    pub fn is_key_eligible(&self) -> bool {
        !matches!(self, FieldType::Aggregate(_))
    }
}

/// A named field within a schema
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// An ordered field list plus the designated key field
///
/// Construction validates the invariants the engine relies on; once built, a
/// schema is immutable. Collections take their schema by value, so a caller
/// can never mutate the layout out from under a live collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<Field>,
    key_field_index: u32,
}

impl Schema {
    /// Build a schema, validating:
    /// - the field list is non-empty, and so is every nested aggregate
    /// - `key_field_index` is in range
    /// - the key field is a scalar or string, never an aggregate
    pub fn new(fields: Vec<Field>, key_field_index: u32) -> Result<Self> {
        if fields.is_empty() {
            return Err(LatticeError::InvalidSchema(
                "schema must have at least one field".to_string(),
            ));
        }

        check_aggregates_nonempty(&fields)?;

        let key_field = fields.get(key_field_index as usize).ok_or_else(|| {
            LatticeError::InvalidSchema(format!(
                "key field index {} out of range (schema has {} fields)",
                key_field_index,
                fields.len()
            ))
        })?;

        if !key_field.ty.is_key_eligible() {
            return Err(LatticeError::InvalidSchema(format!(
                "key field '{}' must be a scalar or string, not an aggregate",
                key_field.name
            )));
        }

        Ok(Self {
            fields,
            key_field_index,
        })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn key_field_index(&self) -> u32 {
        self.key_field_index
    }

    pub fn key_field(&self) -> &Field {
        &self.fields[self.key_field_index as usize]
    }

    /// Byte offset of field `field_index` within a record
    ///
    /// Precondition: `field_index < self.fields().len()`.
    pub fn offset(&self, field_index: usize) -> usize {
        layout::field_offset(&self.fields, field_index)
    }

    /// Total record size, including interior padding
    pub fn size(&self) -> usize {
        layout::fields_size(&self.fields)
    }

    /// Alignment of the whole record: the max alignment over all fields
    pub fn alignment(&self) -> usize {
        self.fields
            .iter()
            .map(|f| f.ty.alignment())
            .max()
            .unwrap_or(1)
    }
}

/// An aggregate with no members has no alignment or size; reject it before
/// it can reach the layout walk
fn check_aggregates_nonempty(fields: &[Field]) -> Result<()> {
    for field in fields {
        if let FieldType::Aggregate(members) = &field.ty {
            if members.is_empty() {
                return Err(LatticeError::InvalidSchema(format!(
                    "aggregate field '{}' has no members",
                    field.name
                )));
            }

            check_aggregates_nonempty(members)?;
        }
    }

    Ok(())
}
