//! Record layout arithmetic
//!
//! Field offsets are accumulated front to back: each field starts at the
//! running offset rounded up to the field's alignment. The same walk serves
//! top-level schemas and nested aggregates.

use super::{Field, Schema};

/// Round `offset` up to the next multiple of `align`
///
/// Alignments are always powers of two (they come from `align_of`), which
/// the mask trick relies on.
fn round_up(offset: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (offset + align - 1) & !(align - 1)
}

/// Byte offset of field `index` within an ordered field list
///
/// Precondition: `index < fields.len()` and the list is non-empty.
pub(crate) fn field_offset(fields: &[Field], index: usize) -> usize {
    assert!(!fields.is_empty());
    assert!(index < fields.len());

    let mut offset = 0;

    for (i, field) in fields.iter().enumerate() {
        offset = round_up(offset, field.ty.alignment());

        if i == index {
            break;
        }

        offset += field.ty.size();
    }

    offset
}

/// Packed-with-padding size of an ordered field list
pub(crate) fn fields_size(fields: &[Field]) -> usize {
    assert!(!fields.is_empty());

    let last = fields.len() - 1;
    field_offset(fields, last) + fields[last].ty.size()
}

/// Offset and size of one field within a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSlot {
    pub offset: usize,
    pub size: usize,
}

/// Per-field offset table, computed once from a schema
///
/// Collections resolve field positions through this table and slice records
/// with ordinary bounds-checked indexing; no pointer arithmetic anywhere.
#[derive(Debug, Clone)]
pub struct Layout {
    slots: Vec<FieldSlot>,
    size: usize,
}

impl Layout {
    pub fn new(schema: &Schema) -> Self {
        let slots = schema
            .fields()
            .iter()
            .enumerate()
            .map(|(i, field)| FieldSlot {
                offset: schema.offset(i),
                size: field.ty.size(),
            })
            .collect();

        Self {
            slots,
            size: schema.size(),
        }
    }

    pub fn slot(&self, field_index: usize) -> FieldSlot {
        self.slots[field_index]
    }

    /// Slice the bytes of field `field_index` out of a record
    pub fn field<'a>(&self, record: &'a [u8], field_index: usize) -> &'a [u8] {
        let slot = self.slots[field_index];
        &record[slot.offset..slot.offset + slot.size]
    }

    /// Total record size, including interior padding
    pub fn size(&self) -> usize {
        self.size
    }
}
