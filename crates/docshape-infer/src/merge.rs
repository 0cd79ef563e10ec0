//! Folding per-document field maps into one collection shape.

use std::collections::btree_map::Entry;

use crate::types::{FieldDescriptor, FieldMap, FieldType};

/// Fold every observed map into one, in iteration order.
pub fn merge_all(observed: impl IntoIterator<Item = FieldMap>) -> FieldMap {
    observed.into_iter().fold(FieldMap::new(), merge_field_maps)
}

/// Merge one document's fields into the accumulator.
///
/// New field names are inserted as observed. Existing descriptors keep their
/// base type and sample; a differing type is appended to `type_variations`.
pub fn merge_field_maps(mut acc: FieldMap, observed: FieldMap) -> FieldMap {
    for (name, descriptor) in observed {
        match acc.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert(descriptor);
            }
            Entry::Occupied(mut slot) => {
                record_variation(slot.get_mut(), descriptor.field_type);
            }
        }
    }
    acc
}

fn record_variation(existing: &mut FieldDescriptor, seen: FieldType) {
    if existing.field_type == seen {
        return;
    }
    let base = existing.field_type.clone();
    let variations = existing.type_variations.get_or_insert_with(|| vec![base]);
    if !variations.contains(&seen) {
        variations.push(seen);
    }
}
