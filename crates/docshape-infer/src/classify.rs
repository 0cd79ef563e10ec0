//! Value → type tag classification.

use docshape_core::DocValue;

use crate::types::FieldType;

/// Array elements inspected by [`classify`].
pub const DEFAULT_ARRAY_INSPECT_LIMIT: usize = 5;

/// Classify a value, inspecting at most the first five elements of arrays.
pub fn classify(value: &DocValue) -> FieldType {
    classify_with_limit(value, DEFAULT_ARRAY_INSPECT_LIMIT)
}

/// Classify a value, inspecting at most `inspect_limit` elements of each array.
///
/// Total: kinds without a dedicated tag map to `unknown(<kind>)`.
pub fn classify_with_limit(value: &DocValue, inspect_limit: usize) -> FieldType {
    match value {
        DocValue::Boolean(_) => FieldType::Boolean,
        DocValue::Integer(_) => FieldType::Integer,
        DocValue::Double(_) => FieldType::Float,
        DocValue::String(_) => FieldType::String,
        DocValue::Array(items) => FieldType::array_of(
            items
                .iter()
                .take(inspect_limit)
                .map(|item| classify_with_limit(item, inspect_limit)),
        ),
        DocValue::Map(_) => FieldType::Map,
        DocValue::Timestamp(_) => FieldType::Timestamp,
        DocValue::Null => FieldType::Null,
        other => FieldType::Unknown(other.kind_name().to_string()),
    }
}
