//! Per-document field analysis.
//!
//! Walks one decoded document and produces a descriptor per field,
//! recursing into nested maps and into the first element of arrays that
//! start with a map.

use serde_json::Value;
use tracing::warn;

use docshape_core::{AnalyzerConfig, DocValue, Fields};

use crate::classify::classify_with_limit;
use crate::types::{FieldDescriptor, FieldMap};

/// Marker appended to truncated samples.
pub const TRUNCATION_MARKER: &str = "...";

/// Analyzes one document's fields under the sampling limits of a config.
#[derive(Debug, Clone, Copy)]
pub struct FieldAnalyzer<'a> {
    config: &'a AnalyzerConfig,
}

impl<'a> FieldAnalyzer<'a> {
    pub fn new(config: &'a AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Descriptor for every field of a document.
    pub fn analyze_fields(&self, fields: &Fields) -> FieldMap {
        self.analyze_at(fields, 0)
    }

    fn analyze_at(&self, fields: &Fields, depth: usize) -> FieldMap {
        fields
            .iter()
            .map(|(name, value)| (name.clone(), self.describe(value, depth)))
            .collect()
    }

    /// Descriptor for a single value found at nesting `depth` (0 = document level).
    pub fn describe(&self, value: &DocValue, depth: usize) -> FieldDescriptor {
        let field_type = classify_with_limit(value, self.config.array_inspect_limit);

        match value {
            DocValue::Map(nested) => {
                let mut descriptor = FieldDescriptor::new(
                    field_type,
                    Value::String(format!("<map with {} fields>", nested.len())),
                );
                descriptor.nested_fields = self.nested(nested, depth);
                descriptor
            }
            DocValue::Array(items) => {
                let (sample, element_structure) = match items.first().map(DocValue::as_map) {
                    None => (Value::Array(Vec::new()), None),
                    Some(Some(first)) => (
                        Value::String(format!("<array of maps, length: {}>", items.len())),
                        self.nested(first, depth),
                    ),
                    Some(None) => (self.array_sample(items), None),
                };
                let mut descriptor = FieldDescriptor::new(field_type, sample);
                descriptor.array_length = Some(items.len());
                descriptor.array_element_structure = element_structure;
                descriptor
            }
            DocValue::String(s) => FieldDescriptor::new(field_type, self.string_sample(s)),
            other => FieldDescriptor::new(field_type, other.to_display_json()),
        }
    }

    /// Analyze a nested map one level deeper, unless the depth cap is reached.
    fn nested(&self, fields: &Fields, depth: usize) -> Option<FieldMap> {
        let next = depth + 1;
        if next >= self.config.max_field_depth {
            warn!(
                depth = next,
                max_field_depth = self.config.max_field_depth,
                "nesting depth cap reached, nested fields omitted"
            );
            return None;
        }
        Some(self.analyze_at(fields, next))
    }

    fn string_sample(&self, s: &str) -> Value {
        let limit = self.config.string_sample_limit;
        if s.chars().count() > limit {
            let mut truncated: String = s.chars().take(limit).collect();
            truncated.push_str(TRUNCATION_MARKER);
            Value::String(truncated)
        } else {
            Value::String(s.to_string())
        }
    }

    fn array_sample(&self, items: &[DocValue]) -> Value {
        let limit = self.config.array_sample_limit;
        let mut sample: Vec<Value> = items.iter().take(limit).map(DocValue::to_display_json).collect();
        if items.len() > limit {
            sample.push(Value::String(TRUNCATION_MARKER.to_string()));
        }
        Value::Array(sample)
    }
}
