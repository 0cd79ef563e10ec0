//! Inferred type tags, field descriptors and the report tree.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Type tag inferred for one value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Boolean,
    Integer,
    Float,
    String,
    /// Homogeneous array, e.g. `array<integer>`.
    Array(Box<FieldType>),
    /// Heterogeneous array; members are distinct and sorted by label.
    MixedArray(Vec<FieldType>),
    EmptyArray,
    Map,
    Timestamp,
    Null,
    /// Value kind with no dedicated tag, carrying the store's kind name.
    Unknown(String),
}

impl FieldType {
    /// Array tag for the given element tags.
    ///
    /// No elements gives `array<empty>`, one distinct tag `array<T>`, and
    /// anything else `array<mixed: ...>` with deduplicated, label-sorted
    /// members so the label is reproducible.
    pub fn array_of(elements: impl IntoIterator<Item = FieldType>) -> Self {
        let mut members: Vec<FieldType> = elements.into_iter().collect();
        members.sort_by_cached_key(|t| t.to_string());
        members.dedup();

        match members.len() {
            0 => Self::EmptyArray,
            1 => Self::Array(Box::new(members.remove(0))),
            _ => Self::MixedArray(members),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => write!(f, "boolean"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::String => write!(f, "string"),
            Self::Array(inner) => write!(f, "array<{}>", inner),
            Self::MixedArray(members) => {
                write!(f, "array<mixed: ")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", member)?;
                }
                write!(f, ">")
            }
            Self::EmptyArray => write!(f, "array<empty>"),
            Self::Map => write!(f, "map"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::Null => write!(f, "null"),
            Self::Unknown(name) => write!(f, "unknown({})", name),
        }
    }
}

/// Error parsing a type label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized field type label: {0:?}")]
pub struct ParseFieldTypeError(pub String);

impl FromStr for FieldType {
    type Err = ParseFieldTypeError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let label = label.trim();
        let simple = match label {
            "boolean" => Some(Self::Boolean),
            "integer" => Some(Self::Integer),
            "float" => Some(Self::Float),
            "string" => Some(Self::String),
            "map" => Some(Self::Map),
            "timestamp" => Some(Self::Timestamp),
            "null" => Some(Self::Null),
            "array<empty>" => Some(Self::EmptyArray),
            _ => None,
        };
        if let Some(t) = simple {
            return Ok(t);
        }

        if let Some(inner) = label.strip_prefix("array<").and_then(|s| s.strip_suffix('>')) {
            return match inner.strip_prefix("mixed: ") {
                Some(members) => Ok(Self::MixedArray(
                    split_top_level(members)
                        .into_iter()
                        .map(|member| member.parse::<FieldType>())
                        .collect::<Result<Vec<_>, _>>()?,
                )),
                None => Ok(Self::Array(Box::new(inner.parse()?))),
            };
        }

        if let Some(name) = label.strip_prefix("unknown(").and_then(|s| s.strip_suffix(')')) {
            return Ok(Self::Unknown(name.to_string()));
        }

        Err(ParseFieldTypeError(label.to_string()))
    }
}

/// Split on commas that are not nested inside `<...>` or `(...)`.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

/// Field name → descriptor.
pub type FieldMap = BTreeMap<String, FieldDescriptor>;

/// Inferred shape of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Display form of a representative value, or a summary for maps and arrays of maps.
    #[serde(default)]
    pub sample_value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested_fields: Option<FieldMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_length: Option<usize>,
    /// Shape of the first element when an array starts with a map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_element_structure: Option<FieldMap>,
    /// Every distinct type seen for this field across sampled documents, in
    /// first-seen order. Absent while all documents agree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_variations: Option<Vec<FieldType>>,
}

impl FieldDescriptor {
    pub fn new(field_type: FieldType, sample_value: serde_json::Value) -> Self {
        Self {
            field_type,
            sample_value,
            nested_fields: None,
            array_length: None,
            array_element_structure: None,
            type_variations: None,
        }
    }
}

/// One sampled document echoed into a collection report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleDocument {
    pub document_id: String,
    pub field_names: Vec<String>,
    pub sample_values: BTreeMap<String, serde_json::Value>,
}

impl SampleDocument {
    pub fn from_fields(document_id: &str, fields: &FieldMap) -> Self {
        Self {
            document_id: document_id.to_string(),
            field_names: fields.keys().cloned().collect(),
            sample_values: fields
                .iter()
                .map(|(name, d)| (name.clone(), d.sample_value.clone()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub total_unique_fields: usize,
    pub field_names: Vec<String>,
}

impl FieldSummary {
    pub fn of(fields: &FieldMap) -> Self {
        Self {
            total_unique_fields: fields.len(),
            field_names: fields.keys().cloned().collect(),
        }
    }
}

/// Merged shape of a sampled collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionAnalysis {
    pub total_documents_analyzed: usize,
    pub document_structure: FieldMap,
    pub sample_documents: Vec<SampleDocument>,
    pub field_summary: FieldSummary,
    /// Sub-collections found under the first sampled document; absent when there are none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcollections: Option<BTreeMap<String, CollectionStructure>>,
}

/// Marker serialized as `"empty_collection"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmptyMarker {
    #[serde(rename = "empty_collection")]
    EmptyCollection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmptyCollection {
    pub document_count: usize,
    pub structure: EmptyMarker,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedCollection {
    pub error: String,
    pub document_count: usize,
}

/// Result of analyzing one (sub-)collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CollectionStructure {
    Analyzed(CollectionAnalysis),
    Empty(EmptyCollection),
    Failed(FailedCollection),
}

impl CollectionStructure {
    pub fn empty() -> Self {
        Self::Empty(EmptyCollection {
            document_count: 0,
            structure: EmptyMarker::EmptyCollection,
        })
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed(FailedCollection {
            error: error.into(),
            document_count: 0,
        })
    }

    pub fn as_analyzed(&self) -> Option<&CollectionAnalysis> {
        match self {
            Self::Analyzed(a) => Some(a),
            _ => None,
        }
    }

    /// Documents analyzed, 0 for the empty and failed sentinels.
    pub fn document_count(&self) -> usize {
        match self {
            Self::Analyzed(a) => a.total_documents_analyzed,
            Self::Empty(e) => e.document_count,
            Self::Failed(f) => f.document_count,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(f) => Some(&f.error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainDocument {
    pub field_count: usize,
    pub structure: FieldMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_subcollections: usize,
    pub main_document_fields: usize,
    pub subcollection_names: Vec<String>,
}

/// Report for an existing root document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentReport {
    pub collection_name: String,
    pub document_id: String,
    pub document_exists: bool,
    pub main_document: MainDocument,
    pub subcollections_count: usize,
    pub subcollections: BTreeMap<String, CollectionStructure>,
    pub analysis_summary: AnalysisSummary,
}

/// Returned instead of a report when the root document is missing or unreadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportError {
    pub error: String,
    pub collection: String,
    pub document_id: String,
}

/// Final output of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StructureReport {
    Found(Box<DocumentReport>),
    Error(ReportError),
}

impl StructureReport {
    pub fn not_found(collection: &str, document_id: &str) -> Self {
        Self::error(
            format!("Document {} not found in collection {}", document_id, collection),
            collection,
            document_id,
        )
    }

    pub fn error(error: impl Into<String>, collection: &str, document_id: &str) -> Self {
        Self::Error(ReportError {
            error: error.into(),
            collection: collection.to_string(),
            document_id: document_id.to_string(),
        })
    }

    pub fn document_id(&self) -> &str {
        match self {
            Self::Found(r) => &r.document_id,
            Self::Error(e) => &e.document_id,
        }
    }

    pub fn as_found(&self) -> Option<&DocumentReport> {
        match self {
            Self::Found(r) => Some(r),
            Self::Error(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_labels() {
        assert_eq!(FieldType::Boolean.to_string(), "boolean");
        assert_eq!(
            FieldType::Array(Box::new(FieldType::Integer)).to_string(),
            "array<integer>"
        );
        assert_eq!(
            FieldType::MixedArray(vec![FieldType::Integer, FieldType::String]).to_string(),
            "array<mixed: integer, string>"
        );
        assert_eq!(FieldType::Unknown("bytes".into()).to_string(), "unknown(bytes)");
    }

    #[test]
    fn test_array_of_sorts_and_dedups() {
        let t = FieldType::array_of(vec![
            FieldType::String,
            FieldType::Integer,
            FieldType::String,
        ]);
        assert_eq!(
            t,
            FieldType::MixedArray(vec![FieldType::Integer, FieldType::String])
        );
        assert_eq!(FieldType::array_of(vec![]), FieldType::EmptyArray);
        assert_eq!(
            FieldType::array_of(vec![FieldType::Map, FieldType::Map]),
            FieldType::Array(Box::new(FieldType::Map))
        );
    }

    #[test]
    fn test_label_parse_handles_nesting() {
        let labels = [
            "boolean",
            "array<empty>",
            "array<array<integer>>",
            "array<mixed: array<mixed: float, string>, integer, unknown(bytes)>",
            "unknown(geopoint)",
        ];
        for label in labels {
            let parsed: FieldType = label.parse().unwrap();
            assert_eq!(parsed.to_string(), label);
        }
        assert!("array<".parse::<FieldType>().is_err());
        assert!("number".parse::<FieldType>().is_err());
    }

    #[test]
    fn test_descriptor_json_shape() {
        let mut d = FieldDescriptor::new(FieldType::Integer, json!(5));
        d.type_variations = Some(vec![FieldType::Integer, FieldType::String]);
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(
            v,
            json!({"type": "integer", "sample_value": 5, "type_variations": ["integer", "string"]})
        );
    }

    #[test]
    fn test_collection_sentinels_json_shape() {
        assert_eq!(
            serde_json::to_value(CollectionStructure::empty()).unwrap(),
            json!({"document_count": 0, "structure": "empty_collection"})
        );
        assert_eq!(
            serde_json::to_value(CollectionStructure::failed("denied")).unwrap(),
            json!({"error": "denied", "document_count": 0})
        );

        let back: CollectionStructure =
            serde_json::from_value(json!({"error": "x", "document_count": 0})).unwrap();
        assert_eq!(back.error(), Some("x"));
        let back: CollectionStructure =
            serde_json::from_value(json!({"document_count": 0, "structure": "empty_collection"}))
                .unwrap();
        assert_eq!(back, CollectionStructure::empty());
    }

    #[test]
    fn test_not_found_report_shape() {
        let report = StructureReport::not_found("vendor_store", "missing");
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(
            v,
            json!({
                "error": "Document missing not found in collection vendor_store",
                "collection": "vendor_store",
                "document_id": "missing"
            })
        );
        assert!(v.get("document_exists").is_none());
        assert!(report.is_error());
    }
}
