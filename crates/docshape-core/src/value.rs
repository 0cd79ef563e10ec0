//! Decoded document values and their typed-JSON wire encoding.
//!
//! Documents are stored and exchanged in the typed value format of the
//! Firestore REST surface, e.g. `{"integerValue": "5"}` or
//! `{"mapValue": {"fields": {...}}}`. In memory they are a plain owned tree.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Field name → value mapping of one document or nested map.
pub type Fields = BTreeMap<String, DocValue>;

/// One decoded value from the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireValue", into = "WireValue")]
pub enum DocValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Timestamp(DateTime<Utc>),
    String(String),
    Bytes(Vec<u8>),
    /// Path of another document, e.g. `vendor_store/v1`.
    Reference(String),
    GeoPoint { latitude: f64, longitude: f64 },
    Array(Vec<DocValue>),
    Map(Fields),
}

impl DocValue {
    /// Name of the value kind as the store reports it.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Double(_) => "double",
            Self::Timestamp(_) => "timestamp",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Reference(_) => "reference",
            Self::GeoPoint { .. } => "geopoint",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }

    pub fn as_map(&self) -> Option<&Fields> {
        match self {
            Self::Map(fields) => Some(fields),
            _ => None,
        }
    }

    /// Plain JSON rendering used for samples and reports.
    ///
    /// Values JSON cannot carry natively (timestamps, bytes, references,
    /// geo points, non-finite doubles) are coerced to display strings.
    pub fn to_display_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            Self::Null => Value::Null,
            Self::Boolean(b) => Value::Bool(*b),
            Self::Integer(i) => Value::from(*i),
            Self::Double(d) => serde_json::Number::from_f64(*d)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(d.to_string())),
            Self::Timestamp(ts) => Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::String(s) => Value::String(s.clone()),
            Self::Bytes(b) => Value::String(format!("<bytes: {}>", b.len())),
            Self::Reference(path) => Value::String(path.clone()),
            Self::GeoPoint {
                latitude,
                longitude,
            } => Value::String(format!("GeoPoint({}, {})", latitude, longitude)),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_display_json).collect()),
            Self::Map(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_display_json()))
                    .collect(),
            ),
        }
    }
}

/// Plain JSON converts losslessly except that integers beyond `i64` become doubles.
impl From<serde_json::Value> for DocValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Boolean(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

/// Build document fields from a plain JSON object. Non-objects yield no fields.
pub fn fields_from_json(value: serde_json::Value) -> Fields {
    match DocValue::from(value) {
        DocValue::Map(fields) => fields,
        _ => Fields::new(),
    }
}

// ---------------------------------------------------------------
// Wire encoding
// ---------------------------------------------------------------

#[derive(Serialize, Deserialize)]
enum WireValue {
    #[serde(rename = "nullValue")]
    Null(()),
    #[serde(rename = "booleanValue")]
    Boolean(bool),
    #[serde(rename = "integerValue")]
    Integer(WireInteger),
    #[serde(rename = "doubleValue")]
    Double(f64),
    #[serde(rename = "timestampValue")]
    Timestamp(DateTime<Utc>),
    #[serde(rename = "stringValue")]
    String(String),
    #[serde(rename = "bytesValue")]
    Bytes(String),
    #[serde(rename = "referenceValue")]
    Reference(String),
    #[serde(rename = "geoPointValue")]
    GeoPoint(LatLng),
    #[serde(rename = "arrayValue")]
    Array(ArrayValue),
    #[serde(rename = "mapValue")]
    Map(MapValue),
}

/// The REST surface sends 64-bit integers as strings; bare numbers are accepted too.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WireInteger {
    Text(String),
    Number(i64),
}

#[derive(Serialize, Deserialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

#[derive(Serialize, Deserialize)]
struct ArrayValue {
    #[serde(default)]
    values: Vec<DocValue>,
}

#[derive(Serialize, Deserialize)]
struct MapValue {
    #[serde(default)]
    fields: Fields,
}

impl TryFrom<WireValue> for DocValue {
    type Error = Error;

    fn try_from(wire: WireValue) -> Result<Self, Self::Error> {
        Ok(match wire {
            WireValue::Null(()) => Self::Null,
            WireValue::Boolean(b) => Self::Boolean(b),
            WireValue::Integer(WireInteger::Number(i)) => Self::Integer(i),
            WireValue::Integer(WireInteger::Text(s)) => Self::Integer(
                s.parse()
                    .map_err(|_| Error::Decode(format!("invalid integerValue: {:?}", s)))?,
            ),
            WireValue::Double(d) => Self::Double(d),
            WireValue::Timestamp(ts) => Self::Timestamp(ts),
            WireValue::String(s) => Self::String(s),
            WireValue::Bytes(encoded) => Self::Bytes(
                BASE64
                    .decode(encoded.as_bytes())
                    .map_err(|e| Error::Decode(format!("invalid bytesValue: {}", e)))?,
            ),
            WireValue::Reference(path) => Self::Reference(path),
            WireValue::GeoPoint(LatLng {
                latitude,
                longitude,
            }) => Self::GeoPoint {
                latitude,
                longitude,
            },
            WireValue::Array(ArrayValue { values }) => Self::Array(values),
            WireValue::Map(MapValue { fields }) => Self::Map(fields),
        })
    }
}

impl From<DocValue> for WireValue {
    fn from(value: DocValue) -> Self {
        match value {
            DocValue::Null => Self::Null(()),
            DocValue::Boolean(b) => Self::Boolean(b),
            DocValue::Integer(i) => Self::Integer(WireInteger::Text(i.to_string())),
            DocValue::Double(d) => Self::Double(d),
            DocValue::Timestamp(ts) => Self::Timestamp(ts),
            DocValue::String(s) => Self::String(s),
            DocValue::Bytes(b) => Self::Bytes(BASE64.encode(b)),
            DocValue::Reference(path) => Self::Reference(path),
            DocValue::GeoPoint {
                latitude,
                longitude,
            } => Self::GeoPoint(LatLng {
                latitude,
                longitude,
            }),
            DocValue::Array(values) => Self::Array(ArrayValue { values }),
            DocValue::Map(fields) => Self::Map(MapValue { fields }),
        }
    }
}
