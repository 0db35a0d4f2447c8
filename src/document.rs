//! Document model: an opaque content unit with an id, free text, and a
//! typed metadata bag.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::vector::Vector;

/// A scalar metadata value.
///
/// Metadata values are restricted to these four shapes; anything else is
/// rejected at the API boundary rather than inside the codec. The serde
/// representation is untagged, so the JSON form of a metadata bag is a flat
/// object of plain scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Double precision float.
    Float(f64),
    /// UTF-8 string.
    Str(String),
}

impl MetadataValue {
    /// Short uppercase type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            MetadataValue::Bool(_) => "BOOLEAN",
            MetadataValue::Int(_) => "INTEGER",
            MetadataValue::Float(_) => "FLOAT",
            MetadataValue::Str(_) => "STRING",
        }
    }

    /// Numeric view of this value, when it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Int(v) => Some(*v as f64),
            MetadataValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Str(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Str(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

impl From<i32> for MetadataValue {
    fn from(value: i32) -> Self {
        MetadataValue::Int(value as i64)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

/// An opaque content unit stored in a collection.
///
/// The identifier is unique within a collection; re-ingesting an existing id
/// overwrites content, metadata, and embedding atomically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier, treated as opaque.
    pub id: String,
    /// Free-text content.
    pub content: String,
    /// Open key-value metadata bag.
    #[serde(default)]
    pub metadata: HashMap<String, MetadataValue>,
}

impl Document {
    /// Create a document with a generated (v4 UUID) identifier.
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), content)
    }

    /// Create a document with a caller-assigned identifier.
    pub fn with_id<I: Into<String>, S: Into<String>>(id: I, content: S) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry, consuming and returning the document.
    pub fn with_metadata<K: Into<String>, V: Into<MetadataValue>>(mut self, key: K, value: V) -> Self {
        self.set_metadata(key, value);
        self
    }

    /// Set a metadata entry.
    pub fn set_metadata<K: Into<String>, V: Into<MetadataValue>>(&mut self, key: K, value: V) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Get a metadata entry by key.
    pub fn get_metadata(&self, key: &str) -> Option<&MetadataValue> {
        self.metadata.get(key)
    }
}

/// A document annotated with its distance to the query vector.
///
/// `distance` is already display-remapped for the DOT metric; `score` is
/// `1 - distance` by convention, so larger is always more similar.
/// Constructed per query, never persisted.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched document.
    pub document: Document,
    /// The stored embedding, decoded from the native column.
    pub embedding: Option<Vector>,
    /// Distance to the query vector (smaller is more similar).
    pub distance: f64,
    /// Similarity score derived from the distance (larger is more similar).
    pub score: f64,
}
