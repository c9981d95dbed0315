//! Document envelope shared by every collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Generates a client-side document ID, the backend's `ID.unique()` analogue.
pub fn unique_id() -> String {
    Uuid::new_v4().to_string()
}

/// A stored document: the server-managed envelope plus the user attributes.
///
/// Attributes live in [`Document::data`] keyed by their collection attribute
/// names (`Student_Id`, `Marked_at`, ...). Typed views over them are in
/// [`crate::models`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "$updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            created_at: None,
            updated_at: None,
            data,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(Value::as_str)
    }

    /// Numeric attribute access tolerating numbers stored as strings.
    pub fn f64_field(&self, name: &str) -> Option<f64> {
        match self.data.get(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Resolves a relationship attribute to the referenced document ID.
    ///
    /// The backend returns relations either as the bare ID or as the expanded
    /// document, depending on how the record was written.
    pub fn reference_field(&self, name: &str) -> Option<&str> {
        match self.data.get(name)? {
            Value::String(id) => Some(id),
            Value::Object(map) => map.get("$id").and_then(Value::as_str),
            _ => None,
        }
    }
}

/// A typed record paired with the ID of the document backing it, for flows
/// that need to update or delete what they listed.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<T> {
    pub id: String,
    pub record: T,
}

impl<T> Stored<T> {
    pub fn new(id: impl Into<String>, record: T) -> Self {
        Self {
            id: id.into(),
            record,
        }
    }
}

/// A page of documents with the backend's total count.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentList {
    pub total: u64,
    pub documents: Vec<Document>,
}

impl DocumentList {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_envelope_and_attributes() {
        let doc: Document = serde_json::from_value(json!({
            "$id": "abc",
            "$createdAt": "2025-03-14T04:00:00.000+00:00",
            "Status": "Present",
            "Latitude": "12.9716"
        }))
        .unwrap();

        assert_eq!(doc.id, "abc");
        assert!(doc.created_at.is_some());
        assert_eq!(doc.str_field("Status"), Some("Present"));
        assert_eq!(doc.f64_field("Latitude"), Some(12.9716));
    }

    #[test]
    fn reference_field_handles_bare_and_expanded_relations() {
        let bare = Document::new(
            "r1",
            json!({ "Student_Id": "stu-1" }).as_object().cloned().unwrap(),
        );
        let expanded = Document::new(
            "r2",
            json!({ "Student_Id": { "$id": "stu-1", "Name": "A" } })
                .as_object()
                .cloned()
                .unwrap(),
        );
        assert_eq!(bare.reference_field("Student_Id"), Some("stu-1"));
        assert_eq!(expanded.reference_field("Student_Id"), Some("stu-1"));
    }

    #[test]
    fn unique_ids_do_not_collide() {
        assert_ne!(unique_id(), unique_id());
    }
}
