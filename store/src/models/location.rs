//! Typed view over the session-location collection.
//!
//! The collection holds at most one document: the geofence every QR payload
//! and proximity check is anchored to.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::document::Document;
use crate::error::StoreError;

pub fn collection_id() -> String {
    common::config::location_collection()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub updated_at: DateTime<Utc>,
}

impl SessionLocation {
    pub fn to_data(&self) -> Value {
        json!({
            "Latitude": self.latitude,
            "Longitude": self.longitude,
            "updated_at": self.updated_at.to_rfc3339(),
        })
    }

    /// Decodes a document, tolerating coordinates stored as strings by
    /// older writers.
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let latitude = doc
            .f64_field("Latitude")
            .ok_or_else(|| missing(doc, "Latitude"))?;
        let longitude = doc
            .f64_field("Longitude")
            .ok_or_else(|| missing(doc, "Longitude"))?;

        let updated_at = match doc.str_field("updated_at") {
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map_err(|e| {
                    StoreError::Decode(format!("location {}: bad updated_at {raw:?}: {e}", doc.id))
                })?
                .with_timezone(&Utc),
            None => doc.updated_at.unwrap_or_else(Utc::now),
        };

        Ok(Self {
            latitude,
            longitude,
            updated_at,
        })
    }
}

fn missing(doc: &Document, field: &str) -> StoreError {
    StoreError::Decode(format!("location {}: missing {field}", doc.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tolerates_string_coordinates() {
        let doc = Document::new(
            "loc",
            json!({
                "Latitude": "12.9716",
                "Longitude": "77.5946",
                "updated_at": "2025-03-14T04:00:00+00:00"
            })
            .as_object()
            .cloned()
            .unwrap(),
        );
        let loc = SessionLocation::from_document(&doc).unwrap();
        assert_eq!(loc.latitude, 12.9716);
        assert_eq!(loc.longitude, 77.5946);
    }

    #[test]
    fn rejects_documents_without_coordinates() {
        let doc = Document::new(
            "loc",
            json!({ "Latitude": 1.0 }).as_object().cloned().unwrap(),
        );
        assert!(SessionLocation::from_document(&doc).is_err());
    }
}
