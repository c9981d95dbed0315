//! Typed view over the courses collection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;
use crate::error::StoreError;

pub fn collection_id() -> String {
    common::config::courses_collection()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourseStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "Programme")]
    pub programme: String,
    /// Nominal length in years.
    #[serde(rename = "Duration")]
    pub duration: i32,
    #[serde(rename = "Status")]
    pub status: CourseStatus,
}

impl Course {
    pub fn to_data(&self) -> Result<Value, StoreError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        serde_json::from_value(Value::Object(doc.data.clone()))
            .map_err(|e| StoreError::Decode(format!("course {}: {e}", doc.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_through_document_data() {
        let course = Course {
            programme: "BSc Computer Science".into(),
            duration: 3,
            status: CourseStatus::Active,
        };
        let doc = Document::new(
            "c1",
            course.to_data().unwrap().as_object().cloned().unwrap(),
        );
        assert_eq!(Course::from_document(&doc).unwrap(), course);
        assert_eq!(doc.str_field("Programme"), Some("BSc Computer Science"));
    }
}
