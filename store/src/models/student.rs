//! Typed view over the students collection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;
use crate::error::StoreError;

/// Collection ID, overridable through the environment.
pub fn collection_id() -> String {
    common::config::students_collection()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Others,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StudyYear {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    Active,
    Inactive,
}

/// One student record. `course_id` references the courses collection;
/// `user_id` links the provisioned auth account once it exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Gender")]
    pub gender: Gender,
    #[serde(rename = "ABC_ID")]
    pub abc_id: i64,
    #[serde(rename = "Semester")]
    pub semester: i32,
    #[serde(rename = "Batch")]
    pub batch: i32,
    #[serde(rename = "Year")]
    pub year: StudyYear,
    #[serde(rename = "Status")]
    pub status: EnrollmentStatus,
    #[serde(rename = "Course")]
    pub course_id: String,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Student {
    /// Attribute map for create and update calls.
    pub fn to_data(&self) -> Result<Value, StoreError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decodes a document, resolving the course relation whether the backend
    /// returned it as a bare ID or an expanded document.
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let mut data = doc.data.clone();
        if let Some(course_id) = doc.reference_field("Course") {
            data.insert("Course".into(), Value::String(course_id.to_string()));
        }
        serde_json::from_value(Value::Object(data))
            .map_err(|e| StoreError::Decode(format!("student {}: {e}", doc.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Student {
        Student {
            name: "Asha Rao".into(),
            email: "asha@example.com".into(),
            gender: Gender::Female,
            abc_id: 920_411_003,
            semester: 4,
            batch: 2023,
            year: StudyYear::Second,
            status: EnrollmentStatus::Active,
            course_id: "course-1".into(),
            user_id: None,
        }
    }

    #[test]
    fn data_uses_collection_attribute_names() {
        let data = sample().to_data().unwrap();
        assert_eq!(data["Name"], json!("Asha Rao"));
        assert_eq!(data["ABC_ID"], json!(920_411_003));
        assert_eq!(data["Year"], json!("Second"));
        assert_eq!(data["Course"], json!("course-1"));
        assert!(data.get("userId").is_none());
    }

    #[test]
    fn decodes_expanded_course_relation() {
        let doc = Document::new(
            "s1",
            json!({
                "Name": "Asha Rao",
                "Email": "asha@example.com",
                "Gender": "Female",
                "ABC_ID": 920411003i64,
                "Semester": 4,
                "Batch": 2023,
                "Year": "Second",
                "Status": "Active",
                "Course": { "$id": "course-1", "Programme": "BSc" },
                "userId": "u-7"
            })
            .as_object()
            .cloned()
            .unwrap(),
        );

        let student = Student::from_document(&doc).unwrap();
        assert_eq!(student.course_id, "course-1");
        assert_eq!(student.user_id.as_deref(), Some("u-7"));
    }

    #[test]
    fn decode_rejects_missing_fields() {
        let doc = Document::new(
            "s2",
            json!({ "Name": "No Email" }).as_object().cloned().unwrap(),
        );
        assert!(Student::from_document(&doc).is_err());
    }
}
