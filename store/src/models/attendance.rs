//! Typed view over the attendance records collection.
//!
//! A record is one "present" event. Absence is the absence of a record, so
//! the status attribute has a single value; it stays on the wire because the
//! collection schema has it and the day-window queries filter on it.

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::document::Document;
use crate::error::StoreError;
use crate::query::Query;

pub fn collection_id() -> String {
    common::config::attendance_collection()
}

/// Collection attribute names.
pub mod fields {
    pub const STUDENT_ID: &str = "Student_Id";
    pub const COURSE_ID: &str = "Course_Id";
    pub const STATUS: &str = "Status";
    pub const MARKED_AT: &str = "Marked_at";
    pub const MARKED_BY: &str = "Marked_By";
    pub const SESSION_ID: &str = "Session_Id";
    pub const LATITUDE: &str = "Latitude";
    pub const LONGITUDE: &str = "Longitude";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Present,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceRecord {
    pub student_id: String,
    pub course_id: String,
    pub status: Status,
    /// Stamp in the deployment's marking offset.
    pub marked_at: DateTime<FixedOffset>,
    pub marked_by: String,
    pub session_id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl AttendanceRecord {
    pub fn to_data(&self) -> Value {
        json!({
            fields::STUDENT_ID: self.student_id,
            fields::COURSE_ID: self.course_id,
            fields::STATUS: self.status,
            fields::MARKED_AT: self.marked_at.to_rfc3339_opts(SecondsFormat::Secs, false),
            fields::MARKED_BY: self.marked_by,
            fields::SESSION_ID: self.session_id,
            fields::LATITUDE: self.latitude,
            fields::LONGITUDE: self.longitude,
        })
    }

    /// Decodes a document, resolving student and course relations whether
    /// they arrive as bare IDs or expanded documents.
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let student_id = doc
            .reference_field(fields::STUDENT_ID)
            .ok_or_else(|| missing(doc, fields::STUDENT_ID))?
            .to_string();
        let course_id = doc
            .reference_field(fields::COURSE_ID)
            .ok_or_else(|| missing(doc, fields::COURSE_ID))?
            .to_string();

        let status = match doc.str_field(fields::STATUS) {
            Some("Present") => Status::Present,
            Some(other) => {
                return Err(StoreError::Decode(format!(
                    "attendance record {}: unknown status {other:?}",
                    doc.id
                )));
            }
            None => return Err(missing(doc, fields::STATUS)),
        };

        let marked_at_raw = doc
            .str_field(fields::MARKED_AT)
            .ok_or_else(|| missing(doc, fields::MARKED_AT))?;
        let marked_at = DateTime::parse_from_rfc3339(marked_at_raw).map_err(|e| {
            StoreError::Decode(format!(
                "attendance record {}: bad timestamp {marked_at_raw:?}: {e}",
                doc.id
            ))
        })?;

        let marked_by = doc
            .str_field(fields::MARKED_BY)
            .ok_or_else(|| missing(doc, fields::MARKED_BY))?
            .to_string();
        let session_id = doc
            .str_field(fields::SESSION_ID)
            .ok_or_else(|| missing(doc, fields::SESSION_ID))?
            .to_string();

        Ok(Self {
            student_id,
            course_id,
            status,
            marked_at,
            marked_by,
            session_id,
            latitude: doc.f64_field(fields::LATITUDE),
            longitude: doc.f64_field(fields::LONGITUDE),
        })
    }

    /// Calendar day of the mark in the given offset.
    pub fn marked_on(&self, offset: FixedOffset) -> NaiveDate {
        self.marked_at.with_timezone(&offset).date_naive()
    }
}

/// Inclusive range predicates selecting records stamped within `[start, end]`.
pub fn marked_between(start: &str, end: &str) -> Vec<Query> {
    vec![
        Query::greater_than_equal(fields::MARKED_AT, json!(start)),
        Query::less_than_equal(fields::MARKED_AT, json!(end)),
    ]
}

fn missing(doc: &Document, field: &str) -> StoreError {
    StoreError::Decode(format!("attendance record {}: missing {field}", doc.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn offset() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
    }

    fn record() -> AttendanceRecord {
        AttendanceRecord {
            student_id: "stu-1".into(),
            course_id: "course-1".into(),
            status: Status::Present,
            marked_at: offset().with_ymd_and_hms(2025, 3, 14, 9, 21, 9).unwrap(),
            marked_by: "Asha Rao".into(),
            session_id: "sess-1".into(),
            latitude: Some(12.9716),
            longitude: Some(77.5946),
        }
    }

    #[test]
    fn data_carries_offset_timestamp_and_nullable_coords() {
        let mut r = record();
        r.latitude = None;
        r.longitude = None;
        let data = r.to_data();
        assert_eq!(data[fields::MARKED_AT], json!("2025-03-14T09:21:09+05:30"));
        assert_eq!(data[fields::STATUS], json!("Present"));
        assert!(data[fields::LATITUDE].is_null());
    }

    #[test]
    fn decodes_documents_written_by_this_client() {
        let doc = Document::new(
            "r1",
            record().to_data().as_object().cloned().unwrap(),
        );
        assert_eq!(AttendanceRecord::from_document(&doc).unwrap(), record());
    }

    #[test]
    fn decodes_expanded_relations_and_string_coords() {
        let doc = Document::new(
            "r2",
            json!({
                "Student_Id": { "$id": "stu-1" },
                "Course_Id": "course-1",
                "Status": "Present",
                "Marked_at": "2025-03-14T09:21:09+05:30",
                "Marked_By": "Asha Rao",
                "Session_Id": "sess-1",
                "Latitude": "12.9716",
                "Longitude": "77.5946"
            })
            .as_object()
            .cloned()
            .unwrap(),
        );
        let parsed = AttendanceRecord::from_document(&doc).unwrap();
        assert_eq!(parsed.student_id, "stu-1");
        assert_eq!(parsed.latitude, Some(12.9716));
    }

    #[test]
    fn marked_on_uses_the_given_offset() {
        // 01:30 at +05:30 on the 15th is still the 14th in UTC
        let r = AttendanceRecord {
            marked_at: offset().with_ymd_and_hms(2025, 3, 15, 1, 30, 0).unwrap(),
            ..record()
        };
        assert_eq!(
            r.marked_on(offset()),
            NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
        );
        assert_eq!(
            r.marked_on(FixedOffset::east_opt(0).unwrap()),
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
        );
    }
}
