//! Query predicates understood by the document backend.
//!
//! The backend accepts queries as JSON strings of the form
//! `{"method":"equal","attribute":"Email","values":["a@b.c"]}`. Only the
//! three operators the flows need are modelled: equality and the two
//! inclusive range bounds. [`Query::matches`] mirrors the backend's
//! evaluation semantics so the in-memory store filters identically.

use std::cmp::Ordering;

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryMethod {
    Equal,
    GreaterThanEqual,
    LessThanEqual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub method: QueryMethod,
    pub attribute: String,
    pub values: Vec<Value>,
}

impl Query {
    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            method: QueryMethod::Equal,
            attribute: attribute.into(),
            values: vec![value.into()],
        }
    }

    pub fn greater_than_equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            method: QueryMethod::GreaterThanEqual,
            attribute: attribute.into(),
            values: vec![value.into()],
        }
    }

    pub fn less_than_equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            method: QueryMethod::LessThanEqual,
            attribute: attribute.into(),
            values: vec![value.into()],
        }
    }

    /// The JSON string sent to the backend as a `queries[]` parameter.
    pub fn to_wire(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Evaluates this predicate against a document, the way the backend does.
    ///
    /// A missing attribute never matches. Equality accepts any of `values`;
    /// range operators compare against the first value only.
    pub fn matches(&self, doc: &Document) -> bool {
        let Some(actual) = doc.field(&self.attribute) else {
            return false;
        };

        match self.method {
            QueryMethod::Equal => self
                .values
                .iter()
                .any(|expected| values_equal(actual, expected)),
            QueryMethod::GreaterThanEqual => self
                .values
                .first()
                .and_then(|bound| compare_values(actual, bound))
                .is_some_and(|ord| ord != Ordering::Less),
            QueryMethod::LessThanEqual => self
                .values
                .first()
                .and_then(|bound| compare_values(actual, bound))
                .is_some_and(|ord| ord != Ordering::Greater),
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    compare_values(a, b) == Some(Ordering::Equal)
}

/// Orders two JSON values the way the backend's attribute comparison does:
/// timestamps as instants, numbers numerically (numeric strings included),
/// strings lexically.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (as_instant(a), as_instant(b)) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (as_number(a), as_number(b)) {
        return a.partial_cmp(&b);
    }
    match (a, b) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn as_instant(value: &Value) -> Option<i64> {
    let text = value.as_str()?;
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.timestamp())
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(data: Value) -> Document {
        Document::new("doc-1", data.as_object().cloned().unwrap_or_default())
    }

    #[test]
    fn wire_format_matches_backend_shape() {
        let q = Query::equal("Email", json!("a@b.c"));
        assert_eq!(
            q.to_wire(),
            r#"{"method":"equal","attribute":"Email","values":["a@b.c"]}"#
        );
    }

    #[test]
    fn equality_matches_exact_and_numeric_strings() {
        let d = doc(json!({ "ABC_ID": "12345", "Status": "Present" }));
        assert!(Query::equal("Status", json!("Present")).matches(&d));
        assert!(Query::equal("ABC_ID", json!(12345)).matches(&d));
        assert!(!Query::equal("Status", json!("Absent")).matches(&d));
    }

    #[test]
    fn missing_attribute_never_matches() {
        let d = doc(json!({ "Status": "Present" }));
        assert!(!Query::equal("Course_Id", json!("c1")).matches(&d));
        assert!(!Query::greater_than_equal("Marked_at", json!("2025-01-01T00:00:00Z")).matches(&d));
    }

    #[test]
    fn range_bounds_compare_timestamps_across_offsets() {
        // 09:30 at +05:30 is 04:00 UTC, inside the UTC day window
        let d = doc(json!({ "Marked_at": "2025-03-14T09:30:00+05:30" }));
        let lower = Query::greater_than_equal("Marked_at", json!("2025-03-14T00:00:00Z"));
        let upper = Query::less_than_equal("Marked_at", json!("2025-03-14T23:59:59Z"));
        assert!(lower.matches(&d));
        assert!(upper.matches(&d));

        let before = doc(json!({ "Marked_at": "2025-03-13T23:59:59Z" }));
        assert!(!lower.matches(&before));
    }

    #[test]
    fn range_bounds_compare_numbers() {
        let d = doc(json!({ "Semester": 4 }));
        assert!(Query::greater_than_equal("Semester", json!(4)).matches(&d));
        assert!(Query::less_than_equal("Semester", json!(4)).matches(&d));
        assert!(!Query::greater_than_equal("Semester", json!(5)).matches(&d));
    }
}
