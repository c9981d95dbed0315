//! The QR wire payload: a small JSON object rendered into the code image.
//!
//! ```json
//! {"expiresAt":"2025-03-14T04:10:00.000Z","courseId":"67c1...","latitude":12.9716,"longitude":77.5946}
//! ```
//!
//! `sig` is an optional HMAC-SHA256 tag over the other four fields. It is
//! only produced and checked when a signing secret is configured; unsigned
//! deployments emit and accept the plain four-field object.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;

use crate::error::ScanError;
use crate::geo::Coordinates;

type HmacSha256 = Hmac<Sha256>;

const REQUIRED_FIELDS: [&str; 4] = ["expiresAt", "courseId", "latitude", "longitude"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrPayload {
    /// Kept as the raw wire string; an unparseable value is handled as
    /// "expired", not as a malformed payload.
    #[serde(rename = "expiresAt")]
    pub expires_at: String,
    #[serde(rename = "courseId")]
    pub course_id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
}

impl QrPayload {
    /// Builds a payload expiring `validity` from `now`. Unsigned; see
    /// [`QrPayload::sign`].
    pub fn issue(
        course_id: impl Into<String>,
        geofence: Coordinates,
        now: DateTime<Utc>,
        validity: Duration,
    ) -> Self {
        Self {
            expires_at: (now + validity).to_rfc3339_opts(SecondsFormat::Millis, true),
            course_id: course_id.into(),
            latitude: geofence.latitude,
            longitude: geofence.longitude,
            sig: None,
        }
    }

    /// Decodes a scanned frame.
    ///
    /// Classification mirrors the scan pipeline's first two steps: text that
    /// is not JSON is [`ScanError::MalformedPayload`]; JSON missing any of
    /// the four required fields (or carrying them with the wrong type) is
    /// [`ScanError::IncompletePayload`].
    pub fn parse(raw: &str) -> Result<Self, ScanError> {
        let value: Value = serde_json::from_str(raw).map_err(|_| ScanError::MalformedPayload)?;
        let object = value.as_object().ok_or(ScanError::IncompletePayload)?;
        for field in REQUIRED_FIELDS {
            match object.get(field) {
                None | Some(Value::Null) => return Err(ScanError::IncompletePayload),
                Some(_) => {}
            }
        }
        serde_json::from_value(value).map_err(|_| ScanError::IncompletePayload)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// The expiry instant, if `expiresAt` holds a valid timestamp.
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.expires_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// A payload whose expiry cannot be parsed counts as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry() {
            Some(expiry) => now > expiry,
            None => true,
        }
    }

    /// The session geofence center encoded by the issuer.
    pub fn geofence(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Attaches the HMAC tag for `secret`.
    pub fn sign(mut self, secret: &str) -> Self {
        self.sig = Some(self.signature(secret));
        self
    }

    /// Checks the HMAC tag against `secret`. False when the tag is missing,
    /// not hex, or does not match.
    pub fn verify_signature(&self, secret: &str) -> bool {
        let Some(sig) = &self.sig else {
            return false;
        };
        let Ok(tag) = hex::decode(sig) else {
            return false;
        };
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC key");
        mac.update(self.signing_input().as_bytes());
        mac.verify_slice(&tag).is_ok()
    }

    fn signature(&self, secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC key");
        mac.update(self.signing_input().as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn signing_input(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.expires_at, self.course_id, self.latitude, self.longitude
        )
    }
}

/// A fresh random signing secret, hex encoded.
pub fn generate_secret() -> String {
    use rand::RngCore;

    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QrPayload {
        QrPayload::issue(
            "course-1",
            Coordinates::new(12.9716, 77.5946),
            "2025-03-14T04:00:00Z".parse().unwrap(),
            Duration::minutes(10),
        )
    }

    #[test]
    fn issue_sets_expiry_and_wire_names() {
        let payload = sample();
        assert_eq!(payload.expires_at, "2025-03-14T04:10:00.000Z");

        let json = payload.to_json();
        assert!(json.contains("\"expiresAt\":\"2025-03-14T04:10:00.000Z\""));
        assert!(json.contains("\"courseId\":\"course-1\""));
        assert!(json.contains("\"latitude\":12.9716"));
        assert!(!json.contains("sig"), "unsigned payloads omit the tag");
    }

    #[test]
    fn parse_round_trips() {
        let payload = sample();
        let parsed = QrPayload::parse(&payload.to_json()).unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            QrPayload::parse("not json at all"),
            Err(ScanError::MalformedPayload)
        ));
        assert!(matches!(
            QrPayload::parse("{\"expiresAt\":"),
            Err(ScanError::MalformedPayload)
        ));
    }

    #[test]
    fn missing_fields_are_incomplete() {
        assert!(matches!(
            QrPayload::parse("{\"expiresAt\":\"2025-03-14T04:10:00Z\",\"courseId\":\"c\"}"),
            Err(ScanError::IncompletePayload)
        ));
        assert!(matches!(
            QrPayload::parse("{\"expiresAt\":null,\"courseId\":\"c\",\"latitude\":1,\"longitude\":2}"),
            Err(ScanError::IncompletePayload)
        ));
        // Valid JSON that is not an object has no fields at all.
        assert!(matches!(
            QrPayload::parse("42"),
            Err(ScanError::IncompletePayload)
        ));
    }

    #[test]
    fn wrong_field_types_are_incomplete() {
        let raw = "{\"expiresAt\":\"2025-03-14T04:10:00Z\",\"courseId\":\"c\",\"latitude\":\"north\",\"longitude\":2}";
        assert!(matches!(
            QrPayload::parse(raw),
            Err(ScanError::IncompletePayload)
        ));
    }

    #[test]
    fn expiry_is_checked_against_now() {
        let payload = sample();
        let before: DateTime<Utc> = "2025-03-14T04:09:59Z".parse().unwrap();
        let at: DateTime<Utc> = "2025-03-14T04:10:00Z".parse().unwrap();
        let after: DateTime<Utc> = "2025-03-14T04:10:01Z".parse().unwrap();

        assert!(!payload.is_expired(before));
        assert!(!payload.is_expired(at), "expiry instant itself still counts");
        assert!(payload.is_expired(after));
    }

    #[test]
    fn unparseable_expiry_counts_as_expired() {
        let mut payload = sample();
        payload.expires_at = "sometime tomorrow".into();
        assert!(payload.is_expired(Utc::now()));
    }

    #[test]
    fn signature_round_trips() {
        let secret = generate_secret();
        let signed = sample().sign(&secret);
        assert!(signed.verify_signature(&secret));

        let parsed = QrPayload::parse(&signed.to_json()).unwrap();
        assert!(parsed.verify_signature(&secret));
    }

    #[test]
    fn tampering_breaks_the_signature() {
        let secret = "shared-secret";
        let mut signed = sample().sign(secret);
        signed.course_id = "another-course".into();
        assert!(!signed.verify_signature(secret));
    }

    #[test]
    fn missing_or_bogus_tags_fail_verification() {
        let payload = sample();
        assert!(!payload.verify_signature("shared-secret"));

        let mut forged = sample();
        forged.sig = Some("zz-not-hex".into());
        assert!(!forged.verify_signature("shared-secret"));

        let other = sample().sign("other-secret");
        assert!(!other.verify_signature("shared-secret"));
    }

    #[test]
    fn generated_secrets_are_distinct() {
        assert_ne!(generate_secret(), generate_secret());
        assert_eq!(generate_secret().len(), 64);
    }
}
