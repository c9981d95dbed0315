//! Rotating QR publication for the session screen.
//!
//! The admin picks a course, the issuer snapshots the saved geofence, and a
//! background task publishes a fresh payload on every refresh tick. Each
//! payload expires `validity` after the tick that produced it, so the window
//! slides forward while the code is on screen. Dropping the handle stops the
//! task; a dismissed screen leaves nothing running.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::IssuerError;
use crate::geo::Coordinates;
use crate::qr::QrPayload;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerOptions {
    /// How long each payload stays valid.
    pub validity: Duration,
    /// How often a fresh payload is published.
    pub refresh_every: Duration,
    /// When set, payloads carry an HMAC tag under this secret.
    pub signing_secret: Option<String>,
}

impl IssuerOptions {
    pub fn from_env() -> Self {
        Self {
            validity: Duration::from_secs(common::config::qr_validity_seconds()),
            refresh_every: Duration::from_secs(common::config::qr_refresh_seconds()),
            signing_secret: common::config::qr_signing_secret(),
        }
    }
}

impl Default for IssuerOptions {
    fn default() -> Self {
        Self {
            validity: Duration::from_secs(600),
            refresh_every: Duration::from_secs(5),
            signing_secret: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QrIssuer {
    course_id: String,
    geofence: Option<Coordinates>,
    validity: chrono::Duration,
    refresh_every: Duration,
    signing_secret: Option<String>,
}

impl QrIssuer {
    /// `geofence` is the saved session location, or `None` when the admin
    /// has not configured one yet.
    pub fn new(
        course_id: impl Into<String>,
        geofence: Option<Coordinates>,
        options: IssuerOptions,
    ) -> Self {
        let validity = chrono::Duration::from_std(options.validity)
            .unwrap_or_else(|_| chrono::Duration::minutes(10));
        Self {
            course_id: course_id.into(),
            geofence,
            validity,
            refresh_every: options.refresh_every,
            signing_secret: options.signing_secret,
        }
    }

    /// The payload that would be shown at `now`, or the blank-state reason.
    pub fn payload_at(&self, now: DateTime<Utc>) -> Result<QrPayload, IssuerError> {
        if self.course_id.is_empty() {
            return Err(IssuerError::NoCourseSelected);
        }
        let geofence = self.geofence.ok_or(IssuerError::LocationNotConfigured)?;
        let payload = QrPayload::issue(&self.course_id, geofence, now, self.validity);
        Ok(match &self.signing_secret {
            Some(secret) => payload.sign(secret),
            None => payload,
        })
    }

    /// Validates the preconditions, publishes an initial payload, and spawns
    /// the refresh task. The task runs until the returned handle is dropped.
    pub fn spawn(self) -> Result<IssuerHandle, IssuerError> {
        let initial = self.payload_at(Utc::now())?;
        tracing::info!(course_id = %self.course_id, "starting QR publication");

        let refresh_every = self.refresh_every;
        let (tx, payloads) = watch::channel(initial);
        let task = tokio::spawn(async move {
            loop {
                tokio::time::sleep(refresh_every).await;
                let Ok(payload) = self.payload_at(Utc::now()) else {
                    break;
                };
                if tx.send(payload).is_err() {
                    break;
                }
            }
        });

        Ok(IssuerHandle {
            payloads,
            task,
        })
    }
}

/// Owner of the running refresh task. Dropping it cancels the publication.
#[derive(Debug)]
pub struct IssuerHandle {
    payloads: watch::Receiver<QrPayload>,
    task: JoinHandle<()>,
}

impl IssuerHandle {
    /// The most recently published payload.
    pub fn current(&self) -> QrPayload {
        self.payloads.borrow().clone()
    }

    /// A receiver that observes every subsequent publication.
    pub fn subscribe(&self) -> watch::Receiver<QrPayload> {
        self.payloads.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for IssuerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
