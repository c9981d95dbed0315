//! The student-side scan session: a single-slot state machine that takes one
//! camera frame through the validation pipeline and into a committed record.
//!
//! One session handles one frame at a time. `handle_frame` takes `&mut self`,
//! so a second frame cannot enter while a pipeline is in flight, and after a
//! terminal outcome every further frame is ignored until [`ScanSession::reset`].
//! That single slot is also the scan debounce; there is no timer behind it.

use chrono::Utc;
use store::models::attendance::{self, AttendanceRecord, Status};
use store::{DocumentStore, Query, unique_id};

use crate::clock::MarkClock;
use crate::error::ScanError;
use crate::geo::{self, Coordinates, GeolocationProvider, PositionError};
use crate::qr::QrPayload;
use crate::session::StudentIdentity;

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// Ready for a frame.
    Idle,
    /// A frame has been accepted and is being decoded.
    Captured,
    /// The pipeline is checking the decoded payload.
    Validating,
    /// A record was written; the session is done.
    Committed,
    /// Attendance already existed for today; the session is done.
    AlreadyMarked,
    /// The frame was turned away; the host decides when to rescan.
    Rejected,
}

impl ScanPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ScanPhase::Committed | ScanPhase::AlreadyMarked | ScanPhase::Rejected
        )
    }
}

/// What became of one offered frame.
#[derive(Debug)]
pub enum FrameOutcome {
    /// The frame was not processed at all.
    Ignored(IgnoreReason),
    /// The device position is not resolved yet; the frame was dropped
    /// without judging it. Not a rejection.
    AwaitingLocation,
    /// The pipeline ran to a terminal state.
    Finished(ScanOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The scanner is blurred or deactivated.
    Inactive,
    /// A previous frame already reached a terminal state.
    AlreadyHandled,
}

#[derive(Debug)]
pub enum ScanOutcome {
    Committed(AttendanceRecord),
    AlreadyMarked,
    Rejected(ScanError),
}

impl ScanOutcome {
    /// The text a host shows for this outcome.
    pub fn message(&self) -> String {
        match self {
            ScanOutcome::Committed(_) => "Attendance marked successfully!".into(),
            ScanOutcome::AlreadyMarked => {
                "You have already marked attendance for this course today.".into()
            }
            ScanOutcome::Rejected(error) => error.to_string(),
        }
    }
}

pub struct ScanSession {
    student: StudentIdentity,
    clock: MarkClock,
    radius_meters: f64,
    signing_secret: Option<String>,
    active: bool,
    phase: ScanPhase,
    location: Option<Coordinates>,
}

impl ScanSession {
    /// A fresh, active session for `student`. Geofence radius, marking
    /// offset, and the optional signing secret come from the configuration.
    pub fn new(student: StudentIdentity) -> Self {
        Self::new_with_settings(
            student,
            MarkClock::from_env(),
            common::config::geofence_radius_meters(),
            common::config::qr_signing_secret(),
        )
    }

    /// Like [`ScanSession::new`] with every knob explicit.
    pub fn new_with_settings(
        student: StudentIdentity,
        clock: MarkClock,
        radius_meters: f64,
        signing_secret: Option<String>,
    ) -> Self {
        Self {
            student,
            clock,
            radius_meters,
            signing_secret,
            active: true,
            phase: ScanPhase::Idle,
            location: None,
        }
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The resolved device position, once [`ScanSession::resolve_location`]
    /// has succeeded.
    pub fn location(&self) -> Option<Coordinates> {
        self.location
    }

    /// Screen gained focus: reactivate and start over, including a fresh
    /// location fix.
    pub fn focus(&mut self) {
        self.active = true;
        self.reset();
    }

    /// Screen lost focus: stop accepting frames. State is otherwise kept.
    pub fn blur(&mut self) {
        self.active = false;
    }

    /// Back to [`ScanPhase::Idle`]. Clears the resolved position, so the
    /// location guard holds again until the next fix.
    pub fn reset(&mut self) {
        self.phase = ScanPhase::Idle;
        self.location = None;
    }

    /// Resolves the device position through the bounded retry ladder and
    /// arms the proximity check. Until this succeeds, frames come back as
    /// [`FrameOutcome::AwaitingLocation`].
    pub async fn resolve_location<G: GeolocationProvider>(
        &mut self,
        provider: &G,
    ) -> Result<Coordinates, PositionError> {
        let coordinates = geo::resolve_position(provider).await?;
        tracing::debug!(
            latitude = coordinates.latitude,
            longitude = coordinates.longitude,
            "device position resolved"
        );
        self.location = Some(coordinates);
        Ok(coordinates)
    }

    /// Runs one scanned frame through the pipeline.
    ///
    /// Ordered checks: parse, completeness, signature (when configured),
    /// enrollment, expiry, duplicate, proximity, then the commit. The first
    /// failure wins; a duplicate is reported as
    /// [`ScanOutcome::AlreadyMarked`], not as an error.
    pub async fn handle_frame<S: DocumentStore>(&mut self, store: &S, raw: &str) -> FrameOutcome {
        if !self.active {
            return FrameOutcome::Ignored(IgnoreReason::Inactive);
        }
        if self.phase != ScanPhase::Idle {
            return FrameOutcome::Ignored(IgnoreReason::AlreadyHandled);
        }
        let Some(device) = self.location else {
            tracing::debug!("frame dropped, device position not resolved yet");
            return FrameOutcome::AwaitingLocation;
        };

        self.phase = ScanPhase::Captured;
        let outcome = self.run_pipeline(store, raw, device).await;
        self.phase = match &outcome {
            ScanOutcome::Committed(_) => ScanPhase::Committed,
            ScanOutcome::AlreadyMarked => ScanPhase::AlreadyMarked,
            ScanOutcome::Rejected(error) => {
                tracing::info!(%error, "scan rejected");
                ScanPhase::Rejected
            }
        };
        FrameOutcome::Finished(outcome)
    }

    async fn run_pipeline<S: DocumentStore>(
        &mut self,
        store: &S,
        raw: &str,
        device: Coordinates,
    ) -> ScanOutcome {
        let payload = match QrPayload::parse(raw) {
            Ok(payload) => payload,
            Err(error) => return ScanOutcome::Rejected(error),
        };
        self.phase = ScanPhase::Validating;

        if let Some(secret) = &self.signing_secret {
            if !payload.verify_signature(secret) {
                return ScanOutcome::Rejected(ScanError::MalformedPayload);
            }
        }

        if payload.course_id != self.student.course_id {
            return ScanOutcome::Rejected(ScanError::NotEnrolled);
        }

        if payload.is_expired(Utc::now()) {
            return ScanOutcome::Rejected(ScanError::Expired);
        }

        match self.already_marked_today(store, &payload.course_id).await {
            Ok(true) => return ScanOutcome::AlreadyMarked,
            Ok(false) => {}
            Err(error) => return ScanOutcome::Rejected(ScanError::Backend(error)),
        }

        let distance = geo::distance_meters(device, payload.geofence());
        if distance > self.radius_meters {
            tracing::info!(
                distance_m = distance.round(),
                radius_m = self.radius_meters,
                "scan outside the session geofence"
            );
            return ScanOutcome::Rejected(ScanError::OutOfRange(self.radius_meters));
        }

        self.commit(store, &payload, device).await
    }

    async fn already_marked_today<S: DocumentStore>(
        &self,
        store: &S,
        course_id: &str,
    ) -> Result<bool, store::StoreError> {
        let bounds = self.clock.day_bounds(self.clock.today());
        let queries = [
            Query::equal(attendance::fields::STUDENT_ID, self.student.student_id.as_str()),
            Query::equal(attendance::fields::COURSE_ID, course_id),
            Query::equal(attendance::fields::STATUS, "Present"),
            Query::greater_than_equal(attendance::fields::MARKED_AT, bounds.start),
            Query::less_than_equal(attendance::fields::MARKED_AT, bounds.end),
        ];
        let existing = store
            .list_documents(
                &common::config::database_id(),
                &attendance::collection_id(),
                &queries,
            )
            .await?;
        Ok(existing.total > 0)
    }

    // The backend cannot enforce uniqueness over (student, course, day); a
    // record created elsewhere between this check and the create slips
    // through. The single-slot session only keeps one device from racing
    // itself.
    async fn commit<S: DocumentStore>(
        &self,
        store: &S,
        payload: &QrPayload,
        device: Coordinates,
    ) -> ScanOutcome {
        let record = AttendanceRecord {
            student_id: self.student.student_id.clone(),
            course_id: payload.course_id.clone(),
            status: Status::Present,
            marked_at: self.clock.now(),
            marked_by: self.student.name.clone(),
            session_id: unique_id(),
            latitude: Some(device.latitude),
            longitude: Some(device.longitude),
        };

        let created = store
            .create_document(
                &common::config::database_id(),
                &attendance::collection_id(),
                &unique_id(),
                record.to_data(),
            )
            .await;

        match created {
            Ok(_) => {
                tracing::info!(
                    student_id = %record.student_id,
                    course_id = %record.course_id,
                    session_id = %record.session_id,
                    "attendance committed"
                );
                ScanOutcome::Committed(record)
            }
            Err(error) => {
                tracing::error!(%error, "failed to write attendance record");
                ScanOutcome::Rejected(ScanError::Backend(error))
            }
        }
    }
}
