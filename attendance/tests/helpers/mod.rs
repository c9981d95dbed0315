#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use attendance::clock::MarkClock;
use attendance::geo::{Coordinates, GeolocationProvider, PositionError, PositionOptions};
use attendance::session::{Role, StudentIdentity, UserSession};
use chrono::{DateTime, FixedOffset};
use store::models::attendance::{AttendanceRecord, Status};
use store::{DocumentStore, MemoryStore, unique_id};

pub const COURSE_ID: &str = "course-1";
pub const OTHER_COURSE_ID: &str = "course-2";

/// Geofence center used across the suites.
pub fn session_location() -> Coordinates {
    Coordinates::new(12.9716, 77.5946)
}

/// A point roughly 550 m north of [`session_location`].
pub fn far_away() -> Coordinates {
    Coordinates::new(12.9766, 77.5946)
}

/// The marking clock every suite runs on, UTC+05:30 like the default config.
pub fn ist_clock() -> MarkClock {
    MarkClock::with_offset_minutes(330)
}

pub fn enrolled_student() -> StudentIdentity {
    StudentIdentity::new("stu-1", "Asha Verma", COURSE_ID)
}

pub fn admin_session() -> UserSession {
    UserSession::new("admin-1", "Dr. Rao", Role::Admin)
}

pub fn attendance_collection() -> (String, String) {
    (
        common::config::database_id(),
        store::models::attendance::collection_id(),
    )
}

/// A Present record ready for seeding.
pub fn present_record(
    student_id: &str,
    course_id: &str,
    marked_at: DateTime<FixedOffset>,
) -> AttendanceRecord {
    AttendanceRecord {
        student_id: student_id.to_string(),
        course_id: course_id.to_string(),
        status: Status::Present,
        marked_at,
        marked_by: "Seeder".to_string(),
        session_id: unique_id(),
        latitude: None,
        longitude: None,
    }
}

/// Writes an attendance record straight into the store, returning its
/// document ID.
pub async fn seed_attendance(store: &MemoryStore, record: &AttendanceRecord) -> String {
    let (database, collection) = attendance_collection();
    let id = unique_id();
    store
        .create_document(&database, &collection, &id, record.to_data())
        .await
        .expect("seed attendance record");
    id
}

pub async fn attendance_count(store: &MemoryStore) -> u64 {
    let (database, collection) = attendance_collection();
    store
        .list_documents(&database, &collection, &[])
        .await
        .expect("list attendance records")
        .total
}

/// Scripted device position source. Fixes are served front to back; an
/// exhausted script answers [`PositionError::Unavailable`].
#[derive(Default)]
pub struct ScriptedGeolocation {
    fixes: Mutex<VecDeque<Result<Coordinates, PositionError>>>,
    deny_permission: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedGeolocation {
    pub fn with_fix(coordinates: Coordinates) -> Self {
        let scripted = Self::default();
        scripted.push(Ok(coordinates));
        scripted
    }

    pub fn push(&self, response: Result<Coordinates, PositionError>) {
        self.fixes.lock().unwrap().push_back(response);
    }

    pub fn deny_permission(&self) {
        self.deny_permission.store(true, Ordering::SeqCst);
    }

    /// How many position reads have been attempted.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GeolocationProvider for ScriptedGeolocation {
    async fn current_position(
        &self,
        _options: PositionOptions,
    ) -> Result<Coordinates, PositionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.fixes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(PositionError::Unavailable))
    }

    async fn request_permission(&self) -> Result<(), PositionError> {
        if self.deny_permission.load(Ordering::SeqCst) {
            return Err(PositionError::PermissionDenied);
        }
        Ok(())
    }
}
