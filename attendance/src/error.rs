use chrono::NaiveDate;
use store::StoreError;

use crate::geo::PositionError;

/// Why a scanned frame was turned away. The display strings are the exact
/// texts shown to the student, so hosts can surface them verbatim.
///
/// A duplicate mark is deliberately not in here. Scanning twice on the same
/// day is a normal outcome, not a failure, and is reported through
/// [`crate::scan::ScanOutcome::AlreadyMarked`].
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Invalid QR code format.")]
    MalformedPayload,
    #[error("Invalid or incomplete QR code.")]
    IncompletePayload,
    #[error("You are not enrolled in this course.")]
    NotEnrolled,
    #[error("This QR code has expired.")]
    Expired,
    #[error("You are not within {0:.0} meters of the session location.")]
    OutOfRange(f64),
    #[error("Location data is missing. Unable to verify proximity.")]
    LocationUnavailable,
    #[error("Failed to mark attendance. Please try again.")]
    Backend(#[source] StoreError),
}

impl From<PositionError> for ScanError {
    fn from(_: PositionError) -> Self {
        ScanError::LocationUnavailable
    }
}

/// Why the issuer cannot put a code on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IssuerError {
    #[error("Please set location in Home screen to generate QR code...")]
    LocationNotConfigured,
    #[error("no course selected")]
    NoCourseSelected,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("attendance for {0} is in the past and can no longer be edited")]
    PastDayLocked(NaiveDate),
    #[error("Failed to save attendance records.")]
    Backend(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Please enter or fetch location coordinates.")]
    MissingCoordinates,
    #[error("{0}")]
    InvalidCoordinates(String),
    #[error("Failed to update location.")]
    Backend(#[source] StoreError),
    #[error(transparent)]
    Position(#[from] PositionError),
}

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("A student with this email, ABC ID, and course already exists.")]
    DuplicateStudent,
    #[error("This course with the same duration already exists.")]
    DuplicateCourse,
    #[error(transparent)]
    Store(#[from] StoreError),
}
