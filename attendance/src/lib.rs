//! Attendance flows for a QR-based classroom app.
//!
//! The admin side publishes rotating QR codes for a session ([`issuer`]),
//! keeps a manual per-day ledger ([`ledger`]), manages the saved session
//! location ([`registry`]), and administers courses and students
//! ([`roster`]). The student side runs a scanned code through the validation
//! pipeline and commits a Present record ([`scan`]).
//!
//! Everything is generic over the [`store::DocumentStore`] and
//! [`store::Functions`] seams, so the flows run unchanged against the HTTP
//! backend or the in-memory fakes.

pub mod clock;
pub mod error;
pub mod geo;
pub mod issuer;
pub mod ledger;
pub mod qr;
pub mod registry;
pub mod roster;
pub mod scan;
pub mod session;

pub use clock::{DayBounds, MarkClock};
pub use error::{IssuerError, LedgerError, RegistryError, RosterError, ScanError};
pub use geo::{Coordinates, GeolocationProvider, PositionError, PositionOptions};
pub use issuer::{IssuerHandle, IssuerOptions, QrIssuer};
pub use ledger::AttendanceLedger;
pub use qr::QrPayload;
pub use registry::LocationRegistry;
pub use roster::RosterService;
pub use scan::{FrameOutcome, IgnoreReason, ScanOutcome, ScanPhase, ScanSession};
pub use session::{Role, StudentIdentity, UserSession};
