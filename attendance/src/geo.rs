//! Coordinates, great-circle distance, and the device position contract.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for the haversine distance, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Timed-out fixes are retried this many times with degraded accuracy.
pub const MAX_TIMEOUT_RETRIES: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Haversine distance between two points, in meters.
pub fn distance_meters(a: Coordinates, b: Coordinates) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let delta_phi = (b.latitude - a.latitude).to_radians();
    let delta_lambda = (b.longitude - a.longitude).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// How hard to try for a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    pub max_age: Duration,
}

impl PositionOptions {
    /// First attempt: GPS-grade fix with a generous timeout.
    pub fn initial() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(15),
            max_age: Duration::from_secs(10),
        }
    }

    /// Retry after a timeout: settle for a coarser, faster fix.
    pub fn degraded() -> Self {
        Self {
            high_accuracy: false,
            timeout: Duration::from_secs(10),
            max_age: Duration::from_secs(10),
        }
    }
}

/// Position failures, numbered like the platform geolocation callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("Please enable location services to proceed with attendance marking.")]
    ServicesDisabled,
    #[error("timed out waiting for a location fix")]
    Timeout,
    #[error("Failed to fetch location. Please try again.")]
    Unavailable,
}

impl PositionError {
    /// Maps a platform error code. Unknown codes collapse to [`Unavailable`].
    ///
    /// [`Unavailable`]: PositionError::Unavailable
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => PositionError::PermissionDenied,
            2 => PositionError::ServicesDisabled,
            3 => PositionError::Timeout,
            _ => PositionError::Unavailable,
        }
    }
}

/// Source of device fixes. Hosts wrap whatever the platform offers; tests
/// script one.
pub trait GeolocationProvider: Send + Sync {
    fn current_position(
        &self,
        options: PositionOptions,
    ) -> impl Future<Output = Result<Coordinates, PositionError>> + Send;

    /// Prompts for location permission where the platform has one. The
    /// default assumes permission is already granted.
    fn request_permission(&self) -> impl Future<Output = Result<(), PositionError>> + Send {
        async { Ok(()) }
    }
}

/// Resolves the device position with the bounded retry ladder: one
/// high-accuracy attempt, then up to [`MAX_TIMEOUT_RETRIES`] degraded retries
/// after timeouts. Disabled services and permission failures end the ladder
/// immediately.
pub async fn resolve_position<G: GeolocationProvider>(
    provider: &G,
) -> Result<Coordinates, PositionError> {
    let mut options = PositionOptions::initial();
    let mut attempt = 0;
    loop {
        match provider.current_position(options).await {
            Ok(coordinates) => return Ok(coordinates),
            Err(PositionError::Timeout) if attempt < MAX_TIMEOUT_RETRIES => {
                attempt += 1;
                tracing::warn!(
                    attempt,
                    max = MAX_TIMEOUT_RETRIES,
                    "location fix timed out, retrying with degraded accuracy"
                );
                options = PositionOptions::degraded();
            }
            Err(error) => {
                tracing::warn!(%error, "failed to resolve device position");
                return Err(error);
            }
        }
    }
}
