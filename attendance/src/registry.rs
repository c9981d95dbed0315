//! The saved session location, the geofence center QR payloads are issued
//! around.
//!
//! The collection holds at most one entry. Fetch remembers which document
//! backs it; save validates the coordinates and then updates in place or
//! creates the first entry. Reading the device position for the form is a
//! separate, non-persisting step.

use chrono::Utc;
use store::models::location::{self, SessionLocation};
use store::{DocumentStore, unique_id};
use validator::Validate;

use crate::error::RegistryError;
use crate::geo::{Coordinates, GeolocationProvider, PositionOptions};

#[derive(Debug, Validate)]
struct GeofenceInput {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    latitude: f64,
    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be between -180 and 180"
    ))]
    longitude: f64,
}

#[derive(Debug, Default)]
pub struct LocationRegistry {
    document_id: Option<String>,
}

impl LocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the saved location, if any, and remembers its document for
    /// subsequent saves.
    pub async fn fetch<S: DocumentStore>(
        &mut self,
        store: &S,
    ) -> Result<Option<SessionLocation>, RegistryError> {
        let list = store
            .list_documents(
                &common::config::database_id(),
                &location::collection_id(),
                &[],
            )
            .await
            .map_err(RegistryError::Backend)?;

        match list.documents.first() {
            Some(doc) => {
                self.document_id = Some(doc.id.clone());
                let saved = SessionLocation::from_document(doc)
                    .map_err(RegistryError::Backend)?;
                Ok(Some(saved))
            }
            None => {
                self.document_id = None;
                Ok(None)
            }
        }
    }

    /// Validates and persists new coordinates, stamping `updated_at` with
    /// the current instant. Updates the known document in place, or creates
    /// the registry's first entry.
    pub async fn save<S: DocumentStore>(
        &mut self,
        store: &S,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<SessionLocation, RegistryError> {
        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            return Err(RegistryError::MissingCoordinates);
        };
        let input = GeofenceInput {
            latitude,
            longitude,
        };
        input
            .validate()
            .map_err(|errors| RegistryError::InvalidCoordinates(common::format_validation_errors(&errors)))?;

        let saved = SessionLocation {
            latitude,
            longitude,
            updated_at: Utc::now(),
        };
        let database = common::config::database_id();
        let collection = location::collection_id();
        match &self.document_id {
            Some(id) => {
                store
                    .update_document(&database, &collection, id, saved.to_data())
                    .await
                    .map_err(RegistryError::Backend)?;
            }
            None => {
                let doc = store
                    .create_document(&database, &collection, &unique_id(), saved.to_data())
                    .await
                    .map_err(RegistryError::Backend)?;
                self.document_id = Some(doc.id);
            }
        }

        tracing::info!(latitude, longitude, "session location saved");
        Ok(saved)
    }

    /// Reads the device position to prefill the form. Single high-accuracy
    /// attempt after a permission check; nothing is persisted.
    pub async fn refresh_from_device<G: GeolocationProvider>(
        &self,
        provider: &G,
    ) -> Result<Coordinates, RegistryError> {
        provider.request_permission().await?;
        let coordinates = provider.current_position(PositionOptions::initial()).await?;
        Ok(coordinates)
    }
}
