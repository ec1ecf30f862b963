//! # Appointment Booking

//! Books a dock appointment as one logical operation:
//!
//! 1. Acquire a fresh session (CSRF token + cookie)
//! 2. POST the appointment to the creation endpoint with that session
//! 3. Read the appointment key from the creation response
//! 4. Resolve the human-readable document number by a second GET
//!
//! The sequence is linear: no step is retried and nothing is compensated. Steps 2 and 4 share no
//! transaction, so a failure in step 4 leaves a created appointment behind; the resulting
//! `ResolutionFailed` fault carries its key for manual reconciliation.

use std::time::Instant;
use tracing::{error, info};
use crate::config::Settings;
use crate::errors::{DockBookingError, DockBookingResult};
use crate::models::{AppointmentKey, AppointmentRequest, DocumentNumber, SessionCredential};
use crate::services::backend::{BackendClient, BackendRequest};
use crate::services::session::SessionNegotiator;

#[derive(Clone)]
pub struct AppointmentBookingService {
    client: BackendClient,
    negotiator: SessionNegotiator,
    appointment_entity_path: String,
    reference_date: String,
    transport_mode: String,
}

impl AppointmentBookingService {
    pub fn new(settings: &Settings, client: BackendClient, negotiator: SessionNegotiator) -> Self {
        Self {
            client,
            negotiator,
            appointment_entity_path: format!("{}/AppointmentSet", settings.backend.appointment_service_path),
            reference_date: settings.booking.reference_date.clone(),
            transport_mode: settings.booking.transport_mode.clone(),
        }
    }

    /// Books a truck appointment and returns its document number.
    ///
    /// Every call creates a new appointment attempt; identical arguments are not deduplicated.
    ///
    /// # Arguments
    ///
    /// * `loadpoint`: The dock the truck is booked on
    /// * `carrier`: The carrier's business partner number
    /// * `requested_start`: ISO-8601 UTC on a full hour, e.g. `2025-06-23T09:00:00Z`
    ///
    /// # Returns
    ///
    /// * `Ok(DocumentNumber)`: The reference of the created appointment
    /// * `Err(DockBookingError::InvalidInput)`: If the arguments were rejected before any network call
    /// * `Err(DockBookingError::SessionUnavailable)`: If no token/cookie pair could be obtained
    /// * `Err(DockBookingError::CreationFailed)`: If the POST failed or was refused; resolution is not attempted
    /// * `Err(DockBookingError::MalformedResponse)`: If the creation response carries no appointment key
    /// * `Err(DockBookingError::ResolutionFailed)`: If the appointment exists but its document number could not be read
    pub async fn book(&self, loadpoint: &str, carrier: &str, requested_start: &str) -> DockBookingResult<DocumentNumber> {
        let start = Instant::now();
        let request = AppointmentRequest::new(loadpoint, carrier, requested_start, &self.transport_mode)?;
        info!(
            "Booking appointment for carrier {} at loadpoint {} starting {}",
            request.carrier, request.loadpoint, request.requested_start
        );

        let credential = self.negotiator
            .acquire_session(&self.reference_date)
            .await
            .map_err(|e| DockBookingError::SessionUnavailable(Box::new(e)))?;

        let appointment_key = self.submit_creation(&request, credential).await?;
        info!("Appointment {} created", appointment_key);

        let document_number = self.resolve_document_number(&appointment_key).await?;
        info!(
            "Appointment {} booked as document {} in {:?}",
            appointment_key, document_number, start.elapsed()
        );
        Ok(document_number)
    }

    /// Posts the appointment, consuming the session credential
    async fn submit_creation(&self, request: &AppointmentRequest, credential: SessionCredential) -> DockBookingResult<AppointmentKey> {
        let body = serde_json::to_value(request)?;
        let post = BackendRequest::post(self.appointment_entity_path.as_str(), body)
            .headers(credential.into_headers());

        let envelope = self.client.request(post).await.map_err(|e| match e {
            DockBookingError::Parse(message) => DockBookingError::MalformedResponse(message),
            other => DockBookingError::CreationFailed(Box::new(other)),
        })?;

        let key = envelope
            .single()
            .and_then(|record| record.require_text("AppointmentKey"))
            .map_err(|e| DockBookingError::MalformedResponse(e.to_string()))?;
        parse_appointment_key(&key)
    }

    /// Reads the document number of a created appointment. Uses basic auth only; no session is needed.
    async fn resolve_document_number(&self, key: &AppointmentKey) -> DockBookingResult<DocumentNumber> {
        let lookup = BackendRequest::get(format!("{}(guid'{}')", self.appointment_entity_path, key));

        let resolved = self.client
            .request(lookup)
            .await
            .and_then(|envelope| {
                let docno = envelope.single()?.require_text("Docno")?;
                let docno = docno.trim();
                if docno.is_empty() {
                    return Err(DockBookingError::Parse("property 'Docno' is empty".to_string()));
                }
                Ok(DocumentNumber(docno.to_string()))
            });

        resolved.map_err(|e| {
            error!("Appointment {} was created but its document number could not be resolved: {}", key, e);
            DockBookingError::ResolutionFailed {
                appointment_key: key.to_string(),
                source: Box::new(e),
            }
        })
    }
}

/// Accepts GUID-like keys only (ASCII letters, digits and dashes), since the key is spliced into the lookup path
fn parse_appointment_key(raw: &str) -> DockBookingResult<AppointmentKey> {
    let key = raw.trim();
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(DockBookingError::MalformedResponse(format!("'{}' is not an appointment key", key)));
    }
    Ok(AppointmentKey(key.to_string()))
}
