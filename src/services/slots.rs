//! # Slot Lookup

//! Queries the docking slots of one day and normalizes them into [`DockSlot`]s.

use tracing::info;
use crate::config::Settings;
use crate::errors::{DockBookingError, DockBookingResult};
use crate::models::DockSlot;
use crate::services::backend::{BackendClient, BackendRequest};

/// Checks that a date is exactly eight ASCII digits (DDMMYYYY)
pub fn validate_date(date: &str) -> DockBookingResult<()> {
    if date.len() == 8 && date.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(DockBookingError::InvalidDate(date.to_string()))
    }
}

/// The filtered slot listing for one date; shared with the token fetch
pub(crate) fn slot_query(entity_path: &str, date: &str) -> BackendRequest {
    BackendRequest::get(entity_path)
        .query("$filter", format!("CurrDate eq '{}'", date))
        .query("$format", "json")
}

#[derive(Clone)]
pub struct SlotLookupService {
    client: BackendClient,
    entity_path: String,
}

impl SlotLookupService {
    pub fn new(settings: &Settings, client: BackendClient) -> Self {
        Self {
            client,
            entity_path: format!("{}/ZDOCK_SLOT_TIMESet", settings.backend.slot_service_path),
        }
    }

    /// Lists the slots of `date` (DDMMYYYY) in backend order.
    ///
    /// Invalid dates fail with `InvalidDate` before any network call. Any transport, status or
    /// parse fault fails the whole lookup; there are no partial results. An empty `Ok` means the
    /// backend has no slots on that date.
    pub async fn list_slots(&self, date: &str) -> DockBookingResult<Vec<DockSlot>> {
        validate_date(date)?;

        let envelope = self.client.request(slot_query(&self.entity_path, date)).await?;
        let slots = envelope
            .records
            .iter()
            .map(DockSlot::from_record)
            .collect::<DockBookingResult<Vec<_>>>()?;

        info!("Found {} slot(s) for {}", slots.len(), date);
        Ok(slots)
    }
}
