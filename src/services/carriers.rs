//! # Identity Verification

//! Checks a claimed business partner number against the carrier directory. The full directory is
//! fetched on every check; nothing is cached across calls.

use tracing::{info, warn};
use crate::config::Settings;
use crate::errors::{DockBookingError, DockBookingResult};
use crate::models::Carrier;
use crate::services::backend::{BackendClient, BackendRequest};

#[derive(Clone)]
pub struct CarrierDirectory {
    client: BackendClient,
    entity_path: String,
}

impl CarrierDirectory {
    pub fn new(settings: &Settings, client: BackendClient) -> Self {
        Self {
            client,
            entity_path: format!("{}/ZDOCK_SLOT_CARRIERSet", settings.backend.carrier_service_path),
        }
    }

    /// Fetches every registered carrier, partner ids trimmed
    pub async fn fetch(&self) -> DockBookingResult<Vec<Carrier>> {
        let request = BackendRequest::get(self.entity_path.as_str()).query("$format", "json");
        let envelope = self.client.request(request).await?;
        let carriers: Vec<Carrier> = envelope.records.iter().map(Carrier::from_record).collect();
        info!("Carrier directory holds {} entries", carriers.len());
        Ok(carriers)
    }

    /// Exact, case-sensitive membership check of `partner_id` in the directory.
    /// Blank ids are rejected without a network call.
    pub async fn check(&self, partner_id: &str) -> DockBookingResult<bool> {
        if partner_id.trim().is_empty() {
            return Err(DockBookingError::InvalidInput("partner id must not be empty".to_string()));
        }
        let carriers = self.fetch().await?;
        Ok(carriers.iter().any(|carrier| carrier.partner_id == partner_id))
    }

    /// Collapsed form of [`check`](Self::check): `false` both for unknown ids and for failed lookups
    pub async fn verify(&self, partner_id: &str) -> bool {
        match self.check(partner_id).await {
            Ok(known) => known,
            Err(e) => {
                warn!("Carrier verification for '{}' failed: {}", partner_id, e);
                false
            }
        }
    }
}
