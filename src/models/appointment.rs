//! # Appointment Data Structures

//! This module defines the request sent to create a dock appointment and the references handed
//! back once it exists: the backend's internal appointment key and the human-readable document number.

use chrono::{DateTime, Timelike, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use crate::errors::{DockBookingError, DockBookingResult};

/// Body of the appointment creation POST. Constructed by the caller, consumed once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentRequest {
    #[serde(rename = "Loadpoint")]
    pub loadpoint: String,
    #[serde(rename = "Carrier")]
    pub carrier: String,
    /// Means of transport (`TRCK`)
    #[serde(rename = "Mtr")]
    pub mode: String,
    /// ISO-8601 UTC, truncated to the hour (`YYYY-MM-DDTHH:00:00Z`)
    #[serde(rename = "ReqStartTime")]
    pub requested_start: String,
}

impl AppointmentRequest {
    /// Validates the caller's arguments before anything touches the network.
    ///
    /// # Errors
    ///
    /// * `InvalidInput` when loadpoint or carrier is blank, or when `requested_start` is not an
    ///   RFC 3339 UTC timestamp (`Z` suffix) on a full hour
    pub fn new(loadpoint: &str, carrier: &str, requested_start: &str, mode: &str) -> DockBookingResult<Self> {
        let loadpoint = loadpoint.trim();
        let carrier = carrier.trim();
        if loadpoint.is_empty() {
            return Err(DockBookingError::InvalidInput("loadpoint must not be empty".to_string()));
        }
        if carrier.is_empty() {
            return Err(DockBookingError::InvalidInput("carrier must not be empty".to_string()));
        }
        let requested_start = normalize_requested_start(requested_start)?;

        Ok(Self {
            loadpoint: loadpoint.to_string(),
            carrier: carrier.to_string(),
            mode: mode.to_string(),
            requested_start,
        })
    }
}

fn normalize_requested_start(raw: &str) -> DockBookingResult<String> {
    let raw = raw.trim();
    if !raw.ends_with('Z') {
        return Err(DockBookingError::InvalidInput(format!(
            "requested start '{}' must be a UTC timestamp ending in 'Z'", raw
        )));
    }
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| DockBookingError::InvalidInput(format!("requested start '{}' is not ISO-8601: {}", raw, e)))?
        .with_timezone(&Utc);
    if parsed.minute() != 0 || parsed.second() != 0 || parsed.nanosecond() != 0 {
        return Err(DockBookingError::InvalidInput(format!(
            "requested start '{}' must be on a full hour", raw
        )));
    }
    Ok(parsed.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}

/// Internal GUID-like key the backend assigns to a freshly created appointment
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub struct AppointmentKey(pub String);

/// Human-readable appointment reference returned to the carrier
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentNumber(pub String);

impl DocumentNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
