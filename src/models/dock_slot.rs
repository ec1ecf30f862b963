//! # Dock Slot Representation

//! This module defines the `DockSlot` struct, one bookable window at a loadpoint as reported by the slot listing,
//! together with the `SlotTime` parser that turns the backend's verbose time token into a compact `HH:MM:SS` value.

use serde::{Deserialize, Serialize};
use crate::errors::{DockBookingError, DockBookingResult};
use crate::models::ODataRecord;

/// Bytes preceding the time-of-day inside a raw slot time token.
const SLOT_TIME_PREFIX_LEN: usize = 8;
/// Bytes following the time-of-day inside a raw slot time token.
const SLOT_TIME_SUFFIX_LEN: usize = 4;
/// Shortest raw token that still holds a full `HH:MM:SS` between prefix and suffix.
const SLOT_TIME_MIN_LEN: usize = 12;

/// A docking slot derived from one backend row.
/// Recomputed on every lookup and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockSlot {
    #[serde(rename = "StartTime")]
    pub start_time: String,
    #[serde(rename = "EndTime")]
    pub end_time: String,
    /// Maximum number of trucks the slot accepts
    #[serde(rename = "Capacity")]
    pub capacity: u32,
    #[serde(rename = "Loadpoint")]
    pub loadpoint: String,
}

impl DockSlot {
    /// Builds a slot from a row of `ZDOCK_SLOT_TIMESet`
    ///
    /// * `StartTime` / `FinishTime`: required, parsed with [`SlotTime::parse`]
    /// * `Capacity`: number or numeric string, 0 when absent
    /// * `Loadpoint`: empty when absent
    pub fn from_record(record: &ODataRecord) -> DockBookingResult<Self> {
        let start_time = SlotTime::parse(&record.require_text("StartTime")?)?;
        let end_time = SlotTime::parse(&record.require_text("FinishTime")?)?;
        let capacity = record.unsigned("Capacity")?.unwrap_or(0);
        let loadpoint = record.text("Loadpoint").unwrap_or_default();

        Ok(Self {
            start_time: start_time.into_inner(),
            end_time: end_time.into_inner(),
            capacity,
            loadpoint,
        })
    }
}

/// Time-of-day extracted from a raw slot time token.
///
/// Input contract: after trimming, the token is at least 12 bytes long and holds the
/// time-of-day between an 8 byte prefix and a 4 byte suffix, e.g. `20250623` `09:00:00` `.000`.
/// The window `[8, len - 4)` is kept verbatim; nothing inside it is reformatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotTime(String);

impl SlotTime {
    pub fn parse(raw: &str) -> DockBookingResult<Self> {
        let token = raw.trim();
        if token.len() < SLOT_TIME_MIN_LEN {
            return Err(DockBookingError::Parse(format!(
                "slot time token '{}' is shorter than {} bytes", token, SLOT_TIME_MIN_LEN
            )));
        }
        token
            .get(SLOT_TIME_PREFIX_LEN..token.len() - SLOT_TIME_SUFFIX_LEN)
            .map(|window| SlotTime(window.to_string()))
            .ok_or_else(|| DockBookingError::Parse(format!("slot time token '{}' cannot be sliced", token)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}
