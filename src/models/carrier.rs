use serde::{Deserialize, Serialize};
use crate::models::ODataRecord;

/// A carrier registered with the booking backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carrier {
    #[serde(rename = "PartnerID")]
    pub partner_id: String,
}

impl Carrier {
    /// Builds a carrier from a row of `ZDOCK_SLOT_CARRIERSet`.
    /// The directory pads `Businesspartner`, so it is trimmed here; a missing value becomes empty.
    pub fn from_record(record: &ODataRecord) -> Self {
        let partner_id = record
            .text("Businesspartner")
            .map(|id| id.trim().to_string())
            .unwrap_or_default();
        Self { partner_id }
    }
}
