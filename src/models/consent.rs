use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ConsentType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consent {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub consent_type: ConsentType,
    pub signed_at: Option<NaiveDate>,
    /// Signature pad capture: base64 PNG, optionally with a data-URL prefix.
    pub signature_data: Option<String>,
}
