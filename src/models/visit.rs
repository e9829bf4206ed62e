use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub visit_date: NaiveDate,
    pub visit_time: Option<String>,
    pub practitioner: Option<String>,
    /// Clinical notes as entered in the rich-text editor (stored markup).
    pub notes: Option<String>,
}
