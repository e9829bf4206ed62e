use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Sex;

/// Sparse case-search specification. Every field is independently optional;
/// an absent field (or empty set) means "no constraint", never "match empty".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilter {
    pub ethnicity: Option<String>,
    pub sex: Option<Sex>,
    pub age_min: Option<u32>,
    pub age_max: Option<u32>,
    pub consent_botulinum: bool,
    pub consent_filler: bool,
    pub consent_photo: bool,
    pub visit_date_from: Option<NaiveDate>,
    pub visit_date_to: Option<NaiveDate>,
    /// Substring fragment matched against treatment lot numbers.
    pub lot_number: Option<String>,
    pub product_ids: Vec<String>,
    pub treatment_category_slugs: Vec<String>,
    pub treated_area_ids: Vec<String>,
}

/// One case-search result row: patient identity plus aggregate counts over
/// non-deleted child rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub birthday: Option<NaiveDate>,
    pub sex: Option<Sex>,
    pub ethnicity: Option<String>,
    pub visit_count: i64,
    pub treatment_count: i64,
}

/// Photo reference carried by a comparison pair side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRef {
    pub id: Uuid,
    pub original_path: String,
    pub thumbnail_path: Option<String>,
    pub state: Option<String>,
}

/// A before/after slot pair for one (position, state) composite key. Either
/// side may be absent, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonPair {
    pub position: String,
    pub state: Option<String>,
    pub before: Option<PhotoRef>,
    pub after: Option<PhotoRef>,
}
