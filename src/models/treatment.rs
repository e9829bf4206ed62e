use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Treatment {
    pub id: Uuid,
    pub visit_id: Uuid,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub brand: Option<String>,
    pub category_slug: Option<String>,
    pub treatment_type: Option<String>,
    pub lot_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

impl Treatment {
    /// Heading shown on the report ledger: product/brand when known,
    /// otherwise the treatment type.
    pub fn heading(&self) -> String {
        match (&self.product_name, &self.brand) {
            (Some(product), Some(brand)) => format!("{product} ({brand})"),
            (Some(product), None) => product.clone(),
            (None, _) => self
                .treatment_type
                .clone()
                .unwrap_or_else(|| "Treatment".into()),
        }
    }
}

/// One treated area within a treatment (name, units injected, cost).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentArea {
    pub id: Uuid,
    pub treatment_id: Uuid,
    pub area_id: String,
    pub area_name: String,
    pub units: Option<f64>,
    pub cost: f64,
}
