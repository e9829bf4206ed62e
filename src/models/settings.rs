use serde::{Deserialize, Serialize};

/// Clinic-level settings (singleton row, id=1). The two tax rates are
/// percentages applied by the cost rollup; a zero rate suppresses its line on
/// the report ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicSettings {
    pub clinic_name: String,
    pub provincial_tax_rate: f64,
    pub federal_tax_rate: f64,
}
