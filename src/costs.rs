//! Cost rollup shared by the live treatment-form preview and the report
//! ledger. One implementation, both call sites.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub subtotal: f64,
    pub provincial_tax: f64,
    pub federal_tax: f64,
    pub total: f64,
}

/// Fold a subtotal and two percentage tax rates into a cost summary. Full
/// precision throughout; rounding happens only at display time via
/// [`format_amount`].
pub fn rollup(subtotal: f64, provincial_rate: f64, federal_rate: f64) -> CostSummary {
    let provincial_tax = subtotal * provincial_rate / 100.0;
    let federal_tax = subtotal * federal_rate / 100.0;
    CostSummary {
        subtotal,
        provincial_tax,
        federal_tax,
        total: subtotal + provincial_tax + federal_tax,
    }
}

/// Two-decimal display formatting for monetary amounts.
pub fn format_amount(amount: f64) -> String {
    format!("{amount:.2}")
}
