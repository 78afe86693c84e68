//! Aggregate statistics over every listed property.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyStats {
    pub count: usize,
    pub available_count: usize,
    pub expensive_count: usize,
    /// `None` when the store is empty
    pub min_price: Option<f64>,
    pub avg_price: Option<f64>,
    pub max_price: Option<f64>,
}
