//! Filter criteria for the derived property view.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::property::PropertyCategory;

/// Price strictly above which a property counts as expensive.
pub const EXPENSIVE_THRESHOLD: f64 = 1_000_000.0;

/// Upper price bound used when the caller sets none.
pub const MAX_PRICE_SENTINEL: f64 = f64::MAX;

/// Coarse pre-filter applied before the detailed criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasicFilter {
    All,
    Available,
    Expensive,
}

impl Default for BasicFilter {
    fn default() -> Self {
        Self::All
    }
}

impl BasicFilter {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Available => "available",
            Self::Expensive => "expensive",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Some(Self::All),
            "available" => Some(Self::Available),
            "expensive" => Some(Self::Expensive),
            _ => None,
        }
    }
}

impl fmt::Display for BasicFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Criteria the filter engine evaluates against every listed property.
///
/// `min_price <= max_price` is the caller's responsibility; an inverted
/// range simply matches nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(default)]
    pub search: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<PropertyCategory>,
    #[serde(default)]
    pub basic: BasicFilter,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            search: String::new(),
            min_price: None,
            max_price: None,
            category: None,
            basic: BasicFilter::All,
        }
    }
}

impl FilterCriteria {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub const fn with_price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub const fn with_category(mut self, category: PropertyCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub const fn with_basic(mut self, basic: BasicFilter) -> Self {
        self.basic = basic;
        self
    }

    pub fn effective_min_price(&self) -> f64 {
        self.min_price.unwrap_or(0.0)
    }

    pub fn effective_max_price(&self) -> f64 {
        self.max_price.unwrap_or(MAX_PRICE_SENTINEL)
    }

    /// Search text with surrounding whitespace removed; empty means no search.
    pub fn search_term(&self) -> Option<&str> {
        let term = self.search.trim();
        (!term.is_empty()).then_some(term)
    }
}
