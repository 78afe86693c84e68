//! Page metadata for the filtered view.

use serde::{Deserialize, Serialize};

/// Metadata describing one page of a larger result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    /// `u64::MAX` when `limit` is zero
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

/// A page of items together with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub info: PageInfo,
}
