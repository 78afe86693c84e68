//! Cache freshness tracking.
//!
//! Decides whether the store's data is recent enough to skip a refetch. Any
//! successful mutation invalidates: a stale cache is always preferred over
//! one that is confidently wrong.
//!
//! Every invalidation bumps an epoch. A refresh that started before the epoch
//! moved must not mark the cache fresh, since the store changed under it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::models::FilterCriteria;

/// How long a refresh stays valid.
pub const CACHE_TTL_SECS: i64 = 5 * 60;

/// Freshness metadata for the store contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheController {
    timestamp: DateTime<Utc>,
    ttl_secs: i64,
    needs_refresh: bool,
    last_filters: Option<FilterCriteria>,
    #[serde(default)]
    epoch: u64,
}

impl Default for CacheController {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheController {
    /// A controller that has never been refreshed.
    pub fn new() -> Self {
        Self {
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            ttl_secs: CACHE_TTL_SECS,
            needs_refresh: true,
            last_filters: None,
            epoch: 0,
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::seconds(self.ttl_secs)
    }

    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub const fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    pub const fn last_filters(&self) -> Option<&FilterCriteria> {
        self.last_filters.as_ref()
    }

    /// Number of invalidations so far.
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.needs_refresh && now - self.timestamp < self.ttl()
    }

    /// Valid and last refreshed with exactly these criteria.
    pub fn is_valid_for(&self, criteria: &FilterCriteria, now: DateTime<Utc>) -> bool {
        self.is_valid_at(now) && self.last_filters.as_ref() == Some(criteria)
    }

    pub fn invalidate(&mut self) {
        self.needs_refresh = true;
        self.timestamp = DateTime::<Utc>::UNIX_EPOCH;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Take over from `previous` when the whole store is swapped out, so
    /// refreshes started against the old store see the epoch move.
    pub fn supersede(&mut self, previous: &Self) {
        self.epoch = previous.epoch;
        self.invalidate();
    }

    pub fn mark_refreshed(&mut self, filters: FilterCriteria) {
        self.mark_refreshed_at(filters, Utc::now());
    }

    pub fn mark_refreshed_at(&mut self, filters: FilterCriteria, now: DateTime<Utc>) {
        self.timestamp = now;
        self.last_filters = Some(filters);
        self.needs_refresh = false;
    }
}
