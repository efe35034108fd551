//! In-memory memoization of fetched observation series.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;

use crate::clock::Clock;
use crate::{ObservationSeries, Symbol};

/// When cached series stop being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Keep entries for the lifetime of the cache. (Default)
    #[default]
    KeepForever,
    /// Serve an entry only while it is younger than the duration.
    ExpireAfter(Duration),
    /// Never store anything; every load goes upstream.
    Disabled,
}

impl CachePolicy {
    /// `None` keeps entries forever, `Some(0)` disables caching.
    pub fn from_ttl_secs(ttl_secs: Option<u64>) -> Self {
        match ttl_secs {
            None => Self::KeepForever,
            Some(0) => Self::Disabled,
            Some(secs) => Self::ExpireAfter(Duration::from_secs(secs)),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    series: Arc<ObservationSeries>,
    stored_at: OffsetDateTime,
}

/// Symbol-keyed cache of loaded series, owned by the caller.
///
/// Entries are shared through `Arc`, so a hit hands back the very allocation
/// that was stored. The key is the normalized symbol; different symbols never
/// share an entry.
pub struct SeriesCache {
    map: HashMap<Symbol, CacheEntry>,
    policy: CachePolicy,
    clock: Arc<dyn Clock>,
}

impl SeriesCache {
    pub fn new(policy: CachePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            map: HashMap::new(),
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        match self.policy {
            CachePolicy::KeepForever => true,
            CachePolicy::ExpireAfter(ttl) => self.clock.now() - entry.stored_at < ttl,
            CachePolicy::Disabled => false,
        }
    }

    /// Cached series for `symbol`, unless absent or expired.
    pub fn get(&self, symbol: &Symbol) -> Option<Arc<ObservationSeries>> {
        self.map
            .get(symbol)
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| Arc::clone(&entry.series))
    }

    /// Stores `series` under its own symbol. No-op when caching is disabled.
    pub fn put(&mut self, series: Arc<ObservationSeries>) {
        if self.policy == CachePolicy::Disabled {
            return;
        }
        let stored_at = self.clock.now();
        self.map
            .insert(series.symbol.clone(), CacheEntry { series, stored_at });
    }

    /// Drops the entry for `symbol`; returns whether one existed.
    pub fn invalidate(&mut self, symbol: &Symbol) -> bool {
        self.map.remove(symbol).is_some()
    }

    pub fn clear_expired(&mut self) {
        let now = self.clock.now();
        let policy = self.policy;
        self.map.retain(|_, entry| match policy {
            CachePolicy::KeepForever => true,
            CachePolicy::ExpireAfter(ttl) => now - entry.stored_at < ttl,
            CachePolicy::Disabled => false,
        });
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl std::fmt::Debug for SeriesCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeriesCache")
            .field("entries", &self.map.len())
            .field("policy", &self.policy)
            .finish()
    }
}
