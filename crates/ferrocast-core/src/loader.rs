//! Series loader: fetch once per symbol, then serve from the cache.

use std::sync::Arc;

use crate::cache::{CachePolicy, SeriesCache};
use crate::clock::SystemClock;
use crate::data_source::{HistoryRequest, MarketDataSource};
use crate::{CalendarDate, ObservationSeries, PipelineError, ProviderId, Symbol};

/// First day requested from the upstream source by default.
pub const DEFAULT_START_DATE: (i32, u8, u8) = (2015, 1, 1);

pub fn default_start_date() -> CalendarDate {
    let (year, month, day) = DEFAULT_START_DATE;
    CalendarDate::from_ymd(year, month, day).unwrap_or_else(|_| CalendarDate::today_utc())
}

/// Result of one [`SeriesLoader::load`] call.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub series: Arc<ObservationSeries>,
    pub cache_hit: bool,
}

/// Fetches daily history from `[start, today]` and memoizes it by symbol.
pub struct SeriesLoader<S> {
    source: S,
    cache: SeriesCache,
    start: CalendarDate,
    fetch_count: usize,
}

impl<S: MarketDataSource> SeriesLoader<S> {
    /// Loader with the default start date, a process-lifetime cache and the
    /// system clock.
    pub fn new(source: S) -> Self {
        Self::with_cache(
            source,
            SeriesCache::new(CachePolicy::KeepForever, Arc::new(SystemClock)),
        )
    }

    pub fn with_cache(source: S, cache: SeriesCache) -> Self {
        Self {
            source,
            cache,
            start: default_start_date(),
            fetch_count: 0,
        }
    }

    pub fn with_start(mut self, start: CalendarDate) -> Self {
        self.start = start;
        self
    }

    pub fn start(&self) -> CalendarDate {
        self.start
    }

    pub fn source_id(&self) -> ProviderId {
        self.source.id()
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut SeriesCache {
        &mut self.cache
    }

    /// Number of upstream fetches issued so far.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count
    }

    /// Returns the history of `symbol`, fetching it only on a cache miss.
    ///
    /// # Errors
    ///
    /// [`PipelineError::DataUnavailable`] when the source fails, does not know
    /// the symbol, or returns no rows.
    pub async fn load(&mut self, symbol: &Symbol) -> Result<LoadOutcome, PipelineError> {
        if let Some(series) = self.cache.get(symbol) {
            tracing::debug!(%symbol, rows = series.len(), "series cache hit");
            return Ok(LoadOutcome {
                series,
                cache_hit: true,
            });
        }

        tracing::debug!(%symbol, "series cache miss");
        let end = self.cache.clock().today();
        let request = HistoryRequest::new(symbol.clone(), self.start, end)?;

        self.fetch_count += 1;
        let series = self
            .source
            .daily_history(request)
            .await
            .map_err(|error| {
                tracing::warn!(%symbol, %error, "history fetch failed");
                PipelineError::data_unavailable(symbol.as_str(), &error)
            })?;

        if series.is_empty() {
            return Err(PipelineError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: String::from("source returned zero rows"),
            });
        }

        if &series.symbol != symbol {
            return Err(PipelineError::schema_mismatch(format!(
                "source answered '{}' for a request on '{symbol}'",
                series.symbol
            )));
        }

        tracing::info!(
            %symbol,
            rows = series.len(),
            first = ?series.first_date(),
            last = ?series.last_date(),
            "loaded series"
        );

        let series = series.into_shared();
        self.cache.put(Arc::clone(&series));
        Ok(LoadOutcome {
            series,
            cache_hit: false,
        })
    }
}
