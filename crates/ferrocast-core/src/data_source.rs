//! Market-data source trait and request/error types.
//!
//! A source answers one question: "give me the daily history of this symbol
//! between these two dates". Everything downstream (caching, schema
//! adaptation) works on the normalized [`ObservationSeries`] it returns.
//!
//! ```rust,ignore
//! use ferrocast_core::{HistoryRequest, MarketDataSource, Symbol, YahooAdapter, CalendarDate};
//!
//! async fn fetch(adapter: &YahooAdapter) -> Result<(), ferrocast_core::SourceError> {
//!     let request = HistoryRequest::new(
//!         Symbol::parse("BTC-USD")?,
//!         CalendarDate::parse("2015-01-01")?,
//!         CalendarDate::today_utc(),
//!     )?;
//!     let series = adapter.daily_history(request).await?;
//!     println!("{} rows", series.len());
//!     Ok(())
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::{CalendarDate, ObservationSeries, ProviderId, Symbol, ValidationError};

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// The upstream does not know the symbol or returned no rows.
    NotFound,
    /// Transport failure or non-success status.
    Unavailable,
    InvalidRequest,
    /// Payload could not be decoded into observations.
    Internal,
}

/// Structured source error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NotFound,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl From<ValidationError> for SourceError {
    fn from(value: ValidationError) -> Self {
        Self::invalid_request(value.to_string())
    }
}

/// Request payload for daily history: an inclusive `[start, end]` window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub symbol: Symbol,
    pub start: CalendarDate,
    pub end: CalendarDate,
}

impl HistoryRequest {
    pub fn new(
        symbol: Symbol,
        start: CalendarDate,
        end: CalendarDate,
    ) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::EmptyWindow {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { symbol, start, end })
    }

    pub fn contains(&self, date: CalendarDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Market-data source contract.
///
/// Implementations return rows ascending by date, one row per calendar date.
/// Gaps for non-trading days are allowed. An empty result must be reported as
/// [`SourceErrorKind::NotFound`] rather than an empty series.
pub trait MarketDataSource: Send + Sync {
    /// Returns the provider identifier.
    fn id(&self) -> ProviderId;

    /// Fetches daily OHLCV history for the request window.
    fn daily_history<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ObservationSeries, SourceError>> + Send + 'a>>;
}

impl<T: MarketDataSource + ?Sized> MarketDataSource for Box<T> {
    fn id(&self) -> ProviderId {
        (**self).id()
    }

    fn daily_history<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ObservationSeries, SourceError>> + Send + 'a>> {
        (**self).daily_history(req)
    }
}

impl<T: MarketDataSource + ?Sized> MarketDataSource for Arc<T> {
    fn id(&self) -> ProviderId {
        (**self).id()
    }

    fn daily_history<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ObservationSeries, SourceError>> + Send + 'a>> {
        (**self).daily_history(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_window() {
        let symbol = Symbol::parse("ETH-USD").expect("valid");
        let start = CalendarDate::parse("2024-02-01").expect("valid");
        let end = CalendarDate::parse("2024-01-01").expect("valid");
        let err = HistoryRequest::new(symbol, start, end).expect_err("must fail");
        assert!(matches!(err, ValidationError::EmptyWindow { .. }));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let symbol = Symbol::parse("ETH-USD").expect("valid");
        let start = CalendarDate::parse("2024-01-01").expect("valid");
        let end = CalendarDate::parse("2024-01-31").expect("valid");
        let request = HistoryRequest::new(symbol, start, end).expect("valid");
        assert!(request.contains(start));
        assert!(request.contains(end));
        assert!(!request.contains(CalendarDate::parse("2024-02-01").expect("valid")));
    }

    #[test]
    fn error_display_includes_code() {
        let error = SourceError::not_found("no rows for FOO-USD");
        assert_eq!(error.kind(), SourceErrorKind::NotFound);
        assert_eq!(error.to_string(), "no rows for FOO-USD (source.not_found)");
    }
}
