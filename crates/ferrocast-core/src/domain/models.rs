use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{CalendarDate, Symbol, ValidationError};

/// Column names of a raw observation table, in display order.
pub const OBSERVATION_COLUMNS: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

/// One trading day of OHLCV data for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub date: CalendarDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<u64>,
}

impl RawObservation {
    pub fn new(
        date: CalendarDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<u64>,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;

        if high < low {
            return Err(ValidationError::InvalidPriceRange);
        }

        if open < low || open > high || close < low || close > high {
            return Err(ValidationError::InvalidPriceBounds);
        }

        Ok(Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Fetched daily history for one symbol, ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationSeries {
    pub symbol: Symbol,
    pub observations: Vec<RawObservation>,
}

impl ObservationSeries {
    pub fn new(symbol: Symbol, observations: Vec<RawObservation>) -> Self {
        Self {
            symbol,
            observations,
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first_date(&self) -> Option<CalendarDate> {
        self.observations.first().map(|row| row.date)
    }

    pub fn last_date(&self) -> Option<CalendarDate> {
        self.observations.last().map(|row| row.date)
    }

    /// The last `n` observations (all of them when `n` exceeds the length).
    pub fn tail(&self, n: usize) -> &[RawObservation] {
        tail(&self.observations, n)
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &OBSERVATION_COLUMNS
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

/// Model input row: `(timestamp, value)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    pub timestamp: CalendarDate,
    pub value: f64,
}

impl TrainingRow {
    pub const fn new(timestamp: CalendarDate, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// One timestamp the model is asked to estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HorizonRow {
    pub timestamp: CalendarDate,
}

impl HorizonRow {
    pub const fn new(timestamp: CalendarDate) -> Self {
        Self { timestamp }
    }
}

/// Display projection of one model output row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub timestamp: CalendarDate,
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Additive components behind one model output row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentRow {
    pub timestamp: CalendarDate,
    pub trend: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yearly: Option<f64>,
}

/// The last `n` items of a slice.
pub fn tail<T>(rows: &[T], n: usize) -> &[T] {
    &rows[rows.len().saturating_sub(n)..]
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
