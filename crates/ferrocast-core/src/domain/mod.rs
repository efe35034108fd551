//! # Domain Models
//!
//! Canonical types flowing through the forecast pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`RawObservation`] | One trading day of OHLCV data |
//! | [`ObservationSeries`] | Fetched history for a symbol |
//! | [`TrainingRow`] | `(timestamp, value)` model input |
//! | [`HorizonRow`] | Timestamp the model must estimate |
//! | [`ForecastRow`] | Point estimate with lower/upper bounds |
//! | [`ComponentRow`] | Trend and seasonal parts of an estimate |
//! | [`Symbol`] | Validated ticker such as `BTC-USD` |
//! | [`CalendarDate`] | `YYYY-MM-DD` day |
//!
//! Construction validates invariants, so a `RawObservation` with `high < low`
//! or a non-finite price cannot exist.

mod date;
mod models;
mod symbol;

pub use date::CalendarDate;
pub use models::{
    tail, ComponentRow, ForecastRow, HorizonRow, ObservationSeries, RawObservation, TrainingRow,
    OBSERVATION_COLUMNS,
};
pub use symbol::{Symbol, SUPPORTED_CRYPTOS};
