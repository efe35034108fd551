//! Core contracts for ferrocast.
//!
//! This crate contains:
//! - Canonical domain models and validation
//! - Market-data sources (Yahoo chart API, CSV directory) and the memoizing
//!   series loader
//! - Schema adaptation, horizon construction and forecast selection
//! - The forecasting model contract, parameter sweep and pipeline stages
//! - Settings and the response envelope

pub mod adapters;
pub mod cache;
pub mod clock;
pub mod data_source;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod forecast;
pub mod horizon;
pub mod http_client;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod schema;
pub mod settings;
pub mod source;
pub mod sweep;

pub use adapters::{CsvDirectorySource, YahooAdapter};
pub use cache::{CachePolicy, SeriesCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use data_source::{HistoryRequest, MarketDataSource, SourceError, SourceErrorKind};
pub use domain::{
    tail, CalendarDate, ComponentRow, ForecastRow, HorizonRow, ObservationSeries, RawObservation,
    Symbol, TrainingRow, OBSERVATION_COLUMNS, SUPPORTED_CRYPTOS,
};
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta};
pub use error::{ModelError, PipelineError, ValidationError};
pub use forecast::{select_components, ForecastFrame, ForecastSelector};
pub use horizon::{
    build_horizon, build_horizon_for_years, period_days_for_years, validate_years,
    DAYS_PER_YEAR, MIN_TRAINING_ROWS, YEARS_RANGE,
};
pub use http_client::{
    CannedHttpClient, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use loader::{default_start_date, LoadOutcome, SeriesLoader, DEFAULT_START_DATE};
pub use model::{columns, ForecastModel, ForecastTable, ModelConfig};
pub use pipeline::{
    ForecastPipeline, ForecastRequest, PipelineOutcome, PipelineStage, PreparedData, StageTracker,
};
pub use schema::to_training_rows;
pub use settings::{Settings, SettingsError};
pub use source::ProviderId;
pub use sweep::{default_flexibility_sweep, run_sweep, validate_sweep, SweepConfig, SweepResult};
