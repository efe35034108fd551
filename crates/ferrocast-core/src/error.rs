use thiserror::Error;

use crate::data_source::SourceError;

/// Validation and contract errors exposed by `ferrocast-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("date must be formatted as YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error("date {value} is outside the supported calendar range")]
    DateOutOfRange { value: String },
    #[error("request window is empty: start {start} is after end {end}")]
    EmptyWindow { start: String, end: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("observation high must be >= low")]
    InvalidPriceRange,
    #[error("observation open/close must be within high/low range")]
    InvalidPriceBounds,

    #[error("forecast years must be within {min}..={max}, got {value}")]
    YearsOutOfRange { value: u32, min: u32, max: u32 },
    #[error("sweep must contain at least one configuration")]
    EmptySweep,
    #[error("sweep label '{label}' is used more than once")]
    DuplicateSweepLabel { label: String },
    #[error("invalid model configuration: {0}")]
    InvalidModelConfig(String),

    #[error("run id must contain at least 8 characters")]
    InvalidRunId,
    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,
}

/// Failures raised by a forecasting model implementation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("model must be fitted before calling predict")]
    NotFitted,
    #[error("model has already been fitted; build a fresh instance per configuration")]
    AlreadyFitted,
    #[error("model needs at least {required} training rows, got {actual}")]
    TooFewRows { required: usize, actual: usize },
    #[error("training values are degenerate: {0}")]
    DegenerateInput(String),
    #[error("normal equations are not positive definite at pivot {pivot}")]
    Singular { pivot: usize },
    #[error(transparent)]
    Config(#[from] ValidationError),
}

/// Top-level error type for the forecast pipeline.
///
/// Every variant is fatal for the current run. Nothing is retried.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no data available for '{symbol}': {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("insufficient data: need at least {required} rows, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("model failure: {0}")]
    Model(#[from] ModelError),

    #[error("pipeline cannot move from stage {from} to {to}")]
    StageOrder {
        from: &'static str,
        to: &'static str,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl PipelineError {
    pub fn data_unavailable(symbol: impl Into<String>, error: &SourceError) -> Self {
        Self::DataUnavailable {
            symbol: symbol.into(),
            reason: error.to_string(),
        }
    }

    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::SchemaMismatch(message.into())
    }

    /// Stable machine-readable code used by the CLI envelope.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DataUnavailable { .. } => "pipeline.data_unavailable",
            Self::InsufficientData { .. } => "pipeline.insufficient_data",
            Self::SchemaMismatch(_) => "pipeline.schema_mismatch",
            Self::Model(_) => "pipeline.model",
            Self::StageOrder { .. } => "pipeline.stage_order",
            Self::Validation(_) => "pipeline.validation",
        }
    }
}
