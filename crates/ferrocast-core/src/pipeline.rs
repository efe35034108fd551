//! End-to-end forecast run as an explicit, forward-only stage machine.
//!
//! ```text
//! Idle -> Loading -> Prepared -> Fitting -> Forecasted -> Rendered
//! ```
//!
//! [`ForecastPipeline::run`] drives a request up to `Forecasted`; the caller
//! marks `Rendered` once the outcome has been displayed.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::Serialize;

use crate::data_source::MarketDataSource;
use crate::forecast::{select_components, ForecastFrame, ForecastSelector};
use crate::horizon::{build_horizon_for_years, validate_years};
use crate::loader::SeriesLoader;
use crate::model::{ForecastModel, ForecastTable, ModelConfig};
use crate::schema::to_training_rows;
use crate::{
    CalendarDate, ComponentRow, HorizonRow, ModelError, ObservationSeries, PipelineError, Symbol,
    TrainingRow, ValidationError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    Loading,
    Prepared,
    Fitting,
    Forecasted,
    Rendered,
}

impl PipelineStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Prepared => "prepared",
            Self::Fitting => "fitting",
            Self::Forecasted => "forecasted",
            Self::Rendered => "rendered",
        }
    }

    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Loading),
            Self::Loading => Some(Self::Prepared),
            Self::Prepared => Some(Self::Fitting),
            Self::Fitting => Some(Self::Forecasted),
            Self::Forecasted => Some(Self::Rendered),
            Self::Rendered => None,
        }
    }
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current stage of one run; accepts only the immediate successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTracker {
    current: PipelineStage,
}

impl Default for StageTracker {
    fn default() -> Self {
        Self {
            current: PipelineStage::Idle,
        }
    }
}

impl StageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> PipelineStage {
        self.current
    }

    pub fn advance(&mut self, to: PipelineStage) -> Result<(), PipelineError> {
        if self.current.next() != Some(to) {
            return Err(PipelineError::StageOrder {
                from: self.current.as_str(),
                to: to.as_str(),
            });
        }
        tracing::debug!(from = %self.current, %to, "pipeline stage");
        self.current = to;
        Ok(())
    }
}

/// What to forecast and how.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub symbol: Symbol,
    pub years: u32,
    pub config: ModelConfig,
    pub selector: ForecastSelector,
}

impl ForecastRequest {
    /// # Errors
    ///
    /// [`ValidationError::YearsOutOfRange`] unless `years` is within `1..=5`.
    pub fn new(symbol: Symbol, years: u32) -> Result<Self, ValidationError> {
        Ok(Self {
            symbol,
            years: validate_years(years)?,
            config: ModelConfig::default(),
            selector: ForecastSelector::default(),
        })
    }

    pub fn with_config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_selector(mut self, selector: ForecastSelector) -> Self {
        self.selector = selector;
        self
    }
}

/// Loaded history with its training rows and forecast horizon.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub series: Arc<ObservationSeries>,
    pub cache_hit: bool,
    pub training: Vec<TrainingRow>,
    pub horizon: Vec<HorizonRow>,
}

/// Everything a run produced, plus the fitted model.
#[derive(Debug)]
pub struct PipelineOutcome<M> {
    pub prepared: PreparedData,
    pub table: ForecastTable,
    pub forecast: ForecastFrame,
    pub components: Vec<ComponentRow>,
    pub changepoints: Vec<CalendarDate>,
    pub model: M,
    stages: StageTracker,
}

impl<M> PipelineOutcome<M> {
    pub fn stage(&self) -> PipelineStage {
        self.stages.current()
    }

    /// Records that the outcome has been displayed.
    pub fn mark_rendered(&mut self) -> Result<(), PipelineError> {
        self.stages.advance(PipelineStage::Rendered)
    }
}

pub struct ForecastPipeline;

impl ForecastPipeline {
    /// Loads `symbol`, projects it onto training rows and builds the horizon
    /// for `years`.
    pub async fn prepare<S: MarketDataSource>(
        loader: &mut SeriesLoader<S>,
        symbol: &Symbol,
        years: u32,
    ) -> Result<PreparedData, PipelineError> {
        let mut stages = StageTracker::new();
        Self::prepare_tracked(loader, symbol, years, &mut stages).await
    }

    /// Runs a request through `Forecasted`.
    ///
    /// `factory` builds the model from `request.config`.
    ///
    /// # Errors
    ///
    /// Any [`PipelineError`] raised by a stage stops the run; nothing is
    /// retried.
    pub async fn run<S, M, F>(
        loader: &mut SeriesLoader<S>,
        request: &ForecastRequest,
        factory: F,
    ) -> Result<PipelineOutcome<M>, PipelineError>
    where
        S: MarketDataSource,
        M: ForecastModel,
        F: FnOnce(&ModelConfig) -> Result<M, ModelError>,
    {
        request.config.validate()?;
        let mut stages = StageTracker::new();
        let prepared =
            Self::prepare_tracked(loader, &request.symbol, request.years, &mut stages).await?;

        stages.advance(PipelineStage::Fitting)?;
        let mut model = factory(&request.config)?;
        model.fit(&prepared.training)?;
        tracing::info!(
            symbol = %request.symbol,
            rows = prepared.training.len(),
            changepoints = model.changepoints().len(),
            "model fitted"
        );

        let table = model.predict(&prepared.horizon)?;
        if table.len() != prepared.horizon.len() {
            return Err(PipelineError::schema_mismatch(format!(
                "model produced {} rows for a {}-row horizon",
                table.len(),
                prepared.horizon.len()
            )));
        }
        let forecast = request.selector.select(&table)?;
        let components = select_components(&table)?;
        let changepoints = model.changepoints().to_vec();
        stages.advance(PipelineStage::Forecasted)?;

        Ok(PipelineOutcome {
            prepared,
            table,
            forecast,
            components,
            changepoints,
            model,
            stages,
        })
    }

    async fn prepare_tracked<S: MarketDataSource>(
        loader: &mut SeriesLoader<S>,
        symbol: &Symbol,
        years: u32,
        stages: &mut StageTracker,
    ) -> Result<PreparedData, PipelineError> {
        let years = validate_years(years)?;

        stages.advance(PipelineStage::Loading)?;
        let loaded = loader.load(symbol).await?;

        let training = to_training_rows(&loaded.series.observations)?;
        let horizon = build_horizon_for_years(&training, years)?;
        stages.advance(PipelineStage::Prepared)?;

        Ok(PreparedData {
            series: loaded.series,
            cache_hit: loaded.cache_hit,
            training,
            horizon,
        })
    }
}
