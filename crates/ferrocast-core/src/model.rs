//! Contract between the pipeline and a forecasting model.
//!
//! The pipeline never looks inside a model: it hands over training rows,
//! asks for a wide [`ForecastTable`] over the horizon, and reads back the
//! changepoints the fit detected. Configuration is fixed when the model is
//! built, so comparing configurations means building one model per
//! configuration.

use serde::{Deserialize, Serialize};

use crate::{CalendarDate, HorizonRow, ModelError, TrainingRow, ValidationError};

/// Conventional column names of a model's wide output.
pub mod columns {
    pub const TREND: &str = "trend";
    pub const TREND_LOWER: &str = "trend_lower";
    pub const TREND_UPPER: &str = "trend_upper";
    pub const WEEKLY: &str = "weekly";
    pub const YEARLY: &str = "yearly";
    pub const ADDITIVE_TERMS: &str = "additive_terms";
    pub const YHAT: &str = "yhat";
    pub const YHAT_LOWER: &str = "yhat_lower";
    pub const YHAT_UPPER: &str = "yhat_upper";
}

/// Hyperparameters recognized by forecasting models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Probability mass between the lower and upper bound, in `(0, 1)`.
    pub uncertainty_width: f64,
    /// Prior scale of trend rate changes; larger values bend the trend more.
    pub trend_flexibility: f64,
    /// Number of potential changepoints placed over the history.
    pub changepoint_count: usize,
    /// Share of the history (from the start) eligible for changepoints.
    pub changepoint_range: f64,
    /// `None` lets the model decide from the history length.
    pub yearly_seasonality: Option<bool>,
    pub weekly_seasonality: Option<bool>,
    /// Prior scale of seasonal coefficients.
    pub seasonality_strength: f64,
    /// Simulated paths behind the bounds; 0 collapses bounds onto the estimate.
    pub uncertainty_samples: usize,
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            uncertainty_width: 0.8,
            trend_flexibility: 0.05,
            changepoint_count: 25,
            changepoint_range: 0.8,
            yearly_seasonality: None,
            weekly_seasonality: None,
            seasonality_strength: 10.0,
            uncertainty_samples: 1000,
            seed: 0,
        }
    }
}

impl ModelConfig {
    pub fn with_uncertainty_width(mut self, width: f64) -> Self {
        self.uncertainty_width = width;
        self
    }

    pub fn with_trend_flexibility(mut self, flexibility: f64) -> Self {
        self.trend_flexibility = flexibility;
        self
    }

    pub fn with_yearly_seasonality(mut self, enabled: bool) -> Self {
        self.yearly_seasonality = Some(enabled);
        self
    }

    pub fn with_weekly_seasonality(mut self, enabled: bool) -> Self {
        self.weekly_seasonality = Some(enabled);
        self
    }

    pub fn with_uncertainty_samples(mut self, samples: usize) -> Self {
        self.uncertainty_samples = samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |message: String| Err(ValidationError::InvalidModelConfig(message));

        if !(self.uncertainty_width > 0.0 && self.uncertainty_width < 1.0) {
            return invalid(format!(
                "uncertainty_width must be in (0, 1), got {}",
                self.uncertainty_width
            ));
        }
        if !(self.trend_flexibility.is_finite() && self.trend_flexibility > 0.0) {
            return invalid(format!(
                "trend_flexibility must be positive, got {}",
                self.trend_flexibility
            ));
        }
        if self.changepoint_count == 0 {
            return invalid("changepoint_count must be at least 1".to_string());
        }
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return invalid(format!(
                "changepoint_range must be in (0, 1], got {}",
                self.changepoint_range
            ));
        }
        if !(self.seasonality_strength.is_finite() && self.seasonality_strength > 0.0) {
            return invalid(format!(
                "seasonality_strength must be positive, got {}",
                self.seasonality_strength
            ));
        }
        Ok(())
    }
}

/// Wide model output: one row per horizon timestamp, any number of named
/// numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastTable {
    timestamps: Vec<CalendarDate>,
    columns: Vec<(String, Vec<f64>)>,
}

impl ForecastTable {
    pub fn new(timestamps: Vec<CalendarDate>) -> Self {
        Self {
            timestamps,
            columns: Vec::new(),
        }
    }

    /// Adds or replaces a column.
    ///
    /// # Errors
    ///
    /// [`ModelError::DegenerateInput`] when the column length differs from
    /// the number of timestamps.
    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), ModelError> {
        let name = name.into();
        if values.len() != self.timestamps.len() {
            return Err(ModelError::DegenerateInput(format!(
                "column '{name}' has {} values for {} timestamps",
                values.len(),
                self.timestamps.len()
            )));
        }
        match self.columns.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => *existing = values,
            None => self.columns.push((name, values)),
        }
        Ok(())
    }

    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Self, ModelError> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    pub fn timestamps(&self) -> &[CalendarDate] {
        &self.timestamps
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// A forecasting model: configured at construction, fitted once, then asked
/// for predictions.
pub trait ForecastModel {
    fn config(&self) -> &ModelConfig;

    /// Fits the model to ascending, duplicate-free training rows.
    fn fit(&mut self, training: &[TrainingRow]) -> Result<(), ModelError>;

    /// Estimates every horizon row, in horizon order.
    fn predict(&self, horizon: &[HorizonRow]) -> Result<ForecastTable, ModelError>;

    /// Changepoints placed by the last fit; empty before fitting.
    fn changepoints(&self) -> &[CalendarDate];
}
