use ndarray::{s, Array1, Array2, ArrayView1};

use ferrocast_core::{
    columns, CalendarDate, ForecastModel, ForecastTable, HorizonRow, ModelConfig, ModelError,
    TrainingRow, MIN_TRAINING_ROWS,
};

use crate::design::{changepoint_indices, epoch_days, extend_hinges, Seasonality};
use crate::linalg::cholesky_solve;
use crate::uncertainty::{simulate_bounds, SimulationInput};

/// Prior standard deviation of the intercept and base growth rate.
const BASE_PRIOR_SD: f64 = 5.0;
/// Floor of the estimated noise variance, in scaled units.
const MIN_NOISE_VARIANCE: f64 = 1e-6;
/// Minimum history (days) before yearly seasonality switches on by itself.
const AUTO_YEARLY_MIN_DAYS: f64 = 730.0;
/// Minimum history (days) before weekly seasonality switches on by itself.
const AUTO_WEEKLY_MIN_DAYS: f64 = 14.0;
/// Default rate-change magnitude for [`AdditiveModel::significant_changepoints`].
pub const DEFAULT_CHANGEPOINT_THRESHOLD: f64 = 0.01;

/// Piecewise-linear trend with changepoints plus Fourier seasonality.
///
/// Fitting is a penalized least-squares (MAP) estimate: rate changes at the
/// changepoints shrink towards zero with prior scale `trend_flexibility`,
/// seasonal coefficients with `seasonality_strength`. Intervals come from
/// seeded simulation, so `predict` is deterministic for a given config.
#[derive(Debug, Clone)]
pub struct AdditiveModel {
    config: ModelConfig,
    fitted: Option<FittedState>,
    changepoints: Vec<CalendarDate>,
}

#[derive(Debug, Clone)]
struct FittedState {
    start: CalendarDate,
    span_days: f64,
    y_scale: f64,
    changepoint_t: Vec<f64>,
    seasonalities: Vec<Seasonality>,
    /// `[intercept, rate, deltas.., seasonal coefficients..]`
    beta: Array1<f64>,
    deltas: Vec<f64>,
    residual_sd: f64,
}

impl FittedState {
    fn scaled_time(&self, date: CalendarDate) -> f64 {
        date.days_since(self.start) as f64 / self.span_days
    }

    fn trend(&self, t: f64) -> f64 {
        let hinge: f64 = self
            .changepoint_t
            .iter()
            .zip(&self.deltas)
            .map(|(s, delta)| delta * (t - s).max(0.0))
            .sum();
        self.beta[0] + self.beta[1] * t + hinge
    }

    fn seasonal(&self, seasonality_index: usize, epoch_days: f64) -> f64 {
        let offset = 2
            + self.changepoint_t.len()
            + self.seasonalities[..seasonality_index]
                .iter()
                .map(Seasonality::width)
                .sum::<usize>();
        let seasonality = self.seasonalities[seasonality_index];
        let mut terms = Vec::with_capacity(seasonality.width());
        seasonality.extend_row(epoch_days, &mut terms);
        terms
            .iter()
            .zip(self.beta.slice(s![offset..offset + seasonality.width()]))
            .map(|(term, coefficient)| term * coefficient)
            .sum()
    }
}

impl AdditiveModel {
    /// # Errors
    ///
    /// [`ModelError::Config`] when `config` fails validation.
    pub fn new(config: ModelConfig) -> Result<Self, ModelError> {
        config.validate()?;
        Ok(Self {
            config,
            fitted: None,
            changepoints: Vec::new(),
        })
    }

    /// Factory matching the pipeline and sweep signature.
    pub fn from_config(config: &ModelConfig) -> Result<Self, ModelError> {
        Self::new(config.clone())
    }

    /// Fitted rate change at each changepoint, in the model's scaled units.
    pub fn changepoint_deltas(&self) -> &[f64] {
        self.fitted
            .as_ref()
            .map(|state| state.deltas.as_slice())
            .unwrap_or(&[])
    }

    /// Changepoints whose rate change magnitude is at least `threshold`.
    pub fn significant_changepoints(&self, threshold: f64) -> Vec<CalendarDate> {
        self.changepoints
            .iter()
            .zip(self.changepoint_deltas())
            .filter(|(_, delta)| delta.abs() >= threshold)
            .map(|(date, _)| *date)
            .collect()
    }

    /// Names of the seasonal components in the last fit.
    pub fn seasonalities(&self) -> Vec<&'static str> {
        self.fitted
            .as_ref()
            .map(|state| state.seasonalities.iter().map(|s| s.name).collect())
            .unwrap_or_default()
    }
}

impl ForecastModel for AdditiveModel {
    fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn fit(&mut self, training: &[TrainingRow]) -> Result<(), ModelError> {
        if self.fitted.is_some() {
            return Err(ModelError::AlreadyFitted);
        }
        if training.len() < MIN_TRAINING_ROWS {
            return Err(ModelError::TooFewRows {
                required: MIN_TRAINING_ROWS,
                actual: training.len(),
            });
        }
        if let Some(row) = training.iter().find(|row| !row.value.is_finite()) {
            return Err(ModelError::DegenerateInput(format!(
                "non-finite value on {}",
                row.timestamp
            )));
        }

        let start = training[0].timestamp;
        let end = training[training.len() - 1].timestamp;
        let span_days = end.days_since(start) as f64;
        if span_days <= 0.0 {
            return Err(ModelError::DegenerateInput(format!(
                "history must span more than one day, got {start}..{end}"
            )));
        }

        let y_scale = match training.iter().map(|row| row.value.abs()).fold(0.0, f64::max) {
            scale if scale > 0.0 => scale,
            _ => 1.0,
        };
        let y = Array1::from_iter(training.iter().map(|row| row.value / y_scale));
        let t: Vec<f64> = training
            .iter()
            .map(|row| row.timestamp.days_since(start) as f64 / span_days)
            .collect();

        let indices = changepoint_indices(
            training.len(),
            self.config.changepoint_count,
            self.config.changepoint_range,
        );
        let changepoint_t: Vec<f64> = indices.iter().map(|&i| t[i]).collect();
        let changepoints: Vec<CalendarDate> =
            indices.iter().map(|&i| training[i].timestamp).collect();

        let mut seasonalities = Vec::new();
        if self
            .config
            .weekly_seasonality
            .unwrap_or(span_days >= AUTO_WEEKLY_MIN_DAYS)
        {
            seasonalities.push(Seasonality::WEEKLY);
        }
        if self
            .config
            .yearly_seasonality
            .unwrap_or(span_days >= AUTO_YEARLY_MIN_DAYS)
        {
            seasonalities.push(Seasonality::YEARLY);
        }

        let width = 2
            + changepoint_t.len()
            + seasonalities.iter().map(Seasonality::width).sum::<usize>();
        let mut design = Array2::<f64>::zeros((training.len(), width));
        let mut row = Vec::with_capacity(width);
        for (i, observation) in training.iter().enumerate() {
            row.clear();
            row.push(1.0);
            row.push(t[i]);
            extend_hinges(t[i], &changepoint_t, &mut row);
            let days = epoch_days(observation.timestamp);
            for seasonality in &seasonalities {
                seasonality.extend_row(days, &mut row);
            }
            design.row_mut(i).assign(&ArrayView1::from(row.as_slice()));
        }

        let noise_variance = first_difference_variance(&y).max(MIN_NOISE_VARIANCE);
        let mut penalty = Vec::with_capacity(width);
        penalty.extend([noise_variance / BASE_PRIOR_SD.powi(2); 2]);
        penalty.extend(
            std::iter::repeat(noise_variance / self.config.trend_flexibility.powi(2))
                .take(changepoint_t.len()),
        );
        penalty.resize(
            width,
            noise_variance / self.config.seasonality_strength.powi(2),
        );

        let mut normal = design.t().dot(&design);
        for (j, lambda) in penalty.iter().enumerate() {
            normal[[j, j]] += lambda;
        }
        let beta = cholesky_solve(&normal, &design.t().dot(&y))?;
        let deltas = beta.slice(s![2..2 + changepoint_t.len()]).to_vec();

        let residuals = &y - &design.dot(&beta);
        let residual_sd = (residuals.mapv(|r| r * r).sum() / training.len() as f64).sqrt();

        tracing::info!(
            rows = training.len(),
            changepoints = changepoints.len(),
            seasonalities = ?seasonalities.iter().map(|s| s.name).collect::<Vec<_>>(),
            trend_flexibility = self.config.trend_flexibility,
            residual_sd,
            "fitted additive model"
        );
        tracing::debug!(noise_variance, y_scale, "fit scaling");

        self.changepoints = changepoints;
        self.fitted = Some(FittedState {
            start,
            span_days,
            y_scale,
            changepoint_t,
            seasonalities,
            beta,
            deltas,
            residual_sd,
        });
        Ok(())
    }

    fn predict(&self, horizon: &[HorizonRow]) -> Result<ForecastTable, ModelError> {
        let state = self.fitted.as_ref().ok_or(ModelError::NotFitted)?;

        let t: Vec<f64> = horizon
            .iter()
            .map(|row| state.scaled_time(row.timestamp))
            .collect();
        let trend: Vec<f64> = t.iter().map(|&t| state.trend(t)).collect();

        let seasonal_columns: Vec<(&'static str, Vec<f64>)> = state
            .seasonalities
            .iter()
            .enumerate()
            .map(|(index, seasonality)| {
                let values = horizon
                    .iter()
                    .map(|row| state.seasonal(index, epoch_days(row.timestamp)))
                    .collect();
                (seasonality.name, values)
            })
            .collect();
        let additive: Vec<f64> = (0..horizon.len())
            .map(|i| seasonal_columns.iter().map(|(_, values)| values[i]).sum())
            .collect();
        let yhat: Vec<f64> = trend.iter().zip(&additive).map(|(a, b)| a + b).collect();

        let mean_abs_delta = match state.deltas.as_slice() {
            [] => 0.0,
            deltas => deltas.iter().map(|d| d.abs()).sum::<f64>() / deltas.len() as f64,
        };
        let bounds = simulate_bounds(
            SimulationInput {
                t: &t,
                trend: &trend,
                yhat: &yhat,
                changepoint_rate: state.changepoint_t.len() as f64,
                mean_abs_delta,
                noise_sd: state.residual_sd,
            },
            self.config.uncertainty_samples,
            self.config.uncertainty_width,
            self.config.seed,
        )?;

        let scale = |values: Vec<f64>| -> Vec<f64> {
            values.into_iter().map(|v| v * state.y_scale).collect()
        };

        let mut table = ForecastTable::new(horizon.iter().map(|row| row.timestamp).collect())
            .with_column(columns::TREND, scale(trend))?
            .with_column(columns::TREND_LOWER, scale(bounds.trend_lower))?
            .with_column(columns::TREND_UPPER, scale(bounds.trend_upper))?;
        for (name, values) in seasonal_columns {
            table.insert_column(name, scale(values))?;
        }
        table
            .with_column(columns::ADDITIVE_TERMS, scale(additive))?
            .with_column(columns::YHAT, scale(yhat))?
            .with_column(columns::YHAT_LOWER, scale(bounds.yhat_lower))?
            .with_column(columns::YHAT_UPPER, scale(bounds.yhat_upper))
    }

    fn changepoints(&self) -> &[CalendarDate] {
        &self.changepoints
    }
}

/// Half the variance of first differences: the noise variance of a random
/// walk observed with white noise.
fn first_difference_variance(y: &Array1<f64>) -> f64 {
    if y.len() < 3 {
        return 0.0;
    }
    let diffs = &y.slice(s![1..]) - &y.slice(s![..-1]);
    let mean = diffs.mean().unwrap_or(0.0);
    diffs.mapv(|d| (d - mean).powi(2)).sum() / (diffs.len() - 1) as f64 / 2.0
}
