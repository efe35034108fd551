//! Parameter sweep: the same training data fitted under several named
//! configurations, each on its own model instance.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::forecast::{ForecastFrame, ForecastSelector};
use crate::model::{ForecastModel, ModelConfig};
use crate::{CalendarDate, HorizonRow, ModelError, PipelineError, TrainingRow, ValidationError};

/// One labeled configuration of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub label: String,
    pub config: ModelConfig,
}

impl SweepConfig {
    pub fn new(label: impl Into<String>, config: ModelConfig) -> Self {
        Self {
            label: label.into(),
            config,
        }
    }
}

/// Forecast produced for one sweep entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    pub label: String,
    pub forecast: ForecastFrame,
    pub changepoints: Vec<CalendarDate>,
}

/// A flexible and a stiff trend, everything else at model defaults.
pub fn default_flexibility_sweep() -> Vec<SweepConfig> {
    vec![
        SweepConfig::new(
            "high-flexibility",
            ModelConfig::default().with_trend_flexibility(0.08),
        ),
        SweepConfig::new(
            "low-flexibility",
            ModelConfig::default().with_trend_flexibility(0.001),
        ),
    ]
}

/// Rejects an empty list, duplicate labels and invalid configurations.
pub fn validate_sweep(configs: &[SweepConfig]) -> Result<(), ValidationError> {
    if configs.is_empty() {
        return Err(ValidationError::EmptySweep);
    }

    let mut seen = HashSet::with_capacity(configs.len());
    for entry in configs {
        if !seen.insert(entry.label.as_str()) {
            return Err(ValidationError::DuplicateSweepLabel {
                label: entry.label.clone(),
            });
        }
        entry.config.validate()?;
    }
    Ok(())
}

/// Runs fit, predict and select once per configuration, in list order.
///
/// `factory` builds a fresh model for every entry; no model instance is
/// reused across configurations.
pub fn run_sweep<M, F>(
    training: &[TrainingRow],
    horizon: &[HorizonRow],
    configs: &[SweepConfig],
    selector: &ForecastSelector,
    factory: F,
) -> Result<Vec<SweepResult>, PipelineError>
where
    M: ForecastModel,
    F: Fn(&ModelConfig) -> Result<M, ModelError>,
{
    validate_sweep(configs)?;

    configs
        .iter()
        .map(|entry| {
            tracing::info!(label = %entry.label, "sweep fit");
            let mut model = factory(&entry.config)?;
            model.fit(training)?;
            let table = model.predict(horizon)?;
            if table.len() != horizon.len() {
                return Err(PipelineError::schema_mismatch(format!(
                    "sweep '{}' produced {} rows for a {}-row horizon",
                    entry.label,
                    table.len(),
                    horizon.len()
                )));
            }

            Ok(SweepResult {
                label: entry.label.clone(),
                forecast: selector.select(&table)?,
                changepoints: model.changepoints().to_vec(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ForecastTable;

    /// Predicts `last value + flexibility` everywhere.
    struct FlatModel {
        config: ModelConfig,
        level: Option<f64>,
    }

    impl ForecastModel for FlatModel {
        fn config(&self) -> &ModelConfig {
            &self.config
        }

        fn fit(&mut self, training: &[TrainingRow]) -> Result<(), ModelError> {
            if self.level.is_some() {
                return Err(ModelError::AlreadyFitted);
            }
            let last = training.last().ok_or(ModelError::TooFewRows {
                required: 1,
                actual: 0,
            })?;
            self.level = Some(last.value + self.config.trend_flexibility);
            Ok(())
        }

        fn predict(&self, horizon: &[HorizonRow]) -> Result<ForecastTable, ModelError> {
            let level = self.level.ok_or(ModelError::NotFitted)?;
            let n = horizon.len();
            ForecastTable::new(horizon.iter().map(|row| row.timestamp).collect())
                .with_column("trend", vec![level; n])?
                .with_column("yhat", vec![level; n])?
                .with_column("yhat_lower", vec![level - 1.0; n])?
                .with_column("yhat_upper", vec![level + 1.0; n])
        }

        fn changepoints(&self) -> &[CalendarDate] {
            &[]
        }
    }

    fn flat(config: &ModelConfig) -> Result<FlatModel, ModelError> {
        Ok(FlatModel {
            config: config.clone(),
            level: None,
        })
    }

    fn inputs() -> (Vec<TrainingRow>, Vec<HorizonRow>) {
        let days: Vec<CalendarDate> = ["2024-01-01", "2024-01-02", "2024-01-03"]
            .iter()
            .map(|d| CalendarDate::parse(d).expect("valid"))
            .collect();
        let training = days.iter().map(|d| TrainingRow::new(*d, 10.0)).collect();
        let horizon = days.iter().map(|d| HorizonRow::new(*d)).collect();
        (training, horizon)
    }

    #[test]
    fn results_follow_configuration_order() {
        let (training, horizon) = inputs();
        let results = run_sweep(
            &training,
            &horizon,
            &default_flexibility_sweep(),
            &ForecastSelector::default(),
            flat,
        )
        .expect("sweep runs");

        let labels: Vec<&str> = results.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["high-flexibility", "low-flexibility"]);
        assert!((results[0].forecast.rows()[0].point_estimate - 10.08).abs() < 1e-9);
        assert!((results[1].forecast.rows()[0].point_estimate - 10.001).abs() < 1e-9);
    }

    #[test]
    fn rejects_empty_and_duplicate_labels() {
        assert_eq!(validate_sweep(&[]), Err(ValidationError::EmptySweep));

        let twice = vec![
            SweepConfig::new("a", ModelConfig::default()),
            SweepConfig::new("a", ModelConfig::default()),
        ];
        assert!(matches!(
            validate_sweep(&twice),
            Err(ValidationError::DuplicateSweepLabel { .. })
        ));
    }
}
