//! Behavior-driven tests for the forecast pipeline
//!
//! These tests drive a request from loading through rendering and check the
//! observable properties of every intermediate table.

use ferrocast_core::{
    build_horizon, to_training_rows, ForecastPipeline, ForecastRequest, ForecastSelector,
    ModelConfig, PipelineError, PipelineStage, Symbol, TrainingRow, MIN_TRAINING_ROWS,
};
use ferrocast_model::{AdditiveModel, DEFAULT_CHANGEPOINT_THRESHOLD};
use ferrocast_tests::{daily_rows, day, loader, synthetic_closes, StubSource};

// =============================================================================
// Pipeline: End-to-end Forecast
// =============================================================================

#[tokio::test]
async fn user_gets_a_one_year_forecast_with_ordered_bounds() {
    // Given: 400 days of BTC-USD history
    let source = StubSource::new()
        .with_series("BTC-USD", daily_rows("2023-01-01", &synthetic_closes(400)));
    let mut loader = loader(source);
    let request = ForecastRequest::new(Symbol::parse("btc-usd").expect("valid"), 1)
        .expect("valid request")
        .with_config(ModelConfig::default().with_uncertainty_width(0.95));

    // When: The pipeline runs with the additive model
    let mut outcome = ForecastPipeline::run(&mut loader, &request, AdditiveModel::from_config)
        .await
        .expect("pipeline succeeds");

    // Then: The horizon is the history plus 365 consecutive days
    let prepared = &outcome.prepared;
    assert_eq!(prepared.training.len(), 400);
    assert_eq!(prepared.horizon.len(), 400 + 365);
    assert_eq!(prepared.horizon[399].timestamp, day("2024-02-04"));
    assert_eq!(prepared.horizon[400].timestamp, day("2024-02-05"));
    assert_eq!(
        prepared.horizon.last().map(|row| row.timestamp),
        Some(day("2025-02-03"))
    );

    // And: Every forecast row keeps lower <= point <= upper, in horizon order
    assert_eq!(outcome.forecast.len(), prepared.horizon.len());
    for (row, horizon) in outcome.forecast.rows().iter().zip(&prepared.horizon) {
        assert_eq!(row.timestamp, horizon.timestamp);
        assert!(
            row.lower_bound <= row.point_estimate,
            "lower bound above estimate on {}",
            row.timestamp
        );
        assert!(
            row.point_estimate <= row.upper_bound,
            "upper bound below estimate on {}",
            row.timestamp
        );
    }

    // And: The upward drift carries into the forecast
    let last_close = prepared.training[399].value;
    let final_estimate = outcome.forecast.tail(1)[0].point_estimate;
    assert!(final_estimate > last_close, "{final_estimate} should exceed {last_close}");

    // And: Weekly seasonality is reported, yearly needs two years of history
    assert!(outcome.components.iter().all(|c| c.weekly.is_some() && c.yearly.is_none()));

    // And: Changepoints sit inside the first 80% of history
    assert_eq!(outcome.changepoints.len(), 25);
    assert!(outcome.changepoints.iter().all(|d| *d <= prepared.training[319].timestamp));
    let significant = outcome.model.significant_changepoints(DEFAULT_CHANGEPOINT_THRESHOLD);
    assert!(significant.iter().all(|d| outcome.changepoints.contains(d)));

    // And: The run can be marked rendered exactly once
    assert_eq!(outcome.stage(), PipelineStage::Forecasted);
    outcome.mark_rendered().expect("first render");
    assert_eq!(outcome.stage(), PipelineStage::Rendered);
    assert!(matches!(
        outcome.mark_rendered(),
        Err(PipelineError::StageOrder { .. })
    ));
}

#[tokio::test]
async fn five_year_forecast_appends_1825_days() {
    let source = StubSource::new()
        .with_series("ETH-USD", daily_rows("2024-01-01", &synthetic_closes(60)));
    let mut loader = loader(source);
    let request = ForecastRequest::new(Symbol::parse("ETH-USD").expect("valid"), 5)
        .expect("valid request")
        .with_config(ModelConfig::default().with_uncertainty_samples(50));

    let outcome = ForecastPipeline::run(&mut loader, &request, AdditiveModel::from_config)
        .await
        .expect("pipeline succeeds");

    assert_eq!(outcome.prepared.horizon.len(), 60 + 1825);
    assert_eq!(outcome.table.len(), outcome.prepared.horizon.len());
}

// =============================================================================
// Pipeline: Failure Surfaces
// =============================================================================

#[tokio::test]
async fn single_observation_is_insufficient_data() {
    // Given: A symbol with exactly one trading day
    let source = StubSource::new()
        .with_series("ADA-USD", daily_rows("2024-01-01", &[100.0]));
    let mut loader = loader(source);
    let request =
        ForecastRequest::new(Symbol::parse("ADA-USD").expect("valid"), 1).expect("valid");

    // When: The user requests a forecast
    let err = ForecastPipeline::run(&mut loader, &request, AdditiveModel::from_config)
        .await
        .expect_err("one row cannot anchor a horizon");

    // Then: The failure names the threshold and the actual row count
    assert!(matches!(
        err,
        PipelineError::InsufficientData {
            required: MIN_TRAINING_ROWS,
            actual: 1
        }
    ));
}

#[tokio::test]
async fn unknown_symbol_is_data_unavailable() {
    let mut loader = loader(StubSource::new());
    let request =
        ForecastRequest::new(Symbol::parse("NOPE-USD").expect("valid"), 1).expect("valid");

    let err = ForecastPipeline::run(&mut loader, &request, AdditiveModel::from_config)
        .await
        .expect_err("nothing to load");

    match err {
        PipelineError::DataUnavailable { symbol, reason } => {
            assert_eq!(symbol, "NOPE-USD");
            assert!(reason.contains("source.not_found"), "reason: {reason}");
        }
        other => panic!("expected DataUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn selector_with_unknown_field_is_schema_mismatch() {
    let source = StubSource::new()
        .with_series("SOL-USD", daily_rows("2024-01-01", &synthetic_closes(30)));
    let mut loader = loader(source);
    let request = ForecastRequest::new(Symbol::parse("SOL-USD").expect("valid"), 1)
        .expect("valid")
        .with_config(ModelConfig::default().with_uncertainty_samples(0))
        .with_selector(ForecastSelector::new("yhat", "yhat_p05", "yhat_upper"));

    let err = ForecastPipeline::run(&mut loader, &request, AdditiveModel::from_config)
        .await
        .expect_err("no such column");

    assert!(
        matches!(err, PipelineError::SchemaMismatch(ref message) if message.contains("yhat_p05"))
    );
}

#[test]
fn years_outside_one_to_five_are_rejected_at_the_request() {
    let symbol = Symbol::parse("BTC-USD").expect("valid");
    assert!(ForecastRequest::new(symbol.clone(), 0).is_err());
    assert!(ForecastRequest::new(symbol.clone(), 6).is_err());
    assert!(ForecastRequest::new(symbol, 5).is_ok());
}

// =============================================================================
// Schema Adapter and Horizon Builder Properties
// =============================================================================

#[test]
fn schema_adapter_preserves_length_order_and_dates() {
    let observations = daily_rows("2024-02-27", &[10.0, 11.0, 12.5, 12.0, 13.0]);

    let training = to_training_rows(&observations).expect("clean input");

    assert_eq!(training.len(), observations.len());
    for (row, observation) in training.iter().zip(&observations) {
        assert_eq!(row.timestamp, observation.date);
        assert_eq!(row.value, observation.close);
    }
    assert!(training.windows(2).all(|pair| pair[0].timestamp < pair[1].timestamp));
}

#[test]
fn empty_history_flows_to_insufficient_data() {
    let training = to_training_rows(&[]).expect("empty is not a schema error");
    assert!(training.is_empty());

    let err = build_horizon(&training, 365).expect_err("nothing to extend");
    assert!(matches!(err, PipelineError::InsufficientData { actual: 0, .. }));
}

#[test]
fn three_rows_and_one_day_make_a_four_day_horizon() {
    let training = vec![
        TrainingRow::new(day("2024-01-01"), 100.0),
        TrainingRow::new(day("2024-01-02"), 101.0),
        TrainingRow::new(day("2024-01-03"), 102.0),
    ];

    let horizon = build_horizon(&training, 1).expect("enough rows");

    let dates: Vec<String> = horizon
        .iter()
        .map(|row| row.timestamp.to_string())
        .collect();
    assert_eq!(dates, vec!["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"]);
}

#[test]
fn horizon_crosses_leap_day_without_gaps() {
    let training = vec![
        TrainingRow::new(day("2024-02-27"), 1.0),
        TrainingRow::new(day("2024-02-28"), 1.0),
    ];

    let horizon = build_horizon(&training, 3).expect("enough rows");

    assert_eq!(horizon.len(), 5);
    assert_eq!(horizon[2].timestamp, day("2024-02-29"));
    assert_eq!(horizon[4].timestamp, day("2024-03-02"));
}
