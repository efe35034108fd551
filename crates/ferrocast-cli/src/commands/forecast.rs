use serde::Serialize;

use ferrocast_core::{
    period_days_for_years, tail, CalendarDate, ComponentRow, ForecastPipeline, ForecastRequest,
    ForecastRow, SeriesLoader, Settings, TrainingRow,
};
use ferrocast_model::{AdditiveModel, DEFAULT_CHANGEPOINT_THRESHOLD};

use crate::cli::ForecastArgs;
use crate::error::CliError;

use super::{parse_symbol, CommandResult, DynSource};

#[derive(Debug, Serialize)]
struct ForecastResponseData<'a> {
    years: u32,
    period_days: u32,
    interval_width: f64,
    training_rows: usize,
    horizon_rows: usize,
    seasonalities: Vec<&'static str>,
    forecast_columns: Vec<&'a str>,
    training_tail: &'a [TrainingRow],
    forecast_tail: &'a [ForecastRow],
    components_tail: &'a [ComponentRow],
    changepoints: &'a [CalendarDate],
    significant_changepoints: Vec<CalendarDate>,
}

pub async fn run(
    args: &ForecastArgs,
    settings: &Settings,
    loader: &mut SeriesLoader<DynSource>,
) -> Result<CommandResult, CliError> {
    let (symbol, warnings) = parse_symbol(&args.symbol)?;

    let mut config = settings.model.clone();
    if let Some(width) = args.interval_width {
        config.uncertainty_width = width;
    }
    let request = ForecastRequest::new(symbol.clone(), args.years)?.with_config(config);

    let mut outcome =
        ForecastPipeline::run(loader, &request, AdditiveModel::from_config).await?;

    let data = serde_json::to_value(ForecastResponseData {
        years: request.years,
        period_days: period_days_for_years(request.years),
        interval_width: request.config.uncertainty_width,
        training_rows: outcome.prepared.training.len(),
        horizon_rows: outcome.prepared.horizon.len(),
        seasonalities: outcome.model.seasonalities(),
        forecast_columns: outcome.table.column_names(),
        training_tail: tail(&outcome.prepared.training, args.tail),
        forecast_tail: outcome.forecast.tail(args.tail),
        components_tail: tail(&outcome.components, args.tail),
        changepoints: &outcome.changepoints,
        significant_changepoints: outcome
            .model
            .significant_changepoints(DEFAULT_CHANGEPOINT_THRESHOLD),
    })?;
    let cache_hit = outcome.prepared.cache_hit;
    outcome.mark_rendered()?;

    Ok(CommandResult::ok(data)
        .with_symbol(symbol)
        .with_warnings(warnings)
        .with_cache_hit(cache_hit))
}
