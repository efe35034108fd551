use serde::Serialize;

use ferrocast_core::{
    run_sweep, CalendarDate, ForecastPipeline, ForecastRow, ForecastSelector, SeriesLoader,
    Settings,
};
use ferrocast_model::AdditiveModel;

use crate::cli::SweepArgs;
use crate::error::CliError;

use super::{parse_symbol, CommandResult, DynSource};

#[derive(Debug, Serialize)]
struct SweepEntry<'a> {
    label: &'a str,
    trend_flexibility: f64,
    changepoints: &'a [CalendarDate],
    forecast_tail: &'a [ForecastRow],
}

#[derive(Debug, Serialize)]
struct SweepResponseData<'a> {
    years: u32,
    training_rows: usize,
    horizon_rows: usize,
    results: Vec<SweepEntry<'a>>,
}

pub async fn run(
    args: &SweepArgs,
    settings: &Settings,
    loader: &mut SeriesLoader<DynSource>,
) -> Result<CommandResult, CliError> {
    let (symbol, warnings) = parse_symbol(&args.symbol)?;
    let prepared = ForecastPipeline::prepare(loader, &symbol, args.years).await?;

    let results = run_sweep(
        &prepared.training,
        &prepared.horizon,
        &settings.sweep,
        &ForecastSelector::default(),
        AdditiveModel::from_config,
    )?;

    let entries = results
        .iter()
        .zip(&settings.sweep)
        .map(|(result, entry)| SweepEntry {
            label: &result.label,
            trend_flexibility: entry.config.trend_flexibility,
            changepoints: &result.changepoints,
            forecast_tail: result.forecast.tail(args.tail),
        })
        .collect();

    let data = serde_json::to_value(SweepResponseData {
        years: args.years,
        training_rows: prepared.training.len(),
        horizon_rows: prepared.horizon.len(),
        results: entries,
    })?;

    Ok(CommandResult::ok(data)
        .with_symbol(symbol)
        .with_warnings(warnings)
        .with_cache_hit(prepared.cache_hit))
}
