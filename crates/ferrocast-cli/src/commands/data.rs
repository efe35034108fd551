use serde::Serialize;

use ferrocast_core::{CalendarDate, RawObservation, SeriesLoader};

use crate::cli::DataArgs;
use crate::error::CliError;

use super::{parse_symbol, CommandResult, DynSource};

#[derive(Debug, Serialize)]
struct DataResponseData<'a> {
    columns: &'static [&'static str],
    rows: usize,
    first_date: Option<CalendarDate>,
    last_date: Option<CalendarDate>,
    tail: &'a [RawObservation],
}

pub async fn run(
    args: &DataArgs,
    loader: &mut SeriesLoader<DynSource>,
) -> Result<CommandResult, CliError> {
    let (symbol, warnings) = parse_symbol(&args.symbol)?;
    let loaded = loader.load(&symbol).await?;
    let series = &loaded.series;

    let data = serde_json::to_value(DataResponseData {
        columns: series.columns(),
        rows: series.len(),
        first_date: series.first_date(),
        last_date: series.last_date(),
        tail: series.tail(args.tail),
    })?;

    Ok(CommandResult::ok(data)
        .with_symbol(symbol)
        .with_warnings(warnings)
        .with_cache_hit(loaded.cache_hit))
}
