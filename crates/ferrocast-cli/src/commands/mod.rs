mod data;
mod forecast;
mod sweep;
mod symbols;

use std::sync::Arc;
use std::time::Instant;

use ferrocast_core::{
    CsvDirectorySource, Envelope, EnvelopeError, EnvelopeMeta, MarketDataSource, ProviderId,
    SeriesCache, SeriesLoader, Settings, Symbol, SystemClock, YahooAdapter,
};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub type DynSource = Box<dyn MarketDataSource>;

pub struct CommandResult {
    pub data: Value,
    pub symbol: Option<Symbol>,
    pub warnings: Vec<String>,
    pub cache_hit: bool,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            symbol: None,
            warnings: Vec::new(),
            cache_hit: false,
        }
    }

    pub fn with_symbol(mut self, symbol: Symbol) -> Self {
        self.symbol = Some(symbol);
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_cache_hit(mut self, cache_hit: bool) -> Self {
        self.cache_hit = cache_hit;
        self
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let started = Instant::now();
    let settings = Settings::load(cli.config.as_deref())?;
    let mut loader = build_loader(cli, &settings);
    let source = loader.source_id();

    let command_result = match &cli.command {
        Command::Symbols => symbols::run()?,
        Command::Data(args) => data::run(args, &mut loader).await?,
        Command::Forecast(args) => forecast::run(args, &settings, &mut loader).await?,
        Command::Sweep(args) => sweep::run(args, &settings, &mut loader).await?,
    };

    let CommandResult {
        data,
        symbol,
        warnings,
        cache_hit,
    } = command_result;

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut meta = EnvelopeMeta::new(
        Uuid::new_v4().to_string(),
        OffsetDateTime::now_utc(),
        source,
        latency_ms,
        cache_hit,
    )?;
    if let Some(symbol) = symbol {
        meta = meta.with_symbol(symbol.as_str());
    }
    for warning in warnings {
        meta.push_warning(warning);
    }

    Ok(Envelope::success(meta, data))
}

/// Envelope reporting `error` in place of command data.
pub fn failure(
    cli: &Cli,
    error: &CliError,
    started: Instant,
) -> Result<Envelope<Value>, CliError> {
    let source = if cli.data_dir.is_some() {
        ProviderId::Csv
    } else {
        ProviderId::Yahoo
    };
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let meta = EnvelopeMeta::new(
        Uuid::new_v4().to_string(),
        OffsetDateTime::now_utc(),
        source,
        latency_ms,
        false,
    )?;

    let mut envelope = Envelope::success(meta, Value::Null);
    envelope.push_error(EnvelopeError::new(error.code(), error.to_string())?)?;
    Ok(envelope)
}

fn build_loader(cli: &Cli, settings: &Settings) -> SeriesLoader<DynSource> {
    let source: DynSource = match &cli.data_dir {
        Some(dir) => Box::new(CsvDirectorySource::new(dir.clone())),
        None => Box::new(YahooAdapter::default().with_timeout_ms(cli.timeout_ms)),
    };
    tracing::debug!(source = %source.id(), start = %settings.start_date, "building loader");

    let cache = SeriesCache::new(settings.cache_policy(), Arc::new(SystemClock));
    SeriesLoader::with_cache(source, cache).with_start(settings.start_date)
}

/// Parses the user's ticker and notes when it is outside the curated list.
pub fn parse_symbol(raw: &str) -> Result<(Symbol, Vec<String>), CliError> {
    let symbol = Symbol::parse(raw)?;
    let mut warnings = Vec::new();
    if !symbol.is_supported_crypto() {
        warnings.push(format!(
            "{symbol} is not one of the supported crypto pairs; results may be meaningless"
        ));
    }
    Ok((symbol, warnings))
}

pub fn source_label(source: ProviderId) -> &'static str {
    match source {
        ProviderId::Yahoo => "Yahoo Finance daily chart",
        ProviderId::Csv => "local CSV directory",
    }
}
