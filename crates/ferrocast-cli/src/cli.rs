//! CLI argument definitions for ferrocast.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `symbols` | List the supported crypto pairs and data sources |
//! | `data` | Column names and latest rows of the raw history |
//! | `forecast` | Fit the model and show the forecast, components and changepoints |
//! | `sweep` | Compare forecasts across trend flexibility settings |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--config` | none | JSON settings file |
//! | `--data-dir` | none | Read `{SYMBOL}.csv` files instead of Yahoo Finance |
//! | `--timeout-ms` | `10000` | Request timeout in ms |
//!
//! # Examples
//!
//! ```bash
//! ferrocast data BTC-USD --tail 10 --pretty
//! ferrocast forecast ETH-USD --years 2 --interval-width 0.9
//! ferrocast sweep BTC-USD --format table
//! ferrocast forecast BTC-USD --data-dir ./history
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Crypto price forecasting from daily history.
#[derive(Debug, Parser)]
#[command(
    name = "ferrocast",
    author,
    version,
    about = "Crypto price forecasting from daily history"
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// JSON settings file (start date, cache TTL, model and sweep configuration).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory of `{SYMBOL}.csv` files used instead of Yahoo Finance.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Request timeout budget in milliseconds.
    #[arg(long, global = true, default_value_t = 10_000)]
    pub timeout_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Table,
    /// Single JSON object output.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the supported crypto pairs.
    Symbols,

    /// Show the column names and latest rows of a symbol's history.
    ///
    ///   ferrocast data BTC-USD
    ///   ferrocast data ETH-USD --tail 20
    Data(DataArgs),

    /// Forecast a symbol's closing price.
    ///
    ///   ferrocast forecast BTC-USD
    ///   ferrocast forecast SOL-USD --years 3 --tail 10
    Forecast(ForecastArgs),

    /// Refit under each configured sweep entry and compare the forecasts.
    ///
    ///   ferrocast sweep BTC-USD --years 2
    Sweep(SweepArgs),
}

#[derive(Debug, Clone, Args)]
pub struct DataArgs {
    /// Ticker, e.g. BTC-USD.
    pub symbol: String,

    /// Number of trailing rows to show.
    #[arg(long, default_value_t = 5)]
    pub tail: usize,
}

#[derive(Debug, Clone, Args)]
pub struct ForecastArgs {
    /// Ticker, e.g. BTC-USD.
    pub symbol: String,

    /// Years of prediction (1 to 5).
    #[arg(long, default_value_t = 1)]
    pub years: u32,

    /// Number of trailing rows to show per table.
    #[arg(long, default_value_t = 5)]
    pub tail: usize,

    /// Probability mass inside the forecast bounds; overrides the settings file.
    #[arg(long)]
    pub interval_width: Option<f64>,
}

#[derive(Debug, Clone, Args)]
pub struct SweepArgs {
    /// Ticker, e.g. BTC-USD.
    pub symbol: String,

    /// Years of prediction (1 to 5).
    #[arg(long, default_value_t = 1)]
    pub years: u32,

    /// Number of trailing forecast rows to show per configuration.
    #[arg(long, default_value_t = 5)]
    pub tail: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_forecast_with_global_flags() {
        let cli = Cli::try_parse_from([
            "ferrocast",
            "forecast",
            "btc-usd",
            "--years",
            "2",
            "--interval-width",
            "0.9",
            "--format",
            "table",
        ])
        .expect("valid arguments");

        assert_eq!(cli.format, OutputFormat::Table);
        assert_eq!(cli.timeout_ms, 10_000);
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast command");
        };
        assert_eq!(args.symbol, "btc-usd");
        assert_eq!(args.years, 2);
        assert_eq!(args.tail, 5);
        assert_eq!(args.interval_width, Some(0.9));
    }

    #[test]
    fn data_dir_switches_source() {
        let cli = Cli::try_parse_from([
            "ferrocast",
            "--data-dir",
            "/tmp/history",
            "data",
            "ETH-USD",
        ])
        .expect("valid arguments");
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/history")));
    }
}
