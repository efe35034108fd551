use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::pin::Pin;

use serde::Deserialize;

use super::normalize_daily;
use crate::data_source::{HistoryRequest, MarketDataSource, SourceError};
use crate::{CalendarDate, ObservationSeries, ProviderId, RawObservation};

/// Offline source reading `{dir}/{SYMBOL}.csv` files in the common
/// `Date,Open,High,Low,Close,Adj Close,Volume` download layout.
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    dir: PathBuf,
}

impl CsvDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, req: &HistoryRequest) -> PathBuf {
        self.dir.join(format!("{}.csv", req.symbol.as_str()))
    }

    async fn read_history(&self, req: HistoryRequest) -> Result<ObservationSeries, SourceError> {
        let path = self.path_for(&req);
        tracing::info!(symbol = %req.symbol, path = %path.display(), "reading csv daily history");

        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                SourceError::not_found(format!("no csv file for '{}'", req.symbol))
            } else {
                SourceError::unavailable(format!("failed to read {}: {e}", path.display()))
            }
        })?;

        parse_csv(&bytes, &req)
    }
}

impl MarketDataSource for CsvDirectorySource {
    fn id(&self) -> ProviderId {
        ProviderId::Csv
    }

    fn daily_history<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ObservationSeries, SourceError>> + Send + 'a>> {
        Box::pin(async move { self.read_history(req).await })
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: Option<f64>,
    #[serde(rename = "High")]
    high: Option<f64>,
    #[serde(rename = "Low")]
    low: Option<f64>,
    #[serde(rename = "Close")]
    close: Option<f64>,
    #[serde(rename = "Volume", default)]
    volume: Option<f64>,
}

fn parse_csv(bytes: &[u8], req: &HistoryRequest) -> Result<ObservationSeries, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| SourceError::internal(format!("unreadable csv header: {e}")))?;
    if !headers.iter().any(|h| h == "Date") || !headers.iter().any(|h| h == "Close") {
        return Err(SourceError::internal(
            "csv header must contain at least Date and Close columns",
        ));
    }

    // (raw timestamp, row) so intraday rows of one day keep their order.
    let mut stamped: Vec<(String, RawObservation)> = Vec::new();
    let mut dropped = 0_usize;
    for record in reader.deserialize::<CsvRow>() {
        let Ok(row) = record else {
            dropped += 1;
            continue;
        };
        // Timestamps such as "2024-01-01 00:00:00+00:00" keep only the day.
        let day = row.date.get(..10).unwrap_or(&row.date);
        let Ok(date) = CalendarDate::parse(day) else {
            dropped += 1;
            continue;
        };
        if !req.contains(date) {
            continue;
        }
        let parsed = match (row.open, row.high, row.low, row.close) {
            (Some(open), Some(high), Some(low), Some(close)) => RawObservation::new(
                date,
                open,
                high,
                low,
                close,
                row.volume.filter(|v| *v >= 0.0).map(|v| v.round() as u64),
            )
            .ok(),
            _ => None,
        };
        match parsed {
            Some(observation) => stamped.push((row.date, observation)),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::warn!(symbol = %req.symbol, dropped, "dropped unreadable csv rows");
    }

    stamped.sort_by(|a, b| a.0.cmp(&b.0));
    let observations = normalize_daily(stamped.into_iter().map(|(_, row)| row).collect());

    if observations.is_empty() {
        return Err(SourceError::not_found(format!(
            "csv file for '{}' has no rows between {} and {}",
            req.symbol, req.start, req.end
        )));
    }

    Ok(ObservationSeries::new(req.symbol.clone(), observations))
}
