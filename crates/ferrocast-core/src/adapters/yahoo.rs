use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;

use super::normalize_daily;
use crate::data_source::{HistoryRequest, MarketDataSource, SourceError};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::{CalendarDate, ObservationSeries, ProviderId, RawObservation};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo Finance daily history over the public chart endpoint.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::default()))
    }
}

impl YahooAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: String::from(DEFAULT_BASE_URL),
            timeout_ms: 10_000,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Chart URL for the request window. `period2` is exclusive, so it points
    /// at midnight after the last requested day.
    pub fn chart_url(&self, req: &HistoryRequest) -> String {
        let period2 = req.end.next_day().unwrap_or(req.end).unix_timestamp();
        format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url,
            urlencoding::encode(req.symbol.as_str()),
            req.start.unix_timestamp(),
            period2
        )
    }

    async fn fetch_history(&self, req: HistoryRequest) -> Result<ObservationSeries, SourceError> {
        let endpoint = self.chart_url(&req);
        tracing::info!(
            symbol = %req.symbol,
            start = %req.start,
            end = %req.end,
            "fetching yahoo daily history"
        );

        let request = HttpRequest::get(endpoint)
            .with_header("referer", "https://finance.yahoo.com/")
            .with_timeout_ms(self.timeout_ms);

        let response = self.http_client.execute(request).await.map_err(|e| {
            SourceError::unavailable(format!("yahoo transport error: {}", e.message()))
        })?;

        if response.status == 404 {
            // Unknown tickers come back as 404 with a chart.error payload.
            return Err(parse_chart(&response.body, &req)
                .err()
                .unwrap_or_else(|| {
                    SourceError::not_found(format!("yahoo does not know '{}'", req.symbol))
                }));
        }

        if !response.is_success() {
            return Err(SourceError::unavailable(format!(
                "yahoo returned status {}",
                response.status
            )));
        }

        parse_chart(&response.body, &req)
    }
}

impl MarketDataSource for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn daily_history<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ObservationSeries, SourceError>> + Send + 'a>> {
        Box::pin(async move { self.fetch_history(req).await })
    }
}

/// Decodes a chart payload into an ascending, one-row-per-day series.
///
/// Rows with a missing OHLC value or inconsistent prices are dropped. When two
/// rows fall on the same UTC day (the live row for the current session), the
/// later one wins.
fn parse_chart(body: &str, req: &HistoryRequest) -> Result<ObservationSeries, SourceError> {
    let chart_response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::internal(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = chart_response.chart.error {
        let message = format!(
            "yahoo chart API error for '{}': {} ({})",
            req.symbol, error.description, error.code
        );
        return Err(if error.code.eq_ignore_ascii_case("not found") {
            SourceError::not_found(message)
        } else {
            SourceError::unavailable(message)
        });
    }

    let result = chart_response
        .chart
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::not_found(format!("no chart data for '{}'", req.symbol)))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut observations: Vec<RawObservation> = Vec::with_capacity(timestamps.len());
    let mut dropped = 0_usize;
    for (i, &ts_value) in timestamps.iter().enumerate() {
        let date = CalendarDate::from_unix_timestamp(ts_value)
            .map_err(|e| SourceError::internal(format!("invalid timestamp: {e}")))?;
        if !req.contains(date) {
            continue;
        }

        let row = match (
            value_at(&quote.open, i),
            value_at(&quote.high, i),
            value_at(&quote.low, i),
            value_at(&quote.close, i),
        ) {
            (Some(open), Some(high), Some(low), Some(close)) => {
                let volume = quote
                    .volume
                    .get(i)
                    .copied()
                    .flatten()
                    .and_then(|v| u64::try_from(v).ok());
                RawObservation::new(date, open, high, low, close, volume).ok()
            }
            _ => None,
        };

        match row {
            Some(row) => observations.push(row),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::warn!(symbol = %req.symbol, dropped, "dropped incomplete yahoo rows");
    }

    let normalized = normalize_daily(observations);

    if normalized.is_empty() {
        return Err(SourceError::not_found(format!(
            "yahoo returned no rows for '{}' between {} and {}",
            req.symbol, req.start, req.end
        )));
    }

    Ok(ObservationSeries::new(req.symbol.clone(), normalized))
}

fn value_at(values: &[Option<f64>], index: usize) -> Option<f64> {
    values.get(index).copied().flatten()
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartIndicators {
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::SourceErrorKind;
    use crate::http_client::{CannedHttpClient, HttpError, HttpResponse};
    use crate::Symbol;

    // 2024-01-01, 2024-01-02, 2024-01-03 (null close), 2024-01-03 live row
    const CHART_BODY: &str = r#"{
        "chart": {
            "result": [{
                "timestamp": [1704067200, 1704153600, 1704240000, 1704279600],
                "indicators": {
                    "quote": [{
                        "open":   [42000.0, 44100.0, 44900.0, 44950.0],
                        "high":   [44200.0, 45500.0, 45500.0, 45600.0],
                        "low":    [41800.0, 44000.0, 42000.0, 42200.0],
                        "close":  [44150.0, 44900.0, null,    42800.0],
                        "volume": [1000, 2000, 3000, 3500]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    const NOT_FOUND_BODY: &str = r#"{
        "chart": {
            "result": null,
            "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
        }
    }"#;

    fn request(symbol: &str) -> HistoryRequest {
        HistoryRequest::new(
            Symbol::parse(symbol).expect("valid symbol"),
            CalendarDate::parse("2015-01-01").expect("valid"),
            CalendarDate::parse("2024-01-03").expect("valid"),
        )
        .expect("valid request")
    }

    #[test]
    fn chart_url_covers_inclusive_window() {
        let adapter = YahooAdapter::with_http_client(
            CannedHttpClient::responding(HttpResponse::ok_json(CHART_BODY)).shared(),
        );
        let url = adapter.chart_url(&request("btc-usd"));

        assert!(url.starts_with("https://query1.finance.yahoo.com/v8/finance/chart/BTC-USD?"));
        assert!(url.contains("period1=1420070400"));
        assert!(url.contains("period2=1704326400"));
        assert!(url.contains("interval=1d"));
    }

    #[test]
    fn parses_rows_drops_incomplete_and_collapses_same_day() {
        let series = parse_chart(CHART_BODY, &request("BTC-USD")).expect("chart parses");

        let dates: Vec<String> = series
            .observations
            .iter()
            .map(|row| row.date.to_string())
            .collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(series.observations[2].close, 42800.0);
        assert_eq!(series.observations[2].volume, Some(3500));
    }

    #[test]
    fn chart_error_maps_to_not_found() {
        let error = parse_chart(NOT_FOUND_BODY, &request("NOPE-USD")).expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::NotFound);
        assert!(error.message().contains("delisted"));
    }

    #[tokio::test]
    async fn unknown_symbol_status_is_not_found() {
        let client =
            CannedHttpClient::responding(HttpResponse::new(404, NOT_FOUND_BODY)).shared();
        let adapter = YahooAdapter::with_http_client(client.clone());

        let error = adapter
            .daily_history(request("NOPE-USD"))
            .await
            .expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::NotFound);
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn transport_failure_is_unavailable() {
        let client = CannedHttpClient::failing(HttpError::new("connection reset")).shared();
        let adapter = YahooAdapter::with_http_client(client);

        let error = adapter
            .daily_history(request("BTC-USD"))
            .await
            .expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
        assert!(error.message().contains("connection reset"));
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let client = CannedHttpClient::responding(HttpResponse::new(503, "")).shared();
        let adapter = YahooAdapter::with_http_client(client);

        let error = adapter
            .daily_history(request("BTC-USD"))
            .await
            .expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
    }
}
