use std::sync::Arc;

use ferrocast_core::{
    CannedHttpClient, CsvDirectorySource, ForecastPipeline, ForecastRequest, HistoryRequest,
    HttpError, HttpResponse, MarketDataSource, ModelConfig, PipelineError, ProviderId,
    SourceErrorKind, Symbol, YahooAdapter,
};
use ferrocast_model::AdditiveModel;
use ferrocast_tests::{day, loader, synthetic_closes, yahoo_chart_body};

/// Midnight UTC of 2024-01-01.
const JAN_1_2024: i64 = 1_704_067_200;
const DAY_SECS: i64 = 86_400;

struct SourceCase {
    id: ProviderId,
    source: Arc<dyn MarketDataSource>,
    // Held so the CSV directory outlives the case.
    _dir: Option<tempfile::TempDir>,
}

fn chart_rows(days: usize) -> Vec<(i64, f64)> {
    synthetic_closes(days)
        .into_iter()
        .enumerate()
        .map(|(i, close)| (JAN_1_2024 + i as i64 * DAY_SECS, close))
        .collect()
}

fn yahoo_with(response: HttpResponse) -> (YahooAdapter, Arc<CannedHttpClient>) {
    let client = CannedHttpClient::responding(response).shared();
    (YahooAdapter::with_http_client(client.clone()), client)
}

fn source_cases() -> Vec<SourceCase> {
    let (yahoo, _) = yahoo_with(HttpResponse::ok_json(yahoo_chart_body(&chart_rows(40))));

    let dir = tempfile::tempdir().expect("tempdir");
    let mut body = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
    for (i, close) in synthetic_closes(40).into_iter().enumerate() {
        let date = day("2024-01-01")
            .checked_add_days(i as i64)
            .expect("in range");
        body.push_str(&format!("{date},{close},{close},{close},{close},{close},500\n"));
    }
    std::fs::write(dir.path().join("BTC-USD.csv"), body).expect("write csv");

    vec![
        SourceCase {
            id: ProviderId::Yahoo,
            source: Arc::new(yahoo),
            _dir: None,
        },
        SourceCase {
            id: ProviderId::Csv,
            source: Arc::new(CsvDirectorySource::new(dir.path())),
            _dir: Some(dir),
        },
    ]
}

fn btc_request(start: &str, end: &str) -> HistoryRequest {
    HistoryRequest::new(
        Symbol::parse("BTC-USD").expect("valid symbol"),
        day(start),
        day(end),
    )
    .expect("valid window")
}

#[tokio::test]
async fn every_source_returns_ascending_unique_days_inside_the_window() {
    let request = btc_request("2024-01-05", "2024-01-20");

    for case in source_cases() {
        assert_eq!(case.source.id(), case.id);
        let series = case
            .source
            .daily_history(request.clone())
            .await
            .unwrap_or_else(|error| panic!("source '{}' failed: {error}", case.id));

        assert_eq!(series.symbol, request.symbol, "source '{}': symbol", case.id);
        assert_eq!(series.len(), 16, "source '{}': row count", case.id);
        assert_eq!(
            series.first_date(),
            Some(day("2024-01-05")),
            "source '{}'",
            case.id
        );
        assert_eq!(
            series.last_date(),
            Some(day("2024-01-20")),
            "source '{}'",
            case.id
        );
        assert!(
            series
                .observations
                .windows(2)
                .all(|pair| pair[0].date < pair[1].date),
            "source '{}': dates must be strictly ascending",
            case.id
        );
        assert!(
            series.observations.iter().all(|row| row.close.is_finite()),
            "source '{}': closes must be finite",
            case.id
        );
    }
}

#[tokio::test]
async fn yahoo_request_targets_the_chart_endpoint_for_the_window() {
    let (yahoo, client) = yahoo_with(HttpResponse::ok_json(yahoo_chart_body(&chart_rows(5))));
    let yahoo = yahoo.with_base_url("https://charts.test/");

    yahoo
        .daily_history(btc_request("2024-01-01", "2024-01-05"))
        .await
        .expect("canned payload parses");

    let requests = client.recorded_requests();
    assert_eq!(requests.len(), 1);
    let url = &requests[0].url;
    assert!(
        url.starts_with("https://charts.test/v8/finance/chart/BTC-USD?"),
        "url: {url}"
    );
    assert!(url.contains(&format!("period1={JAN_1_2024}")), "url: {url}");
    let period2 = JAN_1_2024 + 5 * DAY_SECS;
    assert!(url.contains(&format!("period2={period2}")), "url: {url}");
    assert!(url.contains("interval=1d"), "url: {url}");
}

#[tokio::test]
async fn yahoo_live_row_replaces_the_same_day_close() {
    // The current session shows up as a second timestamp on the last day.
    let mut rows = chart_rows(3);
    rows.push((JAN_1_2024 + 2 * DAY_SECS + 15 * 3_600, 999.0));
    let (yahoo, _) = yahoo_with(HttpResponse::ok_json(yahoo_chart_body(&rows)));

    let series = yahoo
        .daily_history(btc_request("2024-01-01", "2024-01-03"))
        .await
        .expect("parses");

    assert_eq!(series.len(), 3);
    assert_eq!(series.observations[2].close, 999.0);
}

#[tokio::test]
async fn yahoo_unknown_symbol_maps_to_not_found() {
    let body = r#"{"chart":{"result":null,"error":{
        "code":"Not Found",
        "description":"No data found, symbol may be delisted"
    }}}"#;
    let (yahoo, _) = yahoo_with(HttpResponse::new(404, body));

    let error = yahoo
        .daily_history(btc_request("2024-01-01", "2024-01-05"))
        .await
        .expect_err("404");

    assert_eq!(error.kind(), SourceErrorKind::NotFound);
    assert!(error.message().contains("delisted"));
}

#[tokio::test]
async fn yahoo_transport_failure_stops_the_pipeline_with_data_unavailable() {
    let client = CannedHttpClient::failing(HttpError::new("dns lookup failed")).shared();
    let mut loader = loader(YahooAdapter::with_http_client(client.clone()));
    let request =
        ForecastRequest::new(Symbol::parse("BTC-USD").expect("valid"), 1).expect("valid");

    let error = ForecastPipeline::run(&mut loader, &request, AdditiveModel::from_config)
        .await
        .expect_err("transport down");

    assert!(matches!(error, PipelineError::DataUnavailable { .. }));
    assert!(error.to_string().contains("dns lookup failed"));
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn yahoo_history_runs_through_the_pipeline() {
    let (yahoo, client) = yahoo_with(HttpResponse::ok_json(yahoo_chart_body(&chart_rows(90))));
    let mut loader = loader(yahoo);
    let request = ForecastRequest::new(Symbol::parse("BTC-USD").expect("valid"), 1)
        .expect("valid")
        .with_config(ModelConfig::default().with_uncertainty_samples(100));

    let first = ForecastPipeline::run(&mut loader, &request, AdditiveModel::from_config)
        .await
        .expect("pipeline succeeds");
    let second = ForecastPipeline::run(&mut loader, &request, AdditiveModel::from_config)
        .await
        .expect("pipeline succeeds from cache");

    assert_eq!(first.forecast.len(), 90 + 365);
    assert!(second.prepared.cache_hit);
    assert_eq!(client.call_count(), 1);
    assert_eq!(first.forecast, second.forecast);
}
