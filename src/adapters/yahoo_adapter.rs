//! Yahoo Finance v8 chart API price source.
//!
//! One request per ticker, fanned out with a bounded number in flight. Tickers
//! are suffixed with their exchange (`.TW` for TWSE, `.TWO` for TPEx).
//! Unknown symbols come back as empty series rather than errors, and a failed
//! request only drops its own ticker from the batch.

use crate::domain::error::TwcorrError;
use crate::domain::price_series::{PricePoint, PriceSeries};
use crate::domain::settings::YahooSettings;
use crate::domain::universe::Market;
use crate::ports::price_port::{PriceBatch, PriceFetchPort};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

const PROVIDER: &str = "yahoo";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    adjclose: Option<Vec<Option<f64>>>,
}

/// Parses a chart API body into a series for `ticker`. A "Not Found" chart
/// error or an empty result yields an empty series.
pub fn parse_chart_response(ticker: &str, body: &str) -> Result<PriceSeries, TwcorrError> {
    let response: ChartResponse = serde_json::from_str(body).map_err(|e| {
        TwcorrError::upstream(PROVIDER, format!("invalid chart response for {ticker}: {e}"))
    })?;

    if let Some(error) = response.chart.error {
        if error.code.eq_ignore_ascii_case("Not Found") {
            return Ok(PriceSeries::empty(ticker));
        }
        return Err(TwcorrError::upstream(
            PROVIDER,
            format!("{ticker}: {} - {}", error.code, error.description),
        ));
    }

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(PriceSeries::empty(ticker));
    };

    let timestamps = result.timestamp.unwrap_or_default();
    let adjusted = result
        .indicators
        .adjclose
        .and_then(|a| a.into_iter().next())
        .and_then(|a| a.adjclose);
    let closes = adjusted
        .or_else(|| {
            result
                .indicators
                .quote
                .into_iter()
                .next()
                .and_then(|q| q.close)
        })
        .unwrap_or_default();

    let offset = result.meta.gmtoffset;
    let points = timestamps
        .iter()
        .zip(closes)
        .filter_map(|(&ts, close)| {
            let date = DateTime::from_timestamp(ts + offset, 0)?.date_naive();
            Some(PricePoint::new(date, close?))
        })
        .collect();

    Ok(PriceSeries::from_points(ticker, points))
}

pub struct YahooAdapter {
    client: Client,
    base_url: String,
    max_concurrency: usize,
    markets: HashMap<String, Market>,
}

impl YahooAdapter {
    /// `markets` maps tickers to their listing exchange; tickers not in it are
    /// treated as TWSE listings.
    pub fn from_settings(
        settings: &YahooSettings,
        markets: HashMap<String, Market>,
    ) -> Result<Self, TwcorrError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(std::time::Duration::from_secs_f64(settings.timeout_secs))
            .build()
            .map_err(|e| TwcorrError::upstream(PROVIDER, format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            max_concurrency: settings.max_concurrency.max(1),
            markets,
        })
    }

    pub fn symbol(&self, ticker: &str) -> String {
        let market = self.markets.get(ticker).copied().unwrap_or_default();
        format!("{ticker}{}", market.yahoo_suffix())
    }

    async fn fetch_one(
        &self,
        ticker: &str,
        period1: i64,
        period2: i64,
    ) -> Result<PriceSeries, TwcorrError> {
        let symbol = self.symbol(ticker);
        let url = format!("{}/v8/finance/chart/{symbol}", self.base_url);
        debug!(%symbol, period1, period2, "requesting chart");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .await
            .map_err(|e| TwcorrError::upstream(PROVIDER, format!("{symbol}: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!(%symbol, "symbol not found upstream");
            return Ok(PriceSeries::empty(ticker));
        }
        if !status.is_success() {
            return Err(TwcorrError::upstream(
                PROVIDER,
                format!("{symbol}: HTTP {status}"),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TwcorrError::upstream(PROVIDER, format!("{symbol}: {e}")))?;
        let series = parse_chart_response(ticker, &body)?;
        debug!(%symbol, points = series.len(), "chart parsed");
        Ok(series)
    }
}

#[async_trait]
impl PriceFetchPort for YahooAdapter {
    async fn fetch(
        &self,
        tickers: &[String],
        lookback_days: u32,
    ) -> Result<PriceBatch, TwcorrError> {
        let now = Utc::now();
        let period1 = (now - Duration::days(i64::from(lookback_days))).timestamp();
        let period2 = now.timestamp();

        info!(tickers = tickers.len(), lookback_days, "fetching prices from Yahoo");

        let outcomes: Vec<(String, Result<PriceSeries, TwcorrError>)> =
            stream::iter(tickers.iter().cloned())
                .map(|ticker| async move {
                    let outcome = self.fetch_one(&ticker, period1, period2).await;
                    (ticker, outcome)
                })
                .buffer_unordered(self.max_concurrency)
                .collect()
                .await;

        let batch = PriceBatch::from_outcomes(outcomes)?;
        if !batch.failed.is_empty() {
            warn!(
                failed = batch.failed.len(),
                succeeded = batch.series.len(),
                "some Yahoo requests failed"
            );
        }
        Ok(batch)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
