#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use twcorr::domain::error::TwcorrError;
pub use twcorr::domain::price_series::{PricePoint, PriceSeries};
use twcorr::domain::universe::{Category, Market, Stock, Universe};
use twcorr::ports::price_port::{PriceBatch, PriceFetchPort};

pub struct MockPriceFetcher {
    pub data: HashMap<String, PriceSeries>,
    pub errors: HashMap<String, String>,
    calls: AtomicUsize,
    requested: Mutex<Vec<Vec<String>>>,
}

impl MockPriceFetcher {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.data.insert(series.ticker().to_string(), series);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }

    /// Number of `fetch` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Ticker batches passed to each `fetch` call.
    pub fn requested(&self) -> Vec<Vec<String>> {
        self.requested.lock().clone()
    }
}

#[async_trait]
impl PriceFetchPort for MockPriceFetcher {
    async fn fetch(
        &self,
        tickers: &[String],
        _lookback_days: u32,
    ) -> Result<PriceBatch, TwcorrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().push(tickers.to_vec());

        PriceBatch::from_outcomes(tickers.iter().map(|ticker| {
            let outcome = match self.errors.get(ticker) {
                Some(reason) => Err(TwcorrError::upstream("mock", reason.clone())),
                None => Ok(self
                    .data
                    .get(ticker)
                    .cloned()
                    .unwrap_or_else(|| PriceSeries::empty(ticker.as_str()))),
            };
            (ticker.clone(), outcome)
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// `n` consecutive weekdays starting at `start` (or the next weekday).
pub fn trading_days(start: &str, n: usize) -> Vec<NaiveDate> {
    let mut d = date(start);
    let mut out = Vec::with_capacity(n);
    while out.len() < n {
        if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(d);
        }
        d += Duration::days(1);
    }
    out
}

pub fn series_from(ticker: &str, dates: &[NaiveDate], closes: &[f64]) -> PriceSeries {
    let points = dates
        .iter()
        .zip(closes)
        .map(|(&d, &c)| PricePoint::new(d, c))
        .collect();
    PriceSeries::from_points(ticker, points)
}

/// Oscillating closes around `base`; `phase` shifts the wave so two series
/// can be made to move together or apart.
pub fn wave_series(ticker: &str, start: &str, n: usize, base: f64, phase: f64) -> PriceSeries {
    let dates = trading_days(start, n);
    let closes: Vec<f64> = (0..n)
        .map(|i| {
            let t = i as f64;
            base * (1.0 + 0.05 * (t / 7.0 + phase).sin() + 0.002 * t)
        })
        .collect();
    series_from(ticker, &dates, &closes)
}

pub fn stock(ticker: &str, name: &str, category: Category, market: Market) -> Stock {
    Stock {
        ticker: ticker.to_string(),
        name: name.to_string(),
        category,
        market,
    }
}

pub fn sample_universe() -> Universe {
    Universe::new([
        stock("2303", "聯電", Category::Semiconductor, Market::Twse),
        stock("2330", "台積電", Category::Semiconductor, Market::Twse),
        stock("2382", "廣達", Category::ComputerPeripherals, Market::Twse),
        stock("2454", "聯發科", Category::Semiconductor, Market::Twse),
        stock("3008", "大立光", Category::Optoelectronics, Market::Twse),
        stock("6488", "環球晶", Category::Semiconductor, Market::Tpex),
    ])
}
