//! Offline price source: one `<ticker>.csv` file per ticker.

use crate::domain::error::TwcorrError;
use crate::domain::price_series::{PricePoint, PriceSeries};
use crate::ports::price_port::{PriceBatch, PriceFetchPort};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvPriceAdapter {
    base_path: PathBuf,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{ticker}.csv"))
    }

    fn provider(&self) -> String {
        format!("csv:{}", self.base_path.display())
    }

    fn load(&self, ticker: &str, lookback_days: u32) -> Result<PriceSeries, TwcorrError> {
        let path = self.csv_path(ticker);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(ticker, path = %path.display(), "no price file");
                return Ok(PriceSeries::empty(ticker));
            }
            Err(e) => {
                return Err(TwcorrError::upstream(
                    self.provider(),
                    format!("failed to read {}: {e}", path.display()),
                ));
            }
        };

        let points = parse_price_csv(&content).map_err(|reason| {
            TwcorrError::upstream(self.provider(), format!("{}: {reason}", path.display()))
        })?;
        let series = PriceSeries::from_points(ticker, points);
        Ok(trim_to_lookback(series, lookback_days))
    }
}

/// Parses a CSV with `date` (`%Y-%m-%d`) and `close` header columns. Other
/// columns are ignored.
pub fn parse_price_csv(content: &str) -> Result<Vec<PricePoint>, String> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = rdr.headers().map_err(|e| format!("CSV header error: {e}"))?;
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("missing {name} column"))
    };
    let date_idx = column("date")?;
    let close_idx = column("close")?;

    let mut points = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| format!("CSV parse error: {e}"))?;

        let date_str = record.get(date_idx).ok_or("missing date value")?;
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|e| format!("invalid date {date_str:?}: {e}"))?;

        let close_str = record.get(close_idx).ok_or("missing close value")?;
        if close_str.is_empty() {
            continue;
        }
        let close: f64 = close_str
            .parse()
            .map_err(|e| format!("invalid close value {close_str:?}: {e}"))?;

        points.push(PricePoint::new(date, close));
    }
    Ok(points)
}

/// Keeps the points within `lookback_days` calendar days of the newest date.
fn trim_to_lookback(series: PriceSeries, lookback_days: u32) -> PriceSeries {
    let Some(last) = series.last_date() else {
        return series;
    };
    let cutoff = last - Duration::days(i64::from(lookback_days));
    let kept = series
        .points()
        .iter()
        .filter(|p| p.date > cutoff)
        .copied()
        .collect();
    PriceSeries::from_points(series.ticker(), kept)
}

#[async_trait]
impl PriceFetchPort for CsvPriceAdapter {
    async fn fetch(
        &self,
        tickers: &[String],
        lookback_days: u32,
    ) -> Result<PriceBatch, TwcorrError> {
        PriceBatch::from_outcomes(
            tickers
                .iter()
                .map(|t| (t.clone(), self.load(t, lookback_days))),
        )
    }

    fn name(&self) -> &str {
        "csv"
    }
}
