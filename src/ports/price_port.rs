//! Market-data access port.

use crate::domain::error::TwcorrError;
use crate::domain::price_series::PriceSeries;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::warn;

/// Result of one batch fetch.
///
/// A ticker appears in exactly one of the two maps. A ticker whose request
/// succeeded without data maps to an empty series.
#[derive(Debug, Default)]
pub struct PriceBatch {
    pub series: BTreeMap<String, PriceSeries>,
    /// Tickers whose request failed, with the reason.
    pub failed: BTreeMap<String, String>,
}

impl PriceBatch {
    /// Collects per-ticker outcomes. Fails with the first error only when
    /// every request failed.
    pub fn from_outcomes<I>(outcomes: I) -> Result<Self, TwcorrError>
    where
        I: IntoIterator<Item = (String, Result<PriceSeries, TwcorrError>)>,
    {
        let mut batch = PriceBatch::default();
        let mut first_error = None;
        for (ticker, outcome) in outcomes {
            match outcome {
                Ok(series) => {
                    batch.series.insert(ticker, series);
                }
                Err(e) => {
                    warn!(%ticker, error = %e, "price fetch failed");
                    batch.failed.insert(ticker, reason_of(&e));
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) if batch.series.is_empty() => Err(e),
            _ => Ok(batch),
        }
    }

    pub fn failure(&self, ticker: &str) -> Option<&str> {
        self.failed.get(ticker).map(String::as_str)
    }
}

fn reason_of(error: &TwcorrError) -> String {
    match error {
        TwcorrError::UpstreamFetch { reason, .. } => reason.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
pub trait PriceFetchPort: Send + Sync {
    /// Daily closes for each ticker over the last `lookback_days` calendar
    /// days. One failing ticker lands in [`PriceBatch::failed`] and leaves
    /// the rest of the batch intact; the call itself fails only when every
    /// requested ticker failed.
    async fn fetch(&self, tickers: &[String], lookback_days: u32)
    -> Result<PriceBatch, TwcorrError>;

    /// Provider name used in logs and error messages.
    fn name(&self) -> &str;
}
