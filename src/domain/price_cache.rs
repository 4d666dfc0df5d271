//! Session-scoped cache of fetched price series.
//!
//! Keyed by ticker and lookback; one instance lives for one browser session
//! and is dropped when the session expires or is cleared.

use crate::domain::price_series::PriceSeries;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub ticker: String,
    pub lookback_days: u32,
}

impl CacheKey {
    pub fn new(ticker: impl Into<String>, lookback_days: u32) -> Self {
        Self {
            ticker: ticker.into(),
            lookback_days,
        }
    }
}

#[derive(Debug, Default)]
pub struct PriceCache {
    entries: HashMap<CacheKey, PriceSeries>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, ticker: &str, lookback_days: u32) -> Option<&PriceSeries> {
        self.entries.get(&CacheKey::new(ticker, lookback_days))
    }

    /// Empty series are stored as well: "no upstream data" is a result.
    pub fn insert(&mut self, lookback_days: u32, series: PriceSeries) {
        self.entries
            .insert(CacheKey::new(series.ticker(), lookback_days), series);
    }

    /// Splits `tickers` into cached series and tickers still to fetch.
    pub fn partition(
        &self,
        tickers: &[String],
        lookback_days: u32,
    ) -> (BTreeMap<String, PriceSeries>, Vec<String>) {
        let mut hits = BTreeMap::new();
        let mut misses = Vec::new();
        for ticker in tickers {
            match self.get(ticker, lookback_days) {
                Some(series) => {
                    hits.insert(ticker.clone(), series.clone());
                }
                None if !misses.contains(ticker) => misses.push(ticker.clone()),
                None => {}
            }
        }
        (hits, misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
