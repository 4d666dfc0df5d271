//! Fetch-then-compute pipelines behind the two dashboard views.

use crate::domain::comparison::{
    Comparison, RATIO_MA_PERIODS, build_comparison, comparison_fetch_days,
};
use crate::domain::correlation::{
    CORRELATION_FETCH_DAYS, CORRELATION_WINDOWS, CorrelationRow, WindowPolicy,
    compute_correlations, sort_rows,
};
use crate::domain::error::TwcorrError;
use crate::domain::price_cache::PriceCache;
use crate::domain::price_series::PriceSeries;
use crate::domain::universe::{Category, Stock, Universe};
use crate::ports::price_port::{PriceBatch, PriceFetchPort};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Fetches `tickers` through `cache`: hits are served locally, misses are
/// fetched in one batch and stored. Tickers whose request failed are
/// reported in `failed` and never cached, so the next request retries them.
pub async fn fetch_cached(
    fetcher: &dyn PriceFetchPort,
    cache: &Mutex<PriceCache>,
    tickers: &[String],
    lookback_days: u32,
) -> Result<PriceBatch, TwcorrError> {
    let (series, misses) = cache.lock().partition(tickers, lookback_days);
    debug!(
        hits = series.len(),
        misses = misses.len(),
        lookback_days,
        "price cache lookup"
    );

    let mut batch = PriceBatch {
        series,
        failed: BTreeMap::new(),
    };
    if misses.is_empty() {
        return Ok(batch);
    }

    let mut fetched = fetcher.fetch(&misses, lookback_days).await?;

    let mut guard = cache.lock();
    for ticker in &misses {
        if let Some(reason) = fetched.failed.remove(ticker) {
            batch.failed.insert(ticker.clone(), reason);
            continue;
        }
        let s = fetched
            .series
            .remove(ticker)
            .unwrap_or_else(|| PriceSeries::empty(ticker.as_str()));
        guard.insert(lookback_days, s.clone());
        batch.series.insert(ticker.clone(), s);
    }
    Ok(batch)
}

fn upstream_failure(
    fetcher: &dyn PriceFetchPort,
    batch: &PriceBatch,
    ticker: &str,
) -> Result<(), TwcorrError> {
    match batch.failure(ticker) {
        Some(reason) => Err(TwcorrError::upstream(fetcher.name(), reason)),
        None => Ok(()),
    }
}

#[derive(Debug, Clone)]
pub struct CorrelationRequest {
    pub reference: String,
    pub category: Option<Category>,
    /// Candidate cap; `None` or `Some(0)` means the whole selection.
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
pub struct CorrelationOptions {
    pub policy: WindowPolicy,
}

#[derive(Debug, Clone)]
pub struct CorrelationEntry {
    pub rank: usize,
    pub stock: Stock,
    pub row: CorrelationRow,
}

#[derive(Debug, Clone)]
pub struct CorrelationReport {
    pub reference: Stock,
    pub reference_points: usize,
    pub category: Option<Category>,
    pub windows: Vec<usize>,
    pub entries: Vec<CorrelationEntry>,
    /// Candidates without prices: upstream had none or their request failed.
    pub missing: Vec<String>,
}

/// Candidate stocks for the correlation table: the category filter applies,
/// order is by ticker, the limit is applied, then the reference is excluded.
/// A reference inside the first `limit` stocks therefore leaves `limit - 1`
/// candidates.
pub fn select_candidates<'a>(
    universe: &'a Universe,
    reference: &str,
    category: Option<Category>,
    limit: Option<usize>,
) -> Vec<&'a Stock> {
    let selection = universe.by_category(category);
    let take = match limit {
        Some(n) if n > 0 => n,
        _ => selection.len(),
    };
    selection
        .into_iter()
        .take(take)
        .filter(|s| s.ticker != reference)
        .collect()
}

pub async fn correlation_report(
    universe: &Universe,
    fetcher: &dyn PriceFetchPort,
    cache: &Mutex<PriceCache>,
    request: &CorrelationRequest,
    options: CorrelationOptions,
) -> Result<CorrelationReport, TwcorrError> {
    let reference = universe.require(&request.reference)?.clone();
    let candidates = select_candidates(universe, &reference.ticker, request.category, request.limit);

    let mut tickers = Vec::with_capacity(candidates.len() + 1);
    tickers.push(reference.ticker.clone());
    tickers.extend(candidates.iter().map(|s| s.ticker.clone()));

    info!(
        reference = %reference.ticker,
        candidates = candidates.len(),
        provider = fetcher.name(),
        "computing correlation table"
    );

    let mut prices = fetch_cached(fetcher, cache, &tickers, CORRELATION_FETCH_DAYS).await?;
    upstream_failure(fetcher, &prices, &reference.ticker)?;
    // failed candidates stay in the table as undefined rows
    for ticker in prices.failed.keys() {
        prices
            .series
            .entry(ticker.clone())
            .or_insert_with(|| PriceSeries::empty(ticker.as_str()));
    }
    let prices = prices.series;

    let reference_series = prices
        .get(&reference.ticker)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TwcorrError::DataUnavailable {
            ticker: reference.ticker.clone(),
        })?;

    let mut missing = Vec::new();
    let candidate_series: Vec<&PriceSeries> = candidates
        .iter()
        .filter_map(|s| prices.get(&s.ticker))
        .inspect(|s| {
            if s.is_empty() {
                missing.push(s.ticker().to_string());
            }
        })
        .collect();
    if !missing.is_empty() {
        warn!(count = missing.len(), "candidates without price data: {}", missing.join(", "));
    }

    let mut rows = compute_correlations(
        reference_series,
        candidate_series,
        &CORRELATION_WINDOWS,
        options.policy,
    );
    sort_rows(&mut rows, CORRELATION_WINDOWS[0]);

    let entries = rows
        .into_iter()
        .filter_map(|row| universe.get(&row.ticker).cloned().map(|stock| (stock, row)))
        .enumerate()
        .map(|(i, (stock, row))| CorrelationEntry {
            rank: i + 1,
            stock,
            row,
        })
        .collect();

    Ok(CorrelationReport {
        reference,
        reference_points: reference_series.len(),
        category: request.category,
        windows: CORRELATION_WINDOWS.to_vec(),
        entries,
        missing,
    })
}

#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub stock_a: Stock,
    pub stock_b: Stock,
    pub lookback: usize,
    pub comparison: Comparison,
    /// `(period, values aligned with the comparison dates)`, only for periods
    /// the view is long enough to fill.
    pub moving_averages: Vec<(usize, Vec<Option<f64>>)>,
}

pub async fn comparison_report(
    universe: &Universe,
    fetcher: &dyn PriceFetchPort,
    cache: &Mutex<PriceCache>,
    ticker_a: &str,
    ticker_b: &str,
    lookback: usize,
) -> Result<ComparisonReport, TwcorrError> {
    if lookback == 0 {
        return Err(TwcorrError::InvalidInput {
            reason: "lookback must be at least one day".to_string(),
        });
    }
    let (stock_a, stock_b) = universe.require_pair(ticker_a, ticker_b)?;
    let (stock_a, stock_b) = (stock_a.clone(), stock_b.clone());

    info!(a = %stock_a.ticker, b = %stock_b.ticker, lookback, "building comparison");

    let tickers = vec![stock_a.ticker.clone(), stock_b.ticker.clone()];
    let batch = fetch_cached(fetcher, cache, &tickers, comparison_fetch_days(lookback)).await?;
    upstream_failure(fetcher, &batch, &stock_a.ticker)?;
    upstream_failure(fetcher, &batch, &stock_b.ticker)?;
    let prices = batch.series;

    let series_for = |stock: &Stock| {
        prices
            .get(&stock.ticker)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| TwcorrError::DataUnavailable {
                ticker: stock.ticker.clone(),
            })
    };
    let series_a = series_for(&stock_a)?;
    let series_b = series_for(&stock_b)?;

    let comparison = build_comparison(series_a, series_b, lookback)?;
    let moving_averages = RATIO_MA_PERIODS
        .iter()
        .filter_map(|&p| comparison.ratio.moving_average(p).map(|ma| (p, ma)))
        .collect();

    Ok(ComparisonReport {
        stock_a,
        stock_b,
        lookback,
        comparison,
        moving_averages,
    })
}
