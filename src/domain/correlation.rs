//! Rolling-window Pearson correlation against a reference series.
//!
//! Each window is cut independently from the tail of the date-intersection of
//! the reference and the candidate, so trading halts on either side shift the
//! window instead of misaligning it.

use crate::domain::alignment::align;
use crate::domain::price_series::PriceSeries;
use std::cmp::Ordering;

/// Windows shown in the single-stock correlation table, in trading days.
pub const CORRELATION_WINDOWS: [usize; 3] = [120, 60, 30];

/// Calendar days fetched for the correlation table; covers 120 trading days.
pub const CORRELATION_FETCH_DAYS: u32 = 210;

/// How to treat a window longer than the available overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowPolicy {
    /// Use every common date when fewer than the window length exist.
    Partial,
    /// Undefined unless the full window length of common dates exists.
    #[default]
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowCorrelation {
    pub window: usize,
    /// Common dates that went into the coefficient.
    pub observations: usize,
    /// `None` when undefined: fewer than 2 observations or zero variance.
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationRow {
    pub ticker: String,
    /// Size of the full date-intersection with the reference.
    pub overlap: usize,
    pub correlations: Vec<WindowCorrelation>,
}

impl CorrelationRow {
    pub fn value(&self, window: usize) -> Option<f64> {
        self.correlations
            .iter()
            .find(|c| c.window == window)
            .and_then(|c| c.value)
    }

    pub fn is_fully_undefined(&self) -> bool {
        self.correlations.iter().all(|c| c.value.is_none())
    }
}

/// Pearson correlation of two equal-length samples.
///
/// Sums accumulate left to right so results are reproducible bit for bit.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    for i in 0..x.len() {
        sum_x += x[i];
        sum_y += y[i];
    }
    let mean_x = sum_x / n;
    let mean_y = sum_y / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for i in 0..x.len() {
        let dx = x[i] - mean_x;
        let dy = y[i] - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    let r = cov / (var_x * var_y).sqrt();
    if r.is_finite() {
        Some(r.clamp(-1.0, 1.0))
    } else {
        None
    }
}

/// Correlation of `reference` against `candidate` for each window.
pub fn correlate(
    reference: &PriceSeries,
    candidate: &PriceSeries,
    windows: &[usize],
    policy: WindowPolicy,
) -> CorrelationRow {
    let pair = align(reference, candidate);

    let correlations = windows
        .iter()
        .map(|&window| {
            let (_, left, right) = pair.tail(window);
            let observations = left.len();
            let value = match policy {
                WindowPolicy::Strict if observations < window => None,
                _ => pearson(left, right),
            };
            WindowCorrelation {
                window,
                observations,
                value,
            }
        })
        .collect();

    CorrelationRow {
        ticker: candidate.ticker().to_string(),
        overlap: pair.len(),
        correlations,
    }
}

/// One row per candidate, in candidate order. A candidate carrying the
/// reference's own ticker is skipped.
pub fn compute_correlations<'a, I>(
    reference: &PriceSeries,
    candidates: I,
    windows: &[usize],
    policy: WindowPolicy,
) -> Vec<CorrelationRow>
where
    I: IntoIterator<Item = &'a PriceSeries>,
{
    candidates
        .into_iter()
        .filter(|c| c.ticker() != reference.ticker())
        .map(|c| correlate(reference, c, windows, policy))
        .collect()
}

/// Sorts by the correlation at `window` descending; undefined values go last
/// and ties break on ticker.
pub fn sort_rows(rows: &mut [CorrelationRow], window: usize) {
    rows.sort_by(|a, b| {
        let ord = match (a.value(window), b.value(window)) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        ord.then_with(|| a.ticker.cmp(&b.ticker))
    });
}
