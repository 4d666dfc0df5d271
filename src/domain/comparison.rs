//! Two-stock comparison: aligned closes and their price ratio.

use crate::domain::alignment::align;
use crate::domain::error::TwcorrError;
use crate::domain::price_series::{PricePoint, PriceSeries};
use chrono::NaiveDate;

/// Default lookback of the comparison view, in trading days.
pub const COMPARISON_LOOKBACK: usize = 120;

/// Lookbacks offered by the comparison form.
pub const COMPARISON_LOOKBACK_CHOICES: [usize; 3] = [120, 60, 30];

/// Trailing windows of the ratio moving averages.
pub const RATIO_MA_PERIODS: [usize; 3] = [20, 60, 120];

/// Calendar days to fetch for a comparison over `lookback` trading days.
pub fn comparison_fetch_days(lookback: usize) -> u32 {
    let wanted = u32::try_from(lookback).unwrap_or(u32::MAX).saturating_add(60);
    wanted.max(180)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioPoint {
    pub date: NaiveDate,
    /// `None` where either price is zero or the quotient is not finite.
    pub ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RatioSeries {
    pub points: Vec<RatioPoint>,
}

impl RatioSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.ratio).collect()
    }

    /// Trailing mean over `period` points, aligned with `points`.
    ///
    /// Returns `None` when the series is shorter than `period`. Inside the
    /// result a position is defined only when every ratio in its window is.
    pub fn moving_average(&self, period: usize) -> Option<Vec<Option<f64>>> {
        if period == 0 || self.points.len() < period {
            return None;
        }
        let values = self.values();
        let out = (0..values.len())
            .map(|i| {
                if i + 1 < period {
                    return None;
                }
                let window = &values[i + 1 - period..=i];
                let mut sum = 0.0;
                for v in window {
                    sum += (*v)?;
                }
                Some(sum / period as f64)
            })
            .collect();
        Some(out)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub aligned_a: PriceSeries,
    pub aligned_b: PriceSeries,
    pub ratio: RatioSeries,
}

impl Comparison {
    pub fn len(&self) -> usize {
        self.ratio.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratio.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.ratio.points.iter().map(|p| p.date).collect()
    }
}

fn ratio_of(a: f64, b: f64) -> Option<f64> {
    if a == 0.0 || b == 0.0 {
        return None;
    }
    let r = a / b;
    r.is_finite().then_some(r)
}

/// Aligns `a` and `b` on their common dates, keeps the last `lookback_days`
/// of them, and derives `a / b`.
pub fn build_comparison(
    a: &PriceSeries,
    b: &PriceSeries,
    lookback_days: usize,
) -> Result<Comparison, TwcorrError> {
    let pair = align(a, b);
    let (dates, left, right) = pair.tail(lookback_days);

    if dates.is_empty() {
        return Err(TwcorrError::NoOverlap {
            left: a.ticker().to_string(),
            right: b.ticker().to_string(),
        });
    }

    let mut points_a = Vec::with_capacity(dates.len());
    let mut points_b = Vec::with_capacity(dates.len());
    let mut ratio = Vec::with_capacity(dates.len());
    for ((&date, &pa), &pb) in dates.iter().zip(left).zip(right) {
        points_a.push(PricePoint::new(date, pa));
        points_b.push(PricePoint::new(date, pb));
        ratio.push(RatioPoint {
            date,
            ratio: ratio_of(pa, pb),
        });
    }

    Ok(Comparison {
        aligned_a: PriceSeries::from_points(a.ticker(), points_a),
        aligned_b: PriceSeries::from_points(b.ticker(), points_b),
        ratio: RatioSeries { points: ratio },
    })
}
