//! Date-intersection alignment of two price series.
//!
//! Two series are paired only at dates present in both; a date present in one
//! series alone is dropped, never imputed.

use crate::domain::price_series::PriceSeries;
use chrono::NaiveDate;

/// Prices of two series at their common dates, ascending.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignedPair {
    pub dates: Vec<NaiveDate>,
    pub left: Vec<f64>,
    pub right: Vec<f64>,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// The most recent `n` common dates (all of them when fewer exist).
    pub fn tail(&self, n: usize) -> (&[NaiveDate], &[f64], &[f64]) {
        let start = self.dates.len().saturating_sub(n);
        (
            &self.dates[start..],
            &self.left[start..],
            &self.right[start..],
        )
    }
}

/// Intersects two ascending series with a single merge pass.
pub fn align(left: &PriceSeries, right: &PriceSeries) -> AlignedPair {
    let a = left.points();
    let b = right.points();
    let mut out = AlignedPair {
        dates: Vec::with_capacity(a.len().min(b.len())),
        left: Vec::with_capacity(a.len().min(b.len())),
        right: Vec::with_capacity(a.len().min(b.len())),
    };

    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].date.cmp(&b[j].date) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.dates.push(a[i].date);
                out.left.push(a[i].close);
                out.right.push(b[j].close);
                i += 1;
                j += 1;
            }
        }
    }
    out
}
