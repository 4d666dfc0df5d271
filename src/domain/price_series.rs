//! Daily closing-price series.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Closing prices for one ticker in ascending date order with unique dates.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    ticker: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series from raw points: non-finite closes are dropped, the
    /// rest sorted by date, and the first occurrence of a duplicate date kept.
    pub fn from_points(ticker: impl Into<String>, points: Vec<PricePoint>) -> Self {
        let mut points: Vec<PricePoint> =
            points.into_iter().filter(|p| p.close.is_finite()).collect();
        // stable sort keeps original order among equal dates
        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);
        Self {
            ticker: ticker.into(),
            points,
        }
    }

    pub fn empty(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            points: Vec::new(),
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.close)
    }

    /// Day-over-day change in close; the first point has none.
    pub fn changes(&self) -> Vec<Option<f64>> {
        let mut out = Vec::with_capacity(self.points.len());
        let mut prev: Option<f64> = None;
        for p in &self.points {
            out.push(prev.map(|c| p.close - c));
            prev = Some(p.close);
        }
        out
    }
}
