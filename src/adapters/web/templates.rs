//! Askama templates and the pre-formatted view models they render.

use askama::Template;

use crate::domain::comparison::COMPARISON_LOOKBACK_CHOICES;
use crate::domain::correlation::WindowPolicy;
use crate::domain::dashboard::{ComparisonReport, CorrelationReport};
use crate::domain::universe::{Category, Universe};

use super::WebError;
use super::chart_svg::{price_chart_svg, ratio_chart_svg};

pub const UNDEFINED: &str = "—";

pub fn render<T: Template>(template: &T) -> Result<String, WebError> {
    template
        .render()
        .map_err(|e| WebError::internal(format!("template error: {e}")))
}

#[derive(Template)]
#[template(path = "base.html")]
pub struct BasePage<'a> {
    pub title: &'a str,
    pub active: &'a str,
    pub content: &'a str,
}

pub struct StockOption {
    pub ticker: String,
    pub label: String,
    pub selected: bool,
}

fn stock_options(universe: &Universe, selected: &str) -> Vec<StockOption> {
    universe
        .stocks()
        .map(|s| StockOption {
            ticker: s.ticker.clone(),
            label: format!("{} ({})", s.display_name(), s.category.label()),
            selected: s.ticker == selected,
        })
        .collect()
}

pub struct CategoryOption {
    pub slug: &'static str,
    pub label: &'static str,
}

#[derive(Template)]
#[template(path = "correlation_form.html")]
pub struct CorrelationFormView {
    pub stocks: Vec<StockOption>,
    pub categories: Vec<CategoryOption>,
    pub limit: usize,
}

impl CorrelationFormView {
    pub fn new(universe: &Universe, default_reference: &str, limit: usize) -> Self {
        Self {
            stocks: stock_options(universe, default_reference),
            categories: universe
                .categories()
                .into_iter()
                .map(|c| CategoryOption {
                    slug: c.slug(),
                    label: c.label(),
                })
                .collect(),
            limit,
        }
    }
}

pub struct CorrelationCell {
    pub text: String,
    pub style: String,
    pub title: String,
}

pub struct CorrelationRowView {
    pub rank: usize,
    pub ticker: String,
    pub name: String,
    pub category: &'static str,
    pub cells: Vec<CorrelationCell>,
    /// No window has a value; the row is rendered muted.
    pub undefined: bool,
}

#[derive(Template)]
#[template(path = "correlation_table.html")]
pub struct CorrelationTableView {
    pub reference: String,
    pub reference_points: usize,
    pub scope: String,
    pub headers: Vec<String>,
    pub rows: Vec<CorrelationRowView>,
    pub missing: String,
    pub policy_note: &'static str,
}

pub fn fmt_correlation(value: Option<f64>) -> String {
    value.map_or_else(|| UNDEFINED.to_string(), |v| format!("{v:.4}"))
}

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8
}

/// Red at -1, yellow at 0, green at +1.
pub fn correlation_color(value: f64) -> String {
    const RED: (u8, u8, u8) = (248, 105, 107);
    const YELLOW: (u8, u8, u8) = (255, 235, 132);
    const GREEN: (u8, u8, u8) = (99, 190, 123);

    let v = value.clamp(-1.0, 1.0);
    let (from, to, t) = if v < 0.0 {
        (RED, YELLOW, v + 1.0)
    } else {
        (YELLOW, GREEN, v)
    };
    format!(
        "rgb({}, {}, {})",
        lerp(from.0, to.0, t),
        lerp(from.1, to.1, t),
        lerp(from.2, to.2, t)
    )
}

impl CorrelationTableView {
    pub fn from_report(report: &CorrelationReport, policy: WindowPolicy) -> Self {
        let rows = report
            .entries
            .iter()
            .map(|entry| CorrelationRowView {
                rank: entry.rank,
                ticker: entry.stock.ticker.clone(),
                name: entry.stock.name.clone(),
                category: entry.stock.category.label(),
                undefined: entry.row.is_fully_undefined(),
                cells: report
                    .windows
                    .iter()
                    .map(|&w| {
                        let cell = entry.row.correlations.iter().find(|c| c.window == w);
                        let value = cell.and_then(|c| c.value);
                        CorrelationCell {
                            text: fmt_correlation(value),
                            style: value
                                .map(|v| format!("background-color: {}", correlation_color(v)))
                                .unwrap_or_default(),
                            title: format!(
                                "{} 個共同交易日",
                                cell.map_or(0, |c| c.observations)
                            ),
                        }
                    })
                    .collect(),
            })
            .collect();

        Self {
            reference: report.reference.display_name(),
            reference_points: report.reference_points,
            scope: report
                .category
                .map_or_else(|| "全部電子類股".to_string(), |c: Category| c.label().to_string()),
            headers: report.windows.iter().map(|w| format!("{w}日相關係數")).collect(),
            rows,
            missing: report.missing.join(", "),
            policy_note: match policy {
                WindowPolicy::Partial => "共同交易日不足時以可用天數計算",
                WindowPolicy::Strict => "共同交易日不足窗口長度時不計算",
            },
        }
    }
}

pub struct LookbackOption {
    pub days: usize,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "comparison_form.html")]
pub struct ComparisonFormView {
    pub stocks_a: Vec<StockOption>,
    pub stocks_b: Vec<StockOption>,
    pub lookbacks: Vec<LookbackOption>,
}

impl ComparisonFormView {
    pub fn new(universe: &Universe, default_a: &str, default_b: &str, lookback: usize) -> Self {
        Self {
            stocks_a: stock_options(universe, default_a),
            stocks_b: stock_options(universe, default_b),
            lookbacks: COMPARISON_LOOKBACK_CHOICES
                .iter()
                .map(|&days| LookbackOption {
                    days,
                    selected: days == lookback,
                })
                .collect(),
        }
    }
}

pub struct SignedCell {
    pub text: String,
    pub class: &'static str,
}

fn signed_cell(value: Option<f64>) -> SignedCell {
    match value {
        Some(v) if v > 0.0 => SignedCell {
            text: format!("+{v:.2}"),
            class: "up",
        },
        Some(v) if v < 0.0 => SignedCell {
            text: format!("{v:.2}"),
            class: "down",
        },
        Some(v) => SignedCell {
            text: format!("{v:.2}"),
            class: "",
        },
        None => SignedCell {
            text: UNDEFINED.to_string(),
            class: "",
        },
    }
}

fn fmt_ratio(value: Option<f64>) -> String {
    value.map_or_else(|| UNDEFINED.to_string(), |v| format!("{v:.4}"))
}

pub struct DetailRow {
    pub date: String,
    pub close_a: String,
    pub close_b: String,
    pub change_a: SignedCell,
    pub change_b: SignedCell,
    pub ratio: String,
    pub moving_averages: Vec<String>,
}

#[derive(Template)]
#[template(path = "comparison_view.html")]
pub struct ComparisonView {
    pub label_a: String,
    pub label_b: String,
    pub lookback: usize,
    pub points: usize,
    pub first_date: String,
    pub last_date: String,
    pub latest_ratio: String,
    pub price_svg: String,
    pub ratio_svg: String,
    pub ma_headers: Vec<String>,
    pub rows: Vec<DetailRow>,
}

impl ComparisonView {
    pub fn from_report(report: &ComparisonReport) -> Self {
        let cmp = &report.comparison;
        let dates = cmp.dates();
        let closes_a: Vec<f64> = cmp.aligned_a.closes().collect();
        let closes_b: Vec<f64> = cmp.aligned_b.closes().collect();
        let changes_a = cmp.aligned_a.changes();
        let changes_b = cmp.aligned_b.changes();
        let ratios = cmp.ratio.values();

        // newest first
        let rows = (0..dates.len())
            .rev()
            .map(|i| DetailRow {
                date: dates[i].format("%Y-%m-%d").to_string(),
                close_a: format!("{:.2}", closes_a[i]),
                close_b: format!("{:.2}", closes_b[i]),
                change_a: signed_cell(changes_a[i]),
                change_b: signed_cell(changes_b[i]),
                ratio: fmt_ratio(ratios[i]),
                moving_averages: report
                    .moving_averages
                    .iter()
                    .map(|(_, values)| fmt_ratio(values[i]))
                    .collect(),
            })
            .collect();

        let fmt_date = |d: Option<&chrono::NaiveDate>| {
            d.map_or_else(|| UNDEFINED.to_string(), |d| d.format("%Y-%m-%d").to_string())
        };

        Self {
            label_a: report.stock_a.display_name(),
            label_b: report.stock_b.display_name(),
            lookback: report.lookback,
            points: cmp.len(),
            first_date: fmt_date(dates.first()),
            last_date: fmt_date(dates.last()),
            latest_ratio: fmt_ratio(ratios.last().copied().flatten()),
            price_svg: price_chart_svg(report),
            ratio_svg: ratio_chart_svg(report),
            ma_headers: report
                .moving_averages
                .iter()
                .map(|(p, _)| format!("{p}日均比"))
                .collect(),
            rows,
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorView<'a> {
    pub status: u16,
    pub message: &'a str,
    pub retry: bool,
}
