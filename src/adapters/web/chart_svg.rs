//! Inline SVG line charts for the comparison view.

use crate::domain::dashboard::ComparisonReport;
use chrono::NaiveDate;

const CHART_WIDTH: f64 = 720.0;
const CHART_HEIGHT: f64 = 320.0;
const MARGIN_LEFT: f64 = 64.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 36.0;
const MARGIN_BOTTOM: f64 = 40.0;

const PRICE_COLORS: [&str; 2] = ["#2563eb", "#f97316"];
const RATIO_COLOR: &str = "#FF6B6B";
const MA_COLORS: [&str; 3] = ["#4ECDC4", "#45B7D1", "#96CEB4"];

/// One plotted series; `None` values break the line.
pub struct Line<'a> {
    pub label: String,
    pub color: &'a str,
    pub values: &'a [Option<f64>],
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn fmt_axis(value: f64) -> String {
    if value.abs() >= 100.0 {
        format!("{value:.0}")
    } else if value.abs() >= 1.0 {
        format!("{value:.2}")
    } else {
        format!("{value:.4}")
    }
}

/// Renders `lines` against `dates` on a shared y axis. Returns an empty
/// string when there is nothing to draw.
pub fn line_chart_svg(y_label: &str, dates: &[NaiveDate], lines: &[Line<'_>]) -> String {
    let defined = lines
        .iter()
        .flat_map(|l| l.values.iter().flatten().copied());
    let (min, max) = defined.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if dates.is_empty() || !min.is_finite() || !max.is_finite() {
        return String::new();
    }
    // flat series still get a visible band
    let pad = ((max - min) * 0.05).max(max.abs() * 0.01).max(1e-6);
    let (lo, hi) = (min - pad, max + pad);

    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let x_scale =
        |i: usize| MARGIN_LEFT + (i as f64 / (dates.len() - 1).max(1) as f64) * plot_width;
    let y_scale = |v: f64| MARGIN_TOP + plot_height - ((v - lo) / (hi - lo)) * plot_height;

    let mut svg = format!(
        r##"<svg class="chart" width="100%" viewBox="0 0 {CHART_WIDTH} {CHART_HEIGHT}" xmlns="http://www.w3.org/2000/svg" role="img">"##
    );
    svg.push_str("\n  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "  <text x=\"{MARGIN_LEFT}\" y=\"14\" font-size=\"12\" fill=\"#666\">{}</text>\n",
        escape(y_label)
    ));

    // axes
    svg.push_str(&format!(
        "  <line x1=\"{MARGIN_LEFT}\" y1=\"{MARGIN_TOP}\" x2=\"{MARGIN_LEFT}\" y2=\"{}\" stroke=\"#ccc\"/>\n",
        CHART_HEIGHT - MARGIN_BOTTOM
    ));
    svg.push_str(&format!(
        "  <line x1=\"{MARGIN_LEFT}\" y1=\"{0}\" x2=\"{1}\" y2=\"{0}\" stroke=\"#ccc\"/>\n",
        CHART_HEIGHT - MARGIN_BOTTOM,
        CHART_WIDTH - MARGIN_RIGHT
    ));

    for v in [max, (max + min) / 2.0, min] {
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            MARGIN_LEFT - 5.0,
            y_scale(v) + 3.0,
            fmt_axis(v)
        ));
    }

    let mut ticks = vec![0, dates.len() / 2, dates.len() - 1];
    ticks.dedup();
    for i in ticks {
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            x_scale(i),
            CHART_HEIGHT - MARGIN_BOTTOM + 16.0,
            dates[i].format("%m/%d")
        ));
    }

    for line in lines {
        let mut path = String::new();
        let mut pen_down = false;
        for (i, value) in line.values.iter().enumerate().take(dates.len()) {
            match value {
                Some(v) => {
                    let cmd = if pen_down { 'L' } else { 'M' };
                    path.push_str(&format!("{cmd} {:.1} {:.1} ", x_scale(i), y_scale(*v)));
                    pen_down = true;
                }
                None => pen_down = false,
            }
        }
        if !path.is_empty() {
            svg.push_str(&format!(
                "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>\n",
                path.trim_end(),
                line.color
            ));
        }
    }

    // legend
    let mut x = MARGIN_LEFT + 8.0;
    for line in lines {
        svg.push_str(&format!(
            "  <rect x=\"{x:.1}\" y=\"{:.1}\" width=\"12\" height=\"3\" fill=\"{}\"/>\n",
            MARGIN_TOP - 12.0,
            line.color
        ));
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" fill=\"#333\">{}</text>\n",
            x + 16.0,
            MARGIN_TOP - 8.0,
            escape(&line.label)
        ));
        x += 28.0 + 7.0 * line.label.chars().count() as f64;
    }

    svg.push_str("</svg>");
    svg
}

pub fn price_chart_svg(report: &ComparisonReport) -> String {
    let dates = report.comparison.dates();
    let a: Vec<Option<f64>> = report.comparison.aligned_a.closes().map(Some).collect();
    let b: Vec<Option<f64>> = report.comparison.aligned_b.closes().map(Some).collect();
    let lines = [
        Line {
            label: report.stock_a.display_name(),
            color: PRICE_COLORS[0],
            values: &a,
        },
        Line {
            label: report.stock_b.display_name(),
            color: PRICE_COLORS[1],
            values: &b,
        },
    ];
    line_chart_svg("收盤價", &dates, &lines)
}

pub fn ratio_chart_svg(report: &ComparisonReport) -> String {
    let dates = report.comparison.dates();
    let ratio = report.comparison.ratio.values();
    let mut lines = vec![Line {
        label: "價比".to_string(),
        color: RATIO_COLOR,
        values: &ratio,
    }];
    for ((period, values), color) in report.moving_averages.iter().zip(MA_COLORS) {
        lines.push(Line {
            label: format!("{period}日均比"),
            color,
            values,
        });
    }
    line_chart_svg("價比", &dates, &lines)
}
