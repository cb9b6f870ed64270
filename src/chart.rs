//! Metric charts: a bar per operator, or a rolling line for one operator.

use crate::api::MetricSample;
use crate::format::thousands_f64;
use crate::palette::NEUTRAL_EDGE_COLOR;
use crate::render::escape_xml;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt::Write as _;
use std::time::Duration;

pub const MARGIN_TOP: f64 = 15.0;
pub const MARGIN_RIGHT: f64 = 20.0;
pub const MARGIN_BOTTOM: f64 = 30.0;
pub const MARGIN_LEFT: f64 = 40.0;

/// Room under the x axis for its caption.
const CAPTION_PADDING: f64 = 40.0;

/// Plot height inside the margins.
pub const CHART_HEIGHT: f64 = 380.0 - MARGIN_TOP - MARGIN_BOTTOM - CAPTION_PADDING;

/// Horizontal space kept free right of the plot.
const RIGHT_GUTTER: f64 = 200.0;

/// Samples kept by the line chart.
pub const LINE_WINDOW: usize = 20;

/// Line chart refetch period.
pub const LINE_REFRESH: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
}

/// Pixel extent of each band of an ordinal scale with rounded bands.
#[derive(Debug, Clone, PartialEq)]
pub struct Bands {
    pub starts: Vec<f64>,
    pub band: f64,
}

/// Ordinal band scale over `[start, stop]` with rounding, matching the
/// dashboard's bar layout: `padding` between bars, `outer` at the ends.
pub fn round_bands(n: usize, start: f64, stop: f64, padding: f64, outer: f64) -> Bands {
    if n == 0 {
        return Bands {
            starts: Vec::new(),
            band: 0.0,
        };
    }
    let n_f = n as f64;
    let step = ((stop - start) / (n_f - padding + 2.0 * outer)).floor();
    let error = stop - start - (n_f - padding) * step;
    let first = start + (error / 2.0).round();
    Bands {
        starts: (0..n).map(|i| first + step * i as f64).collect(),
        band: (step * (1.0 - padding)).round(),
    }
}

/// Round tick values covering `[lo, hi]`, about `count` of them.
pub fn ticks(lo: f64, hi: f64, count: usize) -> Vec<f64> {
    let span = hi - lo;
    if span.is_nan() || span <= 0.0 || count == 0 {
        return vec![lo];
    }
    let raw = span / count as f64;
    let mut step = 10f64.powf(raw.log10().floor());
    let err = count as f64 / span * step;
    if err <= 0.15 {
        step *= 10.0;
    } else if err <= 0.35 {
        step *= 5.0;
    } else if err <= 0.75 {
        step *= 2.0;
    }
    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

fn is_integer_kind(kind: &str) -> bool {
    matches!(kind, "long" | "counter")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub op_id: String,
    pub value: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
}

impl Bar {
    pub fn title(&self) -> String {
        format!("Name: {}\nValue: {}", self.op_id, self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub metric: String,
    pub width: f64,
    pub wide: bool,
    pub max: f64,
    pub bars: Vec<Bar>,
}

impl BarChart {
    /// One bar per operator. `colors` maps operator ids to their kind colour.
    pub fn build(
        metric: &str,
        samples: &[MetricSample],
        width: f64,
        wide: bool,
        colors: &BTreeMap<String, String>,
    ) -> BarChart {
        let values: Vec<f64> = samples
            .iter()
            .map(|s| s.numeric().unwrap_or(0.0))
            .collect();
        let max = values.iter().copied().fold(0.0, f64::max);
        let bands = round_bands(samples.len(), 0.0, width - MARGIN_LEFT - RIGHT_GUTTER, 0.1, 0.5);

        let bars = samples
            .iter()
            .zip(values)
            .zip(bands.starts)
            .map(|((s, v), x)| {
                let y = if max > 0.0 {
                    CHART_HEIGHT - v / max * CHART_HEIGHT
                } else {
                    CHART_HEIGHT
                };
                Bar {
                    op_id: s.op_id.clone(),
                    value: s.value.clone(),
                    x,
                    y,
                    width: bands.band,
                    height: CHART_HEIGHT - y,
                    color: colors
                        .get(&s.op_id)
                        .cloned()
                        .unwrap_or_else(|| NEUTRAL_EDGE_COLOR.to_string()),
                }
            })
            .collect();

        BarChart {
            metric: metric.to_string(),
            width,
            wide,
            max,
            bars,
        }
    }

    pub fn to_svg(&self) -> String {
        let plot_w = self.width - MARGIN_LEFT - RIGHT_GUTTER;
        let mut out = open_chart(self.width);

        for t in ticks(0.0, self.max, 10) {
            let y = if self.max > 0.0 {
                CHART_HEIGHT - t / self.max * CHART_HEIGHT
            } else {
                CHART_HEIGHT
            };
            y_tick(&mut out, y, &thousands_f64(t));
        }
        axes(&mut out, plot_w, "Oplets", &self.metric);

        for bar in &self.bars {
            let _ = writeln!(
                out,
                r#"  <rect class="bar" x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" style="fill:{}"><title>{}</title></rect>"#,
                bar.x,
                bar.y,
                bar.width,
                bar.height,
                bar.color,
                escape_xml(&bar.title())
            );
            if !self.wide {
                let _ = writeln!(
                    out,
                    r#"  <text class="tick" x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
                    bar.x + bar.width / 2.0,
                    CHART_HEIGHT + 16.0,
                    escape_xml(&bar.op_id)
                );
            }
        }
        out.push_str("</g>\n</svg>\n");
        out
    }
}

/// Rolling window of one metric on one operator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineWindow {
    pub metric: String,
    pub op_id: Option<String>,
    integer: bool,
    values: VecDeque<f64>,
}

impl LineWindow {
    pub fn new(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            op_id: None,
            integer: true,
            values: VecDeque::with_capacity(LINE_WINDOW),
        }
    }

    /// Append one reading; the oldest falls off once the window is full.
    pub fn push(&mut self, sample: &MetricSample) {
        let Some(v) = sample.numeric() else {
            tracing::debug!(op = %sample.op_id, value = %sample.value, "skipping non-numeric sample");
            return;
        };
        if self.values.len() == LINE_WINDOW {
            self.values.pop_front();
        }
        self.values.push_back(v);
        self.integer = is_integer_kind(&sample.kind);
        self.op_id = Some(sample.op_id.clone());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// `[min - 1% (when positive), max + 1%]`, truncated for integer metrics.
    pub fn y_domain(&self) -> Option<(f64, f64)> {
        let mut min = self.values.iter().copied().reduce(f64::min)?;
        let max = self.values.iter().copied().reduce(f64::max)?;
        if min > 0.0 {
            min -= 0.01 * min;
        }
        let hi = max + max * 0.01;
        Some(if self.integer {
            (min.trunc(), hi.trunc())
        } else {
            (min, hi)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub metric: String,
    pub points: Vec<(f64, f64)>,
    pub y_domain: (f64, f64),
}

impl LineChart {
    pub fn build(window: &LineWindow) -> LineChart {
        let plot_w = crate::catalog::CHART_WIDTH - MARGIN_LEFT - RIGHT_GUTTER;
        let (lo, hi) = window.y_domain().unwrap_or((0.0, 1.0));
        let span = if hi > lo { hi - lo } else { 1.0 };
        let points = window
            .values()
            .enumerate()
            .map(|(i, v)| {
                let x = i as f64 / (LINE_WINDOW - 1) as f64 * plot_w;
                let y = CHART_HEIGHT - (v - lo) / span * CHART_HEIGHT;
                (x, y)
            })
            .collect();
        LineChart {
            metric: window.metric.clone(),
            points,
            y_domain: (lo, hi),
        }
    }

    pub fn path(&self) -> String {
        let mut d = String::new();
        for (i, (x, y)) in self.points.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            let _ = write!(d, "{}{:.1},{:.1}", cmd, x, y);
        }
        d
    }

    pub fn to_svg(&self) -> String {
        let width = crate::catalog::CHART_WIDTH;
        let plot_w = width - MARGIN_LEFT - RIGHT_GUTTER;
        let mut out = open_chart(width);
        let (lo, hi) = self.y_domain;
        let span = if hi > lo { hi - lo } else { 1.0 };
        for t in ticks(lo, hi, 10) {
            y_tick(&mut out, CHART_HEIGHT - (t - lo) / span * CHART_HEIGHT, &thousands_f64(t));
        }
        axes(&mut out, plot_w, &format!("Last {} measures", LINE_WINDOW), &self.metric);
        let _ = writeln!(
            out,
            r#"  <path class="line" d="{}" fill="none" stroke="steelblue" stroke-width="1.5"/>"#,
            self.path()
        );
        out.push_str("</g>\n</svg>\n");
        out
    }
}

fn open_chart(width: f64) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="metric-chart" width="{}" height="{}">"#,
        width + MARGIN_LEFT + MARGIN_RIGHT,
        CHART_HEIGHT + MARGIN_TOP + MARGIN_BOTTOM + CAPTION_PADDING
    );
    let _ = writeln!(
        out,
        r#"<g transform="translate({},{})">"#,
        MARGIN_LEFT + 80.0,
        MARGIN_TOP
    );
    out
}

fn y_tick(out: &mut String, y: f64, label: &str) {
    let _ = writeln!(
        out,
        r#"  <text class="tick" x="-9" y="{:.1}" dy=".32em" text-anchor="end">{}</text>"#,
        y,
        escape_xml(label)
    );
}

fn axes(out: &mut String, plot_w: f64, x_caption: &str, y_caption: &str) {
    let _ = writeln!(
        out,
        r#"  <line class="axis" x1="0" y1="{h}" x2="{w}" y2="{h}" stroke="black"/>"#,
        h = CHART_HEIGHT,
        w = plot_w
    );
    let _ = writeln!(
        out,
        r#"  <line class="axis" x1="0" y1="0" x2="0" y2="{}" stroke="black"/>"#,
        CHART_HEIGHT
    );
    let _ = writeln!(
        out,
        r#"  <text x="{:.1}" y="{:.1}" text-anchor="middle" style="font-size:1.3em">{}</text>"#,
        plot_w / 2.0,
        CHART_HEIGHT + CAPTION_PADDING,
        escape_xml(x_caption)
    );
    let _ = writeln!(
        out,
        r#"  <text transform="rotate(-90)" y="6" dy=".9em" text-anchor="end" style="font-size:1.2em">{}</text>"#,
        escape_xml(y_caption)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample(op: &str, kind: &str, value: &str) -> MetricSample {
        MetricSample {
            op_id: op.into(),
            name: "Count".into(),
            kind: kind.into(),
            value: value.into(),
        }
    }

    #[test]
    fn round_bands_follow_band_scale_rounding() {
        // 560px for three bars: step = floor(560 / 3.9) = 143.
        let bands = round_bands(3, 0.0, 560.0, 0.1, 0.5);
        assert_eq!(bands.band, 129.0);
        // error = 560 - 2.9 * 143 = 145.3, first band at round(72.65).
        assert_eq!(bands.starts, vec![73.0, 216.0, 359.0]);
    }

    #[test]
    fn bars_scale_to_the_largest_value() {
        let samples = [sample("OP_1", "long", "50"), sample("OP_2", "long", "100")];
        let colors = BTreeMap::from([("OP_1".to_string(), "#123456".to_string())]);
        let chart = BarChart::build("Count", &samples, 800.0, false, &colors);

        assert_eq!(chart.bars[1].height, CHART_HEIGHT);
        assert_eq!(chart.bars[0].height, CHART_HEIGHT / 2.0);
        assert_eq!(chart.bars[0].color, "#123456");
        assert_eq!(chart.bars[1].color, NEUTRAL_EDGE_COLOR);
        assert_eq!(chart.bars[0].title(), "Name: OP_1\nValue: 50");
    }

    #[test]
    fn line_window_keeps_last_twenty() {
        let mut window = LineWindow::new("Count");
        for i in 0..25 {
            window.push(&sample("OP_1", "long", &i.to_string()));
        }
        assert_eq!(window.len(), LINE_WINDOW);
        assert_eq!(window.values().next(), Some(5.0));
        assert_eq!(window.values().last(), Some(24.0));
    }

    #[test]
    fn y_domain_pads_by_one_percent() {
        let mut window = LineWindow::new("Count");
        window.push(&sample("OP_1", "long", "200"));
        window.push(&sample("OP_1", "long", "1000"));
        assert_eq!(window.y_domain(), Some((198.0, 1010.0)));

        let mut rates = LineWindow::new("Rate");
        rates.push(&sample("OP_1", "double", "0"));
        rates.push(&sample("OP_1", "double", "2.5"));
        assert_eq!(rates.y_domain(), Some((0.0, 2.525)));
    }

    #[test]
    fn line_path_spans_the_window() {
        let mut window = LineWindow::new("Count");
        window.push(&sample("OP_1", "long", "10"));
        window.push(&sample("OP_1", "long", "20"));
        let chart = LineChart::build(&window);
        assert!(chart.path().starts_with("M0.0,"));
        assert_eq!(chart.points.len(), 2);
    }

    #[test]
    fn ticks_are_round_numbers() {
        assert_eq!(ticks(0.0, 100.0, 10), (0..=10).map(|i| i as f64 * 10.0).collect::<Vec<_>>());
        assert_eq!(ticks(0.0, 0.0, 10), vec![0.0]);
    }
}
