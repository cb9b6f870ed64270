//! Legend builder.
//!
//! One builder for the three legends the dashboard shows. The kind decides
//! ordering and swatch shape:
//!
//! | kind         | order          | swatch              |
//! |--------------|----------------|---------------------|
//! | `Tag`        | label          | 8x8 square, opaque  |
//! | `TupleCount` | bucket id      | circle, 0.7 opacity |
//! | `OpletKind`  | label          | circle, 0.7 opacity |

use crate::render::escape_xml;

use serde::Serialize;
use std::fmt::Write as _;

/// Legend font size in px; rows are one em apart.
pub const FONT_SIZE: f64 = 11.0;

/// Gap between the entries and the surrounding box.
pub const PADDING: f64 = 5.0;

/// Rough advance of one character, in em.
const CHAR_WIDTH_EM: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendKind {
    Tag,
    TupleCount,
    OpletKind,
}

impl LegendKind {
    pub fn title(self) -> &'static str {
        match self {
            LegendKind::Tag => "Stream tags",
            LegendKind::TupleCount => "Tuple count",
            LegendKind::OpletKind => "Oplet kind",
        }
    }

    fn swatch(self) -> Swatch {
        match self {
            LegendKind::Tag => Swatch::Square,
            _ => Swatch::Circle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Swatch {
    Square,
    Circle,
}

impl Swatch {
    pub fn opacity(self) -> f64 {
        match self {
            Swatch::Square => 1.0,
            Swatch::Circle => 0.7,
        }
    }
}

/// Input item. `order` is the bucket id for tuple-count legends.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
    pub order: Option<usize>,
}

impl LegendEntry {
    pub fn new(label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            color: color.into(),
            order: None,
        }
    }

    pub fn ordered(label: impl Into<String>, color: impl Into<String>, order: usize) -> Self {
        Self {
            order: Some(order),
            ..Self::new(label, color)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendRow {
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LegendBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub kind: LegendKind,
    pub title: String,
    pub swatch: Swatch,
    pub rows: Vec<LegendRow>,
    pub bounds: LegendBox,
}

impl Legend {
    /// Build a legend from raw entries.
    ///
    /// Entries are keyed by label: a repeated label takes the later colour
    /// but keeps the slot of its first occurrence.
    pub fn build(kind: LegendKind, title: impl Into<String>, entries: Vec<LegendEntry>) -> Legend {
        let mut keyed: Vec<LegendEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            match keyed.iter_mut().find(|e| e.label == entry.label) {
                Some(existing) => {
                    existing.color = entry.color;
                    if entry.order.is_some() {
                        existing.order = entry.order;
                    }
                }
                None => keyed.push(entry),
            }
        }

        match kind {
            LegendKind::TupleCount => keyed.sort_by_key(|e| e.order.unwrap_or(usize::MAX)),
            LegendKind::Tag | LegendKind::OpletKind => {
                keyed.sort_by(|a, b| a.label.cmp(&b.label))
            }
        }

        let rows: Vec<LegendRow> = keyed
            .into_iter()
            .map(|e| LegendRow {
                label: e.label,
                color: e.color,
            })
            .collect();

        let swatch = kind.swatch();
        let bounds = measure(swatch, &rows);
        Legend {
            kind,
            title: title.into(),
            swatch,
            rows,
            bounds,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as an SVG group at `(x, y)`.
    pub fn to_svg(&self, x: f64, y: f64) -> String {
        let em = FONT_SIZE;
        let b = self.bounds;
        let mut out = String::new();

        let _ = writeln!(
            out,
            r#"<g class="legend" transform="translate({x},{y})" style="font-size:{em}px">"#
        );
        let _ = writeln!(
            out,
            r#"  <text class="legend-title" x="{:.1}" y="{:.1}">{}</text>"#,
            b.x - PADDING,
            -2.0 * em,
            escape_xml(&self.title)
        );
        let _ = writeln!(
            out,
            r##"  <rect class="legend-box" x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="none" stroke="#ccc"/>"##,
            b.x - PADDING,
            b.y - PADDING,
            b.width + 2.0 * PADDING,
            b.height + 2.0 * PADDING
        );
        out.push_str("  <g class=\"legend-items\">\n");
        let opacity = self.swatch.opacity();
        for (i, row) in self.rows.iter().enumerate() {
            let row_y = i as f64 * em;
            match self.swatch {
                Swatch::Square => {
                    let _ = writeln!(
                        out,
                        r#"    <rect x="0" y="{:.2}" width="8" height="8" style="fill:{};stroke:none;fill-opacity:{}"/>"#,
                        row_y - 0.75 * em,
                        row.color,
                        opacity
                    );
                }
                Swatch::Circle => {
                    let _ = writeln!(
                        out,
                        r#"    <circle cx="0" cy="{:.2}" r="{:.2}" style="fill:{};fill-opacity:{}"/>"#,
                        row_y - 0.25 * em,
                        0.4 * em,
                        row.color,
                        opacity
                    );
                }
            }
            let _ = writeln!(
                out,
                r#"    <text x="{:.1}" y="{:.1}">{}</text>"#,
                em,
                row_y,
                escape_xml(&row.label)
            );
        }
        out.push_str("  </g>\n</g>\n");
        out
    }
}

/// Estimated bounding box of the entry group, before padding.
fn measure(swatch: Swatch, rows: &[LegendRow]) -> LegendBox {
    let em = FONT_SIZE;
    if rows.is_empty() {
        return LegendBox {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        };
    }
    let widest = rows
        .iter()
        .map(|r| r.label.chars().count())
        .max()
        .unwrap_or(0) as f64;
    let left = match swatch {
        Swatch::Square => 0.0,
        Swatch::Circle => -0.4 * em,
    };
    // Text baseline sits at the row's y; the glyphs rise about 0.8em above it.
    let top = -0.8 * em;
    let right = em + widest * CHAR_WIDTH_EM * em;
    LegendBox {
        x: left,
        y: top,
        width: right - left,
        height: rows.len() as f64 * em,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn labels(legend: &Legend) -> Vec<&str> {
        legend.rows.iter().map(|r| r.label.as_str()).collect()
    }

    #[test]
    fn tuple_count_orders_by_bucket_id() {
        let legend = Legend::build(
            LegendKind::TupleCount,
            LegendKind::TupleCount.title(),
            vec![
                LegendEntry::ordered("26 - 50", "#c", 2),
                LegendEntry::ordered("0", "#a", 0),
                LegendEntry::ordered("1 - 25", "#b", 1),
            ],
        );
        assert_eq!(labels(&legend), vec!["0", "1 - 25", "26 - 50"]);
        assert_eq!(legend.swatch, Swatch::Circle);
    }

    #[test]
    fn kind_legend_orders_by_label_and_dedups() {
        let legend = Legend::build(
            LegendKind::OpletKind,
            "Oplet kind",
            vec![
                LegendEntry::new("Sink (quarks.oplet.core)", "#1"),
                LegendEntry::new("Filter (quarks.oplet.functional)", "#2"),
                LegendEntry::new("Sink (quarks.oplet.core)", "#3"),
            ],
        );
        assert_eq!(
            labels(&legend),
            vec!["Filter (quarks.oplet.functional)", "Sink (quarks.oplet.core)"]
        );
        assert_eq!(legend.rows[1].color, "#3");
    }

    #[test]
    fn tag_legend_uses_opaque_squares() {
        let legend = Legend::build(
            LegendKind::Tag,
            "Stream tags",
            vec![LegendEntry::new("b", "#b"), LegendEntry::new("a", "#a")],
        );
        assert_eq!(labels(&legend), vec!["a", "b"]);
        assert_eq!(legend.swatch, Swatch::Square);
        let svg = legend.to_svg(10.0, 10.0);
        assert!(svg.contains(r#"width="8" height="8""#));
        assert!(svg.contains("fill-opacity:1"));
        assert!(svg.contains(">Stream tags</text>"));
    }

    #[test]
    fn box_grows_with_rows_and_labels() {
        let short = Legend::build(LegendKind::Tag, "t", vec![LegendEntry::new("a", "#a")]);
        let long = Legend::build(
            LegendKind::Tag,
            "t",
            vec![
                LegendEntry::new("a much longer label", "#a"),
                LegendEntry::new("b", "#b"),
            ],
        );
        assert!(long.bounds.width > short.bounds.width);
        assert_eq!(long.bounds.height, 2.0 * FONT_SIZE);
    }

    #[test]
    fn building_twice_gives_the_same_order() {
        let entries = vec![
            LegendEntry::new("z", "#1"),
            LegendEntry::new("m", "#2"),
            LegendEntry::new("a", "#3"),
        ];
        let a = Legend::build(LegendKind::OpletKind, "k", entries.clone());
        let b = Legend::build(LegendKind::OpletKind, "k", entries);
        assert_eq!(a, b);
    }
}
