//! Colours for vertices, edges, tags and tuple-count buckets.

use std::collections::HashMap;

/// Vertex fill on the flow layer.
pub const FLOW_VERTEX_COLOR: &str = "#1f77b4";

/// Edges that carry no highlighted information.
pub const NEUTRAL_EDGE_COLOR: &str = "#d3d3d3";

/// Edge matched by more than one selected tag.
pub const MULTIPLE_TAGS_COLOR: &str = "#17becf";

pub const CATEGORY10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

pub const CATEGORY20: [&str; 20] = [
    "#1f77b4", "#aec7e8", "#ff7f0e", "#ffbb78", "#2ca02c", "#98df8a", "#d62728", "#ff9896",
    "#9467bd", "#c5b0d5", "#8c564b", "#c49c94", "#e377c2", "#f7b6d2", "#7f7f7f", "#c7c7c7",
    "#bcbd22", "#dbdb8d", "#17becf", "#9edae5",
];

/// Fixed colours of the built-in operator kinds.
const OPLET_KIND_COLORS: [(&str, &str); 24] = [
    ("quarks.metrics.oplets.CounterOp", "#1f77b4"),
    ("quarks.metrics.oplets.RateMeter", "#aec7e8"),
    ("quarks.oplet.core.FanIn", "#ff7f0e"),
    ("quarks.oplet.core.FanOut", "#ffbb78"),
    ("quarks.oplet.core.Peek", "#2ca02c"),
    ("quarks.oplet.core.PeriodicSource", "#98df8a"),
    ("quarks.oplet.core.Pipe", "#d62728"),
    ("quarks.oplet.core.PipeWindow", "#ff9896"),
    ("quarks.oplet.core.ProcessSource", "#9467bd"),
    ("quarks.oplet.core.Sink", "#c5b0d5"),
    ("quarks.oplet.core.Source", "#8c564b"),
    ("quarks.oplet.core.Split", "#c49c94"),
    ("quarks.oplet.functional.ConsumerEventSource", "#e377c2"),
    ("quarks.oplet.functional.ConsumerPeek", "#f7b6d2"),
    ("quarks.oplet.functional.ConsumerSink", "#7f7f7f"),
    ("quarks.oplet.functional.Filter", "#c7c7c7"),
    ("quarks.oplet.functional.FlatMapper", "#bcbd22"),
    ("quarks.oplet.functional.Isolate", "#dbdb8d"),
    ("quarks.oplet.functional.Mapper", "#17becf"),
    ("quarks.oplet.functional.SupplierPeriodicSource", "#9edae5"),
    ("quarks.oplet.functional.SupplierSource", "#b5cf6b"),
    ("quarks.oplet.plumbing.PressureReliever", "#e7cb94"),
    ("quarks.oplet.plumbing.TextFileReader", "#ad494a"),
    ("quarks.oplet.plumbing.UnorderedIsolate", "#de9ed6"),
];

/// Ordinal colour scale: keys get range colours in first-seen order.
#[derive(Debug, Clone)]
pub struct OrdinalScale {
    range: &'static [&'static str],
    assigned: HashMap<String, usize>,
}

impl OrdinalScale {
    pub fn new(range: &'static [&'static str]) -> Self {
        Self {
            range,
            assigned: HashMap::new(),
        }
    }

    pub fn category20() -> Self {
        Self::new(&CATEGORY20)
    }

    pub fn color(&mut self, key: &str) -> &'static str {
        let next = self.assigned.len();
        let idx = *self.assigned.entry(key.to_string()).or_insert(next);
        self.range[idx % self.range.len()]
    }
}

/// Session-wide colour state.
///
/// One category-20 scale is shared by vertex ids, unknown operator kinds and
/// stream tags so colours stay put across refreshes.
#[derive(Debug, Clone)]
pub struct Palette {
    shared: OrdinalScale,
    kinds: HashMap<String, String>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            shared: OrdinalScale::category20(),
            kinds: OPLET_KIND_COLORS
                .iter()
                .map(|(k, c)| (k.to_string(), c.to_string()))
                .collect(),
        }
    }
}

impl Palette {
    pub fn kind_color(&mut self, kind: &str) -> String {
        if let Some(c) = self.kinds.get(kind) {
            return c.clone();
        }
        let c = self.shared.color(kind).to_string();
        self.kinds.insert(kind.to_string(), c.clone());
        c
    }

    pub fn vertex_color(&mut self, id: &str) -> String {
        self.shared.color(id).to_string()
    }

    pub fn tag_color(&mut self, tag: &str) -> String {
        self.shared.color(tag).to_string()
    }
}

/// Colour of bucket `index` out of `count` tuple-count buckets.
///
/// A linear scale over `[0, count - 1]`; with a two-point domain only the
/// first two range colours take part, blended in RGB.
pub fn tuple_bucket_color(index: usize, count: usize) -> String {
    let t = if count > 1 {
        (index as f64 / (count - 1) as f64).clamp(0.0, 1.0)
    } else {
        0.0
    };
    interpolate_rgb(CATEGORY10[0], CATEGORY10[1], t)
}

fn interpolate_rgb(from: &str, to: &str, t: f64) -> String {
    let (r0, g0, b0) = parse_hex(from);
    let (r1, g1, b1) = parse_hex(to);
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    format!("#{:02x}{:02x}{:02x}", lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

fn parse_hex(hex: &str) -> (u8, u8, u8) {
    let hex = hex.trim_start_matches('#');
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .unwrap_or(0)
    };
    (channel(0), channel(2), channel(4))
}
