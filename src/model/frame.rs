//! Serializable state of one dashboard render.
//!
//! The HTML page embeds a frame as JSON next to the inline SVGs it was drawn
//! from, so everything a viewer can hover or read is present here as data.

use crate::api::MetricSelector;
use crate::catalog::MetricOption;
use crate::chart::ChartKind;
use crate::layout::Canvas;
use crate::legend::Legend;
use crate::session::Layer;
use crate::tags::TagSelection;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardFrame {
    pub sequence: u64,
    pub paused: bool,
    pub refresh_seconds: u64,
    /// Text of the interval field, which can differ from the running
    /// interval after rejected input.
    pub interval_field: String,
    pub jobs: Vec<JobView>,
    pub selected_job: Option<String>,
    pub layer: Layer,
    pub layers: Vec<LayerOption>,
    pub topology: Option<TopologyView>,
    pub legend: Option<Legend>,
    pub properties: Vec<PropertyRow>,
    pub metrics: Option<MetricsPanel>,
    pub tags: Option<TagsPanel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobView {
    pub id: String,
    pub name: String,
    pub state_lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerOption {
    pub layer: Layer,
    pub label: &'static str,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopologyView {
    pub canvas: Canvas,
    pub vertices: Vec<VertexView>,
    /// Widest first, the order they are drawn in.
    pub edges: Vec<EdgeView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAnchor {
    Start,
    End,
}

impl TextAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::End => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VertexView {
    pub id: String,
    pub kind: String,
    pub kind_label: String,
    pub color: String,
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
    pub radius: f64,
    /// Label offset relative to the node's left edge.
    pub label_x: f64,
    pub label_anchor: TextAnchor,
    pub tooltip: PropertyRow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeView {
    pub source: String,
    pub target: String,
    pub path: String,
    pub color: String,
    pub opacity: f64,
    pub stroke_width: f64,
    pub title: String,
    pub tags: Vec<String>,
}

/// One row of the oplet properties table (also the node tooltip).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyRow {
    pub name: String,
    pub kind: String,
    pub tuple_count: String,
    pub sources: String,
    pub targets: String,
}

impl PropertyRow {
    pub const HEADERS: [&'static str; 5] = ["Name", "Oplet kind", "Tuple count", "Sources", "Targets"];

    pub fn cells(&self) -> [&str; 5] {
        [
            self.name.as_str(),
            self.kind.as_str(),
            self.tuple_count.as_str(),
            self.sources.as_str(),
            self.targets.as_str(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsPanel {
    pub options: Vec<MetricOption>,
    pub selected: Option<MetricSelector>,
    pub rate_unit: Option<String>,
    pub chart: ChartKind,
    pub line_enabled: bool,
    pub chart_width: f64,
    pub svg: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagsPanel {
    pub tags: Vec<String>,
    pub selectable: Vec<String>,
    pub selection: TagSelection,
}
