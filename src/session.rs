//! Dashboard session: the single owner of everything the user has selected
//! and of the latest data applied from the server.
//!
//! The poller feeds snapshots in; control commands change selections; a
//! [`DashboardFrame`] is produced on demand for rendering.

use crate::Result;
use crate::api::{JobDirectory, JobGraph, JobInfo, MetricSample, MetricSelector};
use crate::bucket::{BucketSet, widest};
use crate::catalog::{MetricCatalog, WIDE_CHART_WIDTH};
use crate::chart::{BarChart, ChartKind, LineChart, LineWindow};
use crate::diagnostics;
use crate::format::{oplet_kind_label, thousands, tuples};
use crate::layout::{Canvas, GraphLayout, PositionedGraph};
use crate::legend::{Legend, LegendEntry, LegendKind};
use crate::model::frame::{
    DashboardFrame, EdgeView, JobView, LayerOption, MetricsPanel, PropertyRow, TagsPanel,
    TextAnchor, TopologyView, VertexView,
};
use crate::model::{FlowValue, NormalizedGraph, normalize};
use crate::palette::{FLOW_VERTEX_COLOR, NEUTRAL_EDGE_COLOR, Palette, tuple_bucket_color};
use crate::tags::{TagRegistry, TagSelection};

use anyhow::bail;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Flow hover text when no counter backs the value.
const NO_VALUE: &str = "No value - counter not present";

/// How vertices and flows are coloured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum Layer {
    /// Flows coloured by tuple-count bucket.
    #[default]
    #[serde(rename = "flow")]
    #[value(name = "flow")]
    Flow,
    /// Uniform flows, vertices by operator kind.
    #[serde(rename = "static")]
    #[value(name = "static")]
    Static,
    #[serde(rename = "opletColor")]
    #[value(name = "opletColor", alias = "kind")]
    OpletKind,
    #[serde(rename = "stags")]
    #[value(name = "stags", alias = "tags")]
    StreamTags,
}

impl Layer {
    pub const ALL: [Layer; 4] = [Layer::Flow, Layer::Static, Layer::OpletKind, Layer::StreamTags];

    pub fn label(self) -> &'static str {
        match self {
            Layer::Flow => "Tuple count",
            Layer::Static => "Static flow",
            Layer::OpletKind => "Oplet kind",
            Layer::StreamTags => "Stream tags",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Layer::Flow => "flow",
            Layer::Static => "static",
            Layer::OpletKind => "opletColor",
            Layer::StreamTags => "stags",
        };
        f.write_str(name)
    }
}

pub struct Session {
    layout: Box<dyn GraphLayout>,
    canvas: Canvas,
    palette: Palette,

    jobs: JobDirectory,
    job: Option<String>,

    layer: Layer,
    graph: Option<NormalizedGraph>,
    positioned: Option<PositionedGraph>,
    /// Dragged vertex positions, by vertex id. Dropped on full changes.
    pins: BTreeMap<String, f64>,

    tags: TagRegistry,
    tag_selection: TagSelection,

    catalog: MetricCatalog,
    metric: Option<MetricSelector>,
    chart: ChartKind,
    metric_samples: Vec<MetricSample>,
    line: Option<LineWindow>,
}

impl Session {
    pub fn new(layout: Box<dyn GraphLayout>, canvas: Canvas) -> Self {
        Self {
            layout,
            canvas,
            palette: Palette::default(),
            jobs: JobDirectory::default(),
            job: None,
            layer: Layer::default(),
            graph: None,
            positioned: None,
            pins: BTreeMap::new(),
            tags: TagRegistry::default(),
            tag_selection: TagSelection::default(),
            catalog: MetricCatalog::default(),
            metric: None,
            chart: ChartKind::default(),
            metric_samples: Vec::new(),
            line: None,
        }
    }

    pub fn selected_job(&self) -> Option<&str> {
        self.job.as_deref()
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn chart(&self) -> ChartKind {
        self.chart
    }

    pub fn metric(&self) -> Option<&MetricSelector> {
        self.metric.as_ref()
    }

    pub fn graph(&self) -> Option<&NormalizedGraph> {
        self.graph.as_ref()
    }

    pub fn positioned(&self) -> Option<&PositionedGraph> {
        self.positioned.as_ref()
    }

    /// Replace the job directory. The selection sticks while its job is
    /// still listed, else moves to the first job. Returns true when the
    /// selected job changed.
    pub fn apply_jobs(&mut self, jobs: Vec<JobInfo>) -> bool {
        self.jobs.replace(jobs);
        let resolved = self.jobs.resolve_selection(self.job.as_deref());
        if resolved == self.job {
            return false;
        }
        tracing::info!(from = ?self.job, to = ?resolved, "job selection changed");
        self.job = resolved;
        self.reset_job_state();
        true
    }

    pub fn select_job(&mut self, id: &str) -> Result<()> {
        if self.jobs.get(id).is_none() {
            bail!("{}", diagnostics::error_message(format!("unknown job {:?}", id)));
        }
        if self.job.as_deref() != Some(id) {
            self.job = Some(id.to_string());
            self.reset_job_state();
        }
        Ok(())
    }

    fn reset_job_state(&mut self) {
        self.graph = None;
        self.positioned = None;
        self.pins.clear();
        self.tags.clear();
        self.tag_selection = TagSelection::All;
        self.metric_samples.clear();
        if let Some(line) = &mut self.line {
            *line = LineWindow::new(line.metric.clone());
        }
    }

    pub fn layer_enabled(&self, layer: Layer) -> bool {
        match layer {
            Layer::Flow => !self.catalog.is_empty(),
            Layer::StreamTags => !self.tags.is_empty(),
            Layer::Static | Layer::OpletKind => true,
        }
    }

    pub fn layers(&self) -> Vec<LayerOption> {
        Layer::ALL
            .iter()
            .map(|&layer| LayerOption {
                layer,
                label: layer.label(),
                enabled: self.layer_enabled(layer),
            })
            .collect()
    }

    pub fn set_layer(&mut self, layer: Layer) -> Result<()> {
        if !self.layer_enabled(layer) {
            bail!(
                "{}",
                diagnostics::error_message(format!("layer {} is not available for this job", layer))
            );
        }
        if self.layer != layer {
            self.layer = layer;
            self.full_relayout();
        }
        Ok(())
    }

    /// Swap in a new graph snapshot for the selected job.
    ///
    /// Same-job refreshes keep dragged positions for vertex ids that are
    /// still present.
    pub fn apply_topology(&mut self, graph: JobGraph, counters: &[MetricSample]) {
        let normalized = normalize(graph, counters);
        self.tags.observe(&normalized.tags);
        if self.layer == Layer::StreamTags && self.tags.is_empty() {
            tracing::debug!("no stream tags, falling back to the static layer");
            self.layer = Layer::Static;
        }
        self.pins
            .retain(|id, _| normalized.vertices.iter().any(|v| &v.id == id));
        self.graph = Some(normalized);
        self.relayout();
    }

    pub fn apply_catalog(&mut self, catalog: MetricCatalog) {
        self.catalog = catalog;
        self.metric = self.catalog.resolve_selection(self.metric.as_ref());
        if self.catalog.is_empty() {
            if self.layer == Layer::Flow {
                tracing::debug!("no metrics, falling back to the oplet kind layer");
                self.layer = Layer::OpletKind;
                self.full_relayout();
            }
            self.line = None;
            self.metric_samples.clear();
            return;
        }
        if self.chart == ChartKind::Line && !self.line_enabled() {
            self.chart = ChartKind::Bar;
            self.line = None;
        }
        let stale = matches!(
            (&self.line, &self.metric),
            (Some(line), Some(metric)) if line.metric != metric.name
        );
        if stale {
            self.line = self.metric.as_ref().map(|m| LineWindow::new(m.name.clone()));
        }
    }

    /// Whether the line chart can show the selected metric: it needs a
    /// metric carried by a single operator.
    pub fn line_enabled(&self) -> bool {
        self.metric
            .as_ref()
            .and_then(|m| self.catalog.get(m))
            .is_some_and(|e| !e.multiple_ops())
    }

    pub fn select_metric(&mut self, selector: MetricSelector) -> Result<()> {
        if self.catalog.get(&selector).is_none() {
            bail!(
                "{}",
                diagnostics::error_message(format!("metric {} is not available", selector))
            );
        }
        self.metric_samples.clear();
        self.metric = Some(selector);
        if !self.line_enabled() {
            if self.chart == ChartKind::Line {
                tracing::info!("metric spans several oplets, switching to the bar chart");
            }
            self.chart = ChartKind::Bar;
            self.line = None;
        } else if self.chart == ChartKind::Line {
            self.line = self.metric.as_ref().map(|m| LineWindow::new(m.name.clone()));
        }
        Ok(())
    }

    pub fn set_chart(&mut self, kind: ChartKind) -> Result<()> {
        match kind {
            ChartKind::Bar => {
                self.chart = ChartKind::Bar;
                self.line = None;
            }
            ChartKind::Line => {
                if !self.line_enabled() {
                    bail!(
                        "{}",
                        diagnostics::error_message(
                            "the line chart needs a metric reported by a single oplet"
                        )
                    );
                }
                if self.chart != ChartKind::Line {
                    self.chart = ChartKind::Line;
                    self.line = self.metric.as_ref().map(|m| LineWindow::new(m.name.clone()));
                }
            }
        }
        Ok(())
    }

    /// Latest values of the selected metric, one per operator.
    pub fn apply_metric_values(&mut self, samples: Vec<MetricSample>) {
        self.metric_samples = samples;
    }

    /// Feed the line chart window.
    pub fn push_line_samples(&mut self, samples: &[MetricSample]) {
        if let Some(line) = &mut self.line {
            for s in samples {
                line.push(s);
            }
        }
    }

    /// Drag a vertex vertically. The position is kept across same-job
    /// refreshes.
    pub fn drag_vertex(&mut self, id: &str, y: f64) -> Result<f64> {
        let Some(graph) = &self.graph else {
            bail!("{}", diagnostics::error_message("no topology loaded"));
        };
        let Some(idx) = graph.vertices.iter().position(|v| v.id == id) else {
            bail!("{}", diagnostics::error_message(format!("unknown vertex {:?}", id)));
        };
        let Some(applied) = self.positioned.as_mut().and_then(|p| p.drag(idx, y)) else {
            bail!("{}", diagnostics::error_message("topology has no layout yet"));
        };
        self.pins.insert(id.to_string(), applied);
        Ok(applied)
    }

    pub fn select_tags(&mut self, selection: TagSelection) {
        if self.tag_selection != selection {
            self.tag_selection = selection;
            self.full_relayout();
        }
    }

    fn full_relayout(&mut self) {
        self.pins.clear();
        self.relayout();
    }

    fn relayout(&mut self) {
        let Some(graph) = &self.graph else {
            self.positioned = None;
            return;
        };
        let links = graph.links(self.layer == Layer::Static);
        let mut positioned = self.layout.layout(graph.vertices.len(), &links, self.canvas);
        for (idx, v) in graph.vertices.iter().enumerate() {
            if let Some(&y) = self.pins.get(&v.id) {
                positioned.drag(idx, y);
            }
        }
        self.positioned = Some(positioned);
    }

    /// Snapshot everything the renderers need.
    pub fn frame(&mut self, sequence: u64, paused: bool, refresh_seconds: u64) -> DashboardFrame {
        let (topology, widest_buckets) = self.topology_view();
        let legend = self.legend(topology.as_ref(), widest_buckets);
        let properties = topology
            .as_ref()
            .map(|t| t.vertices.iter().map(|v| v.tooltip.clone()).collect())
            .unwrap_or_default();
        let metrics = self.metrics_panel();
        let tags = (!self.tags.is_empty()).then(|| TagsPanel {
            tags: self.tags.tags(),
            selectable: self.tags.selectable(),
            selection: self.tag_selection.clone(),
        });

        DashboardFrame {
            sequence,
            paused,
            refresh_seconds,
            interval_field: refresh_seconds.to_string(),
            jobs: self
                .jobs
                .iter()
                .map(|j| JobView {
                    id: j.id.clone(),
                    name: j.display_name().to_string(),
                    state_lines: j.state_lines(),
                })
                .collect(),
            selected_job: self.job.clone(),
            layer: self.layer,
            layers: self.layers(),
            topology,
            legend,
            properties,
            metrics,
            tags,
        }
    }

    fn topology_view(&mut self) -> (Option<TopologyView>, Option<BucketSet>) {
        let (Some(graph), Some(positioned)) = (&self.graph, &self.positioned) else {
            return (None, None);
        };
        let layer = self.layer;
        let canvas = positioned.canvas;
        let mut widest_buckets: Option<BucketSet> = None;

        let mut edges = Vec::with_capacity(graph.edges.len());
        for (i, edge) in graph.edges.iter().enumerate() {
            let band = &positioned.links[i];
            let (color, opacity) = match layer {
                Layer::StreamTags => {
                    let style = self
                        .tags
                        .edge_style(&edge.tags, &self.tag_selection, &mut self.palette);
                    (style.color, style.opacity)
                }
                Layer::Flow => match graph.edge_buckets(edge) {
                    Some(set) => {
                        let color = tuple_bucket_color(set.index, set.len());
                        widest_buckets = Some(widest(widest_buckets, set));
                        (color, 1.0)
                    }
                    None => (NEUTRAL_EDGE_COLOR.to_string(), 1.0),
                },
                Layer::Static | Layer::OpletKind => (NEUTRAL_EDGE_COLOR.to_string(), 1.0),
            };

            let source = &graph.vertices[edge.source];
            let target = &graph.vertices[edge.target];
            let mut title = format!(
                "Oplet name: {}\nOplet kind: {} --> \nOplet name: {}\nOplet kind: {}",
                source.id,
                oplet_kind_label(&source.kind),
                target.id,
                oplet_kind_label(&target.kind)
            );
            if layer == Layer::Flow {
                title.push('\n');
                title.push_str(&flow_text(edge.value));
            }

            edges.push(EdgeView {
                source: edge.source_id.clone(),
                target: edge.target_id.clone(),
                path: positioned.link_path(i),
                color,
                opacity,
                stroke_width: band.dy.sqrt().max(1.0),
                title,
                tags: edge.tags.clone(),
            });
        }
        // Stable: equal widths keep edge order.
        let mut order: Vec<usize> = (0..edges.len()).collect();
        order.sort_by(|&a, &b| positioned.links[b].dy.total_cmp(&positioned.links[a].dy));
        let mut slots: Vec<Option<EdgeView>> = edges.into_iter().map(Some).collect();
        let edges: Vec<EdgeView> = order.into_iter().filter_map(|i| slots[i].take()).collect();

        let half = canvas.node_width / 2.0;
        let mut vertices = Vec::with_capacity(graph.vertices.len());
        for (i, v) in graph.vertices.iter().enumerate() {
            let node = &positioned.nodes[i];
            // Register both keys every pass so shared-scale colours do not
            // depend on the active layer.
            let id_color = self.palette.vertex_color(&v.id);
            let kind_color = self.palette.kind_color(&v.kind);
            let color = match layer {
                Layer::Flow => FLOW_VERTEX_COLOR.to_string(),
                Layer::Static | Layer::OpletKind => kind_color,
                Layer::StreamTags => id_color,
            };
            let radius = node.dy.sqrt();
            let (label_x, label_anchor) = if node.x < canvas.width / 2.0 {
                (6.0 + half + radius, TextAnchor::Start)
            } else {
                (-6.0 + half - radius, TextAnchor::End)
            };
            let tooltip = PropertyRow {
                name: v.id.clone(),
                kind: oplet_kind_label(&v.kind),
                tuple_count: graph
                    .vertex_count(i)
                    .map(thousands)
                    .unwrap_or_else(|| String::from("No value")),
                sources: graph.sources_of(i).join(","),
                targets: graph.targets_of(i).join(","),
            };
            vertices.push(VertexView {
                id: v.id.clone(),
                kind: v.kind.clone(),
                kind_label: oplet_kind_label(&v.kind),
                color,
                x: node.x,
                y: node.y,
                dx: node.dx,
                dy: node.dy,
                radius,
                label_x,
                label_anchor,
                tooltip,
            });
        }

        (
            Some(TopologyView {
                canvas,
                vertices,
                edges,
            }),
            widest_buckets,
        )
    }

    fn legend(&mut self, topology: Option<&TopologyView>, buckets: Option<BucketSet>) -> Option<Legend> {
        let topology = topology?;
        let kind = match self.layer {
            Layer::Flow => LegendKind::TupleCount,
            Layer::OpletKind => LegendKind::OpletKind,
            Layer::StreamTags => LegendKind::Tag,
            Layer::Static => return None,
        };
        let entries: Vec<LegendEntry> = match kind {
            LegendKind::TupleCount => {
                let set = buckets?;
                let n = set.len();
                set.buckets
                    .into_iter()
                    .map(|b| LegendEntry::ordered(b.name, tuple_bucket_color(b.id, n), b.id))
                    .collect()
            }
            LegendKind::OpletKind => topology
                .vertices
                .iter()
                .map(|v| LegendEntry::new(v.kind_label.clone(), v.color.clone()))
                .collect(),
            LegendKind::Tag => self
                .tags
                .legend_entries(&self.tag_selection, &mut self.palette),
        };
        if entries.is_empty() {
            return None;
        }
        Some(Legend::build(kind, kind.title(), entries))
    }

    fn metrics_panel(&mut self) -> Option<MetricsPanel> {
        if self.catalog.is_empty() {
            return None;
        }
        let selected = self.metric.clone();
        let rate_unit = selected
            .as_ref()
            .and_then(|m| self.catalog.rate_unit_for(m))
            .map(str::to_string);
        let chart_width = match self.chart {
            ChartKind::Bar => self.catalog.chart_width(selected.as_ref()),
            ChartKind::Line => crate::catalog::CHART_WIDTH,
        };
        let svg = match self.chart {
            ChartKind::Bar if !self.metric_samples.is_empty() => {
                let colors = self.operator_colors();
                let name = selected.as_ref().map(|m| m.name.as_str()).unwrap_or_default();
                let chart = BarChart::build(
                    name,
                    &self.metric_samples,
                    chart_width,
                    chart_width == WIDE_CHART_WIDTH,
                    &colors,
                );
                Some(chart.to_svg())
            }
            ChartKind::Line => self
                .line
                .as_ref()
                .filter(|w| !w.is_empty())
                .map(|w| LineChart::build(w).to_svg()),
            ChartKind::Bar => None,
        };
        Some(MetricsPanel {
            options: self.catalog.options(),
            selected,
            rate_unit,
            chart: self.chart,
            line_enabled: self.line_enabled(),
            chart_width,
            svg,
        })
    }

    fn operator_colors(&mut self) -> BTreeMap<String, String> {
        let Some(graph) = &self.graph else {
            return BTreeMap::new();
        };
        graph
            .vertices
            .iter()
            .map(|v| (v.id.clone(), self.palette.kind_color(&v.kind)))
            .collect()
    }
}

/// Value line of a flow's hover text on the tuple-count layer.
fn flow_text(value: Option<FlowValue>) -> String {
    match value {
        Some(FlowValue::Observed(0)) => String::from("0"),
        Some(FlowValue::Observed(v)) => tuples(v),
        Some(FlowValue::Derived(_)) | None => String::from(NO_VALUE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{GraphSnapshot, MetricsSnapshot};
    use crate::layout::Sankey;
    use pretty_assertions::assert_eq;

    fn session() -> Session {
        Session::new(Box::new(Sankey::default()), Canvas::default())
    }

    fn jobs(json: &str) -> Vec<JobInfo> {
        serde_json::from_str(json).unwrap()
    }

    fn graph() -> JobGraph {
        serde_json::from_str::<GraphSnapshot>(
            r#"{
                "vertices": [
                    {"id": "OP_0", "invocation": {"kind": "quarks.oplet.core.Source"}},
                    {"id": "OP_1", "invocation": {"kind": "quarks.oplet.functional.Filter"}},
                    {"id": "OP_2", "invocation": {"kind": "quarks.oplet.core.Sink"}}
                ],
                "edges": [
                    {"sourceId": "OP_0", "targetId": "OP_1", "tags": ["alerts"]},
                    {"sourceId": "OP_1", "targetId": "OP_2"}
                ]
            }"#,
        )
        .unwrap()
        .validate_and_build()
        .unwrap()
    }

    fn counter(op: &str, value: &str) -> MetricSample {
        MetricSample {
            op_id: op.into(),
            name: "Count".into(),
            kind: "counter".into(),
            value: value.into(),
        }
    }

    fn catalog(json: &str) -> MetricCatalog {
        MetricCatalog::from_snapshot(&serde_json::from_str::<MetricsSnapshot>(json).unwrap())
    }

    const CATALOG: &str = r#"{"ops": [
        {"opId": "OP_0", "metrics": [{"name": "Count", "type": "counter", "value": "10"}]},
        {"opId": "OP_1", "metrics": [
            {"name": "Count", "type": "counter", "value": "40"},
            {"name": "TupleRateMeter", "type": "meter", "value": "1.5"}
        ]}
    ]}"#;

    fn loaded() -> Session {
        let mut s = session();
        s.apply_jobs(jobs(r#"[{"id": "JOB_0", "name": "sensors"}]"#));
        s.apply_catalog(catalog(CATALOG));
        s.apply_topology(graph(), &[counter("OP_0", "10"), counter("OP_1", "40")]);
        s
    }

    #[test]
    fn first_job_is_selected() {
        let mut s = session();
        assert!(s.apply_jobs(jobs(r#"[{"id": "JOB_0"}, {"id": "JOB_1"}]"#)));
        assert_eq!(s.selected_job(), Some("JOB_0"));
        s.select_job("JOB_1").unwrap();
        assert!(!s.apply_jobs(jobs(r#"[{"id": "JOB_0"}, {"id": "JOB_1"}]"#)));
        assert_eq!(s.selected_job(), Some("JOB_1"));
        assert!(s.select_job("nope").is_err());
    }

    #[test]
    fn flow_layer_colours_edges_and_builds_tuple_legend() {
        let mut s = loaded();
        let frame = s.frame(1, false, 5);
        let topology = frame.topology.unwrap();
        assert_eq!(topology.vertices[0].color, FLOW_VERTEX_COLOR);
        assert!(topology.edges.iter().all(|e| e.title.contains("tuples")));

        let legend = frame.legend.unwrap();
        assert_eq!(legend.kind, LegendKind::TupleCount);
        assert_eq!(legend.title, "Tuple count");
        assert_eq!(legend.rows[0].label, "0");
    }

    #[test]
    fn empty_catalog_disables_flow_layer() {
        let mut s = loaded();
        s.apply_catalog(MetricCatalog::default());
        assert_eq!(s.layer(), Layer::OpletKind);
        assert!(s.set_layer(Layer::Flow).is_err());
        let frame = s.frame(2, false, 5);
        assert!(frame.metrics.is_none());
        assert!(!frame.layers[0].enabled);
        assert_eq!(frame.legend.unwrap().kind, LegendKind::OpletKind);
    }

    #[test]
    fn untagged_job_falls_back_to_static() {
        let mut s = session();
        s.apply_jobs(jobs(r#"[{"id": "JOB_0"}]"#));
        s.apply_catalog(catalog(CATALOG));
        s.apply_topology(graph(), &[]);
        s.set_layer(Layer::StreamTags).unwrap();

        let untagged = serde_json::from_str::<GraphSnapshot>(
            r#"{"vertices": [{"id": "A"}, {"id": "B"}], "edges": [{"sourceId": "A", "targetId": "B"}]}"#,
        )
        .unwrap()
        .validate_and_build()
        .unwrap();
        s.apply_jobs(jobs(r#"[{"id": "JOB_1"}]"#));
        s.apply_topology(untagged, &[]);
        assert_eq!(s.layer(), Layer::Static);
    }

    #[test]
    fn multiple_ops_metric_forces_bar_chart() {
        let mut s = loaded();
        s.select_metric(MetricSelector::new("TupleRateMeter", "meter")).unwrap();
        s.set_chart(ChartKind::Line).unwrap();
        assert_eq!(s.chart(), ChartKind::Line);

        s.select_metric(MetricSelector::new("Count", "counter")).unwrap();
        assert_eq!(s.chart(), ChartKind::Bar);
        assert!(!s.line_enabled());
        assert!(s.set_chart(ChartKind::Line).is_err());

        let panel = s.frame(3, false, 5).metrics.unwrap();
        assert!(!panel.line_enabled);
        assert_eq!(panel.chart, ChartKind::Bar);
    }

    #[test]
    fn drag_is_kept_across_same_job_refresh() {
        let fan_out = || {
            serde_json::from_str::<GraphSnapshot>(
                r#"{"vertices": [{"id": "A"}, {"id": "B"}, {"id": "C"}],
                    "edges": [{"sourceId": "A", "targetId": "B"}, {"sourceId": "A", "targetId": "C"}]}"#,
            )
            .unwrap()
            .validate_and_build()
            .unwrap()
        };
        let counters = [counter("B", "10"), counter("C", "30")];
        let mut s = session();
        s.apply_jobs(jobs(r#"[{"id": "JOB_0"}]"#));
        s.apply_catalog(catalog(CATALOG));
        s.apply_topology(fan_out(), &counters);

        assert_eq!(s.drag_vertex("B", 100.0).unwrap(), 100.0);
        assert!(s.drag_vertex("Z", 1.0).is_err());

        s.apply_topology(fan_out(), &counters);
        assert_eq!(s.positioned().unwrap().nodes[1].y, 100.0);

        // A layer change is a full change: pins are dropped.
        s.set_layer(Layer::Static).unwrap();
        assert_ne!(s.positioned().unwrap().nodes[1].y, 100.0);
    }

    #[test]
    fn stream_tag_layer_dims_unselected_flows() {
        let mut s = loaded();
        s.set_layer(Layer::StreamTags).unwrap();
        let frame = s.frame(4, false, 5);
        let tags = frame.tags.unwrap();
        assert_eq!(tags.tags, vec!["Multiple tags", "alerts"]);
        let topology = frame.topology.unwrap();
        let tagged = topology.edges.iter().find(|e| e.source == "OP_0").unwrap();
        assert_ne!(tagged.color, NEUTRAL_EDGE_COLOR);
        assert_eq!(frame.legend.unwrap().kind, LegendKind::Tag);
    }

    #[test]
    fn tooltips_name_kind_and_neighbours() {
        let mut s = loaded();
        let frame = s.frame(5, false, 5);
        let filter = &frame.properties[1];
        assert_eq!(filter.name, "OP_1");
        assert_eq!(filter.kind, "Filter (quarks.oplet.functional)");
        assert_eq!(filter.sources, "OP_0");
        assert_eq!(filter.targets, "OP_2");
        assert_eq!(filter.tuple_count, "40");
    }

    #[test]
    fn same_inputs_render_identically() {
        let a = loaded().frame(7, false, 5);
        let b = loaded().frame(7, false, 5);
        assert_eq!(a, b);
    }
}
