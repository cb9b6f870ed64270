//! Topology normalizer: joins counter samples onto the flows of a job graph.

use crate::api::{JobGraph, MetricSample, Vertex};
use crate::bucket::BucketSet;
use crate::layout::FlowLink;

use serde::Serialize;
use std::collections::BTreeSet;

/// Layout weight of a flow whose counter reads zero, so it stays visible.
pub const ZERO_FLOW_WEIGHT: f64 = 0.45;

/// Layout weight of a flow with no usable value.
pub const STATIC_FLOW_WEIGHT: f64 = 0.001;

/// Tuple count carried by one flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "count", rename_all = "snake_case")]
pub enum FlowValue {
    /// Read from a counter on one of the edge's endpoints.
    Observed(i64),
    /// Placeholder for an edge with no counter on either endpoint.
    Derived(i64),
}

impl FlowValue {
    pub fn count(self) -> i64 {
        match self {
            FlowValue::Observed(v) | FlowValue::Derived(v) => v,
        }
    }

    pub fn is_derived(self) -> bool {
        matches!(self, FlowValue::Derived(_))
    }

    pub fn is_zero(self) -> bool {
        matches!(self, FlowValue::Observed(0))
    }

    pub fn layout_weight(self) -> f64 {
        match self {
            FlowValue::Observed(0) => ZERO_FLOW_WEIGHT,
            v if v.count() > 0 => v.count() as f64,
            _ => STATIC_FLOW_WEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowEdge {
    pub source: usize,
    pub target: usize,
    pub source_id: String,
    pub target_id: String,
    pub tags: Vec<String>,
    pub value: Option<FlowValue>,
}

/// Job graph with a value on every flow (when any counter exists).
#[derive(Debug, Clone, Default)]
pub struct NormalizedGraph {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<FlowEdge>,
    /// Every parsed counter reading of this snapshot.
    pub counters: Vec<i64>,
    /// Stream tags present on the flows, sorted.
    pub tags: BTreeSet<String>,
}

/// First-quartile placeholder: a quarter of the largest counter, truncated.
pub fn first_quartile(values: &[i64]) -> Option<i64> {
    let max = *values.iter().max()?;
    Some((max as f64 * 0.25).trunc() as i64)
}

/// Join counter samples onto the graph's flows.
///
/// A sample applies to every edge whose source or target is its operator;
/// later samples overwrite earlier ones. When at least one counter parsed,
/// edges left without a value get the first-quartile placeholder, flagged as
/// derived. Without counters every edge stays unmeasured.
pub fn normalize(graph: JobGraph, samples: &[MetricSample]) -> NormalizedGraph {
    let readings: Vec<(&str, i64)> = samples
        .iter()
        .filter_map(|s| match s.count() {
            Some(v) => Some((s.op_id.as_str(), v)),
            None => {
                tracing::debug!(op = %s.op_id, value = %s.value, "ignoring unparsable counter");
                None
            }
        })
        .collect();
    let counters: Vec<i64> = readings.iter().map(|(_, v)| *v).collect();

    let mut edges: Vec<FlowEdge> = graph
        .edges
        .into_iter()
        .map(|e| FlowEdge {
            source: e.source,
            target: e.target,
            source_id: e.source_id,
            target_id: e.target_id,
            tags: e.tags,
            value: None,
        })
        .collect();

    for (op_id, value) in &readings {
        for edge in edges
            .iter_mut()
            .filter(|e| e.source_id == *op_id || e.target_id == *op_id)
        {
            edge.value = Some(FlowValue::Observed(*value));
        }
    }

    if let Some(placeholder) = first_quartile(&counters) {
        for edge in edges.iter_mut().filter(|e| e.value.is_none()) {
            edge.value = Some(FlowValue::Derived(placeholder));
        }
    }

    let tags = edges
        .iter()
        .flat_map(|e| e.tags.iter().cloned())
        .collect::<BTreeSet<_>>();

    NormalizedGraph {
        vertices: graph.vertices,
        edges,
        counters,
        tags,
    }
}

impl NormalizedGraph {
    /// Layout input. The static view and unmeasured graphs draw every flow
    /// with the same thin weight.
    pub fn links(&self, uniform: bool) -> Vec<FlowLink> {
        self.edges
            .iter()
            .map(|e| FlowLink {
                source: e.source,
                target: e.target,
                weight: match e.value {
                    Some(v) if !uniform => v.layout_weight(),
                    _ => STATIC_FLOW_WEIGHT,
                },
            })
            .collect()
    }

    /// Bucket partition for one edge of this snapshot.
    pub fn edge_buckets(&self, edge: &FlowEdge) -> Option<BucketSet> {
        let value = edge.value?;
        BucketSet::classify(&self.counters, value.count(), value.is_derived())
    }

    /// Tuple count shown for a vertex: the larger of its observed inflow and
    /// outflow. `None` when no incident flow was measured.
    pub fn vertex_count(&self, vertex: usize) -> Option<i64> {
        let mut inflow: Option<i64> = None;
        let mut outflow: Option<i64> = None;
        for e in &self.edges {
            let Some(FlowValue::Observed(v)) = e.value else {
                continue;
            };
            if e.target == vertex {
                let sum = inflow.get_or_insert(0);
                *sum = sum.saturating_add(v);
            }
            if e.source == vertex {
                let sum = outflow.get_or_insert(0);
                *sum = sum.saturating_add(v);
            }
        }
        match (inflow, outflow) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(0).max(b.unwrap_or(0))),
        }
    }

    pub fn sources_of(&self, vertex: usize) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.target == vertex)
            .map(|e| e.source_id.as_str())
            .collect()
    }

    pub fn targets_of(&self, vertex: usize) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.source == vertex)
            .map(|e| e.target_id.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::GraphSnapshot;
    use pretty_assertions::assert_eq;

    fn graph(json: &str) -> JobGraph {
        serde_json::from_str::<GraphSnapshot>(json)
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

    const CHAIN: &str = r#"{
        "vertices": [{"id": "A"}, {"id": "B"}, {"id": "C"}, {"id": "D"}],
        "edges": [
            {"sourceId": "A", "targetId": "B"},
            {"sourceId": "C", "targetId": "D", "tags": ["alerts"]}
        ]
    }"#;

    #[test]
    fn unmatched_edges_get_derived_first_quartile() {
        let n = normalize(graph(CHAIN), &[counter("A", "0"), counter("B", "50")]);

        // A -> B is matched by both samples; the later one wins.
        assert_eq!(n.edges[0].value, Some(FlowValue::Observed(50)));
        // C -> D has no counter: 0.25 * 50 truncated.
        assert_eq!(n.edges[1].value, Some(FlowValue::Derived(12)));
        assert!(n.edges[1].value.unwrap().is_derived());
    }

    #[test]
    fn observed_zero_is_kept_and_flagged() {
        let n = normalize(graph(CHAIN), &[counter("B", "50"), counter("A", "0")]);
        let v = n.edges[0].value.unwrap();
        assert!(v.is_zero());
        assert_eq!(v.layout_weight(), ZERO_FLOW_WEIGHT);
        assert_eq!(n.edge_buckets(&n.edges[0]).unwrap().index, 0);
    }

    #[test]
    fn without_counters_edges_stay_unmeasured() {
        let n = normalize(graph(CHAIN), &[]);
        assert!(n.edges.iter().all(|e| e.value.is_none()));
        assert!(n.links(false).iter().all(|l| l.weight == STATIC_FLOW_WEIGHT));
        assert_eq!(n.tags.iter().collect::<Vec<_>>(), vec!["alerts"]);
    }

    #[test]
    fn derived_edges_bucket_as_not_applicable() {
        let n = normalize(graph(CHAIN), &[counter("A", "0"), counter("B", "50")]);
        let set = n.edge_buckets(&n.edges[1]).unwrap();
        assert_eq!(set.index, 0);
        assert_eq!(set.buckets[0].name, crate::bucket::NOT_APPLICABLE);
    }

    #[test]
    fn vertex_counts_use_observed_flows() {
        let n = normalize(graph(CHAIN), &[counter("A", "30")]);
        assert_eq!(n.vertex_count(0), Some(30));
        assert_eq!(n.vertex_count(1), Some(30));
        assert_eq!(n.vertex_count(2), None);
        assert_eq!(n.sources_of(1), vec!["A"]);
        assert_eq!(n.targets_of(2), vec!["D"]);
    }

    #[test]
    fn extreme_counters_saturate() {
        let fan_in = r#"{
            "vertices": [{"id": "A"}, {"id": "B"}, {"id": "C"}],
            "edges": [
                {"sourceId": "A", "targetId": "C"},
                {"sourceId": "B", "targetId": "C"}
            ]
        }"#;
        let n = normalize(
            graph(fan_in),
            &[counter("A", "9000000000000000000"), counter("B", "9000000000000000000")],
        );
        assert_eq!(n.vertex_count(2), Some(i64::MAX));
    }
}
