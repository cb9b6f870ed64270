//! Available-metrics catalog (`metrics?job=<id>&availableMetrics=all`).
//!
//! One entry per metric name, listing every operator that carries it. The
//! catalog backs the metric picker: option labels, the rate-unit hint and
//! the chart width.

use crate::api::{MetricSelector, MetricsSnapshot};

use serde::Serialize;
use std::collections::BTreeMap;

/// Pseudo-metric whose value is the unit of every rate metric.
pub const RATE_UNIT: &str = "RateUnit";

/// Option labels longer than this get a truncated operator list.
pub const MAX_OPS_LABEL: usize = 100;

pub const CHART_WIDTH: f64 = 800.0;
pub const WIDE_CHART_WIDTH: f64 = 1100.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricEntry {
    pub name: String,
    /// Type of the first operator reporting this name.
    pub kind: String,
    pub value: Option<String>,
    pub ops: Vec<String>,
}

impl MetricEntry {
    pub fn selector(&self) -> MetricSelector {
        MetricSelector::new(&self.name, &self.kind)
    }

    pub fn multiple_ops(&self) -> bool {
        self.ops.len() > 1
    }

    /// `"<name>, oplets: <ops>"`. Returns whether the operator list was cut.
    pub fn label(&self) -> (String, bool) {
        let joined = self.ops.join(",");
        if joined.chars().count() <= MAX_OPS_LABEL {
            return (format!("{}, oplets: {}", self.name, joined), false);
        }
        let scale = MAX_OPS_LABEL as f64 / joined.chars().count() as f64;
        let keep = (scale * self.ops.len() as f64).trunc() as usize;
        let cut = self.ops[..keep.min(self.ops.len())].join(",");
        (format!("{}, oplets: {} ...", self.name, cut), true)
    }
}

/// One entry of the metric picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricOption {
    pub value: String,
    pub label: String,
    pub multiple_ops: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricCatalog {
    entries: Vec<MetricEntry>,
    rate_unit: Option<String>,
}

impl MetricCatalog {
    pub fn from_snapshot(snapshot: &MetricsSnapshot) -> MetricCatalog {
        let mut by_name: BTreeMap<String, MetricEntry> = BTreeMap::new();
        for op in &snapshot.ops {
            for m in &op.metrics {
                by_name
                    .entry(m.name.clone())
                    .or_insert_with(|| MetricEntry {
                        name: m.name.clone(),
                        kind: m.kind.clone(),
                        value: m.value.clone(),
                        ops: Vec::new(),
                    })
                    .ops
                    .push(op.op_id.clone());
            }
        }

        let rate_unit = by_name
            .remove(RATE_UNIT)
            .and_then(|e| e.value)
            .filter(|v| !v.is_empty());

        MetricCatalog {
            entries: by_name.into_values().collect(),
            rate_unit,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by name.
    pub fn entries(&self) -> &[MetricEntry] {
        &self.entries
    }

    pub fn get(&self, selector: &MetricSelector) -> Option<&MetricEntry> {
        self.entries
            .iter()
            .find(|e| e.name == selector.name && e.kind == selector.kind)
    }

    pub fn options(&self) -> Vec<MetricOption> {
        self.entries
            .iter()
            .map(|e| MetricOption {
                value: e.selector().to_string(),
                label: e.label().0,
                multiple_ops: e.multiple_ops(),
            })
            .collect()
    }

    /// Keep `previous` while it is still offered, else take the first entry.
    pub fn resolve_selection(&self, previous: Option<&MetricSelector>) -> Option<MetricSelector> {
        match previous {
            Some(sel) if self.get(sel).is_some() => Some(sel.clone()),
            _ => self.entries.first().map(MetricEntry::selector),
        }
    }

    /// Unit label shown next to a non-counter selection.
    pub fn rate_unit_for(&self, selected: &MetricSelector) -> Option<&str> {
        match &self.rate_unit {
            Some(unit) if !selected.is_counter() => Some(unit.as_str()),
            _ => None,
        }
    }

    /// Bar chart width: wide when some option label was truncated, unless
    /// the rate unit is on display.
    pub fn chart_width(&self, selected: Option<&MetricSelector>) -> f64 {
        if selected.is_some_and(|s| self.rate_unit_for(s).is_some()) {
            return CHART_WIDTH;
        }
        if self.entries.iter().any(|e| e.label().1) {
            WIDE_CHART_WIDTH
        } else {
            CHART_WIDTH
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snapshot(json: &str) -> MetricsSnapshot {
        serde_json::from_str(json).unwrap()
    }

    const AVAILABLE: &str = r#"{"jobId": "JOB_0", "ops": [
        {"opId": "OP_2", "metrics": [
            {"name": "TupleRateMeter", "type": "meter", "value": "3.2"},
            {"name": "RateUnit", "type": "string", "value": "events/second"}
        ]},
        {"opId": "OP_1", "metrics": [
            {"name": "Count", "type": "counter", "value": "10"},
            {"name": "TupleRateMeter", "type": "meter", "value": "1.0"}
        ]}
    ]}"#;

    #[test]
    fn groups_by_name_and_hides_rate_unit() {
        let catalog = MetricCatalog::from_snapshot(&snapshot(AVAILABLE));
        let names: Vec<&str> = catalog.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Count", "TupleRateMeter"]);
        assert_eq!(catalog.entries()[1].ops, vec!["OP_2", "OP_1"]);
        assert!(catalog.entries()[1].multiple_ops());
        assert!(!catalog.entries()[0].multiple_ops());

        let meter = MetricSelector::new("TupleRateMeter", "meter");
        assert_eq!(catalog.rate_unit_for(&meter), Some("events/second"));
        assert_eq!(catalog.rate_unit_for(&MetricSelector::new("Count", "counter")), None);
    }

    #[test]
    fn option_values_use_query_form() {
        let catalog = MetricCatalog::from_snapshot(&snapshot(AVAILABLE));
        let options = catalog.options();
        assert_eq!(options[0].value, "name:Count,type:counter");
        assert_eq!(options[1].label, "TupleRateMeter, oplets: OP_2,OP_1");
    }

    #[test]
    fn selection_survives_while_offered() {
        let catalog = MetricCatalog::from_snapshot(&snapshot(AVAILABLE));
        let meter = MetricSelector::new("TupleRateMeter", "meter");
        assert_eq!(catalog.resolve_selection(Some(&meter)), Some(meter));
        let gone = MetricSelector::new("Gone", "long");
        assert_eq!(
            catalog.resolve_selection(Some(&gone)),
            Some(MetricSelector::new("Count", "counter"))
        );
        assert_eq!(MetricCatalog::default().resolve_selection(None), None);
    }

    #[test]
    fn long_operator_lists_are_truncated_and_widen_the_chart() {
        let ops: Vec<String> = (0..30).map(|i| format!("OP_{}", i)).collect();
        let entry = MetricEntry {
            name: "Count".into(),
            kind: "counter".into(),
            value: None,
            ops,
        };
        let (label, truncated) = entry.label();
        assert!(truncated);
        assert!(label.ends_with(" ..."));
        // 30 ops join to 169 chars; 100/169 of 30 ops keeps 17.
        assert!(label.ends_with("OP_15,OP_16 ..."));

        let catalog = MetricCatalog {
            entries: vec![entry],
            rate_unit: None,
        };
        assert_eq!(catalog.chart_width(None), WIDE_CHART_WIDTH);
    }

    #[test]
    fn empty_snapshot_gives_empty_catalog() {
        let catalog = MetricCatalog::from_snapshot(&MetricsSnapshot::default());
        assert!(catalog.is_empty());
        assert_eq!(catalog.chart_width(None), CHART_WIDTH);
    }
}
