//! Metric snapshots (`metrics?job=<id>&metric=...` and `availableMetrics=all`).
//!
//! JSON shape:
//! {
//!   "jobId": "JOB_0",
//!   "ops": [
//!     { "opId": "OP_4", "metrics": [ { "name": "Count", "type": "long", "value": "1200" } ] },
//!     ...
//!   ]
//! }

use super::{deserialize_opt_scalar, deserialize_scalar};
use crate::Result;
use crate::diagnostics;
use crate::format::{parse_leading_float, parse_leading_int};

use anyhow::anyhow;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const SELECTOR_RE: &str = r"^name:([^,]+),type:(.+)$";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    #[serde(default, deserialize_with = "deserialize_opt_scalar")]
    pub job_id: Option<String>,

    #[serde(default)]
    pub ops: Vec<OpMetrics>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpMetrics {
    #[serde(deserialize_with = "deserialize_scalar")]
    pub op_id: String,

    #[serde(default)]
    pub metrics: Vec<RawMetric>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawMetric {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default, deserialize_with = "deserialize_opt_scalar")]
    pub value: Option<String>,
}

/// One metric value attributed to one operator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    pub op_id: String,
    pub name: String,
    pub kind: String,
    pub value: String,
}

impl MetricsSnapshot {
    /// Flatten to one sample per (operator, metric), in response order.
    pub fn samples(&self) -> Vec<MetricSample> {
        self.ops
            .iter()
            .flat_map(|op| {
                op.metrics.iter().map(move |m| MetricSample {
                    op_id: op.op_id.clone(),
                    name: m.name.clone(),
                    kind: m.kind.clone(),
                    value: m.value.clone().unwrap_or_default(),
                })
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl MetricSample {
    /// Integer counter reading, if the value parses.
    pub fn count(&self) -> Option<i64> {
        parse_leading_int(&self.value)
    }

    /// Numeric reading following the declared type.
    pub fn numeric(&self) -> Option<f64> {
        match self.kind.as_str() {
            "long" => parse_leading_int(&self.value).map(|v| v as f64),
            _ => parse_leading_float(&self.value),
        }
    }
}

/// Metric query key, `name:<name>,type:<type>` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MetricSelector {
    pub name: String,
    pub kind: String,
}

impl MetricSelector {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }

    /// Selector used to fetch the tuple counters that size the topology edges.
    pub fn tuple_counter() -> Self {
        Self::new("Count", "counter")
    }

    pub fn is_counter(&self) -> bool {
        self.kind.eq_ignore_ascii_case("counter") || self.name.to_uppercase().contains("COUNT")
    }
}

impl fmt::Display for MetricSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "name:{},type:{}", self.name, self.kind)
    }
}

impl FromStr for MetricSelector {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let re = Regex::new(SELECTOR_RE)?;
        let caps = re.captures(s.trim()).ok_or_else(|| {
            anyhow!(diagnostics::error_message(format!(
                "metric selector must look like name:<name>,type:<type>, got {:?}",
                s
            )))
        })?;
        Ok(Self::new(&caps[1], &caps[2]))
    }
}
