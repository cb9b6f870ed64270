//! Wire layer: JSON shapes served by the console endpoints and their
//! validated in-memory forms.
//!
//! Kept apart from layout and rendering. It owns:
//! - job descriptors and the job directory
//! - the job graph snapshot (vertices + edges)
//! - metric snapshots and metric selectors

pub mod graph;
pub mod jobs;
pub mod metrics;

pub use graph::{Edge, GraphSnapshot, JobGraph, Vertex};
pub use jobs::{JobDirectory, JobInfo};
pub use metrics::{MetricSample, MetricSelector, MetricsSnapshot};

use serde::Deserialize;
use serde::de::Deserializer;

/// Ids and values arrive as strings or as bare JSON numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

pub(crate) fn deserialize_scalar<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Scalar::deserialize(deserializer).map(Scalar::into_string)
}

pub(crate) fn deserialize_opt_scalar<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_string))
}
