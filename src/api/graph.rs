//! Job graph snapshot (`jobs?jobgraph=true&jobId=<id>`).
//!
//! JSON shape:
//! {
//!   "vertices": [
//!     { "id": "OP_0", "invocation": { "kind": "quarks.oplet.core.Source" } },
//!     ...
//!   ],
//!   "edges": [
//!     { "sourceId": "OP_0", "sourceOutputPort": 0,
//!       "targetId": "OP_1", "targetInputPort": 0,
//!       "tags": ["sensors"] },
//!     ...
//!   ]
//! }
//!
//! We check vertex ids are unique, drop edges whose endpoints do not resolve,
//! and resolve the remaining edges to vertex indices.

use super::deserialize_scalar;
use crate::Result;
use crate::diagnostics;

use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub vertices: Vec<RawVertex>,

    #[serde(default)]
    pub edges: Vec<RawEdge>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawVertex {
    #[serde(deserialize_with = "deserialize_scalar")]
    pub id: String,

    #[serde(default)]
    pub invocation: Invocation,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Invocation {
    #[serde(default)]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEdge {
    #[serde(deserialize_with = "deserialize_scalar")]
    pub source_id: String,

    #[serde(default)]
    pub source_output_port: u32,

    #[serde(deserialize_with = "deserialize_scalar")]
    pub target_id: String,

    #[serde(default)]
    pub target_input_port: u32,

    #[serde(default)]
    pub tags: Vec<String>,
}

/// Validated oplet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vertex {
    pub id: String,
    pub kind: String,
}

/// Validated flow with both endpoints resolved to vertex indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    pub source_id: String,
    pub target_id: String,
    pub tags: Vec<String>,
}

/// Topology of one job with index-based adjacency.
#[derive(Debug, Clone, Default)]
pub struct JobGraph {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
    pub index: BTreeMap<String, usize>,
}

impl GraphSnapshot {
    /// Check ids and resolve edges.
    ///
    /// Duplicate vertex ids are an error. Edges naming an unknown vertex cannot
    /// be drawn; they are dropped with a warning.
    pub fn validate_and_build(&self) -> Result<JobGraph> {
        let mut index: BTreeMap<String, usize> = BTreeMap::new();
        let mut vertices = Vec::with_capacity(self.vertices.len());
        for raw in &self.vertices {
            if index.contains_key(&raw.id) {
                bail!(
                    "{}",
                    diagnostics::error_message(format!(
                        "duplicate vertex id in job graph: {}",
                        raw.id
                    ))
                );
            }
            index.insert(raw.id.clone(), vertices.len());
            vertices.push(Vertex {
                id: raw.id.clone(),
                kind: raw.invocation.kind.clone(),
            });
        }

        let mut edges = Vec::with_capacity(self.edges.len());
        for raw in &self.edges {
            let (Some(&source), Some(&target)) = (index.get(&raw.source_id), index.get(&raw.target_id))
            else {
                diagnostics::warn(format!(
                    "edge {} -> {} references an unknown vertex; not rendered",
                    raw.source_id, raw.target_id
                ));
                continue;
            };

            let mut tags = raw.tags.clone();
            tags.sort();
            tags.dedup();

            edges.push(Edge {
                source,
                target,
                source_id: raw.source_id.clone(),
                target_id: raw.target_id.clone(),
                tags,
            });
        }

        Ok(JobGraph {
            vertices,
            edges,
            index,
        })
    }
}

impl JobGraph {
    pub fn vertex(&self, id: &str) -> Option<&Vertex> {
        self.index.get(id).map(|&i| &self.vertices[i])
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snapshot(json: &str) -> GraphSnapshot {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn resolves_edges_to_indices() {
        let g = snapshot(
            r#"{
                "vertices": [
                    {"id": "OP_0", "invocation": {"kind": "quarks.oplet.core.Source"}},
                    {"id": "OP_1", "invocation": {"kind": "quarks.oplet.core.Sink"}}
                ],
                "edges": [
                    {"sourceId": "OP_0", "sourceOutputPort": 0, "targetId": "OP_1",
                     "targetInputPort": 0, "tags": ["b", "a", "b"]}
                ]
            }"#,
        )
        .validate_and_build()
        .unwrap();

        assert_eq!(g.vertices.len(), 2);
        assert_eq!(g.edges[0].source, 0);
        assert_eq!(g.edges[0].target, 1);
        assert_eq!(g.edges[0].tags, vec!["a", "b"]);
        assert_eq!(g.vertex("OP_1").unwrap().kind, "quarks.oplet.core.Sink");
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let g = snapshot(
            r#"{"vertices": [{"id": 1}, {"id": 2}], "edges": [{"sourceId": 1, "targetId": 2}]}"#,
        )
        .validate_and_build()
        .unwrap();
        assert_eq!(g.edges[0].source_id, "1");
        assert_eq!(g.vertices[0].kind, "");
    }

    #[test]
    fn duplicate_vertex_ids_are_rejected() {
        let err = snapshot(r#"{"vertices": [{"id": "A"}, {"id": "A"}]}"#)
            .validate_and_build()
            .unwrap_err();
        assert!(err.to_string().contains("duplicate vertex id"));
    }

    #[test]
    fn unresolved_edges_are_dropped() {
        let g = snapshot(
            r#"{"vertices": [{"id": "A"}], "edges": [{"sourceId": "A", "targetId": "Z"}]}"#,
        )
        .validate_and_build()
        .unwrap();
        assert!(g.edges.is_empty());
    }
}
