//! Dashboard model: the normalized topology and the frame handed to the
//! renderers.

pub mod frame;
pub mod topology;

pub use frame::{DashboardFrame, EdgeView, PropertyRow, TopologyView, VertexView};
pub use topology::{FlowEdge, FlowValue, NormalizedGraph, normalize};
