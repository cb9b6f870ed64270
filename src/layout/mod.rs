//! Graph layout service.
//!
//! The renderer only needs `layout(vertices, links, canvas) -> positioned
//! graph`; the Sankey implementation sits behind [`GraphLayout`] so it can be
//! swapped.

pub mod sankey;

pub use sankey::Sankey;

use serde::Serialize;

/// Drawing area and node sizing handed to the layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    pub node_width: f64,
    pub node_padding: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 825.0,
            height: 564.0,
            node_width: 30.0,
            node_padding: 10.0,
        }
    }
}

/// One weighted flow between two vertex indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowLink {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

pub trait GraphLayout: Send + Sync {
    fn layout(&self, vertex_count: usize, links: &[FlowLink], canvas: Canvas) -> PositionedGraph;
}

/// Vertical band assigned to one vertex.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeBox {
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
    pub value: f64,
    pub column: usize,
    /// Outgoing link indices.
    pub source_links: Vec<usize>,
    /// Incoming link indices.
    pub target_links: Vec<usize>,
}

impl NodeBox {
    pub fn center(&self) -> f64 {
        self.y + self.dy / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkBand {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
    /// Band thickness.
    pub dy: f64,
    /// Offset inside the source node's band.
    pub sy: f64,
    /// Offset inside the target node's band.
    pub ty: f64,
}

/// Output of a layout pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedGraph {
    pub canvas: Canvas,
    pub nodes: Vec<NodeBox>,
    pub links: Vec<LinkBand>,
}

impl PositionedGraph {
    /// Nodes and links wired together, without positions.
    pub fn unplaced(vertex_count: usize, links: &[FlowLink], canvas: Canvas) -> Self {
        let mut nodes = vec![NodeBox::default(); vertex_count];
        let mut bands = Vec::with_capacity(links.len());
        for (i, l) in links.iter().enumerate() {
            nodes[l.source].source_links.push(i);
            nodes[l.target].target_links.push(i);
            bands.push(LinkBand {
                source: l.source,
                target: l.target,
                weight: l.weight,
                dy: 0.0,
                sy: 0.0,
                ty: 0.0,
            });
        }
        Self {
            canvas,
            nodes,
            links: bands,
        }
    }

    /// Recompute link offsets after node positions changed.
    ///
    /// Only link geometry moves; node columns and heights stay.
    pub fn relayout(&mut self) {
        let ys: Vec<f64> = self.nodes.iter().map(|n| n.y).collect();
        let links = &self.links;
        for node in &mut self.nodes {
            node.source_links
                .sort_by(|&a, &b| ys[links[a].target].total_cmp(&ys[links[b].target]));
            node.target_links
                .sort_by(|&a, &b| ys[links[a].source].total_cmp(&ys[links[b].source]));
        }
        for node in &self.nodes {
            let mut sy = 0.0;
            for &l in &node.source_links {
                self.links[l].sy = sy;
                sy += self.links[l].dy;
            }
            let mut ty = 0.0;
            for &l in &node.target_links {
                self.links[l].ty = ty;
                ty += self.links[l].dy;
            }
        }
    }

    /// Move a node vertically, clamped to the canvas, then relayout links.
    /// Returns the applied position.
    pub fn drag(&mut self, node: usize, y: f64) -> Option<f64> {
        let height = self.canvas.height;
        let n = self.nodes.get_mut(node)?;
        n.y = y.min(height - n.dy).max(0.0);
        let applied = n.y;
        self.relayout();
        Some(applied)
    }

    /// SVG path for one link: a horizontal diagonal between the centres of
    /// the source and target bands.
    pub fn link_path(&self, link: usize) -> String {
        let l = &self.links[link];
        let half = self.canvas.node_width / 2.0;
        let (s, t) = (&self.nodes[l.source], &self.nodes[l.target]);
        let (x0, y0) = (s.x + half, s.center());
        let (x1, y1) = (t.x + half, t.center());
        let xm = (x0 + x1) / 2.0;
        format!(
            "M{:.1},{:.1}C{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}",
            x0, y0, xm, y0, xm, y1, x1, y1
        )
    }
}
