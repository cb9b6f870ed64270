//! Sankey layout: columns by longest path from the sources, band heights
//! proportional to flow, vertical positions relaxed towards connected nodes.

use super::{Canvas, FlowLink, GraphLayout, PositionedGraph};

#[derive(Debug, Clone, Copy)]
pub struct Sankey {
    /// Relaxation rounds.
    pub iterations: usize,
}

impl Default for Sankey {
    fn default() -> Self {
        Self { iterations: 32 }
    }
}

impl GraphLayout for Sankey {
    fn layout(&self, vertex_count: usize, links: &[FlowLink], canvas: Canvas) -> PositionedGraph {
        let mut g = PositionedGraph::unplaced(vertex_count, links, canvas);
        if vertex_count == 0 {
            return g;
        }
        compute_node_values(&mut g);
        let mut columns = compute_node_breadths(&mut g);
        compute_node_depths(&mut g, &mut columns, self.iterations);
        g.relayout();
        g
    }
}

fn compute_node_values(g: &mut PositionedGraph) {
    for i in 0..g.nodes.len() {
        let out: f64 = g.nodes[i].source_links.iter().map(|&l| g.links[l].weight).sum();
        let inc: f64 = g.nodes[i].target_links.iter().map(|&l| g.links[l].weight).sum();
        g.nodes[i].value = out.max(inc);
    }
}

/// Assign columns and horizontal positions. Returns node indices per column.
fn compute_node_breadths(g: &mut PositionedGraph) -> Vec<Vec<usize>> {
    let n = g.nodes.len();
    let mut remaining: Vec<usize> = (0..n).collect();
    let mut x = 0usize;

    // A cycle would keep feeding nodes back; no acyclic path is longer than n.
    while !remaining.is_empty() && x <= n {
        let mut next = Vec::new();
        for &i in &remaining {
            g.nodes[i].column = x;
            for &l in &g.nodes[i].source_links {
                next.push(g.links[l].target);
            }
        }
        next.sort_unstable();
        next.dedup();
        remaining = next;
        x += 1;
    }

    // Sinks go to the last column.
    let last = x.saturating_sub(1);
    for node in &mut g.nodes {
        if node.source_links.is_empty() {
            node.column = last;
        }
    }

    let kx = if last > 0 {
        (g.canvas.width - g.canvas.node_width) / last as f64
    } else {
        0.0
    };
    for node in &mut g.nodes {
        node.x = node.column as f64 * kx;
        node.dx = g.canvas.node_width;
    }

    let mut columns: Vec<Vec<usize>> = vec![Vec::new(); last + 1];
    for (i, node) in g.nodes.iter().enumerate() {
        columns[node.column].push(i);
    }
    columns.retain(|c| !c.is_empty());
    columns
}

fn compute_node_depths(g: &mut PositionedGraph, columns: &mut [Vec<usize>], iterations: usize) {
    initialize_node_depth(g, columns);
    resolve_collisions(g, columns);
    let mut alpha = 1.0;
    for _ in 0..iterations {
        alpha *= 0.99;
        relax_right_to_left(g, columns, alpha);
        resolve_collisions(g, columns);
        relax_left_to_right(g, columns, alpha);
        resolve_collisions(g, columns);
    }
}

fn initialize_node_depth(g: &mut PositionedGraph, columns: &[Vec<usize>]) {
    let Canvas {
        height,
        node_padding,
        ..
    } = g.canvas;

    let ky = columns
        .iter()
        .filter_map(|col| {
            let total: f64 = col.iter().map(|&i| g.nodes[i].value).sum();
            (total > 0.0).then(|| (height - (col.len() as f64 - 1.0) * node_padding) / total)
        })
        .fold(f64::INFINITY, f64::min);
    let ky = if ky.is_finite() { ky.max(0.0) } else { 0.0 };

    for col in columns {
        for (rank, &i) in col.iter().enumerate() {
            g.nodes[i].y = rank as f64;
            g.nodes[i].dy = g.nodes[i].value * ky;
        }
    }
    for link in &mut g.links {
        link.dy = link.weight * ky;
    }
}

fn relax_left_to_right(g: &mut PositionedGraph, columns: &[Vec<usize>], alpha: f64) {
    for col in columns {
        for &i in col {
            if g.nodes[i].target_links.is_empty() {
                continue;
            }
            let (weighted, total) = g.nodes[i].target_links.iter().fold((0.0, 0.0), |acc, &l| {
                let link = &g.links[l];
                (acc.0 + g.nodes[link.source].center() * link.weight, acc.1 + link.weight)
            });
            if total > 0.0 {
                let shift = (weighted / total - g.nodes[i].center()) * alpha;
                g.nodes[i].y += shift;
            }
        }
    }
}

fn relax_right_to_left(g: &mut PositionedGraph, columns: &[Vec<usize>], alpha: f64) {
    for col in columns.iter().rev() {
        for &i in col {
            if g.nodes[i].source_links.is_empty() {
                continue;
            }
            let (weighted, total) = g.nodes[i].source_links.iter().fold((0.0, 0.0), |acc, &l| {
                let link = &g.links[l];
                (acc.0 + g.nodes[link.target].center() * link.weight, acc.1 + link.weight)
            });
            if total > 0.0 {
                let shift = (weighted / total - g.nodes[i].center()) * alpha;
                g.nodes[i].y += shift;
            }
        }
    }
}

/// Push overlapping nodes apart, then back up from the bottom edge.
fn resolve_collisions(g: &mut PositionedGraph, columns: &mut [Vec<usize>]) {
    let Canvas {
        height,
        node_padding,
        ..
    } = g.canvas;

    for col in columns.iter_mut() {
        if col.is_empty() {
            continue;
        }
        col.sort_by(|&a, &b| g.nodes[a].y.total_cmp(&g.nodes[b].y));

        let mut y0 = 0.0;
        for &i in col.iter() {
            let node = &mut g.nodes[i];
            let dy = y0 - node.y;
            if dy > 0.0 {
                node.y += dy;
            }
            y0 = node.y + node.dy + node_padding;
        }

        let overflow = y0 - node_padding - height;
        if overflow > 0.0 {
            let last = col[col.len() - 1];
            g.nodes[last].y -= overflow;
            let mut y0 = g.nodes[last].y;
            for &i in col.iter().rev().skip(1) {
                let node = &mut g.nodes[i];
                let dy = node.y + node.dy + node_padding - y0;
                if dy > 0.0 {
                    node.y -= dy;
                }
                y0 = node.y;
            }
        }
    }
}
