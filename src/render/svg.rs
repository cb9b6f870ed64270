use super::escape_xml;
use crate::legend::Legend;
use crate::model::{PropertyRow, TopologyView};

use std::fmt::Write as _;

const MARGIN_TOP: f64 = 30.0;
const MARGIN_RIGHT: f64 = 5.0;
const MARGIN_BOTTOM: f64 = 6.0;
const MARGIN_LEFT: f64 = 30.0;

const LEGEND_WIDTH: f64 = 300.0;
const LEGEND_HEIGHT: f64 = 600.0;

/// Topology drawing: flows first, then the nodes on top.
pub fn render_topology_svg(view: &TopologyView) -> String {
    let canvas = view.canvas;
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="topology" width="{}" height="{}">"#,
        canvas.width + MARGIN_LEFT + MARGIN_RIGHT + 5.0,
        canvas.height + MARGIN_TOP + MARGIN_BOTTOM
    );
    let _ = writeln!(
        out,
        r#"<g id="parentG" transform="translate({MARGIN_LEFT},{MARGIN_TOP})">"#
    );

    out.push_str("<g class=\"links\">\n");
    for edge in &view.edges {
        let _ = writeln!(
            out,
            r#"  <path class="link" data-source="{}" data-target="{}" d="{}" fill="none" stroke="{}" stroke-opacity="{}" stroke-width="{:.2}"><title>{}</title></path>"#,
            escape_xml(&edge.source),
            escape_xml(&edge.target),
            edge.path,
            edge.color,
            edge.opacity,
            edge.stroke_width,
            escape_xml(&edge.title)
        );
    }
    out.push_str("</g>\n<g class=\"nodes\">\n");

    for v in &view.vertices {
        let cx = canvas.node_width / 2.0;
        let cy = v.dy / 2.0;
        let _ = writeln!(
            out,
            r#"  <g class="node" data-id="{}" transform="translate({:.2},{:.2})">"#,
            escape_xml(&v.id),
            v.x,
            v.y
        );
        let _ = writeln!(
            out,
            r#"    <circle cx="{cx}" cy="{cy:.2}" r="{:.2}" fill="{}" stroke="{}"><title>{}</title></circle>"#,
            v.radius,
            v.color,
            v.color,
            escape_xml(&tooltip_text(&v.tooltip))
        );
        let _ = writeln!(
            out,
            r#"    <text x="{:.2}" y="{cy:.2}" dy=".35em" text-anchor="{}">{}</text>"#,
            v.label_x,
            v.label_anchor.as_str(),
            escape_xml(&v.id)
        );
        out.push_str("  </g>\n");
    }
    out.push_str("</g>\n</g>\n</svg>\n");
    out
}

/// Legend panel beside the topology.
pub fn render_legend_svg(legend: &Legend) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="graph-legend" width="{LEGEND_WIDTH}" height="{LEGEND_HEIGHT}">"#
    );
    out.push_str("<g transform=\"translate(0,30)\">\n");
    out.push_str(&legend.to_svg(10.0, 10.0));
    out.push_str("</g>\n</svg>\n");
    out
}

fn tooltip_text(row: &PropertyRow) -> String {
    PropertyRow::HEADERS
        .iter()
        .zip(row.cells())
        .map(|(h, c)| format!("{}: {}", h, c))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Canvas, Sankey};
    use crate::legend::{LegendEntry, LegendKind};
    use crate::session::Session;
    use pretty_assertions::assert_eq;

    fn view() -> TopologyView {
        let graph: crate::api::GraphSnapshot = serde_json::from_str(
            r#"{
                "vertices": [
                    {"id": "OP_0", "invocation": {"kind": "quarks.oplet.core.Source"}},
                    {"id": "OP_<1>", "invocation": {"kind": "quarks.oplet.core.Sink"}}
                ],
                "edges": [{"sourceId": "OP_0", "targetId": "OP_<1>"}]
            }"#,
        )
        .unwrap();
        let mut session = Session::new(Box::new(Sankey::default()), Canvas::default());
        session.apply_topology(graph.validate_and_build().unwrap(), &[]);
        session.frame(1, false, 5).topology.unwrap()
    }

    #[test]
    fn draws_links_before_nodes() {
        let svg = render_topology_svg(&view());
        let link = svg.find("class=\"link\"").unwrap();
        let node = svg.find("class=\"node\"").unwrap();
        assert!(link < node);
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.contains(r#"width="865" height="600""#));
        assert!(svg.contains("OP_&lt;1&gt;"));
        assert!(!svg.contains("OP_<1>"));
    }

    #[test]
    fn node_title_lists_properties() {
        let svg = render_topology_svg(&view());
        assert!(svg.contains("Name: OP_0\nOplet kind: Source (quarks.oplet.core)"));
    }

    #[test]
    fn legend_is_offset_into_its_panel() {
        let legend = Legend::build(
            LegendKind::OpletKind,
            "Oplet kind",
            vec![LegendEntry::new("Source", "#1f77b4")],
        );
        let svg = render_legend_svg(&legend);
        assert!(svg.contains(r#"<g transform="translate(0,30)">"#));
        assert!(svg.contains("translate(10,10)"));
    }
}
