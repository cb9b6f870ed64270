use super::{escape_xml, render_legend_svg, render_topology_svg};
use crate::model::DashboardFrame;

/// Render the dashboard page for one frame: inline SVGs plus the frame as a
/// JSON block the page script reads for tables, pickers and tooltips.
///
/// The template is filled by marker substitution, not `format!()`, because
/// its CSS and JS are full of braces.
pub fn render_dashboard_html(frame: &DashboardFrame) -> anyhow::Result<String> {
    // `</` would end the script element early.
    let json = serde_json::to_string(frame)?.replace("</", "<\\/");

    let refresh = if frame.paused {
        String::new()
    } else {
        format!(
            r#"<meta http-equiv="refresh" content="{}">"#,
            frame.refresh_seconds
        )
    };
    let topology = frame
        .topology
        .as_ref()
        .map(render_topology_svg)
        .unwrap_or_else(|| String::from(r#"<div class="muted">Loading graph...</div>"#));
    let legend = frame
        .legend
        .as_ref()
        .filter(|l| !l.is_empty())
        .map(render_legend_svg)
        .unwrap_or_default();
    let chart = frame
        .metrics
        .as_ref()
        .and_then(|m| m.svg.clone())
        .unwrap_or_default();
    let title = match &frame.selected_job {
        Some(id) => format!("Streams console: {}", escape_xml(id)),
        None => String::from("Streams console"),
    };

    const TEMPLATE: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
__REFRESH__
<title>__TITLE__</title>
<style>
  body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 0; }
  header { padding: 12px 16px; border-bottom: 1px solid #ddd; display: flex; gap: 16px; align-items: center; flex-wrap: wrap; }
  .container { display: flex; }
  .main { flex: 1; padding: 12px; overflow: auto; }
  .sidebar { width: 300px; border-left: 1px solid #ddd; padding: 12px; }
  .pill { padding: 4px 8px; border: 1px solid #ddd; border-radius: 999px; background: #fafafa; font-size: 14px; }
  .pill.paused { background: #fff4e5; border-color: #f0c27b; }
  .muted { color: #777; font-size: 12px; }
  .disabled { color: #bbb; }

  .link:hover { stroke-opacity: .5; }
  .node text { pointer-events: none; text-shadow: 0 1px 0 #fff; font-size: 12px; }
  .legend-box { fill: #fff; }

  table { border-collapse: collapse; width: 100%; margin-top: 8px; }
  th, td { border-bottom: 1px solid #eee; padding: 6px 8px; text-align: left; font-size: 14px; }
  th { background: white; border-bottom: 1px solid #ddd; }
  .num { text-align: right; font-variant-numeric: tabular-nums; }
  #metrics { margin-top: 16px; }
</style>
</head>
<body>
<header>
  <span class="pill" id="job"></span>
  <span class="pill" id="refresh"></span>
  <span class="pill" id="intervalField"></span>
  <span id="layers"></span>
</header>

<div class="container">
  <div class="main">
    <div id="chart">__TOPOLOGY__</div>

    <div id="metrics" style="display:none;">
      <h3 id="metricsTitle">Metrics</h3>
      <div id="metricOptions" class="muted"></div>
      <div id="rateUnit" class="muted"></div>
      <div id="metricChart">__CHART__</div>
    </div>

    <h3>Oplet properties</h3>
    <table id="propsTable">
      <thead><tr id="propsHead"></tr></thead>
      <tbody id="propsBody"></tbody>
    </table>
  </div>

  <div class="sidebar">
    <div id="graphLegend">__LEGEND__</div>
    <div id="tags" style="display:none;">
      <h4>Stream tags</h4>
      <ul id="tagList"></ul>
    </div>
  </div>
</div>

<script>
// Embedded dashboard frame (JSON object literal)
const DATA = __DATA__;

function escapeHtml(s) {
  return String(s)
    .replaceAll("&", "&amp;")
    .replaceAll("<", "&lt;")
    .replaceAll(">", "&gt;")
    .replaceAll('"', "&quot;")
    .replaceAll("'", "&#39;");
}

function renderHeader() {
  const job = DATA.jobs.find((j) => j.id === DATA.selected_job);
  const el = document.getElementById("job");
  if (job) {
    el.innerHTML = `job: <b>${escapeHtml(job.name)}</b>`;
    el.title = job.state_lines.join("\n");
  } else {
    el.textContent = "no jobs";
  }

  const refresh = document.getElementById("refresh");
  refresh.textContent = DATA.paused
    ? "paused"
    : `refresh every ${DATA.refresh_seconds}s (#${DATA.sequence})`;
  refresh.className = DATA.paused ? "pill paused" : "pill";
  document.getElementById("intervalField").textContent = `interval: ${DATA.interval_field}`;

  document.getElementById("layers").innerHTML = DATA.layers
    .map((l) => {
      const cls = l.enabled ? "pill" : "pill disabled";
      const label = l.layer === DATA.layer ? `<b>${escapeHtml(l.label)}</b>` : escapeHtml(l.label);
      return `<span class="${cls}">${label}</span>`;
    })
    .join(" ");
}

function renderProperties() {
  document.getElementById("propsHead").innerHTML =
    ["Name", "Oplet kind", "Tuple count", "Sources", "Targets"]
      .map((h) => `<th>${h}</th>`)
      .join("");
  const body = document.getElementById("propsBody");
  body.innerHTML = "";
  for (const row of DATA.properties) {
    const tr = document.createElement("tr");
    tr.innerHTML = `
      <td>${escapeHtml(row.name)}</td>
      <td>${escapeHtml(row.kind)}</td>
      <td class="num">${escapeHtml(row.tuple_count)}</td>
      <td>${escapeHtml(row.sources)}</td>
      <td>${escapeHtml(row.targets)}</td>
    `;
    body.appendChild(tr);
  }
}

function renderMetrics() {
  const m = DATA.metrics;
  if (!m) return;
  document.getElementById("metrics").style.display = "block";
  const selected = m.selected ? `name:${m.selected.name},type:${m.selected.kind}` : null;
  document.getElementById("metricOptions").innerHTML = m.options
    .map((o) => (o.value === selected ? `<b>${escapeHtml(o.label)}</b>` : escapeHtml(o.label)))
    .join("<br>");
  document.getElementById("rateUnit").textContent = m.rate_unit ? `Rate unit: ${m.rate_unit}` : "";
  document.getElementById("metricsTitle").textContent =
    m.chart === "line" ? "Metrics (line chart)" : "Metrics (bar chart)";
}

function renderTags() {
  const t = DATA.tags;
  if (!t) return;
  document.getElementById("tags").style.display = "block";
  const picked = t.selection.mode === "all" ? null : new Set(t.selection.tags);
  document.getElementById("tagList").innerHTML = t.tags
    .map((tag) => {
      const on = picked === null || picked.has(tag);
      return `<li class="${on ? "" : "disabled"}">${escapeHtml(tag)}</li>`;
    })
    .join("");
}

renderHeader();
renderProperties();
renderMetrics();
renderTags();
</script>
</body>
</html>
"#;

    Ok(fill(
        TEMPLATE,
        &[
            ("__REFRESH__", &refresh),
            ("__TITLE__", &title),
            ("__TOPOLOGY__", &topology),
            ("__CHART__", &chart),
            ("__LEGEND__", &legend),
            ("__DATA__", &json),
        ],
    ))
}

/// Single left-to-right pass, so substituted text is never rescanned.
fn fill(template: &str, markers: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    loop {
        let next = markers
            .iter()
            .filter_map(|(marker, value)| rest.find(marker).map(|at| (at, *marker, *value)))
            .min_by_key(|(at, _, _)| *at);
        let Some((at, marker, value)) = next else {
            out.push_str(rest);
            return out;
        };
        out.push_str(&rest[..at]);
        out.push_str(value);
        rest = &rest[at + marker.len()..];
    }
}
