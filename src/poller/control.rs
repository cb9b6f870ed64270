//! Line-oriented control commands read by `watch` on stdin.

use super::PollerCommand;
use crate::Result;
use crate::api::MetricSelector;
use crate::chart::ChartKind;
use crate::diagnostics;
use crate::session::Layer;
use crate::tags::TagSelection;

use anyhow::{Context, anyhow, bail};
use clap::ValueEnum;

pub const HELP: &str = "commands: pause | resume | toggle | interval <s> | job <id> | layer <flow|static|opletColor|stags> \
| metric name:<n>,type:<t> | chart <bar|line> | tag <t>... | tag all | drag <vertex> <y> | quit";

/// Parse one line. Blank lines and `#` comments yield `None`.
pub fn parse_command(line: &str) -> Result<Option<PollerCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let needs_arg = |what: &str| {
        if rest.is_empty() {
            Err(anyhow!(diagnostics::error_message(format!("{} needs {}", verb, what))))
        } else {
            Ok(rest)
        }
    };

    let cmd = match verb.to_ascii_lowercase().as_str() {
        "pause" => PollerCommand::Pause,
        "resume" => PollerCommand::Resume,
        "toggle" | "p" => PollerCommand::TogglePause,
        "interval" => PollerCommand::Interval(rest.to_string()),
        "job" => PollerCommand::Job(needs_arg("a job id")?.to_string()),
        "layer" => {
            let layer = Layer::from_str(needs_arg("a layer")?, true).map_err(|e| {
                anyhow!(diagnostics::error_message(format!("unknown layer: {}", e)))
            })?;
            PollerCommand::Layer(layer)
        }
        "metric" => {
            let selector: MetricSelector = needs_arg("a selector")?.parse()?;
            PollerCommand::Metric(selector)
        }
        "chart" => {
            let kind = ChartKind::from_str(needs_arg("bar or line")?, true).map_err(|e| {
                anyhow!(diagnostics::error_message(format!("unknown chart: {}", e)))
            })?;
            PollerCommand::Chart(kind)
        }
        "tag" | "tags" => {
            let arg = needs_arg("tag names or all")?;
            if arg.eq_ignore_ascii_case("all") {
                PollerCommand::Tags(TagSelection::All)
            } else {
                PollerCommand::Tags(TagSelection::Only(
                    arg.split_whitespace().map(str::to_string).collect(),
                ))
            }
        }
        "drag" => {
            let (vertex, y) = needs_arg("a vertex and a y position")?
                .split_once(char::is_whitespace)
                .ok_or_else(|| anyhow!(diagnostics::error_message("drag needs <vertex> <y>")))?;
            let y: f64 = y
                .trim()
                .parse()
                .with_context(|| diagnostics::error_message(format!("bad y position {:?}", y)))?;
            PollerCommand::Drag {
                vertex: vertex.to_string(),
                y,
            }
        }
        "quit" | "exit" | "q" => PollerCommand::Quit,
        _ => bail!(
            "{}",
            diagnostics::error_message(format!("unknown command {:?}; {}", verb, HELP))
        ),
    };
    Ok(Some(cmd))
}
