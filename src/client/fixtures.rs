//! Directory-backed console, used by `render` and by tests.
//!
//! Layout of the directory:
//! - `jobs.json`
//! - `graph-<job>.json`
//! - `available-<job>.json`
//! - `metrics-<job>-<metric name>.json`
//!
//! A missing file reads as "no data", the same as an empty HTTP body.

use super::ConsoleApi;
use crate::Result;
use crate::api::{GraphSnapshot, JobInfo, MetricSelector, MetricsSnapshot};
use crate::diagnostics;

use anyhow::Context;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct FixtureConsole {
    dir: PathBuf,
}

impl FixtureConsole {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>> {
        let path = self.dir.join(file);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "fixture missing");
                return Ok(None);
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    diagnostics::error_message(format!("reading {}", path.display()))
                });
            }
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        let value = serde_json::from_str(&text)
            .with_context(|| diagnostics::error_message(format!("parsing {}", path.display())))?;
        Ok(Some(value))
    }
}

impl ConsoleApi for FixtureConsole {
    async fn jobs(&self) -> Result<Vec<JobInfo>> {
        Ok(self.read("jobs.json")?.unwrap_or_default())
    }

    async fn job_graph(&self, job: &str) -> Result<Option<GraphSnapshot>> {
        self.read(&format!("graph-{}.json", job))
    }

    async fn metric(&self, job: &str, selector: &MetricSelector) -> Result<Option<MetricsSnapshot>> {
        self.read(&format!("metrics-{}-{}.json", job, selector.name))
    }

    async fn available_metrics(&self, job: &str) -> Result<Option<MetricsSnapshot>> {
        self.read(&format!("available-{}.json", job))
    }
}
