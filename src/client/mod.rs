//! Console server access.
//!
//! [`ConsoleApi`] is the only way the poller reads data. `HttpConsole` talks
//! to a live server; `FixtureConsole` replays JSON files from a directory.

pub mod fixtures;

pub use fixtures::FixtureConsole;

use crate::Result;
use crate::api::{GraphSnapshot, JobInfo, MetricSelector, MetricsSnapshot};
use crate::diagnostics;

use anyhow::Context;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;

/// Read-only console endpoints. `Ok(None)` means the server had no data.
pub trait ConsoleApi: Send + Sync + 'static {
    fn jobs(&self) -> impl Future<Output = Result<Vec<JobInfo>>> + Send;

    fn job_graph(&self, job: &str) -> impl Future<Output = Result<Option<GraphSnapshot>>> + Send;

    fn metric(
        &self,
        job: &str,
        selector: &MetricSelector,
    ) -> impl Future<Output = Result<Option<MetricsSnapshot>>> + Send;

    fn available_metrics(
        &self,
        job: &str,
    ) -> impl Future<Output = Result<Option<MetricsSnapshot>>> + Send;
}

/// Console endpoints, relative to the console base URL.
#[derive(Debug, Clone, Copy)]
pub enum Endpoint<'a> {
    Jobs,
    JobGraph(&'a str),
    Metric(&'a str, &'a MetricSelector),
    AvailableMetrics(&'a str),
}

impl Endpoint<'_> {
    fn path(&self) -> &'static str {
        match self {
            Endpoint::Jobs | Endpoint::JobGraph(_) => "jobs",
            Endpoint::Metric(..) | Endpoint::AvailableMetrics(_) => "metrics",
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Endpoint::Jobs => vec![("jobsInfo", String::from("true"))],
            Endpoint::JobGraph(job) => vec![
                ("jobgraph", String::from("true")),
                ("jobId", job.to_string()),
            ],
            Endpoint::Metric(job, selector) => {
                vec![("job", job.to_string()), ("metric", selector.to_string())]
            }
            Endpoint::AvailableMetrics(job) => vec![
                ("job", job.to_string()),
                ("availableMetrics", String::from("all")),
            ],
        }
    }

    /// Full request URL. Parameter values are form-encoded.
    pub fn url(&self, base: &Url) -> Result<Url> {
        let mut url = base
            .join(self.path())
            .with_context(|| diagnostics::error_message(format!("bad endpoint {:?}", self)))?;
        url.query_pairs_mut().extend_pairs(self.params());
        Ok(url)
    }
}

#[derive(Debug, Clone)]
pub struct HttpConsole {
    client: reqwest::Client,
    base: Url,
}

impl HttpConsole {
    pub fn new(base: &str, timeout: Duration) -> Result<Self> {
        let mut base = Url::parse(base).with_context(|| {
            diagnostics::error_message(format!("invalid console url {:?}", base))
        })?;
        // Url::join drops the last path segment unless it ends with '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building http client")?;
        Ok(Self { client, base })
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: Endpoint<'_>) -> Result<Option<T>> {
        let url = endpoint.url(&self.base)?;

        let body = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .with_context(|| diagnostics::error_message(format!("GET {}", url)))?
            .text()
            .await
            .with_context(|| diagnostics::error_message(format!("reading body of {}", url)))?;

        if body.trim().is_empty() {
            tracing::debug!(%url, "empty response");
            return Ok(None);
        }
        match serde_json::from_str(&body) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                diagnostics::warn(format!("malformed JSON from {}: {}", url, e));
                Ok(None)
            }
        }
    }
}

impl ConsoleApi for HttpConsole {
    async fn jobs(&self) -> Result<Vec<JobInfo>> {
        Ok(self.get_json(Endpoint::Jobs).await?.unwrap_or_default())
    }

    async fn job_graph(&self, job: &str) -> Result<Option<GraphSnapshot>> {
        self.get_json(Endpoint::JobGraph(job)).await
    }

    async fn metric(&self, job: &str, selector: &MetricSelector) -> Result<Option<MetricsSnapshot>> {
        self.get_json(Endpoint::Metric(job, selector)).await
    }

    async fn available_metrics(&self, job: &str) -> Result<Option<MetricsSnapshot>> {
        self.get_json(Endpoint::AvailableMetrics(job)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn base() -> Url {
        Url::parse("http://localhost:8080/console/").unwrap()
    }

    #[test]
    fn endpoint_urls() {
        let base = base();
        let counter = MetricSelector::tuple_counter();
        assert_eq!(
            Endpoint::Jobs.url(&base).unwrap().as_str(),
            "http://localhost:8080/console/jobs?jobsInfo=true"
        );
        assert_eq!(
            Endpoint::JobGraph("JOB_0").url(&base).unwrap().as_str(),
            "http://localhost:8080/console/jobs?jobgraph=true&jobId=JOB_0"
        );
        assert_eq!(
            Endpoint::Metric("JOB_0", &counter).url(&base).unwrap().as_str(),
            "http://localhost:8080/console/metrics?job=JOB_0&metric=name%3ACount%2Ctype%3Acounter"
        );
        assert_eq!(
            Endpoint::AvailableMetrics("JOB_0").url(&base).unwrap().as_str(),
            "http://localhost:8080/console/metrics?job=JOB_0&availableMetrics=all"
        );
    }

    #[test]
    fn reserved_characters_are_encoded() {
        let selector = MetricSelector::new("a&b", "c#d");
        let url = Endpoint::Metric("JOB+1", &selector).url(&base()).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("job".to_string(), "JOB+1".to_string()),
                ("metric".to_string(), "name:a&b,type:c#d".to_string()),
            ]
        );
        assert!(url.fragment().is_none());
    }

    #[test]
    fn base_url_keeps_its_path() {
        let console = HttpConsole::new("http://localhost:8080/console", Duration::from_secs(1)).unwrap();
        let url = Endpoint::Jobs.url(&console.base).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/console/jobs?jobsInfo=true");
        assert!(HttpConsole::new("not a url", Duration::from_secs(1)).is_err());
    }
}
