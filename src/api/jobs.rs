//! Job descriptors (`jobs?jobsInfo=true`).
//!
//! Each job is a flat object of string attributes, e.g.
//! `{"id": "JOB_0", "name": "sensors", "currentState": "RUNNING", "nextState": "RUNNING"}`.
//! The `id` and `name` keys are matched case-insensitively; every key that
//! contains `State` is a state field.

use crate::format::capitalize;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobInfo {
    pub id: String,
    pub name: Option<String>,
    pub fields: BTreeMap<String, String>,
}

impl<'de> Deserialize<'de> for JobInfo {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        let fields: BTreeMap<String, String> = raw
            .into_iter()
            .map(|(k, v)| {
                let text = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, text)
            })
            .collect();

        let lookup = |key: &str| {
            fields
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.clone())
        };
        let id = lookup("id").unwrap_or_default();
        let name = lookup("name").filter(|n| !n.is_empty());

        Ok(JobInfo { id, name, fields })
    }
}

impl JobInfo {
    /// Lines for the job state tooltip.
    ///
    /// `currentState: RUNNING` becomes `current state: Running`; other keys
    /// are shown as they are.
    pub fn state_lines(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|(key, value)| match key.find("State") {
                Some(idx) => format!(
                    "{} {}: {}",
                    &key[..idx],
                    key[idx..].to_lowercase(),
                    capitalize(value)
                ),
                None => format!("{}: {}", key, value),
            })
            .collect()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Read-only cache of the server's jobs, replaced on every poll.
#[derive(Debug, Clone, Default)]
pub struct JobDirectory {
    order: Vec<String>,
    jobs: BTreeMap<String, JobInfo>,
}

impl JobDirectory {
    /// Replace the cache. Jobs without an id are skipped; the first entry for
    /// an id wins.
    pub fn replace(&mut self, jobs: Vec<JobInfo>) {
        self.order.clear();
        self.jobs.clear();
        for job in jobs {
            if job.id.is_empty() || self.jobs.contains_key(&job.id) {
                continue;
            }
            self.order.push(job.id.clone());
            self.jobs.insert(job.id.clone(), job);
        }
    }

    pub fn get(&self, id: &str) -> Option<&JobInfo> {
        self.jobs.get(id)
    }

    /// Jobs in server order.
    pub fn iter(&self) -> impl Iterator<Item = &JobInfo> {
        self.order.iter().filter_map(|id| self.jobs.get(id))
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keep `current` while the server still lists it, else fall back to the
    /// first job.
    pub fn resolve_selection(&self, current: Option<&str>) -> Option<String> {
        match current {
            Some(id) if self.jobs.contains_key(id) => Some(id.to_string()),
            _ => self.order.first().cloned(),
        }
    }
}
