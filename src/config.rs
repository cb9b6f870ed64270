//! Configuration loading.
//!
//! An optional TOML file, then `CONSOLE_*` environment overrides
//! (`CONSOLE_SERVER__URL`, `CONSOLE_POLL__INTERVAL_SECS`, ...). Command-line
//! flags are applied on top by `main`.

use crate::Result;
use crate::diagnostics;
use crate::layout::Canvas;
use crate::poller::RefreshInterval;
use crate::session::Layer;

use anyhow::Context;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "console.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub canvas: CanvasConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_url() -> String {
    "http://localhost:8080/console/".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    #[serde(default)]
    pub layer: Layer,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            layer: Layer::default(),
        }
    }
}

fn default_interval_secs() -> u64 {
    RefreshInterval::DEFAULT.seconds()
}

impl PollConfig {
    pub fn interval(&self) -> Result<RefreshInterval> {
        RefreshInterval::new(self.interval_secs).with_context(|| {
            diagnostics::error_message(format!("poll.interval_secs = {}", self.interval_secs))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "default_width")]
    pub width: f64,

    #[serde(default = "default_height")]
    pub height: f64,

    #[serde(default = "default_node_width")]
    pub node_width: f64,

    #[serde(default = "default_node_padding")]
    pub node_padding: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            node_width: default_node_width(),
            node_padding: default_node_padding(),
        }
    }
}

fn default_width() -> f64 {
    Canvas::default().width
}

fn default_height() -> f64 {
    Canvas::default().height
}

fn default_node_width() -> f64 {
    Canvas::default().node_width
}

fn default_node_padding() -> f64 {
    Canvas::default().node_padding
}

impl CanvasConfig {
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
            node_width: self.node_width,
            node_padding: self.node_padding,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("dashboard.html")
}

impl ConsoleConfig {
    /// Load `path` (or `console.toml` in the working directory) plus the
    /// environment. A missing file is fine; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let config = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("CONSOLE").separator("__"))
            .build()
            .context("loading console configuration")?;

        let console_config: ConsoleConfig = config
            .try_deserialize()
            .context("invalid console configuration")?;
        console_config.poll.interval()?;
        Ok(console_config)
    }
}
