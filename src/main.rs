use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

mod api;
mod bucket;
mod catalog;
mod chart;
mod client;
mod config;
mod diagnostics;
mod format;
mod layout;
mod legend;
mod model;
mod palette;
mod poller;
mod render;
mod session;
mod tags;

use api::MetricSelector;
use chart::ChartKind;
use client::{ConsoleApi, FixtureConsole, HttpConsole};
use crate::config::ConsoleConfig;
use layout::Sankey;
use poller::{HtmlFileSink, Poller, PollerCommand, RefreshInterval};
use session::{Layer, Session};

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "streams-console")]
#[command(about = "Streaming job topology dashboard", long_about = None)]
struct Cli {
    /// Config file (defaults to ./console.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Console base URL, e.g. http://localhost:8080/console/
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the console and rewrite the dashboard on every tick.
    /// Control commands are read from stdin.
    Watch {
        /// Refresh interval in seconds (3-20)
        #[arg(long)]
        interval: Option<String>,

        #[arg(long, value_enum)]
        layer: Option<Layer>,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },

    /// Render a single dashboard frame.
    Render {
        /// Read JSON fixtures from this directory instead of the server
        #[arg(long)]
        fixtures: Option<PathBuf>,

        #[arg(long)]
        job: Option<String>,

        #[arg(long, value_enum)]
        layer: Option<Layer>,

        /// Metric selector, `name:<name>,type:<type>`
        #[arg(long)]
        metric: Option<MetricSelector>,

        #[arg(long, value_enum)]
        chart: Option<ChartKind>,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },

    /// List jobs and their state.
    Jobs {
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("streams_console=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ConsoleConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.url {
        config.server.url = url;
    }

    match cli.cmd {
        Commands::Watch {
            interval,
            layer,
            out,
        } => {
            let interval = match interval {
                Some(raw) => RefreshInterval::parse(&raw)?,
                None => config.poll.interval()?,
            };
            let layer = layer.unwrap_or(config.poll.layer);
            let out = out.unwrap_or_else(|| config.output.path.clone());
            let api = HttpConsole::new(&config.server.url, config.server.timeout())?;

            let mut poller = Poller::new(api, session(&config), HtmlFileSink::new(&out), interval);
            if layer != Layer::default() {
                poller.request_layer(layer);
            }

            let (tx, rx) = mpsc::channel(32);
            tokio::spawn(read_commands(tx));
            tracing::info!(out = %out.display(), url = %config.server.url, "watching");
            eprintln!("{}", poller::control::HELP);
            poller.run(rx).await?;
        }
        Commands::Render {
            fixtures,
            job,
            layer,
            metric,
            chart,
            out,
        } => {
            let out = out.unwrap_or_else(|| config.output.path.clone());
            let options = RenderOptions {
                job,
                layer: layer.unwrap_or(config.poll.layer),
                metric,
                chart,
            };
            match fixtures {
                Some(dir) => render_once(FixtureConsole::new(dir), &config, options, &out).await?,
                None => {
                    let api = HttpConsole::new(&config.server.url, config.server.timeout())?;
                    render_once(api, &config, options, &out).await?
                }
            }
            println!("Wrote {}", out.display());
        }
        Commands::Jobs { fixtures } => match fixtures {
            Some(dir) => list_jobs(FixtureConsole::new(dir)).await?,
            None => {
                list_jobs(HttpConsole::new(&config.server.url, config.server.timeout())?).await?
            }
        },
    }

    Ok(())
}

fn session(config: &ConsoleConfig) -> Session {
    Session::new(Box::new(Sankey::default()), config.canvas.canvas())
}

struct RenderOptions {
    job: Option<String>,
    layer: Layer,
    metric: Option<MetricSelector>,
    chart: Option<ChartKind>,
}

async fn render_once<A: ConsoleApi>(
    api: A,
    config: &ConsoleConfig,
    options: RenderOptions,
    out: &std::path::Path,
) -> Result<()> {
    let mut poller = Poller::new(
        api,
        session(config),
        HtmlFileSink::new(out),
        config.poll.interval()?,
    );
    poller.apply_command(PollerCommand::Pause)?;
    poller.poll_once().await?;

    if let Some(job) = options.job {
        poller.apply_command(PollerCommand::Job(job))?;
        poller.poll_once().await?;
    }
    if let Some(metric) = options.metric {
        poller.apply_command(PollerCommand::Metric(metric))?;
    }
    if let Some(chart) = options.chart {
        poller.apply_command(PollerCommand::Chart(chart))?;
    }
    poller.poll_once().await?;
    if let Err(e) = poller.apply_command(PollerCommand::Layer(options.layer)) {
        diagnostics::warn(format!("{:#}", e));
    }
    Ok(())
}

async fn list_jobs<A: ConsoleApi>(api: A) -> Result<()> {
    let jobs = api.jobs().await?;
    if jobs.is_empty() {
        println!("no jobs");
    }
    for job in &jobs {
        println!("{}\t{}", job.id, job.display_name());
        for line in job.state_lines() {
            println!("\t{}", line);
        }
    }
    Ok(())
}

/// Forward stdin lines to the poller until EOF or `quit`. EOF only closes
/// the channel; the poller keeps running.
async fn read_commands(tx: mpsc::Sender<PollerCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                diagnostics::warn(format!("reading stdin: {}", e));
                break;
            }
        };
        match poller::parse_command(&line) {
            Ok(Some(cmd)) => {
                let quit = cmd == PollerCommand::Quit;
                if tx.send(cmd).await.is_err() || quit {
                    return;
                }
            }
            Ok(None) => {}
            Err(e) => diagnostics::warn(format!("{:#}", e)),
        }
    }
}
