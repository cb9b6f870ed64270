//! Render loop.
//!
//! One task owns the [`Session`]. Timer ticks spawn fetches into a `JoinSet`;
//! finished fetches come back through the same `select!` as control
//! commands, so session state is never shared.
//!
//! Every fetch is stamped with the generation it started in and a sequence
//! number. A job or interval change starts a new generation and aborts what
//! is in flight; anything older than the last applied tick is dropped.

pub mod control;
pub mod interval;

pub use control::parse_command;
pub use interval::{IntervalError, RefreshInterval};

use crate::Result;
use crate::api::{JobDirectory, JobGraph, JobInfo, MetricSample, MetricSelector};
use crate::catalog::MetricCatalog;
use crate::chart::{ChartKind, LINE_REFRESH};
use crate::client::ConsoleApi;
use crate::diagnostics;
use crate::model::DashboardFrame;
use crate::render;
use crate::session::{Layer, Session};
use crate::tags::TagSelection;

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{Interval, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
    Rendering,
    Paused,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollerCommand {
    TogglePause,
    Pause,
    Resume,
    /// Raw text of the interval field.
    Interval(String),
    Job(String),
    Layer(Layer),
    Metric(MetricSelector),
    Chart(ChartKind),
    Tags(TagSelection),
    Drag { vertex: String, y: f64 },
    Quit,
}

/// What the run loop does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Refresh,
    RestartTimer,
    Quit,
}

/// Everything one refresh tick read from the server.
#[derive(Debug, Clone)]
pub struct TickData {
    pub generation: u64,
    pub sequence: u64,
    pub jobs: Vec<JobInfo>,
    /// Job the graph and metrics below belong to.
    pub job: Option<String>,
    pub graph: Option<JobGraph>,
    pub counters: Vec<MetricSample>,
    pub catalog: MetricCatalog,
    pub metric: Option<(MetricSelector, Vec<MetricSample>)>,
}

#[derive(Debug, Clone)]
pub struct LineData {
    pub generation: u64,
    pub sequence: u64,
    pub job: String,
    pub selector: MetricSelector,
    pub samples: Vec<MetricSample>,
}

#[derive(Debug)]
enum Fetched {
    Tick(TickData),
    Line(LineData),
}

/// Read one tick's worth of data for `job` (or the first listed job).
pub async fn fetch_tick<A: ConsoleApi>(
    api: &A,
    generation: u64,
    sequence: u64,
    job: Option<String>,
    metric: Option<MetricSelector>,
) -> Result<TickData> {
    let jobs = api.jobs().await.context("fetching jobs")?;
    let mut directory = JobDirectory::default();
    directory.replace(jobs.clone());
    let job = directory.resolve_selection(job.as_deref());

    let mut tick = TickData {
        generation,
        sequence,
        jobs,
        job: job.clone(),
        graph: None,
        counters: Vec::new(),
        catalog: MetricCatalog::default(),
        metric: None,
    };
    let Some(job) = job else {
        return Ok(tick);
    };

    if let Some(snapshot) = api.job_graph(&job).await.context("fetching job graph")? {
        tick.graph = Some(snapshot.validate_and_build()?);
    }
    tick.counters = api
        .metric(&job, &MetricSelector::tuple_counter())
        .await
        .context("fetching tuple counters")?
        .map(|s| s.samples())
        .unwrap_or_default();
    if let Some(available) = api
        .available_metrics(&job)
        .await
        .context("fetching available metrics")?
    {
        tick.catalog = MetricCatalog::from_snapshot(&available);
    }

    if let Some(selector) = tick.catalog.resolve_selection(metric.as_ref()) {
        let samples = api
            .metric(&job, &selector)
            .await
            .with_context(|| diagnostics::error_message(format!("fetching metric {}", selector)))?
            .map(|s| s.samples())
            .unwrap_or_default();
        tick.metric = Some((selector, samples));
    }
    Ok(tick)
}

async fn fetch_line<A: ConsoleApi>(
    api: &A,
    generation: u64,
    sequence: u64,
    job: String,
    selector: MetricSelector,
) -> Result<LineData> {
    let samples = api
        .metric(&job, &selector)
        .await
        .with_context(|| diagnostics::error_message(format!("fetching metric {}", selector)))?
        .map(|s| s.samples())
        .unwrap_or_default();
    Ok(LineData {
        generation,
        sequence,
        job,
        selector,
        samples,
    })
}

/// Destination of rendered frames.
pub trait FrameSink: Send {
    fn publish(&mut self, frame: &DashboardFrame) -> Result<()>;
}

/// Rewrites one HTML file per frame.
#[derive(Debug, Clone)]
pub struct HtmlFileSink {
    path: PathBuf,
}

impl HtmlFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FrameSink for HtmlFileSink {
    fn publish(&mut self, frame: &DashboardFrame) -> Result<()> {
        let html = render::render_dashboard_html(frame)?;
        std::fs::write(&self.path, html)
            .with_context(|| diagnostics::error_message(format!("writing {}", self.path.display())))?;
        tracing::debug!(path = %self.path.display(), sequence = frame.sequence, "frame written");
        Ok(())
    }
}

pub struct Poller<A: ConsoleApi, S: FrameSink> {
    api: Arc<A>,
    session: Session,
    sink: S,
    interval: RefreshInterval,
    /// What the interval field shows; reset to the default on bad input.
    interval_field: String,
    state: PollState,
    paused: bool,
    generation: u64,
    next_sequence: u64,
    last_applied: u64,
    last_line_applied: u64,
    /// Layer asked for before the data that enables it arrived.
    pending_layer: Option<Layer>,
    frames: u64,
    inflight: JoinSet<Result<Fetched>>,
}

impl<A: ConsoleApi, S: FrameSink> Poller<A, S> {
    pub fn new(api: A, session: Session, sink: S, interval: RefreshInterval) -> Self {
        Self {
            api: Arc::new(api),
            session,
            sink,
            interval,
            interval_field: interval.to_string(),
            state: PollState::Idle,
            paused: false,
            generation: 0,
            next_sequence: 1,
            last_applied: 0,
            last_line_applied: 0,
            pending_layer: None,
            frames: 0,
            inflight: JoinSet::new(),
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn interval(&self) -> RefreshInterval {
        self.interval
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Switch to `layer` once a tick has brought the data it needs.
    pub fn request_layer(&mut self, layer: Layer) {
        self.pending_layer = Some(layer);
    }

    /// Fetch, apply and publish a single tick without the timer.
    pub async fn poll_once(&mut self) -> Result<()> {
        let sequence = self.take_sequence();
        let tick = fetch_tick(
            self.api.as_ref(),
            self.generation,
            sequence,
            self.session.selected_job().map(str::to_string),
            self.session.metric().cloned(),
        )
        .await?;
        let mut applied = self.apply_tick(tick);
        if self.session.chart() == ChartKind::Line
            && let (Some(job), Some(selector)) = (
                self.session.selected_job().map(str::to_string),
                self.session.metric().cloned(),
            )
        {
            let sequence = self.take_sequence();
            let line = fetch_line(self.api.as_ref(), self.generation, sequence, job, selector).await?;
            applied |= self.apply_line(line);
        }
        if applied {
            self.publish();
        }
        Ok(())
    }

    /// Apply a control command outside the run loop. Timer effects are
    /// ignored; `Quit` is a no-op.
    pub fn apply_command(&mut self, cmd: PollerCommand) -> Result<()> {
        self.handle(cmd).map(|_| ())
    }

    /// Drive the loop until `Quit`. A closed command channel only stops
    /// command handling; polling goes on.
    pub async fn run(mut self, mut commands: mpsc::Receiver<PollerCommand>) -> Result<()> {
        tracing::info!(interval = %self.interval, "poller started");
        let mut ticker = self.ticker();
        let mut line_ticker = tokio::time::interval(LINE_REFRESH);
        line_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut listening = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.on_tick(),
                _ = line_ticker.tick() => self.on_line_tick(),
                Some(joined) = self.inflight.join_next(), if !self.inflight.is_empty() => {
                    self.on_fetched(joined);
                }
                cmd = commands.recv(), if listening => {
                    let Some(cmd) = cmd else {
                        tracing::info!("command input closed, polling continues");
                        listening = false;
                        continue;
                    };
                    match self.handle(cmd) {
                        Ok(Flow::Continue) => {}
                        Ok(Flow::Refresh) => self.on_tick(),
                        Ok(Flow::RestartTimer) => ticker = self.ticker(),
                        Ok(Flow::Quit) => break,
                        Err(e) => diagnostics::warn(format!("{:#}", e)),
                    }
                }
            }
        }

        self.inflight.abort_all();
        tracing::info!(frames = self.frames, "poller stopped");
        Ok(())
    }

    fn ticker(&self) -> Interval {
        let mut ticker = tokio::time::interval(self.interval.duration());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    fn take_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    fn on_tick(&mut self) {
        if self.paused {
            return;
        }
        let sequence = self.take_sequence();
        let api = Arc::clone(&self.api);
        let generation = self.generation;
        let job = self.session.selected_job().map(str::to_string);
        let metric = self.session.metric().cloned();
        self.inflight.spawn(async move {
            fetch_tick(api.as_ref(), generation, sequence, job, metric)
                .await
                .map(Fetched::Tick)
        });
        self.state = PollState::Polling;
    }

    fn on_line_tick(&mut self) {
        if self.paused || self.session.chart() != ChartKind::Line {
            return;
        }
        let (Some(job), Some(selector)) = (self.session.selected_job(), self.session.metric()) else {
            return;
        };
        let job = job.to_string();
        let selector = selector.clone();
        let sequence = self.take_sequence();
        let api = Arc::clone(&self.api);
        let generation = self.generation;
        self.inflight.spawn(async move {
            fetch_line(api.as_ref(), generation, sequence, job, selector)
                .await
                .map(Fetched::Line)
        });
    }

    fn on_fetched(&mut self, joined: std::result::Result<Result<Fetched>, JoinError>) {
        let applied = match joined {
            Err(e) if e.is_cancelled() => {
                tracing::debug!("fetch aborted");
                false
            }
            Err(e) => {
                diagnostics::warn(format!("fetch task failed: {}", e));
                false
            }
            Ok(Err(e)) => {
                diagnostics::warn(format!("refresh skipped: {:#}", e));
                false
            }
            Ok(Ok(Fetched::Tick(tick))) => self.apply_tick(tick),
            Ok(Ok(Fetched::Line(line))) => self.apply_line(line),
        };
        if applied {
            self.publish();
        } else {
            self.settle();
        }
    }

    /// Fold a tick into the session. Returns false for stale ticks.
    pub fn apply_tick(&mut self, tick: TickData) -> bool {
        if tick.generation != self.generation {
            tracing::debug!(
                generation = tick.generation,
                current = self.generation,
                "dropping response from an earlier generation"
            );
            return false;
        }
        if tick.sequence <= self.last_applied {
            tracing::debug!(
                sequence = tick.sequence,
                last = self.last_applied,
                "dropping out-of-order response"
            );
            return false;
        }
        self.last_applied = tick.sequence;

        self.session.apply_jobs(tick.jobs);
        if tick.job.is_none() || self.session.selected_job() != tick.job.as_deref() {
            return true;
        }

        self.session.apply_catalog(tick.catalog);
        if let Some(graph) = tick.graph {
            self.session.apply_topology(graph, &tick.counters);
        }
        if let Some((selector, samples)) = tick.metric
            && self.session.metric() == Some(&selector)
        {
            self.session.apply_metric_values(samples);
        }
        if let Some(layer) = self.pending_layer.take()
            && let Err(e) = self.session.set_layer(layer)
        {
            diagnostics::warn(format!("{:#}", e));
        }
        true
    }

    fn apply_line(&mut self, line: LineData) -> bool {
        let current = line.generation == self.generation
            && self.session.selected_job() == Some(line.job.as_str())
            && self.session.metric() == Some(&line.selector)
            && self.session.chart() == ChartKind::Line;
        if !current {
            tracing::debug!(metric = %line.selector, "dropping stale line chart samples");
            return false;
        }
        if line.sequence <= self.last_line_applied {
            tracing::debug!(
                sequence = line.sequence,
                last = self.last_line_applied,
                "dropping out-of-order line chart samples"
            );
            return false;
        }
        self.last_line_applied = line.sequence;
        self.session.push_line_samples(&line.samples);
        true
    }

    fn handle(&mut self, cmd: PollerCommand) -> Result<Flow> {
        let flow = match cmd {
            PollerCommand::TogglePause => {
                self.set_paused(!self.paused);
                Flow::Continue
            }
            PollerCommand::Pause => {
                self.set_paused(true);
                Flow::Continue
            }
            PollerCommand::Resume => {
                self.set_paused(false);
                Flow::Continue
            }
            PollerCommand::Interval(raw) => match RefreshInterval::parse(&raw) {
                Ok(interval) => {
                    self.interval = interval;
                    self.interval_field = interval.to_string();
                    self.new_generation();
                    tracing::info!(%interval, "refresh interval changed");
                    Flow::RestartTimer
                }
                Err(e) => {
                    self.interval_field = RefreshInterval::DEFAULT.to_string();
                    self.publish();
                    return Err(e.into());
                }
            },
            PollerCommand::Job(id) => {
                self.session.select_job(&id)?;
                self.new_generation();
                Flow::RestartTimer
            }
            PollerCommand::Layer(layer) => {
                self.pending_layer = None;
                self.session.set_layer(layer)?;
                Flow::Continue
            }
            PollerCommand::Metric(selector) => {
                self.session.select_metric(selector)?;
                Flow::Refresh
            }
            PollerCommand::Chart(kind) => {
                self.session.set_chart(kind)?;
                Flow::Continue
            }
            PollerCommand::Tags(selection) => {
                self.session.select_tags(selection);
                Flow::Continue
            }
            PollerCommand::Drag { vertex, y } => {
                let applied = self.session.drag_vertex(&vertex, y)?;
                tracing::debug!(%vertex, y = applied, "vertex dragged");
                Flow::Continue
            }
            PollerCommand::Quit => return Ok(Flow::Quit),
        };
        self.publish();
        Ok(flow)
    }

    fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            tracing::info!(paused, "refresh toggled");
        }
        self.paused = paused;
    }

    fn new_generation(&mut self) {
        self.generation += 1;
        self.inflight.abort_all();
    }

    fn publish(&mut self) {
        self.state = PollState::Rendering;
        self.frames += 1;
        let mut frame = self
            .session
            .frame(self.frames, self.paused, self.interval.seconds());
        frame.interval_field = self.interval_field.clone();
        if let Err(e) = self.sink.publish(&frame) {
            diagnostics::warn(format!("{:#}", e));
        }
        self.settle();
    }

    fn settle(&mut self) {
        self.state = if self.paused {
            PollState::Paused
        } else if self.inflight.is_empty() {
            PollState::Idle
        } else {
            PollState::Polling
        };
        tracing::trace!(state = ?self.state(), frames = self.frames, "settled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FixtureConsole;
    use crate::layout::{Canvas, sankey::Sankey};
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct RecordingSink {
        frames: Arc<Mutex<Vec<DashboardFrame>>>,
    }

    impl RecordingSink {
        fn last(&self) -> DashboardFrame {
            self.frames.lock().unwrap().last().cloned().unwrap()
        }

        fn count(&self) -> usize {
            self.frames.lock().unwrap().len()
        }
    }

    impl FrameSink for RecordingSink {
        fn publish(&mut self, frame: &DashboardFrame) -> Result<()> {
            self.frames.lock().unwrap().push(frame.clone());
            Ok(())
        }
    }

    fn fixtures_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
    }

    fn poller_on(dir: PathBuf) -> (Poller<FixtureConsole, RecordingSink>, RecordingSink) {
        let sink = RecordingSink::default();
        let session = Session::new(Box::new(Sankey::default()), Canvas::default());
        let poller = Poller::new(
            FixtureConsole::new(dir),
            session,
            sink.clone(),
            RefreshInterval::default(),
        );
        (poller, sink)
    }

    fn poller() -> (Poller<FixtureConsole, RecordingSink>, RecordingSink) {
        poller_on(fixtures_dir())
    }

    fn latency() -> MetricSelector {
        MetricSelector::new("SinkLatency", "long")
    }

    /// Poller on JOB_0 showing the single-oplet latency metric as a line.
    async fn line_poller() -> (Poller<FixtureConsole, RecordingSink>, RecordingSink) {
        let (mut poller, sink) = poller();
        poller.poll_once().await.unwrap();
        poller.handle(PollerCommand::Metric(latency())).unwrap();
        poller.handle(PollerCommand::Chart(ChartKind::Line)).unwrap();
        (poller, sink)
    }

    /// Points on the line chart of a frame.
    fn line_points(frame: &DashboardFrame) -> usize {
        let Some(svg) = frame.metrics.as_ref().and_then(|m| m.svg.as_deref()) else {
            return 0;
        };
        let d = svg
            .split(r#"class="line" d=""#)
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap();
        d.matches(|c| c == 'M' || c == 'L').count()
    }

    #[tokio::test]
    async fn first_poll_renders_the_first_job() {
        let (mut poller, sink) = poller();
        poller.poll_once().await.unwrap();

        let frame = sink.last();
        assert_eq!(frame.selected_job.as_deref(), Some("JOB_0"));
        assert_eq!(frame.layer, Layer::Flow);
        assert_eq!(frame.topology.unwrap().vertices.len(), 4);
        assert_eq!(frame.refresh_seconds, 5);
        assert_eq!(poller.state(), PollState::Idle);
    }

    #[tokio::test]
    async fn pause_resume_keeps_interval_and_topology() {
        let (mut poller, sink) = poller();
        poller.poll_once().await.unwrap();
        poller.handle(PollerCommand::Interval("7".into())).unwrap();
        poller.poll_once().await.unwrap();
        let before = sink.last().topology;

        poller.handle(PollerCommand::Pause).unwrap();
        assert!(sink.last().paused);
        assert_eq!(poller.state(), PollState::Paused);
        poller.on_tick();
        assert!(poller.inflight.is_empty());

        poller.handle(PollerCommand::Resume).unwrap();
        let after = sink.last();
        assert!(!after.paused);
        assert_eq!(after.refresh_seconds, 7);
        assert_eq!(after.topology, before);
        assert_eq!(poller.interval().seconds(), 7);
    }

    #[tokio::test]
    async fn bad_interval_is_rejected_and_field_reset() {
        let (mut poller, sink) = poller();
        poller.handle(PollerCommand::Interval("9".into())).unwrap();

        let err = poller.handle(PollerCommand::Interval("2".into())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The refresh interval must be between 3 and 20 seconds"
        );
        let frame = sink.last();
        assert_eq!(frame.interval_field, "5");
        assert_eq!(frame.refresh_seconds, 9);
        assert_eq!(poller.interval().seconds(), 9);
    }

    #[tokio::test]
    async fn stale_responses_are_discarded() {
        let (mut poller, _sink) = poller();
        let console = FixtureConsole::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures"));

        let newer = fetch_tick(&console, 0, 2, None, None).await.unwrap();
        let older = fetch_tick(&console, 0, 1, None, None).await.unwrap();
        assert!(poller.apply_tick(newer));
        assert!(!poller.apply_tick(older));

        poller.handle(PollerCommand::Job("JOB_1".into())).unwrap();
        let previous_generation = fetch_tick(&console, 0, 3, Some("JOB_1".into()), None)
            .await
            .unwrap();
        assert!(!poller.apply_tick(previous_generation));

        let current = fetch_tick(&console, 1, 4, Some("JOB_1".into()), None)
            .await
            .unwrap();
        assert!(poller.apply_tick(current));
        assert_eq!(poller.session().graph().unwrap().vertices.len(), 2);
    }

    #[tokio::test]
    async fn line_chart_collects_samples_per_poll() {
        let (mut poller, sink) = line_poller().await;
        assert_eq!(sink.last().metrics.unwrap().chart, ChartKind::Line);
        assert_eq!(line_points(&sink.last()), 0);

        for _ in 0..3 {
            poller.poll_once().await.unwrap();
        }
        let frame = sink.last();
        assert_eq!(line_points(&frame), 3);
        let svg = frame.metrics.unwrap().svg.unwrap();
        assert!(svg.contains("Last 20 measures"));
    }

    #[tokio::test]
    async fn out_of_order_line_samples_are_dropped() {
        let (mut poller, sink) = line_poller().await;
        let console = FixtureConsole::new(fixtures_dir());
        let older_sequence = poller.take_sequence();
        let newer_sequence = poller.take_sequence();
        let older = fetch_line(&console, poller.generation, older_sequence, "JOB_0".into(), latency())
            .await
            .unwrap();
        let newer = fetch_line(&console, poller.generation, newer_sequence, "JOB_0".into(), latency())
            .await
            .unwrap();

        assert!(poller.apply_line(newer));
        assert!(!poller.apply_line(older));
        poller.publish();
        assert_eq!(line_points(&sink.last()), 1);
    }

    #[tokio::test]
    async fn requested_layer_waits_for_data() {
        let (mut poller, sink) = poller();
        assert!(!poller.session().layer_enabled(Layer::StreamTags));

        poller.request_layer(Layer::StreamTags);
        poller.poll_once().await.unwrap();
        assert_eq!(sink.last().layer, Layer::StreamTags);
        assert!(poller.pending_layer.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetches_do_not_stop_the_loop() {
        // A file where the fixture directory should be: every read fails.
        let (mut poller, sink) = poller_on(fixtures_dir().join("jobs.json"));
        assert!(poller.poll_once().await.is_err());
        poller.request_layer(Layer::OpletKind);

        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(poller.run(rx));
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(!handle.is_finished());
        assert_eq!(sink.count(), 0);

        tx.send(PollerCommand::Quit).await.unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn closed_command_input_keeps_polling() {
        let (poller, sink) = poller();
        let (tx, rx) = mpsc::channel(8);
        drop(tx);
        let handle = tokio::spawn(poller.run(rx));

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(!handle.is_finished());
        assert!(sink.count() >= 3);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn line_ticker_feeds_the_window() {
        let (mut poller, sink) = line_poller().await;
        poller.poll_once().await.unwrap();
        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(poller.run(rx));

        tokio::time::sleep(Duration::from_secs(6)).await;
        tx.send(PollerCommand::Quit).await.unwrap();
        handle.await.unwrap().unwrap();
        assert!(line_points(&sink.last()) >= 4);
    }

    #[tokio::test]
    async fn command_errors_leave_state_alone() {
        let (mut poller, _sink) = poller();
        poller.poll_once().await.unwrap();
        assert!(poller.handle(PollerCommand::Job("NO_SUCH_JOB".into())).is_err());
        assert_eq!(poller.session().selected_job(), Some("JOB_0"));
        assert!(poller.handle(PollerCommand::Drag { vertex: "OP_9".into(), y: 1.0 }).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_publishes_until_quit() {
        let (poller, sink) = poller();
        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(poller.run(rx));

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(sink.count() >= 2);
        assert_eq!(sink.last().selected_job.as_deref(), Some("JOB_0"));

        tx.send(PollerCommand::Layer(Layer::OpletKind)).await.unwrap();
        tx.send(PollerCommand::Quit).await.unwrap();
        handle.await.unwrap().unwrap();
        assert_eq!(sink.last().layer, Layer::OpletKind);
    }
}
