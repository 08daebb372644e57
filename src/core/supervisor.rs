//! # Supervisor: one pipeline lifetime, from link gate to ordered teardown.
//!
//! The [`Supervisor`] owns the event bus, the [`SubscriberSet`] and the two
//! external collaborators. [`Supervisor::run`] drives a single lifetime of the
//! pipeline and reports why it ended; restarting means building a new one.
//!
//! ## Lifecycle
//! ```text
//! run()
//!   ├─► subscriber_listener(): Bus ─► AliveTracker + SubscriberSet::emit
//!   │
//!   ├─► startup gate
//!   │     ├─ link.connected()            → go
//!   │     ├─ link.connection_watch()     → wait (bounded by connect_timeout)
//!   │     └─ neither                     → Err(NotConnected)
//!   │
//!   ├─► EdgeCapture::register(cfg.inputs)   (any failure rolls back, Err(EdgeSetup))
//!   │
//!   ├─► spawn under child tokens:
//!   │     Ticker ─► TickCounter ◄─ Dispatcher ─► PublishQueue ─► Publisher ─► link
//!   │
//!   ├─► wait: restart signal (input / fault / application) or OS signal
//!   │
//!   └─► teardown, in order:
//!         ShutdownRequested
//!         deregister every input           (no new edges)
//!         cancel tasks, wait up to grace   (AllStoppedWithin | GraceExceeded)
//!         release queues and counter
//! ```
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use pressvisor::{
//!     ChannelId, Config, EdgeError, EdgeIsr, InputPins, LinkState, Publish,
//!     PublishError, RestartReason, Supervisor,
//! };
//!
//! struct Board;
//!
//! impl InputPins for Board {
//!     fn register_edge_source(&self, _ch: ChannelId, _isr: EdgeIsr) -> Result<(), EdgeError> {
//!         Ok(())
//!     }
//!     fn deregister_edge_source(&self, _ch: ChannelId) -> Result<(), EdgeError> {
//!         Ok(())
//!     }
//!     fn read_level(&self, _ch: ChannelId) -> bool {
//!         false
//!     }
//! }
//!
//! struct Broker(LinkState);
//!
//! #[async_trait::async_trait]
//! impl Publish for Broker {
//!     async fn publish(&self, _topic: &str, _payload: bytes::Bytes) -> Result<(), PublishError> {
//!         Ok(())
//!     }
//!     fn connected(&self) -> bool {
//!         self.0.is_connected()
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pins = Arc::new(Board);
//!     let link = Arc::new(Broker(LinkState::new()));
//!     link.0.set_connected(true);
//!
//!     loop {
//!         let sup = Supervisor::builder(Config::default()).build(pins.clone(), link.clone());
//!         let report = sup.run().await?;
//!         if report.reason == RestartReason::Signal {
//!             return Ok(());
//!         }
//!     }
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time;
use tokio_util::sync::CancellationToken;

use super::{
    alive::AliveTracker,
    builder::SupervisorBuilder,
    restart::{RestartHandle, RestartReason, RestartSignal},
    runner, shutdown,
};
use crate::core::Config;
use crate::edge::{EdgeCapture, InputPins};
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::publish::{Publish, PublishQueue};
use crate::subscribers::SubscriberSet;
use crate::tasks::{DispatchParams, Dispatcher, Publisher, TaskRef, Ticker};
use crate::tick::TickCounter;

/// Outcome of one pipeline lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    /// What ended it.
    pub reason: RestartReason,
}

/// Owns one lifetime of the pipeline.
pub struct Supervisor {
    cfg: Config,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    alive: Arc<AliveTracker>,
    pins: Arc<dyn InputPins>,
    link: Arc<dyn Publish>,
    restart: RestartHandle,
    signal: RestartSignal,
}

impl Supervisor {
    /// Starts building a supervisor.
    pub fn builder(cfg: Config) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(super) fn new_internal(
        cfg: Config,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        pins: Arc<dyn InputPins>,
        link: Arc<dyn Publish>,
    ) -> Self {
        let (restart, signal) = RestartSignal::new();
        Self {
            cfg,
            bus,
            subs,
            alive: Arc::new(AliveTracker::new()),
            pins,
            link,
            restart,
            signal,
        }
    }

    /// Event bus; subscribe before [`run`](Self::run) to see startup events.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Handle for requesting a restart from outside the pipeline.
    ///
    /// A request made before [`run`](Self::run) ends the run right after it starts.
    pub fn restart_handle(&self) -> RestartHandle {
        self.restart.clone()
    }

    /// Runs the pipeline until the restart signal is set or the process is asked
    /// to terminate, then tears it down.
    ///
    /// Errors are startup failures (link, inputs) or a teardown that exceeded the
    /// grace period.
    pub async fn run(mut self) -> Result<ShutdownReport, RuntimeError> {
        let stop = CancellationToken::new();
        let listener = self.subscriber_listener(stop.clone());

        let res = self.run_pipeline().await;

        stop.cancel();
        let _ = listener.await;
        if let Ok(subs) = Arc::try_unwrap(self.subs) {
            subs.shutdown().await;
        }
        res
    }

    async fn run_pipeline(&mut self) -> Result<ShutdownReport, RuntimeError> {
        let early = tokio::select! {
            biased;
            reason = self.signal.wait() => Some(reason.unwrap_or(RestartReason::External)),
            _ = shutdown::termination() => Some(RestartReason::Signal),
            ready = wait_for_link(self.link.as_ref(), self.cfg.connect_limit()) => {
                ready?;
                None
            }
        };
        if let Some(reason) = early {
            self.restart.request(reason.clone());
            self.publish_shutdown(&reason);
            return Ok(ShutdownReport { reason });
        }

        let (capture, edges) =
            EdgeCapture::new(self.cfg.edge_capacity_clamped(), Arc::clone(&self.pins));
        self.register_inputs(&capture)?;

        let counter = Arc::new(TickCounter::new());
        let (queue, records) = PublishQueue::new(self.cfg.publish_capacity_clamped());
        let tasks: [TaskRef; 3] = [
            Arc::new(Ticker::new(
                Arc::clone(&counter),
                self.cfg.tick_interval,
                self.cfg.lock_timeout,
                self.bus.clone(),
            )),
            Arc::new(Dispatcher::new(
                edges,
                Arc::clone(&counter),
                Arc::clone(&self.pins),
                queue.clone(),
                self.restart.clone(),
                DispatchParams {
                    lock_timeout: self.cfg.lock_timeout,
                    restart_settle: self.cfg.restart_settle,
                },
                self.bus.clone(),
            )),
            Arc::new(Publisher::new(
                records,
                Arc::clone(&self.link),
                self.cfg.base_topic.clone(),
                self.bus.clone(),
            )),
        ];

        let token = CancellationToken::new();
        let mut set = JoinSet::new();
        self.spawn_tasks(&mut set, &token, tasks);

        let reason = tokio::select! {
            biased;
            reason = self.signal.wait() => reason.unwrap_or(RestartReason::External),
            _ = shutdown::termination() => RestartReason::Signal,
        };
        // Latch: requests made during teardown are refused.
        self.restart.request(reason.clone());

        self.publish_shutdown(&reason);
        self.release_inputs(&capture);
        token.cancel();
        let stopped = self.wait_all_with_grace(&mut set).await;

        // Queues and counter outlive every task that used them.
        drop(queue);
        drop(counter);
        drop(capture);

        stopped.map(|()| ShutdownReport { reason })
    }

    /// Forwards bus events to the alive tracker and the subscriber set until
    /// `stop` fires and the backlog is drained.
    fn subscriber_listener(&self, stop: CancellationToken) -> JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        let subs = Arc::clone(&self.subs);
        let alive = Arc::clone(&self.alive);

        tokio::spawn(async move {
            loop {
                let next = tokio::select! {
                    biased;
                    next = rx.recv() => next,
                    _ = stop.cancelled() => break,
                };
                match next {
                    Ok(ev) => {
                        alive.update(&ev).await;
                        subs.emit(&ev);
                    }
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Registers every configured input; on failure, undoes the ones that succeeded.
    fn register_inputs(&self, capture: &EdgeCapture) -> Result<(), RuntimeError> {
        for &channel in &self.cfg.inputs {
            if let Err(e) = capture.register(channel) {
                self.release_inputs(capture);
                return Err(RuntimeError::EdgeSetup(e));
            }
        }
        Ok(())
    }

    /// Deregisters every input. Failures are reported, never fatal.
    fn release_inputs(&self, capture: &EdgeCapture) {
        for (channel, err) in capture.deregister_all() {
            self.bus.publish(
                Event::new(EventKind::EdgeDeregisterFailed)
                    .with_channel(channel)
                    .with_reason(err.to_string()),
            );
        }
    }

    fn spawn_tasks(
        &self,
        set: &mut JoinSet<()>,
        token: &CancellationToken,
        tasks: impl IntoIterator<Item = TaskRef>,
    ) {
        for task in tasks {
            let token = token.clone();
            let bus = self.bus.clone();
            let restart = self.restart.clone();
            set.spawn(async move {
                let _ = runner::run_once(task.as_ref(), &token, &bus, &restart).await;
            });
        }
    }

    fn publish_shutdown(&self, reason: &RestartReason) {
        self.bus.publish(
            Event::new(EventKind::ShutdownRequested).with_reason(reason.to_string()),
        );
    }

    /// Waits for all tasks to finish within the configured grace period.
    ///
    /// A zero grace aborts whatever is still running without waiting.
    async fn wait_all_with_grace(&self, set: &mut JoinSet<()>) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;
        if grace.is_zero() {
            set.shutdown().await;
            return Ok(());
        }

        let done = async { while set.join_next().await.is_some() {} };
        match time::timeout(grace, done).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                self.bus.publish(Event::new(EventKind::GraceExceeded));
                let stuck = self.alive.snapshot().await;
                set.shutdown().await;
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}

/// Startup gate: resolves once the link is up.
async fn wait_for_link(link: &dyn Publish, limit: Option<Duration>) -> Result<(), RuntimeError> {
    if link.connected() {
        return Ok(());
    }
    let Some(mut watch) = link.connection_watch() else {
        return Err(RuntimeError::NotConnected);
    };

    let up = async { watch.wait_for(|connected| *connected).await.is_ok() };
    let up = match limit {
        Some(timeout) => time::timeout(timeout, up)
            .await
            .map_err(|_| RuntimeError::ConnectTimeout { timeout })?,
        None => up.await,
    };
    if up {
        Ok(())
    } else {
        Err(RuntimeError::NotConnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelId;
    use crate::testkit::{RecordingLink, ScriptedPins, drain_kinds};

    const LIMIT: Duration = Duration::from_secs(5);

    fn cfg() -> Config {
        Config {
            tick_interval: Duration::from_millis(1),
            restart_settle: Duration::from_millis(5),
            inputs: vec![ChannelId::TEAM0, ChannelId::TEAM1, ChannelId::RESTART],
            ..Config::default()
        }
    }

    async fn until(cond: impl Fn() -> bool) {
        time::timeout(LIMIT, async {
            while !cond() {
                time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn press_is_published_and_restart_input_ends_the_run() {
        let pins = Arc::new(ScriptedPins::new());
        let link = Arc::new(RecordingLink::connected());
        let sup = Supervisor::builder(cfg()).build(pins.clone(), link.clone());
        let mut events = sup.bus().subscribe();
        let run = tokio::spawn(sup.run());

        until(|| pins.is_installed(ChannelId::RESTART)).await;
        pins.press(ChannelId::TEAM1);
        let sent = time::timeout(LIMIT, link.wait_for_calls(1)).await.unwrap();
        assert_eq!(sent[0].0, "button/pressed/1");
        let payload = std::str::from_utf8(&sent[0].1).unwrap();
        assert!(payload.parse::<u64>().is_ok(), "payload {payload:?}");

        pins.press(ChannelId::RESTART);
        let report = time::timeout(LIMIT, run).await.unwrap().unwrap().unwrap();
        assert_eq!(
            report.reason,
            RestartReason::Input {
                channel: ChannelId::RESTART
            }
        );
        for ch in [ChannelId::TEAM0, ChannelId::TEAM1, ChannelId::RESTART] {
            assert!(!pins.is_installed(ch));
        }
        assert_eq!(link.sent().len(), 1);

        let kinds = drain_kinds(&mut events);
        let pos = |k| kinds.iter().position(|x| *x == k).unwrap();
        assert!(pos(EventKind::RestartRequested) < pos(EventKind::ShutdownRequested));
        assert!(pos(EventKind::ShutdownRequested) < pos(EventKind::AllStoppedWithin));
        assert_eq!(
            kinds
                .iter()
                .filter(|k| **k == EventKind::TaskStarting)
                .count(),
            3
        );
    }

    #[tokio::test]
    async fn bounced_press_is_not_published() {
        let pins = Arc::new(ScriptedPins::new());
        let link = Arc::new(RecordingLink::connected());
        let sup = Supervisor::builder(cfg()).build(pins.clone(), link.clone());
        let restart = sup.restart_handle();
        let mut events = sup.bus().subscribe();
        let run = tokio::spawn(sup.run());

        until(|| pins.is_installed(ChannelId::TEAM0)).await;
        pins.bounce(ChannelId::TEAM0);
        loop {
            if events.recv().await.unwrap().kind == EventKind::EdgeDebounced {
                break;
            }
        }

        assert!(restart.request(RestartReason::External));
        let report = time::timeout(LIMIT, run).await.unwrap().unwrap().unwrap();
        assert_eq!(report.reason, RestartReason::External);
        assert!(link.sent().is_empty());
        assert!(!restart.request(RestartReason::Signal));
    }

    #[tokio::test]
    async fn disconnected_link_without_watch_fails_startup() {
        let pins = Arc::new(ScriptedPins::new());
        let link = Arc::new(RecordingLink::disconnected(false));
        let sup = Supervisor::builder(cfg()).build(pins.clone(), link);

        let err = sup.run().await.unwrap_err();
        assert!(matches!(err, RuntimeError::NotConnected));
        assert_eq!(pins.register_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_window_is_bounded() {
        let pins = Arc::new(ScriptedPins::new());
        let link = Arc::new(RecordingLink::disconnected(true));
        let cfg = Config {
            connect_timeout: Duration::from_millis(50),
            ..cfg()
        };
        let sup = Supervisor::builder(cfg).build(pins.clone(), link);

        let err = sup.run().await.unwrap_err();
        assert!(matches!(err, RuntimeError::ConnectTimeout { .. }));
        assert_eq!(pins.register_calls(), 0);
    }

    #[tokio::test]
    async fn startup_waits_for_link() {
        let pins = Arc::new(ScriptedPins::new());
        let link = Arc::new(RecordingLink::disconnected(true));
        let sup = Supervisor::builder(cfg()).build(pins.clone(), link.clone());
        let restart = sup.restart_handle();
        let run = tokio::spawn(sup.run());

        time::sleep(Duration::from_millis(20)).await;
        assert_eq!(pins.register_calls(), 0);

        link.state.set_connected(true);
        until(|| pins.is_installed(ChannelId::TEAM0)).await;

        restart.request(RestartReason::External);
        let report = time::timeout(LIMIT, run).await.unwrap().unwrap().unwrap();
        assert_eq!(report.reason, RestartReason::External);
    }

    #[tokio::test]
    async fn restart_during_link_wait_skips_startup() {
        let pins = Arc::new(ScriptedPins::new());
        let link = Arc::new(RecordingLink::disconnected(true));
        let sup = Supervisor::builder(cfg()).build(pins.clone(), link);
        sup.restart_handle().request(RestartReason::External);

        let report = sup.run().await.unwrap();
        assert_eq!(report.reason, RestartReason::External);
        assert_eq!(pins.register_calls(), 0);
    }

    #[tokio::test]
    async fn failed_registration_rolls_back() {
        let pins = Arc::new(ScriptedPins::new());
        pins.fail_register(ChannelId::TEAM1);
        let link = Arc::new(RecordingLink::connected());
        let sup = Supervisor::builder(cfg()).build(pins.clone(), link);

        let err = sup.run().await.unwrap_err();
        assert!(matches!(err, RuntimeError::EdgeSetup(_)));
        assert!(!pins.is_installed(ChannelId::TEAM0));
        assert!(!pins.is_installed(ChannelId::RESTART));
    }

    #[tokio::test]
    async fn teardown_reports_deregistration_failures() {
        let pins = Arc::new(ScriptedPins::new());
        pins.fail_deregister(ChannelId::TEAM1);
        let link = Arc::new(RecordingLink::connected());
        let sup = Supervisor::builder(cfg()).build(pins.clone(), link);
        let restart = sup.restart_handle();
        let mut events = sup.bus().subscribe();
        let run = tokio::spawn(sup.run());

        until(|| pins.is_installed(ChannelId::RESTART)).await;
        restart.request(RestartReason::External);
        let report = time::timeout(LIMIT, run).await.unwrap().unwrap().unwrap();

        assert_eq!(report.reason, RestartReason::External);
        assert_eq!(pins.deregister_calls(), 3);
        assert!(drain_kinds(&mut events).contains(&EventKind::EdgeDeregisterFailed));
    }

    #[tokio::test(start_paused = true)]
    async fn grace_exceeded_names_stuck_tasks() {
        let pins = Arc::new(ScriptedPins::new());
        let link = Arc::new(RecordingLink::connected());
        let cfg = Config {
            grace: Duration::from_millis(10),
            ..cfg()
        };
        let sup = Supervisor::builder(cfg).build(pins, link);
        sup.alive
            .update(&Event::new(EventKind::TaskStarting).with_task("stuck"))
            .await;

        let mut set = JoinSet::new();
        set.spawn(std::future::pending::<()>());
        let err = sup.wait_all_with_grace(&mut set).await.unwrap_err();

        match err {
            RuntimeError::GraceExceeded { grace, stuck } => {
                assert_eq!(grace, Duration::from_millis(10));
                assert_eq!(stuck, vec!["stuck".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(set.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_grace_aborts_without_waiting() {
        let pins = Arc::new(ScriptedPins::new());
        let link = Arc::new(RecordingLink::connected());
        let cfg = Config {
            grace: Duration::ZERO,
            ..cfg()
        };
        let sup = Supervisor::builder(cfg).build(pins, link);
        let mut events = sup.bus().subscribe();

        let mut set = JoinSet::new();
        set.spawn(std::future::pending::<()>());
        let started = time::Instant::now();
        sup.wait_all_with_grace(&mut set).await.unwrap();

        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(set.is_empty());
        let kinds = drain_kinds(&mut events);
        assert!(!kinds.contains(&EventKind::GraceExceeded));
        assert!(!kinds.contains(&EventKind::AllStoppedWithin));
    }

    #[tokio::test]
    async fn restart_signal_stays_latched_after_the_run() {
        let pins = Arc::new(ScriptedPins::new());
        let link = Arc::new(RecordingLink::connected());
        let sup = Supervisor::builder(cfg()).build(pins.clone(), link);
        let restart = sup.restart_handle();
        let mut events = sup.bus().subscribe();
        let run = tokio::spawn(sup.run());

        until(|| pins.is_installed(ChannelId::RESTART)).await;
        pins.press(ChannelId::RESTART);
        let report = time::timeout(LIMIT, run).await.unwrap().unwrap().unwrap();
        assert_eq!(
            report.reason,
            RestartReason::Input {
                channel: ChannelId::RESTART
            }
        );

        assert!(!restart.request(RestartReason::Fault {
            task: "publisher".into(),
            error: "late".into(),
        }));
        let requested = drain_kinds(&mut events)
            .into_iter()
            .filter(|k| *k == EventKind::RestartRequested)
            .count();
        assert_eq!(requested, 1);
    }
}
