//! # Demo: simulated
//!
//! Runs the full pipeline against a simulated board and a console link.
//!
//! - Team buttons are pressed on a fixed schedule; every third press on team 1
//!   bounces and is filtered out.
//! - The link comes up shortly after startup, so the first lifetime waits at the gate.
//! - The restart button is pressed after a few seconds; the pipeline is torn
//!   down and a fresh one is built.
//!
//! ## Flow
//! ```text
//! presser ──► SimBoard (EdgeIsr::fire) ──► Supervisor::run()
//!                                             ├─► Ticker / Dispatcher / Publisher
//!                                             └─► ConsoleLink::publish ──► stdout
//! restart button ──► ShutdownReport ──► next lifetime (until LIFETIMES or Ctrl-C)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=pressvisor=debug cargo run --example simulated
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use pressvisor::{
    ChannelId, Config, EdgeError, EdgeIsr, InputPins, LinkState, LogWriter, Publish,
    PublishError, RestartReason, Subscribe, Supervisor,
};
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LIFETIMES: usize = 3;

/// Board whose interrupt lines are driven by the presser task.
#[derive(Default)]
struct SimBoard {
    isrs: Mutex<HashMap<ChannelId, EdgeIsr>>,
    levels: Mutex<HashMap<ChannelId, bool>>,
}

impl SimBoard {
    fn edge(&self, channel: ChannelId, stays_high: bool) {
        self.levels.lock().insert(channel, stays_high);
        let isr = self.isrs.lock().get(&channel).cloned();
        if let Some(isr) = isr {
            isr.fire();
        }
    }
}

impl InputPins for SimBoard {
    fn register_edge_source(&self, channel: ChannelId, isr: EdgeIsr) -> Result<(), EdgeError> {
        self.isrs.lock().insert(channel, isr);
        Ok(())
    }

    fn deregister_edge_source(&self, channel: ChannelId) -> Result<(), EdgeError> {
        self.isrs.lock().remove(&channel);
        Ok(())
    }

    fn read_level(&self, channel: ChannelId) -> bool {
        self.levels.lock().get(&channel).copied().unwrap_or(false)
    }
}

/// Link that prints every publication.
struct ConsoleLink {
    state: LinkState,
}

#[async_trait::async_trait]
impl Publish for ConsoleLink {
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), PublishError> {
        if !self.state.is_connected() {
            return Err(PublishError::NotConnected);
        }
        println!("[link] {topic} <- {}", String::from_utf8_lossy(&payload));
        Ok(())
    }

    fn connected(&self) -> bool {
        self.state.is_connected()
    }

    fn connection_watch(&self) -> Option<watch::Receiver<bool>> {
        Some(self.state.subscribe())
    }
}

/// Presses team buttons forever and the restart button every `restart_every`.
async fn presser(board: Arc<SimBoard>, restart_every: Duration) {
    let mut team0 = tokio::time::interval(Duration::from_millis(300));
    let mut team1 = tokio::time::interval(Duration::from_millis(450));
    let mut restart = tokio::time::interval(restart_every);
    restart.tick().await;
    let mut presses = 0u32;

    loop {
        tokio::select! {
            _ = team0.tick() => board.edge(ChannelId::TEAM0, true),
            _ = team1.tick() => {
                presses += 1;
                board.edge(ChannelId::TEAM1, presses % 3 != 0);
            }
            _ = restart.tick() => board.edge(ChannelId::RESTART, true),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let board = Arc::new(SimBoard::default());
    let link = Arc::new(ConsoleLink {
        state: LinkState::new(),
    });
    tokio::spawn({
        let link = Arc::clone(&link);
        async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            link.state.set_connected(true);
        }
    });
    tokio::spawn(presser(Arc::clone(&board), Duration::from_secs(3)));

    let mut cfg = Config::default();
    cfg.inputs.push(ChannelId::RESTART);
    cfg.connect_timeout = Duration::from_secs(5);

    for lifetime in 1..=LIFETIMES {
        let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
        let sup = Supervisor::builder(cfg.clone())
            .with_subscribers(subs)
            .build(board.clone(), link.clone());

        let report = sup.run().await?;
        println!("[demo] lifetime {lifetime} ended: {}", report.reason);
        if report.reason == RestartReason::Signal {
            break;
        }
    }
    Ok(())
}
