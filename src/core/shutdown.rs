//! # OS termination signals.
//!
//! **Unix:** `SIGINT`, `SIGTERM`, `SIGQUIT` and Ctrl-C.
//! **Other platforms:** Ctrl-C via [`tokio::signal::ctrl_c`].

use std::io;

/// Resolves once the process is asked to terminate.
///
/// Listeners are installed per call. If they cannot be installed this never
/// resolves: the pipeline then only stops through its restart signal.
pub(crate) async fn termination() {
    if listen().await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn listen() -> io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = interrupt.recv() => Ok(()),
        _ = terminate.recv() => Ok(()),
        _ = quit.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn listen() -> io::Result<()> {
    tokio::signal::ctrl_c().await
}
