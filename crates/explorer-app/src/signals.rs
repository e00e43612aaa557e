//! Shutdown signals while the explorer runs
//!
//! Raw mode turns Ctrl-C into a key event, so these only arrive from outside
//! the terminal (`kill`, a closing parent shell).

use std::fmt;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::message::Message;
use explorer_core::prelude::*;

/// The signal that ended a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    Interrupt,
    Terminate,
}

impl fmt::Display for Shutdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
        })
    }
}

/// Send `Message::Quit` on the first shutdown signal
///
/// If handlers cannot be installed the explorer keeps running and only the
/// quit key ends it. The returned handle can be aborted on exit.
pub fn spawn_signal_handler(tx: mpsc::Sender<Message>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match next_shutdown().await {
            Ok(signal) => {
                info!("{} received, leaving the explorer", signal);
                forward(signal, &tx).await;
            }
            Err(e) => warn!("Shutdown signals are ignored: {}", e),
        }
    })
}

async fn forward(signal: Shutdown, tx: &mpsc::Sender<Message>) {
    if tx.send(Message::Quit).await.is_err() {
        debug!("Event loop already gone when {} arrived", signal);
    }
}

#[cfg(unix)]
async fn next_shutdown() -> Result<Shutdown> {
    use tokio::signal::unix::{signal, SignalKind};

    let install = |kind: SignalKind, name: &str| {
        signal(kind).map_err(|e| Error::terminal(format!("cannot watch {}: {}", name, e)))
    };
    let mut interrupt = install(SignalKind::interrupt(), "SIGINT")?;
    let mut terminate = install(SignalKind::terminate(), "SIGTERM")?;

    Ok(tokio::select! {
        _ = interrupt.recv() => Shutdown::Interrupt,
        _ = terminate.recv() => Shutdown::Terminate,
    })
}

#[cfg(windows)]
async fn next_shutdown() -> Result<Shutdown> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| Error::terminal(format!("cannot watch Ctrl+C: {}", e)))?;
    Ok(Shutdown::Interrupt)
}
