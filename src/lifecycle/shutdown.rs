//! Shutdown coordination.

use tokio::sync::watch;

use crate::lifecycle::signals;

/// Process-wide shutdown trigger.
///
/// Backed by a watch channel so a listener that subscribes after the
/// trigger still observes it.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of [`Shutdown`].
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// Resolve once the trigger fires or every [`Shutdown`] is dropped.
    pub async fn recv(mut self) {
        let _ = self.rx.wait_for(|triggered| *triggered).await;
    }

    /// Resolve on the programmatic trigger or an OS termination signal.
    pub async fn recv_or_signal(self) {
        tokio::select! {
            _ = self.recv() => tracing::info!("Shutdown requested"),
            _ = signals::wait_for_termination() => {}
        }
    }
}
