//! Shutdown coordination for background tasks.

use tokio::sync::watch;

/// One-shot shutdown signal shared between tasks.
///
/// `wait()` returns an owned future so it can be polled inside `tokio::select!`
/// loops without borrowing the coordinator.
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            tx,
        }
    }

    /// Signal shutdown to every waiter.
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }

    /// Whether shutdown has been signalled.
    pub fn is_terminated(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until shutdown is signalled.
    pub fn wait(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            while !*rx.borrow_and_update() {
                if rx.changed().await.is_err() {
                    break;
                }
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
