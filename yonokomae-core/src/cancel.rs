//! Cooperative cancellation scopes.
//!
//! A `CancelToken` is raced against work; it is never handed to a shared
//! underlying call, so cancelling one caller leaves other waiters intact.

use tokio::sync::watch;

/// The firing side of a cancellation scope.
#[derive(Debug)]
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

/// The observing side; cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelSource {
    #[must_use]
    pub fn new() -> (CancelSource, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (CancelSource { tx }, CancelToken { rx })
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    #[must_use]
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

impl CancelToken {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the source fires. If the source is dropped without
    /// firing this never resolves, so a `select!` against it always takes
    /// the work branch.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if *rx.borrow() {
            return;
        }
        while rx.changed().await.is_ok() {
            if *rx.borrow() {
                return;
            }
        }
        std::future::pending::<()>().await;
    }
}
