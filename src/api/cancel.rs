//! Request-scoped cooperative cancellation.
//!
//! One `CancelScope` per view instance; every request issued inside the
//! view carries a clone of the scope's token. Cancelling the scope (or
//! dropping it when the view ends) makes every pending request in the
//! scope resolve as cancelled instead of applying its result.

use tokio::sync::watch;

/// Owner side of a cancellation scope. Dropping the scope cancels it.
#[derive(Debug)]
pub struct CancelScope {
    tx: watch::Sender<bool>,
    token: CancelToken,
}

/// Observer side, cloned into every request of the scope.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelScope {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx,
            token: CancelToken { rx },
        }
    }

    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Signal cancellation to every token of this scope.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl Default for CancelScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CancelScope {
    fn drop(&mut self) {
        let _ = self.tx.send(true);
    }
}

impl CancelToken {
    /// Non-blocking observation. A token whose scope is gone reads as
    /// cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolve once the scope is cancelled. Network operations race
    /// their suspension points against this.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // wait_for errors when the sender is dropped, which also means
        // the scope ended.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}
