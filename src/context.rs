//! Cancellation contexts for execution calls.
//!
//! A [`Context`] carries an optional deadline and an optional cancel signal.
//! [`Context::run`] races a driver future against both and drops the future
//! when either fires. Derived contexts keep every signal of their parent, so
//! cancelling a parent also cancels its children.

use std::future::{Future, pending};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::error::{SqlError, SqlResult};

/// Caller-supplied cancellation context.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: Vec<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

/// Fires the cancel signal of the contexts derived from it.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Context {
    /// A context that is never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context that can be cancelled through the returned handle.
    /// The parent's signals still apply to the derived context.
    pub fn with_cancel(mut self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        self.cancel.push(rx);
        (self, CancelHandle { tx })
    }

    /// Derive a context that expires after `timeout`. An earlier deadline wins.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        Self {
            deadline: Some(self.deadline.map_or(deadline, |d| d.min(deadline))),
            ..self
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the context is already cancelled or past its deadline.
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Drive `fut` to completion unless the context fires first.
    pub async fn run<F, T>(&self, fut: F) -> SqlResult<T>
    where
        F: Future<Output = SqlResult<T>>,
    {
        if self.is_cancelled() {
            return Err(SqlError::Cancelled("cancel signal"));
        }

        tokio::select! {
            res = fut => res,
            _ = wait_cancelled(&self.cancel) => {
                Err(SqlError::Cancelled("cancel signal"))
            }
            _ = wait_deadline(self.deadline) => {
                Err(SqlError::Cancelled("deadline exceeded"))
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.iter().any(|rx| *rx.borrow())
    }
}

/// Resolves once any signal fires. Pending forever when there are none.
async fn wait_cancelled(signals: &[watch::Receiver<bool>]) {
    if signals.is_empty() {
        return pending().await;
    }

    // Watchers are aborted when the set is dropped.
    let mut watchers = JoinSet::new();
    for rx in signals {
        watchers.spawn(wait_signal(rx.clone()));
    }
    while let Some(fired) = watchers.join_next().await {
        if matches!(fired, Ok(true)) {
            return;
        }
    }
    pending().await
}

/// `false` when the handle was dropped without cancelling.
async fn wait_signal(mut rx: watch::Receiver<bool>) -> bool {
    loop {
        if *rx.borrow_and_update() {
            return true;
        }
        if rx.changed().await.is_err() {
            return false;
        }
    }
}

async fn wait_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => pending().await,
    }
}
