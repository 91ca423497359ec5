//! Request-scoped cancellation
//!
//! Every handler receives a [`Context`] as its first argument. Outbound calls
//! race against [`Context::cancelled`] so an abandoned request stops waiting
//! on the network.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time;

/// Context carries the cancellation signal and optional deadline of a request
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    deadline: Option<Instant>,
    done: watch::Receiver<bool>,
    done_tx: watch::Sender<bool>,
}

impl Context {
    pub fn new() -> Self {
        let (done_tx, done) = watch::channel(false);
        Self {
            inner: Arc::new(ContextInner {
                deadline: None,
                done,
                done_tx,
            }),
        }
    }

    /// Derives a context that is cancelled when `timeout` elapses or when
    /// `self` is cancelled, whichever comes first. Must be called inside a
    /// tokio runtime.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        let (done_tx, done) = watch::channel(self.is_cancelled());

        let forward_tx = done_tx.clone();
        let parent = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = time::sleep_until(deadline.into()) => {}
                _ = parent.cancelled() => {}
                _ = forward_tx.closed() => return,
            }
            let _ = forward_tx.send(true);
        });

        Self {
            inner: Arc::new(ContextInner {
                deadline: Some(deadline),
                done,
                done_tx,
            }),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.done.borrow()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    pub fn cancel(&self) {
        let _ = self.inner.done_tx.send(true);
    }

    /// Resolves once the context is cancelled. Never resolves otherwise.
    pub async fn cancelled(&self) {
        let mut done = self.inner.done.clone();
        if done.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
