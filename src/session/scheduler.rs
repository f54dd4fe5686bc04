//! One-shot expiry timers keyed by session id.

use crate::types::SessionId;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "tracing")]
use tracing::debug;

#[derive(Debug)]
struct ScheduledTimeout {
    generation: u64,
    token: CancellationToken,
}

/// At most one pending timer per session id.
///
/// Each timer is its own task racing a sleep against a cancellation token.
/// Timers are tagged with a generation so a timer that was replaced while
/// already past its sleep never removes its successor's entry.
#[derive(Debug)]
pub(crate) struct TimeoutScheduler {
    timers: Arc<DashMap<SessionId, ScheduledTimeout>>,
    root: CancellationToken,
    generation: AtomicU64,
}

impl Default for TimeoutScheduler {
    fn default() -> Self {
        Self {
            timers: Arc::new(DashMap::new()),
            root: CancellationToken::new(),
            generation: AtomicU64::new(0),
        }
    }
}

impl TimeoutScheduler {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Schedule `on_fire` to run once after `delay`, replacing any timer
    /// already armed for `id`.
    ///
    /// Returns false, arming nothing, after [`shutdown`](Self::shutdown).
    pub(crate) fn arm<F, Fut>(&self, id: SessionId, delay: Duration, on_fire: F) -> bool
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.is_shut_down() {
            return false;
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let token = self.root.child_token();

        if let Some(previous) = self.timers.insert(
            id.clone(),
            ScheduledTimeout {
                generation,
                token: token.clone(),
            },
        ) {
            previous.token.cancel();
        }

        #[cfg(feature = "tracing")]
        debug!(session_id = %id, delay_secs = %delay.as_secs_f64(), "Timeout armed");

        let timers = Arc::clone(&self.timers);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let still_current = timers
                        .remove_if(&id, |_, scheduled| scheduled.generation == generation)
                        .is_some();
                    if still_current {
                        on_fire().await;
                    }
                }
            }
        });

        true
    }

    /// Disarm the timer for `id`. Returns false if none was pending.
    pub(crate) fn cancel(&self, id: &SessionId) -> bool {
        match self.timers.remove(id) {
            Some((_, scheduled)) => {
                scheduled.token.cancel();
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_armed(&self, id: &SessionId) -> bool {
        self.timers.contains_key(id)
    }

    pub(crate) fn armed_count(&self) -> usize {
        self.timers.len()
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Cancel every pending timer and refuse new ones.
    pub(crate) fn shutdown(&self) {
        self.root.cancel();
        self.timers.clear();
    }
}

impl Drop for TimeoutScheduler {
    fn drop(&mut self) {
        self.root.cancel();
    }
}
