/*!
 * Progress Reporting
 * Caller-owned handles for long-running search and indexing work
 */

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Cooperative progress handle for search and indexing
///
/// Owned by the caller and passed by reference into long-running provider
/// operations; the provider never retains it beyond the call. Completion is
/// signalled exactly once: the first `done` flips the flag and wakes waiters,
/// later calls are ignored. Cancellation is cooperative - backends check
/// `is_canceled` at their own granularity, and still signal `done` when they
/// stop early.
#[derive(Clone, Default)]
pub struct Progress {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    total_work: AtomicU64,
    worked: AtomicU64,
    done: AtomicBool,
    canceled: AtomicBool,
    finished: Notify,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_total_work(&self, total: u64) {
        self.inner.total_work.store(total, Ordering::SeqCst);
    }

    pub fn total_work(&self) -> u64 {
        self.inner.total_work.load(Ordering::SeqCst)
    }

    /// Record completed work units
    pub fn worked(&self, amount: u64) {
        self.inner.worked.fetch_add(amount, Ordering::SeqCst);
    }

    pub fn work_completed(&self) -> u64 {
        self.inner.worked.load(Ordering::SeqCst)
    }

    /// Request cooperative cancellation
    pub fn cancel(&self) {
        self.inner.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.inner.canceled.load(Ordering::SeqCst)
    }

    /// Signal completion; only the first call has any effect
    pub fn done(&self) {
        if !self.inner.done.swap(true, Ordering::SeqCst) {
            self.inner.finished.notify_waiters();
        }
    }

    pub fn is_done(&self) -> bool {
        self.inner.done.load(Ordering::SeqCst)
    }

    /// Wait until `done` has been signalled
    pub async fn wait_done(&self) {
        loop {
            let notified = self.inner.finished.notified();
            if self.is_done() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_accounting() {
        let progress = Progress::new();
        progress.set_total_work(10);
        progress.worked(3);
        progress.worked(2);

        assert_eq!(progress.total_work(), 10);
        assert_eq!(progress.work_completed(), 5);
    }

    #[test]
    fn test_done_once() {
        let progress = Progress::new();
        assert!(!progress.is_done());

        progress.done();
        assert!(progress.is_done());

        // Second call is ignored, not an error
        progress.done();
        assert!(progress.is_done());
    }

    #[test]
    fn test_cancellation() {
        let progress = Progress::new();
        assert!(!progress.is_canceled());

        progress.cancel();
        assert!(progress.is_canceled());
        // Cancellation does not imply completion
        assert!(!progress.is_done());
    }

    #[tokio::test]
    async fn test_wait_done() {
        let progress = Progress::new();
        let waiter = progress.clone();

        let handle = tokio::spawn(async move {
            waiter.wait_done().await;
            waiter.work_completed()
        });

        progress.worked(7);
        progress.done();

        assert_eq!(handle.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_wait_done_after_completion() {
        let progress = Progress::new();
        progress.done();

        // Must not hang when done was signalled before the wait
        progress.wait_done().await;
    }
}
