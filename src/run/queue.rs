//! In-process work queue with delayed re-enqueue.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::input::ChannelIdentifier;

/// One pending attempt.
#[derive(Debug, Clone)]
pub(crate) struct WorkItem {
    pub(crate) identifier: ChannelIdentifier,
    /// Zero-based retry index
    pub(crate) attempt: u32,
}

/// FIFO of work items shared by all workers.
///
/// `pending` counts identifiers that are not finished yet: queued, in flight,
/// or waiting out a retry backoff. Workers stop dequeuing once it reaches zero
/// or the stop token fires.
pub(crate) struct WorkQueue {
    items: Mutex<VecDeque<WorkItem>>,
    pending: AtomicUsize,
    notify: Notify,
    stop: CancellationToken,
}

impl WorkQueue {
    pub(crate) fn new(identifiers: Vec<ChannelIdentifier>, stop: CancellationToken) -> Self {
        let items: VecDeque<WorkItem> = identifiers
            .into_iter()
            .map(|identifier| WorkItem {
                identifier,
                attempt: 0,
            })
            .collect();
        Self {
            pending: AtomicUsize::new(items.len()),
            items: Mutex::new(items),
            notify: Notify::new(),
            stop,
        }
    }

    /// Waits for the next item.
    ///
    /// Returns `None` once every identifier is finished or the queue is stopped.
    pub(crate) async fn next(&self) -> Option<WorkItem> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a push between the check and the
            // await is not missed
            notified.as_mut().enable();

            if self.stop.is_cancelled() {
                return None;
            }
            if let Some(item) = self.pop() {
                return Some(item);
            }
            if self.pending.load(Ordering::SeqCst) == 0 {
                return None;
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = self.stop.cancelled() => return None,
            }
        }
    }

    /// Puts `item` back after `delay`. Dropped if the queue stops first.
    pub(crate) fn retry_after(self: &Arc<Self>, item: WorkItem, delay: Duration) {
        let queue = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => queue.push(item),
                _ = queue.stop.cancelled() => {}
            }
        });
    }

    /// Marks one identifier as finished.
    pub(crate) fn finish(&self) {
        let previous = self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |p| p.checked_sub(1))
            .unwrap_or(0);
        if previous <= 1 {
            self.notify.notify_waiters();
        }
    }

    /// Stops all further dequeues.
    pub(crate) fn stop(&self) {
        self.stop.cancel();
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }

    fn push(&self, item: WorkItem) {
        self.items
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push_back(item);
        self.notify.notify_one();
    }

    fn pop(&self) -> Option<WorkItem> {
        self.items
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front()
    }
}
