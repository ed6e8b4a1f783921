use crate::domain::invoice::InvoiceId;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

/// Identifies one scheduled retry so a fired task can tell whether it is
/// still the current one for its invoice.
pub type RetryToken = u64;

struct PendingRetry {
    token: RetryToken,
    attempt: u32,
    handle: JoinHandle<()>,
}

/// Deferred re-attempts keyed by invoice id.
///
/// At most one retry is pending per invoice. Scheduling a new one aborts the
/// previous task. A task that fires must `claim` its entry before touching
/// invoice state; once claimed it is no longer cancellable through the
/// registry.
#[derive(Default)]
pub struct RetryRegistry {
    pending: Mutex<HashMap<InvoiceId, PendingRetry>>,
    next_token: AtomicU64,
}

impl RetryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` as the pending retry for `invoice_id`.
    ///
    /// The registry lock is held while spawning, so the task cannot claim its
    /// entry before it has been recorded.
    pub async fn schedule<F, Fut>(&self, invoice_id: InvoiceId, attempt: u32, task: F)
    where
        F: FnOnce(RetryToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let mut pending = self.pending.lock().await;
        let handle = tokio::spawn(task(token));

        if let Some(previous) = pending.insert(
            invoice_id,
            PendingRetry {
                token,
                attempt,
                handle,
            },
        ) {
            previous.handle.abort();
            debug!(
                invoice_id,
                superseded_attempt = previous.attempt,
                attempt,
                "Superseded pending retry"
            );
        }
    }

    /// Removes the entry for `invoice_id` if it still belongs to `token`.
    ///
    /// Returns `false` when the retry was cancelled or superseded.
    pub async fn claim(&self, invoice_id: InvoiceId, token: RetryToken) -> bool {
        let mut pending = self.pending.lock().await;
        match pending.get(&invoice_id) {
            Some(entry) if entry.token == token => {
                pending.remove(&invoice_id);
                true
            }
            _ => false,
        }
    }

    /// Aborts the pending retry for `invoice_id`, if any.
    pub async fn cancel(&self, invoice_id: InvoiceId) -> bool {
        let removed = self.pending.lock().await.remove(&invoice_id);
        match removed {
            Some(entry) => {
                entry.handle.abort();
                debug!(invoice_id, attempt = entry.attempt, "Cancelled pending retry");
                true
            }
            None => false,
        }
    }

    /// Aborts every pending retry and returns how many were dropped.
    pub async fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self.pending.lock().await.drain().collect();
        for (_, entry) in &drained {
            entry.handle.abort();
        }
        drained.len()
    }

    /// The attempt number waiting to run for `invoice_id`.
    pub async fn scheduled_attempt(&self, invoice_id: InvoiceId) -> Option<u32> {
        self.pending
            .lock()
            .await
            .get(&invoice_id)
            .map(|entry| entry.attempt)
    }

    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pending.lock().await.is_empty()
    }
}
