use crate::domain::invoice::InvoiceId;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-invoice mutual exclusion.
///
/// Every read-modify-write cycle on an invoice runs while holding its guard,
/// so a manual re-submission and a scheduled retry can never interleave.
/// An invoice's entry is removed once no guard or waiter refers to it.
#[derive(Default)]
pub struct InvoiceLocks {
    locks: DashMap<InvoiceId, Arc<Mutex<()>>>,
}

impl InvoiceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, invoice_id: InvoiceId) -> InvoiceGuard<'_> {
        // Clone the Arc out so the shard lock is released before awaiting.
        let lock = self.locks.entry(invoice_id).or_default().clone();
        InvoiceGuard {
            locks: self,
            invoice_id,
            guard: Some(lock.lock_owned().await),
        }
    }
}

/// Held while an invoice is being worked on.
pub struct InvoiceGuard<'a> {
    locks: &'a InvoiceLocks,
    invoice_id: InvoiceId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for InvoiceGuard<'_> {
    fn drop(&mut self) {
        // Unlock first: the map's own reference must be the only one left.
        drop(self.guard.take());
        self.locks
            .locks
            .remove_if(&self.invoice_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
